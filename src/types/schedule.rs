use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Monday..Saturday, the days classes run on.
pub const FIRST_CLASS_DAY: u8 = 1;
pub const LAST_CLASS_DAY: u8 = 6;

pub fn validate_day_of_week(day: u8) -> Result<u8> {
    if (FIRST_CLASS_DAY..=LAST_CLASS_DAY).contains(&day) {
        Ok(day)
    } else {
        Err(Error::validation(format!(
            "day_of_week must be between {FIRST_CLASS_DAY} (Monday) and {LAST_CLASS_DAY} (Saturday)"
        )))
    }
}

/// English weekday name for a class day, `"Unknown"` outside 1..=6.
#[must_use]
pub fn day_name(day: u8) -> &'static str {
    match day {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Unknown",
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("invalid date '{s}', expected YYYY-MM-DD")))
}

/// Minutes since midnight, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn new(hour: u16, minute: u16) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::validation(format!(
                "invalid time {hour:02}:{minute:02}"
            )));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::validation(format!("invalid time '{s}', expected HH:MM"));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if h.is_empty() || h.len() > 2 || m.len() != 2 || !digits(h) || !digits(m) {
            return Err(invalid());
        }
        let hour: u16 = h.parse().map_err(|_| invalid())?;
        let minute: u16 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }

    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Half-open interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self> {
        if start >= end {
            return Err(Error::validation(format!(
                "start_time {start} must be before end_time {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Ranges that only touch at an endpoint do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSlot {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub book_id: String,
    pub unit_id: String,
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassSlot {
    #[must_use]
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// True when both slots belong to the same teacher on the same day and
    /// their time ranges overlap. A slot never clashes with itself.
    #[must_use]
    pub fn clashes_with(&self, other: &ClassSlot) -> bool {
        self.id != other.id
            && self.teacher_id == other.teacher_id
            && self.day_of_week == other.day_of_week
            && self.time_range().overlaps(&other.time_range())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSlotFilter {
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub class_id: String,
    pub student_id: String,
    pub enrolled_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_on: Option<NaiveDate>,
}

impl Enrollment {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ended_on.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Justified,
}

impl AttendanceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Justified => "justified",
        }
    }

    pub fn parse(s: &str) -> Option<AttendanceStatus> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "justified" => Some(AttendanceStatus::Justified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub class_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub updated_at: DateTime<Utc>,
}

/// One line of the roster for a class on a given date.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub student_id: String,
    pub student_name: String,
    pub status: Option<AttendanceStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(TimeOfDay::parse(start).unwrap(), TimeOfDay::parse(end).unwrap()).unwrap()
    }

    fn slot(id: &str, teacher: &str, day: u8, start: &str, end: &str) -> ClassSlot {
        ClassSlot {
            id: id.to_string(),
            name: "Journey 1".to_string(),
            teacher_id: teacher.to_string(),
            book_id: "book-1".to_string(),
            unit_id: "unit-1".to_string(),
            day_of_week: day,
            start_time: TimeOfDay::parse(start).unwrap(),
            end_time: TimeOfDay::parse(end).unwrap(),
            room: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(TimeOfDay::parse("14:30").unwrap().minutes(), 14 * 60 + 30);
        assert_eq!(TimeOfDay::parse("9:05").unwrap().to_string(), "09:05");
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
        assert!(TimeOfDay::parse("1230").is_err());
        assert!(TimeOfDay::parse("12:3").is_err());
    }

    #[test]
    fn test_parse_time_of_day_rejects_signs() {
        assert!(TimeOfDay::parse("+9:+5").is_err());
        assert!(TimeOfDay::parse("+9:05").is_err());
        assert!(TimeOfDay::parse("09:+5").is_err());
        assert!(TimeOfDay::parse("-1:00").is_err());
    }

    #[test]
    fn test_range_requires_start_before_end() {
        let t = TimeOfDay::parse("10:00").unwrap();
        assert!(TimeRange::new(t, t).is_err());
    }

    #[test]
    fn test_overlap_contained_range() {
        assert!(range("14:00", "15:30").overlaps(&range("14:30", "15:00")));
        assert!(range("14:30", "15:00").overlaps(&range("14:00", "15:30")));
    }

    #[test]
    fn test_touching_ranges_do_not_overlap() {
        assert!(!range("14:00", "15:30").overlaps(&range("15:30", "17:00")));
        assert!(!range("15:30", "17:00").overlaps(&range("14:00", "15:30")));
    }

    #[test]
    fn test_slot_clash_rules() {
        let monday = slot("a", "t1", 1, "14:00", "15:30");
        assert!(monday.clashes_with(&slot("b", "t1", 1, "14:30", "15:00")));
        assert!(!monday.clashes_with(&slot("b", "t2", 1, "14:30", "15:00")));
        assert!(!monday.clashes_with(&slot("b", "t1", 2, "14:30", "15:00")));
        assert!(!monday.clashes_with(&slot("a", "t1", 1, "14:30", "15:00")));
    }

    #[test]
    fn test_day_of_week_bounds() {
        assert!(validate_day_of_week(0).is_err());
        assert!(validate_day_of_week(1).is_ok());
        assert!(validate_day_of_week(6).is_ok());
        assert!(validate_day_of_week(7).is_err());
    }

    #[test]
    fn test_time_of_day_serde() {
        let t: TimeOfDay = serde_json::from_str("\"08:15\"").unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"08:15\"");
        assert!(serde_json::from_str::<TimeOfDay>("\"8h15\"").is_err());
    }
}
