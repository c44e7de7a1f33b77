use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_DAY_NUMBER: u8 = 1;
pub const MAX_DAY_NUMBER: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Lesson,
    Checkpoint,
    Review,
}

impl UnitType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnitType::Lesson => "lesson",
            UnitType::Checkpoint => "checkpoint",
            UnitType::Review => "review",
        }
    }

    pub fn parse(s: &str) -> Option<UnitType> {
        match s {
            "lesson" => Some(UnitType::Lesson),
            "checkpoint" => Some(UnitType::Checkpoint),
            "review" => Some(UnitType::Review),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    MultipleChoice,
    FillBlank,
    Matching,
    Ordering,
    TrueFalse,
    Speaking,
}

impl ActivityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActivityType::MultipleChoice => "multiple_choice",
            ActivityType::FillBlank => "fill_blank",
            ActivityType::Matching => "matching",
            ActivityType::Ordering => "ordering",
            ActivityType::TrueFalse => "true_false",
            ActivityType::Speaking => "speaking",
        }
    }

    pub fn parse(s: &str) -> Option<ActivityType> {
        match s {
            "multiple_choice" => Some(ActivityType::MultipleChoice),
            "fill_blank" => Some(ActivityType::FillBlank),
            "matching" => Some(ActivityType::Matching),
            "ordering" => Some(ActivityType::Ordering),
            "true_false" => Some(ActivityType::TrueFalse),
            "speaking" => Some(ActivityType::Speaking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub level: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseUnit {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub display_order: i32,
    pub unit_type: UnitType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseVideo {
    pub id: String,
    pub unit_id: String,
    pub day_number: u8,
    pub title: String,
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseActivity {
    pub id: String,
    pub video_id: String,
    pub activity_type: ActivityType,
    pub content: serde_json::Value,
    pub correct_answer: serde_json::Value,
}

// Read-side tree returned by GET /api/courses/{id}

#[derive(Debug, Clone, Serialize)]
pub struct CourseTree {
    #[serde(flatten)]
    pub course: Course,
    pub books: Vec<BookTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookTree {
    #[serde(flatten)]
    pub book: Book,
    pub units: Vec<CourseUnitTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseUnitTree {
    #[serde(flatten)]
    pub unit: CourseUnit,
    pub videos: Vec<VideoWithActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoWithActivity {
    #[serde(flatten)]
    pub video: CourseVideo,
    pub activity: Option<CourseActivity>,
}

// Write-side description of a full course, inserted in one transaction.

#[derive(Debug, Clone)]
pub struct CourseSeed {
    pub name: String,
    pub level: String,
    pub language: String,
    pub description: Option<String>,
    pub books: Vec<BookSeed>,
}

#[derive(Debug, Clone)]
pub struct BookSeed {
    pub title: String,
    pub display_order: i32,
    pub color: Option<String>,
    pub units: Vec<CourseUnitSeed>,
}

#[derive(Debug, Clone)]
pub struct CourseUnitSeed {
    pub title: String,
    pub display_order: i32,
    pub unit_type: UnitType,
    pub videos: Vec<VideoSeed>,
}

#[derive(Debug, Clone)]
pub struct VideoSeed {
    pub day_number: u8,
    pub title: String,
    pub video_url: String,
    pub activity_type: ActivityType,
    pub content: serde_json::Value,
    pub correct_answer: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeedCounts {
    pub books: usize,
    pub units: usize,
    pub videos: usize,
    pub activities: usize,
}

/// Result of seeding a course: the course id and what was inserted.
/// `created` is false when the course already existed and nothing was written.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSeedOutcome {
    pub course_id: String,
    pub created: bool,
    pub counts: SeedCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_type_parse() {
        for t in [UnitType::Lesson, UnitType::Checkpoint, UnitType::Review] {
            assert_eq!(UnitType::parse(t.as_str()), Some(t));
        }
        assert_eq!(UnitType::parse("quiz"), None);
    }

    #[test]
    fn test_activity_type_serde_matches_as_str() {
        let json = serde_json::to_string(&ActivityType::FillBlank).unwrap();
        assert_eq!(json, "\"fill_blank\"");
        assert_eq!(ActivityType::parse("true_false"), Some(ActivityType::TrueFalse));
    }
}
