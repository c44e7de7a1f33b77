use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};
use uuid::Uuid;

use super::Store;
use super::schema::{SCHEMA, TABLES};
use crate::error::{Error, Result};
use crate::types::permission::BUILTIN_PERMISSIONS;
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::configure(conn)
    }

    /// Opens a private in-memory database. Used by tests.
    pub fn in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(parse_datetime(&row.get::<_, String>(idx)?))
}

fn opt_datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row.get::<_, Option<String>>(idx)?.map(|s| parse_datetime(&s)))
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .map_err(|e| conversion_error(idx, format!("invalid date '{s}': {e}")))
}

fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map(Some)
            .map_err(|e| conversion_error(idx, format!("invalid date '{s}': {e}"))),
        None => Ok(None),
    }
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<TimeOfDay> {
    let s: String = row.get(idx)?;
    TimeOfDay::parse(&s).map_err(|e| conversion_error(idx, e.to_string()))
}

fn enum_col<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    parse(&s).ok_or_else(|| conversion_error(idx, format!("unexpected value '{s}'")))
}

fn json_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, format!("invalid JSON: {e}")))
}

fn is_constraint(e: &rusqlite::Error, extended: &[i32]) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && extended.contains(&err.extended_code)
    )
}

/// Maps unique and primary-key violations to `Error::Conflict`.
fn conflict_on_unique(e: rusqlite::Error, message: &str) -> Error {
    if is_constraint(
        &e,
        &[ffi::SQLITE_CONSTRAINT_UNIQUE, ffi::SQLITE_CONSTRAINT_PRIMARYKEY],
    ) {
        Error::conflict(message)
    } else {
        Error::from(e)
    }
}

/// Maps foreign-key violations (a parent still referenced) to `Error::Conflict`.
fn conflict_on_reference(e: rusqlite::Error, message: &str) -> Error {
    if is_constraint(&e, &[ffi::SQLITE_CONSTRAINT_FOREIGNKEY]) {
        Error::conflict(message)
    } else {
        Error::from(e)
    }
}

fn exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn require(conn: &Connection, table: &str, id: &str, what: &str) -> Result<()> {
    if exists(conn, table, id)? {
        Ok(())
    } else {
        Err(Error::not_found(format!("{what} not found")))
    }
}

fn expect_updated(rows: usize, what: &str) -> Result<()> {
    if rows == 0 {
        return Err(Error::not_found(format!("{what} not found")));
    }
    Ok(())
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

// Row mappers. Each matches the column list constant above it.

const USER_COLUMNS: &str = "id, email, name, role, password_hash, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: enum_col(row, 3, Role::parse)?,
        password_hash: row.get(4)?,
        created_at: datetime_col(row, 5)?,
        updated_at: datetime_col(row, 6)?,
    })
}

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: datetime_col(row, 4)?,
        expires_at: opt_datetime_col(row, 5)?,
        last_used_at: opt_datetime_col(row, 6)?,
    })
}

const PERMISSION_COLUMNS: &str = "id, name, display_name, description";

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<Permission> {
    Ok(Permission {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get(3)?,
    })
}

fn override_from_row(row: &Row<'_>) -> rusqlite::Result<UserPermissionOverride> {
    Ok(UserPermissionOverride {
        user_id: row.get(0)?,
        permission_id: row.get(1)?,
        permission: row.get(2)?,
        is_granted: row.get(3)?,
        created_at: datetime_col(row, 4)?,
        updated_at: datetime_col(row, 5)?,
    })
}

const UNIT_COLUMNS: &str = "id, name, address, phone, active, created_at, updated_at";

fn unit_from_row(row: &Row<'_>) -> rusqlite::Result<Unit> {
    Ok(Unit {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        active: row.get(4)?,
        created_at: datetime_col(row, 5)?,
        updated_at: datetime_col(row, 6)?,
    })
}

const STAFF_COLUMNS: &str = "id, user_id, unit_id, name, position, phone, created_at, updated_at";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        user_id: row.get(1)?,
        unit_id: row.get(2)?,
        name: row.get(3)?,
        position: enum_col(row, 4, StaffPosition::parse)?,
        phone: row.get(5)?,
        created_at: datetime_col(row, 6)?,
        updated_at: datetime_col(row, 7)?,
    })
}

const STUDENT_COLUMNS: &str =
    "id, user_id, unit_id, name, email, phone, birth_date, active, created_at, updated_at";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        user_id: row.get(1)?,
        unit_id: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        birth_date: opt_date_col(row, 6)?,
        active: row.get(7)?,
        created_at: datetime_col(row, 8)?,
        updated_at: datetime_col(row, 9)?,
    })
}

const COURSE_COLUMNS: &str = "id, name, level, language, description, created_at";

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        level: row.get(2)?,
        language: row.get(3)?,
        description: row.get(4)?,
        created_at: datetime_col(row, 5)?,
    })
}

const BOOK_COLUMNS: &str = "id, course_id, title, display_order, color";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        display_order: row.get(3)?,
        color: row.get(4)?,
    })
}

const COURSE_UNIT_COLUMNS: &str = "id, book_id, title, display_order, unit_type";

fn course_unit_from_row(row: &Row<'_>) -> rusqlite::Result<CourseUnit> {
    Ok(CourseUnit {
        id: row.get(0)?,
        book_id: row.get(1)?,
        title: row.get(2)?,
        display_order: row.get(3)?,
        unit_type: enum_col(row, 4, UnitType::parse)?,
    })
}

const VIDEO_COLUMNS: &str = "id, unit_id, day_number, title, video_url";

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<CourseVideo> {
    Ok(CourseVideo {
        id: row.get(0)?,
        unit_id: row.get(1)?,
        day_number: row.get(2)?,
        title: row.get(3)?,
        video_url: row.get(4)?,
    })
}

const ACTIVITY_COLUMNS: &str = "id, video_id, activity_type, content, correct_answer";

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<CourseActivity> {
    Ok(CourseActivity {
        id: row.get(0)?,
        video_id: row.get(1)?,
        activity_type: enum_col(row, 2, ActivityType::parse)?,
        content: json_col(row, 3)?,
        correct_answer: json_col(row, 4)?,
    })
}

const SLOT_COLUMNS: &str = "id, name, teacher_id, book_id, unit_id, day_of_week, start_time, end_time, room, created_at, updated_at";

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<ClassSlot> {
    Ok(ClassSlot {
        id: row.get(0)?,
        name: row.get(1)?,
        teacher_id: row.get(2)?,
        book_id: row.get(3)?,
        unit_id: row.get(4)?,
        day_of_week: row.get(5)?,
        start_time: time_col(row, 6)?,
        end_time: time_col(row, 7)?,
        room: row.get(8)?,
        created_at: datetime_col(row, 9)?,
        updated_at: datetime_col(row, 10)?,
    })
}

const ENROLLMENT_COLUMNS: &str = "class_id, student_id, enrolled_on, ended_on";

fn enrollment_from_row(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        class_id: row.get(0)?,
        student_id: row.get(1)?,
        enrolled_on: date_col(row, 2)?,
        ended_on: opt_date_col(row, 3)?,
    })
}

const ATTENDANCE_COLUMNS: &str = "class_id, student_id, date, status, updated_at";

fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        class_id: row.get(0)?,
        student_id: row.get(1)?,
        date: date_col(row, 2)?,
        status: enum_col(row, 3, AttendanceStatus::parse)?,
        updated_at: datetime_col(row, 4)?,
    })
}

// Query helpers shared by the trait methods, the tree read and the seed
// transaction. They take a plain connection so a `Transaction` works too.

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email.to_lowercase()],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_course(conn: &Connection, column: &str, value: &str) -> Result<Option<Course>> {
    conn.query_row(
        &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE {column} = ?1"),
        params![value],
        course_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_books(conn: &Connection, course_id: &str) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE course_id = ?1 ORDER BY display_order"
    ))?;
    let rows = stmt.query_map(params![course_id], book_from_row)?;
    collect(rows)
}

fn query_course_units(conn: &Connection, book_id: &str) -> Result<Vec<CourseUnit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COURSE_UNIT_COLUMNS} FROM course_units WHERE book_id = ?1 ORDER BY display_order"
    ))?;
    let rows = stmt.query_map(params![book_id], course_unit_from_row)?;
    collect(rows)
}

fn query_videos(conn: &Connection, unit_id: &str) -> Result<Vec<CourseVideo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VIDEO_COLUMNS} FROM course_videos WHERE unit_id = ?1 ORDER BY day_number"
    ))?;
    let rows = stmt.query_map(params![unit_id], video_from_row)?;
    collect(rows)
}

fn query_activity(conn: &Connection, video_id: &str) -> Result<Option<CourseActivity>> {
    conn.query_row(
        &format!("SELECT {ACTIVITY_COLUMNS} FROM course_activities WHERE video_id = ?1"),
        params![video_id],
        activity_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_slot(conn: &Connection, id: &str) -> Result<Option<ClassSlot>> {
    conn.query_row(
        &format!("SELECT {SLOT_COLUMNS} FROM class_slots WHERE id = ?1"),
        params![id],
        slot_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_enrollment(
    conn: &Connection,
    class_id: &str,
    student_id: &str,
) -> Result<Option<Enrollment>> {
    conn.query_row(
        &format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE class_id = ?1 AND student_id = ?2"
        ),
        params![class_id, student_id],
        enrollment_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn active_student_ids(conn: &Connection, class_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT student_id FROM enrollments WHERE class_id = ?1 AND ended_on IS NULL
         ORDER BY student_id",
    )?;
    let rows = stmt.query_map(params![class_id], |row| row.get(0))?;
    collect(rows)
}

fn insert_staff_row(conn: &Connection, staff: &Staff) -> Result<()> {
    conn.execute(
        "INSERT INTO staff (id, user_id, unit_id, name, position, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            staff.id,
            staff.user_id,
            staff.unit_id,
            staff.name,
            staff.position.as_str(),
            staff.phone,
            format_datetime(&staff.created_at),
            format_datetime(&staff.updated_at),
        ],
    )
    .map_err(|e| conflict_on_unique(e, "User already has a staff profile"))?;
    Ok(())
}

fn insert_course_row(conn: &Connection, course: &Course) -> Result<()> {
    conn.execute(
        "INSERT INTO courses (id, name, level, language, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            course.id,
            course.name,
            course.level,
            course.language,
            course.description,
            format_datetime(&course.created_at),
        ],
    )
    .map_err(|e| conflict_on_unique(e, "A course with this name already exists"))?;
    Ok(())
}

fn insert_book_row(conn: &Connection, book: &Book) -> Result<()> {
    conn.execute(
        "INSERT INTO books (id, course_id, title, display_order, color)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            book.id,
            book.course_id,
            book.title,
            book.display_order,
            book.color
        ],
    )
    .map_err(|e| conflict_on_unique(e, "Display order already used by another book in this course"))?;
    Ok(())
}

fn insert_course_unit_row(conn: &Connection, unit: &CourseUnit) -> Result<()> {
    conn.execute(
        "INSERT INTO course_units (id, book_id, title, display_order, unit_type)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            unit.id,
            unit.book_id,
            unit.title,
            unit.display_order,
            unit.unit_type.as_str()
        ],
    )
    .map_err(|e| conflict_on_unique(e, "Display order already used by another unit in this book"))?;
    Ok(())
}

fn validate_day_number(day_number: u8) -> Result<()> {
    if !(MIN_DAY_NUMBER..=MAX_DAY_NUMBER).contains(&day_number) {
        return Err(Error::validation(format!(
            "day_number must be between {MIN_DAY_NUMBER} and {MAX_DAY_NUMBER}"
        )));
    }
    Ok(())
}

fn insert_video_row(conn: &Connection, video: &CourseVideo) -> Result<()> {
    validate_day_number(video.day_number)?;
    conn.execute(
        "INSERT INTO course_videos (id, unit_id, day_number, title, video_url)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            video.id,
            video.unit_id,
            video.day_number,
            video.title,
            video.video_url
        ],
    )
    .map_err(|e| conflict_on_unique(e, "Day number already used by another video in this unit"))?;
    Ok(())
}

fn upsert_activity_row(conn: &Connection, activity: &CourseActivity) -> Result<()> {
    conn.execute(
        "INSERT INTO course_activities (id, video_id, activity_type, content, correct_answer)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (video_id) DO UPDATE SET
            activity_type = excluded.activity_type,
            content = excluded.content,
            correct_answer = excluded.correct_answer",
        params![
            activity.id,
            activity.video_id,
            activity.activity_type.as_str(),
            activity.content.to_string(),
            activity.correct_answer.to_string(),
        ],
    )?;
    Ok(())
}

/// Validates a slot and rejects it if it overlaps another slot of the same
/// teacher on the same day.
fn check_slot(conn: &Connection, slot: &ClassSlot) -> Result<()> {
    validate_day_of_week(slot.day_of_week)?;
    TimeRange::new(slot.start_time, slot.end_time)?;
    require(conn, "staff", &slot.teacher_id, "Teacher")?;
    require(conn, "books", &slot.book_id, "Book")?;
    require(conn, "units", &slot.unit_id, "Unit")?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM class_slots WHERE teacher_id = ?1 AND day_of_week = ?2"
    ))?;
    let same_day = collect(stmt.query_map(
        params![slot.teacher_id, slot.day_of_week],
        slot_from_row,
    )?)?;

    if let Some(other) = same_day.iter().find(|other| slot.clashes_with(other)) {
        return Err(Error::conflict(format!(
            "Scheduling conflict: teacher already has '{}' on day {} from {} to {}",
            other.name, other.day_of_week, other.start_time, other.end_time
        )));
    }
    Ok(())
}

fn upsert_attendance_row(conn: &Connection, record: &AttendanceRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO attendance_records (class_id, student_id, date, status, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (class_id, student_id, date) DO UPDATE SET
            status = excluded.status,
            updated_at = excluded.updated_at",
        params![
            record.class_id,
            record.student_id,
            format_date(&record.date),
            record.status.as_str(),
            format_datetime(&record.updated_at),
        ],
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        self.install_permission_catalog()
    }

    fn drop_all(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for table in TABLES {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        tx.commit()?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    user.email.to_lowercase(),
                    user.name,
                    user.role.as_str(),
                    user.password_hash,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .map_err(|e| conflict_on_unique(e, "Email already in use"))?;
        Ok(())
    }

    fn upsert_user_by_email(&self, user: &User) -> Result<User> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (email) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                password_hash = excluded.password_hash,
                updated_at = excluded.updated_at",
            params![
                user.id,
                user.email.to_lowercase(),
                user.name,
                user.role.as_str(),
                user.password_hash,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )?;

        query_user_by_email(&conn, &user.email)?
            .ok_or_else(|| Error::not_found("User not found after upsert"))
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        query_user_by_email(&self.conn(), email)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;
        collect(rows)
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn has_admin_user(&self) -> Result<bool> {
        let count: i32 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![Role::Admin.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint(&e, &[ffi::SQLITE_CONSTRAINT_UNIQUE]) => {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
                params![lookup],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Permission catalog and role baselines

    fn install_permission_catalog(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for (name, display_name, description) in BUILTIN_PERMISSIONS {
            tx.execute(
                "INSERT INTO permissions (id, name, display_name, description)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (name) DO UPDATE SET
                    display_name = excluded.display_name,
                    description = excluded.description",
                params![Uuid::new_v4().to_string(), name, display_name, description],
            )?;
        }

        for role in Role::ALL {
            tx.execute(
                "INSERT OR IGNORE INTO roles (name) VALUES (?1)",
                params![role.as_str()],
            )?;

            let assigned: i64 = tx.query_row(
                "SELECT COUNT(*) FROM role_permissions WHERE role = ?1",
                params![role.as_str()],
                |row| row.get(0),
            )?;
            if assigned > 0 {
                continue;
            }

            for name in role.default_baseline() {
                tx.execute(
                    "INSERT OR IGNORE INTO role_permissions (role, permission_id)
                     SELECT ?1, id FROM permissions WHERE name = ?2",
                    params![role.as_str(), name],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn create_permission(&self, permission: &Permission) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO permissions (id, name, display_name, description)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    permission.id,
                    permission.name,
                    permission.display_name,
                    permission.description,
                ],
            )
            .map_err(|e| conflict_on_unique(e, "Permission already exists"))?;
        Ok(())
    }

    fn get_permission_by_name(&self, name: &str) -> Result<Option<Permission>> {
        self.conn()
            .query_row(
                &format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE name = ?1"),
                params![name],
                permission_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_permissions(&self) -> Result<Vec<Permission>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY name"
        ))?;
        let rows = stmt.query_map([], permission_from_row)?;
        collect(rows)
    }

    fn list_role_permissions(&self, role: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.name FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             WHERE rp.role = ?1
             ORDER BY p.name",
        )?;
        let rows = stmt.query_map(params![role], |row| row.get(0))?;
        collect(rows)
    }

    fn set_role_permissions(&self, role: &str, names: &[String]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let known: Option<String> = tx
            .query_row(
                "SELECT name FROM roles WHERE name = ?1",
                params![role],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            return Err(Error::not_found("Role not found"));
        }

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id: Option<String> = tx
                .query_row(
                    "SELECT id FROM permissions WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            ids.push(id.ok_or_else(|| Error::not_found(format!("Permission '{name}' not found")))?);
        }

        tx.execute(
            "DELETE FROM role_permissions WHERE role = ?1",
            params![role],
        )?;
        for id in ids {
            tx.execute(
                "INSERT OR IGNORE INTO role_permissions (role, permission_id) VALUES (?1, ?2)",
                params![role, id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // User permission overrides

    fn upsert_override(&self, o: &UserPermissionOverride) -> Result<()> {
        let conn = self.conn();
        require(&conn, "users", &o.user_id, "User")?;
        require(&conn, "permissions", &o.permission_id, "Permission")?;

        conn.execute(
            "INSERT INTO user_permission_overrides (user_id, permission_id, is_granted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, permission_id) DO UPDATE SET
                is_granted = excluded.is_granted,
                updated_at = excluded.updated_at",
            params![
                o.user_id,
                o.permission_id,
                o.is_granted,
                format_datetime(&o.created_at),
                format_datetime(&o.updated_at),
            ],
        )?;
        Ok(())
    }

    fn delete_override(&self, user_id: &str, permission_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM user_permission_overrides WHERE user_id = ?1 AND permission_id = ?2",
            params![user_id, permission_id],
        )?;
        Ok(rows > 0)
    }

    fn list_user_overrides(&self, user_id: &str) -> Result<Vec<UserPermissionOverride>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT o.user_id, o.permission_id, p.name, o.is_granted, o.created_at, o.updated_at
             FROM user_permission_overrides o
             JOIN permissions p ON p.id = o.permission_id
             WHERE o.user_id = ?1
             ORDER BY p.name",
        )?;
        let rows = stmt.query_map(params![user_id], override_from_row)?;
        collect(rows)
    }

    // School units

    fn create_unit(&self, unit: &Unit) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO units (id, name, address, phone, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    unit.id,
                    unit.name,
                    unit.address,
                    unit.phone,
                    unit.active,
                    format_datetime(&unit.created_at),
                    format_datetime(&unit.updated_at),
                ],
            )
            .map_err(|e| conflict_on_unique(e, "A unit with this name already exists"))?;
        Ok(())
    }

    fn get_unit(&self, id: &str) -> Result<Option<Unit>> {
        self.conn()
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = ?1"),
                params![id],
                unit_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_unit_by_name(&self, name: &str) -> Result<Option<Unit>> {
        self.conn()
            .query_row(
                &format!("SELECT {UNIT_COLUMNS} FROM units WHERE name = ?1"),
                params![name],
                unit_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_units(&self) -> Result<Vec<Unit>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {UNIT_COLUMNS} FROM units ORDER BY name"))?;
        let rows = stmt.query_map([], unit_from_row)?;
        collect(rows)
    }

    fn update_unit(&self, unit: &Unit) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE units SET name = ?1, address = ?2, phone = ?3, active = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    unit.name,
                    unit.address,
                    unit.phone,
                    unit.active,
                    format_datetime(&unit.updated_at),
                    unit.id,
                ],
            )
            .map_err(|e| conflict_on_unique(e, "A unit with this name already exists"))?;
        expect_updated(rows, "Unit")
    }

    fn delete_unit(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM units WHERE id = ?1", params![id])
            .map_err(|e| conflict_on_reference(e, "Unit still has staff, students or classes"))?;
        Ok(rows > 0)
    }

    // Staff

    fn create_staff_with_user(&self, staff: &Staff, user: &User) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require(&tx, "units", &staff.unit_id, "Unit")?;

        tx.execute(
            "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.email.to_lowercase(),
                user.name,
                user.role.as_str(),
                user.password_hash,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )
        .map_err(|e| conflict_on_unique(e, "Email already in use"))?;

        insert_staff_row(&tx, staff)?;

        tx.commit()?;
        Ok(())
    }

    fn create_staff(&self, staff: &Staff) -> Result<()> {
        let conn = self.conn();
        require(&conn, "units", &staff.unit_id, "Unit")?;
        require(&conn, "users", &staff.user_id, "User")?;
        insert_staff_row(&conn, staff)
    }

    fn get_staff(&self, id: &str) -> Result<Option<Staff>> {
        self.conn()
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
                params![id],
                staff_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_staff_by_user(&self, user_id: &str) -> Result<Option<Staff>> {
        self.conn()
            .query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE user_id = ?1"),
                params![user_id],
                staff_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_staff(&self, unit_id: Option<&str>) -> Result<Vec<Staff>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE (?1 IS NULL OR unit_id = ?1) ORDER BY name"
        ))?;
        let rows = stmt.query_map(params![unit_id], staff_from_row)?;
        collect(rows)
    }

    fn update_staff(&self, staff: &Staff) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require(&tx, "units", &staff.unit_id, "Unit")?;

        let rows = tx.execute(
            "UPDATE staff SET unit_id = ?1, name = ?2, position = ?3, phone = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                staff.unit_id,
                staff.name,
                staff.position.as_str(),
                staff.phone,
                format_datetime(&staff.updated_at),
                staff.id,
            ],
        )?;
        expect_updated(rows, "Staff member")?;

        tx.execute(
            "UPDATE users SET role = ?1, updated_at = ?2
             WHERE id = (SELECT user_id FROM staff WHERE id = ?3) AND role <> ?1",
            params![
                staff.position.role().as_str(),
                format_datetime(&staff.updated_at),
                staff.id,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_staff(&self, id: &str) -> Result<bool> {
        let conn = self.conn();
        let user_id: Option<String> = conn
            .query_row(
                "SELECT user_id FROM staff WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(user_id) = user_id else {
            return Ok(false);
        };

        // Deleting the login user cascades to the staff row.
        let rows = conn
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])
            .map_err(|e| conflict_on_reference(e, "Staff member still teaches classes"))?;
        Ok(rows > 0)
    }

    // Students

    fn create_student(&self, student: &Student) -> Result<()> {
        let conn = self.conn();
        require(&conn, "units", &student.unit_id, "Unit")?;
        if let Some(user_id) = &student.user_id {
            require(&conn, "users", user_id, "User")?;
        }

        conn.execute(
            "INSERT INTO students (id, user_id, unit_id, name, email, phone, birth_date, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                student.id,
                student.user_id,
                student.unit_id,
                student.name,
                student.email,
                student.phone,
                student.birth_date.as_ref().map(format_date),
                student.active,
                format_datetime(&student.created_at),
                format_datetime(&student.updated_at),
            ],
        )
        .map_err(|e| conflict_on_unique(e, "User already has a student profile"))?;
        Ok(())
    }

    fn get_student(&self, id: &str) -> Result<Option<Student>> {
        self.conn()
            .query_row(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
                params![id],
                student_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_student_by_user(&self, user_id: &str) -> Result<Option<Student>> {
        self.conn()
            .query_row(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE user_id = ?1"),
                params![user_id],
                student_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students
             WHERE (?1 IS NULL OR unit_id = ?1) AND (?2 IS NULL OR active = ?2)
             ORDER BY name"
        ))?;
        let rows = stmt.query_map(params![filter.unit_id, filter.active], student_from_row)?;
        collect(rows)
    }

    fn update_student(&self, student: &Student) -> Result<()> {
        let conn = self.conn();
        require(&conn, "units", &student.unit_id, "Unit")?;

        let rows = conn.execute(
            "UPDATE students SET unit_id = ?1, name = ?2, email = ?3, phone = ?4, birth_date = ?5,
                active = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                student.unit_id,
                student.name,
                student.email,
                student.phone,
                student.birth_date.as_ref().map(format_date),
                student.active,
                format_datetime(&student.updated_at),
                student.id,
            ],
        )?;
        expect_updated(rows, "Student")
    }

    fn delete_student(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM students WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Courses

    fn create_course(&self, course: &Course) -> Result<()> {
        insert_course_row(&self.conn(), course)
    }

    fn get_course(&self, id: &str) -> Result<Option<Course>> {
        query_course(&self.conn(), "id", id)
    }

    fn get_course_by_name(&self, name: &str) -> Result<Option<Course>> {
        query_course(&self.conn(), "name", name)
    }

    fn list_courses(&self) -> Result<Vec<Course>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY name"
        ))?;
        let rows = stmt.query_map([], course_from_row)?;
        collect(rows)
    }

    fn update_course(&self, course: &Course) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE courses SET name = ?1, level = ?2, language = ?3, description = ?4
                 WHERE id = ?5",
                params![
                    course.name,
                    course.level,
                    course.language,
                    course.description,
                    course.id,
                ],
            )
            .map_err(|e| conflict_on_unique(e, "A course with this name already exists"))?;
        expect_updated(rows, "Course")
    }

    fn delete_course(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM courses WHERE id = ?1", params![id])
            .map_err(|e| conflict_on_reference(e, "Course books are still used by classes"))?;
        Ok(rows > 0)
    }

    fn get_course_tree(&self, id: &str) -> Result<Option<CourseTree>> {
        let conn = self.conn();
        let Some(course) = query_course(&conn, "id", id)? else {
            return Ok(None);
        };

        let mut books = Vec::new();
        for book in query_books(&conn, &course.id)? {
            let mut units = Vec::new();
            for unit in query_course_units(&conn, &book.id)? {
                let mut videos = Vec::new();
                for video in query_videos(&conn, &unit.id)? {
                    let activity = query_activity(&conn, &video.id)?;
                    videos.push(VideoWithActivity { video, activity });
                }
                units.push(CourseUnitTree { unit, videos });
            }
            books.push(BookTree { book, units });
        }

        Ok(Some(CourseTree { course, books }))
    }

    fn seed_course(&self, seed: &CourseSeed) -> Result<CourseSeedOutcome> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if let Some(existing) = query_course(&tx, "name", &seed.name)? {
            return Ok(CourseSeedOutcome {
                course_id: existing.id,
                created: false,
                counts: SeedCounts::default(),
            });
        }

        let course = Course {
            id: Uuid::new_v4().to_string(),
            name: seed.name.clone(),
            level: seed.level.clone(),
            language: seed.language.clone(),
            description: seed.description.clone(),
            created_at: Utc::now(),
        };
        insert_course_row(&tx, &course)?;

        let mut counts = SeedCounts::default();
        for book_seed in &seed.books {
            let book = Book {
                id: Uuid::new_v4().to_string(),
                course_id: course.id.clone(),
                title: book_seed.title.clone(),
                display_order: book_seed.display_order,
                color: book_seed.color.clone(),
            };
            insert_book_row(&tx, &book)?;
            counts.books += 1;

            for unit_seed in &book_seed.units {
                let unit = CourseUnit {
                    id: Uuid::new_v4().to_string(),
                    book_id: book.id.clone(),
                    title: unit_seed.title.clone(),
                    display_order: unit_seed.display_order,
                    unit_type: unit_seed.unit_type,
                };
                insert_course_unit_row(&tx, &unit)?;
                counts.units += 1;

                for video_seed in &unit_seed.videos {
                    let video = CourseVideo {
                        id: Uuid::new_v4().to_string(),
                        unit_id: unit.id.clone(),
                        day_number: video_seed.day_number,
                        title: video_seed.title.clone(),
                        video_url: video_seed.video_url.clone(),
                    };
                    insert_video_row(&tx, &video)?;
                    counts.videos += 1;

                    upsert_activity_row(
                        &tx,
                        &CourseActivity {
                            id: Uuid::new_v4().to_string(),
                            video_id: video.id.clone(),
                            activity_type: video_seed.activity_type,
                            content: video_seed.content.clone(),
                            correct_answer: video_seed.correct_answer.clone(),
                        },
                    )?;
                    counts.activities += 1;
                }
            }
        }

        tx.commit()?;
        Ok(CourseSeedOutcome {
            course_id: course.id,
            created: true,
            counts,
        })
    }

    // Books

    fn create_book(&self, book: &Book) -> Result<()> {
        let conn = self.conn();
        require(&conn, "courses", &book.course_id, "Course")?;
        insert_book_row(&conn, book)
    }

    fn get_book(&self, id: &str) -> Result<Option<Book>> {
        self.conn()
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
                params![id],
                book_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_books(&self, course_id: &str) -> Result<Vec<Book>> {
        query_books(&self.conn(), course_id)
    }

    fn update_book(&self, book: &Book) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE books SET title = ?1, display_order = ?2, color = ?3 WHERE id = ?4",
                params![book.title, book.display_order, book.color, book.id],
            )
            .map_err(|e| {
                conflict_on_unique(e, "Display order already used by another book in this course")
            })?;
        expect_updated(rows, "Book")
    }

    fn delete_book(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM books WHERE id = ?1", params![id])
            .map_err(|e| conflict_on_reference(e, "Book is still used by classes"))?;
        Ok(rows > 0)
    }

    // Course units

    fn create_course_unit(&self, unit: &CourseUnit) -> Result<()> {
        let conn = self.conn();
        require(&conn, "books", &unit.book_id, "Book")?;
        insert_course_unit_row(&conn, unit)
    }

    fn get_course_unit(&self, id: &str) -> Result<Option<CourseUnit>> {
        self.conn()
            .query_row(
                &format!("SELECT {COURSE_UNIT_COLUMNS} FROM course_units WHERE id = ?1"),
                params![id],
                course_unit_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_course_units(&self, book_id: &str) -> Result<Vec<CourseUnit>> {
        query_course_units(&self.conn(), book_id)
    }

    fn update_course_unit(&self, unit: &CourseUnit) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE course_units SET title = ?1, display_order = ?2, unit_type = ?3 WHERE id = ?4",
                params![
                    unit.title,
                    unit.display_order,
                    unit.unit_type.as_str(),
                    unit.id
                ],
            )
            .map_err(|e| {
                conflict_on_unique(e, "Display order already used by another unit in this book")
            })?;
        expect_updated(rows, "Course unit")
    }

    fn delete_course_unit(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM course_units WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Videos and activities

    fn create_video(&self, video: &CourseVideo) -> Result<()> {
        validate_day_number(video.day_number)?;
        let conn = self.conn();
        require(&conn, "course_units", &video.unit_id, "Course unit")?;
        insert_video_row(&conn, video)
    }

    fn get_video(&self, id: &str) -> Result<Option<CourseVideo>> {
        self.conn()
            .query_row(
                &format!("SELECT {VIDEO_COLUMNS} FROM course_videos WHERE id = ?1"),
                params![id],
                video_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_videos(&self, unit_id: &str) -> Result<Vec<CourseVideo>> {
        query_videos(&self.conn(), unit_id)
    }

    fn update_video(&self, video: &CourseVideo) -> Result<()> {
        validate_day_number(video.day_number)?;
        let rows = self
            .conn()
            .execute(
                "UPDATE course_videos SET day_number = ?1, title = ?2, video_url = ?3 WHERE id = ?4",
                params![video.day_number, video.title, video.video_url, video.id],
            )
            .map_err(|e| {
                conflict_on_unique(e, "Day number already used by another video in this unit")
            })?;
        expect_updated(rows, "Video")
    }

    fn delete_video(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM course_videos WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn upsert_activity(&self, activity: &CourseActivity) -> Result<CourseActivity> {
        let conn = self.conn();
        require(&conn, "course_videos", &activity.video_id, "Video")?;
        upsert_activity_row(&conn, activity)?;
        query_activity(&conn, &activity.video_id)?
            .ok_or_else(|| Error::not_found("Activity not found after upsert"))
    }

    fn get_activity_for_video(&self, video_id: &str) -> Result<Option<CourseActivity>> {
        query_activity(&self.conn(), video_id)
    }

    // Class slots

    fn create_class_slot(&self, slot: &ClassSlot) -> Result<()> {
        self.create_class_slot_with_students(slot, &[], slot.created_at.date_naive())
    }

    fn create_class_slot_with_students(
        &self,
        slot: &ClassSlot,
        student_ids: &[String],
        enrolled_on: NaiveDate,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        check_slot(&tx, slot)?;

        tx.execute(
            "INSERT INTO class_slots (id, name, teacher_id, book_id, unit_id, day_of_week, start_time, end_time, room, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                slot.id,
                slot.name,
                slot.teacher_id,
                slot.book_id,
                slot.unit_id,
                slot.day_of_week,
                slot.start_time.to_string(),
                slot.end_time.to_string(),
                slot.room,
                format_datetime(&slot.created_at),
                format_datetime(&slot.updated_at),
            ],
        )?;

        for student_id in student_ids {
            require(&tx, "students", student_id, "Student")?;
            tx.execute(
                "INSERT INTO enrollments (class_id, student_id, enrolled_on, ended_on)
                 VALUES (?1, ?2, ?3, NULL)",
                params![slot.id, student_id, format_date(&enrolled_on)],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_class_slot(&self, id: &str) -> Result<Option<ClassSlot>> {
        query_slot(&self.conn(), id)
    }

    fn list_class_slots(&self, filter: &ClassSlotFilter) -> Result<Vec<ClassSlot>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SLOT_COLUMNS} FROM class_slots
             WHERE (?1 IS NULL OR teacher_id = ?1)
               AND (?2 IS NULL OR unit_id = ?2)
               AND (?3 IS NULL OR day_of_week = ?3)
             ORDER BY day_of_week, start_time, name"
        ))?;
        let rows = stmt.query_map(
            params![filter.teacher_id, filter.unit_id, filter.day_of_week],
            slot_from_row,
        )?;
        collect(rows)
    }

    fn update_class_slot(&self, slot: &ClassSlot) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if query_slot(&tx, &slot.id)?.is_none() {
            return Err(Error::not_found("Class not found"));
        }
        check_slot(&tx, slot)?;

        tx.execute(
            "UPDATE class_slots SET name = ?1, teacher_id = ?2, book_id = ?3, unit_id = ?4,
                day_of_week = ?5, start_time = ?6, end_time = ?7, room = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                slot.name,
                slot.teacher_id,
                slot.book_id,
                slot.unit_id,
                slot.day_of_week,
                slot.start_time.to_string(),
                slot.end_time.to_string(),
                slot.room,
                format_datetime(&slot.updated_at),
                slot.id,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_class_slot(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM class_slots WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Enrollments

    fn enroll_student(&self, enrollment: &Enrollment) -> Result<Enrollment> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require(&tx, "class_slots", &enrollment.class_id, "Class")?;
        require(&tx, "students", &enrollment.student_id, "Student")?;

        match query_enrollment(&tx, &enrollment.class_id, &enrollment.student_id)? {
            Some(existing) if existing.is_active() => {
                return Err(Error::conflict("Student is already enrolled in this class"));
            }
            Some(_) => {
                tx.execute(
                    "UPDATE enrollments SET enrolled_on = ?1, ended_on = NULL
                     WHERE class_id = ?2 AND student_id = ?3",
                    params![
                        format_date(&enrollment.enrolled_on),
                        enrollment.class_id,
                        enrollment.student_id,
                    ],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO enrollments (class_id, student_id, enrolled_on, ended_on)
                     VALUES (?1, ?2, ?3, NULL)",
                    params![
                        enrollment.class_id,
                        enrollment.student_id,
                        format_date(&enrollment.enrolled_on),
                    ],
                )?;
            }
        }

        let stored = query_enrollment(&tx, &enrollment.class_id, &enrollment.student_id)?
            .ok_or_else(|| Error::not_found("Enrollment not found after insert"))?;
        tx.commit()?;
        Ok(stored)
    }

    fn end_enrollment(
        &self,
        class_id: &str,
        student_id: &str,
        ended_on: NaiveDate,
    ) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE enrollments SET ended_on = ?1
             WHERE class_id = ?2 AND student_id = ?3 AND ended_on IS NULL",
            params![format_date(&ended_on), class_id, student_id],
        )?;
        Ok(rows > 0)
    }

    fn list_enrollments(&self, class_id: &str) -> Result<Vec<Enrollment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE class_id = ?1
             ORDER BY enrolled_on, student_id"
        ))?;
        let rows = stmt.query_map(params![class_id], enrollment_from_row)?;
        collect(rows)
    }

    // Attendance

    fn get_roster(&self, class_id: &str, date: NaiveDate) -> Result<Vec<RosterEntry>> {
        let conn = self.conn();
        require(&conn, "class_slots", class_id, "Class")?;

        let mut stmt = conn.prepare(
            "SELECT s.id, s.name, a.status
             FROM enrollments e
             JOIN students s ON s.id = e.student_id
             LEFT JOIN attendance_records a
                ON a.class_id = e.class_id AND a.student_id = e.student_id AND a.date = ?2
             WHERE e.class_id = ?1 AND e.ended_on IS NULL
             ORDER BY s.name, s.id",
        )?;
        let rows = stmt.query_map(params![class_id, format_date(&date)], |row| {
            let status: Option<String> = row.get(2)?;
            Ok(RosterEntry {
                student_id: row.get(0)?,
                student_name: row.get(1)?,
                status: status
                    .map(|s| {
                        AttendanceStatus::parse(&s)
                            .ok_or_else(|| conversion_error(2, format!("unexpected value '{s}'")))
                    })
                    .transpose()?,
            })
        })?;
        collect(rows)
    }

    fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        let conn = self.conn();
        require(&conn, "class_slots", &record.class_id, "Class")?;

        let enrolled = query_enrollment(&conn, &record.class_id, &record.student_id)?
            .is_some_and(|e| e.is_active());
        if !enrolled {
            return Err(Error::validation("Student is not enrolled in this class"));
        }

        upsert_attendance_row(&conn, record)
    }

    fn mark_all_attendance(
        &self,
        class_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        require(&tx, "class_slots", class_id, "Class")?;

        let now = Utc::now();
        let students = active_student_ids(&tx, class_id)?;
        for student_id in &students {
            upsert_attendance_row(
                &tx,
                &AttendanceRecord {
                    class_id: class_id.to_string(),
                    student_id: student_id.clone(),
                    date,
                    status,
                    updated_at: now,
                },
            )?;
        }

        tx.commit()?;
        Ok(students.len())
    }

    fn list_attendance(
        &self,
        class_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
             WHERE class_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date, student_id"
        ))?;
        let rows = stmt.query_map(
            params![class_id, format_date(&from), format_date(&to)],
            attendance_from_row,
        )?;
        collect(rows)
    }

}
