mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Create methods check that referenced parents exist and fail with
/// `Error::NotFound` otherwise; unique-key violations surface as
/// `Error::Conflict`.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;
    /// Drops every table. `initialize` must be called again before use.
    fn drop_all(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    /// Inserts or refreshes a user keyed by email. An existing row keeps its
    /// id and creation time; the stored row is returned.
    fn upsert_user_by_email(&self, user: &User) -> Result<User>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    /// True when at least one user holds the admin role.
    fn has_admin_user(&self) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Permission catalog and role baselines
    /// Inserts the built-in permissions and roles. Role baselines are only
    /// filled for roles that have none yet, so edits survive re-running.
    fn install_permission_catalog(&self) -> Result<()>;
    fn create_permission(&self, permission: &Permission) -> Result<()>;
    fn get_permission_by_name(&self, name: &str) -> Result<Option<Permission>>;
    fn list_permissions(&self) -> Result<Vec<Permission>>;
    /// Permission names attached to a role; empty for an unknown role.
    fn list_role_permissions(&self, role: &str) -> Result<Vec<String>>;
    fn set_role_permissions(&self, role: &str, names: &[String]) -> Result<()>;

    // User permission overrides
    fn upsert_override(&self, o: &UserPermissionOverride) -> Result<()>;
    fn delete_override(&self, user_id: &str, permission_id: &str) -> Result<bool>;
    fn list_user_overrides(&self, user_id: &str) -> Result<Vec<UserPermissionOverride>>;

    // School units
    fn create_unit(&self, unit: &Unit) -> Result<()>;
    fn get_unit(&self, id: &str) -> Result<Option<Unit>>;
    fn get_unit_by_name(&self, name: &str) -> Result<Option<Unit>>;
    fn list_units(&self) -> Result<Vec<Unit>>;
    fn update_unit(&self, unit: &Unit) -> Result<()>;
    fn delete_unit(&self, id: &str) -> Result<bool>;

    // Staff
    /// Creates the staff profile and its login user in one transaction.
    fn create_staff_with_user(&self, staff: &Staff, user: &User) -> Result<()>;
    /// Attaches a staff profile to an existing user.
    fn create_staff(&self, staff: &Staff) -> Result<()>;
    fn get_staff(&self, id: &str) -> Result<Option<Staff>>;
    fn get_staff_by_user(&self, user_id: &str) -> Result<Option<Staff>>;
    fn list_staff(&self, unit_id: Option<&str>) -> Result<Vec<Staff>>;
    /// Updates the profile and moves the login user to the role matching the
    /// position, in one transaction.
    fn update_staff(&self, staff: &Staff) -> Result<()>;
    /// Deletes the staff member together with its login user.
    fn delete_staff(&self, id: &str) -> Result<bool>;

    // Students
    fn create_student(&self, student: &Student) -> Result<()>;
    fn get_student(&self, id: &str) -> Result<Option<Student>>;
    fn get_student_by_user(&self, user_id: &str) -> Result<Option<Student>>;
    fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>>;
    fn update_student(&self, student: &Student) -> Result<()>;
    fn delete_student(&self, id: &str) -> Result<bool>;

    // Courses
    fn create_course(&self, course: &Course) -> Result<()>;
    fn get_course(&self, id: &str) -> Result<Option<Course>>;
    fn get_course_by_name(&self, name: &str) -> Result<Option<Course>>;
    fn list_courses(&self) -> Result<Vec<Course>>;
    fn update_course(&self, course: &Course) -> Result<()>;
    fn delete_course(&self, id: &str) -> Result<bool>;
    /// Full course with ordered books, units, videos and activities.
    fn get_course_tree(&self, id: &str) -> Result<Option<CourseTree>>;
    /// Inserts a whole course in one transaction. If a course with the same
    /// name exists nothing is written and its id is returned.
    fn seed_course(&self, seed: &CourseSeed) -> Result<CourseSeedOutcome>;

    // Books
    fn create_book(&self, book: &Book) -> Result<()>;
    fn get_book(&self, id: &str) -> Result<Option<Book>>;
    fn list_books(&self, course_id: &str) -> Result<Vec<Book>>;
    fn update_book(&self, book: &Book) -> Result<()>;
    fn delete_book(&self, id: &str) -> Result<bool>;

    // Course units
    fn create_course_unit(&self, unit: &CourseUnit) -> Result<()>;
    fn get_course_unit(&self, id: &str) -> Result<Option<CourseUnit>>;
    fn list_course_units(&self, book_id: &str) -> Result<Vec<CourseUnit>>;
    fn update_course_unit(&self, unit: &CourseUnit) -> Result<()>;
    fn delete_course_unit(&self, id: &str) -> Result<bool>;

    // Videos and activities
    fn create_video(&self, video: &CourseVideo) -> Result<()>;
    fn get_video(&self, id: &str) -> Result<Option<CourseVideo>>;
    fn list_videos(&self, unit_id: &str) -> Result<Vec<CourseVideo>>;
    fn update_video(&self, video: &CourseVideo) -> Result<()>;
    fn delete_video(&self, id: &str) -> Result<bool>;
    /// Inserts or replaces the single activity of a video.
    fn upsert_activity(&self, activity: &CourseActivity) -> Result<CourseActivity>;
    fn get_activity_for_video(&self, video_id: &str) -> Result<Option<CourseActivity>>;

    // Class slots
    /// Rejects the slot with `Error::Conflict` if it overlaps another slot of
    /// the same teacher on the same day.
    fn create_class_slot(&self, slot: &ClassSlot) -> Result<()>;
    /// Creates the class and its first active enrollments together.
    fn create_class_slot_with_students(
        &self,
        slot: &ClassSlot,
        student_ids: &[String],
        enrolled_on: NaiveDate,
    ) -> Result<()>;
    fn get_class_slot(&self, id: &str) -> Result<Option<ClassSlot>>;
    fn list_class_slots(&self, filter: &ClassSlotFilter) -> Result<Vec<ClassSlot>>;
    /// Same overlap rule as `create_class_slot`, ignoring the slot itself.
    fn update_class_slot(&self, slot: &ClassSlot) -> Result<()>;
    fn delete_class_slot(&self, id: &str) -> Result<bool>;

    // Enrollments
    /// Enrolls a student. Reopens an ended enrollment; fails with
    /// `Error::Conflict` if the student is already actively enrolled.
    fn enroll_student(&self, enrollment: &Enrollment) -> Result<Enrollment>;
    fn end_enrollment(&self, class_id: &str, student_id: &str, ended_on: NaiveDate)
    -> Result<bool>;
    fn list_enrollments(&self, class_id: &str) -> Result<Vec<Enrollment>>;

    // Attendance
    /// Actively enrolled students of a class with their status on `date`.
    fn get_roster(&self, class_id: &str, date: NaiveDate) -> Result<Vec<RosterEntry>>;
    fn upsert_attendance(&self, record: &AttendanceRecord) -> Result<()>;
    /// Marks every roster member in one transaction; returns the count.
    fn mark_all_attendance(
        &self,
        class_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<usize>;
    fn list_attendance(
        &self,
        class_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>>;
}
