pub const SCHEMA: &str = r#"
-- Login accounts; staff and students hang off these
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'director', 'secretary', 'teacher', 'student')),
    password_hash TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Session tokens
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- 8 char prefix for fast lookup
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                   -- NULL = never
    last_used_at TEXT
);

-- Permission catalog
CREATE TABLE IF NOT EXISTS permissions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS roles (
    name TEXT PRIMARY KEY
);

-- Baseline permissions per role
CREATE TABLE IF NOT EXISTS role_permissions (
    role TEXT NOT NULL REFERENCES roles(name) ON DELETE CASCADE,
    permission_id TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (role, permission_id)
);

-- Per-user grant (is_granted = 1) or deny (is_granted = 0); one row per pair
CREATE TABLE IF NOT EXISTS user_permission_overrides (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    permission_id TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    is_granted INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, permission_id)
);

-- School campuses
CREATE TABLE IF NOT EXISTS units (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    address TEXT,
    phone TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS staff (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    unit_id TEXT NOT NULL REFERENCES units(id),
    name TEXT NOT NULL,
    position TEXT NOT NULL CHECK (position IN ('director', 'coordinator', 'secretary', 'teacher')),
    phone TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    user_id TEXT UNIQUE REFERENCES users(id) ON DELETE SET NULL,
    unit_id TEXT NOT NULL REFERENCES units(id),
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    birth_date TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Curriculum: course > book > course unit > video > activity
CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    level TEXT NOT NULL,
    language TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    display_order INTEGER NOT NULL,
    color TEXT,
    UNIQUE(course_id, display_order)
);

CREATE TABLE IF NOT EXISTS course_units (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    display_order INTEGER NOT NULL,
    unit_type TEXT NOT NULL CHECK (unit_type IN ('lesson', 'checkpoint', 'review')),
    UNIQUE(book_id, display_order)
);

CREATE TABLE IF NOT EXISTS course_videos (
    id TEXT PRIMARY KEY,
    unit_id TEXT NOT NULL REFERENCES course_units(id) ON DELETE CASCADE,
    day_number INTEGER NOT NULL CHECK (day_number BETWEEN 1 AND 6),
    title TEXT NOT NULL,
    video_url TEXT NOT NULL,
    UNIQUE(unit_id, day_number)
);

CREATE TABLE IF NOT EXISTS course_activities (
    id TEXT PRIMARY KEY,
    video_id TEXT NOT NULL UNIQUE REFERENCES course_videos(id) ON DELETE CASCADE,
    activity_type TEXT NOT NULL,
    content TEXT NOT NULL,             -- JSON
    correct_answer TEXT NOT NULL       -- JSON
);

-- Weekly recurring classes
CREATE TABLE IF NOT EXISTS class_slots (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    teacher_id TEXT NOT NULL REFERENCES staff(id),
    book_id TEXT NOT NULL REFERENCES books(id),
    unit_id TEXT NOT NULL REFERENCES units(id),
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 1 AND 6),
    start_time TEXT NOT NULL,          -- HH:MM
    end_time TEXT NOT NULL,            -- HH:MM
    room TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS enrollments (
    class_id TEXT NOT NULL REFERENCES class_slots(id) ON DELETE CASCADE,
    student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    enrolled_on TEXT NOT NULL,
    ended_on TEXT,                     -- NULL = active
    PRIMARY KEY (class_id, student_id)
);

CREATE TABLE IF NOT EXISTS attendance_records (
    class_id TEXT NOT NULL REFERENCES class_slots(id) ON DELETE CASCADE,
    student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('present', 'absent', 'justified')),
    updated_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (class_id, student_id, date)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_overrides_user ON user_permission_overrides(user_id);
CREATE INDEX IF NOT EXISTS idx_staff_unit ON staff(unit_id);
CREATE INDEX IF NOT EXISTS idx_students_unit ON students(unit_id);
CREATE INDEX IF NOT EXISTS idx_books_course ON books(course_id);
CREATE INDEX IF NOT EXISTS idx_course_units_book ON course_units(book_id);
CREATE INDEX IF NOT EXISTS idx_course_videos_unit ON course_videos(unit_id);
CREATE INDEX IF NOT EXISTS idx_class_slots_teacher_day ON class_slots(teacher_id, day_of_week);
CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id);
CREATE INDEX IF NOT EXISTS idx_attendance_class_date ON attendance_records(class_id, date);
"#;

/// Tables in dependency order, children first, for `admin init --reset/--delete`.
pub const TABLES: &[&str] = &[
    "attendance_records",
    "enrollments",
    "class_slots",
    "course_activities",
    "course_videos",
    "course_units",
    "books",
    "courses",
    "students",
    "staff",
    "units",
    "user_permission_overrides",
    "role_permissions",
    "roles",
    "permissions",
    "tokens",
    "users",
];
