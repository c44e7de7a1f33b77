//! Demo data for local development and manual testing.

mod journey;

pub use journey::{JOURNEY_COURSE_NAME, journey_course};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::error::Result;
use crate::store::Store;
use crate::types::{
    ClassSlot, ClassSlotFilter, CourseSeedOutcome, Role, Staff, StaffPosition,
    Student, TimeOfDay, Unit, User,
};

pub const DEMO_PASSWORD: &str = "demo123";
pub const DEMO_UNIT_NAME: &str = "Demo Unit";
const DEMO_CLASS_NAME: &str = "Journey 1 - Monday";

/// (email, display name, role)
pub const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("admin@demo.com", "Demo Admin", Role::Admin),
    ("director@demo.com", "Demo Director", Role::Director),
    ("secretary@demo.com", "Demo Secretary", Role::Secretary),
    ("teacher@demo.com", "Demo Teacher", Role::Teacher),
    ("student@demo.com", "Demo Student", Role::Student),
];

#[derive(Debug)]
pub struct SeedSummary {
    pub users: Vec<User>,
    pub unit: Unit,
    pub course: CourseSeedOutcome,
    pub class_created: bool,
}

/// Seeds demo users, a school unit with staff and student profiles, the
/// Journey course and one demo class. Safe to run repeatedly: users are
/// upserted by email and everything else is only created when missing.
pub fn run_seed(store: &dyn Store, password: &str) -> Result<SeedSummary> {
    let users = seed_users(store, password)?;
    let unit = seed_unit(store)?;

    let mut teacher_staff = None;
    let mut student_profile = None;
    for user in &users {
        match user.role {
            Role::Director => {
                ensure_staff(store, user, &unit, StaffPosition::Director)?;
            }
            Role::Secretary => {
                ensure_staff(store, user, &unit, StaffPosition::Secretary)?;
            }
            Role::Teacher => {
                teacher_staff = Some(ensure_staff(store, user, &unit, StaffPosition::Teacher)?);
            }
            Role::Student => student_profile = Some(ensure_student(store, user, &unit)?),
            Role::Admin => {}
        }
    }

    let course = store.seed_course(&journey_course())?;
    if course.created {
        tracing::info!(
            books = course.counts.books,
            units = course.counts.units,
            videos = course.counts.videos,
            "Journey course created"
        );
    } else {
        tracing::info!(course = %course.course_id, "Journey course already present");
    }

    let class_created = match (teacher_staff, student_profile) {
        (Some(teacher), Some(student)) => {
            ensure_demo_class(store, &teacher, &student, &unit, &course.course_id)?
        }
        _ => false,
    };

    Ok(SeedSummary {
        users,
        unit,
        course,
        class_created,
    })
}

fn seed_users(store: &dyn Store, password: &str) -> Result<Vec<User>> {
    let password_hash = hash_password(password)?;
    let now = Utc::now();

    DEMO_USERS
        .iter()
        .map(|(email, name, role)| {
            let user = store.upsert_user_by_email(&User {
                id: Uuid::new_v4().to_string(),
                email: (*email).to_string(),
                name: (*name).to_string(),
                role: *role,
                password_hash: password_hash.clone(),
                created_at: now,
                updated_at: now,
            })?;
            tracing::info!(email = %user.email, id = %user.id, "demo user ready");
            Ok(user)
        })
        .collect()
}

fn seed_unit(store: &dyn Store) -> Result<Unit> {
    if let Some(unit) = store.get_unit_by_name(DEMO_UNIT_NAME)? {
        return Ok(unit);
    }

    let now = Utc::now();
    let unit = Unit {
        id: Uuid::new_v4().to_string(),
        name: DEMO_UNIT_NAME.to_string(),
        address: Some("1 Demo Street".to_string()),
        phone: Some("+55 11 0000-0000".to_string()),
        active: true,
        created_at: now,
        updated_at: now,
    };
    store.create_unit(&unit)?;
    Ok(unit)
}

fn ensure_staff(
    store: &dyn Store,
    user: &User,
    unit: &Unit,
    position: StaffPosition,
) -> Result<Staff> {
    if let Some(staff) = store.get_staff_by_user(&user.id)? {
        return Ok(staff);
    }

    let now = Utc::now();
    let staff = Staff {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        unit_id: unit.id.clone(),
        name: user.name.clone(),
        position,
        phone: None,
        created_at: now,
        updated_at: now,
    };
    store.create_staff(&staff)?;
    Ok(staff)
}

fn ensure_student(store: &dyn Store, user: &User, unit: &Unit) -> Result<Student> {
    if let Some(student) = store.get_student_by_user(&user.id)? {
        return Ok(student);
    }

    let now = Utc::now();
    let student = Student {
        id: Uuid::new_v4().to_string(),
        user_id: Some(user.id.clone()),
        unit_id: unit.id.clone(),
        name: user.name.clone(),
        email: Some(user.email.clone()),
        phone: None,
        birth_date: NaiveDate::from_ymd_opt(2005, 3, 14),
        active: true,
        created_at: now,
        updated_at: now,
    };
    store.create_student(&student)?;
    Ok(student)
}

/// Monday 14:00-15:30 with the demo student enrolled, if the teacher has no
/// classes yet.
fn ensure_demo_class(
    store: &dyn Store,
    teacher: &Staff,
    student: &Student,
    unit: &Unit,
    course_id: &str,
) -> Result<bool> {
    let existing = store.list_class_slots(&ClassSlotFilter {
        teacher_id: Some(teacher.id.clone()),
        ..ClassSlotFilter::default()
    })?;
    if !existing.is_empty() {
        return Ok(false);
    }

    let Some(book) = store.list_books(course_id)?.into_iter().next() else {
        return Ok(false);
    };

    let now = Utc::now();
    let class = ClassSlot {
        id: Uuid::new_v4().to_string(),
        name: DEMO_CLASS_NAME.to_string(),
        teacher_id: teacher.id.clone(),
        book_id: book.id,
        unit_id: unit.id.clone(),
        day_of_week: 1,
        start_time: TimeOfDay::new(14, 0)?,
        end_time: TimeOfDay::new(15, 30)?,
        room: Some("Room 1".to_string()),
        created_at: now,
        updated_at: now,
    };
    store.create_class_slot_with_students(
        &class,
        std::slice::from_ref(&student.id),
        now.date_naive(),
    )?;

    tracing::info!(class = %class.id, "demo class created");
    Ok(true)
}
