use serde::Serialize;

use crate::store::Store;
use crate::types::{ClassSlotFilter, StudentFilter};

use super::init_store;

#[derive(Serialize)]
struct DatabaseInfo {
    users: usize,
    units: usize,
    staff: usize,
    students: usize,
    courses: Vec<CourseInfo>,
    classes: usize,
    permissions: usize,
}

#[derive(Serialize)]
struct CourseInfo {
    id: String,
    name: String,
    books: usize,
}

pub fn run_info(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let courses = store
        .list_courses()?
        .into_iter()
        .map(|course| {
            let books = store.list_books(&course.id)?.len();
            Ok(CourseInfo {
                id: course.id,
                name: course.name,
                books,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let info = DatabaseInfo {
        users: store.list_users("", i32::MAX)?.len(),
        units: store.list_units()?.len(),
        staff: store.list_staff(None)?.len(),
        students: store.list_students(&StudentFilter::default())?.len(),
        courses,
        classes: store.list_class_slots(&ClassSlotFilter::default())?.len(),
        permissions: store.list_permissions()?.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!();
    println!("Users:       {}", info.users);
    println!("Units:       {}", info.units);
    println!("Staff:       {}", info.staff);
    println!("Students:    {}", info.students);
    println!("Classes:     {}", info.classes);
    println!("Permissions: {}", info.permissions);
    println!("Courses:     {}", info.courses.len());
    for course in &info.courses {
        println!("  {} ({} books)  {}", course.name, course.books, course.id);
    }
    println!();

    Ok(())
}
