use std::fs;
use std::path::PathBuf;

use crate::config::DB_FILE_NAME;
use crate::seed;
use crate::server::validation::MIN_PASSWORD_LEN;
use crate::store::{SqliteStore, Store};

use super::{confirm_action, init_store};

pub fn run_init(data_dir: String, reset: bool, delete: bool, yes: bool) -> anyhow::Result<()> {
    let data_path = PathBuf::from(&data_dir);
    let db_path = data_path.join(DB_FILE_NAME);

    if delete {
        let store = init_store(&data_dir)?;
        if !confirm_action("Drop every table? All data will be lost.", yes)? {
            println!("Cancelled.");
            return Ok(());
        }
        store.drop_all()?;
        tracing::info!(db = %db_path.display(), "dropped all tables");
        println!("Dropped all tables in {}", db_path.display());
        return Ok(());
    }

    fs::create_dir_all(&data_path)?;
    let store = SqliteStore::new(&db_path)?;

    if reset {
        if !confirm_action("Drop every table and recreate the schema?", yes)? {
            println!("Cancelled.");
            return Ok(());
        }
        store.drop_all()?;
        tracing::info!(db = %db_path.display(), "dropped all tables");
    }

    store.initialize()?;
    let permissions = store.list_permissions()?.len();
    tracing::info!(db = %db_path.display(), permissions, "schema ready");

    println!();
    println!("Database ready at {}", db_path.display());
    println!("  {permissions} permissions in catalog");
    println!();
    println!("Run 'campus admin seed --data-dir {data_dir}' to load demo data.");
    println!();

    Ok(())
}

pub fn run_seed(data_dir: String, password: String) -> anyhow::Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        anyhow::bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let store = init_store(&data_dir)?;
    // Seeding an older database picks up any catalog entries added since.
    store.initialize()?;

    let summary = seed::run_seed(&store, &password)?;

    println!();
    println!("========================================");
    println!("Demo users (password: {password}):");
    for user in &summary.users {
        println!("  {:<22} {}", user.email, user.role.as_str());
    }
    println!();
    println!("Unit: {} ({})", summary.unit.name, summary.unit.id);
    if summary.course.created {
        let counts = summary.course.counts;
        println!(
            "Course '{}' created: {} books, {} units, {} videos, {} activities",
            seed::JOURNEY_COURSE_NAME,
            counts.books,
            counts.units,
            counts.videos,
            counts.activities
        );
    } else {
        println!(
            "Course '{}' already exists ({})",
            seed::JOURNEY_COURSE_NAME,
            summary.course.course_id
        );
    }
    if summary.class_created {
        println!("Demo class created for teacher@demo.com");
    }
    println!("========================================");
    println!();

    Ok(())
}
