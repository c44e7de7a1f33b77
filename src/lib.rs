//! # Campus
//!
//! Administrative backend for language schools: school units, staff and
//! students, a Course → Book → Unit → Video → Activity curriculum, weekly
//! class scheduling and attendance, all behind role-based permissions with
//! per-user overrides. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! campus = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use campus::server::{AppState, create_router};
//! use campus::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/campus.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     session_ttl_hours: 24,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod seed;
pub mod server;
pub mod store;
pub mod types;
