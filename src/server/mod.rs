pub mod access;
mod curriculum;
mod directory;
pub mod dto;
mod permissions;
pub mod response;
mod router;
mod schedule;
mod session;
pub mod validation;

pub use router::{AppState, create_router};
