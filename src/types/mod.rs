mod curriculum;
mod models;
pub mod permission;
mod schedule;

pub use curriculum::*;
pub use models::*;
pub use permission::{PermissionOverride, PermissionSet, Role, resolve};
pub use schedule::*;
