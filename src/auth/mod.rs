mod helpers;
mod middleware;
mod token;

pub use middleware::{AuthError, RequireAuth};
pub use token::{TokenGenerator, hash_password, parse_token, verify_password};
