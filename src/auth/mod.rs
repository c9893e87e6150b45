mod helpers;
mod middleware;
mod token;

pub use middleware::{AuthError, RequireUser};
pub use token::{SessionTokenGenerator, hash_password, parse_token, verify_password};
