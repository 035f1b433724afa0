//! Authentication: password hashing and cookie sessions

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, verify_unknown_user, PasswordError};
pub use session::{generate_token, SessionSettings, SESSION_COOKIE};
