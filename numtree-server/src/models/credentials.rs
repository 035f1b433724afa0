//! Username and password validation

use std::fmt;

use super::ValidationError;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 20;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Create a new username.
    ///
    /// # Rules
    /// - 3 to 20 characters
    /// - ASCII letters, digits, `_`, `.` and `-` only
    ///
    /// # Example
    /// ```
    /// use numtree_server::models::Username;
    ///
    /// assert!(Username::new("ada_l").is_ok());
    /// assert!(Username::new("ab").is_err());
    /// assert!(Username::new("has space").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let len = s.chars().count();

        if len == 0 {
            return Err(ValidationError::Empty { field: "username" });
        }

        if len < MIN_USERNAME_LEN {
            return Err(ValidationError::TooShort {
                field: "username",
                min: MIN_USERNAME_LEN,
            });
        }

        if len > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "only letters, digits, '_', '.' and '-' are allowed",
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Get the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated plaintext password, only ever handed to the hasher.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Create a new password.
    ///
    /// # Rules
    /// - 6 to 128 characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let len = s.chars().count();

        if len < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }

        if len > MAX_PASSWORD_LEN {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}
