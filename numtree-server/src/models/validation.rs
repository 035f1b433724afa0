//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field is shorter than its minimum length
    TooShort { field: &'static str, min: usize },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Number is NaN or infinite
    NotFinite { field: &'static str },

    /// Request body could not be parsed at all
    Malformed { reason: String },

    /// Query string could not be parsed
    MalformedQuery { reason: String },
}

impl ValidationError {
    /// Name of the offending field (`"body"` for unparseable input)
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::NotFinite { field } => field,
            Self::Malformed { .. } => "body",
            Self::MalformedQuery { .. } => "query",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::NotFinite { field } => write!(f, "{} must be a finite number", field),
            Self::Malformed { reason } | Self::MalformedQuery { reason } => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}
