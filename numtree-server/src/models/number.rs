//! Numeric inputs: root post values and reply operands

use super::ValidationError;

/// Value of a root post (finite)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostValue(f64);

impl PostValue {
    /// ```
    /// use numtree_server::models::PostValue;
    ///
    /// assert!(PostValue::new(-15.5).is_ok());
    /// assert!(PostValue::new(f64::NAN).is_err());
    /// ```
    pub fn new(v: f64) -> Result<Self, ValidationError> {
        finite(v, "value").map(Self)
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

/// Right-hand side of a reply's operation (finite; zero is allowed here and
/// rejected only by division)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operand(f64);

impl Operand {
    pub fn new(v: f64) -> Result<Self, ValidationError> {
        finite(v, "operand").map(Self)
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

fn finite(v: f64, field: &'static str) -> Result<f64, ValidationError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}
