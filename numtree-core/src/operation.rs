//! Arithmetic operations linking a reply to its parent's value

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The four operations a reply can apply to its parent's value.
///
/// Serialized (and stored) as the lowercase word: `"add"`, `"subtract"`,
/// `"multiply"`, `"divide"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl OperationKind {
    /// All variants, in display order
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Add,
        OperationKind::Subtract,
        OperationKind::Multiply,
        OperationKind::Divide,
    ];

    /// Storage / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Subtract => "subtract",
            OperationKind::Multiply => "multiply",
            OperationKind::Divide => "divide",
        }
    }

    /// Infix symbol used when rendering expressions
    pub fn symbol(&self) -> char {
        match self {
            OperationKind::Add => '+',
            OperationKind::Subtract => '-',
            OperationKind::Multiply => '*',
            OperationKind::Divide => '/',
        }
    }

    /// Apply this operation to a parent value.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DivisionByZero`] when dividing by `0.0` or `-0.0`
    /// - [`CoreError::NonFiniteResult`] when the result overflows to
    ///   infinity or is NaN
    ///
    /// # Example
    ///
    /// ```
    /// use numtree_core::OperationKind;
    ///
    /// assert_eq!(OperationKind::Add.apply(10.0, 5.0).unwrap(), 15.0);
    /// assert!(OperationKind::Divide.apply(10.0, 0.0).is_err());
    /// ```
    pub fn apply(&self, parent: f64, operand: f64) -> Result<f64> {
        let result = match self {
            OperationKind::Add => parent + operand,
            OperationKind::Subtract => parent - operand,
            OperationKind::Multiply => parent * operand,
            OperationKind::Divide => {
                if operand == 0.0 {
                    return Err(CoreError::DivisionByZero);
                }
                parent / operand
            }
        };

        if !result.is_finite() {
            return Err(CoreError::NonFiniteResult {
                parent,
                symbol: self.symbol(),
                operand,
            });
        }

        Ok(result)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(OperationKind::Add),
            "subtract" => Ok(OperationKind::Subtract),
            "multiply" => Ok(OperationKind::Multiply),
            "divide" => Ok(OperationKind::Divide),
            other => Err(CoreError::unknown_operation(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_each_operation() {
        assert_eq!(OperationKind::Add.apply(10.0, 5.0).unwrap(), 15.0);
        assert_eq!(OperationKind::Subtract.apply(10.0, 3.0).unwrap(), 7.0);
        assert_eq!(OperationKind::Multiply.apply(10.0, 4.0).unwrap(), 40.0);
        assert_eq!(OperationKind::Divide.apply(10.0, 2.0).unwrap(), 5.0);
    }

    #[test]
    fn decimal_division() {
        let v = OperationKind::Divide.apply(10.0, 3.0).unwrap();
        assert!((v - 3.333333).abs() < 1e-5);
    }

    #[test]
    fn negative_values() {
        assert_eq!(OperationKind::Add.apply(-15.5, 5.5).unwrap(), -10.0);
        assert_eq!(OperationKind::Multiply.apply(-2.0, -3.0).unwrap(), 6.0);
    }

    #[test]
    fn rejects_division_by_zero() {
        assert!(matches!(
            OperationKind::Divide.apply(10.0, 0.0),
            Err(CoreError::DivisionByZero)
        ));
        assert!(matches!(
            OperationKind::Divide.apply(10.0, -0.0),
            Err(CoreError::DivisionByZero)
        ));
    }

    #[test]
    fn zero_operand_fine_for_other_operations() {
        assert_eq!(OperationKind::Add.apply(3.0, 0.0).unwrap(), 3.0);
        assert_eq!(OperationKind::Multiply.apply(3.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn rejects_overflow() {
        let err = OperationKind::Multiply.apply(f64::MAX, 2.0).unwrap_err();
        assert!(matches!(err, CoreError::NonFiniteResult { symbol: '*', .. }));

        let err = OperationKind::Divide.apply(f64::MAX, 1e-300).unwrap_err();
        assert!(matches!(err, CoreError::NonFiniteResult { .. }));
    }

    #[test]
    fn parses_names() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
        assert!("power".parse::<OperationKind>().is_err());
        assert!("Add".parse::<OperationKind>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&OperationKind::Multiply).unwrap();
        assert_eq!(json, "\"multiply\"");

        let kind: OperationKind = serde_json::from_str("\"divide\"").unwrap();
        assert_eq!(kind, OperationKind::Divide);

        assert!(serde_json::from_str::<OperationKind>("\"power\"").is_err());
    }
}
