//! Parent -> child derivations: recomputation checks and chain rendering

use std::fmt;

use crate::error::{CoreError, Result};
use crate::operation::OperationKind;

/// Relative tolerance when comparing a stored value to its recomputation.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// One stored parent -> child edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivation {
    pub parent_value: f64,
    pub kind: OperationKind,
    pub operand: f64,
    pub stored_value: f64,
}

impl Derivation {
    /// Recompute the child value and compare it with what was stored.
    ///
    /// Returns the recomputed value on success.
    pub fn check(&self) -> Result<f64> {
        let expected = self.kind.apply(self.parent_value, self.operand)?;
        if values_match(expected, self.stored_value) {
            Ok(expected)
        } else {
            Err(CoreError::Mismatch {
                expected,
                stored: self.stored_value,
            })
        }
    }
}

/// A broken structural or arithmetic invariant on one post.
#[derive(Debug)]
pub enum Violation {
    /// Root post carrying an operation record
    RootWithOperation,
    /// Reply without an operation record
    MissingOperation,
    /// Stored value does not follow from the parent
    Derivation(CoreError),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::RootWithOperation => write!(f, "root post has an operation"),
            Violation::MissingOperation => write!(f, "reply has no operation"),
            Violation::Derivation(e) => write!(f, "{}", e),
        }
    }
}

/// Check one post against the derivation rules.
///
/// `parent_value` is `None` for a root post. `operation` is the post's own
/// operation record, if any.
pub fn audit_post(
    parent_value: Option<f64>,
    operation: Option<(OperationKind, f64)>,
    stored_value: f64,
) -> std::result::Result<(), Violation> {
    match (parent_value, operation) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(Violation::RootWithOperation),
        (Some(_), None) => Err(Violation::MissingOperation),
        (Some(parent_value), Some((kind, operand))) => Derivation {
            parent_value,
            kind,
            operand,
            stored_value,
        }
        .check()
        .map(|_| ())
        .map_err(Violation::Derivation),
    }
}

/// Compare two doubles with a relative tolerance (absolute near zero).
pub fn values_match(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= RELATIVE_TOLERANCE * scale
}

/// Render a root-to-node path as a fully parenthesised expression.
///
/// ```
/// use numtree_core::{render_chain, OperationKind};
///
/// let steps = [(OperationKind::Add, 5.0), (OperationKind::Multiply, 2.0)];
/// assert_eq!(render_chain(10.0, &steps), "((10 + 5) * 2)");
/// ```
pub fn render_chain(root_value: f64, steps: &[(OperationKind, f64)]) -> String {
    steps
        .iter()
        .fold(format_number(root_value), |acc, (kind, operand)| {
            format!("({} {} {})", acc, kind.symbol(), format_number(*operand))
        })
}

fn format_number(v: f64) -> String {
    // Display drops the trailing ".0" on whole numbers
    format!("{}", v)
}
