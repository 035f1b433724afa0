//! numtree-core: domain logic for derived-value reply trees
//!
//! Posts hold numbers; replies derive their number from the parent through
//! an [`OperationKind`]. This crate owns the arithmetic, the invariant checks
//! and the tree assembly, with no I/O beyond reading a config file.

pub mod config;
pub mod derivation;
pub mod error;
pub mod operation;
pub mod tree;

pub use config::NumtreeConfig;
pub use derivation::{audit_post, render_chain, values_match, Derivation, Violation};
pub use error::{CoreError, Result};
pub use operation::OperationKind;
pub use tree::{build_tree, Tree, TreeNode, TreeStats};
