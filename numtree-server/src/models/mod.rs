//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod credentials;
pub mod number;
pub mod pagination;

pub use validation::ValidationError;
pub use credentials::{Password, Username};
pub use number::{Operand, PostValue};
pub use pagination::{Paginated, Pagination, PaginationParams};
