//! Description of the shape a response is expected to have.
//!
//! Selection sets are built by the caller, usually by generated code, and are read-only during
//! a traversal.

mod field_type;
mod operation;
mod selection;

pub use field_type::*;
pub use operation::*;
pub use selection::*;

pub(crate) const TYPENAME: &str = "__typename";
