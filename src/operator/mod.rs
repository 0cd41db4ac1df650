//! Operator catalog
//!
//! The fixed set of comparison operators a rule may use, together with the
//! operand contract (arity and value shape) each one imposes.

mod catalog;
mod operand;

pub use catalog::*;
pub use operand::*;
