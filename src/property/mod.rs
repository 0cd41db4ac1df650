//! Resource property bags handed to the evaluator

mod bag;
mod value;

#[cfg(test)]
mod property_tests;

pub use bag::*;
pub use value::*;
