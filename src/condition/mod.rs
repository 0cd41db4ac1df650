//! Condition trees: discrimination, validation and evaluation
//!
//! This module turns a rule's tag-less `required_config` JSON into a
//! [`ConditionNode`] tree, validates it into a [`ValidatedCondition`] and
//! evaluates that against a [`PropertyBag`](crate::property::PropertyBag).

mod ast;
pub mod cache;
mod evaluator;
pub mod parser;
mod path;
mod validator;


pub use ast::*;
pub use cache::*;
pub use evaluator::*;
pub use parser::*;
pub use path::*;
pub use validator::*;
