//! Target selection - decides which resources a rule applies to

mod matcher;

pub use matcher::*;
