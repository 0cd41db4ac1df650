//! Rules - a target plus a required configuration, assessed per resource

mod compiled;
mod model;
mod resource;

pub use compiled::*;
pub use model::*;
pub use resource::*;
