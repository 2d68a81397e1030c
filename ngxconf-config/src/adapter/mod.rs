//! Configuration adapters

mod json;

pub use json::{JsonAdapter, JsonError, Projection};
