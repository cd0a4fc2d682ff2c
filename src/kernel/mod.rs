//! Headless search core: controller + services.

pub mod search;
pub mod services;

pub use search::{InputHistory, SearchController, SearchInputs};
