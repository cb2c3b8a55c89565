pub mod aggregate;
pub mod discovery;
pub mod error;
pub mod ordered;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod settings;

pub use error::{Error, Result};
