pub mod document;
pub mod engine;
pub mod placeholders;
pub mod resolver;

#[cfg(test)]
pub(crate) mod fixtures;

pub use document::{Document, DocumentError};
pub use engine::FillReport;
