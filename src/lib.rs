pub mod animals;
pub mod config;
pub mod error;
pub mod model;
pub mod news;
pub mod preprocessing;
pub mod server;
pub mod telemetry;

#[cfg(test)]
mod test_support;

// Re-export common types
pub use error::{AppError, ErrorKind};
pub use model::classifier::{Classifier, Prediction};
