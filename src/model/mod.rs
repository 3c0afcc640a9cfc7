pub mod classifier;
pub mod engine;
pub mod labels;
pub mod loader;
pub mod registry;
