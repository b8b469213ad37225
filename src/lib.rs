pub mod config;
pub mod error;

// Repository location and branch listing
pub mod github;

// Checkout, analysis and formatting
pub mod analysis;
pub mod report;
pub mod service;
pub mod workspace;

// HTTP surface
pub mod api;

pub mod cli;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
