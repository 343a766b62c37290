//! Utility functions and helpers.

pub mod logging;
pub mod settings;

pub use logging::init_tracing;
pub use settings::Settings;
