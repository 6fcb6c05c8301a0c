//! Shared utilities

pub mod config;
pub mod diagnostic;

pub use config::{Properties, PropertiesFile};
pub use diagnostic::Diagnostic;
