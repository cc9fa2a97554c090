//! Schema module - Configuration and scenario types for stellar wind runs.

mod config;
mod scenario;

pub use config::*;
pub use scenario::*;
