//! Configuration Management
//!
//! Hierarchical resolution:
//! 1. Built-in defaults
//! 2. Project config (finassist.toml)
//! 3. Environment variables (FINASSIST_*)

mod loader;
mod types;

pub use loader::{ConfigLoader, PROJECT_CONFIG_FILE};
pub use types::{Config, LimitsConfig};
