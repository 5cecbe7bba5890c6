//! Safety Configuration Module
//!
//! Provides deployment configuration loaded from TOML files, so every
//! escalation threshold and delivery timeout is operator-tunable without a
//! code change.
//!
//! ## Loading Order
//!
//! 1. `SAFETRACK_CONFIG` environment variable (path to TOML file)
//! 2. `safetrack.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The loaded config is handed to constructors; nothing reads it from a
//! process-wide global:
//!
//! ```ignore
//! let config = SafetyConfig::load();
//! let generator = llm::build_generator(&config.generator);
//! let orchestrator = Orchestrator::new(&config, generator);
//! ```

mod safety_config;
pub mod defaults;
pub mod validation;

pub use safety_config::*;
