//! # ctxpress-core
//!
//! Configuration, config discovery and logging setup shared by the
//! ctxpress crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    expand_path, get_config_home, AdvisorConfig, Config, DiffConfig, LogConfig,
    CURRENT_CONFIG_VERSION, SUPPORTED_CONFIG_VERSIONS,
};
pub use error::{CoreError, CoreResult};
