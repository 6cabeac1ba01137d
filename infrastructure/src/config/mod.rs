//! Configuration file loading for toolweave
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOLWEAVE_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./toolweave.toml` or `./.toolweave.toml`
//! 4. Global: `$XDG_CONFIG_HOME/toolweave/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBuiltinConfig, FileConfig, FileDiscoveryConfig,
    FileExecutionConfig, FileLoggingConfig, FileProxyConfig, FileProxyParameter,
    FileProxyToolConfig, FileResilienceConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
