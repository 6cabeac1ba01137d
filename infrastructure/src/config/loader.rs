//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["toolweave.toml", ".toolweave.toml"];
const ENV_PREFIX: &str = "TOOLWEAVE_";

/// One place configuration may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: &'static str,
    pub location: String,
    pub found: bool,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOLWEAVE_` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./toolweave.toml` or `./.toolweave.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/toolweave/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Load a single file over the defaults, ignoring every other source
    pub fn load_file(path: &Path) -> Result<FileConfig, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolweave").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Configuration sources in priority order, highest first
    pub fn sources(config_path: Option<&Path>) -> Vec<ConfigSource> {
        let mut sources = vec![ConfigSource {
            label: "Environment",
            location: format!("{}*", ENV_PREFIX),
            found: std::env::vars().any(|(key, _)| key.starts_with(ENV_PREFIX)),
        }];

        if let Some(path) = config_path {
            sources.push(ConfigSource {
                label: "Explicit",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }

        sources.push(match Self::project_config_path() {
            Some(path) => ConfigSource {
                label: "Project",
                location: path.display().to_string(),
                found: true,
            },
            None => ConfigSource {
                label: "Project",
                location: PROJECT_FILES.map(|f| format!("./{}", f)).join(" or "),
                found: false,
            },
        });

        if let Some(path) = Self::global_config_path() {
            sources.push(ConfigSource {
                label: "Global",
                location: path.display().to_string(),
                found: path.exists(),
            });
        }

        sources.push(ConfigSource {
            label: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        });
        sources
    }
}
