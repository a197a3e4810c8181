//! Layered configuration loading with figment.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. [`ConduitConfig::default`]
//! 2. `conduit.{profile}.{ext}` in each search directory
//! 3. `conduit.{ext}` in each search directory
//! 4. `CONDUIT_*` environment variables, `__` separating nested keys
//! 5. overrides set on the loader ([`merge`](ConfigLoader::merge),
//!    [`queues`](ConfigLoader::queues), [`log_level`](ConfigLoader::log_level))
//!
//! `ext` is `toml` with the `toml-config` feature and `yaml`/`yml` with
//! `yaml-config`. Without a search directory the current directory is used.
//!
//! ```rust,ignore
//! // CONDUIT_EVENT_BUS__QUEUES=[mail,audit] CONDUIT_COMMAND_BUS__NAME=orders
//! let config = ConfigLoader::new()
//!     .profile("staging")
//!     .queues(["mail", "audit", "billing"])
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::{ConduitConfig, LogLevel};

/// Prefix of the environment variables merged into the configuration.
pub const ENV_PREFIX: &str = "CONDUIT_";

/// Environment variable selecting the profile file.
pub const PROFILE_ENV: &str = "CONDUIT_PROFILE";

const FILE_STEM: &str = "conduit";

/// File extensions enabled by the config format features.
fn extensions() -> &'static [&'static str] {
    #[cfg(all(feature = "toml-config", feature = "yaml-config"))]
    return &["toml", "yaml", "yml"];
    #[cfg(all(feature = "toml-config", not(feature = "yaml-config")))]
    return &["toml"];
    #[cfg(all(feature = "yaml-config", not(feature = "toml-config")))]
    return &["yaml", "yml"];
    #[cfg(not(any(feature = "toml-config", feature = "yaml-config")))]
    return &[];
}

/// Builds a [`ConduitConfig`] from files, the environment and overrides.
#[derive(Debug)]
pub struct ConfigLoader {
    profile: Option<String>,
    directories: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader reading the profile from `CONDUIT_PROFILE`.
    pub fn new() -> Self {
        Self {
            profile: std::env::var(PROFILE_ENV).ok().filter(|p| !p.is_empty()),
            directories: Vec::new(),
            file: None,
            env: true,
            overrides: Figment::new(),
        }
    }

    /// Selects the profile file merged below the main file.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// The selected profile, if any.
    pub fn selected_profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Adds a directory searched for `conduit.*` files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.directories.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Merges `CONDUIT_*` variables (the default).
    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Overrides the whole configuration.
    pub fn merge(mut self, config: ConduitConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Overrides the event bus delivery queues.
    pub fn queues<I, S>(mut self, queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queues: Vec<String> = queues.into_iter().map(Into::into).collect();
        self.overrides = self
            .overrides
            .merge(Serialized::default("event_bus.queues", queues));
        self
    }

    /// Overrides the global log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.overrides = self
            .overrides
            .merge(Serialized::default("logging.level", level));
        self
    }

    /// Loads the configuration.
    pub fn load(self) -> ConfigResult<ConduitConfig> {
        let profile = self.profile.clone();
        let (figment, files) = self.into_figment()?;

        let config: ConduitConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("Failed to extract configuration: {e}")))?;

        debug!(
            profile = profile.as_deref().unwrap_or("none"),
            files = ?files,
            command_bus = %config.command_bus.name,
            query_bus = %config.query_bus.name,
            event_bus = %config.event_bus.name,
            queues = ?config.event_bus.queues,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn into_figment(self) -> ConfigResult<(Figment, Vec<PathBuf>)> {
        let mut figment = Figment::from(Serialized::defaults(ConduitConfig::default()));
        let mut files = Vec::new();

        match &self.file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => {
                figment = merge_file(figment, path)?;
                files.push(path.clone());
            }
            None => {
                for path in self.discover() {
                    figment = merge_file(figment, &path)?;
                    files.push(path);
                }
            }
        }

        if self.env {
            trace!(prefix = ENV_PREFIX, "Merging environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }

        Ok((figment.merge(self.overrides), files))
    }

    /// Config files present in the search directories, lowest precedence first.
    fn discover(&self) -> Vec<PathBuf> {
        let directories = if self.directories.is_empty() {
            std::env::current_dir().into_iter().collect()
        } else {
            self.directories.clone()
        };

        let mut names: Vec<String> = Vec::new();
        if let Some(profile) = &self.profile {
            names.extend(extensions().iter().map(|ext| format!("{FILE_STEM}.{profile}.{ext}")));
        }
        names.extend(extensions().iter().map(|ext| format!("{FILE_STEM}.{ext}")));

        let found: Vec<PathBuf> = names
            .iter()
            .flat_map(|name| directories.iter().map(move |dir| dir.join(name)))
            .filter(|path| path.is_file())
            .collect();

        if found.is_empty() {
            debug!(directories = ?directories, "No configuration file found, using defaults");
        }
        found
    }
}

fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file_exact(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file_exact(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads the configuration from the current directory and `CONDUIT_*` variables.
pub fn load_config() -> ConfigResult<ConduitConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path`, with `CONDUIT_*` variables on top.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ConduitConfig> {
    ConfigLoader::new().file(path).load()
}
