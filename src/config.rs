use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::github::GitHubOptions;
use crate::paths::paths;
use crate::vcs::Registry;
use crate::{git, github};

/// Top-level configuration structure loaded from `config.toml`.
///
/// Every key is optional; a missing file behaves like an empty one.
///
/// Example TOML:
/// ```toml
/// default_backend = "github"
///
/// [github]
/// api_url  = "https://api.github.com"
/// per_page = 100
///
/// [backends.git]
/// default_branch = "main"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Backend used when `--vcs` is not given.
    pub default_backend: Option<String>,
    pub github: GitHubOptions,
    /// Per-backend overrides, keyed by backend name.
    pub backends: BTreeMap<String, BackendSettings>,
}

/// Overrides for a single registered backend.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendSettings {
    pub default_branch: Option<String>,
}

impl Settings {
    /// Build the backend registry these settings describe.
    ///
    /// Starts from the bundled backends (GitHub configured from the
    /// `[github]` section) and re-registers every backend that has a
    /// `[backends.<name>]` override.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownBackend`] if an override names a
    /// backend that is not registered.
    pub fn registry(&self) -> crate::Result<Registry> {
        let mut registry = Registry::new();
        registry.register(git::descriptor());
        registry.register(github::descriptor(self.github.clone()));

        for (name, overrides) in &self.backends {
            let mut descriptor = registry.resolve(name)?.clone();
            if let Some(branch) = &overrides.default_branch {
                descriptor.default_branch = branch.clone();
            }
            registry.register(descriptor);
        }
        Ok(registry)
    }

    /// The backend to use: `explicit` if given, else `default_backend`,
    /// else git.
    pub fn backend<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_backend.as_deref())
            .unwrap_or(git::NAME)
    }
}

/// Load and parse `config.toml` from the metior home directory.
///
/// # Errors
/// - Returns an error if the file exists but cannot be read.
/// - Returns an error if parsing the TOML fails.
pub fn load_config() -> Result<Settings> {
    let p = paths()?;
    load_config_from(&p.config)
}

/// Load and parse the configuration file at `path`.
///
/// A missing file yields [`Settings::default`].
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config_from(path: &Path) -> Result<Settings> {
    let txt = match fs::read_to_string(path) {
        Ok(txt) => txt,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let cfg: Settings =
        toml::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}
