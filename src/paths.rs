use anyhow::{Result, bail};
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Paths {
    pub config: PathBuf,
}

/// `$XDG_CONFIG_HOME/metior`, or `$HOME/.config/metior` when XDG is unset.
pub fn metior_home() -> Result<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("metior"));
    }
    match env::var_os("HOME").filter(|v| !v.is_empty()) {
        Some(home) => Ok(PathBuf::from(home).join(".config").join("metior")),
        None => bail!("cannot locate the config directory: neither XDG_CONFIG_HOME nor HOME is set"),
    }
}

pub fn paths() -> Result<Paths> {
    let home = metior_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
    })
}
