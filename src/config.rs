use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::logging::{LogConfig, LogFormat};
use crate::menu::ShortcutPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// How the menu builder treats shortcuts that do not parse.
    #[serde(default)]
    pub shortcut_policy: ShortcutPolicy,

    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub activation_policy: ActivationPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSettings {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub format: Option<LogFormat>,

    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Whether the app gets a Dock icon and main menu (`regular`) or lives only
/// in the status bar (`accessory`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationPolicy {
    #[default]
    Regular,
    Accessory,
}

impl Config {
    /// Logging setup from the config file, with `verbosity` (count of `-v`)
    /// raising the level further.
    pub fn log_config(&self, verbosity: u8) -> Result<LogConfig> {
        let mut log = LogConfig::from_verbosity(verbosity);
        if verbosity == 0 {
            if let Some(level) = self.log.level.as_deref() {
                let level = level
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid log level '{level}'"))?;
                log = log.with_level(level);
            }
        }
        if let Some(format) = self.log.format {
            log = log.with_format(format);
        }
        Ok(log.with_log_file(self.log.file.clone()))
    }
}

/// Loads the config file if one exists; a missing file yields `None`.
pub fn load_optional() -> Result<Option<Config>> {
    let Some(path) = resolve_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg: Config =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(cfg))
}

pub fn load_or_default() -> Result<Config> {
    Ok(load_optional()?.unwrap_or_default())
}

/// Config file lookup, first match wins:
///
/// 1. `$GALLIUM_CONFIG`, if set and non-blank (need not exist yet).
/// 2. `./gallium.json`, if it exists.
/// 3. `$HOME/.config/gallium/config.json`, whether or not it exists, so
///    `gallium config-path` shows where a per-user file would go.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("GALLIUM_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    let local = PathBuf::from("gallium.json");
    if local.exists() {
        return Some(local);
    }

    if let Some(home) = env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config").join("gallium").join("config.json"));
    }

    None
}
