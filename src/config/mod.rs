use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::theme::{AccentId, Appearance, ThemeColors, ThemeOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "shotlog";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_accent: Option<String>,
    #[serde(default)]
    pub colors: Option<ThemeColors>,
    /// Used when the host cannot report its appearance.
    #[serde(default)]
    pub host_appearance: Option<String>,
}

impl AppConfig {
    pub fn theme_options(&self) -> ThemeOptions {
        let default_accent = match self.default_accent.as_deref() {
            None => AccentId::default(),
            Some(raw) => raw.parse::<AccentId>().unwrap_or_else(|err| {
                tracing::warn!(%err, "invalid default_accent in config.json; using built-in default");
                AccentId::default()
            }),
        };
        ThemeOptions {
            default_accent,
            color_overrides: self.colors.clone(),
        }
    }

    pub fn fallback_appearance(&self) -> Appearance {
        match self.host_appearance.as_deref() {
            None => Appearance::default(),
            Some(raw) => Appearance::from_host_value(raw).unwrap_or_else(|| {
                tracing::warn!(value = raw, "unrecognized host_appearance in config.json; using dark");
                Appearance::default()
            }),
        }
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(xdg_config_home, home) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(?err, "no config directory; using defaults");
            return AppConfig::default();
        }
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// `<config root>/shotlog/config.json`.
pub(crate) fn app_config_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    Ok(config_root(xdg_config_home, home)?
        .join(APP_DIR)
        .join(APP_CONFIG_FILE))
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
