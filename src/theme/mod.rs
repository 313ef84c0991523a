//! Theme resolution: user mode and accent preference layered over the host
//! appearance, producing one immutable [`ResolvedTheme`] snapshot at a time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod accent;
pub mod appearance;
pub mod engine;
pub mod preference;
pub mod tokens;

pub use accent::{AccentId, AccentSwatch, UnknownAccentError, ACCENT_PALETTE};
pub use appearance::AppearanceSignal;
pub use engine::{
    connect_appearance, resolve_theme, ResolvedTheme, SharedThemeEngine, ThemeEngine,
    ThemeOptions,
};
pub use preference::ThemePreference;
pub use tokens::{
    default_color_tokens, resolve_color_tokens, ColorOverrides, ColorTokens, ThemeColors,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

/// Light or dark, as reported by the host or after resolving `ThemeMode::System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    Light,
    #[default]
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme mode: {0:?}")]
pub struct UnknownThemeMode(pub String);

impl ThemeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn resolve(self, host: Appearance) -> Appearance {
        match self {
            Self::System => host,
            Self::Light => Appearance::Light,
            Self::Dark => Appearance::Dark,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = UnknownThemeMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownThemeMode(value.to_string())),
        }
    }
}

impl Appearance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Interpret a host-reported scheme or theme name ("dark", "Adwaita-dark",
    /// "UIUserInterfaceStyleLight"). `None` when the value names neither.
    pub fn from_host_value(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if normalized.contains("dark") {
            return Some(Self::Dark);
        }
        if normalized.contains("light") {
            return Some(Self::Light);
        }
        None
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
