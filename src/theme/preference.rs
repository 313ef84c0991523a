use serde::{Deserialize, Serialize};

use crate::storage::{keys, KeyValueStore, StorageError, StorageResult};

use super::{AccentId, ThemeMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThemePreference {
    pub mode: ThemeMode,
    pub accent: AccentId,
}

/// Stored shape read field by field, so one bad value does not discard the other.
#[derive(Debug, Default, Deserialize)]
struct StoredPreference {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    accent: Option<String>,
}

impl ThemePreference {
    pub fn with_default_accent(default_accent: AccentId) -> Self {
        Self {
            mode: ThemeMode::default(),
            accent: default_accent,
        }
    }
}

pub(crate) fn load_preference(store: &impl KeyValueStore, default_accent: AccentId) -> ThemePreference {
    let fallback = ThemePreference::with_default_accent(default_accent);
    let bytes = match store.get(keys::THEME_PREFERENCE) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return fallback,
        Err(err) => {
            tracing::warn!(?err, "failed to read theme preference; using defaults");
            return fallback;
        }
    };
    let stored: StoredPreference = match serde_json::from_slice(&bytes) {
        Ok(stored) => stored,
        Err(err) => {
            tracing::warn!(?err, "failed to parse theme preference; using defaults");
            return fallback;
        }
    };

    let mode = stored
        .mode
        .map(|raw| {
            raw.parse::<ThemeMode>().unwrap_or_else(|err| {
                tracing::warn!(%err, "stored theme mode is invalid; using system");
                fallback.mode
            })
        })
        .unwrap_or(fallback.mode);
    let accent = stored
        .accent
        .map(|raw| {
            raw.parse::<AccentId>().unwrap_or_else(|err| {
                tracing::warn!(%err, fallback = %default_accent, "stored accent is invalid; using default accent");
                default_accent
            })
        })
        .unwrap_or(default_accent);

    ThemePreference { mode, accent }
}

pub(crate) fn save_preference(
    store: &impl KeyValueStore,
    preference: &ThemePreference,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec(preference).map_err(|source| StorageError::Encode {
        key: keys::THEME_PREFERENCE.to_string(),
        source,
    })?;
    store.set(keys::THEME_PREFERENCE, &bytes)
}
