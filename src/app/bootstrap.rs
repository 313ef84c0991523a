use crate::config::{load_app_config, AppConfig};
use crate::storage::{FileStore, StorageResult};
use crate::theme::{Appearance, ThemeOptions};

pub struct AppBootstrap {
    pub store: FileStore,
    pub host_appearance: Appearance,
    pub theme_options: ThemeOptions,
}

pub fn bootstrap_app_runtime() -> StorageResult<AppBootstrap> {
    let config = load_app_config();
    bootstrap_from_config(&config)
}

pub(crate) fn bootstrap_from_config(config: &AppConfig) -> StorageResult<AppBootstrap> {
    let store = match config.data_dir.as_ref() {
        Some(dir) => FileStore::with_root(dir.clone()),
        None => FileStore::with_default_root()?,
    };
    let theme_options = config.theme_options();
    let host_appearance = config.fallback_appearance();
    tracing::info!(
        data_dir = %store.root().display(),
        default_accent = %theme_options.default_accent,
        host_appearance = %host_appearance,
        color_overrides = theme_options.color_overrides.is_some(),
        "loaded app config"
    );

    Ok(AppBootstrap {
        store,
        host_appearance,
        theme_options,
    })
}
