use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

const APP_DIR: &str = "shotlog";
const RECORD_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = "tmp";

pub mod keys {
    pub const ONBOARDING_STATE: &str = "onboarding_state";
    pub const THEME_PREFERENCE: &str = "theme_preference";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("failed to read record: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write record: {path}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to delete record: {path}")]
    Delete { path: PathBuf, source: io::Error },
    #[error("failed to encode record for key {key}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
    #[error("storage backend rejected write for key {0}")]
    Rejected(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Durable key-value persistence shared by the onboarding and theme controllers.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;
    fn delete(&self, key: &str) -> StorageResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}

fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn with_default_root() -> StorageResult<Self> {
        let (xdg_data_home, home) = data_env_dirs();
        default_data_root(xdg_data_home.as_deref(), home.as_deref()).map(Self::with_root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        let mut path = self.root.clone();
        path.push(format!("{key}.{RECORD_EXTENSION}"));
        Ok(path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.record_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.record_path(key)?;
        let write_error = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(write_error)?;
        // Write next to the target and rename so readers never see a torn record.
        let staging = path.with_extension(format!("{RECORD_EXTENSION}.{TEMP_SUFFIX}"));
        fs::write(&staging, value).map_err(write_error)?;
        if let Err(err) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(write_error(err));
        }
        tracing::trace!(key, bytes = value.len(), "record written");
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete { path, source }),
        }
    }
}

/// Process-local store. Writes can be switched off to simulate a failing disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, Vec<u8>>>,
    reject_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, enabled: bool) {
        self.reject_writes.set(enabled);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    fn check_writable(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        if self.reject_writes.get() {
            return Err(StorageError::Rejected(key.to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.records.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.check_writable(key)?;
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.check_writable(key)?;
        self.records.borrow_mut().remove(key);
        Ok(())
    }
}

pub(crate) fn data_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn default_data_root(
    xdg_data_home: Option<&Path>,
    home: Option<&Path>,
) -> StorageResult<PathBuf> {
    let mut root = match xdg_data_home.filter(|path| !path.as_os_str().is_empty()) {
        Some(xdg) => xdg.to_path_buf(),
        None => home
            .ok_or(StorageError::MissingHomeDirectory)?
            .join(".local")
            .join("share"),
    };
    root.push(APP_DIR);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("shotlog-storage-{pid}-{nanos}"));
        path
    }

    fn with_temp_root<F: FnOnce(&Path)>(f: F) {
        let root = fixture_root();
        fs::create_dir_all(&root).unwrap();
        f(&root);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn file_store_round_trips_bytes_exactly() {
        with_temp_root(|root| {
            let store = FileStore::with_root(root.join("nested"));
            assert!(store.get(keys::ONBOARDING_STATE).unwrap().is_none());

            let payload = br#"{"current_index":3,"dose":0.1}"#;
            store.set(keys::ONBOARDING_STATE, payload).unwrap();
            assert_eq!(
                store.get(keys::ONBOARDING_STATE).unwrap().as_deref(),
                Some(&payload[..])
            );
            assert!(root.join("nested/onboarding_state.json").exists());
        });
    }

    #[test]
    fn file_store_overwrite_leaves_no_staging_file() {
        with_temp_root(|root| {
            let store = FileStore::with_root(root);
            store.set("theme_preference", b"first").unwrap();
            store.set("theme_preference", b"second").unwrap();

            assert_eq!(
                store.get("theme_preference").unwrap(),
                Some(b"second".to_vec())
            );
            assert!(!root.join("theme_preference.json.tmp").exists());
        });
    }

    #[test]
    fn file_store_delete_is_idempotent() {
        with_temp_root(|root| {
            let store = FileStore::with_root(root);
            store.set("theme_preference", b"{}").unwrap();
            store.delete("theme_preference").unwrap();
            store.delete("theme_preference").unwrap();
            assert!(store.get("theme_preference").unwrap().is_none());
        });
    }

    #[test]
    fn keys_outside_the_safe_alphabet_are_rejected() {
        let store = MemoryStore::new();
        for key in ["", "../escape", "a/b", ".hidden", "space key"] {
            let err = store.set(key, b"x").expect_err("key should be rejected");
            assert!(matches!(err, StorageError::InvalidKey(_)), "{key:?}");
        }
    }

    #[test]
    fn memory_store_rejects_writes_when_failing() {
        let store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        store.fail_writes(true);

        assert!(matches!(
            store.set("a", b"2"),
            Err(StorageError::Rejected(_))
        ));
        assert!(matches!(store.delete("a"), Err(StorageError::Rejected(_))));
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));

        store.fail_writes(false);
        store.set("a", b"2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn shared_handles_see_the_same_records() {
        let store = Rc::new(MemoryStore::new());
        let other = Rc::clone(&store);
        store.set("k", b"v").unwrap();
        assert_eq!(other.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn default_data_root_prefers_xdg_data_home() {
        let root = default_data_root(Some(Path::new("/tmp/data")), Some(Path::new("/tmp/home")))
            .expect("root should resolve");
        assert_eq!(root, PathBuf::from("/tmp/data/shotlog"));
    }

    #[test]
    fn default_data_root_falls_back_to_home_local_share() {
        let root = default_data_root(Some(Path::new("")), Some(Path::new("/tmp/home")))
            .expect("root should resolve");
        assert_eq!(root, PathBuf::from("/tmp/home/.local/share/shotlog"));
    }

    #[test]
    fn default_data_root_errors_without_home() {
        assert!(matches!(
            default_data_root(None, None),
            Err(StorageError::MissingHomeDirectory)
        ));
    }
}
