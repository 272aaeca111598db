pub mod file;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::fields::FieldName;

pub use file::JsonFileStore;

pub const THEME_KEY_PREFIX: &str = "theme-";
pub const LATEST_KEY_PREFIX: &str = "latest-";
pub const PREVIOUS_CSS_KEY: &str = "previousCSS";

pub fn theme_key(name: &str) -> String {
    format!("{}{}", THEME_KEY_PREFIX, name)
}

pub fn latest_key(field: FieldName) -> String {
    format!("{}{}", LATEST_KEY_PREFIX, field.as_str())
}

/// Theme name encoded in a `theme-<name>` key.
pub fn theme_name_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(THEME_KEY_PREFIX)
}

/// Field encoded in a `latest-<field>` key; unknown fields yield `None`.
pub fn field_from_latest_key(key: &str) -> Option<FieldName> {
    key.strip_prefix(LATEST_KEY_PREFIX)?.parse().ok()
}

/// Asynchronous string key-value storage.
///
/// A successful `set` or `remove` has reached the backing medium.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Every stored entry.
    async fn get_all(&self) -> Result<BTreeMap<String, String>, StorageError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store with nothing behind it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    async fn get_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        (**self).get_all().await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }
}
