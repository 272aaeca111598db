use std::collections::BTreeMap;

use crate::error::{Result, StyleError};
use crate::fields::FieldSet;
use crate::storage::{theme_key, theme_name_from_key, KeyValueStore};

use super::document::ThemeDocument;

/// Dropdown placeholder; never a theme.
pub const RESERVED_THEME_NAME: &str = "Select a theme...";

/// Seeded when no theme exists, so there is always something to pick.
pub const DEFAULT_THEME_NAME: &str = "No theme";

/// Rejects names that cannot identify a theme.
pub fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name == RESERVED_THEME_NAME {
        return Err(StyleError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Named field set snapshots with a write-through persisted mirror.
///
/// Every mutation updates the in-memory map first and then awaits the write of
/// its `theme-<name>` key. When that write fails the error is returned and the
/// map keeps the change; the mirror is stale until the next successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeStore {
    themes: BTreeMap<String, FieldSet>,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the `theme-*` entries of a full storage dump. Entries with an
    /// unusable name or that are not valid field set JSON are skipped.
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Self {
        let mut themes = BTreeMap::new();
        for (key, value) in entries {
            let Some(name) = theme_name_from_key(key) else {
                continue;
            };
            if let Err(e) = check_name(name) {
                tracing::warn!(theme = name, error = %e, "skipping theme with invalid name");
                continue;
            }
            match FieldSet::from_json(value) {
                Ok(decoded) => {
                    if !decoded.unknown.is_empty() {
                        tracing::warn!(theme = name, unknown = ?decoded.unknown, "ignoring unknown fields");
                    }
                    themes.insert(name.to_string(), decoded.fields);
                }
                Err(e) => tracing::warn!(theme = name, error = %e, "skipping unreadable theme"),
            }
        }
        Self { themes }
    }

    /// Loads the themes of a storage dump taken from `store` and seeds the
    /// default one if none exist.
    pub async fn open_from<S: KeyValueStore + ?Sized>(
        entries: &BTreeMap<String, String>,
        store: &S,
    ) -> Result<Self> {
        let mut themes = Self::from_entries(entries);
        themes.seed_if_empty(store).await?;
        Ok(themes)
    }

    /// Seeds an empty store with [`DEFAULT_THEME_NAME`]. Returns whether it did.
    pub async fn seed_if_empty<S: KeyValueStore + ?Sized>(&mut self, store: &S) -> Result<bool> {
        if !self.themes.is_empty() {
            return Ok(false);
        }
        tracing::info!(theme = DEFAULT_THEME_NAME, "seeding default theme");
        self.write(store, DEFAULT_THEME_NAME, FieldSet::new()).await?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    /// Theme names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    /// The snapshot stored under `name`. It covers the whole vocabulary:
    /// a field it does not carry is blank.
    pub fn load(&self, name: &str) -> Result<FieldSet> {
        self.themes
            .get(name)
            .cloned()
            .ok_or_else(|| StyleError::NotFound(name.to_string()))
    }

    /// Stores `fields` under `name`, replacing any theme already there.
    pub async fn create<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        fields: FieldSet,
    ) -> Result<()> {
        check_name(name)?;
        tracing::info!(theme = name, replaced = self.contains(name), "creating theme");
        self.write(store, name, fields).await
    }

    pub async fn overwrite<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        fields: FieldSet,
    ) -> Result<()> {
        if !self.contains(name) {
            return Err(StyleError::NotFound(name.to_string()));
        }
        tracing::info!(theme = name, "overwriting theme");
        self.write(store, name, fields).await
    }

    /// Moves a theme to a new name, keeping its fields.
    pub async fn rename<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        from: &str,
        to: &str,
    ) -> Result<()> {
        if !self.contains(from) {
            return Err(StyleError::NotFound(from.to_string()));
        }
        if from == to {
            return Ok(());
        }
        check_name(to)?;
        if self.contains(to) {
            return Err(StyleError::Conflict(to.to_string()));
        }

        let Some(fields) = self.themes.remove(from) else {
            return Err(StyleError::NotFound(from.to_string()));
        };
        let json = fields.to_json();
        self.themes.insert(to.to_string(), fields);
        tracing::info!(from, to, "renaming theme");

        // New key first: an interruption leaves a duplicate, never a loss.
        store.set(&theme_key(to), &json).await?;
        store.remove(&theme_key(from)).await?;
        Ok(())
    }

    /// Removes a theme. Deleting the last one leaves the store empty.
    pub async fn delete<S: KeyValueStore + ?Sized>(&mut self, store: &S, name: &str) -> Result<()> {
        if self.themes.remove(name).is_none() {
            return Err(StyleError::NotFound(name.to_string()));
        }
        tracing::info!(theme = name, remaining = self.themes.len(), "deleting theme");
        store.remove(&theme_key(name)).await?;
        Ok(())
    }

    pub fn export_all(&self) -> ThemeDocument {
        ThemeDocument::new(self.themes.clone())
    }

    /// Parses `text` and, only if it is a valid document, replaces every theme
    /// with its contents.
    pub async fn import_all<S: KeyValueStore + ?Sized>(&mut self, store: &S, text: &str) -> Result<()> {
        let document = ThemeDocument::parse(text)?;
        self.replace_all(store, document).await
    }

    /// Drops every persisted `theme-*` key, including ones skipped at load, then
    /// writes the document's themes. An empty document falls back to the seeded
    /// default theme.
    pub async fn replace_all<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        document: ThemeDocument,
    ) -> Result<()> {
        tracing::info!(
            removed = self.themes.len(),
            imported = document.themes().len(),
            "importing themes"
        );
        self.themes.clear();
        let stored = store.get_all().await?;
        for key in stored.keys().filter(|key| theme_name_from_key(key).is_some()) {
            store.remove(key).await?;
        }
        for (name, fields) in document.into_themes() {
            self.write(store, &name, fields).await?;
        }
        self.seed_if_empty(store).await?;
        Ok(())
    }

    async fn write<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        fields: FieldSet,
    ) -> Result<()> {
        let json = fields.to_json();
        self.themes.insert(name.to_string(), fields);
        store.set(&theme_key(name), &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldName;
    use crate::storage::testing::FailingStore;
    use crate::storage::MemoryStore;

    fn night() -> FieldSet {
        FieldSet::from_pairs([(FieldName::TextColor, "#eee"), (FieldName::PageBackground, "#111")])
    }

    fn sepia() -> FieldSet {
        FieldSet::from_pairs([(FieldName::TextColor, "#5b4636")])
    }

    async fn reopen(kv: &MemoryStore) -> ThemeStore {
        let entries = kv.get_all().await.unwrap();
        ThemeStore::open_from(&entries, kv).await.unwrap()
    }

    async fn store_with(kv: &MemoryStore, themes: &[(&str, FieldSet)]) -> ThemeStore {
        let mut store = ThemeStore::new();
        for (name, fields) in themes {
            store.create(kv, name, fields.clone()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_open_seeds_default_theme() {
        let kv = MemoryStore::new();
        let store = reopen(&kv).await;

        assert_eq!(store.names().collect::<Vec<_>>(), vec![DEFAULT_THEME_NAME]);
        assert!(store.load(DEFAULT_THEME_NAME).unwrap().is_empty());
        assert_eq!(kv.get("theme-No theme").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_open_reads_persisted_themes() {
        let kv = MemoryStore::with_entries([
            ("theme-Night", r##"{"textColor":"#eee","pageBackground":"#111"}"##),
            ("theme-Broken", "{not json"),
            ("latest-textColor", "red"),
            ("previousCSS", "a { }"),
        ]);
        let store = reopen(&kv).await;

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["Night"]);
        assert_eq!(store.load("Night").unwrap(), night());
        assert!(kv.get("theme-No theme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_writes_through_and_overwrites_by_name() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night())]).await;

        store.create(&kv, "Night", sepia()).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("Night").unwrap(), sepia());
        assert_eq!(
            kv.get("theme-Night").await.unwrap().as_deref(),
            Some(r##"{"textColor":"#5b4636"}"##)
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_names() {
        let kv = MemoryStore::new();
        let mut store = ThemeStore::new();
        for name in ["", "   ", RESERVED_THEME_NAME] {
            let result = store.create(&kv, name, night()).await;
            assert!(matches!(result, Err(StyleError::InvalidName(_))), "{:?}", name);
        }
        assert!(store.is_empty());
        assert!(kv.get_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_theme() {
        let store = ThemeStore::new();
        assert!(matches!(store.load("Night"), Err(StyleError::NotFound(name)) if name == "Night"));
    }

    #[tokio::test]
    async fn test_overwrite_requires_existing_theme() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night())]).await;

        let result = store.overwrite(&kv, "Day", sepia()).await;
        assert!(matches!(result, Err(StyleError::NotFound(_))));
        assert!(!store.contains("Day"));

        store.overwrite(&kv, "Night", sepia()).await.unwrap();
        assert_eq!(store.load("Night").unwrap(), sepia());
        assert_eq!(reopen(&kv).await, store);
    }

    #[tokio::test]
    async fn test_rename_moves_fields_and_key() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night())]).await;

        store.rename(&kv, "Night", "Midnight").await.unwrap();
        assert_eq!(store.load("Midnight").unwrap(), night());
        assert!(matches!(store.load("Night"), Err(StyleError::NotFound(_))));
        assert!(kv.get("theme-Night").await.unwrap().is_none());
        assert!(kv.get("theme-Midnight").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rename_failures_leave_store_untouched() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night()), ("Sepia", sepia())]).await;
        let before = store.clone();

        assert!(matches!(
            store.rename(&kv, "Day", "Dawn").await,
            Err(StyleError::NotFound(_))
        ));
        assert!(matches!(
            store.rename(&kv, "Night", "Sepia").await,
            Err(StyleError::Conflict(name)) if name == "Sepia"
        ));
        assert!(matches!(
            store.rename(&kv, "Night", " ").await,
            Err(StyleError::InvalidName(_))
        ));
        store.rename(&kv, "Night", "Night").await.unwrap();
        assert_eq!(store, before);
    }

    #[tokio::test]
    async fn test_delete_last_theme_then_reopen_seeds_default() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night())]).await;

        assert!(matches!(
            store.delete(&kv, "Day").await,
            Err(StyleError::NotFound(_))
        ));
        store.delete(&kv, "Night").await.unwrap();
        assert!(store.is_empty());
        assert!(kv.get_all().await.unwrap().is_empty());

        let reopened = reopen(&kv).await;
        assert_eq!(reopened.names().collect::<Vec<_>>(), vec![DEFAULT_THEME_NAME]);
        assert!(reopened.load(DEFAULT_THEME_NAME).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night()), ("Sepia", sepia())]).await;
        let original = store.clone();

        let exported = store.export_all().to_json();
        store.import_all(&kv, &exported).await.unwrap();

        assert_eq!(store, original);
        assert_eq!(reopen(&kv).await, original);
    }

    #[tokio::test]
    async fn test_import_replaces_store_wholesale() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night()), ("Sepia", sepia())]).await;

        store
            .import_all(&kv, r#"{"Ocean": {"pageBackground": "teal"}}"#)
            .await
            .unwrap();

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["Ocean"]);
        let keys: Vec<String> = kv.get_all().await.unwrap().into_keys().collect();
        assert_eq!(keys, vec!["theme-Ocean".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_import_leaves_store_untouched() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night())]).await;
        let before_store = store.clone();
        let before_kv = kv.get_all().await.unwrap();

        let result = store.import_all(&kv, r#"{"Ocean": {"pageBackground": 1}}"#).await;
        assert!(matches!(result, Err(StyleError::Parse(_))));
        assert_eq!(store, before_store);
        assert_eq!(kv.get_all().await.unwrap(), before_kv);
    }

    #[tokio::test]
    async fn test_open_skips_invalid_names_and_round_trips() {
        for bad in [" ", RESERVED_THEME_NAME] {
            let kv = MemoryStore::new();
            kv.set(&theme_key(bad), "{}").await.unwrap();
            kv.set("theme-Night", r##"{"textColor":"#eee","pageBackground":"#111"}"##)
                .await
                .unwrap();
            let mut store = reopen(&kv).await;
            assert_eq!(store.names().collect::<Vec<_>>(), vec!["Night"], "{:?}", bad);

            let exported = store.export_all().to_json();
            store.import_all(&kv, &exported).await.unwrap();
            assert_eq!(store.names().collect::<Vec<_>>(), vec!["Night"]);
            assert!(kv.get(&theme_key(bad)).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_import_drops_unreadable_theme_keys() {
        let kv = MemoryStore::with_entries([
            ("theme-Night", r#"{"textColor":"white"}"#),
            ("theme-Broken", "{not json"),
            ("latest-textColor", "red"),
        ]);
        let mut store = reopen(&kv).await;

        store
            .import_all(&kv, r#"{"Ocean": {"pageBackground": "teal"}}"#)
            .await
            .unwrap();

        let keys: Vec<String> = kv.get_all().await.unwrap().into_keys().collect();
        assert_eq!(keys, vec!["latest-textColor".to_string(), "theme-Ocean".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_import_reseeds_default() {
        let kv = MemoryStore::new();
        let mut store = store_with(&kv, &[("Night", night())]).await;

        store.import_all(&kv, "{}").await.unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec![DEFAULT_THEME_NAME]);
    }

    #[tokio::test]
    async fn test_write_failure_propagates_with_memory_changed() {
        let kv = FailingStore::default();
        let mut store = ThemeStore::new();
        kv.fail_writes(true);

        let result = store.create(&kv, "Night", night()).await;
        assert!(matches!(result, Err(StyleError::Storage(_))));
        assert!(store.contains("Night"));
        assert!(kv.get("theme-Night").await.unwrap().is_none());

        kv.fail_writes(false);
        store.overwrite(&kv, "Night", sepia()).await.unwrap();
        assert!(kv.get("theme-Night").await.unwrap().is_some());
    }
}
