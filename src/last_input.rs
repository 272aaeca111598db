use std::collections::BTreeMap;

use crate::error::Result;
use crate::fields::{FieldName, FieldSet};
use crate::storage::{field_from_latest_key, latest_key, KeyValueStore};

/// The live form as last typed, kept across sessions under `latest-<field>`.
/// Unrelated to themes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastInput {
    form: FieldSet,
}

impl LastInput {
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Self {
        let mut form = FieldSet::new();
        for (key, value) in entries {
            if let Some(field) = field_from_latest_key(key) {
                form.set(field, value.as_str());
            }
        }
        Self { form }
    }

    /// The form as it should be shown.
    pub fn form(&self) -> &FieldSet {
        &self.form
    }

    /// Records one field exactly as typed, blank included.
    pub async fn remember<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        field: FieldName,
        value: &str,
    ) -> Result<()> {
        self.form.set(field, value);
        store.set(&latest_key(field), value).await?;
        Ok(())
    }

    /// Makes the form show `fields` and nothing else; every field outside the
    /// set becomes blank.
    pub async fn replace_form<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        fields: &FieldSet,
    ) -> Result<()> {
        for field in FieldName::ALL {
            self.remember(store, field, fields.get(field)).await?;
        }
        Ok(())
    }
}
