use std::collections::BTreeMap;

use crate::css::CssText;
use crate::error::Result;
use crate::storage::{KeyValueStore, PREVIOUS_CSS_KEY};
use crate::surface::TargetSurface;

/// Tracks the currently applied patch so it can be swapped atomically.
///
/// The patch is taken off the surface by the exact text that was put on it.
/// A fresh session must start from [`ActivePatch::from_entries`] so a patch
/// left by an earlier session is still the one removed first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivePatch {
    current: CssText,
}

impl ActivePatch {
    /// Rehydrates the applied patch from the `previousCSS` entry of a storage
    /// dump.
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Self {
        let current = entries.get(PREVIOUS_CSS_KEY).cloned().unwrap_or_default();
        Self {
            current: CssText::new(current),
        }
    }

    pub fn current(&self) -> &CssText {
        &self.current
    }

    /// Removes the applied patch, installs `next`, then records it.
    ///
    /// Runs the full cycle even when `next` is empty or equal to the current
    /// patch, so "no customization" clears whatever was there.
    pub async fn replace<T, S>(&mut self, surface: &mut T, store: &S, next: CssText) -> Result<()>
    where
        T: TargetSurface + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        tracing::debug!(
            previous_len = self.current.as_str().len(),
            next_len = next.as_str().len(),
            "replacing patch"
        );
        surface.remove_css(self.current.as_str()).await?;
        surface.insert_css(next.as_str()).await?;
        // The surface now carries `next`; track it even if the mirror write fails.
        self.current = next;
        store.set(PREVIOUS_CSS_KEY, self.current.as_str()).await?;
        Ok(())
    }
}
