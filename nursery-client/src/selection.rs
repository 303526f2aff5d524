//! Selection set with stale-selection guard

use std::collections::HashSet;

use crate::TransitionError;

/// Tag identifiers the user intends to act on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add if absent, remove if present. Returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Add without toggling. Returns whether `id` was newly added.
    pub fn select(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// Replace the selection with every loaded identifier
    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop one identifier (e.g. after the tag was deleted)
    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Reject the selection if any member is missing from `current`.
    ///
    /// On rejection the WHOLE selection is cleared, not just the stale part,
    /// so the user has to re-select on purpose.
    pub fn validate_against(&mut self, current: &HashSet<String>) -> Result<(), TransitionError> {
        let stale_count = self.ids.difference(current).count();
        if stale_count == 0 {
            return Ok(());
        }
        tracing::warn!(
            stale_count,
            selected = self.ids.len(),
            "Selection references tags that are no longer loaded; clearing"
        );
        self.ids.clear();
        Err(TransitionError::StaleSelection { stale_count })
    }
}
