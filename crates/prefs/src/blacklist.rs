use crate::codec::{decode_ids, encode_ids};
use crate::{Preferences, Result};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// Outcome of growing the blacklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlacklistChange {
    /// Identifiers that were not listed before
    pub added: usize,
    /// Blacklist size afterwards
    pub total: usize,
}

struct BlacklistState {
    preferences: Box<dyn Preferences + Send>,
    ids: BTreeSet<String>,
}

/// Identifiers the host must not load, backed by one string preference.
///
/// The decoded set is cached. Every mutation goes through
/// [`Preferences::update`], so the change is applied to the stored value
/// rather than to the cache; afterwards the cache matches what was persisted.
pub struct Blacklist {
    key: String,
    state: Mutex<BlacklistState>,
}

impl Blacklist {
    /// Register `key` (default empty) and load its current value
    pub fn load(mut preferences: Box<dyn Preferences + Send>, key: &str) -> Self {
        preferences.add_preference(key, "");
        let ids = decode_ids(&preferences.get_value(key).unwrap_or_default());
        log::debug!("Loaded container blacklist {key} with {} entries", ids.len());
        Self {
            key: key.to_string(),
            state: Mutex::new(BlacklistState { preferences, ids }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BlacklistState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().ids.contains(id)
    }

    pub fn ids(&self) -> BTreeSet<String> {
        self.lock().ids.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().ids.is_empty()
    }

    /// Re-read the persisted value, dropping the cache
    pub fn reload(&self) -> Result<()> {
        let mut state = self.lock();
        state.preferences.reload()?;
        let value = state.preferences.get_value(&self.key).unwrap_or_default();
        state.ids = decode_ids(&value);
        Ok(())
    }

    /// Union `ids` into the blacklist. Already listed identifiers are kept.
    pub fn extend<I, S>(&self, ids: I) -> Result<BlacklistChange>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let incoming: Vec<String> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| !id.is_empty())
            .collect();

        let mut state = self.lock();
        let mut merged = BTreeSet::new();
        let mut added = 0;
        state.preferences.update(&self.key, &mut |current| {
            merged = decode_ids(current);
            let before = merged.len();
            merged.extend(incoming.iter().cloned());
            added = merged.len() - before;
            if added > 0 {
                Ok(Some(encode_ids(&merged)?))
            } else {
                Ok(None)
            }
        })?;
        state.ids = merged;

        let change = BlacklistChange {
            added,
            total: state.ids.len(),
        };
        log::info!(
            "Blacklisted {} new containers ({} total)",
            change.added,
            change.total
        );
        Ok(change)
    }

    /// Drop one identifier; returns whether it was listed
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut state = self.lock();
        let mut remaining = BTreeSet::new();
        let mut removed = false;
        state.preferences.update(&self.key, &mut |current| {
            remaining = decode_ids(current);
            removed = remaining.remove(id);
            if removed {
                Ok(Some(encode_ids(&remaining)?))
            } else {
                Ok(None)
            }
        })?;
        state.ids = remaining;
        if removed {
            log::info!("Removed {id} from the container blacklist");
        }
        Ok(removed)
    }

    /// Clear the blacklist; the preference becomes the empty string
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock();
        state.preferences.set_value(&self.key, "")?;
        state.ids.clear();
        log::info!("Cleared the container blacklist");
        Ok(())
    }
}

impl std::fmt::Debug for Blacklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blacklist")
            .field("key", &self.key)
            .field("len", &self.len())
            .finish()
    }
}
