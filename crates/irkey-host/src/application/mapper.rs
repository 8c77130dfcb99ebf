//! Profile lookup and atomic profile switching.

use std::sync::{Arc, PoisonError, RwLock};

use irkey_core::{KeyMapping, NormalizedCode, Profile};

/// Pure lookup: the mapping bound to `code` in `profile`, if any.
pub fn map_code<'p>(profile: &'p Profile, code: &NormalizedCode) -> Option<&'p KeyMapping> {
    profile.mapping_for(code)
}

/// Handle to the active profile, shareable across threads.
///
/// The profile itself is immutable; switching replaces the whole `Arc` under
/// a write lock, so a lookup holding a snapshot never sees a half-swapped
/// table.
#[derive(Debug, Clone)]
pub struct ActiveProfile {
    inner: Arc<RwLock<Arc<Profile>>>,
}

impl ActiveProfile {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(profile))),
        }
    }

    /// The profile as of now. Later swaps do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Profile> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Makes `profile` active and returns the one it replaced.
    pub fn swap(&self, profile: Profile) -> Arc<Profile> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(profile))
    }

    /// Looks `code` up in the current profile.
    pub fn lookup(&self, code: &NormalizedCode) -> Option<KeyMapping> {
        map_code(&self.snapshot(), code).cloned()
    }

    pub fn name(&self) -> String {
        self.snapshot().name.clone()
    }
}
