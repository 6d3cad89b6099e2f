use std::collections::HashMap;

use crate::backend::SessionKey;

/// Maps OS-level session identity to the small opaque handles the
/// application holds.
///
/// Handles follow keys, not enumeration positions: a key keeps its handle
/// for as long as its session stays enumerable, no matter how the OS
/// reorders the list, and a handle dies when its key does instead of
/// migrating to whichever session now sits at the same index. Handle
/// values come from a monotone counter and carry no meaning beyond
/// identity.
///
/// The guarantee is only as strong as the keys: `SessionKey` ordinals are
/// positional within one app, so when a player owns several sessions and
/// an earlier one ends, a survivor re-derives to the ended session's key
/// and inherits its handle, while the survivor's old handle dies (see the
/// weakness note on `SessionKey`). Across different apps a handle can
/// never be misrouted.
///
/// All mutation happens under the transport's lock; the registry itself is
/// plain data.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    by_key: HashMap<SessionKey, u32>,
    by_handle: HashMap<u32, SessionKey>,
    next_handle: u32,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle already assigned to `key`, or assigns the next
    /// free one.
    pub fn resolve(&mut self, key: &SessionKey) -> u32 {
        if let Some(&handle) = self.by_key.get(key) {
            return handle;
        }

        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.by_key.insert(key.clone(), handle);
        self.by_handle.insert(handle, key.clone());
        tracing::debug!("[Registry] Assigned handle {} to {}", handle, key);
        handle
    }

    /// Resolve a handle back to its session identity. `None` means the
    /// handle is unknown or its session has disappeared; every control
    /// operation treats that as "operation failed".
    pub fn lookup(&self, handle: u32) -> Option<SessionKey> {
        self.by_handle.get(&handle).cloned()
    }

    /// Retire every session absent from `live` (enumeration churn). Their
    /// handles stop resolving immediately.
    pub fn retire_missing(&mut self, live: &[SessionKey]) {
        let dead: Vec<SessionKey> = self
            .by_key
            .keys()
            .filter(|key| !live.contains(key))
            .cloned()
            .collect();

        for key in dead {
            if let Some(handle) = self.by_key.remove(&key) {
                self.by_handle.remove(&handle);
                tracing::debug!("[Registry] Retired handle {} ({} went away)", handle, key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

// ================== Tests ===================
