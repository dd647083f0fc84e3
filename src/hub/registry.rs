use std::collections::HashMap;

use crate::client::{ClientHandle, ClientId};

/// Membership set for one transport kind.
///
/// Owned and mutated only by the hub control loop. Members are keyed by
/// their `ClientId`; registering an id twice has no effect and removing an
/// absent id is a no-op.
#[derive(Debug, Default)]
pub struct Registry {
    members: HashMap<ClientId, ClientHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the member. Returns `false` if the id was already present, in
    /// which case the existing entry is kept.
    pub fn insert(&mut self, handle: ClientHandle) -> bool {
        if self.members.contains_key(&handle.id) {
            return false;
        }
        self.members.insert(handle.id, handle);
        true
    }

    pub fn remove(&mut self, id: &ClientId) -> Option<ClientHandle> {
        self.members.remove(id)
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.members.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientHandle> {
        self.members.values()
    }

    /// Empties the registry, handing back every member.
    pub fn drain(&mut self) -> Vec<ClientHandle> {
        self.members.drain().map(|(_, handle)| handle).collect()
    }
}
