//! # Resource Table
//!
//! An arena of [`ResourceLock`]s indexed by resource id, built once per run.

use crate::lock::{LockPolicy, ResourceLock};
use crate::request::ResourceId;

#[derive(Debug)]
pub struct ResourceTable {
    locks: Vec<ResourceLock>,
}

impl ResourceTable {
    /// Creates resources `1..=count`, all valid.
    pub fn new(count: u32, policy: LockPolicy) -> Self {
        let locks = (1..=count)
            .map(|id| ResourceLock::new(ResourceId(id), policy))
            .collect();
        Self { locks }
    }

    /// Looks up a resource. Ids outside `1..=len` yield `None`.
    pub fn get(&self, id: ResourceId) -> Option<&ResourceLock> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.locks.get(index)
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceLock> {
        self.locks.iter()
    }
}
