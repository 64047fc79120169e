//! Saved-sample inventory collaborator.
//!
//! Persistence is fire-and-forget: implementations log their own failures
//! and the core never waits on or inspects the outcome.

use std::collections::BTreeSet;

use crate::series::SampleId;

pub trait Inventory {
    /// Ids currently saved.
    fn fetch_status(&mut self) -> BTreeSet<SampleId>;
    /// Replace the saved set.
    fn persist(&mut self, ids: &BTreeSet<SampleId>);
}

/// Keeps the set in memory. Counts writes so callers can observe them.
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    saved: BTreeSet<SampleId>,
    pub writes: usize,
}

impl MemoryInventory {
    pub fn new(saved: impl IntoIterator<Item = SampleId>) -> Self {
        Self {
            saved: saved.into_iter().collect(),
            writes: 0,
        }
    }
}

impl Inventory for MemoryInventory {
    fn fetch_status(&mut self) -> BTreeSet<SampleId> {
        self.saved.clone()
    }

    fn persist(&mut self, ids: &BTreeSet<SampleId>) {
        self.saved = ids.clone();
        self.writes += 1;
    }
}
