use crate::model::{FilterSpec, View};

/// A view fetched ahead of a filter change, waiting for the active filter
/// to catch up with `target`.
#[derive(Clone, Debug)]
pub struct PendingFocus {
    pub target: FilterSpec,
    pub view: View,
    pub focus_entity_id: String,
}

/// Single-slot memo keyed by [`FilterSpec`] equality.
///
/// An entry is consumed at most once. Any filter change that does not match
/// the stored target drops it.
#[derive(Debug, Default)]
pub struct ViewCache {
    slot: Option<PendingFocus>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `pending`, returning whatever entry it displaced.
    pub fn store(&mut self, pending: PendingFocus) -> Option<PendingFocus> {
        self.slot.replace(pending)
    }

    /// Takes the entry if its target equals `spec`; otherwise the slot is
    /// left untouched.
    pub fn take_matching(&mut self, spec: &FilterSpec) -> Option<PendingFocus> {
        if self
            .slot
            .as_ref()
            .is_some_and(|pending| pending.target == *spec)
        {
            self.slot.take()
        } else {
            None
        }
    }

    pub fn invalidate(&mut self) -> Option<PendingFocus> {
        self.slot.take()
    }

    pub fn peek(&self) -> Option<&PendingFocus> {
        self.slot.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.slot.is_some()
    }
}
