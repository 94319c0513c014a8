//! Persona selection kept across refresh cycles
//!
//! The reconciler is the only source of truth for which personas are included
//! when a simulation starts. Roster refreshes never add or prune ids once a
//! selection exists; only explicit operator commands change it.

use std::collections::BTreeSet;

use tracing::debug;

use crate::api::{Persona, PersonaId};

/// Sticky set of selected persona ids
#[derive(Debug, Clone, Default)]
pub struct SelectionReconciler {
    selected: BTreeSet<PersonaId>,
}

impl SelectionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fresh roster into the retained selection
    ///
    /// An empty selection first adopts the UI's checked set, then falls back
    /// to selecting the whole roster. A non-empty selection is returned as is.
    pub fn reconcile(
        &mut self,
        roster: &[Persona],
        ui_checked: &BTreeSet<PersonaId>,
    ) -> BTreeSet<PersonaId> {
        if self.selected.is_empty() && !ui_checked.is_empty() {
            debug!(count = ui_checked.len(), "Selection recovered from checked set");
            self.selected = ui_checked.clone();
        }

        if self.selected.is_empty() && !roster.is_empty() {
            debug!(count = roster.len(), "Selecting every persona in the roster");
            self.selected = roster.iter().map(|p| p.id).collect();
        }

        self.selected.clone()
    }

    /// Apply a checkbox change: add on check, remove on uncheck
    pub fn toggle(&mut self, id: PersonaId, checked: bool) {
        if checked {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Add a persona this operator just created
    pub fn insert(&mut self, id: PersonaId) {
        self.selected.insert(id);
    }

    /// Drop a persona that was deleted on the server
    pub fn remove(&mut self, id: PersonaId) -> bool {
        self.selected.remove(&id)
    }

    pub fn contains(&self, id: PersonaId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> &BTreeSet<PersonaId> {
        &self.selected
    }

    /// Roster ids that are not selected, in roster order
    pub fn excluded_from(&self, roster: &[Persona]) -> Vec<PersonaId> {
        roster
            .iter()
            .map(|p| p.id)
            .filter(|id| !self.selected.contains(id))
            .collect()
    }
}
