//! Session-scoped dashboard state
//!
//! Everything the dashboard remembers between commands lives in one
//! `DashboardSession`, shared as `Arc<RwLock<_>>`. Locks are taken for short
//! synchronous sections only and never held across a remote call.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::api::{Persona, PersonaId, PlannerMetric, SimEvent, SimulationState, TokenUsage};
use crate::persona::PersonaForm;

use super::projects::{DraftAuthoring, ProjectStore};
use super::selection::SelectionReconciler;

/// Shared handle to the session state
pub type SharedSession = Arc<RwLock<DashboardSession>>;

/// Latest plan and report of one persona, or why they could not be pulled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaActivity {
    pub persona_id: PersonaId,
    pub name: String,
    pub outcome: std::result::Result<ActivitySnapshot, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub hourly_plan: Option<String>,
    pub daily_report: Option<String>,
}

/// The single status line shown to the operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

/// Options that go into the next start request besides the projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    pub project_name: String,
    pub project_summary: String,
    pub duration_weeks: u32,
    pub random_seed: Option<u64>,
    pub model_hint: Option<String>,
}

/// All state of one dashboard session
#[derive(Debug)]
pub struct DashboardSession {
    id: Uuid,
    pub selection: SelectionReconciler,
    pub drafts: ProjectStore,
    pub authoring: Option<DraftAuthoring>,
    pub persona_draft: Option<PersonaForm>,
    pub start_options: StartOptions,
    ui_checked: BTreeSet<PersonaId>,
    roster: Vec<Persona>,
    state: Option<SimulationState>,
    activity: Vec<PersonaActivity>,
    metrics: Vec<PlannerMetric>,
    token_usage: Option<TokenUsage>,
    events: Vec<SimEvent>,
    status: StatusLine,
    last_refresh: Option<DateTime<Utc>>,
}

impl DashboardSession {
    pub fn new(start_options: StartOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            selection: SelectionReconciler::new(),
            drafts: ProjectStore::new(),
            authoring: None,
            persona_draft: None,
            start_options,
            ui_checked: BTreeSet::new(),
            roster: Vec::new(),
            state: None,
            activity: Vec::new(),
            metrics: Vec::new(),
            token_usage: None,
            events: Vec::new(),
            status: StatusLine::default(),
            last_refresh: None,
        }
    }

    pub fn shared(start_options: StartOptions) -> SharedSession {
        Arc::new(RwLock::new(Self::new(start_options)))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    // ─────────────────────────────────────────────────────────────
    // View replacement (last write wins)
    // ─────────────────────────────────────────────────────────────

    pub fn replace_state(&mut self, state: SimulationState) {
        self.state = Some(state);
    }

    /// Cache a fresh roster and reconcile the selection against it
    pub fn apply_roster(&mut self, roster: Vec<Persona>) -> BTreeSet<PersonaId> {
        let selected = self.selection.reconcile(&roster, &self.ui_checked);
        self.ui_checked = roster
            .iter()
            .map(|p| p.id)
            .filter(|id| selected.contains(id))
            .collect();
        self.roster = roster;
        selected
    }

    pub fn replace_activity(&mut self, activity: Vec<PersonaActivity>) {
        self.activity = activity;
    }

    pub fn replace_metrics(&mut self, metrics: Vec<PlannerMetric>) {
        self.metrics = metrics;
    }

    pub fn replace_token_usage(&mut self, usage: TokenUsage) {
        self.token_usage = Some(usage);
    }

    pub fn replace_events(&mut self, events: Vec<SimEvent>) {
        self.events = events;
    }

    pub fn mark_refreshed(&mut self) {
        self.last_refresh = Some(Utc::now());
    }

    // ─────────────────────────────────────────────────────────────
    // Selection commands
    // ─────────────────────────────────────────────────────────────

    /// Checkbox change from the operator
    pub fn toggle(&mut self, id: PersonaId, checked: bool) {
        self.selection.toggle(id, checked);
        if checked {
            self.ui_checked.insert(id);
        } else {
            self.ui_checked.remove(&id);
        }
    }

    /// Forget a persona that was deleted on the server
    pub fn remove_persona(&mut self, id: PersonaId) {
        if self.selection.remove(id) {
            debug!(persona_id = id, "Deleted persona dropped from selection");
        }
        self.ui_checked.remove(&id);
        self.roster.retain(|p| p.id != id);
        self.activity.retain(|a| a.persona_id != id);
    }

    // ─────────────────────────────────────────────────────────────
    // Status
    // ─────────────────────────────────────────────────────────────

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = StatusLine {
            message: message.into(),
            is_error: false,
        };
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = StatusLine {
            message: message.into(),
            is_error: true,
        };
    }

    /// Clear the status line if it currently shows an error
    pub fn clear_error(&mut self) {
        if self.status.is_error {
            self.status = StatusLine::default();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────

    pub fn roster(&self) -> &[Persona] {
        &self.roster
    }

    pub fn persona(&self, id: PersonaId) -> Option<&Persona> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    pub fn activity(&self) -> &[PersonaActivity] {
        &self.activity
    }

    pub fn metrics(&self) -> &[PlannerMetric] {
        &self.metrics
    }

    pub fn token_usage(&self) -> Option<&TokenUsage> {
        self.token_usage.as_ref()
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }
}
