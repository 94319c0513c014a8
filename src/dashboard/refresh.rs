//! Refresh orchestrator
//!
//! One poll cycle pulls every view in a fixed order: run-state, roster with
//! per-persona plans and reports, planner metrics, token usage, events. The
//! run-state goes to the poll controller before the slow per-persona fan-out
//! starts.

use std::sync::Arc;

use futures_util::future::{join, join_all};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::api::{Persona, SimulationApi};
use crate::error::Result;

use super::poll::PollController;
use super::session::{ActivitySnapshot, PersonaActivity, SharedSession};

/// Runs poll cycles against the simulation API
#[derive(Clone)]
pub struct RefreshOrchestrator {
    api: Arc<dyn SimulationApi>,
    session: SharedSession,
    poll: Arc<Mutex<PollController>>,
    metrics_limit: u32,
}

impl RefreshOrchestrator {
    pub fn new(
        api: Arc<dyn SimulationApi>,
        session: SharedSession,
        poll: Arc<Mutex<PollController>>,
        metrics_limit: u32,
    ) -> Self {
        Self {
            api,
            session,
            poll,
            metrics_limit,
        }
    }

    /// Run one full poll cycle
    ///
    /// A failing stage aborts the rest of this cycle and becomes the status
    /// line; success clears a previous error status.
    pub async fn refresh_all(&self) -> Result<()> {
        let result = self.run_stages().await;

        let mut session = self.session.write();
        match result {
            Ok(()) => {
                session.clear_error();
                session.mark_refreshed();
            }
            Err(ref e) => {
                warn!(session_id = %session.id(), "Refresh failed: {}", e.format_for_log());
                session.set_error(e.status_message());
            }
        }
        result
    }

    /// Pull only the roster and its per-persona activity
    pub async fn refresh_roster(&self) -> Result<()> {
        let result = self.pull_roster().await;
        if let Err(ref e) = result {
            self.session.write().set_error(e.status_message());
        }
        result
    }

    async fn run_stages(&self) -> Result<()> {
        self.pull_state().await?;
        self.pull_roster().await?;

        debug!(stage = "metrics", "Pulling planner metrics");
        let metrics = self.api.planner_metrics(self.metrics_limit).await?;
        self.session.write().replace_metrics(metrics);

        debug!(stage = "token_usage", "Pulling token usage");
        let usage = self.api.token_usage().await?;
        self.session.write().replace_token_usage(usage);

        debug!(stage = "events", "Pulling events");
        let events = self.api.list_events().await?;
        self.session.write().replace_events(events);

        Ok(())
    }

    async fn pull_state(&self) -> Result<()> {
        debug!(stage = "state", "Pulling simulation state");
        let state = self.api.simulation_state().await?;

        let changed = self
            .poll
            .lock()
            .on_state_observed(state.is_running, state.auto_tick);
        if changed {
            info!(
                tick = state.current_tick,
                running = state.is_running,
                auto_tick = state.auto_tick,
                "Run-state changed"
            );
        }

        self.session.write().replace_state(state);
        Ok(())
    }

    async fn pull_roster(&self) -> Result<()> {
        debug!(stage = "roster", "Pulling personas");
        let roster = self.api.list_personas().await?;

        let selected = self.session.write().apply_roster(roster.clone());
        debug!(personas = roster.len(), selected = selected.len(), "Roster reconciled");

        let activity = self.pull_activity(&roster).await;
        self.session.write().replace_activity(activity);
        Ok(())
    }

    /// Latest plan and report for every persona, pulled concurrently
    ///
    /// Failures stay on the persona they belong to.
    async fn pull_activity(&self, roster: &[Persona]) -> Vec<PersonaActivity> {
        let pulls = roster.iter().map(|persona| {
            let api = Arc::clone(&self.api);
            async move {
                let (plans, reports) = join(
                    api.latest_hourly_plans(persona.id),
                    api.latest_daily_reports(persona.id),
                )
                .await;

                let outcome = match (plans, reports) {
                    (Ok(plans), Ok(reports)) => Ok(ActivitySnapshot {
                        hourly_plan: plans.into_iter().next().map(|p| p.content),
                        daily_report: reports.into_iter().next().map(|r| r.report),
                    }),
                    (Err(e), _) | (_, Err(e)) => {
                        debug!(persona_id = persona.id, "Activity pull failed: {}", e);
                        Err(e.status_message())
                    }
                };

                PersonaActivity {
                    persona_id: persona.id,
                    name: persona.name().to_string(),
                    outcome,
                }
            }
        });

        join_all(pulls).await
    }
}
