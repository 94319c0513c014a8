//! Dashboard synchronization controller
//!
//! - `selection`: sticky persona selection across roster refreshes
//! - `poll`: adaptive refresh timer driven by the run-state
//! - `refresh`: one ordered poll cycle over every view
//! - `projects`: draft projects and their authoring flow
//! - `dispatcher`: operator actions followed by a refresh
//! - `session`: the state object all of the above share

pub mod dispatcher;
pub mod poll;
pub mod projects;
pub mod refresh;
pub mod selection;
pub mod session;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::api::SimulationApi;
use crate::config::DashboardConfig;

pub use dispatcher::ActionDispatcher;
pub use poll::{PollController, PollMode, Tick, TickScheduler, TimerHandle, TokioTickScheduler};
pub use projects::{
    derive_teams, to_start_payload, DraftAuthoring, DraftDetails, DraftProject, ProjectStore, Team,
};
pub use refresh::RefreshOrchestrator;
pub use selection::SelectionReconciler;
pub use session::{DashboardSession, PersonaActivity, SharedSession, StartOptions, StatusLine};

/// One dashboard session wired to a simulation API
///
/// Dropping the last handle to the poll controller cancels the timer.
pub struct Dashboard {
    session: SharedSession,
    poll: Arc<Mutex<PollController>>,
    refresh: RefreshOrchestrator,
    dispatcher: ActionDispatcher,
}

impl Dashboard {
    pub fn new(
        api: Arc<dyn SimulationApi>,
        scheduler: Arc<dyn TickScheduler>,
        config: &DashboardConfig,
    ) -> Self {
        let start_options = StartOptions {
            project_name: config.simulation.project_name.clone(),
            project_summary: config.simulation.project_summary.clone(),
            duration_weeks: config.simulation.duration_weeks,
            random_seed: config.simulation.random_seed,
            model_hint: config.simulation.model_hint.clone(),
        };
        let session = DashboardSession::shared(start_options);
        let poll = Arc::new(Mutex::new(PollController::new(scheduler, &config.polling)));
        let refresh = RefreshOrchestrator::new(
            Arc::clone(&api),
            Arc::clone(&session),
            Arc::clone(&poll),
            config.polling.planner_metrics_limit,
        );
        let dispatcher = ActionDispatcher::new(api, Arc::clone(&session), refresh.clone());

        Self {
            session,
            poll,
            refresh,
            dispatcher,
        }
    }

    /// Install the idle refresh timer
    pub fn start(&self) -> TimerHandle {
        let handle = self.poll.lock().start();
        info!(
            session_id = %self.session.read().id(),
            timer = handle.id(),
            "Dashboard session started"
        );
        handle
    }

    /// Whether a tick belongs to the live timer
    pub fn accepts(&self, tick: &Tick) -> bool {
        self.poll.lock().is_current(tick)
    }

    /// Cancel the refresh timer
    pub fn shutdown(&self) {
        self.poll.lock().stop();
        info!(session_id = %self.session.read().id(), "Dashboard session stopped");
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn refresher(&self) -> &RefreshOrchestrator {
        &self.refresh
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn poll_mode(&self) -> PollMode {
        self.poll.lock().mode()
    }

    pub fn poll_period(&self) -> std::time::Duration {
        self.poll.lock().period()
    }
}
