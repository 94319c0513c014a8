//! Action dispatcher
//!
//! Turns operator commands into remote calls. Every remote action shows a
//! progress line, then either a success line followed by one refresh, or the
//! error line with no refresh.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{
    AdvanceRequest, GenerateRequest, Persona, PersonaId, SimulationApi, StartRequest,
};
use crate::error::{Error, Result};
use crate::persona::PersonaForm;

use super::projects::{to_start_payload, DraftAuthoring, DraftDetails, DraftProject, Team};
use super::refresh::RefreshOrchestrator;
use super::session::SharedSession;

/// Reason sent with a manual advance when none is given
pub const DEFAULT_ADVANCE_REASON: &str = "manual";

/// Executes operator actions against the simulation API
#[derive(Clone)]
pub struct ActionDispatcher {
    api: Arc<dyn SimulationApi>,
    session: SharedSession,
    refresh: RefreshOrchestrator,
}

impl ActionDispatcher {
    pub fn new(
        api: Arc<dyn SimulationApi>,
        session: SharedSession,
        refresh: RefreshOrchestrator,
    ) -> Self {
        Self {
            api,
            session,
            refresh,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Simulation lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Compose the start request from drafts, selection and start options
    pub fn build_start_request(&self) -> StartRequest {
        let session = self.session.read();
        let options = &session.start_options;

        let mut request = match to_start_payload(session.drafts.list_drafts()).projects {
            Some(projects) => StartRequest {
                projects: Some(projects),
                ..Default::default()
            },
            None => StartRequest {
                project_name: Some(options.project_name.clone()),
                project_summary: Some(options.project_summary.clone()),
                duration_weeks: Some(options.duration_weeks.max(1)),
                ..Default::default()
            },
        };

        let include: Vec<PersonaId> = session.selection.selected().iter().copied().collect();
        let exclude = session.selection.excluded_from(session.roster());
        request.include_person_ids = (!include.is_empty()).then_some(include);
        request.exclude_person_ids = (!exclude.is_empty()).then_some(exclude);
        request.random_seed = options.random_seed;
        request.model_hint = options.model_hint.clone().filter(|hint| !hint.trim().is_empty());
        request
    }

    pub async fn start_simulation(&self) -> Result<()> {
        let request = self.build_start_request();
        info!(
            projects = request.projects.as_ref().map_or(0, Vec::len),
            include = request.include_person_ids.as_ref().map_or(0, Vec::len),
            "Starting simulation"
        );
        self.progress("Starting simulation...");
        let result = self.api.start(&request).await;
        self.finish(result, "Simulation started").await
    }

    pub async fn stop_simulation(&self) -> Result<()> {
        self.progress("Stopping simulation...");
        let result = self.api.stop().await;
        self.finish(result, "Simulation stopped").await
    }

    pub async fn reset_simulation(&self) -> Result<()> {
        self.progress("Resetting simulation...");
        let result = self.api.reset().await;
        self.finish(result, "Simulation reset").await
    }

    /// Reset and delete every persona; requires explicit confirmation
    pub async fn full_reset(&self, confirmed: bool) -> Result<()> {
        if !confirmed {
            return self.reject(Error::validation(
                "Full reset deletes every persona; confirm to proceed.",
            ));
        }

        self.progress("Performing full reset...");
        let result = self.api.full_reset().await;
        if result.is_ok() {
            let mut session = self.session.write();
            let deleted: Vec<PersonaId> = session.roster().iter().map(|p| p.id).collect();
            for id in deleted {
                session.remove_persona(id);
            }
        }
        self.finish(result, "Full reset complete (personas deleted).")
            .await
    }

    /// Advance by `ticks` (default 1) with a reason (default "manual")
    pub async fn advance(&self, ticks: Option<u32>, reason: Option<&str>) -> Result<()> {
        let ticks = ticks.filter(|&t| t > 0).unwrap_or(1);
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ADVANCE_REASON)
            .to_string();

        let result = self.api.advance(&AdvanceRequest { ticks, reason }).await;
        self.finish(result, format!("Advanced {} tick(s)", ticks))
            .await
    }

    pub async fn start_auto_ticks(&self) -> Result<()> {
        let result = self.api.start_auto_ticks().await;
        self.finish(result, "Automatic ticking enabled").await
    }

    pub async fn stop_auto_ticks(&self) -> Result<()> {
        let result = self.api.stop_auto_ticks().await;
        self.finish(result, "Automatic ticking disabled").await
    }

    /// Run one refresh cycle on demand
    pub async fn refresh(&self) -> Result<()> {
        self.refresh.refresh_all().await
    }

    // ─────────────────────────────────────────────────────────────
    // Personas
    // ─────────────────────────────────────────────────────────────

    /// Draft a persona from a prompt and keep it in the session for review
    pub async fn generate_persona(
        &self,
        prompt: &str,
        model_hint: Option<&str>,
    ) -> Result<PersonaForm> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.reject(Error::field_invalid(
                "prompt",
                "Enter a prompt before generating.",
            ));
        }

        self.progress("Generating persona...");
        let request = GenerateRequest {
            prompt: prompt.to_string(),
            model_hint: model_hint.map(str::to_string),
        };
        match self.api.generate_persona(&request).await {
            Ok(profile) => {
                let form = PersonaForm::from_profile(&profile);
                let mut session = self.session.write();
                session.persona_draft = Some(form.clone());
                session.set_status("Persona drafted. Review the fields and create the persona.");
                Ok(form)
            }
            Err(e) => self.reject(e),
        }
    }

    /// Validate and create a persona; it joins the selection
    pub async fn create_persona(&self, form: &PersonaForm) -> Result<Persona> {
        let profile = match form.to_profile() {
            Ok(profile) => profile,
            Err(e) => return self.reject(e),
        };

        let created = match self.api.create_persona(&profile).await {
            Ok(created) => created,
            Err(e) => return self.reject(e),
        };

        {
            let mut session = self.session.write();
            session.set_status(format!("Created persona {}", profile.name));
            session.selection.insert(created.id);
            session.persona_draft = None;
        }
        info!(persona_id = created.id, name = %profile.name, "Persona created");

        if let Err(e) = self.refresh.refresh_roster().await {
            warn!("Roster refresh after create failed: {}", e);
        }
        Ok(created)
    }

    /// Create the persona drafted by `generate_persona`
    pub async fn create_drafted_persona(&self) -> Result<Persona> {
        let draft = self.session.read().persona_draft.clone();
        match draft {
            Some(form) => self.create_persona(&form).await,
            None => self.reject(Error::validation(
                "No drafted persona. Generate one or pass a persona file.",
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────

    pub fn toggle_persona(&self, id: PersonaId, checked: bool) {
        self.session.write().toggle(id, checked);
    }

    // ─────────────────────────────────────────────────────────────
    // Draft projects
    // ─────────────────────────────────────────────────────────────

    /// Begin composing a project with its details; returns the teams to pick from
    pub fn begin_project(&self, details: DraftDetails) -> Result<Vec<Team>> {
        let mut session = self.session.write();
        let mut authoring = DraftAuthoring::new();
        let result = authoring
            .submit_details(details, session.roster())
            .map(<[Team]>::to_vec);

        match result {
            Ok(teams) => {
                session.authoring = Some(authoring);
                Ok(teams)
            }
            Err(e) => {
                session.authoring = None;
                session.set_error(e.status_message());
                Err(e)
            }
        }
    }

    /// Pick teams (zero-based) for the project being composed and add it
    pub fn choose_project_teams(&self, indices: &[usize]) -> Result<DraftProject> {
        let mut session = self.session.write();

        let selected = match session.authoring.as_mut() {
            Some(authoring) => authoring.select_teams(indices),
            None => Err(Error::AuthoringState {
                action: "select teams",
                state: "not started",
            }),
        };
        let project = match selected {
            Ok(project) => project,
            Err(e) => {
                session.set_error(e.status_message());
                return Err(e);
            }
        };

        session.authoring = None;
        let added = session
            .drafts
            .add_draft(
                &project.name,
                &project.summary,
                &project.team_ids,
                project.start_week,
                project.duration_weeks,
            )
            .cloned();

        match added {
            Ok(draft) => {
                session.set_status(format!("Added project: {}", draft.name));
                Ok(draft)
            }
            Err(e) => {
                session.set_error(e.status_message());
                Err(e)
            }
        }
    }

    pub fn cancel_project(&self) {
        let mut session = self.session.write();
        if let Some(mut authoring) = session.authoring.take() {
            authoring.cancel();
        }
    }

    /// Remove a draft project by zero-based index
    pub fn remove_project(&self, index: usize) -> Result<DraftProject> {
        let mut session = self.session.write();
        match session.drafts.remove_draft(index) {
            Ok(removed) => {
                session.set_status("Project removed");
                Ok(removed)
            }
            Err(e) => {
                session.set_error(e.status_message());
                Err(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Status handling
    // ─────────────────────────────────────────────────────────────

    fn progress(&self, message: &str) {
        self.session.write().set_status(message);
    }

    fn reject<T>(&self, error: Error) -> Result<T> {
        warn!("Action failed: {}", error.format_for_log());
        self.session.write().set_error(error.status_message());
        Err(error)
    }

    /// Report an action result; success triggers exactly one refresh
    async fn finish(&self, result: Result<()>, success: impl Into<String>) -> Result<()> {
        if let Err(e) = result {
            return self.reject(e);
        }

        let success = success.into();
        info!(status = %success, "Action completed");
        self.session.write().set_status(success);

        if let Err(e) = self.refresh.refresh_all().await {
            warn!("Refresh after action failed: {}", e);
        }
        Ok(())
    }
}
