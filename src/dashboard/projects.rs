//! Draft projects composed before a simulation starts
//!
//! Drafts live only in the session. They reach the server solely as the
//! `projects` list of the start request.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{Persona, PersonaId, ProjectSpec};
use crate::error::{Error, Result};

/// Team label for personas without a team name
pub const NO_TEAM: &str = "No Team";

/// Weeks are 1-based and capped at one simulated year
pub const MAX_WEEKS: u32 = 52;

fn validate_weeks(start_week: u32, duration_weeks: u32) -> Result<()> {
    if !(1..=MAX_WEEKS).contains(&start_week) {
        return Err(Error::field_invalid("start_week", "Invalid start week"));
    }
    if !(1..=MAX_WEEKS).contains(&duration_weeks) {
        return Err(Error::field_invalid("duration_weeks", "Invalid duration"));
    }
    Ok(())
}

/// A locally composed project bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftProject {
    pub name: String,
    pub summary: String,
    pub team_ids: Vec<PersonaId>,
    pub start_week: u32,
    pub duration_weeks: u32,
}

impl DraftProject {
    /// Last week covered by the project (inclusive)
    pub fn end_week(&self) -> u32 {
        self.start_week
            .saturating_add(self.duration_weeks.saturating_sub(1))
    }

    fn to_spec(&self) -> ProjectSpec {
        ProjectSpec {
            name: self.name.clone(),
            summary: self.summary.clone(),
            team_ids: self.team_ids.clone(),
            start_week: self.start_week,
            duration_weeks: self.duration_weeks,
        }
    }
}

/// Personas grouped under one team name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub members: Vec<String>,
    pub member_ids: Vec<PersonaId>,
}

/// `projects` part of the start request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartPayload {
    pub projects: Option<Vec<ProjectSpec>>,
}

// ─────────────────────────────────────────────────────────────────
// Project Store
// ─────────────────────────────────────────────────────────────────

/// Ordered, session-local list of draft projects
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    drafts: Vec<DraftProject>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a draft after validating it; the store is untouched on error
    pub fn add_draft(
        &mut self,
        name: &str,
        summary: &str,
        team_member_ids: &[PersonaId],
        start_week: u32,
        duration_weeks: u32,
    ) -> Result<&DraftProject> {
        if team_member_ids.is_empty() {
            return Err(Error::field_invalid("team_ids", "No valid teams selected"));
        }
        validate_weeks(start_week, duration_weeks)?;

        self.drafts.push(DraftProject {
            name: name.to_string(),
            summary: summary.to_string(),
            team_ids: team_member_ids.to_vec(),
            start_week,
            duration_weeks,
        });
        info!(
            project = name,
            members = team_member_ids.len(),
            start_week,
            duration_weeks,
            "Draft project added"
        );

        Ok(&self.drafts[self.drafts.len() - 1])
    }

    /// Remove the draft at `index`
    pub fn remove_draft(&mut self, index: usize) -> Result<DraftProject> {
        if index >= self.drafts.len() {
            return Err(Error::DraftIndexOutOfRange {
                index,
                len: self.drafts.len(),
            });
        }
        let removed = self.drafts.remove(index);
        info!(project = %removed.name, "Draft project removed");
        Ok(removed)
    }

    pub fn list_drafts(&self) -> &[DraftProject] {
        &self.drafts
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }
}

/// Group personas by team name in first-seen order
pub fn derive_teams(personas: &[Persona]) -> Vec<Team> {
    let mut teams: Vec<Team> = Vec::new();

    for persona in personas {
        let name = persona.team_name().unwrap_or(NO_TEAM);
        let position = match teams.iter().position(|t| t.name == name) {
            Some(position) => position,
            None => {
                teams.push(Team {
                    name: name.to_string(),
                    members: Vec::new(),
                    member_ids: Vec::new(),
                });
                teams.len() - 1
            }
        };
        teams[position].members.push(persona.name().to_string());
        teams[position].member_ids.push(persona.id);
    }

    debug!(teams = teams.len(), personas = personas.len(), "Teams derived");
    teams
}

/// Project drafts into the start request; no drafts means no `projects` key
pub fn to_start_payload(drafts: &[DraftProject]) -> StartPayload {
    if drafts.is_empty() {
        return StartPayload::default();
    }
    StartPayload {
        projects: Some(drafts.iter().map(DraftProject::to_spec).collect()),
    }
}

// ─────────────────────────────────────────────────────────────────
// Draft Authoring
// ─────────────────────────────────────────────────────────────────

/// Details collected in the naming step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDetails {
    pub name: String,
    pub summary: String,
    pub start_week: u32,
    pub duration_weeks: u32,
}

/// Steps of composing one draft project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringState {
    Naming,
    TeamSelection { details: DraftDetails, teams: Vec<Team> },
    Confirmed(DraftProject),
    Cancelled,
}

impl AuthoringState {
    pub fn name(&self) -> &'static str {
        match self {
            AuthoringState::Naming => "naming",
            AuthoringState::TeamSelection { .. } => "selecting teams",
            AuthoringState::Confirmed(_) => "confirmed",
            AuthoringState::Cancelled => "cancelled",
        }
    }
}

/// Short-lived state machine: Naming -> TeamSelection -> Confirmed | Cancelled
#[derive(Debug, Clone)]
pub struct DraftAuthoring {
    state: AuthoringState,
}

impl DraftAuthoring {
    pub fn new() -> Self {
        Self {
            state: AuthoringState::Naming,
        }
    }

    pub fn state(&self) -> &AuthoringState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            AuthoringState::Confirmed(_) | AuthoringState::Cancelled
        )
    }

    /// Teams offered in the selection step
    pub fn teams(&self) -> &[Team] {
        match self.state {
            AuthoringState::TeamSelection { ref teams, .. } => teams,
            _ => &[],
        }
    }

    /// Complete the naming step and offer the roster's teams
    ///
    /// Invalid details leave the machine in `Naming`; an empty roster cancels.
    pub fn submit_details(&mut self, details: DraftDetails, roster: &[Persona]) -> Result<&[Team]> {
        if !matches!(self.state, AuthoringState::Naming) {
            return Err(self.state_error("enter project details"));
        }
        if details.name.trim().is_empty() {
            return Err(Error::field_invalid("name", "Project name is required"));
        }
        if details.summary.trim().is_empty() {
            return Err(Error::field_invalid("summary", "Project summary is required"));
        }
        validate_weeks(details.start_week, details.duration_weeks)?;

        let teams = derive_teams(roster);
        if teams.is_empty() {
            self.state = AuthoringState::Cancelled;
            return Err(Error::NoTeamsAvailable);
        }

        self.state = AuthoringState::TeamSelection { details, teams };
        Ok(self.teams())
    }

    /// Pick teams by zero-based index; out-of-range indices are ignored
    ///
    /// At least one valid index is required.
    pub fn select_teams(&mut self, indices: &[usize]) -> Result<DraftProject> {
        let (details, teams) = match self.state {
            AuthoringState::TeamSelection {
                ref details,
                ref teams,
            } => (details, teams),
            _ => return Err(self.state_error("select teams")),
        };

        let mut team_ids = Vec::new();
        for &index in indices {
            if let Some(team) = teams.get(index) {
                for id in &team.member_ids {
                    if !team_ids.contains(id) {
                        team_ids.push(*id);
                    }
                }
            }
        }
        if team_ids.is_empty() {
            return Err(Error::field_invalid("team_ids", "No valid teams selected"));
        }

        let draft = DraftProject {
            name: details.name.trim().to_string(),
            summary: details.summary.trim().to_string(),
            team_ids,
            start_week: details.start_week,
            duration_weeks: details.duration_weeks,
        };
        self.state = AuthoringState::Confirmed(draft.clone());
        Ok(draft)
    }

    /// Abandon the draft from any unfinished step
    pub fn cancel(&mut self) {
        if !self.is_finished() {
            self.state = AuthoringState::Cancelled;
        }
    }

    fn state_error(&self, action: &'static str) -> Error {
        Error::AuthoringState {
            action,
            state: self.state.name(),
        }
    }
}

impl Default for DraftAuthoring {
    fn default() -> Self {
        Self::new()
    }
}
