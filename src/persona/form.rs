//! Persona authoring form.
//!
//! Holds persona fields as an operator writes them: comma-separated lists,
//! one entry per line, schedule lines and the event playbook as JSON text.
//! Forms are read from TOML files or filled from a generated draft, then
//! validated into a `PersonaProfile` before anything is sent.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{PersonaProfile, ScheduleBlock};
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_WORK_HOURS: &str = "09:00-17:00";
const DEFAULT_BREAK_FREQUENCY: &str = "50/10 cadence";
const DEFAULT_STYLE: &str = "Async";
const DEFAULT_ACTIVITY: &str = "Focus block";

// ─────────────────────────────────────────────────────────────────
// Persona Form
// ─────────────────────────────────────────────────────────────────

/// Raw persona fields before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaForm {
    pub name: String,
    pub role: String,
    pub timezone: String,
    pub work_hours: String,
    pub break_frequency: String,
    pub communication_style: String,
    pub email_address: String,
    pub chat_handle: String,
    pub team_name: String,
    pub is_department_head: bool,
    /// Comma-separated
    pub skills: String,
    /// Comma-separated
    pub personality: String,
    /// One per line
    pub objectives: String,
    /// One per line
    pub metrics: String,
    /// One per line
    pub planning_guidelines: String,
    /// `HH:MM-HH:MM activity`, one block per line
    pub schedule: String,
    /// JSON object of event type to list of responses
    pub event_playbook: String,
    /// One per line
    pub statuses: String,
}

impl PersonaForm {
    /// Read a form from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let form = toml::from_str(&content).map_err(|e| Error::PersonaInvalid {
            reason: format!("Failed to parse persona file {}: {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "Persona form loaded");
        Ok(form)
    }

    /// Write the form as TOML so it can be edited and submitted later.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| Error::IoWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Fill the form from a generated draft for review.
    pub fn from_profile(profile: &PersonaProfile) -> Self {
        let schedule = profile
            .schedule
            .iter()
            .map(|block| format!("{}-{} {}", block.start, block.end, block.activity).trim().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        // serde_json cannot fail on a map of string lists
        let event_playbook =
            serde_json::to_string_pretty(&profile.event_playbook).unwrap_or_else(|_| "{}".to_string());

        Self {
            name: profile.name.clone(),
            role: profile.role.clone(),
            timezone: or_default(&profile.timezone, DEFAULT_TIMEZONE),
            work_hours: or_default(&profile.work_hours, DEFAULT_WORK_HOURS),
            break_frequency: or_default(&profile.break_frequency, DEFAULT_BREAK_FREQUENCY),
            communication_style: or_default(&profile.communication_style, "Warm async"),
            email_address: profile.email_address.clone(),
            chat_handle: profile.chat_handle.clone(),
            team_name: profile.team_name.clone().unwrap_or_default(),
            is_department_head: profile.is_department_head,
            skills: profile.skills.join(", "),
            personality: profile.personality.join(", "),
            objectives: profile.objectives.join("\n"),
            metrics: profile.metrics.join("\n"),
            planning_guidelines: profile.planning_guidelines.join("\n"),
            schedule,
            event_playbook,
            statuses: profile.statuses.join("\n"),
        }
    }

    /// Validate the form and build the create request.
    ///
    /// Checks run in a fixed order: playbook JSON, required identity fields,
    /// skills, personality.
    pub fn to_profile(&self) -> Result<PersonaProfile> {
        let event_playbook = parse_playbook(&self.event_playbook)?;
        let team_name = self.team_name.trim();

        let profile = PersonaProfile {
            name: self.name.trim().to_string(),
            role: self.role.trim().to_string(),
            timezone: or_default(&self.timezone, DEFAULT_TIMEZONE),
            work_hours: or_default(&self.work_hours, DEFAULT_WORK_HOURS),
            break_frequency: or_default(&self.break_frequency, DEFAULT_BREAK_FREQUENCY),
            communication_style: or_default(&self.communication_style, DEFAULT_STYLE),
            email_address: self.email_address.trim().to_string(),
            chat_handle: self.chat_handle.trim().to_string(),
            is_department_head: self.is_department_head,
            team_name: (!team_name.is_empty()).then(|| team_name.to_string()),
            skills: parse_comma_separated(&self.skills),
            personality: parse_comma_separated(&self.personality),
            objectives: parse_lines(&self.objectives),
            metrics: parse_lines(&self.metrics),
            schedule: parse_schedule(&self.schedule),
            planning_guidelines: parse_lines(&self.planning_guidelines),
            event_playbook,
            statuses: parse_lines(&self.statuses),
        };

        if profile.name.is_empty()
            || profile.role.is_empty()
            || profile.email_address.is_empty()
            || profile.chat_handle.is_empty()
        {
            return Err(Error::PersonaInvalid {
                reason: "Name, role, email, and chat handle are required.".to_string(),
            });
        }
        if profile.skills.is_empty() {
            return Err(Error::PersonaInvalid {
                reason: "Specify at least one skill.".to_string(),
            });
        }
        if profile.personality.is_empty() {
            return Err(Error::PersonaInvalid {
                reason: "Specify at least one personality trait.".to_string(),
            });
        }

        Ok(profile)
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn parse_comma_separated(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lines without a `start-end` range are dropped
fn parse_schedule(value: &str) -> Vec<ScheduleBlock> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (range, activity) = match line.split_once(' ') {
                Some((range, rest)) => (range, rest.trim()),
                None => (line, ""),
            };
            let (start, end) = range.split_once('-')?;
            Some(ScheduleBlock {
                start: start.trim().to_string(),
                end: end.trim().to_string(),
                activity: or_default(activity, DEFAULT_ACTIVITY),
            })
        })
        .collect()
}

fn parse_playbook(value: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(value).map_err(|source| Error::PlaybookInvalid { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_form() -> PersonaForm {
        PersonaForm {
            name: "Hana Kim".to_string(),
            role: "Designer".to_string(),
            email_address: "hana@vdos.local".to_string(),
            chat_handle: "hana".to_string(),
            skills: "Figma, UX research, ".to_string(),
            personality: "Curious".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let profile = valid_form().to_profile().unwrap();
        assert_eq!(profile.timezone, "UTC");
        assert_eq!(profile.work_hours, "09:00-17:00");
        assert_eq!(profile.break_frequency, "50/10 cadence");
        assert_eq!(profile.communication_style, "Async");
        assert_eq!(profile.team_name, None);
        assert_eq!(profile.skills, vec!["Figma", "UX research"]);
    }

    #[test]
    fn test_required_fields() {
        let mut form = valid_form();
        form.chat_handle = "  ".to_string();
        let err = form.to_profile().unwrap_err();
        assert_eq!(err.to_string(), "Name, role, email, and chat handle are required.");

        let mut form = valid_form();
        form.skills = " , ".to_string();
        assert_eq!(form.to_profile().unwrap_err().to_string(), "Specify at least one skill.");

        let mut form = valid_form();
        form.personality.clear();
        assert_eq!(
            form.to_profile().unwrap_err().to_string(),
            "Specify at least one personality trait."
        );
    }

    #[test]
    fn test_playbook_checked_first() {
        let form = PersonaForm {
            event_playbook: "{not json".to_string(),
            ..Default::default()
        };
        let err = form.to_profile().unwrap_err();
        assert_eq!(err.to_string(), "Invalid event playbook JSON");
    }

    #[test]
    fn test_playbook_parsed() {
        let mut form = valid_form();
        form.event_playbook = r#"{"client_change": ["Re-plan", "Notify lead"]}"#.to_string();
        let profile = form.to_profile().unwrap();
        assert_eq!(profile.event_playbook["client_change"].len(), 2);
    }

    #[test]
    fn test_schedule_parsing() {
        let blocks = parse_schedule("09:00-10:00 Standup\n\n10:00-12:00\nlunch\n13:00-14:00  Deep work ");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].activity, "Standup");
        assert_eq!(blocks[1].activity, "Focus block");
        assert_eq!(blocks[2].start, "13:00");
        assert_eq!(blocks[2].activity, "Deep work");
    }

    #[test]
    fn test_from_profile_round_trips_lists() {
        let profile = valid_form().to_profile().unwrap();
        let form = PersonaForm::from_profile(&profile);
        assert_eq!(form.skills, "Figma, UX research");
        assert_eq!(form.to_profile().unwrap().skills, profile.skills);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hana.toml");

        valid_form().save(&path).unwrap();
        let loaded = PersonaForm::load(&path).unwrap();
        assert_eq!(loaded, valid_form());
    }
}
