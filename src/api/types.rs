//! Wire types for the simulation manager REST API.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned persona identifier
pub type PersonaId = i64;

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────
// Simulation
// ─────────────────────────────────────────────────────────────────

/// Run-state reported by `GET /simulation`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationState {
    pub current_tick: u64,
    pub is_running: bool,
    pub auto_tick: bool,
    pub sim_time: String,
}

/// Body of `POST /simulation/advance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceRequest {
    pub ticks: u32,
    pub reason: String,
}

/// One project in a multi-project start request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    pub summary: String,
    pub team_ids: Vec<PersonaId>,
    pub start_week: u32,
    pub duration_weeks: u32,
}

/// Body of `POST /simulation/start`
///
/// Either `projects` is set (multi-project mode) or the legacy
/// `project_name` / `project_summary` / `duration_weeks` triple is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_person_ids: Option<Vec<PersonaId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_person_ids: Option<Vec<PersonaId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hint: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// Personas
// ─────────────────────────────────────────────────────────────────

/// A `HH:MM-HH:MM activity` block in a persona's day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub start: String,
    pub end: String,
    pub activity: String,
}

/// Authoring attributes of a persona; also the body of `POST /people`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaProfile {
    pub name: String,
    pub role: String,
    pub timezone: String,
    pub work_hours: String,
    pub break_frequency: String,
    pub communication_style: String,
    pub email_address: String,
    pub chat_handle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_department_head: bool,
    pub team_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub personality: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub objectives: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub schedule: Vec<ScheduleBlock>,
    #[serde(deserialize_with = "null_as_default")]
    pub planning_guidelines: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub event_playbook: BTreeMap<String, Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub statuses: Vec<String>,
}

/// A persona as stored by the simulation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    #[serde(flatten)]
    pub profile: PersonaProfile,
}

impl Persona {
    /// Minimal persona, mostly useful for building rosters in tests
    pub fn new(id: PersonaId, name: &str, role: &str, team_name: Option<&str>) -> Self {
        Self {
            id,
            profile: PersonaProfile {
                name: name.to_string(),
                role: role.to_string(),
                timezone: "UTC".to_string(),
                work_hours: "09:00-17:00".to_string(),
                team_name: team_name.map(str::to_string),
                ..Default::default()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn team_name(&self) -> Option<&str> {
        self.profile.team_name.as_deref()
    }
}

/// Body of `POST /personas/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hint: Option<String>,
}

/// Response of `POST /personas/generate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub persona: Option<PersonaProfile>,
}

// ─────────────────────────────────────────────────────────────────
// Plans, reports, metrics, events
// ─────────────────────────────────────────────────────────────────

/// Entry of `GET /people/{id}/plans`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPlan {
    pub tick: u64,
    pub plan_type: String,
    pub content: String,
}

/// Entry of `GET /people/{id}/daily-reports`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyReport {
    pub day_index: u64,
    pub report: String,
}

/// Entry of `GET /metrics/planner`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerMetric {
    pub timestamp: String,
    pub method: String,
    #[serde(alias = "result")]
    pub result_planner: String,
    pub model: String,
    pub duration_ms: Option<f64>,
    pub fallback: bool,
    pub error: Option<String>,
    pub context: serde_json::Value,
}

/// Body of `GET /simulation/token-usage`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    #[serde(deserialize_with = "null_as_default")]
    pub per_model: BTreeMap<String, u64>,
    pub total_tokens: u64,
}

/// Entry of `GET /events`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub target_ids: Vec<PersonaId>,
    pub at_tick: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_persona_from_server_json() {
        let value = json!({
            "id": 3,
            "name": "Hana Kim",
            "role": "Designer",
            "timezone": "Asia/Seoul",
            "work_hours": "09:00-18:00",
            "break_frequency": "50/10 cadence",
            "communication_style": "Warm async",
            "email_address": "hana@vdos.local",
            "chat_handle": "hana",
            "is_department_head": false,
            "team_name": null,
            "skills": ["Figma"],
            "personality": ["Curious"],
            "objectives": null,
            "metrics": null,
            "schedule": [{"start": "09:00", "end": "10:00", "activity": "Standup"}],
            "planning_guidelines": null,
            "event_playbook": null,
            "statuses": null,
            "persona_markdown": "# Hana"
        });

        let persona: Persona = serde_json::from_value(value).unwrap();
        assert_eq!(persona.id, 3);
        assert_eq!(persona.name(), "Hana Kim");
        assert_eq!(persona.team_name(), None);
        assert!(persona.profile.objectives.is_empty());
        assert_eq!(persona.profile.schedule[0].activity, "Standup");
    }

    #[test]
    fn test_start_request_omits_unset_fields() {
        let request = StartRequest {
            project_name: Some("Dashboard Project".to_string()),
            project_summary: Some("Generated from web dashboard".to_string()),
            duration_weeks: Some(1),
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("projects"));
        assert!(!object.contains_key("include_person_ids"));
        assert_eq!(object["duration_weeks"], 1);
    }

    #[test]
    fn test_planner_metric_accepts_result_alias() {
        let metric: PlannerMetric = serde_json::from_value(json!({
            "timestamp": "2025-01-01T00:00:00Z",
            "method": "generate_hourly_plan",
            "result": "stub",
            "fallback": true,
            "error": "timeout"
        }))
        .unwrap();
        assert_eq!(metric.result_planner, "stub");
        assert!(metric.fallback);
        assert_eq!(metric.duration_ms, None);
    }

    #[test]
    fn test_event_type_field_rename() {
        let event: SimEvent = serde_json::from_value(json!({
            "id": 9, "type": "sick_leave", "target_ids": [1, 2], "at_tick": 40
        }))
        .unwrap();
        assert_eq!(event.event_type, "sick_leave");
        assert_eq!(event.target_ids, vec![1, 2]);
    }
}
