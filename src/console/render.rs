//! Plain-text rendering of dashboard views

use std::fmt::Write;
use std::time::Duration;

use crate::api::{Persona, PlannerMetric, SimEvent, SimulationState, TokenUsage};
use crate::dashboard::{
    DashboardSession, DraftProject, PersonaActivity, PollMode, SelectionReconciler, StatusLine,
    Team,
};
use crate::persona::PersonaForm;

const EMPTY: &str = "\u{2014}";

pub fn render_state(state: Option<&SimulationState>, mode: PollMode, period: Duration) -> String {
    let mut out = String::from("== Simulation ==\n");
    match state {
        Some(state) => {
            let sim_time = if state.sim_time.is_empty() {
                "Day 0 00:00"
            } else {
                state.sim_time.as_str()
            };
            let _ = writeln!(
                out,
                "status: {}  tick: {}  time: {}  auto: {}",
                if state.is_running { "running" } else { "stopped" },
                state.current_tick,
                sim_time,
                state.auto_tick
            );
        }
        None => out.push_str("status: unknown\n"),
    }
    let _ = writeln!(out, "refresh: {} every {}s", mode.as_str(), period.as_secs());
    out
}

pub fn render_personas(roster: &[Persona], selection: &SelectionReconciler) -> String {
    let mut out = String::from("== Personas ==\n");
    if roster.is_empty() {
        out.push_str("No personas registered.\n");
        return out;
    }
    for persona in roster {
        let mark = if selection.contains(persona.id) { "x" } else { " " };
        let team = persona
            .team_name()
            .map(|t| format!(" - {}", t))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "[{}] #{} {} ({}){}",
            mark,
            persona.id,
            persona.name(),
            persona.profile.role,
            team
        );
        let _ = writeln!(
            out,
            "      {} \u{b7} {}",
            persona.profile.timezone, persona.profile.work_hours
        );
    }
    out
}

pub fn render_activity(activity: &[PersonaActivity]) -> String {
    let mut out = String::from("== Plans ==\n");
    for entry in activity {
        let _ = writeln!(out, "-- {} (#{})", entry.name, entry.persona_id);
        match entry.outcome {
            Ok(ref snapshot) => {
                let _ = writeln!(
                    out,
                    "Latest Hourly Plan:\n{}",
                    snapshot.hourly_plan.as_deref().unwrap_or(EMPTY)
                );
                let _ = writeln!(
                    out,
                    "Latest Daily Report:\n{}",
                    snapshot.daily_report.as_deref().unwrap_or(EMPTY)
                );
            }
            Err(ref message) => {
                let _ = writeln!(out, "Error: {}", message);
            }
        }
    }
    out
}

/// Newest first
pub fn render_metrics(metrics: &[PlannerMetric]) -> String {
    let mut out = String::from("== Planner metrics ==\n");
    for metric in metrics.iter().rev() {
        let fallback = match (metric.fallback, metric.error.as_deref()) {
            (true, Some(error)) => format!("Yes ({})", error),
            (true, None) => "Yes".to_string(),
            (false, _) => "No".to_string(),
        };
        let duration = metric
            .duration_ms
            .map(|d| format!("{:.1}ms", d))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {} {} {} {} fallback={} {}",
            metric.timestamp,
            metric.method,
            metric.result_planner,
            metric.model,
            duration,
            fallback,
            metric.context
        );
    }
    out
}

pub fn render_token_usage(usage: Option<&TokenUsage>) -> String {
    let mut out = String::from("== Token usage ==\n");
    if let Some(usage) = usage {
        for (model, tokens) in &usage.per_model {
            let _ = writeln!(out, "{}: {}", model, tokens);
        }
        let _ = writeln!(out, "total: {}", usage.total_tokens);
    }
    out
}

/// The last `shown` events, newest first
pub fn render_events(events: &[SimEvent], shown: usize) -> String {
    let mut out = String::from("== Events ==\n");
    let skip = events.len().saturating_sub(shown);
    for event in events[skip..].iter().rev() {
        let targets = event
            .target_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let at_tick = event
            .at_tick
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "#{} [{}] targets={} at tick {}",
            event.id, event.event_type, targets, at_tick
        );
    }
    out
}

pub fn render_projects(drafts: &[DraftProject], roster: &[Persona]) -> String {
    let mut out = String::from("== Projects ==\n");
    if drafts.is_empty() {
        out.push_str("No draft projects; the default project will be used.\n");
        return out;
    }
    for (index, project) in drafts.iter().enumerate() {
        let members = roster
            .iter()
            .filter(|p| project.team_ids.contains(&p.id))
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "{}. {}", index + 1, project.name);
        let _ = writeln!(out, "   {}", project.summary);
        let _ = writeln!(
            out,
            "   Week {} - {} ({} weeks)",
            project.start_week,
            project.end_week(),
            project.duration_weeks
        );
        let _ = writeln!(out, "   Team: {}", members);
    }
    out
}

/// Numbered team choices for the selection step
pub fn render_teams(project_name: &str, teams: &[Team]) -> String {
    let mut out = format!("Select teams for \"{}\":\n", project_name);
    for (index, team) in teams.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({} members)", index + 1, team.name, team.members.len());
    }
    out.push_str("Enter `project teams` with team numbers separated by commas (e.g. 1,2)\n");
    out
}

pub fn render_status(status: &StatusLine) -> String {
    if status.message.is_empty() {
        String::new()
    } else if status.is_error {
        format!("error: {}\n", status.message)
    } else {
        format!("{}\n", status.message)
    }
}

pub fn render_persona_form(form: &PersonaForm) -> String {
    let mut out = String::from("== Persona draft ==\n");
    let _ = writeln!(out, "name: {}", form.name);
    let _ = writeln!(out, "role: {}", form.role);
    let _ = writeln!(out, "timezone: {}  hours: {}", form.timezone, form.work_hours);
    let _ = writeln!(out, "email: {}  chat: {}", form.email_address, form.chat_handle);
    if !form.team_name.is_empty() {
        let _ = writeln!(out, "team: {}", form.team_name);
    }
    let _ = writeln!(out, "skills: {}", form.skills);
    let _ = writeln!(out, "personality: {}", form.personality);
    if !form.schedule.is_empty() {
        let _ = writeln!(out, "schedule:\n{}", form.schedule);
    }
    out
}

/// Every view, in dashboard order
pub fn render_dashboard(
    session: &DashboardSession,
    mode: PollMode,
    period: Duration,
    events_shown: usize,
) -> String {
    [
        render_state(session.state(), mode, period),
        render_personas(session.roster(), &session.selection),
        render_activity(session.activity()),
        render_projects(session.drafts.list_drafts(), session.roster()),
        render_metrics(session.metrics()),
        render_token_usage(session.token_usage()),
        render_events(session.events(), events_shown),
        render_status(session.status()),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::session::ActivitySnapshot;

    #[test]
    fn test_project_weeks_from_console_input() {
        use crate::console::ConsoleCommand;
        use crate::dashboard::DraftAuthoring;

        let roster = vec![Persona::new(1, "Ada", "Lead", Some("Core"))];
        let details = |line: &str| match ConsoleCommand::parse(line) {
            Ok(Some(ConsoleCommand::ProjectAdd(details))) => details,
            other => panic!("unexpected parse result: {:?}", other),
        };

        let mut authoring = DraftAuthoring::new();
        assert!(authoring
            .submit_details(details("project add 4294967295 2 Big | Summary"), &roster)
            .is_err());

        authoring
            .submit_details(details("project add 52 2 Big | Summary"), &roster)
            .unwrap();
        let project = authoring.select_teams(&[0]).unwrap();

        let text = render_projects(&[project], &roster);
        assert!(text.contains("Week 52 - 53 (2 weeks)"));
        assert!(text.contains("Team: Ada"));
    }

    #[test]
    fn test_events_newest_first_limited() {
        let events: Vec<SimEvent> = (1..=12)
            .map(|id| SimEvent {
                id,
                event_type: "meeting".to_string(),
                target_ids: vec![1, 2],
                at_tick: Some(id as u64),
            })
            .collect();

        let text = render_events(&events, 10);
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "#12 [meeting] targets=1, 2 at tick 12");
        assert_eq!(lines[9], "#3 [meeting] targets=1, 2 at tick 3");
    }

    #[test]
    fn test_metrics_fallback_column() {
        let metrics = vec![
            PlannerMetric {
                method: "first".to_string(),
                fallback: true,
                error: Some("timeout".to_string()),
                ..Default::default()
            },
            PlannerMetric {
                method: "second".to_string(),
                ..Default::default()
            },
        ];
        let text = render_metrics(&metrics);
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert!(lines[0].contains("second") && lines[0].contains("fallback=No"));
        assert!(lines[1].contains("fallback=Yes (timeout)"));
    }

    #[test]
    fn test_personas_show_selection_and_team() {
        let roster = vec![
            Persona::new(1, "Ada", "Lead", Some("Core")),
            Persona::new(2, "Bo", "Designer", None),
        ];
        let mut selection = SelectionReconciler::new();
        selection.toggle(1, true);

        let text = render_personas(&roster, &selection);
        assert!(text.contains("[x] #1 Ada (Lead) - Core"));
        assert!(text.contains("[ ] #2 Bo (Designer)\n"));
    }

    #[test]
    fn test_activity_empty_and_error() {
        let activity = vec![
            PersonaActivity {
                persona_id: 1,
                name: "Ada".to_string(),
                outcome: Ok(ActivitySnapshot::default()),
            },
            PersonaActivity {
                persona_id: 2,
                name: "Bo".to_string(),
                outcome: Err("No plans for person 2".to_string()),
            },
        ];
        let text = render_activity(&activity);
        assert!(text.contains("Latest Hourly Plan:\n\u{2014}"));
        assert!(text.contains("Error: No plans for person 2"));
    }

    #[test]
    fn test_project_timeline() {
        let drafts = vec![DraftProject {
            name: "Launch".to_string(),
            summary: "Ship v1".to_string(),
            team_ids: vec![1],
            start_week: 2,
            duration_weeks: 3,
        }];
        let roster = vec![Persona::new(1, "Ada", "Lead", None)];
        let text = render_projects(&drafts, &roster);
        assert!(text.contains("Week 2 - 4 (3 weeks)"));
        assert!(text.contains("Team: Ada"));
    }
}
