//! Interactive operator console
//!
//! Reads one command per line, runs it through the dashboard and answers
//! with text. The console never fails: errors become the reply.

pub mod commands;
pub mod render;

use std::sync::Arc;

use tracing::debug;

use crate::api::PersonaId;
use crate::dashboard::Dashboard;
use crate::error::{Error, Result};
use crate::persona::PersonaForm;

pub use commands::{ConsoleCommand, HELP};

/// Text shown to the operator after a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleReply {
    pub text: String,
    pub quit: bool,
}

impl ConsoleReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

pub struct Console {
    dashboard: Arc<Dashboard>,
    events_shown: usize,
}

impl Console {
    pub fn new(dashboard: Arc<Dashboard>, events_shown: usize) -> Self {
        Self {
            dashboard,
            events_shown,
        }
    }

    /// Parse and run one input line
    pub async fn handle_line(&self, line: &str) -> ConsoleReply {
        match ConsoleCommand::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => ConsoleReply::default(),
            Err(e) => ConsoleReply::text(format!("error: {}\n", e.status_message())),
        }
    }

    pub async fn execute(&self, command: ConsoleCommand) -> ConsoleReply {
        debug!(?command, "Console command");
        let dispatcher = self.dashboard.dispatcher();

        let outcome: Result<Option<String>> = match command {
            ConsoleCommand::Help => Ok(Some(HELP.to_string())),
            ConsoleCommand::Quit => {
                return ConsoleReply {
                    text: String::new(),
                    quit: true,
                }
            }
            ConsoleCommand::Show => return ConsoleReply::text(self.dashboard_text()),
            ConsoleCommand::Refresh => dispatcher.refresh().await.map(|_| None),
            ConsoleCommand::Projects => {
                let session = self.dashboard.session().read();
                Ok(Some(render::render_projects(
                    session.drafts.list_drafts(),
                    session.roster(),
                )))
            }

            ConsoleCommand::Start => dispatcher.start_simulation().await.map(|_| None),
            ConsoleCommand::Stop => dispatcher.stop_simulation().await.map(|_| None),
            ConsoleCommand::Reset => dispatcher.reset_simulation().await.map(|_| None),
            ConsoleCommand::FullReset { confirmed } => {
                dispatcher.full_reset(confirmed).await.map(|_| None)
            }
            ConsoleCommand::Advance { ticks, reason } => dispatcher
                .advance(ticks, reason.as_deref())
                .await
                .map(|_| None),
            ConsoleCommand::AutoTicks { enabled: true } => {
                dispatcher.start_auto_ticks().await.map(|_| None)
            }
            ConsoleCommand::AutoTicks { enabled: false } => {
                dispatcher.stop_auto_ticks().await.map(|_| None)
            }

            ConsoleCommand::Select(id) => self.toggle(id, true),
            ConsoleCommand::Deselect(id) => self.toggle(id, false),
            ConsoleCommand::Seed(seed) => {
                self.dashboard.session().write().start_options.random_seed = seed;
                Ok(Some(match seed {
                    Some(seed) => format!("Random seed set to {}\n", seed),
                    None => "Random seed cleared\n".to_string(),
                }))
            }
            ConsoleCommand::Model(hint) => {
                let text = match hint.as_deref() {
                    Some(hint) => format!("Model hint set to {}\n", hint),
                    None => "Model hint cleared\n".to_string(),
                };
                self.dashboard.session().write().start_options.model_hint = hint;
                Ok(Some(text))
            }

            ConsoleCommand::PersonaGenerate(prompt) => {
                let hint = self.dashboard.session().read().start_options.model_hint.clone();
                dispatcher
                    .generate_persona(&prompt, hint.as_deref())
                    .await
                    .map(|form| Some(render::render_persona_form(&form)))
            }
            ConsoleCommand::PersonaShow => {
                let draft = self.dashboard.session().read().persona_draft.clone();
                Ok(Some(match draft {
                    Some(form) => render::render_persona_form(&form),
                    None => "No drafted persona.\n".to_string(),
                }))
            }
            ConsoleCommand::PersonaCreate(Some(path)) => match PersonaForm::load(&path) {
                Ok(form) => dispatcher.create_persona(&form).await.map(|_| None),
                Err(e) => {
                    self.dashboard.session().write().set_error(e.status_message());
                    Err(e)
                }
            },
            ConsoleCommand::PersonaCreate(None) => {
                dispatcher.create_drafted_persona().await.map(|_| None)
            }

            ConsoleCommand::ProjectAdd(details) => {
                let name = details.name.clone();
                dispatcher
                    .begin_project(details)
                    .map(|teams| Some(render::render_teams(&name, &teams)))
            }
            ConsoleCommand::ProjectTeams(indices) => dispatcher
                .choose_project_teams(&indices)
                .map(|_| None),
            ConsoleCommand::ProjectCancel => {
                dispatcher.cancel_project();
                Ok(Some("Project authoring cancelled\n".to_string()))
            }
            ConsoleCommand::ProjectRemove(index) => {
                dispatcher.remove_project(index).map(|_| None)
            }
        };

        match outcome {
            Ok(Some(text)) => ConsoleReply::text(text),
            Ok(None) => ConsoleReply::text(self.status_text()),
            Err(e) => ConsoleReply::text(format!("error: {}\n", e.status_message())),
        }
    }

    /// Every view as text
    pub fn dashboard_text(&self) -> String {
        let session = self.dashboard.session().read();
        render::render_dashboard(
            &session,
            self.dashboard.poll_mode(),
            self.dashboard.poll_period(),
            self.events_shown,
        )
    }

    /// Check or uncheck a persona that is in the roster
    fn toggle(&self, id: PersonaId, checked: bool) -> Result<Option<String>> {
        let known = self.dashboard.session().read().persona(id).is_some();
        if !known {
            return Err(Error::field_invalid(
                "persona_id",
                format!("No persona #{} in the roster", id),
            ));
        }

        self.dashboard.dispatcher().toggle_persona(id, checked);
        let session = self.dashboard.session().read();
        Ok(Some(render::render_personas(
            session.roster(),
            &session.selection,
        )))
    }

    fn status_text(&self) -> String {
        render::render_status(self.dashboard.session().read().status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockSimulationApi, Persona};
    use crate::config::DashboardConfig;
    use crate::dashboard::poll::tests::RecordingScheduler;

    fn console() -> (Console, Arc<MockSimulationApi>) {
        let api = Arc::new(MockSimulationApi::with_personas(vec![
            Persona::new(1, "Ada", "Lead", Some("Core")),
            Persona::new(2, "Bo", "Designer", None),
        ]));
        let scheduler = Arc::new(RecordingScheduler::default());
        let dashboard = Dashboard::new(api.clone(), scheduler, &DashboardConfig::default());
        (Console::new(Arc::new(dashboard), 10), api)
    }

    #[tokio::test]
    async fn test_quit_and_blank() {
        let (console, _) = console();
        assert!(console.handle_line("quit").await.quit);
        assert_eq!(console.handle_line("").await, ConsoleReply::default());
    }

    #[tokio::test]
    async fn test_start_reports_status() {
        let (console, api) = console();
        console.handle_line("refresh").await;
        let reply = console.handle_line("start").await;
        assert_eq!(reply.text, "Simulation started\n");
        assert!(api.state().is_running);
    }

    #[tokio::test]
    async fn test_failed_action_shows_error() {
        let (console, api) = console();
        api.fail_commands(500, "engine down");
        let reply = console.handle_line("stop").await;
        assert!(reply.text.starts_with("error:"));
        assert!(reply.text.contains("engine down"));
    }

    #[tokio::test]
    async fn test_full_reset_without_confirm_is_refused() {
        let (console, api) = console();
        let reply = console.handle_line("full-reset").await;
        assert!(reply.text.contains("confirm"));
        assert_eq!(api.call_count("full_reset"), 0);
    }

    #[tokio::test]
    async fn test_project_flow() {
        let (console, _) = console();
        console.handle_line("refresh").await;

        let reply = console.handle_line("project add 1 2 Launch | Ship it").await;
        assert!(reply.text.contains("1. Core (1 members)"));

        let reply = console.handle_line("project teams 1").await;
        assert_eq!(reply.text, "Added project: Launch\n");

        let reply = console.handle_line("projects").await;
        assert!(reply.text.contains("Week 1 - 2 (2 weeks)"));
    }

    #[tokio::test]
    async fn test_select_unknown_persona() {
        let (console, _) = console();
        console.handle_line("refresh").await;
        let reply = console.handle_line("deselect 9").await;
        assert!(reply.text.contains("No persona #9"));

        let reply = console.handle_line("deselect 2").await;
        assert!(reply.text.contains("[ ] #2 Bo"));
    }

    #[tokio::test]
    async fn test_seed_and_model() {
        let (console, _) = console();
        console.handle_line("seed 42").await;
        console.handle_line("model gpt-4o").await;
        let dispatcher = console.dashboard.dispatcher();
        let request = dispatcher.build_start_request();
        assert_eq!(request.random_seed, Some(42));
        assert_eq!(request.model_hint.as_deref(), Some("gpt-4o"));
    }
}
