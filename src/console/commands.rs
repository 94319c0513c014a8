//! Operator command parsing
//!
//! One command per stdin line. Persona and team numbers typed by the operator
//! are one-based; parsed commands carry zero-based indices.

use std::path::PathBuf;

use crate::api::PersonaId;
use crate::dashboard::DraftDetails;
use crate::error::{Error, Result};

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Show,
    Refresh,
    Quit,

    Start,
    Stop,
    Reset,
    FullReset { confirmed: bool },
    Advance { ticks: Option<u32>, reason: Option<String> },
    AutoTicks { enabled: bool },

    Select(PersonaId),
    Deselect(PersonaId),
    Seed(Option<u64>),
    Model(Option<String>),

    PersonaCreate(Option<PathBuf>),
    PersonaGenerate(String),
    PersonaShow,

    Projects,
    ProjectAdd(DraftDetails),
    ProjectTeams(Vec<usize>),
    ProjectCancel,
    ProjectRemove(usize),
}

pub const HELP: &str = "\
Commands:
  show | refresh | quit
  start | stop | reset | full-reset confirm
  advance [TICKS] [REASON...]
  ticks start | ticks stop
  select ID | deselect ID
  seed N | seed clear | model NAME | model clear
  persona generate PROMPT... | persona show | persona create [FILE]
  projects
  project add START_WEEK DURATION_WEEKS NAME | SUMMARY
  project teams 1,2 | project cancel | project remove N
";

impl ConsoleCommand {
    /// Parse one line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, rest) = split_word(line);
        let command = match head {
            "help" | "?" => ConsoleCommand::Help,
            "show" => ConsoleCommand::Show,
            "refresh" => ConsoleCommand::Refresh,
            "quit" | "exit" => ConsoleCommand::Quit,
            "start" => ConsoleCommand::Start,
            "stop" => ConsoleCommand::Stop,
            "reset" => ConsoleCommand::Reset,
            "full-reset" => ConsoleCommand::FullReset {
                confirmed: rest == "confirm",
            },
            "advance" => parse_advance(rest)?,
            "ticks" => match rest {
                "start" => ConsoleCommand::AutoTicks { enabled: true },
                "stop" => ConsoleCommand::AutoTicks { enabled: false },
                _ => return Err(usage("ticks start | ticks stop")),
            },
            "select" => ConsoleCommand::Select(parse_id(rest)?),
            "deselect" => ConsoleCommand::Deselect(parse_id(rest)?),
            "seed" => match rest {
                "clear" => ConsoleCommand::Seed(None),
                value => ConsoleCommand::Seed(Some(
                    value
                        .parse()
                        .map_err(|_| Error::field_invalid("random_seed", "Seed must be a non-negative integer"))?,
                )),
            },
            "model" => match rest {
                "" => return Err(usage("model NAME | model clear")),
                "clear" => ConsoleCommand::Model(None),
                hint => ConsoleCommand::Model(Some(hint.to_string())),
            },
            "persona" => parse_persona(rest)?,
            "projects" => ConsoleCommand::Projects,
            "project" => parse_project(rest)?,
            other => {
                return Err(Error::validation(format!(
                    "Unknown command '{}'. Type 'help' for commands.",
                    other
                )))
            }
        };

        Ok(Some(command))
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

fn usage(text: &str) -> Error {
    Error::validation(format!("Usage: {}", text))
}

fn parse_id(text: &str) -> Result<PersonaId> {
    text.parse()
        .map_err(|_| Error::field_invalid("persona_id", format!("Invalid persona id '{}'", text)))
}

fn parse_advance(rest: &str) -> Result<ConsoleCommand> {
    let (first, remainder) = split_word(rest);
    let (ticks, reason) = match first.parse::<u32>() {
        Ok(ticks) => (Some(ticks), remainder),
        Err(_) => (None, rest),
    };
    Ok(ConsoleCommand::Advance {
        ticks,
        reason: (!reason.is_empty()).then(|| reason.to_string()),
    })
}

fn parse_persona(rest: &str) -> Result<ConsoleCommand> {
    let (sub, args) = split_word(rest);
    match sub {
        "create" if args.is_empty() => Ok(ConsoleCommand::PersonaCreate(None)),
        "create" => Ok(ConsoleCommand::PersonaCreate(Some(PathBuf::from(args)))),
        "generate" => Ok(ConsoleCommand::PersonaGenerate(args.to_string())),
        "show" => Ok(ConsoleCommand::PersonaShow),
        _ => Err(usage("persona generate PROMPT | persona show | persona create [FILE]")),
    }
}

fn parse_project(rest: &str) -> Result<ConsoleCommand> {
    let (sub, args) = split_word(rest);
    match sub {
        "add" => parse_project_add(args),
        "teams" => Ok(ConsoleCommand::ProjectTeams(parse_team_numbers(args))),
        "cancel" => Ok(ConsoleCommand::ProjectCancel),
        "remove" => match args.parse::<usize>() {
            Ok(number) if number >= 1 => Ok(ConsoleCommand::ProjectRemove(number - 1)),
            _ => Err(usage("project remove N (N starts at 1)")),
        },
        _ => Err(usage("project add | project teams | project cancel | project remove")),
    }
}

fn parse_project_add(args: &str) -> Result<ConsoleCommand> {
    const USAGE: &str = "project add START_WEEK DURATION_WEEKS NAME | SUMMARY";

    let (start, rest) = split_word(args);
    let (duration, text) = split_word(rest);
    let start_week = start
        .parse::<u32>()
        .map_err(|_| Error::field_invalid("start_week", "Invalid start week"))?;
    let duration_weeks = duration
        .parse::<u32>()
        .map_err(|_| Error::field_invalid("duration_weeks", "Invalid duration"))?;
    let (name, summary) = text.split_once('|').ok_or_else(|| usage(USAGE))?;

    Ok(ConsoleCommand::ProjectAdd(DraftDetails {
        name: name.trim().to_string(),
        summary: summary.trim().to_string(),
        start_week,
        duration_weeks,
    }))
}

/// "1, 3" -> [0, 2]; entries that are not positive numbers are skipped
fn parse_team_numbers(text: &str) -> Vec<usize> {
    text.split(',')
        .filter_map(|part| part.trim().parse::<usize>().ok())
        .filter(|&number| number >= 1)
        .map(|number| number - 1)
        .collect()
}
