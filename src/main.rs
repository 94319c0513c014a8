//! VDOS Dashboard - control panel for the VDOS simulation service
//!
//! This is the main entry point for the dashboard binary. `run` keeps an
//! interactive session in sync with the simulation manager; the other
//! commands perform one action and print the result.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use vdos_dashboard::api::{HttpSimulationApi, SimulationApi};
use vdos_dashboard::config::{self, DashboardConfig};
use vdos_dashboard::console::{render, Console};
use vdos_dashboard::dashboard::{Dashboard, Tick, TokioTickScheduler};
use vdos_dashboard::error::{Error, Result};
use vdos_dashboard::logging;
use vdos_dashboard::persona::PersonaForm;
use vdos_dashboard::version;

use crate::cli::{Cli, Commands, ConfigSubcommand, PersonaSubcommand, StartArgs, TicksSubcommand};

fn main() -> Result<()> {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone(), cli.config.as_deref());
        }
        _ => {}
    }

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprint!("{}", e.format_for_terminal());
            std::process::exit(e.exit_code());
        }
    };

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        api_root = %config.server.api_root(),
        "Starting VDOS dashboard"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    if let Err(e) = runtime.block_on(run_command(cli.command, config)) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(ref base_url) = cli.base_url {
        config.server.base_url = base_url.clone();
        config.validate()?;
    }
    Ok(config)
}

/// Build a dashboard wired to the HTTP API
fn build_dashboard(config: &DashboardConfig) -> Result<(Arc<Dashboard>, UnboundedReceiver<Tick>)> {
    let api: Arc<dyn SimulationApi> = Arc::new(HttpSimulationApi::new(&config.server)?);
    let (scheduler, ticks) = TokioTickScheduler::new();
    let dashboard = Dashboard::new(api, Arc::new(scheduler), config);
    Ok((Arc::new(dashboard), ticks))
}

async fn run_command(command: Commands, config: DashboardConfig) -> Result<()> {
    if let Commands::Run = command {
        return run_dashboard(config).await;
    }

    let (dashboard, _ticks) = build_dashboard(&config)?;
    let dispatcher = dashboard.dispatcher();

    let result = match command {
        Commands::Status { events } => {
            let refreshed = dispatcher.refresh().await;
            dashboard.shutdown();
            refreshed?;
            let session = dashboard.session().read();
            // The rendered views end with the status line
            print!(
                "{}",
                render::render_dashboard(
                    &session,
                    dashboard.poll_mode(),
                    dashboard.poll_period(),
                    events.unwrap_or(config.polling.events_shown),
                )
            );
            return Ok(());
        }
        Commands::Start(args) => {
            // Selection defaults to the whole roster
            dashboard.refresher().refresh_roster().await?;
            apply_start_args(&dashboard, args);
            dispatcher.start_simulation().await
        }
        Commands::Stop => dispatcher.stop_simulation().await,
        Commands::Reset => dispatcher.reset_simulation().await,
        Commands::FullReset { yes } => dispatcher.full_reset(yes).await,
        Commands::Advance { ticks, reason } => {
            dispatcher.advance(ticks, reason.as_deref()).await
        }
        Commands::Ticks {
            subcommand: TicksSubcommand::Start,
        } => dispatcher.start_auto_ticks().await,
        Commands::Ticks {
            subcommand: TicksSubcommand::Stop,
        } => dispatcher.stop_auto_ticks().await,
        Commands::Persona { subcommand } => {
            handle_persona_command(&dashboard, subcommand, &config).await
        }
        Commands::Run | Commands::Version | Commands::Config { .. } => {
            // Already handled above
            unreachable!();
        }
    };

    dashboard.shutdown();
    result?;
    print!("{}", render::render_status(dashboard.session().read().status()));
    Ok(())
}

fn apply_start_args(dashboard: &Dashboard, args: StartArgs) {
    let mut session = dashboard.session().write();
    let options = &mut session.start_options;
    if let Some(name) = args.project_name {
        options.project_name = name;
    }
    if let Some(summary) = args.project_summary {
        options.project_summary = summary;
    }
    if let Some(weeks) = args.duration_weeks {
        options.duration_weeks = weeks;
    }
    if args.seed.is_some() {
        options.random_seed = args.seed;
    }
    if args.model_hint.is_some() {
        options.model_hint = args.model_hint;
    }
}

async fn handle_persona_command(
    dashboard: &Dashboard,
    subcommand: PersonaSubcommand,
    config: &DashboardConfig,
) -> Result<()> {
    let dispatcher = dashboard.dispatcher();
    match subcommand {
        PersonaSubcommand::Create { file } => {
            let form = PersonaForm::load(&file)?;
            let persona = dispatcher.create_persona(&form).await?;
            println!("Persona #{} created", persona.id);
        }
        PersonaSubcommand::Generate {
            prompt,
            model_hint,
            output,
        } => {
            let hint = model_hint.or_else(|| config.simulation.model_hint.clone());
            let form = dispatcher.generate_persona(&prompt, hint.as_deref()).await?;
            print!("{}", render::render_persona_form(&form));
            if let Some(path) = output {
                form.save(&path)?;
                println!("Draft saved to {}", path.display());
            }
        }
    }
    Ok(())
}

/// Interactive dashboard: polls on the adaptive timer and reads commands
async fn run_dashboard(config: DashboardConfig) -> Result<()> {
    let (dashboard, mut ticks) = build_dashboard(&config)?;
    let console = Console::new(Arc::clone(&dashboard), config.polling.events_shown);

    dashboard.start();
    if let Err(e) = dashboard.refresher().refresh_all().await {
        warn!(error = %e, "Initial refresh failed");
    }
    print!("{}", console.dashboard_text());
    println!("Type 'help' for commands.");

    let shutdown_signal = tokio::signal::ctrl_c();
    tokio::pin!(shutdown_signal);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!("Dashboard event loop started");

    loop {
        tokio::select! {
            // Ctrl+C shutdown
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received");
                break;
            }

            // Refresh timer
            tick = ticks.recv() => {
                let Some(tick) = tick else {
                    warn!("Tick channel closed");
                    break;
                };
                if !dashboard.accepts(&tick) {
                    debug!(timer = tick.handle.id(), "Ignoring tick from cancelled timer");
                    continue;
                }
                let dashboard = Arc::clone(&dashboard);
                tokio::spawn(async move {
                    if let Err(e) = dashboard.refresher().refresh_all().await {
                        warn!(error = %e, "Scheduled refresh failed");
                    }
                    let session = dashboard.session().read();
                    print!(
                        "{}{}",
                        render::render_state(session.state(), dashboard.poll_mode(), dashboard.poll_period()),
                        render::render_status(session.status())
                    );
                });
            }

            // Operator commands
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let reply = console.handle_line(&line).await;
                        print!("{}", reply.text);
                        if reply.quit {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Standard input closed; polling continues until Ctrl+C");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read command");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    dashboard.shutdown();
    info!("Dashboard shutting down");
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = DashboardConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate => match DashboardConfig::load(config_path) {
            Ok(_) => {
                println!("Configuration is valid.");
            }
            Err(e) => {
                eprint!("{}", e.format_for_terminal());
                std::process::exit(e.exit_code());
            }
        },
    }

    Ok(())
}
