use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use stratagem::adapter::inbound::cli::command::{
    AlertsCommand, Cli, ColorChoice, Commands, KillSwitchCommand,
};
use stratagem::adapter::inbound::cli::check::CheckReport;
use stratagem::adapter::inbound::cli::output::{self, OutputConfig};
use stratagem::adapter::inbound::cli::{alerts, check, control, history, paths, run, status};
use stratagem::application::engine::Engine;
use stratagem::error::Result;
use stratagem::infrastructure::bootstrap;
use stratagem::infrastructure::config::settings::Config;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal(),
    };
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose, color));

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("Failed to load config: {e}"));
            std::process::exit(1);
        }
    };
    if cli.verbose > 0 {
        config.logging.level = if cli.verbose > 1 { "trace" } else { "debug" }.into();
    }
    config.init_logging();

    if let Err(e) = dispatch(&cli, &config).await {
        error!(error = %e, "Command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// A missing file at the default location means "use defaults"; a missing
/// file the user named explicitly is an error.
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == paths::default_config() {
        return Ok(Config::default());
    }
    Config::load(path)
}

async fn dispatch(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Check => {
            bootstrap::open_database(config)?;
            check::execute(&check_report(&cli.config, config));
            Ok(())
        }
        Commands::Run(args) => {
            let engine = started(config).await?;
            info!("stratagem starting");
            run::execute(engine, args).await
        }
        Commands::Status => status::execute(started(config).await?.as_ref()).await,
        Commands::History(args) => {
            let engine = restored(config).await?;
            history::execute(engine.as_ref(), args.strategy.as_deref(), args.days).await
        }
        Commands::Gate(arg) => {
            control::gate(restored(config).await?.as_ref(), &arg.id);
            Ok(())
        }
        Commands::KillSwitch(KillSwitchCommand::On { by, reason }) => {
            control::kill_switch_on(restored(config).await?.as_ref(), by, reason).await
        }
        Commands::KillSwitch(KillSwitchCommand::Off { by }) => {
            control::kill_switch_off(restored(config).await?.as_ref(), by).await
        }
        Commands::Register(args) => {
            control::register(restored(config).await?.as_ref(), &args.id, args.category).await
        }
        Commands::Promote(args) => {
            control::promote(started(config).await?.as_ref(), &args.id, &args.by).await
        }
        Commands::Deprecate(args) => {
            let engine = started(config).await?;
            control::deprecate(engine.as_ref(), &args.id, &args.by, &args.reason).await
        }
        Commands::Alerts(AlertsCommand::List { all }) => {
            alerts::list(restored(config).await?.as_ref(), *all).await
        }
        Commands::Alerts(AlertsCommand::Ack { id }) => {
            alerts::acknowledge(restored(config).await?.as_ref(), id).await
        }
    }
}

fn check_report(path: &Path, config: &Config) -> CheckReport {
    CheckReport {
        config_path: path.to_path_buf(),
        config_found: path.exists(),
        database: config.database.clone(),
        strategies: config.strategies.len(),
        fallback: config
            .bootstrap
            .fallback
            .iter()
            .map(|decl| decl.id.clone())
            .collect(),
        signals_dir: config.execution.signals_dir.clone(),
    }
}

/// Engine with persisted state loaded and nothing recomputed.
async fn restored(config: &Config) -> Result<Arc<Engine>> {
    let engine = bootstrap::build_engine(config)?;
    engine.restore().await?;
    Ok(engine)
}

/// Engine after a startup refresh against current performance data.
async fn started(config: &Config) -> Result<Arc<Engine>> {
    let engine = bootstrap::build_engine(config)?;
    engine.initialize().await?;
    Ok(engine)
}
