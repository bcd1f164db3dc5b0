//! `dawnlock` command line.
//!
//! Administers the alarm preferences in the SQLite database and replays a
//! ringing session against mock devices so the lifecycle can be watched
//! from a terminal.

mod commands;
mod simulate;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dawnlock_alarm::RuntimeConfig;
use dawnlock_storage::{Database, Preferences};
use tracing_subscriber::EnvFilter;

use crate::simulate::Script;

#[derive(Parser, Debug)]
#[command(name = "dawnlock", version, about = "Tag-dismissed alarm clock")]
struct Cli {
    /// SQLite preference database, overrides the config file.
    #[arg(long, env = "DAWNLOCK_DB", global = true)]
    db: Option<String>,

    /// TOML runtime configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save HH:MM as the enabled alarm and arm it.
    Set { time: String },
    /// Re-arm the saved time.
    Enable,
    /// Cancel the alarm, keeping the saved time.
    Disable,
    /// Show the saved time and the countdown.
    Status,
    /// Register the tag that dismisses the alarm (hex, e.g. 04:a2:2b:91).
    RegisterTag { tag: String },
    ClearTag,
    /// Print the screen an app launch would land on.
    Route,
    /// Ring once against mock devices and print every view change.
    Simulate(Script),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref()).await?;
    if let Some(db) = cli.db {
        config = config.with_database_path(db);
    }

    let database = Database::new(config.database.clone())
        .await
        .with_context(|| format!("opening {}", config.database.database_path))?;
    let prefs = Preferences::new(database.preference_store());

    let result = match cli.command {
        Commands::Set { time } => commands::set(&prefs, &config, &time).await,
        Commands::Enable => commands::enable(&prefs, &config).await,
        Commands::Disable => commands::disable(&prefs, &config).await,
        Commands::Status => commands::status(&prefs, &config).await,
        Commands::RegisterTag { tag } => commands::register_tag(&prefs, &tag).await,
        Commands::ClearTag => commands::clear_tag(&prefs).await,
        Commands::Route => commands::route(&prefs).await,
        Commands::Simulate(script) => simulate::run(prefs, config, script).await,
    };

    database.close().await;
    result
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let config = parse_config(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

fn parse_config(text: &str) -> anyhow::Result<RuntimeConfig> {
    let config: RuntimeConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate_flags() {
        let cli = Cli::try_parse_from([
            "dawnlock",
            "--db",
            "/tmp/x.db",
            "simulate",
            "--unlock-after",
            "2",
            "--scan",
            "04:a2:2b:91",
        ])
        .unwrap();

        assert_eq!(cli.db.as_deref(), Some("/tmp/x.db"));
        let Commands::Simulate(script) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(script.unlock_after, Some(2));
        assert_eq!(script.scan.as_deref(), Some("04:a2:2b:91"));
        assert!(!script.snooze);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            "[session]\ngrace_period_ms = 5000\n\n[database]\ndatabase_path = \"alarm.db\"\n",
        )
        .unwrap();

        assert_eq!(config.session.grace_period().as_secs(), 5);
        assert_eq!(config.database.database_path, "alarm.db");
        assert_eq!(config.scheduler.snooze_minutes, 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(parse_config("[scheduler]\nsnooze_minutes = 0\n").is_err());
    }
}
