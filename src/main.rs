use anyhow::{Context, Result};
use clap::Parser;
use mrkbackup::backup::BackupManager;
use mrkbackup::config::StoreConfig;
use mrkbackup::shell::{Outcome, Shell, TerminalPrompt};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mrkbackup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Local file-tree backup manager", long_about = None)]
struct Cli {
    /// Storage root (overrides MRKBACKUP_ROOT and the config file)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// JSON config file (defaults to MRKBACKUP_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single shell command and exit, e.g. `mrkbackup list`
    #[arg(trailing_var_arg = true, value_name = "COMMAND")]
    command: Vec<String>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mrkbackup=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config =
        StoreConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }

    let manager = BackupManager::from_config(&config).context("Invalid storage configuration")?;
    let mut shell = Shell::new(manager, Box::new(TerminalPrompt));
    let mut stdout = io::stdout();

    if !cli.command.is_empty() {
        let outcome = shell.execute_line(&cli.command.join(" "), &mut stdout)?;
        stdout.flush()?;
        return Ok(match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
        });
    }

    // Read line by line without holding the stdin lock, so the directory
    // prompt can read from stdin too.
    let lines = std::iter::from_fn(|| {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    });
    shell.run(lines, &mut stdout)?;

    Ok(ExitCode::SUCCESS)
}
