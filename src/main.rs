//! flakewatch CLI entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use flakewatch::cli::{targets, Args, Commands, Verbosity};
use flakewatch::config::Config;
use flakewatch::invocation::ToolInvocation;
use flakewatch::orchestrator::WatchOrchestrator;
use flakewatch::sink::TerminalSink;
use flakewatch::trigger::{SaveEvent, SaveTrigger};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(msg) = args.validate() {
        eprintln!("{} {}", "error:".red().bold(), msg);
        std::process::exit(2);
    }

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(tool) = &args.tool {
        config.tool.command = tool.clone();
    }
    if let Some(timeout) = args.timeout {
        config.tool.timeout_secs = timeout;
    }

    let verbosity = args.verbosity();
    let sink = TerminalSink::new(args.json, verbosity.show_progress());
    let orchestrator = WatchOrchestrator::new(&config, sink);

    match &args.command {
        None => run_check(&config, &orchestrator, &args.files, verbosity).await,
        Some(Commands::Check { files }) => run_check(&config, &orchestrator, files, verbosity).await,
        Some(Commands::Package { files }) => {
            run_package(&config, &orchestrator, files, verbosity).await
        }
        Some(Commands::Watch) => run_watch(&config, orchestrator).await,
        Some(Commands::Config) => show_config(&config),
    }
}

/// Run over an explicit file list.
async fn run_check(
    config: &Config,
    orchestrator: &WatchOrchestrator<TerminalSink>,
    files: &[PathBuf],
    verbosity: Verbosity,
) -> Result<()> {
    let python_files = targets::python_files(files);
    if python_files.is_empty() {
        anyhow::bail!("No Python files among the given targets");
    }

    let invocation = ToolInvocation::new(config, python_files)?;
    announce(&invocation, verbosity);
    orchestrator.run(invocation).await?;
    Ok(())
}

/// Run over the owning packages of a file list.
async fn run_package(
    config: &Config,
    orchestrator: &WatchOrchestrator<TerminalSink>,
    files: &[PathBuf],
    verbosity: Verbosity,
) -> Result<()> {
    let packages = targets::owning_packages(files);
    if packages.is_empty() {
        anyhow::bail!("None of the given files belongs to a Python package");
    }

    let invocation = ToolInvocation::new(config, packages)?;
    announce(&invocation, verbosity);
    orchestrator.run(invocation).await?;
    Ok(())
}

fn announce(invocation: &ToolInvocation, verbosity: Verbosity) {
    if verbosity != Verbosity::Verbose {
        return;
    }
    eprintln!(
        "{} invocation {} runs `{}` over {} target(s)",
        "→".dimmed(),
        invocation.id,
        invocation.command.as_str().bold(),
        invocation.targets.len()
    );
}

/// Read save events from stdin and check each saved file.
async fn run_watch(config: &Config, orchestrator: WatchOrchestrator<TerminalSink>) -> Result<()> {
    let trigger = SaveTrigger::from_config(config);
    let (tx, rx) = mpsc::channel(16);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(event) = parse_save_event(&line) {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        }
    });

    trigger.watch(rx, &orchestrator, config).await;
    let _ = reader.await;
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    if let Ok(path) = Config::config_path() {
        println!("{} {}", "Config file:".bold(), path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Save-event line protocol from the host editor: one bare path per
/// save, or `copy:<path>` when the save went to another location.
fn parse_save_event(line: &str) -> Option<SaveEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line.strip_prefix("copy:") {
        Some(path) => SaveEvent {
            path: PathBuf::from(path.trim()),
            is_save_as_copy: true,
        },
        None => SaveEvent {
            path: PathBuf::from(line),
            is_save_as_copy: false,
        },
    })
}
