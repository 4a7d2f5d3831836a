use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use advisor_bench::chat::{ChatSessions, run_repl};
use advisor_bench::config::{ResolvedOutputs, ScenarioConfig};
use advisor_bench::logging::{init_console_logging, init_logging};
use advisor_bench::runner::ScenarioRunner;
use advisor_bot::{AdviserRegistry, parse_history};
use advisor_core::bayes::snapshot::NetworkSnapshot;
use advisor_core::model::Sport;
use advisor_core::profile::SportProfile;

/// Betting advice engine for soccer and basketball.
#[derive(Debug, Parser)]
#[command(
    name = "sport-advisor",
    author,
    version,
    about = "Bayesian betting advice driven by a question-and-answer dialogue"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay scripted scenarios from a YAML file and write transcripts.
    Run {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE", default_value = "scenarios/smoke.yaml")]
        config: PathBuf,

        /// Override the run identifier (substitutes {run_id} templates).
        #[arg(long, value_name = "RUN_ID")]
        run_id: Option<String>,

        /// Exit after validating the configuration (no scenario is run).
        #[arg(long)]
        validate_only: bool,
    },
    /// Interactive conversation on stdin/stdout.
    Chat {
        /// Session key, so several users can be simulated in turn.
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Answer a single request and print the response as JSON.
    Advise {
        /// "soccer" or "basketball" (Spanish aliases accepted).
        #[arg(short, long)]
        sport: String,

        /// JSON array of single-key objects, or a path to a file holding one.
        #[arg(long, value_name = "JSON|FILE", default_value = "[]")]
        history: String,
    },
    /// Print the compiled network for a sport as JSON.
    Inspect {
        #[arg(short, long)]
        sport: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            run_id,
            validate_only,
        } => run_scenarios(config, run_id, validate_only),
        Command::Chat { user } => {
            init_console_logging();
            let registry = AdviserRegistry::from_env()?;
            let sessions = ChatSessions::new();
            let stdin = io::stdin();
            run_repl(&sessions, &registry, &user, stdin.lock(), io::stdout().lock())?;
            Ok(())
        }
        Command::Advise { sport, history } => {
            init_console_logging();
            let sport: Sport = sport.parse()?;
            let raw = if history.trim_start().starts_with('[') {
                history
            } else {
                fs::read_to_string(&history)
                    .with_context(|| format!("reading history from {history}"))?
            };
            let history = parse_history(&raw).context("parsing history")?;
            let registry = AdviserRegistry::from_env()?;
            let response = registry.respond(sport.as_str(), &history);
            println!("{}", serde_json::to_string(&response)?);
            Ok(())
        }
        Command::Inspect { sport } => {
            let sport: Sport = sport.parse()?;
            let profile = SportProfile::build(sport)?;
            println!("{}", NetworkSnapshot::to_json(profile.network())?);
            Ok(())
        }
    }
}

fn run_scenarios(
    path: PathBuf,
    run_id: Option<String>,
    validate_only: bool,
) -> anyhow::Result<()> {
    let mut config = ScenarioConfig::from_path(&path)?;

    if let Some(run_id) = run_id {
        config.run_id = run_id;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let scenario_count = config.scenarios.len();
    let run_id = config.run_id.clone();

    println!(
        "Loaded configuration '{run_id}' with {scenario_count} scenario{}",
        if scenario_count == 1 { "" } else { "s" }
    );

    if validate_only {
        println!("Validation-only mode: scenarios skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = ScenarioRunner::new(config, outputs)?;
    let summary = runner.run()?;

    println!(
        "Run complete for '{run_id}': {} scenarios, {} finals → {} rows at {}",
        summary.scenarios_run,
        summary.finals,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(decisions) = summary.decisions_path.as_ref() {
        println!("Decision log: {}", decisions.display());
    }

    if !summary.failures.is_empty() {
        for failure in &summary.failures {
            eprintln!(
                "  {}: {} expected {}, got {}",
                failure.scenario, failure.check, failure.expected, failure.actual
            );
        }
        bail!("{} expectation(s) failed", summary.failures.len());
    }

    Ok(())
}
