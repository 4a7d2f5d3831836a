use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use advisor_bot::{
    AdviceError, AdviserRegistry, Answer, RegistryMode, TelemetrySink, TelemetrySummary, Turn,
    localized_label,
};
use advisor_core::bayes::STATE_SAFE;
use advisor_core::model::Sport;
use advisor_core::profile::Direction;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{Expectation, ResolvedOutputs, Scenario, ScenarioConfig, ValidationError};

/// Replays each scripted scenario one answer at a time through the adviser.
pub struct ScenarioRunner {
    config: ScenarioConfig,
    outputs: ResolvedOutputs,
    registry: AdviserRegistry,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub scenarios_run: usize,
    pub rows_written: usize,
    pub finals: usize,
    pub failures: Vec<ExpectationFailure>,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub decisions_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectationFailure {
    pub scenario: String,
    pub check: &'static str,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Serialize)]
struct TranscriptRow<'a> {
    run_id: &'a str,
    scenario: &'a str,
    sport: &'static str,
    step: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<&'a Answer>,
    outcome: &'static str,
    message: &'a str,
    is_final: bool,
    next_fact: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p_safe: Option<f64>,
}

/// Last turn of a scenario, reduced to what the summary table shows.
struct ScenarioOutcome {
    name: String,
    sport: Sport,
    turns: usize,
    outcome: &'static str,
    label: Option<&'static str>,
    p_safe: Option<f64>,
    next_fact: Option<&'static str>,
    failures: usize,
}

impl ScenarioRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: ScenarioConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let total_turns: usize = config.scenarios.iter().map(|s| s.answers.len() + 1).sum();
        let registry = AdviserRegistry::with_telemetry(
            RegistryMode::from_env(),
            TelemetrySink::new(total_turns),
        )?;
        Ok(Self {
            config,
            outputs,
            registry,
        })
    }

    pub fn registry(&self) -> &AdviserRegistry {
        &self.registry
    }

    /// Execute every scenario, streaming one JSONL row per turn.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rows_written = 0usize;
        let mut outcomes = Vec::with_capacity(self.config.scenarios.len());
        let mut failures = Vec::new();

        for scenario in &self.config.scenarios {
            let (rows, outcome, mut scenario_failures) = self.run_scenario(scenario, &mut writer)?;
            rows_written += rows;
            outcomes.push(outcome);
            failures.append(&mut scenario_failures);
        }
        writer.flush()?;

        let decisions_path = match self.outputs.decisions.as_ref() {
            Some(path) => {
                ensure_parent(path.parent())?;
                self.registry.telemetry().write_jsonl(path)?;
                Some(path.clone())
            }
            None => None,
        };

        let telemetry = self.registry.telemetry().summarize();
        write_markdown(
            &self.outputs.summary_md,
            &self.config.run_id,
            &outcomes,
            &failures,
            &telemetry,
        )?;

        Ok(RunSummary {
            scenarios_run: outcomes.len(),
            rows_written,
            finals: outcomes.iter().filter(|o| o.outcome == "final").count(),
            failures,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            decisions_path,
        })
    }

    /// Runs the dialogue on the first `step` answers and appends its transcript row.
    fn write_step(
        &self,
        scenario: &Scenario,
        sport: Sport,
        step: usize,
        writer: &mut BufWriter<File>,
    ) -> Result<Turn, RunnerError> {
        let history = &scenario.answers[..step];
        let turn = self.registry.turn(sport, history)?;
        let row = TranscriptRow {
            run_id: &self.config.run_id,
            scenario: &scenario.name,
            sport: sport.as_str(),
            step,
            answer: history.last(),
            outcome: turn.kind(),
            message: turn.message(),
            is_final: turn.is_final(),
            next_fact: turn.next_fact(),
            p_safe: final_p_safe(&turn),
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        Ok(turn)
    }

    fn run_scenario(
        &self,
        scenario: &Scenario,
        writer: &mut BufWriter<File>,
    ) -> Result<(usize, ScenarioOutcome, Vec<ExpectationFailure>), RunnerError> {
        let sport = scenario.sport()?;
        let mut turn = self.write_step(scenario, sport, 0, writer)?;
        for step in 1..=scenario.answers.len() {
            turn = self.write_step(scenario, sport, step, writer)?;
        }
        let rows = scenario.answers.len() + 1;

        let label = final_label(&turn);
        let p_safe = final_p_safe(&turn);
        let failures = scenario
            .expect
            .as_ref()
            .map(|expect| check_expectation(&scenario.name, expect, &turn, label, p_safe))
            .unwrap_or_default();

        if !failures.is_empty() && tracing::enabled!(Level::WARN) {
            event!(
                target: "sport_advisor::runner",
                Level::WARN,
                scenario = %scenario.name,
                failures = failures.len(),
            );
        }

        let outcome = ScenarioOutcome {
            name: scenario.name.clone(),
            sport,
            turns: rows,
            outcome: turn.kind(),
            label,
            p_safe,
            next_fact: turn.next_fact(),
            failures: failures.len(),
        };
        Ok((rows, outcome, failures))
    }
}

fn final_p_safe(turn: &Turn) -> Option<f64> {
    match turn {
        Turn::Final { posterior, .. } => posterior.probability_of(STATE_SAFE),
        _ => None,
    }
}

fn final_label(turn: &Turn) -> Option<&'static str> {
    match turn {
        Turn::Final { posterior, .. } => posterior
            .most_likely()
            .and_then(|(state, _)| Direction::from_label(state))
            .map(localized_label),
        _ => None,
    }
}

fn check_expectation(
    scenario: &str,
    expect: &Expectation,
    turn: &Turn,
    label: Option<&'static str>,
    p_safe: Option<f64>,
) -> Vec<ExpectationFailure> {
    let mut failures = Vec::new();
    let mut fail = |check: &'static str, expected: String, actual: String| {
        failures.push(ExpectationFailure {
            scenario: scenario.to_string(),
            check,
            expected,
            actual,
        });
    };

    if let Some(is_final) = expect.is_final {
        if turn.is_final() != is_final {
            fail("is_final", is_final.to_string(), turn.is_final().to_string());
        }
    }
    if let Some(expected) = expect.label.as_deref() {
        if label != Some(expected) {
            fail("label", expected.to_string(), label.unwrap_or("-").to_string());
        }
    }
    if let Some(expected) = expect.next_fact.as_deref() {
        if turn.next_fact() != Some(expected) {
            fail(
                "next_fact",
                expected.to_string(),
                turn.next_fact().unwrap_or("-").to_string(),
            );
        }
    }
    let shown = p_safe.map_or_else(|| "-".to_string(), |p| format!("{p:.4}"));
    if let Some(min) = expect.min_p_safe {
        if p_safe.is_none_or(|p| p < min) {
            fail("min_p_safe", format!(">= {min:.4}"), shown.clone());
        }
    }
    if let Some(max) = expect.max_p_safe {
        if p_safe.is_none_or(|p| p > max) {
            fail("max_p_safe", format!("<= {max:.4}"), shown);
        }
    }
    failures
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_markdown(
    path: &Path,
    run_id: &str,
    outcomes: &[ScenarioOutcome],
    failures: &[ExpectationFailure],
    telemetry: &TelemetrySummary,
) -> Result<(), RunnerError> {
    let mut rows = String::new();
    rows.push_str("# Scenario Summary\n\n");
    rows.push_str(&format!("Run: `{run_id}`\n\n"));
    rows.push_str("| Scenario | Sport | Turns | Outcome | Label | P(safe) | Next fact | Checks |\n");
    rows.push_str("|----------|-------|-------|---------|-------|---------|-----------|--------|\n");

    for outcome in outcomes {
        rows.push_str(&format!(
            "| {name} | {sport} | {turns} | {kind} | {label} | {p_safe} | {next} | {checks} |\n",
            name = outcome.name,
            sport = outcome.sport,
            turns = outcome.turns,
            kind = outcome.outcome,
            label = outcome.label.unwrap_or("-"),
            p_safe = outcome
                .p_safe
                .map_or_else(|| "-".to_string(), |p| format!("{:.2}%", p * 100.0)),
            next = outcome.next_fact.unwrap_or("-"),
            checks = if outcome.failures == 0 {
                "pass".to_string()
            } else {
                format!("{} failed", outcome.failures)
            },
        ));
    }

    if !failures.is_empty() {
        rows.push_str("\n## Expectation Failures\n");
        for failure in failures {
            rows.push_str(&format!(
                "- {}: {} expected {}, got {}\n",
                failure.scenario, failure.check, failure.expected, failure.actual
            ));
        }
    }

    rows.push_str("\n## Decision Telemetry\n");
    rows.push_str(&format!("- Decisions recorded: {}\n", telemetry.record_count));
    rows.push_str(&format!(
        "- Questions / rejections / finals / errors: {} / {} / {} / {}\n",
        telemetry.questions, telemetry.rejections, telemetry.finals, telemetry.errors
    ));
    if let Some(mean) = telemetry.mean_p_safe {
        rows.push_str(&format!("- Mean P(safe) over finals: {:.4}\n", mean));
    }

    fs::write(path, rows)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize transcript row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("adviser error: {0}")]
    Advice(#[from] AdviceError),
    #[error("invalid scenario: {0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::bayes::PosteriorResult;

    fn final_turn(safe: f64) -> Turn {
        Turn::Final {
            result: String::new(),
            posterior: PosteriorResult {
                variable_name: "risk".to_string(),
                state_labels: vec!["safe".to_string(), "risky".to_string()],
                probabilities: vec![safe, 1.0 - safe],
            },
        }
    }

    #[test]
    fn expectations_report_each_mismatch() {
        let turn = final_turn(0.4);
        let expect = Expectation {
            is_final: Some(true),
            label: Some("segura".to_string()),
            next_fact: None,
            min_p_safe: Some(0.8),
            max_p_safe: None,
        };
        let failures =
            check_expectation("s", &expect, &turn, final_label(&turn), final_p_safe(&turn));
        let checks: Vec<_> = failures.iter().map(|f| f.check).collect();
        assert_eq!(checks, vec!["label", "min_p_safe"]);
        assert_eq!(failures[0].actual, "arriesgada");
    }

    #[test]
    fn question_turn_has_no_label_or_probability() {
        let turn = Turn::Question {
            prompt: "?",
            next_fact: "injuries",
        };
        assert_eq!(final_label(&turn), None);
        let expect = Expectation {
            max_p_safe: Some(0.5),
            ..Expectation::default()
        };
        let failures = check_expectation("s", &expect, &turn, None, None);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].actual, "-");
    }
}
