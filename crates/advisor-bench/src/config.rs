use advisor_bot::Answer;
use advisor_core::model::Sport;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Scripted dialogue run loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub run_id: String,
    pub scenarios: Vec<Scenario>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScenarioConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ScenarioConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_scenarios(&self.scenarios)?;
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            decisions: self
                .outputs
                .decisions
                .as_deref()
                .map(|template| resolve_template(&self.run_id, template)),
        }
    }
}

/// One scripted conversation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub sport: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

impl Scenario {
    /// Sport after validation; aliases such as "fútbol" are accepted.
    pub fn sport(&self) -> Result<Sport, ValidationError> {
        self.sport
            .parse()
            .map_err(|err: advisor_core::model::ParseSportError| ValidationError::InvalidField {
                field: format!("scenarios[{}].sport", self.name),
                message: err.to_string(),
            })
    }
}

/// Checks applied to the last turn of a scenario.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Expectation {
    #[serde(default)]
    pub is_final: Option<bool>,
    /// Localized label: "segura" or "arriesgada".
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub next_fact: Option<String>,
    #[serde(default)]
    pub min_p_safe: Option<f64>,
    #[serde(default)]
    pub max_p_safe: Option<f64>,
}

impl Expectation {
    fn validate(&self, scenario: &str) -> Result<(), ValidationError> {
        for (label, value) in [("min_p_safe", self.min_p_safe), ("max_p_safe", self.max_p_safe)] {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ValidationError::InvalidField {
                        field: format!("scenarios[{scenario}].expect.{label}"),
                        message: "probability must lie in [0, 1]".to_string(),
                    });
                }
            }
        }
        if let Some(label) = self.label.as_deref() {
            if !matches!(label, "segura" | "arriesgada") {
                return Err(ValidationError::InvalidField {
                    field: format!("scenarios[{scenario}].expect.label"),
                    message: format!("unknown label '{label}'; use 'segura' or 'arriesgada'"),
                });
            }
        }
        Ok(())
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    /// Decision telemetry export; skipped when absent.
    #[serde(default)]
    pub decisions: Option<String>,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        let mut entries = vec![
            ("outputs.jsonl", self.jsonl.as_str()),
            ("outputs.summary_md", self.summary_md.as_str()),
        ];
        if let Some(decisions) = self.decisions.as_deref() {
            entries.push(("outputs.decisions", decisions));
        }
        for (label, value) in entries {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_scenarios(scenarios: &[Scenario]) -> Result<(), ValidationError> {
    if scenarios.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "scenarios".to_string(),
            message: "at least one scenario must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for scenario in scenarios {
        if scenario.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "scenarios.name".to_string(),
                message: "scenario name must not be empty".to_string(),
            });
        }

        if !scenario.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("scenarios[{}].name", scenario.name),
                message: "scenario name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(scenario.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "scenarios".to_string(),
                message: format!("scenario name '{}' defined more than once", scenario.name),
            });
        }

        scenario.sport()?;
        if let Some(expect) = scenario.expect.as_ref() {
            expect.validate(&scenario.name)?;
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub decisions: Option<PathBuf>,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "smoke"
scenarios:
  - name: "soccer_first_question"
    sport: "soccer"
  - name: "basketball_partial"
    sport: "baloncesto"
    answers:
      - team_form: "bueno"
      - rest_days: "3"
    expect:
      next_fact: "player_injuries"
outputs:
  jsonl: "out/{run_id}/transcript.jsonl"
  summary_md: "out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: ScenarioConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.scenarios.len(), 2);
        assert_eq!(cfg.scenarios[1].answers[1], Answer::new("rest_days", "3"));
        assert_eq!(cfg.scenarios[1].sport().unwrap(), Sport::Basketball);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let outputs = cfg.resolved_outputs();
        assert_eq!(outputs.jsonl, PathBuf::from("out/smoke/transcript.jsonl"));
        assert_eq!(outputs.decisions, None);
    }

    #[test]
    fn rejects_unknown_sport() {
        let yaml = BASIC_YAML.replace("sport: \"soccer\"", "sport: \"tennis\"");
        let mut cfg: ScenarioConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "scenarios[soccer_first_question].sport"
        ));
    }

    #[test]
    fn rejects_duplicate_scenarios() {
        let yaml = BASIC_YAML.replace("basketball_partial", "soccer_first_question");
        let mut cfg: ScenarioConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("duplicate scenarios should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "scenarios"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("\"smoke\"", "\"smoke test\"");
        let mut cfg: ScenarioConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn rejects_out_of_range_expectation() {
        let yaml = BASIC_YAML.replace(
            "next_fact: \"player_injuries\"",
            "min_p_safe: 1.5",
        );
        let mut cfg: ScenarioConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multi_key_answer_fails_to_parse() {
        let yaml = BASIC_YAML.replace(
            "- team_form: \"bueno\"",
            "- team_form: \"bueno\"\n        rest_days: \"1\"",
        );
        assert!(serde_yaml::from_str::<ScenarioConfig>(&yaml).is_err());
    }

    #[test]
    fn decisions_output_resolves_template() {
        let yaml = BASIC_YAML.replace(
            "summary_md: \"out/{run_id}/summary.md\"",
            "summary_md: \"out/{run_id}/summary.md\"\n  decisions: \"out/{run_id}/{run_id}.decisions.jsonl\"",
        );
        let mut cfg: ScenarioConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(
            cfg.resolved_outputs().decisions,
            Some(PathBuf::from("out/smoke/smoke.decisions.jsonl"))
        );
    }
}
