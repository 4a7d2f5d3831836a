//! Stateless questionnaire driver: every call replays the whole answer history.

mod answer;

pub use answer::{Answer, HistoryError, parse_history};

use crate::explain::Explanation;
use advisor_core::bayes::{InferenceError, PosteriorResult, STATE_SAFE};
use advisor_core::model::{Evidence, EvidenceError, FieldSpec};
use advisor_core::profile::SportProfile;
use thiserror::Error;
use tracing::{Level, event};

/// Outcome of one dialogue step.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    Question {
        prompt: &'static str,
        next_fact: &'static str,
    },
    /// The latest answer was not accepted; ask for the same field again.
    Rejection {
        message: String,
        next_fact: &'static str,
    },
    Final {
        result: String,
        posterior: PosteriorResult,
    },
}

impl Turn {
    pub fn message(&self) -> &str {
        match self {
            Turn::Question { prompt, .. } => *prompt,
            Turn::Rejection { message, .. } => message.as_str(),
            Turn::Final { result, .. } => result.as_str(),
        }
    }

    pub fn next_fact(&self) -> Option<&'static str> {
        match self {
            Turn::Question { next_fact, .. } | Turn::Rejection { next_fact, .. } => {
                Some(*next_fact)
            }
            Turn::Final { .. } => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Turn::Final { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Turn::Question { .. } => "question",
            Turn::Rejection { .. } => "rejection",
            Turn::Final { .. } => "final",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Ordered fact collection over one sport profile.
#[derive(Debug, Clone, Copy)]
pub struct DialogueMachine<'a> {
    profile: &'a SportProfile,
}

impl<'a> DialogueMachine<'a> {
    pub fn new(profile: &'a SportProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &'a SportProfile {
        self.profile
    }

    /// Validates the newest entry of `history` and decides what to ask next.
    pub fn advance(&self, history: &[Answer]) -> Result<Turn, DialogueError> {
        let turn = self.step(history)?;
        log_turn(self.profile, history.len(), &turn);
        Ok(turn)
    }

    /// Evidence gathered from every entry that normalizes; others are skipped.
    pub fn replay(&self, history: &[Answer]) -> Result<Evidence, DialogueError> {
        let mut evidence = self.profile.evidence();
        for answer in history {
            if let Some((field, state)) = self.accept(answer) {
                evidence.set(field, state)?;
            }
        }
        Ok(evidence)
    }

    fn step(&self, history: &[Answer]) -> Result<Turn, DialogueError> {
        let Some((latest, earlier)) = history.split_last() else {
            return self.conclude(&self.profile.evidence());
        };

        let mut evidence = self.replay(earlier)?;

        let Some(field) = self.profile.field(&latest.field) else {
            // Nothing left to ask: the stray entry is skipped like any other invalid one.
            let Some(missing) = self.first_missing(&evidence) else {
                return self.conclude(&evidence);
            };
            return Ok(Turn::Rejection {
                message: unknown_field_message(self.profile, &latest.field),
                next_fact: missing.name(),
            });
        };

        let state = match field.normalize(&latest.value) {
            Ok(state) => state,
            Err(_) => {
                return Ok(Turn::Rejection {
                    message: rejection_message(field),
                    next_fact: field.name(),
                });
            }
        };
        evidence.set(field.name(), state)?;
        self.conclude(&evidence)
    }

    /// Asks for the first gap, or runs inference once every field is known.
    fn conclude(&self, evidence: &Evidence) -> Result<Turn, DialogueError> {
        if let Some(field) = self.first_missing(evidence) {
            return Ok(Turn::Question {
                prompt: field.prompt(),
                next_fact: field.name(),
            });
        }

        let posterior = self.profile.assess(evidence)?;
        log_inference(self.profile, &posterior);
        let explanation = Explanation::new(self.profile, evidence, &posterior);
        Ok(Turn::Final {
            result: explanation.to_string(),
            posterior,
        })
    }

    fn accept(&self, answer: &Answer) -> Option<(&'static str, &'static str)> {
        let field = self.profile.field(&answer.field)?;
        let state = field.normalize(&answer.value).ok()?;
        Some((field.name(), state))
    }

    fn first_missing(&self, evidence: &Evidence) -> Option<&'a FieldSpec> {
        self.profile
            .fields()
            .iter()
            .find(|field| evidence.get(field.name()).is_none())
    }
}

/// "Respuesta inválida para 'injuries'. Opciones válidas: no, sí, si, yes."
pub fn rejection_message(field: &FieldSpec) -> String {
    format!(
        "Respuesta inválida para '{}'. Opciones válidas: {}.",
        field.name(),
        field.valid_options().join(", ")
    )
}

pub fn unknown_field_message(profile: &SportProfile, requested: &str) -> String {
    let fields: Vec<&str> = profile.field_names().collect();
    format!(
        "Dato desconocido '{requested}'. Campos válidos: {}.",
        fields.join(", ")
    )
}

fn log_turn(profile: &SportProfile, history_len: usize, turn: &Turn) {
    let sport = profile.sport().as_str();
    let next_fact = turn.next_fact().unwrap_or("");
    match turn {
        Turn::Rejection { message, .. } => {
            if !tracing::enabled!(Level::WARN) {
                return;
            }
            event!(
                target: "sport_advisor::turn",
                Level::WARN,
                sport,
                history_len,
                outcome = turn.kind(),
                next_fact,
                message = %message,
            );
        }
        _ => {
            if !tracing::enabled!(Level::INFO) {
                return;
            }
            event!(
                target: "sport_advisor::turn",
                Level::INFO,
                sport,
                history_len,
                outcome = turn.kind(),
                next_fact,
            );
        }
    }
}

fn log_inference(profile: &SportProfile, posterior: &PosteriorResult) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    event!(
        target: "sport_advisor::inference",
        Level::DEBUG,
        sport = profile.sport().as_str(),
        variable = %posterior.variable_name,
        states = ?posterior.state_labels,
        probabilities = ?posterior.probabilities,
        p_safe = posterior.probability_of(STATE_SAFE).unwrap_or(0.0),
    );
}
