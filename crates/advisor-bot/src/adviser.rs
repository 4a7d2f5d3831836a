use crate::dialogue::{Answer, DialogueError, DialogueMachine, Turn};
use crate::telemetry::{DecisionRecord, TelemetrySink};
use advisor_core::bayes::STATE_SAFE;
use advisor_core::model::{ParseSportError, Sport};
use advisor_core::profile::{ProfileError, SportProfile};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{Level, event};

/// Shown to the user whenever a request cannot be served.
pub const FALLBACK_MESSAGE: &str = "No hay recomendaciones disponibles en este momento.";

/// Wire shape returned to chat front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub message: String,
    pub is_final: bool,
    pub next_fact: Option<String>,
}

impl AdviceResponse {
    /// Ends the conversation: there is nothing left to ask.
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            is_final: true,
            next_fact: None,
        }
    }
}

impl From<&Turn> for AdviceResponse {
    fn from(turn: &Turn) -> Self {
        Self {
            message: turn.message().to_string(),
            is_final: turn.is_final(),
            next_fact: turn.next_fact().map(str::to_string),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error(transparent)]
    UnsupportedSport(#[from] ParseSportError),
    #[error("{sport} adviser could not be constructed")]
    Construction {
        sport: Sport,
        #[source]
        source: ProfileError,
    },
    #[error("{sport} adviser failed to process the history")]
    Processing {
        sport: Sport,
        #[source]
        source: DialogueError,
    },
}

/// Dialogue + network for one sport. Holds no per-conversation state.
#[derive(Debug, Clone)]
pub struct Adviser {
    profile: SportProfile,
}

impl Adviser {
    pub fn new(sport: Sport) -> Result<Self, ProfileError> {
        Ok(Self::from_profile(SportProfile::build(sport)?))
    }

    pub fn from_profile(profile: SportProfile) -> Self {
        Self { profile }
    }

    pub fn sport(&self) -> Sport {
        self.profile.sport()
    }

    pub fn profile(&self) -> &SportProfile {
        &self.profile
    }

    pub fn turn(&self, history: &[Answer]) -> Result<Turn, AdviceError> {
        DialogueMachine::new(&self.profile)
            .advance(history)
            .map_err(|source| AdviceError::Processing {
                sport: self.sport(),
                source,
            })
    }

    pub fn advise(&self, history: &[Answer]) -> Result<AdviceResponse, AdviceError> {
        self.turn(history).map(|turn| AdviceResponse::from(&turn))
    }
}

/// How the registry builds its advisers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryMode {
    /// Every sport at start-up; construction errors surface immediately.
    #[default]
    Eager,
    /// Each sport on first use, at most once.
    Lazy,
}

impl RegistryMode {
    pub fn from_env() -> Self {
        static CACHED: OnceLock<RegistryMode> = OnceLock::new();
        *CACHED.get_or_init(|| Self::from_reader(|key| std::env::var(key).ok()))
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        match read("ADVISOR_EAGER_REGISTRY") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" | "lazy" => RegistryMode::Lazy,
                _ => RegistryMode::Eager,
            },
            None => RegistryMode::default(),
        }
    }
}

/// One adviser per sport, shared by reference across requests.
#[derive(Debug)]
pub struct AdviserRegistry {
    mode: RegistryMode,
    soccer: OnceCell<Result<Adviser, ProfileError>>,
    basketball: OnceCell<Result<Adviser, ProfileError>>,
    telemetry: TelemetrySink,
}

impl AdviserRegistry {
    pub fn eager() -> Result<Self, AdviceError> {
        Self::with_telemetry(RegistryMode::Eager, TelemetrySink::from_env())
    }

    pub fn lazy() -> Self {
        Self::empty(RegistryMode::Lazy, TelemetrySink::from_env())
    }

    pub fn from_env() -> Result<Self, AdviceError> {
        Self::with_telemetry(RegistryMode::from_env(), TelemetrySink::from_env())
    }

    pub fn with_telemetry(mode: RegistryMode, telemetry: TelemetrySink) -> Result<Self, AdviceError> {
        let registry = Self::empty(mode, telemetry);
        if mode == RegistryMode::Eager {
            for sport in Sport::ALL {
                registry.adviser(sport)?;
            }
        }
        Ok(registry)
    }

    fn empty(mode: RegistryMode, telemetry: TelemetrySink) -> Self {
        Self {
            mode,
            soccer: OnceCell::new(),
            basketball: OnceCell::new(),
            telemetry,
        }
    }

    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    pub fn telemetry(&self) -> &TelemetrySink {
        &self.telemetry
    }

    /// Whether the adviser for `sport` has been built yet.
    pub fn is_built(&self, sport: Sport) -> bool {
        self.slot(sport).get().is_some()
    }

    pub fn adviser(&self, sport: Sport) -> Result<&Adviser, AdviceError> {
        match self.slot(sport).get_or_init(|| Adviser::new(sport)) {
            Ok(adviser) => Ok(adviser),
            Err(source) => Err(AdviceError::Construction {
                sport,
                source: source.clone(),
            }),
        }
    }

    /// Runs one dialogue step for `sport` and records the outcome.
    pub fn turn(&self, sport: Sport, history: &[Answer]) -> Result<Turn, AdviceError> {
        let outcome = self.adviser(sport).and_then(|adviser| adviser.turn(history));
        self.record(sport, history.len(), &outcome);
        outcome
    }

    /// Parses `sport` and answers with the wire shape.
    pub fn advise(&self, sport: &str, history: &[Answer]) -> Result<AdviceResponse, AdviceError> {
        let sport: Sport = sport.parse()?;
        self.turn(sport, history)
            .map(|turn| AdviceResponse::from(&turn))
    }

    /// Like [`AdviserRegistry::advise`], but answers failures with the fallback message.
    pub fn respond(&self, sport: &str, history: &[Answer]) -> AdviceResponse {
        match self.advise(sport, history) {
            Ok(response) => response,
            Err(err) => {
                event!(
                    target: "sport_advisor::turn",
                    Level::ERROR,
                    sport,
                    history_len = history.len(),
                    error = %err,
                );
                AdviceResponse::fallback()
            }
        }
    }

    fn slot(&self, sport: Sport) -> &OnceCell<Result<Adviser, ProfileError>> {
        match sport {
            Sport::Soccer => &self.soccer,
            Sport::Basketball => &self.basketball,
        }
    }

    fn record(&self, sport: Sport, history_len: usize, outcome: &Result<Turn, AdviceError>) {
        let record = match outcome {
            Ok(turn) => {
                let mut record = DecisionRecord::new(sport.as_str(), history_len, turn.kind());
                record.next_fact = turn.next_fact().map(str::to_string);
                if let Turn::Final { posterior, .. } = turn {
                    record.p_safe = posterior.probability_of(STATE_SAFE);
                }
                record
            }
            Err(err) => {
                let mut record = DecisionRecord::new(sport.as_str(), history_len, "error");
                record.error = Some(err.to_string());
                record
            }
        };
        self.telemetry.push(record);
    }
}
