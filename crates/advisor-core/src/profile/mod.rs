//! Per-sport bundles of questionnaire, Bayesian network and rationale text.

mod basketball;
mod soccer;

use crate::bayes::{
    BayesianNetwork, InferenceError, NetworkError, PosteriorResult, RISK_VARIABLE, STATE_RISKY,
    STATE_SAFE,
};
use crate::model::{Evidence, FieldSpec, Sport};
use thiserror::Error;

/// Which outcome an observed state pushes the recommendation towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Safe,
    Risky,
}

impl Direction {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            STATE_SAFE => Some(Direction::Safe),
            STATE_RISKY => Some(Direction::Risky),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::Safe => STATE_SAFE,
            Direction::Risky => STATE_RISKY,
        }
    }
}

/// A sentence justifying the recommendation when `field` was observed as `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    pub field: &'static str,
    pub state: &'static str,
    pub direction: Direction,
    pub text: &'static str,
}

impl Factor {
    pub const fn new(
        field: &'static str,
        state: &'static str,
        direction: Direction,
        text: &'static str,
    ) -> Self {
        Self {
            field,
            state,
            direction,
            text,
        }
    }
}

/// Itemized reasoning table for profiles that explain factor by factor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rationale {
    factors: Vec<Factor>,
}

impl Rationale {
    pub fn new(factors: Vec<Factor>) -> Self {
        Self { factors }
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Texts of observed factors agreeing with `direction`, in questionnaire order.
    pub fn supporting(&self, evidence: &Evidence, direction: Direction) -> Vec<&'static str> {
        let mut texts = Vec::new();
        for (field, state) in evidence.known() {
            texts.extend(
                self.factors
                    .iter()
                    .filter(|factor| {
                        factor.direction == direction
                            && factor.field == field
                            && factor.state == state
                    })
                    .map(|factor| factor.text),
            );
        }
        texts
    }
}

/// Immutable questionnaire + network for one sport.
#[derive(Debug, Clone)]
pub struct SportProfile {
    sport: Sport,
    fields: Vec<FieldSpec>,
    network: BayesianNetwork,
    rationale: Option<Rationale>,
}

impl SportProfile {
    /// Builds and validates the profile; this compiles the terminal CPT once.
    pub fn build(sport: Sport) -> Result<Self, ProfileError> {
        let profile = match sport {
            Sport::Soccer => soccer::profile()?,
            Sport::Basketball => basketball::profile()?,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub(crate) fn assemble(
        sport: Sport,
        fields: Vec<FieldSpec>,
        network: BayesianNetwork,
        rationale: Option<Rationale>,
    ) -> Self {
        Self {
            sport,
            fields,
            network,
            rationale,
        }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn first_field(&self) -> Option<&FieldSpec> {
        self.fields.first()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(FieldSpec::name)
    }

    pub fn network(&self) -> &BayesianNetwork {
        &self.network
    }

    pub fn rationale(&self) -> Option<&Rationale> {
        self.rationale.as_ref()
    }

    /// Empty evidence keyed by this profile's fields.
    pub fn evidence(&self) -> Evidence {
        Evidence::for_fields(self.field_names())
    }

    /// Posterior of the terminal risk variable.
    pub fn assess(&self, evidence: &Evidence) -> Result<PosteriorResult, InferenceError> {
        self.network.query(RISK_VARIABLE, &evidence.to_pairs())
    }

    fn validate(&self) -> Result<(), ProfileError> {
        for field in &self.fields {
            let variable =
                self.network
                    .variable(field.name())
                    .ok_or(ProfileError::MissingVariable {
                        field: field.name(),
                    })?;
            if variable.states() != field.canonical_states() {
                return Err(ProfileError::StateMismatch {
                    field: field.name(),
                });
            }
            let mut produced: Vec<&'static str> = field.synonyms().map(|(_, state)| state).collect();
            produced.extend(field.buckets().iter().map(|bucket| bucket.state));
            if let Some(state) = produced
                .into_iter()
                .find(|state| !field.canonical_states().contains(state))
            {
                return Err(ProfileError::SynonymOutOfDomain {
                    field: field.name(),
                    state,
                });
            }
        }

        let parents = self.network.parent_names(RISK_VARIABLE);
        let expected: Vec<&'static str> = self.field_names().collect();
        if parents != expected || !self.network.children_of(RISK_VARIABLE).is_empty() {
            return Err(ProfileError::TerminalShape {
                sport: self.sport,
            });
        }

        if let Some(rationale) = &self.rationale {
            for factor in rationale.factors() {
                let known = self
                    .field(factor.field)
                    .is_some_and(|field| field.canonical_states().contains(&factor.state));
                if !known {
                    return Err(ProfileError::UnknownFactor {
                        field: factor.field,
                        state: factor.state,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Construction failures; any of these aborts start-up for the sport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("field '{field}' has no matching network variable")]
    MissingVariable { field: &'static str },
    #[error("field '{field}' states disagree with its network variable")]
    StateMismatch { field: &'static str },
    #[error("field '{field}' maps an answer to unknown state '{state}'")]
    SynonymOutOfDomain {
        field: &'static str,
        state: &'static str,
    },
    #[error("risk variable for {sport} must depend on every field and have no children")]
    TerminalShape { sport: Sport },
    #[error("rationale references unknown state '{state}' of '{field}'")]
    UnknownFactor {
        field: &'static str,
        state: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sport_builds() {
        for sport in Sport::ALL {
            let profile = SportProfile::build(sport).expect("profile builds");
            assert_eq!(profile.sport(), sport);
            assert!(profile.network().variable(RISK_VARIABLE).is_some());
        }
    }

    #[test]
    fn field_order_matches_questionnaire() {
        let soccer = SportProfile::build(Sport::Soccer).unwrap();
        let names: Vec<_> = soccer.field_names().collect();
        assert_eq!(names.first(), Some(&"home_advantage"));
        assert_eq!(names.last(), Some(&"head_to_head"));
        assert_eq!(names.len(), 10);

        let basketball = SportProfile::build(Sport::Basketball).unwrap();
        assert_eq!(basketball.first_field().unwrap().name(), "team_form");
        assert_eq!(basketball.fields().len(), 8);
    }

    #[test]
    fn only_basketball_itemizes() {
        assert!(SportProfile::build(Sport::Soccer).unwrap().rationale().is_none());
        assert!(SportProfile::build(Sport::Basketball).unwrap().rationale().is_some());
    }

    #[test]
    fn supporting_factors_follow_direction() {
        let profile = SportProfile::build(Sport::Basketball).unwrap();
        let mut evidence = profile.evidence();
        evidence.set("team_form", "good").unwrap();
        evidence.set("home_advantage", "no").unwrap();
        let rationale = profile.rationale().unwrap();
        assert_eq!(
            rationale.supporting(&evidence, Direction::Safe),
            vec!["el equipo llega en buena forma"]
        );
        assert_eq!(
            rationale.supporting(&evidence, Direction::Risky),
            vec!["juega como visitante"]
        );
    }

    #[test]
    fn direction_round_trips_labels() {
        assert_eq!(Direction::from_label("safe"), Some(Direction::Safe));
        assert_eq!(Direction::Risky.label(), "risky");
        assert_eq!(Direction::from_label("maybe"), None);
    }
}
