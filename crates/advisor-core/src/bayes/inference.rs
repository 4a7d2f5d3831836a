//! Exact posterior queries by enumeration over unobserved variables.

use super::network::BayesianNetwork;
use super::product::CartesianProduct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marginal distribution of one variable after conditioning on evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorResult {
    pub variable_name: String,
    pub state_labels: Vec<String>,
    pub probabilities: Vec<f64>,
}

impl PosteriorResult {
    pub fn probability_of(&self, state: &str) -> Option<f64> {
        self.state_labels
            .iter()
            .position(|label| label == state)
            .map(|index| self.probabilities[index])
    }

    /// Most probable state; the earlier state wins exact ties.
    pub fn most_likely(&self) -> Option<(&str, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, probability) in self.probabilities.iter().copied().enumerate() {
            match best {
                Some((_, current)) if probability <= current => {}
                _ => best = Some((index, probability)),
            }
        }
        best.map(|(index, probability)| (self.state_labels[index].as_str(), probability))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("variable '{variable}' has no state '{state}'")]
    UnknownState { variable: String, state: String },
    #[error("target '{0}' is also observed")]
    TargetObserved(String),
    #[error("evidence has zero probability under the network")]
    ZeroProbability,
}

impl BayesianNetwork {
    /// Posterior of `target` given `(variable, state)` evidence pairs.
    ///
    /// Factors whose whole scope is observed are constant across target states
    /// and cancel in normalization, so they are skipped. This keeps queries
    /// defined when an observed root has a zero prior.
    pub fn query(
        &self,
        target: &str,
        evidence: &[(&str, &str)],
    ) -> Result<PosteriorResult, InferenceError> {
        let target_index = self
            .index_of(target)
            .ok_or_else(|| InferenceError::UnknownVariable(target.to_string()))?;

        let mut assignment: Vec<Option<usize>> = vec![None; self.len()];
        for (name, state) in evidence {
            let index = self
                .index_of(name)
                .ok_or_else(|| InferenceError::UnknownVariable((*name).to_string()))?;
            if index == target_index {
                return Err(InferenceError::TargetObserved(target.to_string()));
            }
            let state_index = self.variables()[index].state_index(state).ok_or_else(|| {
                InferenceError::UnknownState {
                    variable: (*name).to_string(),
                    state: (*state).to_string(),
                }
            })?;
            assignment[index] = Some(state_index);
        }

        let factors: Vec<usize> = self
            .topological_order()
            .iter()
            .copied()
            .filter(|index| {
                let variable = &self.variables()[*index];
                assignment[*index].is_none()
                    || *index == target_index
                    || variable.parents().iter().any(|p| assignment[*p].is_none())
            })
            .collect();

        let hidden: Vec<usize> = (0..self.len())
            .filter(|index| *index != target_index && assignment[*index].is_none())
            .collect();
        let hidden_cards: Vec<usize> = hidden
            .iter()
            .map(|index| self.variables()[*index].cardinality())
            .collect();

        let target_variable = &self.variables()[target_index];
        let mut unnormalized = vec![0.0; target_variable.cardinality()];
        let mut full: Vec<usize> = assignment.iter().map(|state| state.unwrap_or(0)).collect();
        let mut parent_states = Vec::new();

        for (target_state, mass) in unnormalized.iter_mut().enumerate() {
            full[target_index] = target_state;
            for combination in CartesianProduct::new(&hidden_cards) {
                for (variable, state) in hidden.iter().zip(&combination) {
                    full[*variable] = *state;
                }
                let mut product = 1.0;
                for factor in &factors {
                    let variable = &self.variables()[*factor];
                    parent_states.clear();
                    parent_states.extend(variable.parents().iter().map(|p| full[*p]));
                    product *= self.cpt_at(*factor).probability(full[*factor], &parent_states);
                    if product == 0.0 {
                        break;
                    }
                }
                *mass += product;
            }
        }

        let total: f64 = unnormalized.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(InferenceError::ZeroProbability);
        }

        Ok(PosteriorResult {
            variable_name: target_variable.name().to_string(),
            state_labels: target_variable
                .states()
                .iter()
                .map(|state| (*state).to_string())
                .collect(),
            probabilities: unnormalized.into_iter().map(|mass| mass / total).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayes::Cpt;

    fn rain_network() -> BayesianNetwork {
        BayesianNetwork::builder()
            .root("rain", &["no", "yes"], &[0.8, 0.2])
            .root("sprinkler", &["off", "on"], &[0.6, 0.4])
            .node(
                "grass",
                &["dry", "wet"],
                &["rain", "sprinkler"],
                Cpt::conditional(
                    &[vec![1.0, 0.1, 0.2, 0.01], vec![0.0, 0.9, 0.8, 0.99]],
                    &[2, 2],
                ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn prior_marginal_without_evidence() {
        let posterior = rain_network().query("grass", &[]).unwrap();
        // P(wet) = .8*.6*0 + .8*.4*.9 + .2*.6*.8 + .2*.4*.99
        let expected = 0.288 + 0.096 + 0.0792;
        assert!((posterior.probability_of("wet").unwrap() - expected).abs() < 1e-12);
        let sum: f64 = posterior.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn full_evidence_reads_cpt_column() {
        let posterior = rain_network()
            .query("grass", &[("rain", "yes"), ("sprinkler", "off")])
            .unwrap();
        assert!((posterior.probabilities[0] - 0.2).abs() < 1e-12);
        assert!((posterior.probabilities[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn diagnostic_query_conditions_on_child() {
        let posterior = rain_network().query("rain", &[("grass", "wet")]).unwrap();
        let wet = 0.288 + 0.096 + 0.0792;
        let expected = (0.096 + 0.0792) / wet;
        assert!((posterior.probability_of("yes").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_prior_root_still_conditions() {
        let network = BayesianNetwork::builder()
            .root("home", &["yes", "no"], &[1.0, 0.0])
            .node(
                "risk",
                &["safe", "risky"],
                &["home"],
                Cpt::conditional(&[vec![0.7, 0.4], vec![0.3, 0.6]], &[2]),
            )
            .build()
            .unwrap();
        let posterior = network.query("risk", &[("home", "no")]).unwrap();
        assert!((posterior.probability_of("risky").unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn impossible_evidence_is_an_error() {
        let network = BayesianNetwork::builder()
            .root("home", &["yes", "no"], &[1.0, 0.0])
            .node(
                "risk",
                &["safe", "risky"],
                &["home"],
                Cpt::conditional(&[vec![1.0, 1.0], vec![0.0, 0.0]], &[2]),
            )
            .build()
            .unwrap();
        assert_eq!(
            network.query("home", &[("risk", "risky")]),
            Err(InferenceError::ZeroProbability)
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        let network = rain_network();
        assert_eq!(
            network.query("hail", &[]),
            Err(InferenceError::UnknownVariable("hail".to_string()))
        );
        assert!(matches!(
            network.query("grass", &[("rain", "drizzle")]),
            Err(InferenceError::UnknownState { .. })
        ));
        assert_eq!(
            network.query("grass", &[("grass", "wet")]),
            Err(InferenceError::TargetObserved("grass".to_string()))
        );
    }

    #[test]
    fn most_likely_prefers_first_on_ties() {
        let posterior = PosteriorResult {
            variable_name: "risk".to_string(),
            state_labels: vec!["safe".to_string(), "risky".to_string()],
            probabilities: vec![0.5, 0.5],
        };
        assert_eq!(posterior.most_likely(), Some(("safe", 0.5)));
    }
}
