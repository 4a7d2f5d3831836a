use super::network::BayesianNetwork;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableSnapshot {
    pub name: String,
    pub states: Vec<String>,
    pub parents: Vec<String>,
    pub columns: usize,
    /// Full table for roots; generated tables are summarised by `columns` only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prior: Vec<f64>,
}

/// Serializable description of a compiled network, used by inspection tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSnapshot {
    pub variables: Vec<VariableSnapshot>,
}

impl NetworkSnapshot {
    pub fn capture(network: &BayesianNetwork) -> Self {
        let variables = network
            .topological_order()
            .iter()
            .map(|index| {
                let variable = &network.variables()[*index];
                let cpt = network.cpt_at(*index);
                VariableSnapshot {
                    name: variable.name().to_string(),
                    states: variable.states().iter().map(|s| (*s).to_string()).collect(),
                    parents: network
                        .parent_names(variable.name())
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    columns: cpt.column_count(),
                    prior: if cpt.is_prior() {
                        cpt.values().to_vec()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();
        Self { variables }
    }

    pub fn to_json(network: &BayesianNetwork) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::capture(network))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
