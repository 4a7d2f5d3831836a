use super::cpt::Cpt;
use super::heuristic::{AdditiveRiskModel, STATE_RISKY, STATE_SAFE};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Discrete node of the network.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
    name: &'static str,
    states: Vec<&'static str>,
    parents: Vec<usize>,
}

impl RandomVariable {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn states(&self) -> &[&'static str] {
        &self.states
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    /// Parent indices into [`BayesianNetwork::variables`].
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|candidate| *candidate == state)
    }
}

/// Validated DAG with one CPT per variable. Immutable after [`NetworkBuilder::build`].
#[derive(Debug, Clone)]
pub struct BayesianNetwork {
    variables: Vec<RandomVariable>,
    cpts: Vec<Cpt>,
    topological: Vec<usize>,
    index: HashMap<&'static str, usize>,
}

impl BayesianNetwork {
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    pub fn variables(&self) -> &[RandomVariable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&RandomVariable> {
        self.index_of(name).map(|index| &self.variables[index])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn cpt(&self, name: &str) -> Option<&Cpt> {
        self.index_of(name).map(|index| &self.cpts[index])
    }

    pub(crate) fn cpt_at(&self, index: usize) -> &Cpt {
        &self.cpts[index]
    }

    /// Variables ordered so every parent precedes its children.
    pub fn topological_order(&self) -> &[usize] {
        &self.topological
    }

    pub fn children_of(&self, name: &str) -> Vec<&'static str> {
        let Some(target) = self.index_of(name) else {
            return Vec::new();
        };
        self.variables
            .iter()
            .filter(|variable| variable.parents.contains(&target))
            .map(|variable| variable.name)
            .collect()
    }

    pub fn parent_names(&self, name: &str) -> Vec<&'static str> {
        self.variable(name)
            .map(|variable| {
                variable
                    .parents
                    .iter()
                    .map(|parent| self.variables[*parent].name)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[derive(Debug, Clone)]
enum PendingTable {
    Explicit(Cpt),
    Generated(AdditiveRiskModel),
}

#[derive(Debug, Clone)]
struct PendingVariable {
    name: &'static str,
    states: Vec<&'static str>,
    parents: Vec<&'static str>,
    table: PendingTable,
}

/// Collects declarations; all structural checks run in [`NetworkBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    pending: Vec<PendingVariable>,
}

impl NetworkBuilder {
    pub fn root(mut self, name: &'static str, states: &[&'static str], prior: &[f64]) -> Self {
        self.pending.push(PendingVariable {
            name,
            states: states.to_vec(),
            parents: Vec::new(),
            table: PendingTable::Explicit(Cpt::prior(prior)),
        });
        self
    }

    /// Root whose prior is given as unnormalized weights (e.g. observed frequencies).
    pub fn root_weighted(self, name: &'static str, states: &[&'static str], weights: &[f64]) -> Self {
        let total: f64 = weights.iter().sum();
        let prior: Vec<f64> = weights.iter().map(|weight| weight / total).collect();
        self.root(name, states, &prior)
    }

    pub fn node(
        mut self,
        name: &'static str,
        states: &[&'static str],
        parents: &[&'static str],
        cpt: Cpt,
    ) -> Self {
        self.pending.push(PendingVariable {
            name,
            states: states.to_vec(),
            parents: parents.to_vec(),
            table: PendingTable::Explicit(cpt),
        });
        self
    }

    /// Binary `[safe, risky]` node whose table is compiled from an additive model.
    pub fn generated_risk(mut self, name: &'static str, model: AdditiveRiskModel) -> Self {
        self.pending.push(PendingVariable {
            name,
            states: vec![STATE_SAFE, STATE_RISKY],
            parents: model.parents().collect(),
            table: PendingTable::Generated(model),
        });
        self
    }

    pub fn build(self) -> Result<BayesianNetwork, NetworkError> {
        let mut index = HashMap::with_capacity(self.pending.len());
        for (position, pending) in self.pending.iter().enumerate() {
            if pending.states.is_empty() {
                return Err(NetworkError::EmptyStates {
                    variable: pending.name,
                });
            }
            if index.insert(pending.name, position).is_some() {
                return Err(NetworkError::DuplicateVariable {
                    variable: pending.name,
                });
            }
        }

        let mut variables = Vec::with_capacity(self.pending.len());
        for pending in &self.pending {
            let mut parents = Vec::with_capacity(pending.parents.len());
            for parent in &pending.parents {
                let parent_index =
                    *index
                        .get(parent)
                        .ok_or_else(|| NetworkError::UnknownParent {
                            variable: pending.name,
                            parent: (*parent).to_string(),
                        })?;
                parents.push(parent_index);
            }
            variables.push(RandomVariable {
                name: pending.name,
                states: pending.states.clone(),
                parents,
            });
        }

        let topological = topological_order(&variables)?;

        let mut cpts = Vec::with_capacity(variables.len());
        for (pending, variable) in self.pending.into_iter().zip(&variables) {
            let parent_states: Vec<&[&'static str]> = variable
                .parents
                .iter()
                .map(|parent| variables[*parent].states.as_slice())
                .collect();
            let cpt = match pending.table {
                PendingTable::Explicit(cpt) => cpt,
                PendingTable::Generated(model) => {
                    for (term, states) in model.terms().iter().zip(&parent_states) {
                        if let Some((state, _)) = term
                            .deltas
                            .iter()
                            .find(|(state, _)| !states.contains(state))
                        {
                            return Err(NetworkError::UnknownState {
                                variable: term.variable,
                                state: (*state).to_string(),
                            });
                        }
                    }
                    model.compile(&parent_states)
                }
            };
            let parent_cards: Vec<usize> = parent_states.iter().map(|states| states.len()).collect();
            cpt.validate(variable.name, variable.cardinality(), &parent_cards)?;
            cpts.push(cpt);
        }

        Ok(BayesianNetwork {
            variables,
            cpts,
            topological,
            index,
        })
    }
}

/// Kahn's algorithm; any leftover node sits on a cycle.
fn topological_order(variables: &[RandomVariable]) -> Result<Vec<usize>, NetworkError> {
    let mut in_degree: Vec<usize> = variables.iter().map(|v| v.parents.len()).collect();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(index, _)| index)
        .collect();
    let mut order = Vec::with_capacity(variables.len());

    while let Some(current) = queue.pop_front() {
        order.push(current);
        for (child, variable) in variables.iter().enumerate() {
            let edges = variable.parents.iter().filter(|p| **p == current).count();
            if edges == 0 {
                continue;
            }
            in_degree[child] -= edges;
            if in_degree[child] == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() != variables.len() {
        let cyclic = variables
            .iter()
            .enumerate()
            .filter(|(index, _)| !order.contains(index))
            .map(|(_, variable)| variable.name)
            .collect();
        return Err(NetworkError::Cycle { variables: cyclic });
    }
    Ok(order)
}

/// Structural problems detected while building a network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("variable '{variable}' declared more than once")]
    DuplicateVariable { variable: &'static str },
    #[error("variable '{variable}' has no states")]
    EmptyStates { variable: &'static str },
    #[error("variable '{variable}' references unknown parent '{parent}'")]
    UnknownParent {
        variable: &'static str,
        parent: String,
    },
    #[error("variable '{variable}' has no state '{state}'")]
    UnknownState {
        variable: &'static str,
        state: String,
    },
    #[error("cycle detected among {variables:?}")]
    Cycle { variables: Vec<&'static str> },
    #[error("CPT for '{variable}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("CPT for '{variable}' contains invalid probability {value}")]
    ProbabilityRange { variable: &'static str, value: f64 },
    #[error("CPT column {column} of '{variable}' sums to {sum}")]
    ColumnSum {
        variable: &'static str,
        column: usize,
        sum: f64,
    },
}
