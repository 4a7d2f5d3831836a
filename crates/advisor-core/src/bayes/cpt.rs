use super::network::NetworkError;
use super::product::{CartesianProduct, column_index};

/// Allowed deviation of a CPT column sum from one.
pub const SUM_TOLERANCE: f64 = 1e-4;

/// Conditional probability table for one variable.
///
/// Values are stored one row per own state; each row holds one entry per
/// parent-state combination in [`CartesianProduct`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cpt {
    cardinality: usize,
    parent_cardinalities: Vec<usize>,
    values: Vec<f64>,
}

impl Cpt {
    /// Plain prior for a root variable.
    pub fn prior(values: &[f64]) -> Self {
        Self {
            cardinality: values.len(),
            parent_cardinalities: Vec::new(),
            values: values.to_vec(),
        }
    }

    /// Table with one row per own state, each row spanning every parent combination.
    pub fn conditional(rows: &[Vec<f64>], parent_cardinalities: &[usize]) -> Self {
        Self {
            cardinality: rows.len(),
            parent_cardinalities: parent_cardinalities.to_vec(),
            values: rows.iter().flatten().copied().collect(),
        }
    }

    /// Builds a table by evaluating `column` for every parent-state combination.
    pub fn from_columns<F>(cardinality: usize, parent_cardinalities: &[usize], mut column: F) -> Self
    where
        F: FnMut(&[usize]) -> Vec<f64>,
    {
        let columns = CartesianProduct::len(parent_cardinalities);
        let mut values = vec![0.0; cardinality * columns];
        for (index, states) in CartesianProduct::new(parent_cardinalities).enumerate() {
            let probabilities = column(&states);
            for (state, probability) in probabilities.into_iter().enumerate().take(cardinality) {
                values[state * columns + index] = probability;
            }
        }
        Self {
            cardinality,
            parent_cardinalities: parent_cardinalities.to_vec(),
            values,
        }
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn parent_cardinalities(&self) -> &[usize] {
        &self.parent_cardinalities
    }

    pub fn column_count(&self) -> usize {
        CartesianProduct::len(&self.parent_cardinalities)
    }

    pub fn is_prior(&self) -> bool {
        self.parent_cardinalities.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// P(state | parent_states).
    pub fn probability(&self, state: usize, parent_states: &[usize]) -> f64 {
        let column = column_index(&self.parent_cardinalities, parent_states);
        self.values[state * self.column_count() + column]
    }

    /// Distribution over own states for one parent-state combination.
    pub fn column(&self, parent_states: &[usize]) -> Vec<f64> {
        (0..self.cardinality)
            .map(|state| self.probability(state, parent_states))
            .collect()
    }

    pub(crate) fn validate(
        &self,
        variable: &'static str,
        expected_cardinality: usize,
        expected_parents: &[usize],
    ) -> Result<(), NetworkError> {
        if self.cardinality != expected_cardinality
            || self.parent_cardinalities != expected_parents
        {
            return Err(NetworkError::ShapeMismatch {
                variable,
                expected: shape(expected_cardinality, expected_parents),
                found: shape(self.cardinality, &self.parent_cardinalities),
            });
        }

        let columns = self.column_count();
        if self.values.len() != self.cardinality * columns {
            return Err(NetworkError::ShapeMismatch {
                variable,
                expected: shape(expected_cardinality, expected_parents),
                found: vec![self.values.len()],
            });
        }

        if let Some(&value) = self
            .values
            .iter()
            .find(|value| !value.is_finite() || **value < 0.0 || **value > 1.0)
        {
            return Err(NetworkError::ProbabilityRange { variable, value });
        }

        for column in 0..columns {
            let sum: f64 = (0..self.cardinality)
                .map(|state| self.values[state * columns + column])
                .sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                return Err(NetworkError::ColumnSum {
                    variable,
                    column,
                    sum,
                });
            }
        }
        Ok(())
    }
}

fn shape(cardinality: usize, parents: &[usize]) -> Vec<usize> {
    let mut dims = Vec::with_capacity(parents.len() + 1);
    dims.push(cardinality);
    dims.extend_from_slice(parents);
    dims
}
