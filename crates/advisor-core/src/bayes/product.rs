//! Mixed-radix enumeration over ordered cardinalities.
//!
//! The first axis varies slowest, matching the column layout of [`super::Cpt`].

/// Iterates every combination of states for the given cardinalities.
#[derive(Debug, Clone)]
pub struct CartesianProduct {
    cardinalities: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl CartesianProduct {
    pub fn new(cardinalities: &[usize]) -> Self {
        Self {
            cardinalities: cardinalities.to_vec(),
            current: vec![0; cardinalities.len()],
            done: cardinalities.contains(&0),
        }
    }

    /// Number of combinations; the empty product has exactly one.
    pub fn len(cardinalities: &[usize]) -> usize {
        cardinalities.iter().product()
    }
}

impl Iterator for CartesianProduct {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();

        let mut axis = self.cardinalities.len();
        loop {
            if axis == 0 {
                self.done = true;
                break;
            }
            axis -= 1;
            self.current[axis] += 1;
            if self.current[axis] < self.cardinalities[axis] {
                break;
            }
            self.current[axis] = 0;
        }

        Some(item)
    }
}

/// Position of a state tuple within the product ordering.
pub fn column_index(cardinalities: &[usize], states: &[usize]) -> usize {
    cardinalities
        .iter()
        .zip(states)
        .fold(0, |acc, (card, state)| acc * card + state)
}
