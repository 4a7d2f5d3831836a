use thiserror::Error;

/// Observed states keyed by the closed field set of one questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    slots: Vec<(&'static str, Option<&'static str>)>,
}

impl Evidence {
    pub fn for_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            slots: fields.into_iter().map(|name| (name, None)).collect(),
        }
    }

    /// Records a canonical state; later answers for the same field replace earlier ones.
    pub fn set(&mut self, field: &str, state: &'static str) -> Result<(), EvidenceError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|(name, _)| *name == field)
            .ok_or_else(|| EvidenceError::UnknownField {
                field: field.to_string(),
            })?;
        slot.1 = Some(state);
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.slots
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, state)| *state)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.slots.iter().any(|(name, _)| *name == field)
    }

    /// First field, in questionnaire order, still lacking an answer.
    pub fn first_missing(&self) -> Option<&'static str> {
        self.slots
            .iter()
            .find(|(_, state)| state.is_none())
            .map(|(name, _)| *name)
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn known_count(&self) -> usize {
        self.slots.iter().filter(|(_, state)| state.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.known_count() == 0
    }

    /// Known `(field, state)` pairs in questionnaire order.
    pub fn known(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.slots
            .iter()
            .filter_map(|(name, state)| state.map(|state| (*name, state)))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|(name, _)| *name)
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, &'static str)> {
        self.known().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
}
