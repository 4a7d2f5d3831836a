//! Answer fields and the translation of localized free text into canonical states.

use thiserror::Error;

/// Inclusive integer range mapped onto one canonical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub min: u32,
    pub max: u32,
    pub state: &'static str,
}

impl Bucket {
    pub const fn new(min: u32, max: u32, state: &'static str) -> Self {
        Self { min, max, state }
    }

    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// One question of a sport questionnaire.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: &'static str,
    label: &'static str,
    prompt: &'static str,
    states: Vec<&'static str>,
    synonyms: Vec<(&'static str, &'static str)>,
    buckets: Vec<Bucket>,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str, prompt: &'static str) -> Self {
        Self {
            name,
            label,
            prompt,
            states: Vec::new(),
            synonyms: Vec::new(),
            buckets: Vec::new(),
        }
    }

    pub fn states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.states = states.into_iter().collect();
        self
    }

    /// Adds a localized spelling. Lookups fold both sides, so keys keep their display casing.
    pub fn synonym(mut self, raw: &'static str, canonical: &'static str) -> Self {
        self.synonyms.push((raw, canonical));
        self
    }

    pub fn bucket(mut self, min: u32, max: u32, state: &'static str) -> Self {
        self.buckets.push(Bucket::new(min, max, state));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Short noun phrase naming the category, used in generic explanations.
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn prompt(&self) -> &'static str {
        self.prompt
    }

    pub fn canonical_states(&self) -> &[&'static str] {
        &self.states
    }

    pub fn synonyms(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.synonyms.iter().copied()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn is_numeric(&self) -> bool {
        !self.buckets.is_empty()
    }

    /// Answers a user may type, in the order they are documented.
    pub fn valid_options(&self) -> Vec<String> {
        if self.is_numeric() {
            let min = self.buckets.iter().map(|b| b.min).min().unwrap_or(0);
            let max = self.buckets.iter().map(|b| b.max).max().unwrap_or(0);
            return (min..=max).map(|value| value.to_string()).collect();
        }
        let mut options: Vec<String> = Vec::new();
        for (raw, _) in &self.synonyms {
            if !options.iter().any(|seen| seen == raw) {
                options.push((*raw).to_string());
            }
        }
        options
    }

    /// Translates a raw answer into this field's canonical state.
    pub fn normalize(&self, raw: &str) -> Result<&'static str, NormalizeError> {
        let folded = fold_input(raw);
        if folded.is_empty() {
            return Err(NormalizeError::Empty { field: self.name });
        }

        let canonical = self
            .synonyms
            .iter()
            .find(|(key, _)| fold_input(key) == folded)
            .map(|(_, canonical)| *canonical)
            .or_else(|| self.states.iter().copied().find(|state| *state == folded))
            .or_else(|| self.bucket_for(&folded))
            .ok_or_else(|| NormalizeError::Unrecognized {
                field: self.name,
                value: folded.clone(),
            })?;

        if !self.states.contains(&canonical) {
            return Err(NormalizeError::OutOfDomain {
                field: self.name,
                token: canonical,
            });
        }
        Ok(canonical)
    }

    fn bucket_for(&self, folded: &str) -> Option<&'static str> {
        // Plain decimal digits only, no sign and no leading zero.
        let plain = !folded.is_empty()
            && folded.chars().all(|c| c.is_ascii_digit())
            && (folded == "0" || !folded.starts_with('0'));
        if !plain {
            return None;
        }
        let value = folded.parse::<u32>().ok()?;
        self.buckets
            .iter()
            .find(|bucket| bucket.contains(value))
            .map(|bucket| bucket.state)
    }
}

/// Trims surrounding whitespace and lower-cases the answer.
pub fn fold_input(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("empty answer for '{field}'")]
    Empty { field: &'static str },
    #[error("unrecognized answer '{value}' for '{field}'")]
    Unrecognized { field: &'static str, value: String },
    #[error("state '{token}' is not valid for '{field}'")]
    OutOfDomain {
        field: &'static str,
        token: &'static str,
    },
}

impl NormalizeError {
    pub fn field(&self) -> &'static str {
        match self {
            NormalizeError::Empty { field }
            | NormalizeError::Unrecognized { field, .. }
            | NormalizeError::OutOfDomain { field, .. } => field,
        }
    }
}
