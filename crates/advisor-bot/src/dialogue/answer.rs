use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One `{"field": "raw answer"}` entry of a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Answer {
    pub field: String,
    pub value: String,
}

impl Answer {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl TryFrom<BTreeMap<String, String>> for Answer {
    type Error = HistoryError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(HistoryError::KeyCount { found: map.len() });
        }
        let mut entries = map.into_iter();
        match entries.next() {
            Some((field, value)) => Ok(Self { field, value }),
            None => Err(HistoryError::KeyCount { found: 0 }),
        }
    }
}

impl From<Answer> for BTreeMap<String, String> {
    fn from(answer: Answer) -> Self {
        BTreeMap::from([(answer.field, answer.value)])
    }
}

/// Parses a JSON array of single-key objects.
pub fn parse_history(json: &str) -> Result<Vec<Answer>, HistoryError> {
    serde_json::from_str(json).map_err(|err| HistoryError::Malformed(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history entry must hold exactly one field, found {found}")]
    KeyCount { found: usize },
    #[error("malformed history: {0}")]
    Malformed(String),
}
