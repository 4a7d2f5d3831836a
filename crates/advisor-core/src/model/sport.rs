use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Soccer,
    Basketball,
}

impl Sport {
    pub const ALL: [Sport; 2] = [Sport::Soccer, Sport::Basketball];

    pub const fn as_str(self) -> &'static str {
        match self {
            Sport::Soccer => "soccer",
            Sport::Basketball => "basketball",
        }
    }

    /// Spanish display name used by the chat front ends.
    pub const fn localized(self) -> &'static str {
        match self {
            Sport::Soccer => "fútbol",
            Sport::Basketball => "baloncesto",
        }
    }

    /// Matches free chat text such as "quiero apostar al fútbol".
    pub fn detect(text: &str) -> Option<Self> {
        let lowered = text.trim().to_lowercase();
        if lowered.contains("fútbol") || lowered.contains("futbol") || lowered.contains("soccer")
        {
            return Some(Sport::Soccer);
        }
        if lowered.contains("baloncesto") || lowered.contains("basket") {
            return Some(Sport::Basketball);
        }
        None
    }
}

impl FromStr for Sport {
    type Err = ParseSportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "soccer" | "fútbol" | "futbol" | "football" => Ok(Sport::Soccer),
            "basketball" | "baloncesto" | "basket" => Ok(Sport::Basketball),
            _ => Err(ParseSportError {
                requested: value.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sport '{requested}' is not supported")]
pub struct ParseSportError {
    pub requested: String,
}
