//! Deterministic rendering of a risk posterior into the user-facing recommendation.

use advisor_core::bayes::{PosteriorResult, STATE_RISKY, STATE_SAFE};
use advisor_core::model::{Evidence, fold_input};
use advisor_core::profile::{Direction, SportProfile};
use std::fmt;

/// Everything needed to render the final answer of a dialogue.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub direction: Direction,
    pub probability_safe: f64,
    /// Itemized reasons; `None` for profiles that explain with a generic sentence.
    pub factors: Option<Vec<&'static str>>,
    pub categories: Vec<&'static str>,
}

impl Explanation {
    pub fn new(profile: &SportProfile, evidence: &Evidence, posterior: &PosteriorResult) -> Self {
        let probability_safe = posterior.probability_of(STATE_SAFE).unwrap_or(0.0);
        let probability_risky = posterior.probability_of(STATE_RISKY).unwrap_or(0.0);
        // Ties go to the first state, which is "safe".
        let direction = if probability_safe >= probability_risky {
            Direction::Safe
        } else {
            Direction::Risky
        };

        let factors = profile
            .rationale()
            .map(|rationale| rationale.supporting(evidence, direction));
        let categories = evidence
            .known()
            .filter_map(|(field, _)| profile.field(field).map(|spec| spec.label()))
            .collect();

        Self {
            direction,
            probability_safe,
            factors,
            categories,
        }
    }

    pub fn localized_label(&self) -> &'static str {
        localized_label(self.direction)
    }

    /// P(safe) as a percentage with two decimals, whichever label won.
    pub fn percentage(&self) -> String {
        format!("{:.2}", self.probability_safe * 100.0)
    }

    fn headline(&self) -> String {
        format!(
            "Se considera una apuesta **{}**, con una probabilidad de éxito del {}%",
            self.localized_label(),
            self.percentage()
        )
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.factors {
            Some(factors) if !factors.is_empty() => {
                write!(f, "{}\nEsto se debe a:", self.headline())?;
                for factor in factors {
                    write!(f, "\n- {factor}")?;
                }
                Ok(())
            }
            _ => write!(
                f,
                "{}.\nEsto se debe a una combinación de factores: {}.",
                self.headline(),
                spanish_list(&self.categories)
            ),
        }
    }
}

pub fn localized_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Safe => "segura",
        Direction::Risky => "arriesgada",
    }
}

/// Joins items as "a, b y c", switching the conjunction to "e" before an /i/ sound.
pub fn spanish_list(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [single] => (*single).to_string(),
        [init @ .., last] => {
            let conjunction = if starts_with_i_sound(last) { "e" } else { "y" };
            format!("{} {conjunction} {last}", init.join(", "))
        }
    }
}

fn starts_with_i_sound(word: &str) -> bool {
    let folded = fold_input(word);
    let rest = folded.strip_prefix('h').unwrap_or(&folded);
    let mut chars = rest.chars();
    match chars.next() {
        // "hie-" and "hia-" open with a consonant sound.
        Some('i' | 'í') => !(folded.starts_with('h') && matches!(chars.next(), Some('e' | 'a'))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::model::Sport;

    fn posterior(safe: f64) -> PosteriorResult {
        PosteriorResult {
            variable_name: "risk".to_string(),
            state_labels: vec![STATE_SAFE.to_string(), STATE_RISKY.to_string()],
            probabilities: vec![safe, 1.0 - safe],
        }
    }

    #[test]
    fn conjunction_follows_spelling() {
        assert_eq!(spanish_list(&["clima", "racha"]), "clima y racha");
        assert_eq!(
            spanish_list(&["condición física", "historial directo"]),
            "condición física e historial directo"
        );
        assert_eq!(spanish_list(&["a", "importancia"]), "a e importancia");
        assert_eq!(spanish_list(&["a", "hielo"]), "a y hielo");
        assert_eq!(spanish_list(&["solo"]), "solo");
    }

    #[test]
    fn generic_sentence_names_every_category() {
        let profile = SportProfile::build(Sport::Soccer).unwrap();
        let mut evidence = profile.evidence();
        evidence.set("home_advantage", "home").unwrap();
        evidence.set("head_to_head", "balanced").unwrap();
        let text = Explanation::new(&profile, &evidence, &posterior(0.8123)).to_string();
        assert_eq!(
            text,
            "Se considera una apuesta **segura**, con una probabilidad de éxito del 81.23%.\n\
             Esto se debe a una combinación de factores: localía e historial directo."
        );
    }

    #[test]
    fn risky_label_still_reports_safe_probability() {
        let profile = SportProfile::build(Sport::Basketball).unwrap();
        let mut evidence = profile.evidence();
        evidence.set("team_form", "poor").unwrap();
        evidence.set("home_advantage", "no").unwrap();
        evidence.set("rest_days", "2-3").unwrap();
        let explanation = Explanation::new(&profile, &evidence, &posterior(0.3));
        assert_eq!(explanation.direction, Direction::Risky);
        assert_eq!(
            explanation.to_string(),
            "Se considera una apuesta **arriesgada**, con una probabilidad de éxito del 30.00%\n\
             Esto se debe a:\n\
             - el equipo ha tenido un mal rendimiento reciente\n\
             - juega como visitante"
        );
    }

    #[test]
    fn exact_tie_goes_to_safe() {
        let profile = SportProfile::build(Sport::Soccer).unwrap();
        let explanation = Explanation::new(&profile, &profile.evidence(), &posterior(0.5));
        assert_eq!(explanation.localized_label(), "segura");
        assert_eq!(explanation.percentage(), "50.00");
    }

    #[test]
    fn itemized_profile_without_matching_factors_uses_generic_sentence() {
        let profile = SportProfile::build(Sport::Basketball).unwrap();
        let mut evidence = profile.evidence();
        evidence.set("team_form", "average").unwrap();
        let text = Explanation::new(&profile, &evidence, &posterior(0.6)).to_string();
        assert!(text.ends_with("factores: forma del equipo."));
    }
}
