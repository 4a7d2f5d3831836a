use super::cpt::Cpt;

pub const RISK_VARIABLE: &str = "risk";
pub const STATE_SAFE: &str = "safe";
pub const STATE_RISKY: &str = "risky";

const RISK_FLOOR: f64 = 0.01;
const RISK_CEILING: f64 = 0.99;

/// Directional contribution of one parent to the risk score.
///
/// States without an entry contribute nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskTerm {
    pub variable: &'static str,
    pub deltas: Vec<(&'static str, f64)>,
}

impl RiskTerm {
    pub fn new(variable: &'static str) -> Self {
        Self {
            variable,
            deltas: Vec::new(),
        }
    }

    pub fn delta(mut self, state: &'static str, delta: f64) -> Self {
        self.deltas.push((state, delta));
        self
    }

    pub fn delta_for(&self, state: &str) -> f64 {
        self.deltas
            .iter()
            .find(|(name, _)| *name == state)
            .map(|(_, delta)| *delta)
            .unwrap_or(0.0)
    }
}

/// Additive scoring rule compiled into the terminal `risk` CPT.
///
/// For a parent-state combination the risk is `baseline + Σ deltas`, clamped
/// into `[0.01, 0.99]`; `safe = 1 - risk`. Both cells are rounded to three
/// decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveRiskModel {
    baseline: f64,
    terms: Vec<RiskTerm>,
}

impl AdditiveRiskModel {
    pub fn new(baseline: f64) -> Self {
        Self {
            baseline,
            terms: Vec::new(),
        }
    }

    pub fn term(mut self, term: RiskTerm) -> Self {
        self.terms.push(term);
        self
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn terms(&self) -> &[RiskTerm] {
        &self.terms
    }

    /// Parent variables in column order.
    pub fn parents(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.terms.iter().map(|term| term.variable)
    }

    /// Clamped risk for named parent states, before rounding.
    pub fn score<'a, I>(&self, states: I) -> f64
    where
        I: IntoIterator<Item = &'a str>,
    {
        let raw = self
            .terms
            .iter()
            .zip(states)
            .fold(self.baseline, |acc, (term, state)| acc + term.delta_for(state));
        raw.clamp(RISK_FLOOR, RISK_CEILING)
    }

    /// Generates the `[safe, risky]` table over every combination of parent states.
    pub(crate) fn compile(&self, parent_states: &[&[&'static str]]) -> Cpt {
        let cardinalities: Vec<usize> = parent_states.iter().map(|states| states.len()).collect();
        Cpt::from_columns(2, &cardinalities, |combination| {
            let named = combination
                .iter()
                .zip(parent_states)
                .map(|(index, states)| states[*index]);
            let risk = self.score(named);
            vec![round3(1.0 - risk), round3(risk)]
        })
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
