use super::{ProfileError, SportProfile};
use crate::bayes::{AdditiveRiskModel, BayesianNetwork, RISK_VARIABLE, RiskTerm};
use crate::model::{FieldSpec, Sport};

const YES_NO: [&str; 2] = ["no", "yes"];
const HIGH_MEDIUM_LOW: [&str; 3] = ["high", "medium", "low"];

fn yes_no(name: &'static str, label: &'static str, prompt: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, prompt)
        .states(YES_NO)
        .synonym("no", "no")
        .synonym("sí", "yes")
        .synonym("si", "yes")
        .synonym("yes", "yes")
}

fn high_medium_low(name: &'static str, label: &'static str, prompt: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, prompt)
        .states(HIGH_MEDIUM_LOW)
        .synonym("alta", "high")
        .synonym("media", "medium")
        .synonym("baja", "low")
}

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(
            "home_advantage",
            "localía",
            "¿El equipo juega en casa? (sí, no)",
        )
        .states(["home", "away"])
        .synonym("sí", "home")
        .synonym("si", "home")
        .synonym("no", "away"),
        yes_no(
            "injuries",
            "lesiones",
            "¿Hay jugadores lesionados importantes? (sí, no)",
        ),
        FieldSpec::new(
            "performance",
            "rendimiento",
            "¿Cómo ha sido el rendimiento reciente del equipo? (bajo, medio, alto)",
        )
        .states(["low", "medium", "high"])
        .synonym("bajo", "low")
        .synonym("medio", "medium")
        .synonym("alto", "high")
        .synonym("baja", "low")
        .synonym("media", "medium")
        .synonym("alta", "high"),
        yes_no(
            "weather",
            "clima",
            "¿Hay condiciones climáticas adversas? (sí, no)",
        ),
        yes_no(
            "rivalry",
            "rivalidad",
            "¿Existe una rivalidad especial en este partido? (sí, no)",
        ),
        high_medium_low(
            "league_position",
            "posición en la tabla",
            "¿Cuál es la posición del equipo en la tabla? (alta, media, baja)",
        ),
        FieldSpec::new(
            "recent_streak",
            "racha",
            "¿Cuál es la racha de resultados recientes? (ganadora, neutral, perdedora)",
        )
        .states(["winning", "neutral", "losing"])
        .synonym("ganadora", "winning")
        .synonym("neutral", "neutral")
        .synonym("perdedora", "losing"),
        high_medium_low(
            "match_importance",
            "importancia del partido",
            "¿Qué importancia tiene el partido? (alta, media, baja)",
        ),
        FieldSpec::new(
            "physical_condition",
            "condición física",
            "¿Cuál es la condición física del equipo? (descansado, normal, fatigado)",
        )
        .states(["rested", "normal", "fatigued"])
        .synonym("descansado", "rested")
        .synonym("normal", "normal")
        .synonym("fatigado", "fatigued"),
        FieldSpec::new(
            "head_to_head",
            "historial directo",
            "¿Cómo es el historial de enfrentamientos directos? (ventaja local, equilibrado, ventaja visitante)",
        )
        .states(["home_advantage", "balanced", "away_advantage"])
        .synonym("ventaja local", "home_advantage")
        .synonym("equilibrado", "balanced")
        .synonym("ventaja visitante", "away_advantage"),
    ]
}

fn risk_model() -> AdditiveRiskModel {
    AdditiveRiskModel::new(0.05)
        .term(
            RiskTerm::new("home_advantage")
                .delta("home", -0.1)
                .delta("away", 0.15),
        )
        .term(RiskTerm::new("injuries").delta("no", -0.05).delta("yes", 0.25))
        .term(
            RiskTerm::new("performance")
                .delta("low", 0.25)
                .delta("high", -0.05),
        )
        .term(RiskTerm::new("weather").delta("no", -0.05).delta("yes", 0.2))
        .term(RiskTerm::new("rivalry").delta("no", -0.05).delta("yes", 0.1))
        .term(
            RiskTerm::new("league_position")
                .delta("high", -0.1)
                .delta("low", 0.05),
        )
        .term(
            RiskTerm::new("recent_streak")
                .delta("winning", -0.1)
                .delta("losing", 0.1),
        )
        .term(
            RiskTerm::new("match_importance")
                .delta("high", -0.05)
                .delta("low", 0.05),
        )
        .term(
            RiskTerm::new("physical_condition")
                .delta("rested", -0.1)
                .delta("fatigued", 0.1),
        )
        .term(
            RiskTerm::new("head_to_head")
                .delta("home_advantage", -0.05)
                .delta("away_advantage", 0.05),
        )
}

fn network() -> Result<BayesianNetwork, ProfileError> {
    // Importance "medium" has no observed frequency; it sits halfway between high and low.
    let importance_high = 0.4809;
    let importance_low = 0.4681;
    let importance_medium = ((importance_high + importance_low) / 2.0 * 10_000.0_f64).round() / 10_000.0;

    let network = BayesianNetwork::builder()
        .root_weighted("home_advantage", &["home", "away"], &[0.4987, 0.2635])
        .root("injuries", &YES_NO, &[0.65, 0.35])
        .root("performance", &["low", "medium", "high"], &[0.2, 0.5, 0.3])
        .root("weather", &YES_NO, &[0.85, 0.15])
        .root("rivalry", &YES_NO, &[0.6, 0.4])
        .root("league_position", &HIGH_MEDIUM_LOW, &[0.3, 0.4, 0.3])
        .root(
            "recent_streak",
            &["winning", "neutral", "losing"],
            &[0.25, 0.5, 0.25],
        )
        .root_weighted(
            "match_importance",
            &HIGH_MEDIUM_LOW,
            &[importance_high, importance_medium, importance_low],
        )
        .root_weighted(
            "physical_condition",
            &["rested", "normal", "fatigued"],
            &[0.4667, 0.4852, 0.3438],
        )
        .root_weighted(
            "head_to_head",
            &["home_advantage", "balanced", "away_advantage"],
            &[0.5029, 0.5974, 0.4441],
        )
        .generated_risk(RISK_VARIABLE, risk_model())
        .build()?;
    Ok(network)
}

pub(super) fn profile() -> Result<SportProfile, ProfileError> {
    Ok(SportProfile::assemble(
        Sport::Soccer,
        fields(),
        network()?,
        None,
    ))
}
