use super::{Direction, Factor, ProfileError, Rationale, SportProfile};
use crate::bayes::{AdditiveRiskModel, BayesianNetwork, RISK_VARIABLE, RiskTerm};
use crate::model::{FieldSpec, Sport};

const LOW_MEDIUM_HIGH: [&str; 3] = ["low", "medium", "high"];
const HIGH_MEDIUM_LOW: [&str; 3] = ["high", "medium", "low"];

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(
            "team_form",
            "forma del equipo",
            "¿Cómo ha sido el rendimiento reciente del equipo?\n(bueno: ha ganado la mayoría de los últimos partidos, regular: resultados mixtos, malo: ha perdido la mayoría)",
        )
        .states(["good", "average", "poor"])
        .synonym("bueno", "good")
        .synonym("regular", "average")
        .synonym("malo", "poor"),
        FieldSpec::new(
            "player_injuries",
            "lesiones",
            "¿Qué nivel de lesiones tiene el equipo?\n(ninguna: todos disponibles, menor: lesiones leves o suplentes, mayor: titulares clave ausentes)",
        )
        .states(["none", "minor", "major"])
        .synonym("ninguna", "none")
        .synonym("menor", "minor")
        .synonym("mayor", "major"),
        FieldSpec::new("home_advantage", "localía", "¿El equipo juega en casa?\n(sí, no)")
            .states(["yes", "no"])
            .synonym("sí", "yes")
            .synonym("si", "yes")
            .synonym("no", "no"),
        FieldSpec::new(
            "betting_odds",
            "cuotas",
            "¿Cómo son las cuotas para el equipo?\n(bajas: <1.5, medias: 1.5–2.5, altas: >2.5)",
        )
        .states(LOW_MEDIUM_HIGH)
        .synonym("bajas", "low")
        .synonym("medias", "medium")
        .synonym("altas", "high"),
        FieldSpec::new(
            "rest_days",
            "descanso",
            "¿Cuántos días de descanso ha tenido el equipo antes del partido?\n(0–7 días)",
        )
        .states(["0-1", "2-3", "4+"])
        .bucket(0, 1, "0-1")
        .bucket(2, 3, "2-3")
        .bucket(4, 7, "4+"),
        FieldSpec::new(
            "opponent_strength",
            "fuerza del rival",
            "¿Qué tan fuerte es el rival?\n(fuerte: buen rendimiento o ranking, promedio, débil: en mala racha)",
        )
        .states(["strong", "average", "weak"])
        .synonym("fuerte", "strong")
        .synonym("promedio", "average")
        .synonym("débil", "weak")
        .synonym("debil", "weak"),
        FieldSpec::new(
            "recent_head_to_head",
            "historial reciente",
            "¿Cuál fue el resultado más reciente entre estos equipos?\n(victoria, empate, derrota)",
        )
        .states(["win", "draw", "loss"])
        .synonym("victoria", "win")
        .synonym("empate", "draw")
        .synonym("derrota", "loss"),
        FieldSpec::new(
            "match_importance",
            "importancia del partido",
            "¿Qué importancia tiene este partido?\n(alta: decisivo, media: relevante, baja: amistoso o irrelevante)",
        )
        .states(HIGH_MEDIUM_LOW)
        .synonym("alta", "high")
        .synonym("media", "medium")
        .synonym("baja", "low"),
    ]
}

/// Authored as a safe score around 0.5; every delta is negated into risk terms.
fn risk_model() -> AdditiveRiskModel {
    let safe_terms: [(&'static str, &[(&'static str, f64)]); 8] = [
        ("team_form", &[("good", 0.1), ("poor", -0.1)]),
        ("player_injuries", &[("none", 0.05), ("major", -0.05)]),
        ("home_advantage", &[("yes", 0.05), ("no", -0.05)]),
        ("betting_odds", &[("low", 0.05), ("high", -0.05)]),
        ("rest_days", &[("4+", 0.05), ("0-1", -0.05)]),
        ("opponent_strength", &[("strong", -0.1), ("weak", 0.1)]),
        ("recent_head_to_head", &[("win", 0.05), ("loss", -0.05)]),
        ("match_importance", &[("high", 0.05), ("low", -0.05)]),
    ];

    safe_terms
        .iter()
        .fold(AdditiveRiskModel::new(0.5), |model, &(variable, deltas)| {
            let term = deltas
                .iter()
                .fold(RiskTerm::new(variable), |term, &(state, safe_delta)| {
                    term.delta(state, -safe_delta)
                });
            model.term(term)
        })
}

fn network() -> Result<BayesianNetwork, ProfileError> {
    let network = BayesianNetwork::builder()
        .root("team_form", &["good", "average", "poor"], &[0.412, 0.468, 0.12])
        .root(
            "player_injuries",
            &["none", "minor", "major"],
            &[0.0, 0.0526, 0.9474],
        )
        .root("home_advantage", &["yes", "no"], &[1.0, 0.0])
        .root("betting_odds", &LOW_MEDIUM_HIGH, &[0.4, 0.4, 0.2])
        .root("rest_days", &["0-1", "2-3", "4+"], &[0.028, 0.523, 0.449])
        // Observed frequencies sum to 0.9999.
        .root_weighted(
            "opponent_strength",
            &["strong", "average", "weak"],
            &[0.6744, 0.3206, 0.0049],
        )
        .root(
            "recent_head_to_head",
            &["win", "draw", "loss"],
            &[0.5871, 0.0009, 0.412],
        )
        .root("match_importance", &HIGH_MEDIUM_LOW, &[0.3, 0.4, 0.3])
        .generated_risk(RISK_VARIABLE, risk_model())
        .build()?;
    Ok(network)
}

fn rationale() -> Rationale {
    use Direction::{Risky, Safe};
    Rationale::new(vec![
        Factor::new("team_form", "good", Safe, "el equipo llega en buena forma"),
        Factor::new("player_injuries", "none", Safe, "no tiene jugadores lesionados"),
        Factor::new("player_injuries", "minor", Safe, "solo tiene lesiones menores"),
        Factor::new("home_advantage", "yes", Safe, "juega como local"),
        Factor::new(
            "betting_odds",
            "low",
            Safe,
            "las cuotas reflejan alta probabilidad de victoria",
        ),
        Factor::new("rest_days", "4+", Safe, "el equipo ha tenido buen descanso"),
        Factor::new("opponent_strength", "weak", Safe, "el rival está en mala forma"),
        Factor::new(
            "recent_head_to_head",
            "win",
            Safe,
            "ha ganado recientemente contra este rival",
        ),
        Factor::new("match_importance", "high", Safe, "el partido es decisivo"),
        Factor::new(
            "team_form",
            "poor",
            Risky,
            "el equipo ha tenido un mal rendimiento reciente",
        ),
        Factor::new(
            "player_injuries",
            "major",
            Risky,
            "tiene jugadores titulares lesionados",
        ),
        Factor::new("home_advantage", "no", Risky, "juega como visitante"),
        Factor::new(
            "betting_odds",
            "high",
            Risky,
            "las cuotas son altas, lo que sugiere baja probabilidad",
        ),
        Factor::new("rest_days", "0-1", Risky, "el equipo llega con poco descanso"),
        Factor::new("opponent_strength", "strong", Risky, "el rival es fuerte"),
        Factor::new(
            "recent_head_to_head",
            "loss",
            Risky,
            "ha perdido recientemente contra este rival",
        ),
        Factor::new(
            "match_importance",
            "low",
            Risky,
            "el partido no tiene mucha importancia",
        ),
    ])
}

pub(super) fn profile() -> Result<SportProfile, ProfileError> {
    Ok(SportProfile::assemble(
        Sport::Basketball,
        fields(),
        network()?,
        Some(rationale()),
    ))
}
