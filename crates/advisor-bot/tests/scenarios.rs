use advisor_bot::{AdviceResponse, AdviserRegistry, Answer, RegistryMode, TelemetrySink};

fn registry() -> AdviserRegistry {
    AdviserRegistry::with_telemetry(RegistryMode::Eager, TelemetrySink::new(64)).unwrap()
}

fn history(pairs: &[(&str, &str)]) -> Vec<Answer> {
    pairs
        .iter()
        .map(|(field, value)| Answer::new(*field, *value))
        .collect()
}

/// Percentage printed after "éxito del ", as a number.
fn reported_percentage(message: &str) -> f64 {
    let start = message.find("éxito del ").unwrap() + "éxito del ".len();
    let end = start + message[start..].find('%').unwrap();
    message[start..end].parse().unwrap()
}

const SOCCER_FAVOURABLE: [(&str, &str); 10] = [
    ("home_advantage", "sí"),
    ("injuries", "no"),
    ("performance", "alto"),
    ("weather", "no"),
    ("rivalry", "no"),
    ("league_position", "alta"),
    ("recent_streak", "ganadora"),
    ("match_importance", "alta"),
    ("physical_condition", "descansado"),
    ("head_to_head", "ventaja local"),
];

const BASKETBALL_UNFAVOURABLE: [(&str, &str); 8] = [
    ("team_form", "malo"),
    ("player_injuries", "mayor"),
    ("home_advantage", "no"),
    ("betting_odds", "altas"),
    ("rest_days", "0"),
    ("opponent_strength", "fuerte"),
    ("recent_head_to_head", "derrota"),
    ("match_importance", "baja"),
];

#[test]
fn soccer_all_favourable_is_safe() {
    let response = registry()
        .advise("soccer", &history(&SOCCER_FAVOURABLE))
        .unwrap();
    assert!(response.is_final);
    assert_eq!(response.next_fact, None);
    assert!(response.message.contains("**segura**"));
    assert!(reported_percentage(&response.message) >= 80.0);
    assert_eq!(
        response.message,
        "Se considera una apuesta **segura**, con una probabilidad de éxito del 99.00%.\n\
         Esto se debe a una combinación de factores: localía, lesiones, rendimiento, clima, \
         rivalidad, posición en la tabla, racha, importancia del partido, condición física e \
         historial directo."
    );
}

#[test]
fn basketball_all_unfavourable_is_risky() {
    let response = registry()
        .advise("basketball", &history(&BASKETBALL_UNFAVOURABLE))
        .unwrap();
    assert!(response.is_final);
    assert!(response.message.contains("**arriesgada**"));
    assert_eq!(reported_percentage(&response.message), 1.0);
    let bullets: Vec<&str> = response
        .message
        .lines()
        .filter_map(|line| line.strip_prefix("- "))
        .collect();
    assert_eq!(
        bullets,
        vec![
            "el equipo ha tenido un mal rendimiento reciente",
            "tiene jugadores titulares lesionados",
            "juega como visitante",
            "las cuotas son altas, lo que sugiere baja probabilidad",
            "el equipo llega con poco descanso",
            "el rival es fuerte",
            "ha perdido recientemente contra este rival",
            "el partido no tiene mucha importancia",
        ]
    );
}

#[test]
fn invalid_first_answer_is_rejected() {
    let response = registry()
        .advise("soccer", &history(&[("home_advantage", "tal vez")]))
        .unwrap();
    assert!(!response.is_final);
    assert_eq!(response.next_fact.as_deref(), Some("home_advantage"));
    assert_eq!(
        response.message,
        "Respuesta inválida para 'home_advantage'. Opciones válidas: sí, si, no."
    );
}

#[test]
fn accented_and_plain_spellings_give_identical_results() {
    let registry = registry();
    let mut plain = SOCCER_FAVOURABLE.to_vec();
    plain[0] = ("home_advantage", "si");
    let accented = registry.advise("soccer", &history(&SOCCER_FAVOURABLE)).unwrap();
    let unaccented = registry.advise("soccer", &history(&plain)).unwrap();
    assert_eq!(accented, unaccented);
}

#[test]
fn each_accepted_answer_asks_the_next_field() {
    let registry = registry();
    let mut answers = Vec::new();
    for (index, (field, value)) in BASKETBALL_UNFAVOURABLE.iter().enumerate() {
        let before = registry.advise("basketball", &answers).unwrap();
        assert_eq!(before.next_fact.as_deref(), Some(*field));
        answers.push(Answer::new(*field, *value));
        let after = registry.advise("basketball", &answers).unwrap();
        assert_eq!(after.is_final, index + 1 == BASKETBALL_UNFAVOURABLE.len());
    }
}

#[test]
fn rest_days_accept_integers_and_ranges() {
    let registry = registry();
    for raw in ["0", "1", "4", "7", "4+", "2-3"] {
        let response = registry
            .advise("basketball", &history(&[("team_form", "bueno"), ("player_injuries", "menor"), ("home_advantage", "sí"), ("betting_odds", "medias"), ("rest_days", raw)]))
            .unwrap();
        assert_eq!(response.next_fact.as_deref(), Some("opponent_strength"), "{raw}");
    }
    let response = registry
        .advise("basketball", &history(&[("rest_days", "8")]))
        .unwrap();
    assert_eq!(response.next_fact.as_deref(), Some("rest_days"));
}

#[test]
fn identical_histories_serialize_identically() {
    let first = registry()
        .advise("basketball", &history(&BASKETBALL_UNFAVOURABLE))
        .unwrap();
    let second = registry()
        .advise("basketball", &history(&BASKETBALL_UNFAVOURABLE))
        .unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn telemetry_tracks_each_request() {
    let registry = registry();
    registry.advise("soccer", &[]).unwrap();
    registry
        .advise("soccer", &history(&[("home_advantage", "tal vez")]))
        .unwrap();
    registry
        .advise("soccer", &history(&SOCCER_FAVOURABLE))
        .unwrap();
    let summary = registry.telemetry().summarize();
    assert_eq!(summary.questions, 1);
    assert_eq!(summary.rejections, 1);
    assert_eq!(summary.finals, 1);
    assert!((summary.mean_p_safe.unwrap() - 0.99).abs() < 1e-9);
}

#[test]
fn fallback_for_unknown_sport() {
    let response = registry().respond("cricket", &[]);
    assert_eq!(response, AdviceResponse::fallback());
    assert!(response.is_final);
    assert_eq!(response.next_fact, None);
}
