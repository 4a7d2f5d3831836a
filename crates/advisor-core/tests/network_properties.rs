use advisor_core::bayes::{RISK_VARIABLE, STATE_SAFE, SUM_TOLERANCE};
use advisor_core::model::Sport;
use advisor_core::profile::SportProfile;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

fn profiles() -> Vec<SportProfile> {
    Sport::ALL
        .into_iter()
        .map(|sport| SportProfile::build(sport).expect("profile builds"))
        .collect()
}

fn p_safe(profile: &SportProfile, evidence: &[(&str, &str)]) -> f64 {
    profile
        .network()
        .query(RISK_VARIABLE, evidence)
        .expect("query succeeds")
        .probability_of(STATE_SAFE)
        .expect("safe state present")
}

#[test]
fn synonyms_and_buckets_stay_inside_canonical_states() {
    for profile in profiles() {
        for field in profile.fields() {
            for (raw, state) in field.synonyms() {
                assert!(
                    field.canonical_states().contains(&state),
                    "{}: '{raw}' maps outside the field",
                    field.name()
                );
                assert_eq!(field.normalize(raw), Ok(state));
            }
            for option in field.valid_options() {
                assert!(field.normalize(&option).is_ok(), "{option} rejected");
            }
        }
    }
}

#[test]
fn every_cpt_column_sums_to_one() {
    for profile in profiles() {
        let network = profile.network();
        for variable in network.variables() {
            let cpt = network.cpt(variable.name()).unwrap();
            for column in 0..cpt.column_count() {
                let sum: f64 = (0..cpt.cardinality())
                    .map(|row| cpt.values()[row * cpt.column_count() + column])
                    .sum();
                assert!(
                    (sum - 1.0).abs() <= SUM_TOLERANCE,
                    "{} column {column} sums to {sum}",
                    variable.name()
                );
            }
        }
    }
}

const SOCCER_DIRECTIONS: [(&str, &str, &str); 10] = [
    ("home_advantage", "home", "away"),
    ("injuries", "no", "yes"),
    ("performance", "high", "low"),
    ("weather", "no", "yes"),
    ("rivalry", "no", "yes"),
    ("league_position", "high", "low"),
    ("recent_streak", "winning", "losing"),
    ("match_importance", "high", "low"),
    ("physical_condition", "rested", "fatigued"),
    ("head_to_head", "home_advantage", "away_advantage"),
];

const BASKETBALL_DIRECTIONS: [(&str, &str, &str); 8] = [
    ("team_form", "good", "poor"),
    ("player_injuries", "none", "major"),
    ("home_advantage", "yes", "no"),
    ("betting_odds", "low", "high"),
    ("rest_days", "4+", "0-1"),
    ("opponent_strength", "weak", "strong"),
    ("recent_head_to_head", "win", "loss"),
    ("match_importance", "high", "low"),
];

fn directions(sport: Sport) -> &'static [(&'static str, &'static str, &'static str)] {
    match sport {
        Sport::Soccer => &SOCCER_DIRECTIONS,
        Sport::Basketball => &BASKETBALL_DIRECTIONS,
    }
}

#[test]
fn favourable_states_raise_safety() {
    for profile in profiles() {
        for &(field, good, bad) in directions(profile.sport()) {
            let favourable = p_safe(&profile, &[(field, good)]);
            let unfavourable = p_safe(&profile, &[(field, bad)]);
            assert!(favourable > unfavourable, "{} {field}", profile.sport());
        }
    }
}

#[test]
fn favourable_states_raise_safety_with_other_evidence_fixed() {
    let mut rng = StdRng::seed_from_u64(4417);
    for profile in profiles() {
        for &(field, good, bad) in directions(profile.sport()) {
            let others: Vec<_> = profile
                .fields()
                .iter()
                .filter(|other| other.name() != field)
                .collect();
            for _ in 0..5 {
                // Two observed neighbours leave enough free parents to stay off the clamp.
                let context: Vec<(&str, &str)> = others
                    .choose_multiple(&mut rng, 2)
                    .map(|other| {
                        let states = other.canonical_states();
                        (other.name(), states[rng.gen_range(0..states.len())])
                    })
                    .collect();

                let mut with_good = context.clone();
                with_good.push((field, good));
                let mut with_bad = context.clone();
                with_bad.push((field, bad));

                let favourable = p_safe(&profile, &with_good);
                let unfavourable = p_safe(&profile, &with_bad);
                assert!(
                    favourable > unfavourable,
                    "{} {field} given {context:?}: {favourable} <= {unfavourable}",
                    profile.sport()
                );
            }
        }
    }
}

#[test]
fn unconditional_prior_ignores_earlier_queries() {
    let mut rng = StdRng::seed_from_u64(20251016);
    for profile in profiles() {
        let baseline = profile.network().query(RISK_VARIABLE, &[]).unwrap();
        let sum: f64 = baseline.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);

        for _ in 0..6 {
            let mut pairs = Vec::new();
            for field in profile.fields() {
                if rng.gen_bool(0.4) {
                    let states = field.canonical_states();
                    pairs.push((field.name(), states[rng.gen_range(0..states.len())]));
                }
            }
            let _ = profile.network().query(RISK_VARIABLE, &pairs);
            let again = profile.network().query(RISK_VARIABLE, &[]).unwrap();
            assert_eq!(again, baseline);
        }
    }
}

#[test]
fn evidence_order_does_not_change_posterior() {
    let mut rng = StdRng::seed_from_u64(7);
    let basketball = SportProfile::build(Sport::Basketball).unwrap();
    let mut pairs: Vec<(&str, &str)> = basketball
        .fields()
        .iter()
        .take(5)
        .map(|field| {
            let states = field.canonical_states();
            (field.name(), states[rng.gen_range(0..states.len())])
        })
        .collect();
    let first = basketball.network().query(RISK_VARIABLE, &pairs).unwrap();
    pairs.shuffle(&mut rng);
    let shuffled = basketball.network().query(RISK_VARIABLE, &pairs).unwrap();
    assert_eq!(first, shuffled);
}

#[test]
fn full_evidence_selects_the_cpt_column() {
    let mut rng = StdRng::seed_from_u64(99);
    for profile in profiles() {
        let cpt = profile.network().cpt(RISK_VARIABLE).unwrap();
        for _ in 0..20 {
            let mut indices = Vec::new();
            let mut evidence = profile.evidence();
            for field in profile.fields() {
                let states = field.canonical_states();
                let index = rng.gen_range(0..states.len());
                indices.push(index);
                evidence.set(field.name(), states[index]).unwrap();
            }
            let posterior = profile.assess(&evidence).unwrap();
            let column = cpt.column(&indices);
            for (got, want) in posterior.probabilities.iter().zip(&column) {
                assert!((got - want).abs() < 1e-9, "{got} != {want}");
            }
        }
    }
}

#[test]
fn zero_prior_states_can_still_be_observed() {
    let basketball = SportProfile::build(Sport::Basketball).unwrap();
    let away = p_safe(&basketball, &[("home_advantage", "no")]);
    assert!(away > 0.0 && away < 1.0);
    let healthy = p_safe(&basketball, &[("player_injuries", "none")]);
    assert!(healthy > away);
}
