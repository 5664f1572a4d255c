//! External tests for the survey state machine — round progression, tallies,
//! pair permutation, and the scripted headless session.

use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use authenticity_survey::cli::PickStrategy;
use authenticity_survey::pairs::{
    setup_pairs, ComparisonPair, Method, Side, EXAMPLE_IMAGES, IMAGE_PAIRS,
};
use authenticity_survey::{run_headless, Phase, SurveySession};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Pairs with alternating side assignment: even rounds put the generative
/// image on the left.
fn alternating_pairs(n: usize) -> Vec<ComparisonPair> {
    (0..n)
        .map(|i| {
            let (left_method, right_method) = if i % 2 == 0 {
                (Method::GenerativeAi, Method::Simulated)
            } else {
                (Method::Simulated, Method::GenerativeAi)
            };
            ComparisonPair {
                left: PathBuf::from(format!("left_{i}.png")),
                right: PathBuf::from(format!("right_{i}.png")),
                left_method,
                right_method,
            }
        })
        .collect()
}

/// A data directory on disk with every fixed pair path present.
fn data_dir_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (generative, simulated) in IMAGE_PAIRS {
        for rel in [generative, simulated] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, b"placeholder").expect("write");
        }
    }
    for rel in EXAMPLE_IMAGES {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, b"placeholder").expect("write");
    }
    dir
}

// ---------------------------------------------------------------------------
// Round progression
// ---------------------------------------------------------------------------

#[test]
fn test_round_index_increases_by_one_per_choice() {
    let mut session = SurveySession::new(alternating_pairs(10)).expect("session");
    session.begin().expect("begin");
    let mut last = -1i64;
    while !session.is_complete() {
        let current = session.current_round();
        assert_eq!(current, last + 1);
        session.choose(Side::Right).expect("choose");
        last = current;
    }
    assert_eq!(session.current_round(), 10);
}

#[test]
fn test_round_never_exceeds_total() {
    let mut session = SurveySession::new(alternating_pairs(4)).expect("session");
    session.begin().expect("begin");
    for _ in 0..4 {
        session.choose(Side::Left).expect("choose");
    }
    assert!(session.choose(Side::Left).is_err());
    assert!(session.choose(Side::Right).is_err());
    assert_eq!(session.current_round(), 4);
    assert_eq!(session.results().len(), 4);
}

#[test]
fn test_phase_walks_intro_comparing_results() {
    let mut session = SurveySession::new(alternating_pairs(2)).expect("session");
    assert_eq!(session.phase(), Phase::Intro);
    session.begin().expect("begin");
    assert_eq!(session.phase(), Phase::Comparing);
    session.choose(Side::Left).expect("choose");
    assert_eq!(session.phase(), Phase::Comparing);
    session.choose(Side::Left).expect("choose");
    assert_eq!(session.phase(), Phase::Results);
}

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

#[test]
fn test_tally_sum_equals_rounds_completed() {
    let mut session = SurveySession::new(alternating_pairs(10)).expect("session");
    session.begin().expect("begin");
    for i in 0..10 {
        let side = if i % 4 == 0 { Side::Right } else { Side::Left };
        session.choose(side).expect("choose");
    }
    assert_eq!(
        session.tally(Method::Simulated) + session.tally(Method::GenerativeAi),
        10
    );
}

#[test]
fn test_always_left_scenario() {
    let mut session = SurveySession::new(alternating_pairs(10)).expect("session");
    session.begin().expect("begin");
    for _ in 0..10 {
        session.choose(Side::Left).expect("choose");
    }

    assert_eq!(session.results().len(), 10);
    assert!(session.results().iter().all(|r| r.side == Side::Left));

    let left_generative = session
        .comparisons()
        .iter()
        .filter(|p| p.left_method == Method::GenerativeAi)
        .count();
    let left_simulated = session.comparisons().len() - left_generative;
    assert_eq!(session.tally(Method::GenerativeAi), left_generative);
    assert_eq!(session.tally(Method::Simulated), left_simulated);
}

#[test]
fn test_tie_yields_equally_split_label() {
    let mut session = SurveySession::new(alternating_pairs(10)).expect("session");
    session.begin().expect("begin");
    for _ in 0..10 {
        session.choose(Side::Left).expect("choose");
    }
    assert_eq!(session.tally(Method::Simulated), 5);
    assert_eq!(session.tally(Method::GenerativeAi), 5);
    assert_eq!(session.preferred_method(), "Neither - you were equally split!");
}

// ---------------------------------------------------------------------------
// Pair setup
// ---------------------------------------------------------------------------

#[test]
fn test_setup_pairs_methods_are_a_permutation() {
    let dir = data_dir_fixture();
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = setup_pairs(dir.path(), &mut rng).expect("setup");
        for pair in &pairs {
            assert_ne!(pair.left_method, pair.right_method);
            assert_ne!(pair.left, pair.right);
        }
    }
}

#[test]
fn test_setup_pairs_consumes_one_pair_per_round() {
    let dir = data_dir_fixture();
    let mut rng = StdRng::seed_from_u64(11);
    let pairs = setup_pairs(dir.path(), &mut rng).expect("setup");
    let mut session = SurveySession::new(pairs).expect("session");
    session.begin().expect("begin");
    while !session.is_complete() {
        session.choose(Side::Right).expect("choose");
    }
    assert_eq!(session.results().len(), IMAGE_PAIRS.len());
}

// ---------------------------------------------------------------------------
// Headless session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_headless_always_left_completes_without_submitting() {
    let session = SurveySession::new(alternating_pairs(10)).expect("session");
    let mut rng = StdRng::seed_from_u64(0);
    let (summary, report) = run_headless(
        session,
        PickStrategy::Left,
        &mut rng,
        "http://localhost:1/formResponse",
        true,
    )
    .await
    .expect("headless run");

    assert!(report.is_none());
    assert_eq!(summary.total_rounds, 10);
    assert_eq!(summary.simulated_choices + summary.generative_choices, 10);
    assert!(summary.submitted);
}

#[tokio::test]
async fn test_headless_alternate_strategy_completes() {
    let session = SurveySession::new(alternating_pairs(6)).expect("session");
    let mut rng = StdRng::seed_from_u64(0);
    let (summary, _) = run_headless(
        session,
        PickStrategy::Alternate,
        &mut rng,
        "http://localhost:1/formResponse",
        true,
    )
    .await
    .expect("headless run");
    // Alternate over the alternating fixture always lands on the generative side.
    assert_eq!(summary.generative_choices, 6);
    assert_eq!(summary.preferred, "Stable Diffusion XL");
}

// ---------------------------------------------------------------------------
// Property: random choice sequences keep the invariants
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_random_choices_keep_invariants(picks in prop::collection::vec(any::<bool>(), 1..40)) {
        let n = picks.len();
        let mut session = SurveySession::new(alternating_pairs(n)).expect("session");
        session.begin().expect("begin");

        for (i, pick_left) in picks.iter().enumerate() {
            prop_assert_eq!(session.current_round(), i as i64);
            let side = if *pick_left { Side::Left } else { Side::Right };
            session.choose(side).expect("choose");
        }

        prop_assert!(session.is_complete());
        prop_assert_eq!(session.results().len(), n);
        prop_assert_eq!(
            session.tally(Method::Simulated) + session.tally(Method::GenerativeAi),
            n
        );
        // Log rounds are 1..=n in order.
        for (i, record) in session.results().iter().enumerate() {
            prop_assert_eq!(record.round, i + 1);
        }
    }
}
