//! External tests for the submission guard — at most one attempt per
//! session, no attempt before completion, failures never retried.
//!
//! The unroutable localhost URL makes every POST fail fast with a transport
//! error, which is exactly the non-fatal path the guard has to cover.

use std::path::PathBuf;

use reqwest::Client;

use authenticity_survey::pairs::{ComparisonPair, Method, Side};
use authenticity_survey::submit::submit_once;
use authenticity_survey::SurveySession;

const UNROUTABLE_FORM_URL: &str = "http://127.0.0.1:1/formResponse";

fn completed_session(n: usize) -> SurveySession {
    let pairs: Vec<ComparisonPair> = (0..n)
        .map(|i| ComparisonPair {
            left: PathBuf::from(format!("l{i}.png")),
            right: PathBuf::from(format!("r{i}.png")),
            left_method: Method::Simulated,
            right_method: Method::GenerativeAi,
        })
        .collect();
    let mut session = SurveySession::new(pairs).expect("session");
    session.begin().expect("begin");
    for _ in 0..n {
        session.choose(Side::Left).expect("choose");
    }
    session
}

#[tokio::test]
async fn test_no_attempt_before_completion() {
    let pairs = vec![ComparisonPair {
        left: PathBuf::from("l.png"),
        right: PathBuf::from("r.png"),
        left_method: Method::Simulated,
        right_method: Method::GenerativeAi,
    }];
    let mut session = SurveySession::new(pairs).expect("session");
    let client = Client::new();

    let report = submit_once(&mut session, &client, UNROUTABLE_FORM_URL).await;
    assert!(report.is_none());
    assert!(!session.submitted());
}

#[tokio::test]
async fn test_failed_attempt_still_marks_submitted() {
    let mut session = completed_session(2);
    let client = Client::new();

    let report = submit_once(&mut session, &client, UNROUTABLE_FORM_URL)
        .await
        .expect("first attempt happens");
    assert!(!report.ok);
    assert!(report.message.contains("screenshot"));
    assert!(session.submitted());
}

#[tokio::test]
async fn test_at_most_one_attempt_even_when_rerendered() {
    let mut session = completed_session(2);
    let client = Client::new();

    let first = submit_once(&mut session, &client, UNROUTABLE_FORM_URL).await;
    assert!(first.is_some());

    // Re-entering the results screen must not retry, even after a failure.
    for _ in 0..3 {
        let again = submit_once(&mut session, &client, UNROUTABLE_FORM_URL).await;
        assert!(again.is_none());
    }
    assert!(session.submitted());
}
