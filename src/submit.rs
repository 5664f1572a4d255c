//! Results submission to the external form endpoint.
//!
//! One POST per session, fire-and-forget: the attempt is guarded by the
//! session's `submitted` flag, failures are downgraded to an on-screen
//! warning, and nothing is ever retried or queued.

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SurveyError;
use crate::{SessionSummary, SurveySession};

/// The deployed survey's form endpoint.
pub const FORM_URL: &str = "https://docs.google.com/forms/d/e/1FAIpQLSeKjq4wiLCKbe_nVjGLuzEQ_0btWe6eeIOZzKJiUOLuaheKcA/formResponse";

// Form entry ids, matching the response sheet's columns.
const ENTRY_MAX_TALLY: &str = "entry.1319823618";
const ENTRY_TOTAL_ROUNDS: &str = "entry.1994929153";
const ENTRY_PREFERRED: &str = "entry.1844798411";
const ENTRY_SIMULATED: &str = "entry.1614317066";
const ENTRY_GENERATIVE: &str = "entry.238554702";

// Google Forms rejects requests without a browser-looking UA and Referer.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Outcome of the single allowed submission attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub ok: bool,
    pub message: String,
}

/// Build the five named form fields. Every value is stringified; the form
/// endpoint accepts nothing else.
pub fn build_form_data(summary: &SessionSummary) -> Vec<(String, String)> {
    let max_tally = summary.simulated_choices.max(summary.generative_choices);
    vec![
        (ENTRY_MAX_TALLY.to_string(), max_tally.to_string()),
        (ENTRY_TOTAL_ROUNDS.to_string(), summary.total_rounds.to_string()),
        (ENTRY_PREFERRED.to_string(), summary.preferred.clone()),
        (ENTRY_SIMULATED.to_string(), summary.simulated_choices.to_string()),
        (ENTRY_GENERATIVE.to_string(), summary.generative_choices.to_string()),
    ]
}

/// POST the summary to the form endpoint. Non-2xx statuses are errors.
pub async fn post_summary(
    client: &Client,
    form_url: &str,
    summary: &SessionSummary,
) -> Result<(), SurveyError> {
    let referer = form_url.replace("/formResponse", "/viewform");
    let response = client
        .post(form_url)
        .header("User-Agent", USER_AGENT)
        .header("Referer", referer)
        .form(&build_form_data(summary))
        .send()
        .await
        .map_err(|e| SurveyError::Submission(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SurveyError::Submission(format!(
            "form endpoint returned HTTP {}",
            response.status()
        )));
    }
    Ok(())
}

/// Attempt the submission at most once per session.
///
/// Returns `None` when the session isn't complete yet or an attempt was
/// already made (re-rendering the results screen is a no-op). The session is
/// marked submitted before the POST goes out, so a failed attempt is never
/// retried — the participant is asked to screenshot their results instead.
pub async fn submit_once(
    session: &mut SurveySession,
    client: &Client,
    form_url: &str,
) -> Option<SubmissionReport> {
    if !session.is_complete() || session.submitted() {
        return None;
    }
    session.mark_submitted();

    let summary = session.summary();
    match post_summary(client, form_url, &summary).await {
        Ok(()) => {
            info!(total_rounds = summary.total_rounds, "survey results submitted");
            Some(SubmissionReport {
                ok: true,
                message: "Results successfully submitted!".to_string(),
            })
        }
        Err(e) => {
            warn!(error = %e, "survey submission failed");
            Some(SubmissionReport {
                ok: false,
                message: format!(
                    "Results couldn't be submitted automatically ({e}). \
                     Please take a screenshot of your results."
                ),
            })
        }
    }
}
