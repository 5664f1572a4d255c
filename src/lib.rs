pub mod cli;
pub mod error;
pub mod filter;
pub mod pairs;
pub mod submit;
pub mod web;

use colored::*;
use rand::Rng;
use reqwest::Client;
use serde::Serialize;

use cli::PickStrategy;
use error::SurveyError;
use pairs::{ComparisonPair, Method, Side};
use submit::SubmissionReport;

// ---------------------------------------------------------------------------
// Survey session — the interaction state machine
// ---------------------------------------------------------------------------

/// Where the participant currently is in the survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Intro,
    Comparing,
    Results,
}

/// One recorded choice, in presentation order.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceRecord {
    /// 1-based round number, as shown to the participant.
    pub round: usize,
    pub side: Side,
    pub method: Method,
}

/// Aggregate statistics for the results screen and the form submission.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub total_rounds: usize,
    pub simulated_choices: usize,
    pub generative_choices: usize,
    pub preferred: String,
    pub submitted: bool,
}

/// The survey state machine: `Intro → Comparing(0..N) → Results`.
///
/// Session-scoped mutable state lives in this one struct; callers own it
/// and drive it through `begin` and `choose`. `current_round` is -1 on the
/// intro screen, a valid index while comparing, and N once complete.
#[derive(Debug)]
pub struct SurveySession {
    current_round: i64,
    comparisons: Vec<ComparisonPair>,
    results: Vec<ChoiceRecord>,
    simulated_choices: usize,
    generative_choices: usize,
    submitted: bool,
}

impl SurveySession {
    pub fn new(comparisons: Vec<ComparisonPair>) -> Result<Self, SurveyError> {
        if comparisons.is_empty() {
            return Err(SurveyError::EmptyPairList);
        }
        Ok(SurveySession {
            current_round: -1,
            comparisons,
            results: Vec::new(),
            simulated_choices: 0,
            generative_choices: 0,
            submitted: false,
        })
    }

    pub fn phase(&self) -> Phase {
        if self.current_round < 0 {
            Phase::Intro
        } else if (self.current_round as usize) < self.comparisons.len() {
            Phase::Comparing
        } else {
            Phase::Results
        }
    }

    pub fn current_round(&self) -> i64 {
        self.current_round
    }

    pub fn total_rounds(&self) -> usize {
        self.comparisons.len()
    }

    pub fn is_complete(&self) -> bool {
        self.current_round >= self.comparisons.len() as i64
    }

    pub fn results(&self) -> &[ChoiceRecord] {
        &self.results
    }

    pub fn comparisons(&self) -> &[ComparisonPair] {
        &self.comparisons
    }

    pub fn tally(&self, method: Method) -> usize {
        match method {
            Method::Simulated => self.simulated_choices,
            Method::GenerativeAi => self.generative_choices,
        }
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// Flip the at-most-once submission guard. Set when an attempt is made,
    /// whether or not the POST succeeds.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    /// Leave the intro screen and start round 0.
    pub fn begin(&mut self) -> Result<(), SurveyError> {
        if self.current_round != -1 {
            return Err(SurveyError::AlreadyStarted);
        }
        self.current_round = 0;
        Ok(())
    }

    /// The pair being shown right now.
    pub fn current_pair(&self) -> Result<&ComparisonPair, SurveyError> {
        match self.phase() {
            Phase::Intro => Err(SurveyError::NotStarted),
            Phase::Results => Err(SurveyError::AlreadyComplete),
            Phase::Comparing => Ok(&self.comparisons[self.current_round as usize]),
        }
    }

    /// The pair for an arbitrary round, used by the image endpoints.
    pub fn pair(&self, round: usize) -> Option<&ComparisonPair> {
        self.comparisons.get(round)
    }

    /// Record the participant's pick for the current round, bump the tally
    /// for that side's method, and advance. Returns the new phase.
    pub fn choose(&mut self, side: Side) -> Result<Phase, SurveyError> {
        let method = self.current_pair()?.method_for(side);
        match method {
            Method::Simulated => self.simulated_choices += 1,
            Method::GenerativeAi => self.generative_choices += 1,
        }
        self.results.push(ChoiceRecord {
            round: (self.current_round + 1) as usize,
            side,
            method,
        });
        self.current_round += 1;
        Ok(self.phase())
    }

    /// Which method the participant leaned toward. A tie reads as the
    /// neutral equally-split outcome.
    pub fn preferred_method(&self) -> String {
        use std::cmp::Ordering;
        match self.simulated_choices.cmp(&self.generative_choices) {
            Ordering::Greater => Method::Simulated.label().to_string(),
            Ordering::Less => Method::GenerativeAi.label().to_string(),
            Ordering::Equal => "Neither - you were equally split!".to_string(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_rounds: self.total_rounds(),
            simulated_choices: self.simulated_choices,
            generative_choices: self.generative_choices,
            preferred: self.preferred_method(),
            submitted: self.submitted,
        }
    }
}

// ---------------------------------------------------------------------------
// Headless scripted session
// ---------------------------------------------------------------------------

/// Drive a full session without the web UI, picking sides per `strategy`,
/// then attempt the one form submission unless `no_submit` is set.
///
/// Prints the same per-round and results copy a participant would see, and
/// returns the final summary plus the submission report (if attempted).
pub async fn run_headless(
    mut session: SurveySession,
    strategy: PickStrategy,
    rng: &mut impl Rng,
    form_url: &str,
    no_submit: bool,
) -> Result<(SessionSummary, Option<SubmissionReport>), SurveyError> {
    print_intro(&session);
    session.begin()?;

    while !session.is_complete() {
        let round = session.current_round() as usize;
        let side = strategy.pick(round, rng);
        let pair = session.current_pair()?;
        println!(
            "{} {} -> {} ({})",
            format!("Round {}/{}", round + 1, session.total_rounds()).bright_yellow(),
            pair.path_for(side).display(),
            side,
            pair.method_for(side).label()
        );
        session.choose(side)?;
    }

    let report = if no_submit {
        session.mark_submitted();
        None
    } else {
        let client = Client::new();
        submit::submit_once(&mut session, &client, form_url).await
    };

    print_results(&session, report.as_ref());
    Ok((session.summary(), report))
}

fn print_intro(session: &SurveySession) {
    println!("{}", "PACKAGE CODE CLOSE-UPS".bright_cyan().bold());
    println!(
        "You'll see {} pairs of images - pick the one you think is the real photograph.",
        session.total_rounds()
    );
    println!("{}", "=".repeat(50).bright_blue());
}

fn print_results(session: &SurveySession, report: Option<&SubmissionReport>) {
    println!("{}", "=".repeat(50).bright_blue());
    println!("{}", "Test completed! Thank you for participating.".bright_green());
    println!(
        "{} All the images you saw were actually synthetic.",
        "Surprise!".bright_magenta().bold()
    );
    println!(
        "You chose 'Simulated' images {} times",
        session.tally(Method::Simulated)
    );
    println!(
        "You chose 'Stable Diffusion XL' images {} times",
        session.tally(Method::GenerativeAi)
    );
    println!(
        "{}: {}",
        "Your preferred method".bright_yellow(),
        session.preferred_method().bright_white().bold()
    );
    match report {
        Some(r) if r.ok => println!("{}", r.message.bright_green()),
        Some(r) => println!("{}", r.message.bright_red()),
        None => {}
    }
}
