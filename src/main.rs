use std::sync::Arc;

use clap::Parser;
use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use authenticity_survey::cli::Args;
use authenticity_survey::web::AppState;
use authenticity_survey::{pairs, run_headless, web, SurveySession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut rng: StdRng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Fatal setup: missing pair images or an empty table stop us here,
    // before any round is shown.
    let comparisons = pairs::setup_pairs(&args.data_dir, &mut rng).map_err(|e| {
        eprintln!(
            "{} {}",
            "No usable images found.".bright_red(),
            "Please check your image directories.".bright_red()
        );
        e
    })?;
    let session = SurveySession::new(comparisons)?;

    if args.headless {
        let (summary, _report) =
            run_headless(session, args.pick, &mut rng, &args.form_url, args.no_submit).await?;
        if let Some(path) = &args.output {
            std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
            eprintln!("[headless] summary written to {}", path.display());
        }
        return Ok(());
    }

    let examples = pairs::existing_examples(&args.data_dir);
    if examples.is_empty() {
        tracing::warn!("no intro example images found; the intro will show text only");
    }

    let state = Arc::new(AppState::new(
        session,
        examples,
        args.form_url.clone(),
        args.no_submit,
    ));
    web::serve(args.port, state).await?;

    Ok(())
}
