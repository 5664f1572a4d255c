use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rand::Rng;

use crate::pairs::Side;
use crate::submit;

#[derive(Parser)]
#[command(name = "authenticity-survey")]
#[command(version = "1.0.0")]
#[command(about = "An interactive which-image-looks-real survey over paired synthetic images")]
pub struct Args {
    /// Root directory holding the sdXL/, simulated/, and real/ image folders
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Port for the survey web UI
    #[arg(long, default_value = "8888")]
    pub port: u16,

    /// Run a scripted session in the terminal instead of serving the web UI
    #[arg(long)]
    pub headless: bool,

    /// Side-pick strategy for headless mode
    #[arg(long, value_enum, default_value = "left")]
    pub pick: PickStrategy,

    /// Write the headless session summary as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip the form submission entirely
    #[arg(long)]
    pub no_submit: bool,

    /// Override the form-submission endpoint
    #[arg(long, default_value = submit::FORM_URL)]
    pub form_url: String,

    /// Seed for the left/right shuffle (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// How a headless session picks a side each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PickStrategy {
    Left,
    Right,
    Alternate,
    Random,
}

impl PickStrategy {
    pub fn pick(&self, round: usize, rng: &mut impl Rng) -> Side {
        match self {
            PickStrategy::Left => Side::Left,
            PickStrategy::Right => Side::Right,
            PickStrategy::Alternate => {
                if round % 2 == 0 {
                    Side::Left
                } else {
                    Side::Right
                }
            }
            PickStrategy::Random => {
                if rng.gen_bool(0.5) {
                    Side::Left
                } else {
                    Side::Right
                }
            }
        }
    }
}
