//! Comparison pair setup: method labels, the fixed image table, and the
//! per-session random left/right shuffle.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

// ---------------------------------------------------------------------------
// Method / Side enums
// ---------------------------------------------------------------------------

/// Which synthetic pipeline produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Pixel-manipulation pipeline.
    Simulated,
    /// Diffusion-based generative pipeline.
    GenerativeAi,
}

impl Method {
    /// User-facing label, matching the wording participants see.
    pub fn label(&self) -> &'static str {
        match self {
            Method::Simulated => "Simulated",
            Method::GenerativeAi => "Stable Diffusion XL",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which side of a pair the participant picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_query(s: &str) -> Option<Side> {
        match s {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

// ---------------------------------------------------------------------------
// Comparison pairs
// ---------------------------------------------------------------------------

/// One round's image pair with its randomized side assignment.
///
/// Built once at session start, immutable afterwards. The two method fields
/// are always a permutation of {Simulated, GenerativeAi}.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonPair {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_method: Method,
    pub right_method: Method,
}

impl ComparisonPair {
    pub fn method_for(&self, side: Side) -> Method {
        match side {
            Side::Left => self.left_method,
            Side::Right => self.right_method,
        }
    }

    pub fn path_for(&self, side: Side) -> &Path {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Fixed comparison table as (generative, simulated) paths relative to the
/// data root. The pairing is deliberate: each generative render is matched
/// with a simulated frame of comparable content.
pub const IMAGE_PAIRS: &[(&str, &str)] = &[
    ("sdXL/sdxl_8.png", "simulated/SS000020.png"),
    ("sdXL/sdxl_10.png", "simulated/SS000370.png"),
    ("sdXL/sdxl_5.png", "simulated/SS000434.png"),
    ("sdXL/sdxl_1.png", "simulated/SS000268.png"),
    ("sdXL/sdxl_7.png", "simulated/SS000430.png"),
    ("sdXL/sdxl_3.png", "simulated/SS000254.png"),
    ("sdXL/sdxl_9.png", "simulated/SS000259.png"),
    ("sdXL/sdxl_2.png", "simulated/SS000126.png"),
    ("sdXL/sdxl_4.png", "simulated/SS000274.png"),
    ("sdXL/sdxl_6.png", "simulated/SS000300.png"),
];

/// Real package-code photographs shown only on the intro screen.
pub const EXAMPLE_IMAGES: &[&str] = &[
    "real/image191.png",
    "real/image1328.png",
    "real/image712.png",
];

/// Build the session's comparison list from the fixed table.
pub fn setup_pairs(data_dir: &Path, rng: &mut impl Rng) -> Result<Vec<ComparisonPair>, SurveyError> {
    setup_pairs_from(IMAGE_PAIRS, data_dir, rng)
}

/// Resolve both paths of every `(generative, simulated)` entry against
/// `data_dir`, verify they exist, and randomize which method lands on which
/// side. An empty table or a missing pair image is a fatal setup error.
pub fn setup_pairs_from(
    table: &[(&str, &str)],
    data_dir: &Path,
    rng: &mut impl Rng,
) -> Result<Vec<ComparisonPair>, SurveyError> {
    if table.is_empty() {
        return Err(SurveyError::EmptyPairList);
    }

    let mut comparisons = Vec::with_capacity(table.len());
    for (generative_rel, simulated_rel) in table {
        let generative = data_dir.join(generative_rel);
        let simulated = data_dir.join(simulated_rel);
        for path in [&generative, &simulated] {
            if !path.exists() {
                return Err(SurveyError::MissingImage(path.clone()));
            }
        }

        let pair = if rng.gen_bool(0.5) {
            ComparisonPair {
                left: generative,
                right: simulated,
                left_method: Method::GenerativeAi,
                right_method: Method::Simulated,
            }
        } else {
            ComparisonPair {
                left: simulated,
                right: generative,
                left_method: Method::Simulated,
                right_method: Method::GenerativeAi,
            }
        };
        comparisons.push(pair);
    }

    Ok(comparisons)
}

/// Intro example images that exist on disk. Missing examples are skipped
/// rather than treated as fatal — the intro degrades gracefully.
pub fn existing_examples(data_dir: &Path) -> Vec<PathBuf> {
    EXAMPLE_IMAGES
        .iter()
        .map(|rel| data_dir.join(rel))
        .filter(|path| path.exists())
        .collect()
}
