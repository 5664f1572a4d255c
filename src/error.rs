use std::path::PathBuf;
use thiserror::Error;

/// Crate-level error type.
///
/// Setup variants are fatal (the survey never starts); `Submission` is the
/// one non-fatal case and is downgraded to a warning at its call sites.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("no comparison pairs configured; check the image directories")]
    EmptyPairList,

    #[error("missing image file: {0}")]
    MissingImage(PathBuf),

    #[error("failed to read image {path}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode image for display")]
    ImageEncode(#[source] image::ImageError),

    #[error("the survey has not started yet")]
    NotStarted,

    #[error("the survey has already started")]
    AlreadyStarted,

    #[error("the survey is already complete")]
    AlreadyComplete,

    #[error("form submission failed: {0}")]
    Submission(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
