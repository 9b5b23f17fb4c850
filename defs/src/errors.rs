use thiserror::Error;

/// Errors that abort a run before any resolution outcome is produced.
#[derive(Error, Debug)]
pub enum ImpactError {
    #[error("The diff between the two commits could not be computed: {0}")]
    DiffUnavailable(String),

    #[error("The patch list could not be read: {0}")]
    PatchListUnreadable(String),

    #[error("Patch #{index} has neither a source nor a destination path")]
    InvalidPatch { index: usize },

    #[error("The repository root {root} could not be traversed: {reason}")]
    CatalogUnavailable { root: String, reason: String },
}
