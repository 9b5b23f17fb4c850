mod application;
mod change;
mod errors;
mod outcome;

pub use application::{
    ApplicationManifest, ApplicationMetadata, ApplicationRecord, ApplicationSource,
    ApplicationSpec, SourceKind,
};
pub use change::{ChangeKind, ChangeRecord, FilePatch};
pub use errors::ImpactError;
pub use outcome::{
    AttributedChange, AttributionReason, LayoutAmbiguity, ManifestReadError, ManifestReadReason,
    ResolutionOutcome, SourcePathConflict, EXIT_UNCLEAN,
};
