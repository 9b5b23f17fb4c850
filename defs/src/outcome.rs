use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ChangeRecord;

/// Exit status for a run whose mapping is not clean (unresolved changes or conflicts).
pub const EXIT_UNCLEAN: i32 = 2;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributionReason {
    /// The changed file is the Application manifest itself.
    Definition,
    /// The changed file lives in the Application's declared source directory.
    Resource,
    /// A rename moved the file away from this Application.
    RenameSource,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AttributedChange {
    pub change: ChangeRecord,
    pub reason: AttributionReason,
}

/// Two or more Applications declaring the same external source directory.
/// `claimants[0]` keeps the mapping.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SourcePathConflict {
    pub directory: String,
    pub claimants: Vec<String>,
}

impl SourcePathConflict {
    pub fn winner(&self) -> Option<&str> {
        self.claimants.first().map(String::as_str)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ManifestReadReason {
    Unreadable(String),
    Unparseable(String),
}

/// A manifest candidate that was skipped during the catalog build.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ManifestReadError {
    pub path: String,
    pub reason: ManifestReadReason,
}

/// A changed path that is an Application definition and also sits inside the
/// declared source directory of a different Application. The definition wins.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LayoutAmbiguity {
    pub path: String,
    pub definition: String,
    pub shadowed: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// Definition path -> changes implicating that Application, in the order they were attributed.
    pub resolved: BTreeMap<String, Vec<AttributedChange>>,
    pub unresolved: Vec<ChangeRecord>,
    pub conflicts: Vec<SourcePathConflict>,
    pub ambiguities: Vec<LayoutAmbiguity>,
}

impl ResolutionOutcome {
    pub fn changes_for(&self, definition_path: &str) -> Vec<&ChangeRecord> {
        self.resolved
            .get(definition_path)
            .map(|changes| changes.iter().map(|a| &a.change).collect())
            .unwrap_or_default()
    }

    pub fn affected_applications(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }

    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.conflicts.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            0
        } else {
            EXIT_UNCLEAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_outcome_is_clean() {
        let outcome = ResolutionOutcome::default();
        assert!(outcome.is_clean());
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.changes_for("app.yaml").is_empty());
    }

    #[test]
    fn test_unresolved_or_conflict_is_unclean() {
        let mut outcome = ResolutionOutcome::default();
        outcome.unresolved.push(ChangeRecord::Added {
            to: "orphan/thing.yaml".to_string(),
        });
        assert_eq!(outcome.exit_code(), EXIT_UNCLEAN);

        let mut outcome = ResolutionOutcome::default();
        outcome.conflicts.push(SourcePathConflict {
            directory: "shared".to_string(),
            claimants: vec!["a.yaml".to_string(), "b.yaml".to_string()],
        });
        assert!(!outcome.is_clean());
        assert_eq!(outcome.conflicts[0].winner(), Some("a.yaml"));
    }

    #[test]
    fn test_ambiguity_alone_is_clean() {
        let mut outcome = ResolutionOutcome::default();
        outcome.ambiguities.push(LayoutAmbiguity {
            path: "apps/a.yaml".to_string(),
            definition: "apps/a.yaml".to_string(),
            shadowed: "root.yaml".to_string(),
        });
        assert!(outcome.is_clean());
    }
}
