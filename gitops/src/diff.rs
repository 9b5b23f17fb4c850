use impact_defs::{ChangeRecord, FilePatch, ImpactError};
use impact_utils::{normalize_path, parent_dir};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Anything able to hand over the raw file list of a commit-to-commit diff.
pub trait PatchSource {
    fn patches(&self) -> Result<Vec<FilePatch>, ImpactError>;
}

/// Reads a precomputed patch list: a JSON array of `{"from": ..., "to": ...}` objects.
#[derive(Debug, Clone)]
pub struct JsonPatchSource {
    pub path: PathBuf,
}

impl JsonPatchSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonPatchSource { path: path.into() }
    }
}

impl PatchSource for JsonPatchSource {
    fn patches(&self) -> Result<Vec<FilePatch>, ImpactError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ImpactError::PatchListUnreadable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ImpactError::PatchListUnreadable(format!("{}: {}", self.path.display(), e))
        })
    }
}

fn side(path: &Option<String>) -> Option<String> {
    path.as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(normalize_path)
}

/// Classifies one patch. `index` is only used to point at the offending entry.
pub fn classify_patch(index: usize, patch: &FilePatch) -> Result<ChangeRecord, ImpactError> {
    let change = match (side(&patch.from), side(&patch.to)) {
        (None, None) => return Err(ImpactError::InvalidPatch { index }),
        (None, Some(to)) => ChangeRecord::Added { to },
        (Some(from), None) => ChangeRecord::Deleted { from },
        (Some(from), Some(to)) if from == to => ChangeRecord::Modified { path: to },
        (Some(from), Some(to)) => ChangeRecord::Renamed { from, to },
    };
    Ok(change)
}

/// One change record per patch, in input order. A single bad patch fails the
/// whole list; a partial list would hide affected Applications.
pub fn classify_patches(patches: &[FilePatch]) -> Result<Vec<ChangeRecord>, ImpactError> {
    log::info!("Length of patches: {}", patches.len());
    patches
        .iter()
        .enumerate()
        .map(|(index, patch)| {
            let change = classify_patch(index, patch)?;
            log::debug!("{}", change);
            Ok(change)
        })
        .collect()
}

pub fn classify_source(source: &dyn PatchSource) -> Result<Vec<ChangeRecord>, ImpactError> {
    let patches = source.patches()?;
    classify_patches(&patches)
}

/// Unique directories touched by the changes (both sides of a rename), sorted.
pub fn changed_directories(changes: &[ChangeRecord]) -> Vec<String> {
    let mut dirs = BTreeSet::new();
    for change in changes {
        for path in [change.from_path(), change.to_path()].into_iter().flatten() {
            dirs.insert(parent_dir(path));
        }
    }
    dirs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classification_rules() {
        let patches = vec![
            FilePatch::new(None, Some("new.yaml")),
            FilePatch::new(Some("gone.yaml"), None),
            FilePatch::new(Some("same.yaml"), Some("same.yaml")),
            FilePatch::new(Some("old/x.yaml"), Some("new/x.yaml")),
        ];
        let changes = classify_patches(&patches).unwrap();
        assert_eq!(
            changes,
            vec![
                ChangeRecord::Added {
                    to: "new.yaml".to_string()
                },
                ChangeRecord::Deleted {
                    from: "gone.yaml".to_string()
                },
                ChangeRecord::Modified {
                    path: "same.yaml".to_string()
                },
                ChangeRecord::Renamed {
                    from: "old/x.yaml".to_string(),
                    to: "new/x.yaml".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_paths_are_normalized_before_comparison() {
        // Same file spelled two ways is a modification, not a rename.
        let change = classify_patch(0, &FilePatch::new(Some("./apps/a.yaml"), Some("apps/a.yaml")))
            .unwrap();
        assert_eq!(
            change,
            ChangeRecord::Modified {
                path: "apps/a.yaml".to_string()
            }
        );
    }

    #[test]
    fn test_empty_side_counts_as_missing() {
        let change = classify_patch(0, &FilePatch::new(Some(""), Some("a.yaml"))).unwrap();
        assert_eq!(
            change,
            ChangeRecord::Added {
                to: "a.yaml".to_string()
            }
        );
    }

    #[test]
    fn test_patch_without_sides_fails_whole_list() {
        let patches = vec![
            FilePatch::new(None, Some("a.yaml")),
            FilePatch::new(None, None),
        ];
        match classify_patches(&patches) {
            Err(ImpactError::InvalidPatch { index }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invariants_hold_for_every_record() {
        let patches = vec![
            FilePatch::new(None, Some("a")),
            FilePatch::new(Some("b"), None),
            FilePatch::new(Some("c"), Some("c/")),
            FilePatch::new(Some("d"), Some("e")),
        ];
        for change in classify_patches(&patches).unwrap() {
            match (change.from_path(), change.to_path()) {
                (None, Some(_)) | (Some(_), None) => {}
                (Some(from), Some(to)) if change.kind() == impact_defs::ChangeKind::Modified => {
                    assert_eq!(from, to)
                }
                (Some(from), Some(to)) => assert_ne!(from, to),
                (None, None) => panic!("record without paths"),
            }
        }
    }

    #[test]
    fn test_json_patch_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("patches.json");
        std::fs::write(
            &file,
            r#"[{"from": null, "to": "res/b/new.yaml"}, {"from": "appB.yaml", "to": "appB.yaml"}]"#,
        )
        .unwrap();

        let changes = classify_source(&JsonPatchSource::new(&file)).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].lookup_path(), "res/b/new.yaml");
        assert_eq!(changes[1].kind(), impact_defs::ChangeKind::Modified);
    }

    #[test]
    fn test_json_patch_source_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonPatchSource::new(dir.path().join("missing.json"));
        assert!(matches!(
            source.patches(),
            Err(ImpactError::PatchListUnreadable(_))
        ));
    }

    #[test]
    fn test_changed_directories() {
        let changes = vec![
            ChangeRecord::Modified {
                path: "res/a/deployment.yaml".to_string(),
            },
            ChangeRecord::Modified {
                path: "res/a/service.yaml".to_string(),
            },
            ChangeRecord::Renamed {
                from: "old/x.yaml".to_string(),
                to: "appB.yaml".to_string(),
            },
        ];
        assert_eq!(changed_directories(&changes), vec![".", "old", "res/a"]);
    }
}
