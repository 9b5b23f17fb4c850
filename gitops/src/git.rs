use impact_defs::{FilePatch, ImpactError};
use std::path::PathBuf;
use std::process::Command;

use crate::diff::PatchSource;

/// Computes the patch list with the `git` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct GitPatchSource {
    pub repo: PathBuf,
    pub base: String,
    pub head: String,
}

impl GitPatchSource {
    pub fn new(repo: impl Into<PathBuf>, base: &str, head: &str) -> Self {
        GitPatchSource {
            repo: repo.into(),
            base: base.to_string(),
            head: head.to_string(),
        }
    }
}

impl PatchSource for GitPatchSource {
    fn patches(&self) -> Result<Vec<FilePatch>, ImpactError> {
        log::info!("Diffing {}..{} in {}", self.base, self.head, self.repo.display());
        let output = Command::new("git")
            .arg("diff")
            .arg("--name-status")
            .arg("-z")
            .arg("-M")
            // Paths relative to `repo` even when it is a subdirectory of the
            // work tree, the same frame the catalog uses.
            .arg("--relative")
            .arg(&self.base)
            .arg(&self.head)
            .arg("--")
            .current_dir(&self.repo)
            .output()
            .map_err(|e| ImpactError::DiffUnavailable(format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImpactError::DiffUnavailable(format!(
                "git diff {}..{} exited with {}: {}",
                self.base,
                self.head,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ImpactError::DiffUnavailable(format!("git output is not UTF-8: {}", e)))?;
        parse_name_status(&stdout)
    }
}

/// Parses `git diff --name-status -z` output. Every field is NUL-terminated;
/// renames and copies carry two paths after their status.
pub fn parse_name_status(output: &str) -> Result<Vec<FilePatch>, ImpactError> {
    let mut fields = output.split('\0').filter(|f| !f.is_empty());
    let mut patches = Vec::new();

    while let Some(status) = fields.next() {
        let mut next_path = |what: &str| {
            fields.next().map(str::to_string).ok_or_else(|| {
                ImpactError::DiffUnavailable(format!(
                    "truncated diff output: missing {} path after status '{}'",
                    what, status
                ))
            })
        };

        let patch = match status.chars().next() {
            Some('A') => FilePatch {
                from: None,
                to: Some(next_path("added")?),
            },
            Some('D') => FilePatch {
                from: Some(next_path("deleted")?),
                to: None,
            },
            Some('M') | Some('T') | Some('U') => {
                let path = next_path("modified")?;
                FilePatch {
                    from: Some(path.clone()),
                    to: Some(path),
                }
            }
            Some('R') => {
                let from = next_path("rename source")?;
                let to = next_path("rename destination")?;
                FilePatch {
                    from: Some(from),
                    to: Some(to),
                }
            }
            // A copy leaves the source untouched and adds the destination.
            Some('C') => {
                let _source = next_path("copy source")?;
                FilePatch {
                    from: None,
                    to: Some(next_path("copy destination")?),
                }
            }
            _ => {
                return Err(ImpactError::DiffUnavailable(format!(
                    "unknown diff status '{}'",
                    status
                )))
            }
        };
        patches.push(patch);
    }

    Ok(patches)
}
