use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::path::{normalize_path, relative_to};

/// A file below the walked root: its normalized repository-relative path and where to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub path: String,
    pub location: PathBuf,
}

/// Result of a manifest walk. `unreadable` holds entries the walk could not
/// descend into or stat, with the error text; they do not stop the walk.
#[derive(Debug, Default)]
pub struct ManifestFiles {
    pub files: Vec<ManifestFile>,
    pub unreadable: Vec<(String, String)>,
}

pub fn has_manifest_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Collects every file below `root` with one of `extensions`, skipping `.git`,
/// sorted by normalized path so callers see a stable lexicographic order.
/// Fails only when `root` itself cannot be traversed.
pub fn find_manifest_files(root: &Path, extensions: &[String]) -> io::Result<ManifestFiles> {
    let metadata = fs::metadata(root)?;
    if !metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", root.display()),
        ));
    }

    let mut found = ManifestFiles::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| relative_to(root, p))
                    .unwrap_or_else(|| "<unknown>".to_string());
                log::warn!("Failed to walk {}: {}", path, e);
                found.unreadable.push((path, e.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_manifest_extension(entry.path(), extensions) {
            continue;
        }
        let path = match relative_to(root, entry.path()) {
            Some(path) => path,
            None => normalize_path(&entry.path().to_string_lossy()),
        };
        found.files.push(ManifestFile {
            path,
            location: entry.path().to_path_buf(),
        });
    }

    found.files.sort_by(|a, b| a.path.cmp(&b.path));
    found.unreadable.sort();
    Ok(found)
}
