use std::path::Path;

/// Canonical form used for every index key and lookup: forward slashes, no
/// empty or `.` segments, `..` folded where possible, no trailing separator.
/// The repository root is `"."`.
pub fn normalize_path(raw: &str) -> String {
    let raw = raw.trim().replace('\\', "/");
    let cleaned = path_clean::clean(Path::new(&raw))
        .to_string_lossy()
        .replace('\\', "/");
    if cleaned.is_empty() {
        ".".to_string()
    } else {
        cleaned
    }
}

/// Normalized directory containing `path`. Files at the top level live in `"."`.
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

/// `path` relative to `root`, normalized. Returns `None` if `path` is not below `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(normalize_path(&joined))
}
