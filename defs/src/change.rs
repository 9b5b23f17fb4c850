use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw entry of a commit-to-commit diff, as handed over by the version-control side.
/// A missing side means the file did not exist in that commit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FilePatch {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl FilePatch {
    pub fn new(from: Option<&str>, to: Option<&str>) -> Self {
        FilePatch {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// A single logical file change between two commits.
///
/// The variants carry exactly the paths that exist for that kind of change, so
/// an `Added` record can never hold a `from` path and a `Renamed` record always
/// holds both.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChangeRecord {
    Added { to: String },
    Modified { path: String },
    Deleted { from: String },
    Renamed { from: String, to: String },
}

impl ChangeRecord {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeRecord::Added { .. } => ChangeKind::Added,
            ChangeRecord::Modified { .. } => ChangeKind::Modified,
            ChangeRecord::Deleted { .. } => ChangeKind::Deleted,
            ChangeRecord::Renamed { .. } => ChangeKind::Renamed,
        }
    }

    pub fn from_path(&self) -> Option<&str> {
        match self {
            ChangeRecord::Added { .. } => None,
            ChangeRecord::Modified { path } => Some(path),
            ChangeRecord::Deleted { from } | ChangeRecord::Renamed { from, .. } => Some(from),
        }
    }

    pub fn to_path(&self) -> Option<&str> {
        match self {
            ChangeRecord::Added { to } | ChangeRecord::Renamed { to, .. } => Some(to),
            ChangeRecord::Modified { path } => Some(path),
            ChangeRecord::Deleted { .. } => None,
        }
    }

    /// The path whose owner is responsible for this change: the new location for
    /// anything that still exists, the last known location for deletions.
    pub fn lookup_path(&self) -> &str {
        match self {
            ChangeRecord::Added { to } | ChangeRecord::Renamed { to, .. } => to,
            ChangeRecord::Modified { path } => path,
            ChangeRecord::Deleted { from } => from,
        }
    }

    /// Short marker used in text output.
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeRecord::Added { .. } => "[+]",
            ChangeRecord::Modified { .. } => "[~]",
            ChangeRecord::Deleted { .. } => "[-]",
            ChangeRecord::Renamed { .. } => "[>]",
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::Renamed { from, to } => write!(f, "{} {} -> {}", self.symbol(), from, to),
            _ => write!(f, "{} {}", self.symbol(), self.lookup_path()),
        }
    }
}
