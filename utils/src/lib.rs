mod file;
mod logging;
mod path;

pub use file::{find_manifest_files, has_manifest_extension, ManifestFile, ManifestFiles};
pub use logging::setup_logging;
pub use path::{normalize_path, parent_dir, relative_to};
