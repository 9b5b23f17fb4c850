mod catalog;
mod diff;
mod git;
mod report;
mod resolver;

pub use catalog::{parse_application, Catalog, CatalogBuild, CatalogConfig};
pub use diff::{
    changed_directories, classify_patch, classify_patches, classify_source, JsonPatchSource,
    PatchSource,
};
pub use git::{parse_name_status, GitPatchSource};
pub use report::{render_catalog_text, render_json, render_text};
pub use resolver::resolve;
