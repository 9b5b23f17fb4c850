use impact_defs::{
    ApplicationManifest, ApplicationRecord, ImpactError, ManifestReadError, ManifestReadReason,
    SourceKind, SourcePathConflict,
};
use impact_utils::{find_manifest_files, normalize_path};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Which documents count as Applications and which files are looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Prefix the `apiVersion` must start with.
    pub api_group: String,
    pub kind: String,
    pub extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            api_group: "argoproj.io".to_string(),
            kind: "Application".to_string(),
            extensions: vec!["yaml".to_string(), "yml".to_string()],
        }
    }
}

/// All Applications of a working tree, indexed by their own file and by the
/// directory they deploy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    by_definition_path: BTreeMap<String, ApplicationRecord>,
    by_resource_path: BTreeMap<String, String>,
}

/// A built catalog together with the non-fatal findings of the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub conflicts: Vec<SourcePathConflict>,
    pub skipped: Vec<ManifestReadError>,
}

/// Accumulates records in traversal order. Only ever appended to.
#[derive(Default)]
struct CatalogBuilder {
    catalog: Catalog,
    conflicts: Vec<SourcePathConflict>,
    conflict_index: HashMap<String, usize>,
    skipped: Vec<ManifestReadError>,
}

impl CatalogBuilder {
    fn add(&mut self, record: ApplicationRecord) {
        let definition_path = record.definition_path.clone();
        let source_path = match record.source_kind {
            SourceKind::ExternalPath => record.source_path.clone(),
            _ => None,
        };
        self.catalog
            .by_definition_path
            .insert(definition_path.clone(), record);

        let Some(directory) = source_path else {
            return;
        };
        match self.catalog.by_resource_path.get(&directory) {
            None => {
                self.catalog
                    .by_resource_path
                    .insert(directory, definition_path);
            }
            Some(existing) if *existing == definition_path => {}
            Some(existing) => {
                log::warn!(
                    "Directory {} is claimed by both {} and {}, keeping {}",
                    directory,
                    existing,
                    definition_path,
                    existing
                );
                match self.conflict_index.get(&directory) {
                    Some(&i) => self.conflicts[i].claimants.push(definition_path),
                    None => {
                        self.conflict_index
                            .insert(directory.clone(), self.conflicts.len());
                        self.conflicts.push(SourcePathConflict {
                            directory,
                            claimants: vec![existing.clone(), definition_path],
                        });
                    }
                }
            }
        }
    }

    fn skip(&mut self, path: &str, reason: ManifestReadReason) {
        log::warn!("Skipping manifest {}: {:?}", path, reason);
        self.skipped.push(ManifestReadError {
            path: path.to_string(),
            reason,
        });
    }

    fn finish(self) -> CatalogBuild {
        self.catalog.log_contents();
        CatalogBuild {
            catalog: self.catalog,
            conflicts: self.conflicts,
            skipped: self.skipped,
        }
    }
}

fn is_application(document: &serde_yaml::Value, config: &CatalogConfig) -> bool {
    let api_version = document.get("apiVersion").and_then(serde_yaml::Value::as_str);
    let kind = document.get("kind").and_then(serde_yaml::Value::as_str);
    api_version.is_some_and(|v| v.starts_with(&config.api_group)) && kind == Some(config.kind.as_str())
}

fn classify(definition_path: &str, manifest: &ApplicationManifest) -> ApplicationRecord {
    let name = manifest.name().map(str::to_string);
    let source = manifest.source();
    let declared_path = source
        .and_then(|s| s.path.as_deref())
        .filter(|p| !p.trim().is_empty());

    let (source_kind, source_path) = match (source, declared_path) {
        _ if name.is_none() => (SourceKind::Malformed, None),
        (Some(s), _) if s.helm.is_some() => (SourceKind::InlineTemplated, None),
        (_, Some(path)) => (SourceKind::ExternalPath, Some(normalize_path(path))),
        _ => (SourceKind::Malformed, None),
    };

    ApplicationRecord {
        definition_path: definition_path.to_string(),
        name,
        source_kind,
        source_path,
    }
}

/// Parses one manifest file. `Ok(None)` means the file holds no Application;
/// `Err` carries the YAML error of a document that could not be parsed.
pub fn parse_application(
    definition_path: &str,
    content: &str,
    config: &CatalogConfig,
) -> Result<Option<ApplicationRecord>, String> {
    let mut found: Option<ApplicationRecord> = None;

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| e.to_string())?;
        if !is_application(&value, config) {
            continue;
        }
        if found.is_some() {
            log::warn!(
                "{} holds more than one {}, only the first one is indexed",
                definition_path,
                config.kind
            );
            continue;
        }
        let record = match serde_yaml::from_value::<ApplicationManifest>(value) {
            Ok(manifest) => classify(definition_path, &manifest),
            Err(e) => {
                log::warn!("{} has an unexpected shape: {}", definition_path, e);
                ApplicationRecord {
                    definition_path: definition_path.to_string(),
                    name: None,
                    source_kind: SourceKind::Malformed,
                    source_path: None,
                }
            }
        };
        found = Some(record);
    }

    Ok(found)
}

impl Catalog {
    /// Walks `root` and indexes every Application manifest below it. Files are
    /// processed in lexicographic path order, which decides who wins a
    /// contested source directory.
    pub fn build(root: &Path, config: &CatalogConfig) -> Result<CatalogBuild, ImpactError> {
        let files = find_manifest_files(root, &config.extensions).map_err(|e| {
            ImpactError::CatalogUnavailable {
                root: root.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        log::info!(
            "Found {} manifest candidates below {}",
            files.files.len(),
            root.display()
        );

        let mut builder = CatalogBuilder::default();
        for (path, reason) in files.unreadable {
            builder.skip(&path, ManifestReadReason::Unreadable(reason));
        }

        for file in files.files {
            let content = match std::fs::read_to_string(&file.location) {
                Ok(content) => content,
                Err(e) => {
                    builder.skip(&file.path, ManifestReadReason::Unreadable(e.to_string()));
                    continue;
                }
            };
            match parse_application(&file.path, &content, config) {
                Ok(Some(record)) => builder.add(record),
                Ok(None) => {}
                Err(e) => builder.skip(&file.path, ManifestReadReason::Unparseable(e)),
            }
        }

        Ok(builder.finish())
    }

    /// Builds a catalog from already parsed records, e.g. synthetic ones in
    /// tests. Records are sorted by definition path first, like a tree walk.
    pub fn from_records(records: impl IntoIterator<Item = ApplicationRecord>) -> CatalogBuild {
        let mut records: Vec<ApplicationRecord> = records
            .into_iter()
            .map(|mut r| {
                r.definition_path = normalize_path(&r.definition_path);
                r.source_path = r.source_path.as_deref().map(normalize_path);
                r
            })
            .collect();
        records.sort_by(|a, b| a.definition_path.cmp(&b.definition_path));

        let mut builder = CatalogBuilder::default();
        for record in records {
            builder.add(record);
        }
        builder.finish()
    }

    pub fn definition(&self, path: &str) -> Option<&ApplicationRecord> {
        self.by_definition_path.get(&normalize_path(path))
    }

    /// Definition path of the Application deploying exactly `directory`.
    pub fn owner_of_directory(&self, directory: &str) -> Option<&str> {
        self.by_resource_path
            .get(&normalize_path(directory))
            .map(String::as_str)
    }

    pub fn application_name(&self, definition_path: &str) -> Option<&str> {
        self.definition(definition_path)
            .and_then(|r| r.name.as_deref())
    }

    /// All records in definition-path order.
    pub fn applications(&self) -> impl Iterator<Item = &ApplicationRecord> {
        self.by_definition_path.values()
    }

    /// `(directory, definition path)` pairs in directory order.
    pub fn resource_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_resource_path
            .iter()
            .map(|(dir, def)| (dir.as_str(), def.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_definition_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_definition_path.is_empty()
    }

    fn log_contents(&self) {
        log::info!("Applications indexed: {}", self.by_definition_path.len());
        for (path, record) in &self.by_definition_path {
            log::debug!("{}: {} ({:?})", path, record.display_name(), record.source_kind);
        }
        log::info!("Resource directories indexed: {}", self.by_resource_path.len());
        for (dir, path) in &self.by_resource_path {
            log::debug!("{} -> {}", dir, path);
        }
    }
}
