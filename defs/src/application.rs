use serde::{Deserialize, Deserializer, Serialize};

/// Reads a scalar as text the way YAML authors expect: `path: 2048` and
/// `name: true` are strings. Sequences and mappings yield `None`.
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

/// The subset of an Argo CD style Application manifest needed for indexing.
/// Everything is optional so that a half-written manifest still deserializes
/// and can be classified as malformed instead of being dropped.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ApplicationManifest {
    #[serde(rename = "apiVersion", default, deserialize_with = "lenient_string")]
    pub api_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Option<ApplicationMetadata>,
    #[serde(default)]
    pub spec: Option<ApplicationSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ApplicationMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ApplicationSpec {
    #[serde(default)]
    pub source: Option<ApplicationSource>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ApplicationSource {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,
    // Only the presence of the block matters, its fields are left untyped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<serde_yaml::Value>,
}

impl ApplicationManifest {
    pub fn name(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|n| !n.is_empty())
    }

    pub fn source(&self) -> Option<&ApplicationSource> {
        self.spec.as_ref().and_then(|s| s.source.as_ref())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Rendered from an embedded templating block (`spec.source.helm`).
    InlineTemplated,
    /// Deploys the resources of a separate directory (`spec.source.path`).
    ExternalPath,
    /// Carries the Application marker but lacks the fields needed to classify it.
    Malformed,
}

/// A parsed Application, keyed by the file it was found in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub definition_path: String,
    pub name: Option<String>,
    pub source_kind: SourceKind,
    /// Normalized directory, only set for `SourceKind::ExternalPath`.
    pub source_path: Option<String>,
}

impl ApplicationRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
