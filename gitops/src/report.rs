use impact_defs::{
    AttributionReason, ManifestReadError, ManifestReadReason, ResolutionOutcome,
};
use serde::Serialize;
use std::fmt::{self, Write};

use crate::catalog::CatalogBuild;
use crate::diff::changed_directories;

#[derive(Serialize)]
struct AffectedApplication<'a> {
    definition_path: &'a str,
    name: Option<&'a str>,
    changes: &'a [impact_defs::AttributedChange],
}

#[derive(Serialize)]
struct JsonReport<'a> {
    clean: bool,
    applications: Vec<AffectedApplication<'a>>,
    unresolved: &'a [impact_defs::ChangeRecord],
    conflicts: &'a [impact_defs::SourcePathConflict],
    ambiguities: &'a [impact_defs::LayoutAmbiguity],
    skipped: &'a [ManifestReadError],
}

fn skip_reason(reason: &ManifestReadReason) -> String {
    match reason {
        ManifestReadReason::Unreadable(e) => format!("unreadable: {}", e),
        ManifestReadReason::Unparseable(e) => format!("not valid YAML: {}", e),
    }
}

pub fn render_json(
    outcome: &ResolutionOutcome,
    build: &CatalogBuild,
) -> Result<String, serde_json::Error> {
    let applications = outcome
        .resolved
        .iter()
        .map(|(definition_path, changes)| AffectedApplication {
            definition_path,
            name: build.catalog.application_name(definition_path),
            changes,
        })
        .collect();
    let report = JsonReport {
        clean: outcome.is_clean(),
        applications,
        unresolved: &outcome.unresolved,
        conflicts: &outcome.conflicts,
        ambiguities: &outcome.ambiguities,
        skipped: &build.skipped,
    };
    serde_json::to_string_pretty(&report)
}

/// Human readable summary, one block per affected Application followed by
/// whatever needs attention.
pub fn render_text(
    outcome: &ResolutionOutcome,
    build: &CatalogBuild,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    let all_changes: Vec<_> = outcome
        .resolved
        .values()
        .flatten()
        .map(|a| a.change.clone())
        .chain(outcome.unresolved.iter().cloned())
        .collect();
    let directories = changed_directories(&all_changes);
    writeln!(out, "Changed directories: {}", directories.len())?;

    if outcome.resolved.is_empty() {
        writeln!(out, "No Applications affected")?;
    }
    for (definition_path, changes) in &outcome.resolved {
        let name = build
            .catalog
            .application_name(definition_path)
            .unwrap_or("<unnamed>");
        writeln!(out, "{} ({})", name, definition_path)?;
        for attributed in changes {
            let note = match attributed.reason {
                AttributionReason::Definition => " (definition)",
                AttributionReason::Resource => "",
                AttributionReason::RenameSource => " (moved out)",
            };
            writeln!(out, "  {}{}", attributed.change, note)?;
        }
    }

    if !outcome.unresolved.is_empty() {
        writeln!(out, "\nUNRESOLVED: no Application owns these changes")?;
        for change in &outcome.unresolved {
            writeln!(out, "  {}", change)?;
        }
    }
    if !outcome.conflicts.is_empty() {
        writeln!(out, "\nCONFLICT: directories claimed by several Applications")?;
        for conflict in &outcome.conflicts {
            writeln!(
                out,
                "  {}: {} (using {})",
                conflict.directory,
                conflict.claimants.join(", "),
                conflict.winner().unwrap_or("-")
            )?;
        }
    }
    if !outcome.ambiguities.is_empty() {
        writeln!(out, "\nAMBIGUOUS: Application definitions inside another Application's directory")?;
        for ambiguity in &outcome.ambiguities {
            writeln!(
                out,
                "  {} (also in the directory of {})",
                ambiguity.path, ambiguity.shadowed
            )?;
        }
    }
    if !build.skipped.is_empty() {
        writeln!(out, "\nSKIPPED: manifests that could not be read")?;
        for skipped in &build.skipped {
            writeln!(out, "  {}: {}", skipped.path, skip_reason(&skipped.reason))?;
        }
    }

    Ok(out)
}

pub fn render_catalog_text(build: &CatalogBuild) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Applications: {}", build.catalog.len())?;
    for record in build.catalog.applications() {
        let source = match &record.source_path {
            Some(dir) => format!(" -> {}", dir),
            None => String::new(),
        };
        writeln!(
            out,
            "  {} [{:?}] {}{}",
            record.definition_path,
            record.source_kind,
            record.display_name(),
            source
        )?;
    }
    for conflict in &build.conflicts {
        writeln!(
            out,
            "CONFLICT {}: {}",
            conflict.directory,
            conflict.claimants.join(", ")
        )?;
    }
    for skipped in &build.skipped {
        writeln!(out, "SKIPPED {}: {}", skipped.path, skip_reason(&skipped.reason))?;
    }
    Ok(out)
}
