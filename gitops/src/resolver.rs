use impact_defs::{
    AttributedChange, AttributionReason, ChangeRecord, LayoutAmbiguity, ResolutionOutcome,
};
use impact_utils::parent_dir;

use crate::catalog::{Catalog, CatalogBuild};

struct Resolver<'a> {
    catalog: &'a Catalog,
    outcome: ResolutionOutcome,
}

impl<'a> Resolver<'a> {
    /// Finds the Application owning `path`: the file itself is a definition, or
    /// it sits directly in a declared source directory. The first check wins.
    fn owner(&mut self, path: &str) -> Option<(String, AttributionReason)> {
        let catalog = self.catalog;
        let directory = parent_dir(path);
        let by_directory = catalog.owner_of_directory(&directory);

        if let Some(record) = catalog.definition(path) {
            let definition = record.definition_path.clone();
            if let Some(shadowed) = by_directory.filter(|owner| *owner != definition) {
                self.note_ambiguity(&definition, shadowed.to_string());
            }
            return Some((definition, AttributionReason::Definition));
        }

        by_directory.map(|owner| (owner.to_string(), AttributionReason::Resource))
    }

    fn note_ambiguity(&mut self, definition: &str, shadowed: String) {
        if self.outcome.ambiguities.iter().any(|a| a.path == definition) {
            return;
        }
        log::warn!(
            "{} is an Application definition inside the source directory of {}, attributing it to itself",
            definition,
            shadowed
        );
        self.outcome.ambiguities.push(LayoutAmbiguity {
            path: definition.to_string(),
            definition: definition.to_string(),
            shadowed,
        });
    }

    fn attribute(&mut self, definition: String, change: &ChangeRecord, reason: AttributionReason) {
        let name = self
            .catalog
            .application_name(&definition)
            .unwrap_or("<unnamed>");
        match reason {
            AttributionReason::Definition => log::info!("Application changed: {}", name),
            AttributionReason::Resource => log::info!("Resource changed: {} ({})", name, change),
            AttributionReason::RenameSource => {
                log::info!("Resource moved out of: {} ({})", name, change)
            }
        }

        let entries = self.outcome.resolved.entry(definition).or_default();
        if !entries.iter().any(|e| e.change == *change) {
            entries.push(AttributedChange {
                change: change.clone(),
                reason,
            });
        }
    }

    fn unresolved(&mut self, change: &ChangeRecord) {
        log::error!(
            "!! No application matched for path: {} ({})",
            parent_dir(change.lookup_path()),
            change
        );
        self.outcome.unresolved.push(change.clone());
    }

    fn resolve_change(&mut self, change: &ChangeRecord) {
        let owner = self.owner(change.lookup_path());

        // The vacated side of a rename counts as a removal from its previous owner.
        let previous = match change {
            ChangeRecord::Renamed { from, .. } => self.owner(from),
            _ => None,
        };

        match &owner {
            Some((definition, reason)) => self.attribute(definition.clone(), change, *reason),
            None => self.unresolved(change),
        }
        if let Some((previous_definition, _)) = previous {
            let same_owner = owner
                .as_ref()
                .is_some_and(|(definition, _)| *definition == previous_definition);
            if !same_owner {
                self.attribute(previous_definition, change, AttributionReason::RenameSource);
            }
        }
    }
}

/// Maps every change to the Application(s) it implicates. Pure: the outcome
/// depends only on `changes` and `build`.
pub fn resolve(changes: &[ChangeRecord], build: &CatalogBuild) -> ResolutionOutcome {
    log::info!("--- Start mapping changes ---");
    let mut resolver = Resolver {
        catalog: &build.catalog,
        outcome: ResolutionOutcome {
            conflicts: build.conflicts.clone(),
            ..ResolutionOutcome::default()
        },
    };
    for change in changes {
        resolver.resolve_change(change);
    }
    resolver.outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use impact_defs::{ApplicationRecord, SourceKind};
    use pretty_assertions::assert_eq;

    fn external(def: &str, dir: &str) -> ApplicationRecord {
        ApplicationRecord {
            definition_path: def.to_string(),
            name: Some(def.trim_end_matches(".yaml").to_string()),
            source_kind: SourceKind::ExternalPath,
            source_path: Some(dir.to_string()),
        }
    }

    fn inline(def: &str) -> ApplicationRecord {
        ApplicationRecord {
            definition_path: def.to_string(),
            name: Some(def.trim_end_matches(".yaml").to_string()),
            source_kind: SourceKind::InlineTemplated,
            source_path: None,
        }
    }

    fn modified(path: &str) -> ChangeRecord {
        ChangeRecord::Modified {
            path: path.to_string(),
        }
    }

    fn added(path: &str) -> ChangeRecord {
        ChangeRecord::Added {
            to: path.to_string(),
        }
    }

    fn renamed(from: &str, to: &str) -> ChangeRecord {
        ChangeRecord::Renamed {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_definition_and_resource_attribution() {
        let build = Catalog::from_records(vec![external("appA.yaml", "res/a"), inline("appB.yaml")]);
        let changes = vec![
            modified("res/a/deployment.yaml"),
            modified("appB.yaml"),
            added("res/b/new.yaml"),
        ];
        let outcome = resolve(&changes, &build);

        assert_eq!(outcome.changes_for("appA.yaml"), vec![&changes[0]]);
        assert_eq!(outcome.changes_for("appB.yaml"), vec![&changes[1]]);
        assert_eq!(
            outcome.resolved["appA.yaml"][0].reason,
            AttributionReason::Resource
        );
        assert_eq!(
            outcome.resolved["appB.yaml"][0].reason,
            AttributionReason::Definition
        );
        assert_eq!(outcome.unresolved, vec![changes[2].clone()]);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_containment_is_exact_directory() {
        let build = Catalog::from_records(vec![
            external("foo-manifests.yaml", "apps/foo/manifests"),
            external("foo.yaml", "apps/foo"),
        ]);
        let changes = vec![modified("apps/foo/manifests/deploy.yaml")];
        let outcome = resolve(&changes, &build);

        assert_eq!(
            outcome.affected_applications().collect::<Vec<_>>(),
            vec!["foo-manifests.yaml"]
        );
    }

    #[test]
    fn test_descendant_of_source_directory_is_unresolved() {
        let build = Catalog::from_records(vec![external("foo.yaml", "apps/foo")]);
        let changes = vec![modified("apps/foo/nested/deploy.yaml")];
        let outcome = resolve(&changes, &build);
        assert!(outcome.resolved.is_empty());
        assert_eq!(outcome.unresolved.len(), 1);
    }

    #[test]
    fn test_direct_hit_wins_over_containment() {
        // root.yaml deploys `apps`, and apps/child.yaml is itself an Application.
        let build = Catalog::from_records(vec![
            external("root.yaml", "apps"),
            external("apps/child.yaml", "child"),
        ]);
        let changes = vec![modified("apps/child.yaml"), modified("apps/child.yaml")];
        let outcome = resolve(&changes, &build);

        assert_eq!(
            outcome.affected_applications().collect::<Vec<_>>(),
            vec!["apps/child.yaml"]
        );
        assert_eq!(outcome.changes_for("apps/child.yaml").len(), 1);
        assert_eq!(
            outcome.ambiguities,
            vec![LayoutAmbiguity {
                path: "apps/child.yaml".to_string(),
                definition: "apps/child.yaml".to_string(),
                shadowed: "root.yaml".to_string(),
            }]
        );
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_deleted_resource_uses_last_location() {
        let build = Catalog::from_records(vec![external("appA.yaml", "res/a")]);
        let changes = vec![ChangeRecord::Deleted {
            from: "res/a/old.yaml".to_string(),
        }];
        let outcome = resolve(&changes, &build);
        assert_eq!(outcome.changes_for("appA.yaml"), vec![&changes[0]]);
    }

    #[test]
    fn test_rename_between_applications_registers_both() {
        let build = Catalog::from_records(vec![
            external("appA.yaml", "res/a"),
            external("appB.yaml", "res/b"),
        ]);
        let changes = vec![renamed("res/a/cm.yaml", "res/b/cm.yaml")];
        let outcome = resolve(&changes, &build);

        assert_eq!(outcome.resolved["appB.yaml"][0].reason, AttributionReason::Resource);
        assert_eq!(
            outcome.resolved["appA.yaml"][0].reason,
            AttributionReason::RenameSource
        );
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_rename_within_one_application_registers_once() {
        let build = Catalog::from_records(vec![external("appA.yaml", "res/a")]);
        let changes = vec![renamed("res/a/old.yaml", "res/a/new.yaml")];
        let outcome = resolve(&changes, &build);
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved["appA.yaml"].len(), 1);
    }

    #[test]
    fn test_rename_into_orphan_directory() {
        let build = Catalog::from_records(vec![external("appA.yaml", "res/a")]);
        let changes = vec![renamed("res/a/cm.yaml", "orphan/cm.yaml")];
        let outcome = resolve(&changes, &build);

        assert_eq!(outcome.unresolved, changes);
        assert_eq!(
            outcome.resolved["appA.yaml"][0].reason,
            AttributionReason::RenameSource
        );
    }

    #[test]
    fn test_orphan_change_is_unresolved() {
        let build = Catalog::from_records(vec![external("appA.yaml", "res/a")]);
        let changes = vec![added("orphan/thing.yaml")];
        let outcome = resolve(&changes, &build);
        assert_eq!(outcome.unresolved, changes);
        assert_eq!(outcome.exit_code(), impact_defs::EXIT_UNCLEAN);
    }

    #[test]
    fn test_conflicts_are_carried_into_outcome() {
        let build = Catalog::from_records(vec![
            external("a.yaml", "shared/resources"),
            external("b.yaml", "shared/resources"),
        ]);
        let changes = vec![modified("shared/resources/cm.yaml")];
        let outcome = resolve(&changes, &build);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.changes_for("a.yaml").len(), 1);
        assert!(outcome.changes_for("b.yaml").is_empty());
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_top_level_source_directory() {
        let build = Catalog::from_records(vec![external("apps/root.yaml", ".")]);
        let changes = vec![modified("README.yaml")];
        let outcome = resolve(&changes, &build);
        assert_eq!(outcome.changes_for("apps/root.yaml").len(), 1);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let build = Catalog::from_records(vec![
            external("appA.yaml", "res/a"),
            inline("appB.yaml"),
            external("c.yaml", "res/a"),
        ]);
        let changes = vec![
            modified("res/a/x.yaml"),
            renamed("res/a/y.yaml", "res/z/y.yaml"),
            modified("appB.yaml"),
        ];
        assert_eq!(resolve(&changes, &build), resolve(&changes, &build));
    }
}
