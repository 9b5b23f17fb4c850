use anyhow::Context;
use gitops::{
    classify_source, render_catalog_text, render_json, render_text, resolve, Catalog,
    CatalogBuild, CatalogConfig, GitPatchSource, JsonPatchSource, PatchSource,
};
use impact_defs::EXIT_UNCLEAN;

use crate::{CatalogArgs, OutputFormat, ResolveArgs};

fn catalog_config(args: &CatalogArgs) -> CatalogConfig {
    CatalogConfig {
        api_group: args.api_group.clone(),
        ..CatalogConfig::default()
    }
}

fn patch_source(args: &ResolveArgs) -> anyhow::Result<Box<dyn PatchSource + Send>> {
    match (&args.patches, &args.base) {
        (Some(file), _) => Ok(Box::new(JsonPatchSource::new(file))),
        (None, Some(base)) => Ok(Box::new(GitPatchSource::new(
            &args.catalog.repo,
            base,
            &args.head,
        ))),
        (None, None) => anyhow::bail!("Either --base or --patches is required"),
    }
}

async fn build_catalog(args: &CatalogArgs) -> anyhow::Result<CatalogBuild> {
    let repo = args.repo.clone();
    let config = catalog_config(args);
    let build = tokio::task::spawn_blocking(move || Catalog::build(&repo, &config)).await?;
    build.context("Failed to build the Application catalog")
}

/// Resolves the changes between two commits (or from a patch file) to the
/// Applications they affect. Returns the process exit code.
pub async fn handle_resolve(args: &ResolveArgs) -> anyhow::Result<i32> {
    let source = patch_source(args)?;

    // The change list and the catalog do not depend on each other.
    let diff_task = tokio::task::spawn_blocking(move || classify_source(source.as_ref()));
    let (build, changes) = tokio::try_join!(build_catalog(&args.catalog), async {
        diff_task.await.map_err(anyhow::Error::from)
    })?;
    let changes = changes.context("Failed to compute the change list")?;
    log::info!("{} changes to map", changes.len());

    let outcome = resolve(&changes, &build);

    match args.catalog.format {
        OutputFormat::Text => print!("{}", render_text(&outcome, &build)?),
        OutputFormat::Json => println!("{}", render_json(&outcome, &build)?),
    }

    if !outcome.unresolved.is_empty() {
        log::error!(
            "{} change(s) are not owned by any Application",
            outcome.unresolved.len()
        );
    }
    if !outcome.conflicts.is_empty() {
        log::error!(
            "{} director(y/ies) are claimed by more than one Application",
            outcome.conflicts.len()
        );
    }
    Ok(outcome.exit_code())
}

/// Prints the Application catalog of a working tree.
pub async fn handle_catalog(args: &CatalogArgs) -> anyhow::Result<i32> {
    let build = build_catalog(args).await?;

    match args.format {
        OutputFormat::Text => print!("{}", render_catalog_text(&build)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&build)?),
    }

    if build.conflicts.is_empty() {
        Ok(0)
    } else {
        Ok(EXIT_UNCLEAN)
    }
}
