//! Subcommand implementations. Each returns the text printed on stdout.

use anyhow::{anyhow, Context, Result};
use paneldeck_core::{
    ContextDescriptor, DashboardManifest, ExtensionRegistry, NavigationResolver,
    RenderOrchestrator, RequestScope,
};
use serde_json::json;
use std::fs;
use std::path::Path;

pub fn run_render(manifest_path: &Path, fragment: Option<&str>) -> Result<String> {
    let manifest = load_manifest(manifest_path)?;
    let mut registry = ExtensionRegistry::new();
    let context = manifest
        .install(&mut registry)
        .context("failed to install manifest")?;
    let templates = manifest.templates();
    let orchestrator = RenderOrchestrator::new(&registry, &templates);

    let scope = RequestScope::new();
    let page = match fragment {
        Some(fragment) => orchestrator.render_location(&context, fragment, &scope),
        None => orchestrator.render_page(&context, &scope),
    }
    .context("failed to render page")?;
    Ok(page.to_html())
}

pub fn run_tab_content(manifest_path: &Path, tab_id: &str, detail: Option<u64>) -> Result<String> {
    let manifest = load_manifest(manifest_path)?;
    let mut registry = ExtensionRegistry::new();
    let context = manifest
        .install(&mut registry)
        .context("failed to install manifest")?;
    let templates = manifest.templates();
    let orchestrator = RenderOrchestrator::new(&registry, &templates);

    let mut scope = RequestScope::new();
    if let Some(detail) = detail {
        scope = scope.with_detail(detail);
    }
    let envelope = orchestrator.render_tab_content(&context, tab_id, &scope);
    serde_json::to_string(&envelope).context("failed to encode tab envelope")
}

pub fn run_parse(namespace: &str, fragment: &str) -> Result<String> {
    let context = ContextDescriptor::builder(namespace)
        .build()
        .context("invalid context namespace")?;
    let resolver = NavigationResolver::new(&context);
    let link = resolver
        .parse_location(fragment)
        .map_err(|err| anyhow!("fragment `{fragment}` is not a deep link: {err}"))?;
    Ok(json!({
        "detail_id": link.detail_id,
        "tab_id": link.tab_id,
    })
    .to_string())
}

fn load_manifest(path: &Path) -> Result<DashboardManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    DashboardManifest::from_json(&raw)
        .with_context(|| format!("failed to parse manifest {}", path.display()))
}
