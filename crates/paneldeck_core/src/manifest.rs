//! Declarative dashboard manifest.
//!
//! # Responsibility
//! - Describe one context, its tabs, stats, static region markup and inline
//!   templates as a JSON document.
//! - Validate the document and install it as static producers.
//!
//! # Invariants
//! - `install` validates first; a rejected manifest registers nothing.
//! - Region keys are limited to the renderable named points.

use crate::context::ContextDescriptor;
use crate::error::ConfigurationError;
use crate::extension::{
    canonical_mode, Contribution, ExtensionPoint, ExtensionRegistry, ResolutionMode,
};
use crate::model::payload::Payload;
use crate::model::stat::StatDescriptor;
use crate::model::tab::{TabDescriptor, TabSet};
use crate::render::InMemoryTemplates;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Producer id used for every manifest contribution.
pub const MANIFEST_PRODUCER: &str = "manifest";

/// Context section of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextManifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub has_stats: bool,
    #[serde(default)]
    pub has_tabs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_link_namespace: Option<String>,
}

/// One dashboard page as a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardManifest {
    pub context: ContextManifest,
    #[serde(default)]
    pub tabs: Vec<TabDescriptor>,
    #[serde(default)]
    pub stats: Vec<StatDescriptor>,
    /// Static markup per region key, in display order.
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<String>>,
    /// Static content of deferred tabs, served by the tab endpoint.
    #[serde(default)]
    pub tab_content: BTreeMap<String, String>,
    /// Inline tab templates by name.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

impl DashboardManifest {
    /// Parses a manifest document.
    ///
    /// # Errors
    /// - `InvalidManifest` when the JSON does not match the manifest shape.
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(raw).map_err(|err| ConfigurationError::InvalidManifest(err.to_string()))
    }

    /// Builds the context descriptor declared by the manifest.
    pub fn context_descriptor(&self) -> Result<ContextDescriptor, ConfigurationError> {
        let section = &self.context;
        let mut builder = ContextDescriptor::builder(section.id.as_str())
            .with_stats(section.has_stats)
            .with_tabs(section.has_tabs);
        if let Some(title) = &section.title {
            builder = builder.title(title.as_str());
        }
        if let Some(action) = &section.detail_action {
            builder = builder.detail_action(action.as_str());
        }
        if let Some(action) = &section.tab_action {
            builder = builder.tab_action(action.as_str());
        }
        if let Some(action) = &section.stats_action {
            builder = builder.stats_action(action.as_str());
        }
        if let Some(namespace) = &section.deep_link_namespace {
            builder = builder.deep_link_namespace(namespace.as_str());
        }
        builder.build()
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let context = self.context_descriptor()?;

        if !context.has_tabs() && !self.tabs.is_empty() {
            return Err(invalid(format!(
                "context `{}` declares tabs but has_tabs is false",
                context.id()
            )));
        }
        if !context.has_stats() && !self.stats.is_empty() {
            return Err(invalid(format!(
                "context `{}` declares stats but has_stats is false",
                context.id()
            )));
        }

        let tabs = TabSet::new(context.id(), self.tabs.clone())?;

        let mut stat_ids = BTreeSet::<&str>::new();
        for stat in &self.stats {
            if stat.id.trim().is_empty() {
                return Err(invalid("stat id must not be empty".to_string()));
            }
            if !stat_ids.insert(stat.id.as_str()) {
                return Err(invalid(format!("stat id `{}` declared twice", stat.id)));
            }
        }

        for (key, fragments) in &self.regions {
            let point = region_point(key)
                .ok_or_else(|| invalid(format!("unknown region `{key}`")))?;
            if canonical_mode(&point.key()) == Some(ResolutionMode::FirstWins) && fragments.len() > 1 {
                return Err(invalid(format!(
                    "region `{key}` is first-wins and accepts one fragment"
                )));
            }
        }

        for tab_id in self.tab_content.keys() {
            match tabs.get(tab_id) {
                Some(tab) if tab.is_deferred() => {}
                Some(_) => {
                    return Err(invalid(format!(
                        "tab content for `{tab_id}` but the tab is inline"
                    )))
                }
                None => return Err(invalid(format!("tab content for unknown tab `{tab_id}`"))),
            }
        }
        Ok(())
    }

    /// Validates, then registers every declaration as a static producer.
    ///
    /// Returns the declared context.
    pub fn install(
        &self,
        registry: &mut ExtensionRegistry,
    ) -> Result<ContextDescriptor, ConfigurationError> {
        self.validate()?;
        let context = self.context_descriptor()?;
        let context_id = context.id();

        if !self.tabs.is_empty() {
            registry.register(
                &ExtensionPoint::TabsRegistry,
                context_id,
                ResolutionMode::CollectAll,
                Contribution::fixed(MANIFEST_PRODUCER, 0, Payload::Tabs(self.tabs.clone())),
            )?;
        }
        if !self.stats.is_empty() {
            registry.register(
                &ExtensionPoint::StatsContent,
                context_id,
                ResolutionMode::CollectAll,
                Contribution::fixed(MANIFEST_PRODUCER, 0, Payload::Stats(self.stats.clone())),
            )?;
        }

        let mut region_count = 0usize;
        for (key, fragments) in &self.regions {
            let Some(point) = region_point(key) else {
                continue;
            };
            let mode = canonical_mode(&point.key()).unwrap_or(ResolutionMode::CollectAll);
            for (index, fragment) in fragments.iter().enumerate() {
                registry.register(
                    &point,
                    context_id,
                    mode,
                    Contribution::fixed(
                        MANIFEST_PRODUCER,
                        priority_of(index),
                        Payload::markup(fragment.as_str()),
                    ),
                )?;
                region_count += 1;
            }
        }

        for (tab_id, content) in &self.tab_content {
            registry.register(
                &ExtensionPoint::TabContent(tab_id.clone()),
                context_id,
                ResolutionMode::FirstWins,
                Contribution::fixed(MANIFEST_PRODUCER, 0, Payload::markup(content.as_str())),
            )?;
        }

        info!(
            "event=manifest_install module=manifest status=ok context={} tabs={} stats={} fragments={} templates={}",
            context_id,
            self.tabs.len(),
            self.stats.len(),
            region_count,
            self.templates.len()
        );
        Ok(context)
    }

    /// Inline templates as a template store.
    pub fn templates(&self) -> InMemoryTemplates {
        self.templates
            .iter()
            .fold(InMemoryTemplates::new(), |store, (name, body)| {
                store.with(name.as_str(), body.as_str())
            })
    }
}

fn region_point(key: &str) -> Option<ExtensionPoint> {
    match key {
        "header-title" => Some(ExtensionPoint::HeaderTitle),
        "header-actions" => Some(ExtensionPoint::HeaderActions),
        "filters-content" => Some(ExtensionPoint::FiltersContent),
        "list-body" => Some(ExtensionPoint::ListBody),
        "detail-header" => Some(ExtensionPoint::DetailHeader),
        _ => None,
    }
}

fn priority_of(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn invalid(details: String) -> ConfigurationError {
    ConfigurationError::InvalidManifest(details)
}

#[cfg(test)]
mod tests {
    use super::DashboardManifest;
    use crate::error::ConfigurationError;
    use crate::extension::{ExtensionPoint, ExtensionRegistry};
    use crate::model::payload::RequestScope;
    use crate::render::RenderOrchestrator;

    const CUSTOMER: &str = r#"{
        "context": { "id": "customer", "title": "Customers", "has_stats": true, "has_tabs": true },
        "tabs": [
            { "id": "membership", "title": "Membership", "priority": 20, "source": "deferred" },
            { "id": "details", "title": "Details", "priority": 10, "source": "inline", "template": "customer/details" }
        ],
        "stats": [
            { "id": "total", "label": "Total", "priority": 10 },
            { "id": "active", "label": "Active", "priority": 20 }
        ],
        "regions": {
            "header-actions": ["<button>Export</button>", "<button>Import</button>"],
            "list-body": ["<table></table>"]
        },
        "tab_content": { "membership": "<p>gold</p>" },
        "templates": { "customer/details": "<dl></dl>" }
    }"#;

    #[test]
    fn parses_and_installs_customer_manifest() {
        let manifest = DashboardManifest::from_json(CUSTOMER).expect("manifest parses");
        let mut registry = ExtensionRegistry::new();
        let context = manifest.install(&mut registry).expect("install");
        assert_eq!(context.id(), "customer");
        assert_eq!(context.title(), "Customers");
        assert_eq!(
            registry.producers(&ExtensionPoint::HeaderActions, "customer"),
            vec!["manifest", "manifest"]
        );

        let templates = manifest.templates();
        let orchestrator = RenderOrchestrator::new(&registry, &templates);
        let page = orchestrator
            .render_page(&context, &RequestScope::new())
            .expect("render");
        assert_eq!(
            page.header_actions.markup(),
            vec!["<button>Export</button>", "<button>Import</button>"]
        );
        let tabs = page.tabs.expect("tabs");
        assert_eq!(tabs.active_tab_id(), Some("details"));
        assert_eq!(page.stats.map(|stats| stats.len()), Some(2));

        let envelope = orchestrator.render_tab_content(&context, "membership", &RequestScope::new());
        assert_eq!(
            envelope.into_result().expect("tab content"),
            serde_json::json!("<p>gold</p>")
        );
    }

    #[test]
    fn rejects_unknown_region_and_unknown_fields() {
        let mut manifest = DashboardManifest::from_json(CUSTOMER).expect("manifest parses");
        manifest
            .regions
            .insert("sidebar".to_string(), vec!["<nav/>".to_string()]);
        let err = manifest.validate().expect_err("unknown region");
        assert!(matches!(err, ConfigurationError::InvalidManifest(ref msg) if msg.contains("sidebar")));

        let err = DashboardManifest::from_json(r#"{ "context": { "id": "x" }, "widgets": [] }"#)
            .expect_err("unknown field");
        assert!(matches!(err, ConfigurationError::InvalidManifest(_)));
    }

    #[test]
    fn rejected_manifest_registers_nothing() {
        let mut manifest = DashboardManifest::from_json(CUSTOMER).expect("manifest parses");
        manifest
            .regions
            .insert("list-body".to_string(), vec!["<a/>".to_string(), "<b/>".to_string()]);
        let mut registry = ExtensionRegistry::new();
        manifest.install(&mut registry).expect_err("first-wins region");
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_tab_ids_surface_configuration_error() {
        let raw = r#"{
            "context": { "id": "customer", "has_tabs": true },
            "tabs": [
                { "id": "notes", "title": "Notes", "source": "deferred" },
                { "id": "notes", "title": "More notes", "source": "deferred" }
            ]
        }"#;
        let manifest = DashboardManifest::from_json(raw).expect("manifest parses");
        assert!(matches!(
            manifest.validate(),
            Err(ConfigurationError::DuplicateTabId { .. })
        ));
    }

    #[test]
    fn tab_content_must_target_deferred_tab() {
        let mut manifest = DashboardManifest::from_json(CUSTOMER).expect("manifest parses");
        manifest
            .tab_content
            .insert("details".to_string(), "<p/>".to_string());
        assert!(matches!(
            manifest.validate(),
            Err(ConfigurationError::InvalidManifest(_))
        ));
    }

    #[test]
    fn empty_context_id_is_rejected() {
        let manifest =
            DashboardManifest::from_json(r#"{ "context": { "id": "  " } }"#).expect("parses");
        assert_eq!(manifest.validate(), Err(ConfigurationError::EmptyContextId));
    }
}
