//! Server-side page assembly.
//!
//! # Responsibility
//! - Resolve every page region through the extension registry and embed
//!   the ordered payloads.
//! - Lay out tabs in priority order: inline tabs from the template store,
//!   deferred tabs as empty containers.
//! - Serve per-tab content for deferred tab fetches.
//!
//! # Invariants
//! - Rendering holds no mutable state; one call per request.
//! - Only tab configuration errors abort a render. A failing producer or a
//!   missing inline template is contained in its own region or tab.
//!
//! # See also
//! - `crate::client::tabs` for the fetch side of deferred tabs.

use crate::context::ContextDescriptor;
use crate::error::ConfigurationError;
use crate::extension::{resolve_stats, resolve_tabs, ExtensionPoint, ExtensionRegistry};
use crate::model::payload::{Payload, RequestScope};
use crate::model::stat::StatDescriptor;
use crate::model::tab::{TabSet, TabSource};
use crate::navigation::{DeepLink, NavigationResolver};
use crate::render::markup::escape;
use crate::render::page::{Fragment, Region, RenderedPage, TabBody, TabPane, TabsRegion};
use crate::transport::TabEnvelope;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

const TITLE_FALLBACK_PRODUCER: &str = "context";

/// Lookup of inline tab templates by name.
pub trait TemplateStore {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Template store backed by a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTemplates {
    templates: BTreeMap<String, String>,
}

impl InMemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn with(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(name, body);
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for InMemoryTemplates {
    fn lookup(&self, name: &str) -> Option<String> {
        self.templates.get(name).cloned()
    }
}

/// Assembles page skeletons over a read-only registry.
pub struct RenderOrchestrator<'a> {
    registry: &'a ExtensionRegistry,
    templates: &'a dyn TemplateStore,
}

impl<'a> RenderOrchestrator<'a> {
    pub fn new(registry: &'a ExtensionRegistry, templates: &'a dyn TemplateStore) -> Self {
        Self {
            registry,
            templates,
        }
    }

    /// Renders the page for `context`.
    ///
    /// The first tab is active unless `scope.tab_id` names a registered tab.
    ///
    /// # Errors
    /// - Tab or stat configuration errors from `tabs-registry` and
    ///   `stats-content` contributions.
    pub fn render_page(
        &self,
        context: &ContextDescriptor,
        scope: &RequestScope,
    ) -> Result<RenderedPage, ConfigurationError> {
        let tabs = resolve_tabs(self.registry, context, scope)?;
        let stats = resolve_stats(self.registry, context, scope)?;
        Ok(self.assemble(context, scope, &tabs, stats, None))
    }

    /// Renders the page a location fragment points at.
    ///
    /// A valid deep link fills the scope's detail and tab; anything else
    /// renders the default page.
    ///
    /// # Errors
    /// - Tab or stat configuration errors from `tabs-registry` and
    ///   `stats-content` contributions.
    pub fn render_location(
        &self,
        context: &ContextDescriptor,
        fragment: &str,
        scope: &RequestScope,
    ) -> Result<RenderedPage, ConfigurationError> {
        let tabs = resolve_tabs(self.registry, context, scope)?;
        let stats = resolve_stats(self.registry, context, scope)?;
        let link = NavigationResolver::new(context).resolve(fragment, &tabs);
        let mut scope = scope.clone();
        if let Some(link) = &link {
            scope.detail_id = Some(link.detail_id);
            scope.tab_id = link.tab_id.clone();
        }
        Ok(self.assemble(context, &scope, &tabs, stats, link))
    }

    /// Content of one tab for a client fetch.
    ///
    /// Inline tabs answer from the template store; deferred tabs resolve
    /// their `per-tab-content` point. Anything unresolvable is the
    /// "could not load tab content" failure envelope.
    pub fn render_tab_content(
        &self,
        context: &ContextDescriptor,
        tab_id: &str,
        scope: &RequestScope,
    ) -> TabEnvelope {
        let tabs = match resolve_tabs(self.registry, context, scope) {
            Ok(tabs) => tabs,
            Err(err) => {
                warn!(
                    "event=tab_content_failed module=render status=error context={} tab_id={} reason={}",
                    context.id(),
                    tab_id,
                    err
                );
                return TabEnvelope::not_found();
            }
        };
        let Some(tab) = tabs.get(tab_id) else {
            debug!(
                "event=tab_content_failed module=render status=skipped context={} tab_id={} reason=unknown_tab",
                context.id(),
                tab_id
            );
            return TabEnvelope::not_found();
        };

        match &tab.source {
            TabSource::Inline { template } => match self.templates.lookup(template) {
                Some(body) => TabEnvelope::success(Value::String(body)),
                None => {
                    warn!(
                        "event=tab_content_failed module=render status=error context={} tab_id={} reason=template_missing template={}",
                        context.id(),
                        tab_id,
                        template
                    );
                    TabEnvelope::not_found()
                }
            },
            TabSource::Deferred => {
                let scope = scope.clone().with_tab(tab_id);
                let point = ExtensionPoint::TabContent(tab_id.to_string());
                match self.registry.resolve(&point, context, &scope).into_iter().next() {
                    Some(Payload::Markup(html)) => TabEnvelope::success(Value::String(html)),
                    Some(Payload::Data(value)) => TabEnvelope::success(value),
                    Some(_) => {
                        warn!(
                            "event=contribution_ignored module=render status=skipped point={} context={} reason=unexpected_payload",
                            point,
                            context.id()
                        );
                        TabEnvelope::not_found()
                    }
                    None => TabEnvelope::not_found(),
                }
            }
        }
    }

    fn assemble(
        &self,
        context: &ContextDescriptor,
        scope: &RequestScope,
        tabs: &TabSet,
        stats: Vec<StatDescriptor>,
        deep_link: Option<DeepLink>,
    ) -> RenderedPage {
        let started_at = Instant::now();

        let mut header_title = self.region(&ExtensionPoint::HeaderTitle, context, scope);
        if header_title.markup().is_empty() {
            header_title.fragments.insert(
                0,
                Fragment::Markup {
                    producer: TITLE_FALLBACK_PRODUCER.to_string(),
                    html: escape(context.title()),
                },
            );
        }

        let page = RenderedPage {
            context_id: context.id().to_string(),
            namespace: context.deep_link_namespace().to_string(),
            header_title,
            header_actions: self.region(&ExtensionPoint::HeaderActions, context, scope),
            stats: context.has_stats().then_some(stats),
            filters: self.region(&ExtensionPoint::FiltersContent, context, scope),
            list_body: self.region(&ExtensionPoint::ListBody, context, scope),
            detail_header: self.region(&ExtensionPoint::DetailHeader, context, scope),
            tabs: context
                .has_tabs()
                .then(|| self.tabs_region(context, scope, tabs)),
            deep_link,
        };

        info!(
            "event=render_complete module=render status=ok context={} tabs={} stats={} errors={} duration_ms={}",
            context.id(),
            tabs.len(),
            page.stats.as_ref().map_or(0, Vec::len),
            page.error_count(),
            started_at.elapsed().as_millis()
        );
        page
    }

    fn region(
        &self,
        point: &ExtensionPoint,
        context: &ContextDescriptor,
        scope: &RequestScope,
    ) -> Region {
        let resolution = self.registry.resolve_with_report(point, context, scope);
        let mut region = Region::new(point.key());
        for entry in resolution.entries {
            match entry.payload {
                Payload::Markup(html) => region.fragments.push(Fragment::Markup {
                    producer: entry.producer,
                    html,
                }),
                _ => {
                    warn!(
                        "event=contribution_ignored module=render status=skipped point={} context={} producer={} reason=not_markup",
                        point,
                        context.id(),
                        entry.producer
                    );
                    region.fragments.push(Fragment::Malformed {
                        producer: entry.producer,
                    });
                }
            }
        }
        for failure in resolution.failures {
            region.fragments.push(Fragment::Failed {
                producer: failure.producer().to_string(),
            });
        }
        region
    }

    fn tabs_region(
        &self,
        context: &ContextDescriptor,
        scope: &RequestScope,
        tabs: &TabSet,
    ) -> TabsRegion {
        let active = scope
            .tab_id
            .as_deref()
            .filter(|tab_id| tabs.contains(tab_id))
            .or_else(|| tabs.first().map(|tab| tab.id.as_str()));

        let panes = tabs
            .iter()
            .map(|tab| {
                let body = match &tab.source {
                    TabSource::Inline { template } => match self.templates.lookup(template) {
                        Some(content) => TabBody::Inline(content),
                        None => {
                            warn!(
                                "event=tab_content_missing module=render status=error context={} tab_id={} template={}",
                                context.id(),
                                tab.id,
                                template
                            );
                            TabBody::Missing {
                                template: template.clone(),
                            }
                        }
                    },
                    TabSource::Deferred => TabBody::Deferred,
                };
                TabPane {
                    active: active == Some(tab.id.as_str()),
                    tab: tab.clone(),
                    body,
                }
            })
            .collect();
        TabsRegion { panes }
    }
}
