//! Rendered page skeleton and its HTML serialization.
//!
//! # Invariants
//! - Text taken from descriptors (titles, labels, ids) is escaped; producer
//!   markup and inline templates are embedded as-is.
//! - Every failure stays inside the region or tab that produced it.

use crate::model::stat::StatDescriptor;
use crate::model::tab::{TabDescriptor, TabSource};
use crate::navigation::DeepLink;
use crate::render::markup::{error_fragment, escape};
use std::fmt::Write;

/// Region key of the detail tab strip and panes.
pub const REGION_TABS: &str = "tabs";

/// One entry of a rendered region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Markup contributed by `producer`.
    Markup { producer: String, html: String },
    /// Producer returned an error or panicked.
    Failed { producer: String },
    /// Producer contributed a payload the region cannot render.
    Malformed { producer: String },
}

impl Fragment {
    fn to_html(&self) -> String {
        match self {
            Self::Markup { html, .. } => html.clone(),
            Self::Failed { producer } => error_fragment("contribution-failed", producer),
            Self::Malformed { producer } => error_fragment("contribution-malformed", producer),
        }
    }
}

/// Ordered fragments of one page region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub key: String,
    pub fragments: Vec<Fragment>,
}

impl Region {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fragments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Markup fragments in resolution order.
    pub fn markup(&self) -> Vec<&str> {
        self.fragments
            .iter()
            .filter_map(|fragment| match fragment {
                Fragment::Markup { html, .. } => Some(html.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of failed or malformed contributions.
    pub fn error_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|fragment| !matches!(fragment, Fragment::Markup { .. }))
            .count()
    }

    fn inner_html(&self) -> String {
        self.fragments.iter().map(Fragment::to_html).collect()
    }
}

/// Rendered body of one tab pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabBody {
    /// Inline template content.
    Inline(String),
    /// Empty container filled by a client fetch.
    Deferred,
    /// Inline template could not be located.
    Missing { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabPane {
    pub tab: TabDescriptor,
    pub active: bool,
    pub body: TabBody,
}

/// Tab strip and panes of the detail region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabsRegion {
    pub panes: Vec<TabPane>,
}

impl TabsRegion {
    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.panes
            .iter()
            .find(|pane| pane.active)
            .map(|pane| pane.tab.id.as_str())
    }

    pub fn pane(&self, tab_id: &str) -> Option<&TabPane> {
        self.panes.iter().find(|pane| pane.tab.id == tab_id)
    }
}

/// Fully assembled page skeleton for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub context_id: String,
    pub namespace: String,
    pub header_title: Region,
    pub header_actions: Region,
    /// Stat placeholders; `None` when the context has no stats.
    pub stats: Option<Vec<StatDescriptor>>,
    pub filters: Region,
    pub list_body: Region,
    pub detail_header: Region,
    /// Tab strip; `None` when the context has no tabs.
    pub tabs: Option<TabsRegion>,
    /// Detail the page was rendered for, when reached through a deep link.
    pub deep_link: Option<DeepLink>,
}

impl RenderedPage {
    /// Total failed or malformed contributions across all regions.
    pub fn error_count(&self) -> usize {
        self.regions().iter().map(|region| region.error_count()).sum::<usize>()
            + self
                .tabs
                .iter()
                .flat_map(|tabs| tabs.panes.iter())
                .filter(|pane| matches!(pane.body, TabBody::Missing { .. }))
                .count()
    }

    pub fn regions(&self) -> [&Region; 5] {
        [
            &self.header_title,
            &self.header_actions,
            &self.filters,
            &self.list_body,
            &self.detail_header,
        ]
    }

    /// Serializes the skeleton with `data-region` markers for the client.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<div class=\"paneldeck\" data-context=\"{}\" data-namespace=\"{}\"",
            escape(&self.context_id),
            escape(&self.namespace)
        );
        if let Some(link) = &self.deep_link {
            let _ = write!(html, " data-open-detail=\"{}\"", link.detail_id);
        }
        html.push('>');

        html.push_str("<header class=\"paneldeck-header\">");
        push_region(&mut html, "h1", &self.header_title);
        push_region(&mut html, "div", &self.header_actions);
        html.push_str("</header>");

        if let Some(stats) = &self.stats {
            html.push_str("<section data-region=\"stats-content\">");
            for stat in stats {
                let _ = write!(
                    html,
                    "<div class=\"paneldeck-stat\" data-stat-id=\"{}\"><span class=\"paneldeck-stat-label\">{}</span><span class=\"paneldeck-stat-value\">0</span></div>",
                    escape(&stat.id),
                    escape(&stat.label)
                );
            }
            html.push_str("</section>");
        }

        push_region(&mut html, "div", &self.filters);
        push_region(&mut html, "div", &self.list_body);

        html.push_str("<aside class=\"paneldeck-detail\" data-region=\"detail\">");
        push_region(&mut html, "div", &self.detail_header);
        if let Some(tabs) = &self.tabs {
            push_tabs(&mut html, tabs);
        }
        html.push_str("</aside></div>");
        html
    }
}

fn push_region(html: &mut String, tag: &str, region: &Region) {
    let _ = write!(
        html,
        "<{tag} data-region=\"{}\">{}</{tag}>",
        escape(&region.key),
        region.inner_html()
    );
}

fn push_tabs(html: &mut String, tabs: &TabsRegion) {
    if tabs.is_empty() {
        let _ = write!(
            html,
            "<div data-region=\"{REGION_TABS}\" data-empty=\"tabs\"></div>"
        );
        return;
    }

    let _ = write!(html, "<div data-region=\"{REGION_TABS}\"><nav role=\"tablist\">");
    for pane in &tabs.panes {
        let _ = write!(
            html,
            "<button role=\"tab\" data-tab-id=\"{}\" aria-selected=\"{}\">{}</button>",
            escape(&pane.tab.id),
            pane.active,
            escape(&pane.tab.title)
        );
    }
    html.push_str("</nav>");

    for pane in &tabs.panes {
        let source = match pane.tab.source {
            TabSource::Inline { .. } => "inline",
            TabSource::Deferred => "deferred",
        };
        let _ = write!(
            html,
            "<div role=\"tabpanel\" data-tab-id=\"{}\" data-tab-source=\"{}\"",
            escape(&pane.tab.id),
            source
        );
        if pane.active {
            html.push_str(" data-active=\"true\"");
        } else {
            html.push_str(" hidden");
        }
        html.push('>');
        match &pane.body {
            TabBody::Inline(content) => html.push_str(content),
            TabBody::Deferred => {}
            TabBody::Missing { .. } => {
                html.push_str(&error_fragment("tab-content-missing", &pane.tab.id));
            }
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::{Fragment, Region, RenderedPage, TabBody, TabPane, TabsRegion};
    use crate::model::stat::StatDescriptor;
    use crate::model::tab::TabDescriptor;

    fn page(tabs: Option<TabsRegion>) -> RenderedPage {
        let mut title = Region::new("header-title");
        title.fragments.push(Fragment::Markup {
            producer: "context".to_string(),
            html: "Customers &amp; leads".to_string(),
        });
        let mut actions = Region::new("header-actions");
        actions.fragments.push(Fragment::Failed {
            producer: "broken".to_string(),
        });
        RenderedPage {
            context_id: "customer".to_string(),
            namespace: "customer".to_string(),
            header_title: title,
            header_actions: actions,
            stats: Some(vec![StatDescriptor::new("total", "Total <all>", 10)]),
            filters: Region::new("filters-content"),
            list_body: Region::new("list-body"),
            detail_header: Region::new("detail-header"),
            tabs,
            deep_link: None,
        }
    }

    #[test]
    fn empty_tab_set_emits_marker() {
        let html = page(Some(TabsRegion::default())).to_html();
        assert!(html.contains("data-empty=\"tabs\""));
        assert!(!html.contains("role=\"tablist\""));
    }

    #[test]
    fn stats_render_zero_placeholders_with_escaped_labels() {
        let html = page(None).to_html();
        assert!(html.contains("data-stat-id=\"total\""));
        assert!(html.contains("Total &lt;all&gt;"));
        assert!(html.contains("<span class=\"paneldeck-stat-value\">0</span>"));
        assert!(!html.contains("data-region=\"tabs\""));
    }

    #[test]
    fn failed_contribution_is_scoped_to_its_region() {
        let rendered = page(None);
        let html = rendered.to_html();
        assert!(html.contains(
            "<div data-region=\"header-actions\"><div class=\"paneldeck-error\" data-error=\"contribution-failed\""
        ));
        assert!(html.contains("<h1 data-region=\"header-title\">Customers &amp; leads</h1>"));
        assert_eq!(rendered.error_count(), 1);
    }

    #[test]
    fn tab_panes_carry_source_and_active_markers() {
        let tabs = TabsRegion {
            panes: vec![
                TabPane {
                    tab: TabDescriptor::inline("details", "Details", 10, "customer/details"),
                    active: true,
                    body: TabBody::Inline("<p>details</p>".to_string()),
                },
                TabPane {
                    tab: TabDescriptor::deferred("membership", "Membership", 20),
                    active: false,
                    body: TabBody::Deferred,
                },
                TabPane {
                    tab: TabDescriptor::inline("notes", "Notes", 30, "customer/notes"),
                    active: false,
                    body: TabBody::Missing {
                        template: "customer/notes".to_string(),
                    },
                },
            ],
        };
        assert_eq!(tabs.active_tab_id(), Some("details"));

        let html = page(Some(tabs)).to_html();
        assert!(html.contains(
            "data-tab-id=\"details\" data-tab-source=\"inline\" data-active=\"true\"><p>details</p></div>"
        ));
        assert!(html.contains(
            "data-tab-id=\"membership\" data-tab-source=\"deferred\" hidden></div>"
        ));
        assert!(html.contains("data-error=\"tab-content-missing\" data-subject=\"notes\""));
    }
}
