//! Tab descriptors and the validated, priority-ordered tab set.
//!
//! # Invariants
//! - Tab ids are unique within one `TabSet`.
//! - `TabSet` iteration order is ascending priority, ties by input order.
//! - Inline content and deferred fetching are one abstraction: the
//!   `TabSource` tag decides which path a tab takes.

use crate::error::{is_valid_tab_id, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a tab's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TabSource {
    /// Rendered synchronously from a named template.
    Inline { template: String },
    /// Empty container populated by a client fetch on first activation.
    Deferred,
}

/// One tab contributed to a context's detail pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(flatten)]
    pub source: TabSource,
}

impl TabDescriptor {
    pub fn inline(
        id: impl Into<String>,
        title: impl Into<String>,
        priority: i32,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority,
            source: TabSource::Inline {
                template: template.into(),
            },
        }
    }

    pub fn deferred(id: impl Into<String>, title: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority,
            source: TabSource::Deferred,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.source, TabSource::Deferred)
    }
}

/// Validated, priority-ordered tabs for one context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSet {
    tabs: Vec<TabDescriptor>,
}

impl TabSet {
    /// Validates ids and sorts by priority.
    ///
    /// # Errors
    /// - `InvalidTabId` when an id is empty or not fragment-safe.
    /// - `DuplicateTabId` when two descriptors share an id.
    pub fn new(context: &str, mut tabs: Vec<TabDescriptor>) -> Result<Self, ConfigurationError> {
        let mut seen = BTreeSet::<&str>::new();
        for tab in &tabs {
            if !is_valid_tab_id(tab.id.as_str()) {
                return Err(ConfigurationError::InvalidTabId(tab.id.clone()));
            }
            if !seen.insert(tab.id.as_str()) {
                return Err(ConfigurationError::DuplicateTabId {
                    context: context.to_string(),
                    tab_id: tab.id.clone(),
                });
            }
        }
        tabs.sort_by_key(|tab| tab.priority);
        Ok(Self { tabs })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabDescriptor> {
        self.tabs.iter()
    }

    /// Highest-priority tab.
    pub fn first(&self) -> Option<&TabDescriptor> {
        self.tabs.first()
    }

    pub fn get(&self, tab_id: &str) -> Option<&TabDescriptor> {
        self.tabs.iter().find(|tab| tab.id == tab_id)
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.get(tab_id).is_some()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.tabs.iter().map(|tab| tab.id.as_str()).collect()
    }

    /// Returns the tab `offset` positions away from `tab_id`, wrapping at
    /// both ends. Falls back to the first tab when `tab_id` is unknown.
    pub fn adjacent(&self, tab_id: &str, offset: isize) -> Option<&TabDescriptor> {
        if self.tabs.is_empty() {
            return None;
        }
        let Some(position) = self.tabs.iter().position(|tab| tab.id == tab_id) else {
            return self.first();
        };
        let len = self.tabs.len() as isize;
        let target = (position as isize + offset).rem_euclid(len);
        self.tabs.get(target as usize)
    }

    pub fn last(&self) -> Option<&TabDescriptor> {
        self.tabs.last()
    }
}

#[cfg(test)]
mod tests {
    use super::{TabDescriptor, TabSet, TabSource};
    use crate::error::ConfigurationError;

    fn customer_tabs() -> TabSet {
        TabSet::new(
            "customer",
            vec![
                TabDescriptor::deferred("membership", "Membership", 20),
                TabDescriptor::inline("details", "Details", 10, "customer/details"),
                TabDescriptor::deferred("orders", "Orders", 30),
            ],
        )
        .expect("valid tab set")
    }

    #[test]
    fn sorts_by_priority() {
        assert_eq!(customer_tabs().ids(), vec!["details", "membership", "orders"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = TabSet::new(
            "customer",
            vec![
                TabDescriptor::deferred("notes", "Notes", 10),
                TabDescriptor::deferred("notes", "More notes", 20),
            ],
        )
        .expect_err("duplicate id must fail");
        assert_eq!(
            err,
            ConfigurationError::DuplicateTabId {
                context: "customer".to_string(),
                tab_id: "notes".to_string(),
            }
        );
    }

    #[test]
    fn rejects_fragment_unsafe_ids() {
        let err = TabSet::new("customer", vec![TabDescriptor::deferred("a&b", "A", 0)])
            .expect_err("unsafe id must fail");
        assert!(matches!(err, ConfigurationError::InvalidTabId(_)));
    }

    #[test]
    fn adjacent_wraps_both_ways() {
        let tabs = customer_tabs();
        assert_eq!(tabs.adjacent("orders", 1).map(|t| t.id.as_str()), Some("details"));
        assert_eq!(tabs.adjacent("details", -1).map(|t| t.id.as_str()), Some("orders"));
        assert_eq!(
            tabs.adjacent("details", 1).map(|t| t.id.as_str()),
            Some("membership")
        );
        assert!(TabSet::empty().adjacent("details", 1).is_none());
    }

    #[test]
    fn serde_uses_source_tag() {
        let json = serde_json::json!({
            "id": "details",
            "title": "Details",
            "priority": 10,
            "source": "inline",
            "template": "customer/details"
        });
        let tab: TabDescriptor = serde_json::from_value(json).expect("inline tab decodes");
        assert_eq!(
            tab.source,
            TabSource::Inline {
                template: "customer/details".to_string()
            }
        );

        let deferred: TabDescriptor = serde_json::from_value(serde_json::json!({
            "id": "membership",
            "title": "Membership",
            "source": "deferred"
        }))
        .expect("deferred tab decodes");
        assert!(deferred.is_deferred());
        assert_eq!(deferred.priority, 0);
    }
}
