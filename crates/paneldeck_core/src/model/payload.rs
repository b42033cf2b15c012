//! Contribution payloads and request-scoped producer input.

use crate::model::stat::StatDescriptor;
use crate::model::tab::TabDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One value produced by a contribution.
///
/// Renderable regions expect `Markup`; `tabs-registry` expects `Tabs`;
/// `stats-content` expects `Stats`. `Data` carries opaque values for
/// custom points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Markup(String),
    Tabs(Vec<TabDescriptor>),
    Stats(Vec<StatDescriptor>),
    Data(serde_json::Value),
}

impl Payload {
    pub fn markup(value: impl Into<String>) -> Self {
        Self::Markup(value.into())
    }

    /// Returns markup text, or `None` for non-renderable payloads.
    pub fn as_markup(&self) -> Option<&str> {
        match self {
            Self::Markup(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Request-scoped data handed to every producer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestScope {
    /// Detail record currently targeted, if any.
    pub detail_id: Option<u64>,
    /// Tab currently targeted, if any.
    pub tab_id: Option<String>,
    /// Free-form request parameters (query string, filters, paging).
    pub params: BTreeMap<String, String>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detail(mut self, detail_id: u64) -> Self {
        self.detail_id = Some(detail_id);
        self
    }

    pub fn with_tab(mut self, tab_id: impl Into<String>) -> Self {
        self.tab_id = Some(tab_id.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{Payload, RequestScope};

    #[test]
    fn only_markup_is_renderable() {
        assert_eq!(Payload::markup("<b>x</b>").as_markup(), Some("<b>x</b>"));
        assert_eq!(Payload::Data(serde_json::json!({"a": 1})).as_markup(), None);
        assert_eq!(Payload::Tabs(vec![]).as_markup(), None);
    }

    #[test]
    fn scope_builder_sets_fields() {
        let scope = RequestScope::new()
            .with_detail(42)
            .with_tab("membership")
            .with_param("paged", "2");
        assert_eq!(scope.detail_id, Some(42));
        assert_eq!(scope.tab_id.as_deref(), Some("membership"));
        assert_eq!(scope.param("paged"), Some("2"));
        assert_eq!(scope.param("orderby"), None);
    }
}
