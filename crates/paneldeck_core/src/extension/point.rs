//! Extension point identifiers and resolution modes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Point key for the page header title.
pub const POINT_HEADER_TITLE: &str = "header-title";
/// Point key for header action buttons.
pub const POINT_HEADER_ACTIONS: &str = "header-actions";
/// Point key for statistic card descriptors.
pub const POINT_STATS_CONTENT: &str = "stats-content";
/// Point key for list filter controls.
pub const POINT_FILTERS_CONTENT: &str = "filters-content";
/// Point key for the paginated list body.
pub const POINT_LIST_BODY: &str = "list-body";
/// Point key for the detail pane header.
pub const POINT_DETAIL_HEADER: &str = "detail-header";
/// Point key for tab descriptors.
pub const POINT_TABS_REGISTRY: &str = "tabs-registry";
/// Key prefix for per-tab content; the tab id follows the colon.
pub const POINT_TAB_CONTENT_PREFIX: &str = "per-tab-content:";

const NAMED_POINTS: &[(&str, ResolutionMode)] = &[
    (POINT_HEADER_TITLE, ResolutionMode::FirstWins),
    (POINT_HEADER_ACTIONS, ResolutionMode::CollectAll),
    (POINT_STATS_CONTENT, ResolutionMode::CollectAll),
    (POINT_FILTERS_CONTENT, ResolutionMode::CollectAll),
    (POINT_LIST_BODY, ResolutionMode::FirstWins),
    (POINT_DETAIL_HEADER, ResolutionMode::FirstWins),
    (POINT_TABS_REGISTRY, ResolutionMode::CollectAll),
];

/// How contributions at one point are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Every non-empty payload, in priority order.
    CollectAll,
    /// First non-empty payload; later producers are never invoked.
    FirstWins,
}

impl Display for ResolutionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CollectAll => write!(f, "collect-all"),
            Self::FirstWins => write!(f, "first-wins"),
        }
    }
}

/// A named location where producers contribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionPoint {
    HeaderTitle,
    HeaderActions,
    StatsContent,
    FiltersContent,
    ListBody,
    DetailHeader,
    TabsRegistry,
    /// Content for one tab, keyed by tab id.
    TabContent(String),
    /// Application-defined point.
    Custom(String),
}

impl ExtensionPoint {
    /// Stable registry key.
    pub fn key(&self) -> String {
        match self {
            Self::HeaderTitle => POINT_HEADER_TITLE.to_string(),
            Self::HeaderActions => POINT_HEADER_ACTIONS.to_string(),
            Self::StatsContent => POINT_STATS_CONTENT.to_string(),
            Self::FiltersContent => POINT_FILTERS_CONTENT.to_string(),
            Self::ListBody => POINT_LIST_BODY.to_string(),
            Self::DetailHeader => POINT_DETAIL_HEADER.to_string(),
            Self::TabsRegistry => POINT_TABS_REGISTRY.to_string(),
            Self::TabContent(tab_id) => format!("{POINT_TAB_CONTENT_PREFIX}{}", tab_id.trim()),
            Self::Custom(name) => name.trim().to_string(),
        }
    }

    /// Returns whether the point id carries a usable name.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::TabContent(tab_id) => tab_id.trim().is_empty(),
            Self::Custom(name) => name.trim().is_empty(),
            _ => false,
        }
    }
}

impl Display for ExtensionPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Canonical mode for a point key, if the key is reserved.
///
/// Custom points named like a reserved point share its canonical mode, so
/// collisions are caught at registration.
pub fn canonical_mode(key: &str) -> Option<ResolutionMode> {
    if key.starts_with(POINT_TAB_CONTENT_PREFIX) {
        return Some(ResolutionMode::FirstWins);
    }
    NAMED_POINTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, mode)| *mode)
}

#[cfg(test)]
mod tests {
    use super::{canonical_mode, ExtensionPoint, ResolutionMode};

    #[test]
    fn named_points_have_canonical_modes() {
        assert_eq!(
            canonical_mode(&ExtensionPoint::HeaderTitle.key()),
            Some(ResolutionMode::FirstWins)
        );
        assert_eq!(
            canonical_mode(&ExtensionPoint::TabsRegistry.key()),
            Some(ResolutionMode::CollectAll)
        );
        assert_eq!(
            canonical_mode(&ExtensionPoint::TabContent("orders".to_string()).key()),
            Some(ResolutionMode::FirstWins)
        );
        assert_eq!(canonical_mode("customer-badges"), None);
    }

    #[test]
    fn custom_point_with_reserved_name_collides() {
        let key = ExtensionPoint::Custom(" list-body ".to_string()).key();
        assert_eq!(canonical_mode(&key), Some(ResolutionMode::FirstWins));
    }

    #[test]
    fn emptiness_checks_trimmed_names() {
        assert!(ExtensionPoint::Custom("  ".to_string()).is_empty());
        assert!(ExtensionPoint::TabContent(String::new()).is_empty());
        assert!(!ExtensionPoint::ListBody.is_empty());
    }
}
