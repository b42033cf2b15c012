//! Location fragment parsing and building.

use crate::context::ContextDescriptor;
use crate::error::is_valid_tab_id;
use crate::model::tab::TabSet;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DETAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<id>[^&]*)(?:&tab=(?P<tab>[^&]*))?$").expect("valid location regex")
});

const TAB_PARAM: &str = "&tab=";

/// Detail (and optional tab) encoded in a location fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub detail_id: u64,
    pub tab_id: Option<String>,
}

/// Why a fragment did not produce a deep link. Never user-visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Fragment is empty or belongs to another context.
    MissingPrefix,
    NonNumericId(String),
    UnknownTab(String),
    Malformed(String),
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "fragment does not target this context"),
            Self::NonNumericId(value) => write!(f, "detail id is not numeric: `{value}`"),
            Self::UnknownTab(value) => write!(f, "tab is not registered: `{value}`"),
            Self::Malformed(value) => write!(f, "fragment is malformed: `{value}`"),
        }
    }
}

impl Error for NavigationError {}

/// Maps fragments to deep links for one context namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResolver {
    namespace: String,
}

impl NavigationResolver {
    pub fn new(context: &ContextDescriptor) -> Self {
        Self {
            namespace: context.deep_link_namespace().to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Parses `#<namespace>-<id>[&tab=<tabId>]`. The leading `#` is optional.
    pub fn parse_location(&self, fragment: &str) -> Result<DeepLink, NavigationError> {
        let fragment = fragment.trim();
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let rest = fragment
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or(NavigationError::MissingPrefix)?;

        let captures = DETAIL_RE
            .captures(rest)
            .ok_or_else(|| NavigationError::Malformed(fragment.to_string()))?;
        let raw_id = captures.name("id").map_or("", |m| m.as_str());
        if raw_id.is_empty() || !raw_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(NavigationError::NonNumericId(raw_id.to_string()));
        }
        let detail_id = raw_id
            .parse::<u64>()
            .map_err(|_| NavigationError::NonNumericId(raw_id.to_string()))?;

        let tab_id = match captures.name("tab") {
            Some(tab) if is_valid_tab_id(tab.as_str()) => Some(tab.as_str().to_string()),
            Some(_) => return Err(NavigationError::Malformed(fragment.to_string())),
            None => None,
        };
        Ok(DeepLink { detail_id, tab_id })
    }

    /// Builds `#<namespace>-<id>[&tab=<tabId>]`.
    pub fn build_location(&self, detail_id: u64, tab_id: Option<&str>) -> String {
        match tab_id {
            Some(tab) => format!("#{}-{detail_id}{TAB_PARAM}{tab}", self.namespace),
            None => format!("#{}-{detail_id}", self.namespace),
        }
    }

    /// Fragment for the closed/default state.
    pub fn base_location(&self) -> String {
        format!("#{}", self.namespace)
    }

    /// Deep link to restore on mount or history pop.
    ///
    /// Grammar failures yield `None`. A well-formed tab id that is not
    /// registered is dropped so the caller falls back to the
    /// highest-priority tab.
    pub fn resolve(&self, fragment: &str, tabs: &TabSet) -> Option<DeepLink> {
        let mut link = match self.parse_location(fragment) {
            Ok(link) => link,
            Err(err) => {
                if !fragment.trim().trim_start_matches('#').is_empty() {
                    debug!(
                        "event=deep_link_ignored module=navigation status=skipped namespace={} reason={}",
                        self.namespace, err
                    );
                }
                return None;
            }
        };
        if let Some(tab_id) = link.tab_id.as_deref() {
            if !tabs.contains(tab_id) {
                debug!(
                    "event=deep_link_tab_ignored module=navigation status=skipped namespace={} reason={}",
                    self.namespace,
                    NavigationError::UnknownTab(tab_id.to_string())
                );
                link.tab_id = None;
            }
        }
        Some(link)
    }
}
