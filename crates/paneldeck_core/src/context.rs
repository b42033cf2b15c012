//! Immutable per-page context descriptor.
//!
//! # Responsibility
//! - Carry the identity, capability flags and fetch action names of one
//!   dashboard page.
//!
//! # Invariants
//! - `id` is non-empty and matches `[a-z0-9_-]` with a leading letter/digit.
//! - Once built, a descriptor never changes.

use crate::error::{is_valid_context_id, ConfigurationError};
use serde::Serialize;

/// Capability flags of one context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub has_stats: bool,
    pub has_tabs: bool,
}

/// Validated context descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextDescriptor {
    id: String,
    title: String,
    capabilities: Capabilities,
    detail_action: String,
    tab_action: String,
    stats_action: String,
    deep_link_namespace: String,
    #[serde(skip)]
    auth_token: String,
}

impl ContextDescriptor {
    pub fn builder(id: impl Into<String>) -> ContextBuilder {
        ContextBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has_stats(&self) -> bool {
        self.capabilities.has_stats
    }

    pub fn has_tabs(&self) -> bool {
        self.capabilities.has_tabs
    }

    /// Action name sent with detail fetches.
    pub fn detail_action(&self) -> &str {
        &self.detail_action
    }

    pub fn tab_action(&self) -> &str {
        &self.tab_action
    }

    pub fn stats_action(&self) -> &str {
        &self.stats_action
    }

    /// Prefix used by location fragments (`#<namespace>-<id>`).
    pub fn deep_link_namespace(&self) -> &str {
        &self.deep_link_namespace
    }

    /// Opaque token forwarded with every fetch.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

/// Builder for [`ContextDescriptor`].
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    id: String,
    title: Option<String>,
    capabilities: Capabilities,
    detail_action: Option<String>,
    tab_action: Option<String>,
    stats_action: Option<String>,
    deep_link_namespace: Option<String>,
    auth_token: String,
}

impl ContextBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            capabilities: Capabilities::default(),
            detail_action: None,
            tab_action: None,
            stats_action: None,
            deep_link_namespace: None,
            auth_token: String::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.capabilities.has_stats = enabled;
        self
    }

    pub fn with_tabs(mut self, enabled: bool) -> Self {
        self.capabilities.has_tabs = enabled;
        self
    }

    pub fn detail_action(mut self, action: impl Into<String>) -> Self {
        self.detail_action = Some(action.into());
        self
    }

    pub fn tab_action(mut self, action: impl Into<String>) -> Self {
        self.tab_action = Some(action.into());
        self
    }

    pub fn stats_action(mut self, action: impl Into<String>) -> Self {
        self.stats_action = Some(action.into());
        self
    }

    pub fn deep_link_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.deep_link_namespace = Some(namespace.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Validates and freezes the descriptor.
    ///
    /// # Errors
    /// - `EmptyContextId` when the id is blank.
    /// - `InvalidContextId` when the id or namespace has unsupported
    ///   characters.
    pub fn build(self) -> Result<ContextDescriptor, ConfigurationError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(ConfigurationError::EmptyContextId);
        }
        if !is_valid_context_id(&id) {
            return Err(ConfigurationError::InvalidContextId(id));
        }

        let namespace = match self.deep_link_namespace {
            Some(value) => {
                let value = value.trim().to_string();
                if !is_valid_context_id(&value) {
                    return Err(ConfigurationError::InvalidContextId(value));
                }
                value
            }
            None => id.clone(),
        };

        let title = self
            .title
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_title(&id));

        Ok(ContextDescriptor {
            detail_action: self
                .detail_action
                .unwrap_or_else(|| format!("{id}_get_details")),
            tab_action: self.tab_action.unwrap_or_else(|| format!("{id}_get_tab")),
            stats_action: self
                .stats_action
                .unwrap_or_else(|| format!("{id}_get_stats")),
            title,
            capabilities: self.capabilities,
            deep_link_namespace: namespace,
            auth_token: self.auth_token,
            id,
        })
    }
}

/// `customer_accounts` -> `Customer accounts`.
fn default_title(id: &str) -> String {
    let spaced = id.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
