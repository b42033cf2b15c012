//! Setup-time configuration errors.
//!
//! # Responsibility
//! - Describe every failure that aborts dashboard construction.
//!
//! # Invariants
//! - Configuration errors are fatal and only raised during setup
//!   (registration, context/tab validation, manifest install).
//! - Every other failure class is contained to its region or operation and
//!   lives next to the code that raises it.

use crate::extension::ResolutionMode;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fatal setup error. Aborts dashboard construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Context id is empty or whitespace.
    EmptyContextId,
    /// Context id or deep-link namespace uses unsupported characters.
    InvalidContextId(String),
    /// Extension point id is empty or whitespace.
    EmptyPointId,
    /// Tab id is empty or contains characters that cannot round-trip through
    /// a location fragment.
    InvalidTabId(String),
    /// Two tab descriptors share the same id within one context.
    DuplicateTabId { context: String, tab_id: String },
    /// Two stat descriptors share the same id within one context.
    DuplicateStatId { context: String, stat_id: String },
    /// A point was registered under a mode that conflicts with its
    /// canonical (or first registered) mode.
    IncompatibleMode {
        point: String,
        context: String,
        registered: ResolutionMode,
        requested: ResolutionMode,
    },
    /// Declarative manifest failed validation.
    InvalidManifest(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContextId => write!(f, "context id must not be empty"),
            Self::InvalidContextId(value) => write!(f, "context id is invalid: {value}"),
            Self::EmptyPointId => write!(f, "extension point id must not be empty"),
            Self::InvalidTabId(value) => write!(f, "tab id is invalid: `{value}`"),
            Self::DuplicateTabId { context, tab_id } => {
                write!(f, "tab id `{tab_id}` registered twice in context `{context}`")
            }
            Self::DuplicateStatId { context, stat_id } => {
                write!(f, "stat id `{stat_id}` registered twice in context `{context}`")
            }
            Self::IncompatibleMode {
                point,
                context,
                registered,
                requested,
            } => write!(
                f,
                "extension point `{point}` in context `{context}` resolves as {registered}; \
                 refusing {requested} registration"
            ),
            Self::InvalidManifest(details) => write!(f, "invalid dashboard manifest: {details}"),
        }
    }
}

impl Error for ConfigurationError {}

/// Validates a context id or deep-link namespace (`[a-z0-9_-]`, leading
/// letter or digit).
pub(crate) fn is_valid_context_id(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Validates a tab id (`[A-Za-z0-9_-]`, non-empty).
pub(crate) fn is_valid_tab_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
