//! Core engine for master-detail dashboards.
//! This crate is the single source of truth for registry, rendering and
//! client state-machine invariants.

pub mod client;
pub mod context;
pub mod error;
pub mod extension;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod navigation;
pub mod render;
pub mod transport;

pub use client::{
    Dashboard, DetailView, PanelController, PanelObserver, PanelState, PanelStatus, Settled,
    StatValue, StatsBoard, TabController, TabKey, TabState,
};
pub use context::{Capabilities, ContextBuilder, ContextDescriptor};
pub use error::ConfigurationError;
pub use extension::{
    resolve_stats, resolve_tabs, Contribution, ContributionError, ExtensionPoint,
    ExtensionRegistry, ProducerResult, Resolution, ResolutionMode,
};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use manifest::DashboardManifest;
pub use model::payload::{Payload, RequestScope};
pub use model::stat::StatDescriptor;
pub use model::tab::{TabDescriptor, TabSet, TabSource};
pub use navigation::{DeepLink, History, MemoryHistory, NavigationError, NavigationResolver};
pub use render::{InMemoryTemplates, RenderOrchestrator, RenderedPage, TemplateStore};
pub use transport::{
    DashboardTransport, DetailEnvelope, DetailRequest, FetchResult, StatsEnvelope, StatsRequest,
    TabEnvelope, TabRequest, TransportError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
