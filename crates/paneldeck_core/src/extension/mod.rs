//! Extension registry: ordered multi-producer contributions per
//! (extension point, context).
//!
//! Registrations happen once at setup. After that the registry is shared
//! read-only by the render orchestrator and the client controllers.

pub mod collect;
pub mod point;
pub mod registry;

pub use collect::{resolve_stats, resolve_tabs};
pub use point::{canonical_mode, ExtensionPoint, ResolutionMode};
pub use registry::{
    Contribution, ContributionError, ExtensionRegistry, ProducerResult, Resolution, Resolved,
};
