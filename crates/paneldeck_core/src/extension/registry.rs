//! In-process contribution registry and resolution.
//!
//! # Responsibility
//! - Map (point, context) to a priority-ordered list of producers.
//! - Resolve contributions in `collect-all` or `first-wins` mode.
//!
//! # Invariants
//! - One deterministic order per (point, context): ascending priority, ties
//!   by registration order.
//! - A failing or panicking producer is logged and skipped; siblings still
//!   contribute.
//! - `resolve` iterates a snapshot taken before the first producer runs and
//!   has no side effects beyond invoking producers.

use crate::context::ContextDescriptor;
use crate::error::{is_valid_context_id, ConfigurationError};
use crate::extension::point::{canonical_mode, ExtensionPoint, ResolutionMode};
use crate::logging::panic_message;
use crate::model::payload::{Payload, RequestScope};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// What a producer returns. `Ok(None)` means "nothing to contribute".
pub type ProducerResult = Result<Option<Payload>, String>;

type ProducerFn = dyn Fn(&ContextDescriptor, &RequestScope) -> ProducerResult + Send + Sync;

/// One registered producer.
#[derive(Clone)]
pub struct Contribution {
    producer: String,
    priority: i32,
    produce: Arc<ProducerFn>,
}

impl Contribution {
    pub fn new<F>(producer: impl Into<String>, priority: i32, produce: F) -> Self
    where
        F: Fn(&ContextDescriptor, &RequestScope) -> ProducerResult + Send + Sync + 'static,
    {
        Self {
            producer: producer.into(),
            priority,
            produce: Arc::new(produce),
        }
    }

    /// Producer that always contributes a clone of `payload`.
    pub fn fixed(producer: impl Into<String>, priority: i32, payload: Payload) -> Self {
        Self::new(producer, priority, move |_, _| Ok(Some(payload.clone())))
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl Debug for Contribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contribution")
            .field("producer", &self.producer)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Isolated failure of one producer during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionError {
    Failed { producer: String, message: String },
    Panicked { producer: String, message: String },
}

impl ContributionError {
    pub fn producer(&self) -> &str {
        match self {
            Self::Failed { producer, .. } | Self::Panicked { producer, .. } => producer,
        }
    }
}

impl Display for ContributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { producer, message } => {
                write!(f, "contribution `{producer}` failed: {message}")
            }
            Self::Panicked { producer, message } => {
                write!(f, "contribution `{producer}` panicked: {message}")
            }
        }
    }
}

impl Error for ContributionError {}

/// One payload with the producer that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub producer: String,
    pub payload: Payload,
}

/// Full resolution report: ordered payloads plus isolated failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub entries: Vec<Resolved>,
    pub failures: Vec<ContributionError>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn payloads(&self) -> impl Iterator<Item = &Payload> {
        self.entries.iter().map(|entry| &entry.payload)
    }

    pub fn into_payloads(self) -> Vec<Payload> {
        self.entries.into_iter().map(|entry| entry.payload).collect()
    }
}

#[derive(Debug)]
struct PointEntry {
    mode: ResolutionMode,
    // Sorted by (priority, seq).
    contributions: Vec<(u64, Arc<Contribution>)>,
}

/// Registry of contributions keyed by (point key, context id).
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    points: BTreeMap<(String, String), PointEntry>,
    next_seq: u64,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one contribution.
    ///
    /// # Errors
    /// - `EmptyPointId` / `EmptyContextId` for blank identifiers.
    /// - `InvalidContextId` for a context id no descriptor could carry.
    /// - `IncompatibleMode` when `mode` conflicts with the point's canonical
    ///   mode or with the mode of an earlier registration.
    pub fn register(
        &mut self,
        point: &ExtensionPoint,
        context: &str,
        mode: ResolutionMode,
        contribution: Contribution,
    ) -> Result<(), ConfigurationError> {
        if point.is_empty() {
            return Err(ConfigurationError::EmptyPointId);
        }
        let context = context.trim();
        if context.is_empty() {
            return Err(ConfigurationError::EmptyContextId);
        }
        if !is_valid_context_id(context) {
            return Err(ConfigurationError::InvalidContextId(context.to_string()));
        }
        let key = point.key();

        let incompatible = |registered: ResolutionMode| ConfigurationError::IncompatibleMode {
            point: key.clone(),
            context: context.to_string(),
            registered,
            requested: mode,
        };
        if let Some(canonical) = canonical_mode(&key) {
            if canonical != mode {
                return Err(incompatible(canonical));
            }
        }
        if let Some(existing) = self.points.get(&(key.clone(), context.to_string())) {
            if existing.mode != mode {
                return Err(incompatible(existing.mode));
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(
            "event=contribution_registered module=extension status=ok point={} context={} producer={} priority={}",
            key,
            context,
            contribution.producer(),
            contribution.priority()
        );

        let entry = self
            .points
            .entry((key, context.to_string()))
            .or_insert_with(|| PointEntry {
                mode,
                contributions: Vec::new(),
            });
        let priority = contribution.priority();
        let index = entry
            .contributions
            .partition_point(|(existing_seq, existing)| {
                (existing.priority(), *existing_seq) <= (priority, seq)
            });
        entry.contributions.insert(index, (seq, Arc::new(contribution)));
        Ok(())
    }

    /// Number of registered contributions across all points.
    pub fn len(&self) -> usize {
        self.points
            .values()
            .map(|entry| entry.contributions.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mode fixed for (point, context), if anything is registered there.
    pub fn mode_of(&self, point: &ExtensionPoint, context: &str) -> Option<ResolutionMode> {
        self.points
            .get(&(point.key(), context.trim().to_string()))
            .map(|entry| entry.mode)
    }

    /// Producer ids in resolution order.
    pub fn producers(&self, point: &ExtensionPoint, context: &str) -> Vec<String> {
        self.snapshot(point, context)
            .map(|(_, contributions)| {
                contributions
                    .iter()
                    .map(|contribution| contribution.producer().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves ordered payloads for (point, context).
    ///
    /// Zero registered producers yields an empty list, never an error.
    pub fn resolve(
        &self,
        point: &ExtensionPoint,
        context: &ContextDescriptor,
        scope: &RequestScope,
    ) -> Vec<Payload> {
        self.resolve_with_report(point, context, scope)
            .into_payloads()
    }

    /// Resolves and also reports isolated producer failures.
    pub fn resolve_with_report(
        &self,
        point: &ExtensionPoint,
        context: &ContextDescriptor,
        scope: &RequestScope,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        let Some((mode, contributions)) = self.snapshot(point, context.id()) else {
            return resolution;
        };

        for contribution in contributions {
            match invoke(&contribution, context, scope) {
                Ok(Some(payload)) => {
                    resolution.entries.push(Resolved {
                        producer: contribution.producer().to_string(),
                        payload,
                    });
                    if mode == ResolutionMode::FirstWins {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "event=contribution_failed module=extension status=error point={} context={} producer={} reason={}",
                        point,
                        context.id(),
                        err.producer(),
                        err
                    );
                    resolution.failures.push(err);
                }
            }
        }
        resolution
    }

    fn snapshot(
        &self,
        point: &ExtensionPoint,
        context: &str,
    ) -> Option<(ResolutionMode, Vec<Arc<Contribution>>)> {
        let entry = self.points.get(&(point.key(), context.trim().to_string()))?;
        let contributions = entry
            .contributions
            .iter()
            .map(|(_, contribution)| Arc::clone(contribution))
            .collect();
        Some((entry.mode, contributions))
    }
}

fn invoke(
    contribution: &Contribution,
    context: &ContextDescriptor,
    scope: &RequestScope,
) -> Result<Option<Payload>, ContributionError> {
    match catch_unwind(AssertUnwindSafe(|| (contribution.produce)(context, scope))) {
        Ok(Ok(payload)) => Ok(payload),
        Ok(Err(message)) => Err(ContributionError::Failed {
            producer: contribution.producer().to_string(),
            message,
        }),
        Err(panic) => Err(ContributionError::Panicked {
            producer: contribution.producer().to_string(),
            message: panic_message(panic.as_ref()),
        }),
    }
}
