//! Typed collection of tab and stat descriptors from their registry points.

use crate::context::ContextDescriptor;
use crate::error::ConfigurationError;
use crate::extension::point::ExtensionPoint;
use crate::extension::registry::ExtensionRegistry;
use crate::model::payload::{Payload, RequestScope};
use crate::model::stat::{sort_stats, StatDescriptor};
use crate::model::tab::{TabDescriptor, TabSet};
use log::warn;
use std::collections::BTreeSet;

/// Resolves `tabs-registry` into a validated tab set.
///
/// Returns an empty set for contexts without tabs.
///
/// # Errors
/// - `DuplicateTabId` / `InvalidTabId` from tab validation.
pub fn resolve_tabs(
    registry: &ExtensionRegistry,
    context: &ContextDescriptor,
    scope: &RequestScope,
) -> Result<TabSet, ConfigurationError> {
    if !context.has_tabs() {
        return Ok(TabSet::empty());
    }
    let mut tabs = Vec::<TabDescriptor>::new();
    for payload in registry.resolve(&ExtensionPoint::TabsRegistry, context, scope) {
        match payload {
            Payload::Tabs(contributed) => tabs.extend(contributed),
            other => warn_unexpected(&ExtensionPoint::TabsRegistry, context, &other),
        }
    }
    TabSet::new(context.id(), tabs)
}

/// Resolves `stats-content` into priority-ordered stat descriptors.
///
/// Returns an empty list for contexts without stats.
///
/// # Errors
/// - `DuplicateStatId` when two contributions share a stat id.
pub fn resolve_stats(
    registry: &ExtensionRegistry,
    context: &ContextDescriptor,
    scope: &RequestScope,
) -> Result<Vec<StatDescriptor>, ConfigurationError> {
    if !context.has_stats() {
        return Ok(Vec::new());
    }
    let mut stats = Vec::<StatDescriptor>::new();
    for payload in registry.resolve(&ExtensionPoint::StatsContent, context, scope) {
        match payload {
            Payload::Stats(contributed) => stats.extend(contributed),
            other => warn_unexpected(&ExtensionPoint::StatsContent, context, &other),
        }
    }
    let mut seen = BTreeSet::<&str>::new();
    for stat in &stats {
        if !seen.insert(stat.id.as_str()) {
            return Err(ConfigurationError::DuplicateStatId {
                context: context.id().to_string(),
                stat_id: stat.id.clone(),
            });
        }
    }
    sort_stats(&mut stats);
    Ok(stats)
}

fn warn_unexpected(point: &ExtensionPoint, context: &ContextDescriptor, payload: &Payload) {
    let kind = match payload {
        Payload::Markup(_) => "markup",
        Payload::Tabs(_) => "tabs",
        Payload::Stats(_) => "stats",
        Payload::Data(_) => "data",
    };
    warn!(
        "event=contribution_ignored module=extension status=skipped point={} context={} payload_kind={}",
        point,
        context.id(),
        kind
    );
}

#[cfg(test)]
mod tests {
    use super::{resolve_stats, resolve_tabs};
    use crate::context::ContextDescriptor;
    use crate::error::ConfigurationError;
    use crate::extension::{Contribution, ExtensionPoint, ExtensionRegistry, ResolutionMode};
    use crate::model::payload::{Payload, RequestScope};
    use crate::model::stat::StatDescriptor;
    use crate::model::tab::TabDescriptor;

    fn customer(tabs: bool, stats: bool) -> ContextDescriptor {
        ContextDescriptor::builder("customer")
            .with_tabs(tabs)
            .with_stats(stats)
            .build()
            .expect("valid context")
    }

    fn register_tabs(registry: &mut ExtensionRegistry, producer: &str, tabs: Vec<TabDescriptor>) {
        registry
            .register(
                &ExtensionPoint::TabsRegistry,
                "customer",
                ResolutionMode::CollectAll,
                Contribution::fixed(producer, 10, Payload::Tabs(tabs)),
            )
            .expect("registration");
    }

    #[test]
    fn merges_tabs_from_every_producer() {
        let mut registry = ExtensionRegistry::new();
        register_tabs(
            &mut registry,
            "core",
            vec![TabDescriptor::deferred("membership", "Membership", 20)],
        );
        register_tabs(
            &mut registry,
            "addon",
            vec![TabDescriptor::inline("details", "Details", 10, "customer/details")],
        );
        registry
            .register(
                &ExtensionPoint::TabsRegistry,
                "customer",
                ResolutionMode::CollectAll,
                Contribution::fixed("confused", 30, Payload::markup("<p/>")),
            )
            .expect("registration");

        let tabs = resolve_tabs(&registry, &customer(true, false), &RequestScope::new())
            .expect("valid tabs");
        assert_eq!(tabs.ids(), vec!["details", "membership"]);
    }

    #[test]
    fn duplicate_tab_across_producers_is_configuration_error() {
        let mut registry = ExtensionRegistry::new();
        register_tabs(&mut registry, "a", vec![TabDescriptor::deferred("notes", "Notes", 1)]);
        register_tabs(&mut registry, "b", vec![TabDescriptor::deferred("notes", "Notes", 2)]);
        let err = resolve_tabs(&registry, &customer(true, false), &RequestScope::new())
            .expect_err("duplicate must fail");
        assert!(matches!(err, ConfigurationError::DuplicateTabId { .. }));
    }

    #[test]
    fn capability_flags_gate_resolution() {
        let mut registry = ExtensionRegistry::new();
        register_tabs(&mut registry, "a", vec![TabDescriptor::deferred("notes", "Notes", 1)]);
        let tabs = resolve_tabs(&registry, &customer(false, false), &RequestScope::new())
            .expect("no tabs");
        assert!(tabs.is_empty());
        assert!(resolve_stats(&registry, &customer(false, false), &RequestScope::new())
            .expect("no stats")
            .is_empty());
    }

    #[test]
    fn stats_are_sorted_by_priority() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register(
                &ExtensionPoint::StatsContent,
                "customer",
                ResolutionMode::CollectAll,
                Contribution::fixed(
                    "core",
                    10,
                    Payload::Stats(vec![
                        StatDescriptor::new("inactive", "Inactive", 30),
                        StatDescriptor::new("total", "Total", 10),
                    ]),
                ),
            )
            .expect("registration");
        registry
            .register(
                &ExtensionPoint::StatsContent,
                "customer",
                ResolutionMode::CollectAll,
                Contribution::fixed(
                    "addon",
                    20,
                    Payload::Stats(vec![StatDescriptor::new("active", "Active", 20)]),
                ),
            )
            .expect("registration");
        let stats = resolve_stats(&registry, &customer(false, true), &RequestScope::new())
            .expect("distinct stats");
        let ids: Vec<&str> = stats.iter().map(|stat| stat.id.as_str()).collect();
        assert_eq!(ids, vec!["total", "active", "inactive"]);
    }

    #[test]
    fn duplicate_stat_across_producers_is_configuration_error() {
        let mut registry = ExtensionRegistry::new();
        for producer in ["a", "b"] {
            registry
                .register(
                    &ExtensionPoint::StatsContent,
                    "customer",
                    ResolutionMode::CollectAll,
                    Contribution::fixed(
                        producer,
                        10,
                        Payload::Stats(vec![StatDescriptor::new("total", "Total", 10)]),
                    ),
                )
                .expect("registration");
        }
        let err = resolve_stats(&registry, &customer(false, true), &RequestScope::new())
            .expect_err("duplicate must fail");
        assert_eq!(
            err,
            ConfigurationError::DuplicateStatId {
                context: "customer".to_string(),
                stat_id: "total".to_string(),
            }
        );
    }
}
