//! One mounted dashboard instance.
//!
//! # Responsibility
//! - Build panel, tab and stats controllers over one shared state.
//! - Translate user intents and history pops into controller calls and
//!   history entries.
//!
//! # Invariants
//! - Opening a detail pushes one history entry; tab changes replace it;
//!   a user close pushes the context's base entry.
//! - History pops never push, so back/forward round-trip exactly.
//! - State is discarded with the instance; nothing persists.

use crate::client::panel::{PanelController, PanelStatus};
use crate::client::stats::StatsBoard;
use crate::client::tabs::{TabController, TabKey};
use crate::client::{Settled, SharedState};
use crate::context::ContextDescriptor;
use crate::error::ConfigurationError;
use crate::extension::{resolve_stats, resolve_tabs, ExtensionRegistry};
use crate::model::payload::RequestScope;
use crate::navigation::{DeepLink, History, NavigationResolver};
use crate::transport::DashboardTransport;
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::info;
use std::rc::Rc;
use uuid::Uuid;

/// Client dashboard owning panel, tab and stats state.
pub struct Dashboard {
    instance_id: Uuid,
    context: Rc<ContextDescriptor>,
    resolver: NavigationResolver,
    history: Rc<dyn History>,
    panel: PanelController,
    tabs: TabController,
    stats: Option<StatsBoard>,
}

impl Dashboard {
    /// Mounts a dashboard in the closed, first-tab state.
    ///
    /// # Errors
    /// - Tab or stat configuration errors from `tabs-registry` and
    ///   `stats-content` contributions.
    pub fn mount(
        context: ContextDescriptor,
        registry: &ExtensionRegistry,
        transport: Rc<dyn DashboardTransport>,
        history: Rc<dyn History>,
    ) -> Result<Self, ConfigurationError> {
        let scope = RequestScope::new();
        let tab_set = resolve_tabs(registry, &context, &scope)?;
        let stat_descriptors = resolve_stats(registry, &context, &scope)?;
        let context = Rc::new(context);
        let state = SharedState::new(tab_set);

        let instance_id = Uuid::new_v4();
        info!(
            "event=dashboard_mount module=dashboard status=ok context={} instance={} tabs={} stats={}",
            context.id(),
            instance_id,
            state.borrow().tabs.set.len(),
            stat_descriptors.len()
        );

        let stats = context.has_stats().then(|| {
            StatsBoard::new(
                Rc::clone(&context),
                stat_descriptors,
                Rc::clone(&transport),
            )
        });
        Ok(Self {
            instance_id,
            resolver: NavigationResolver::new(&context),
            panel: PanelController::new(
                Rc::clone(&context),
                Rc::clone(&state),
                Rc::clone(&transport),
            ),
            tabs: TabController::new(Rc::clone(&context), state, transport),
            stats,
            history,
            context,
        })
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn context(&self) -> &ContextDescriptor {
        &self.context
    }

    pub fn panel(&self) -> &PanelController {
        &self.panel
    }

    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }

    pub fn stats(&self) -> Option<&StatsBoard> {
        self.stats.as_ref()
    }

    pub fn resolver(&self) -> &NavigationResolver {
        &self.resolver
    }

    /// Restores the deep link of the current history entry, if any.
    ///
    /// Malformed fragments leave the dashboard closed without fetching. A
    /// restored link rewrites the current entry to the detail and tab
    /// actually shown, so an ignored tab id does not linger in history.
    pub fn restore(&self) -> LocalBoxFuture<'static, Settled> {
        let fragment = self.history.current();
        match self.deep_link(&fragment) {
            Some(link) => {
                let opening = self.open_link(link, false);
                self.sync_tab_location();
                opening
            }
            None => future::ready(Settled::Unchanged).boxed_local(),
        }
    }

    /// User intent: open a detail on its highest-priority tab.
    pub fn open(&self, detail_id: u64) -> LocalBoxFuture<'static, Settled> {
        self.open_link(
            DeepLink {
                detail_id,
                tab_id: None,
            },
            true,
        )
    }

    /// User intent: close the detail pane.
    pub fn close(&self) -> bool {
        let closed = self.panel.close();
        if closed {
            self.history.push(&self.resolver.base_location());
        }
        closed
    }

    /// User intent: re-fetch the open detail, then load the active tab if it
    /// is still missing. The tab load runs whatever the refresh outcome.
    pub fn refresh(&self) -> LocalBoxFuture<'static, Settled> {
        let refresh = self.panel.refresh();
        let tabs = self.tabs.clone();
        async move {
            let outcome = refresh.await;
            tabs.load_active().await;
            outcome
        }
        .boxed_local()
    }

    /// User intent: switch tab; rewrites the current history entry.
    pub fn activate_tab(&self, tab_id: &str) -> LocalBoxFuture<'static, Settled> {
        let activation = self.tabs.activate(tab_id);
        self.sync_tab_location();
        activation
    }

    /// Keyboard navigation between tabs.
    pub fn navigate_tabs(&self, key: TabKey) -> LocalBoxFuture<'static, Settled> {
        let activation = self.tabs.navigate(key);
        self.sync_tab_location();
        activation
    }

    pub fn refresh_stats(&self) -> LocalBoxFuture<'static, Settled> {
        match &self.stats {
            Some(stats) => stats.refresh(),
            None => future::ready(Settled::Unchanged).boxed_local(),
        }
    }

    /// Applies a history pop (back/forward) without pushing new entries.
    pub fn on_history_pop(&self, fragment: &str) -> LocalBoxFuture<'static, Settled> {
        match self.deep_link(fragment) {
            Some(link) => self.open_link(link, false),
            None => {
                self.panel.close();
                future::ready(Settled::Unchanged).boxed_local()
            }
        }
    }

    fn deep_link(&self, fragment: &str) -> Option<DeepLink> {
        self.resolver.resolve(fragment, &self.tabs.tab_set())
    }

    fn open_link(&self, link: DeepLink, push: bool) -> LocalBoxFuture<'static, Settled> {
        let panel_state = self.panel.state();
        let already_open = matches!(panel_state.status, PanelStatus::Open | PanelStatus::Opening)
            && panel_state.active_detail_id == Some(link.detail_id);
        if already_open {
            return match link.tab_id {
                Some(tab_id) => self.tabs.activate(&tab_id),
                None => future::ready(Settled::Unchanged).boxed_local(),
            };
        }

        let open = self.panel.open(link.detail_id);
        if let Some(tab_id) = link.tab_id.as_deref() {
            self.tabs.select(tab_id);
        }
        if push {
            self.history.push(
                &self
                    .resolver
                    .build_location(link.detail_id, link.tab_id.as_deref()),
            );
        }

        let tabs = self.tabs.clone();
        async move {
            let outcome = open.await;
            if outcome.is_applied() {
                tabs.load_active().await;
            }
            outcome
        }
        .boxed_local()
    }

    fn sync_tab_location(&self) {
        let panel = self.panel.state();
        let Some(detail_id) = panel.active_detail_id else {
            return;
        };
        let active = self.tabs.state().active_tab_id;
        self.history
            .replace(&self.resolver.build_location(detail_id, active.as_deref()));
    }
}
