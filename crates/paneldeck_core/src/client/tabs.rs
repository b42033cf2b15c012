//! Tab selection and lazy loading for the detail pane.
//!
//! # Invariants
//! - At most one active tab; it is always a registered tab id.
//! - A deferred tab is fetched at most once per (detail, tab) until it is
//!   invalidated or the detail changes.
//! - Tab responses carry the detail generation captured at issue time; a
//!   later open or close makes them stale, a refresh does not.

use crate::client::panel::PanelStatus;
use crate::client::{Settled, SharedHandle};
use crate::context::ContextDescriptor;
use crate::model::tab::{TabDescriptor, TabSet};
use crate::transport::{DashboardTransport, TabRequest, TransportError};
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Observable tab state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabState {
    pub active_tab_id: Option<String>,
    pub loaded_tab_ids: BTreeSet<String>,
}

/// Keyboard navigation in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKey {
    /// Next tab, wrapping to the first.
    Next,
    /// Previous tab, wrapping to the last.
    Previous,
    First,
    Last,
}

struct TabInner {
    context: Rc<ContextDescriptor>,
    state: SharedHandle,
    transport: Rc<dyn DashboardTransport>,
}

/// Controller owning tab selection of one dashboard.
#[derive(Clone)]
pub struct TabController {
    inner: Rc<TabInner>,
}

impl TabController {
    pub(crate) fn new(
        context: Rc<ContextDescriptor>,
        state: SharedHandle,
        transport: Rc<dyn DashboardTransport>,
    ) -> Self {
        Self {
            inner: Rc::new(TabInner {
                context,
                state,
                transport,
            }),
        }
    }

    pub fn state(&self) -> TabState {
        self.inner.state.borrow().tabs.state.clone()
    }

    /// Active tab descriptor.
    pub fn get_current(&self) -> Option<TabDescriptor> {
        let state = self.inner.state.borrow();
        let active = state.tabs.state.active_tab_id.as_deref()?;
        state.tabs.set.get(active).cloned()
    }

    /// All tabs in priority order.
    pub fn get_all(&self) -> Vec<TabDescriptor> {
        self.inner.state.borrow().tabs.set.iter().cloned().collect()
    }

    /// Validated tab set this controller selects from.
    pub fn tab_set(&self) -> TabSet {
        self.inner.state.borrow().tabs.set.clone()
    }

    /// Loaded content of one tab, if any.
    pub fn content(&self, tab_id: &str) -> Option<Value> {
        self.inner.state.borrow().tabs.content.get(tab_id).cloned()
    }

    /// Tab-local load error, if the last fetch failed.
    pub fn error(&self, tab_id: &str) -> Option<TransportError> {
        self.inner.state.borrow().tabs.errors.get(tab_id).cloned()
    }

    /// Marks `tab_id` active without loading it. Returns `false` for an
    /// unknown tab.
    pub fn select(&self, tab_id: &str) -> bool {
        let mut state = self.inner.state.borrow_mut();
        if !state.tabs.set.contains(tab_id) {
            return false;
        }
        state.tabs.state.active_tab_id = Some(tab_id.to_string());
        true
    }

    /// Activates `tab_id`, fetching it when deferred and not yet loaded.
    pub fn activate(&self, tab_id: &str) -> LocalBoxFuture<'static, Settled> {
        {
            let state = self.inner.state.borrow();
            if state.tabs.state.active_tab_id.as_deref() == Some(tab_id) {
                return future::ready(Settled::Unchanged).boxed_local();
            }
            if !state.tabs.set.contains(tab_id) {
                debug!(
                    "event=tab_activate_ignored module=tabs status=skipped context={} tab_id={} reason=unknown_tab",
                    self.inner.context.id(),
                    tab_id
                );
                return future::ready(Settled::Unchanged).boxed_local();
            }
        }
        self.select(tab_id);
        self.load_active()
    }

    /// Moves to the adjacent tab in priority order.
    pub fn navigate(&self, key: TabKey) -> LocalBoxFuture<'static, Settled> {
        let target = {
            let state = self.inner.state.borrow();
            let set = &state.tabs.set;
            let active = state.tabs.state.active_tab_id.as_deref().unwrap_or_default();
            let target = match key {
                TabKey::Next => set.adjacent(active, 1),
                TabKey::Previous => set.adjacent(active, -1),
                TabKey::First => set.first(),
                TabKey::Last => set.last(),
            };
            target.map(|tab| tab.id.clone())
        };
        match target {
            Some(tab_id) => self.activate(&tab_id),
            None => future::ready(Settled::Unchanged).boxed_local(),
        }
    }

    /// Fetches the active tab if it is deferred, not loaded and not already
    /// in flight for the current detail. Requires an open panel.
    pub fn load_active(&self) -> LocalBoxFuture<'static, Settled> {
        let inner = &self.inner;
        let (detail_id, tab_id, generation) = {
            let mut state = inner.state.borrow_mut();
            let generation = state.generation;
            let Some(detail_id) = state.panel.active_detail_id else {
                return future::ready(Settled::Unchanged).boxed_local();
            };
            if state.panel.status != PanelStatus::Open {
                return future::ready(Settled::Unchanged).boxed_local();
            }
            let Some(tab) = state.tabs.state.active_tab_id.clone() else {
                return future::ready(Settled::Unchanged).boxed_local();
            };
            let deferred = state.tabs.set.get(&tab).is_some_and(TabDescriptor::is_deferred);
            if !deferred
                || state.tabs.state.loaded_tab_ids.contains(&tab)
                || state.tabs.pending.get(&tab) == Some(&generation)
            {
                return future::ready(Settled::Unchanged).boxed_local();
            }
            state.tabs.pending.insert(tab.clone(), generation);
            (detail_id, tab, generation)
        };

        let request = TabRequest {
            id: detail_id,
            tab: tab_id.clone(),
            token: inner.context.auth_token().to_string(),
            action: inner.context.tab_action().to_string(),
        };
        debug!(
            "event=tab_fetch_issued module=tabs status=ok context={} detail_id={} tab_id={} generation={}",
            inner.context.id(),
            detail_id,
            tab_id,
            generation
        );
        let response = inner.transport.fetch_tab(request);
        let inner = Rc::clone(inner);
        async move {
            let result = response.await.and_then(|envelope| envelope.into_result());
            inner.settle(detail_id, &tab_id, generation, result)
        }
        .boxed_local()
    }

    /// Drops the loaded mark of one tab so its next load refetches.
    pub fn invalidate(&self, tab_id: &str) {
        let mut state = self.inner.state.borrow_mut();
        state.tabs.state.loaded_tab_ids.remove(tab_id);
        state.tabs.content.remove(tab_id);
    }

    pub fn invalidate_all(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.tabs.state.loaded_tab_ids.clear();
        state.tabs.content.clear();
    }
}

impl TabInner {
    fn settle(
        &self,
        detail_id: u64,
        tab_id: &str,
        captured: u64,
        result: Result<Value, TransportError>,
    ) -> Settled {
        let mut state = self.state.borrow_mut();
        if state.tabs.pending.get(tab_id) == Some(&captured) {
            state.tabs.pending.remove(tab_id);
        }
        let live = state.generation;
        if captured != live || state.panel.active_detail_id != Some(detail_id) {
            debug!(
                "event=stale_response_discarded module=tabs status=stale kind=tab detail_id={} tab_id={} captured={} live={}",
                detail_id, tab_id, captured, live
            );
            return Settled::Stale { captured, live };
        }
        match result {
            Ok(content) => {
                state.tabs.store(tab_id, content);
                Settled::Applied
            }
            Err(err) => {
                warn!(
                    "event=tab_fetch_failed module=tabs status=error context={} detail_id={} tab_id={} reason={}",
                    self.context.id(),
                    detail_id,
                    tab_id,
                    err
                );
                state.tabs.errors.insert(tab_id.to_string(), err.clone());
                Settled::Failed(err)
            }
        }
    }
}
