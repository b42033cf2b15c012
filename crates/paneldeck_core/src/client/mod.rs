//! Client-side dashboard state machines.
//!
//! # Responsibility
//! - Own panel lifecycle, tab selection, lazily loaded tab content and
//!   statistics for one mounted dashboard.
//! - Coordinate asynchronous fetches with last-intent-wins token checks.
//!
//! # Invariants
//! - Panel status only moves along `closed→opening→open→closing→closed` or
//!   `opening→closed`.
//! - Every `open`/`close`/`refresh` bumps the request token; a detail
//!   response is applied only when its captured token equals the live token.
//! - Tab responses are checked against the detail generation instead, which
//!   only `open`/`close` bump, so a refresh never strands a tab fetch.
//! - Suspension points are exactly the awaited fetches; every other step
//!   runs to completion synchronously.
//! - State lives in one dashboard instance; nothing is global.

pub mod dashboard;
pub mod panel;
pub mod stats;
pub mod tabs;

pub use dashboard::Dashboard;
pub use panel::{DetailView, PanelController, PanelObserver, PanelState, PanelStatus};
pub use stats::{StatValue, StatsBoard};
pub use tabs::{TabController, TabKey, TabState};

use crate::model::tab::TabSet;
use crate::transport::TransportError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Outcome of one state-machine operation once its fetch (if any) settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    /// Response applied to state.
    Applied,
    /// Nothing to do (already open, already active, not loadable yet).
    Unchanged,
    /// Response arrived after a newer intent; discarded silently.
    Stale { captured: u64, live: u64 },
    /// Transport failure recorded in state; retry is possible.
    Failed(TransportError),
}

impl Settled {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// State shared by the controllers of one dashboard instance.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub(crate) panel: PanelState,
    /// Bumped by every `open`/`close`; tab fetches are keyed on it.
    pub(crate) generation: u64,
    pub(crate) detail: Option<DetailView>,
    pub(crate) tabs: TabStore,
}

pub(crate) type SharedHandle = Rc<RefCell<SharedState>>;

impl SharedState {
    pub(crate) fn new(tabs: TabSet) -> SharedHandle {
        Rc::new(RefCell::new(Self {
            panel: PanelState::default(),
            generation: 0,
            detail: None,
            tabs: TabStore::new(tabs),
        }))
    }
}

/// Tab selection plus per-detail lazy-load bookkeeping.
#[derive(Debug)]
pub(crate) struct TabStore {
    pub(crate) set: TabSet,
    pub(crate) state: TabState,
    /// In-flight deferred fetches, keyed by tab id, with the detail
    /// generation they were issued under.
    pub(crate) pending: BTreeMap<String, u64>,
    pub(crate) content: BTreeMap<String, Value>,
    pub(crate) errors: BTreeMap<String, TransportError>,
}

impl TabStore {
    fn new(set: TabSet) -> Self {
        let state = TabState {
            active_tab_id: set.first().map(|tab| tab.id.clone()),
            loaded_tab_ids: BTreeSet::new(),
        };
        Self {
            set,
            state,
            pending: BTreeMap::new(),
            content: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Back to the highest-priority tab with nothing loaded.
    pub(crate) fn reset(&mut self) {
        self.state.active_tab_id = self.set.first().map(|tab| tab.id.clone());
        self.state.loaded_tab_ids.clear();
        self.pending.clear();
        self.content.clear();
        self.errors.clear();
    }

    /// Stores tab content delivered by a detail or tab response.
    pub(crate) fn store(&mut self, tab_id: &str, content: Value) {
        self.errors.remove(tab_id);
        self.content.insert(tab_id.to_string(), content);
        self.state.loaded_tab_ids.insert(tab_id.to_string());
    }
}
