//! Detail-pane lifecycle controller.
//!
//! # Responsibility
//! - Drive `closed/opening/open/closing` transitions for the detail pane.
//! - Issue detail fetches and apply only the response of the latest intent.
//!
//! # Invariants
//! - Illegal transitions are refused and logged; state is left untouched.
//! - `open` of the id already open (or opening) issues no request.
//! - Failure while opening ends in `closed` with `error` set; failure while
//!   refreshing keeps the last good detail and sets `error`.

use crate::client::{Settled, SharedHandle};
use crate::context::ContextDescriptor;
use crate::transport::{DashboardTransport, DetailPayload, DetailRequest, TransportError};
use futures::future::{self, FutureExt, LocalBoxFuture};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Detail pane status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelStatus {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl PanelStatus {
    /// Returns whether `self -> next` is a legal edge.
    pub fn can_transition_to(self, next: PanelStatus) -> bool {
        matches!(
            (self, next),
            (Self::Closed, Self::Opening)
                | (Self::Opening, Self::Open)
                | (Self::Opening, Self::Closed)
                | (Self::Open, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }
}

impl Display for PanelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Observable panel state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub status: PanelStatus,
    pub active_detail_id: Option<u64>,
    pub request_token: u64,
    pub error: Option<TransportError>,
}

/// Last successfully applied detail.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub detail_id: u64,
    pub title: String,
    pub data: Value,
}

/// Receives every legal status transition. `closing` is the exit
/// transition of `close()`.
pub trait PanelObserver {
    fn on_transition(&self, from: PanelStatus, to: PanelStatus);
}

struct PanelInner {
    context: Rc<ContextDescriptor>,
    state: SharedHandle,
    transport: Rc<dyn DashboardTransport>,
    observers: RefCell<Vec<Rc<dyn PanelObserver>>>,
}

/// Controller owning the detail pane of one dashboard.
#[derive(Clone)]
pub struct PanelController {
    inner: Rc<PanelInner>,
}

impl PanelController {
    pub(crate) fn new(
        context: Rc<ContextDescriptor>,
        state: SharedHandle,
        transport: Rc<dyn DashboardTransport>,
    ) -> Self {
        Self {
            inner: Rc::new(PanelInner {
                context,
                state,
                transport,
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn add_observer(&self, observer: Rc<dyn PanelObserver>) {
        self.inner.observers.borrow_mut().push(observer);
    }

    /// Snapshot of the current panel state.
    pub fn state(&self) -> PanelState {
        self.inner.state.borrow().panel.clone()
    }

    /// Last good detail, if any.
    pub fn detail(&self) -> Option<DetailView> {
        self.inner.state.borrow().detail.clone()
    }

    /// Opens `detail_id`.
    ///
    /// The request is issued before this returns; the future applies the
    /// response if no newer intent superseded it.
    pub fn open(&self, detail_id: u64) -> LocalBoxFuture<'static, Settled> {
        let inner = &self.inner;
        let status = {
            let state = inner.state.borrow();
            let panel = &state.panel;
            if matches!(panel.status, PanelStatus::Open | PanelStatus::Opening)
                && panel.active_detail_id == Some(detail_id)
            {
                debug!(
                    "event=panel_open_skipped module=panel status=skipped context={} detail_id={}",
                    inner.context.id(),
                    detail_id
                );
                return future::ready(Settled::Unchanged).boxed_local();
            }
            panel.status
        };

        if status == PanelStatus::Open {
            inner.run_exit();
        }
        if inner.state.borrow().panel.status == PanelStatus::Closed {
            inner.transition(PanelStatus::Opening);
        }

        let token = {
            let mut state = inner.state.borrow_mut();
            state.panel.request_token += 1;
            state.generation += 1;
            state.panel.active_detail_id = Some(detail_id);
            state.panel.error = None;
            state.detail = None;
            state.tabs.reset();
            state.panel.request_token
        };
        inner.fetch(detail_id, token)
    }

    /// Re-fetches the active detail under a fresh token without changing
    /// status. No-op unless the panel is open.
    pub fn refresh(&self) -> LocalBoxFuture<'static, Settled> {
        let inner = &self.inner;
        let (detail_id, token) = {
            let mut state = inner.state.borrow_mut();
            let panel = &mut state.panel;
            let Some(detail_id) = panel.active_detail_id else {
                return future::ready(Settled::Unchanged).boxed_local();
            };
            if panel.status != PanelStatus::Open {
                return future::ready(Settled::Unchanged).boxed_local();
            }
            panel.request_token += 1;
            (detail_id, panel.request_token)
        };
        inner.fetch(detail_id, token)
    }

    /// Closes the panel and resets tab state. Every in-flight response is
    /// invalidated. Returns `false` when the panel was already closed.
    pub fn close(&self) -> bool {
        let inner = &self.inner;
        let status = {
            let mut state = inner.state.borrow_mut();
            state.panel.request_token += 1;
            state.generation += 1;
            state.panel.status
        };
        match status {
            PanelStatus::Open => inner.run_exit(),
            PanelStatus::Opening => {
                inner.transition(PanelStatus::Closed);
                inner.clear();
            }
            PanelStatus::Closed | PanelStatus::Closing => return false,
        }
        true
    }

    /// Clears the error overlay without touching content or status.
    pub fn dismiss_error(&self) {
        self.inner.state.borrow_mut().panel.error = None;
    }
}

impl PanelInner {
    fn fetch(self: &Rc<Self>, detail_id: u64, token: u64) -> LocalBoxFuture<'static, Settled> {
        let request = DetailRequest {
            id: detail_id,
            token: self.context.auth_token().to_string(),
            action: self.context.detail_action().to_string(),
        };
        debug!(
            "event=detail_fetch_issued module=panel status=ok context={} detail_id={} token={}",
            self.context.id(),
            detail_id,
            token
        );
        let response = self.transport.fetch_detail(request);
        let inner = Rc::clone(self);
        async move {
            let result = response.await.and_then(|envelope| envelope.into_result());
            inner.settle(detail_id, token, result)
        }
        .boxed_local()
    }

    fn settle(
        &self,
        detail_id: u64,
        captured: u64,
        result: Result<DetailPayload, TransportError>,
    ) -> Settled {
        let live = self.state.borrow().panel.request_token;
        if captured != live {
            debug!(
                "event=stale_response_discarded module=panel status=stale kind=detail detail_id={} captured={} live={}",
                detail_id, captured, live
            );
            return Settled::Stale { captured, live };
        }

        let status = self.state.borrow().panel.status;
        match result {
            Ok(payload) => {
                {
                    let mut state = self.state.borrow_mut();
                    for (tab_id, content) in payload.tabs {
                        if state.tabs.set.contains(&tab_id) {
                            state.tabs.store(&tab_id, content);
                        }
                    }
                    state.detail = Some(DetailView {
                        detail_id,
                        title: payload.title,
                        data: payload.data,
                    });
                    state.panel.error = None;
                }
                if status == PanelStatus::Opening {
                    self.transition(PanelStatus::Open);
                }
                Settled::Applied
            }
            Err(err) => {
                warn!(
                    "event=detail_fetch_failed module=panel status=error context={} detail_id={} reason={}",
                    self.context.id(),
                    detail_id,
                    err
                );
                if status == PanelStatus::Opening {
                    self.transition(PanelStatus::Closed);
                    self.clear();
                }
                self.state.borrow_mut().panel.error = Some(err.clone());
                Settled::Failed(err)
            }
        }
    }

    /// `open -> closing -> closed`, clearing detail and tab state.
    fn run_exit(&self) {
        if self.transition(PanelStatus::Closing) {
            self.transition(PanelStatus::Closed);
        }
        self.clear();
    }

    fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.panel.active_detail_id = None;
        state.panel.error = None;
        state.detail = None;
        state.tabs.reset();
    }

    fn transition(&self, to: PanelStatus) -> bool {
        let (from, token) = {
            let mut state = self.state.borrow_mut();
            let from = state.panel.status;
            if !from.can_transition_to(to) {
                error!(
                    "event=panel_transition module=panel status=error context={} from={} to={} reason=illegal_edge",
                    self.context.id(),
                    from,
                    to
                );
                return false;
            }
            state.panel.status = to;
            (from, state.panel.request_token)
        };
        info!(
            "event=panel_transition module=panel status=ok context={} from={} to={} token={}",
            self.context.id(),
            from,
            to,
            token
        );
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer.on_transition(from, to);
        }
        true
    }
}
