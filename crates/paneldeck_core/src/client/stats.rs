//! Client statistics board.
//!
//! Registered stat ids are filled from the statistics fetch; missing keys
//! render as zero and unknown keys are ignored. Refreshes follow the same
//! last-intent-wins token rule as the panel.

use crate::client::Settled;
use crate::context::ContextDescriptor;
use crate::model::stat::StatDescriptor;
use crate::transport::{DashboardTransport, StatsRequest, TransportError};
use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One stat card with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct StatValue {
    pub descriptor: StatDescriptor,
    pub value: f64,
}

#[derive(Debug, Default)]
struct StatsState {
    values: BTreeMap<String, f64>,
    token: u64,
    error: Option<TransportError>,
}

struct StatsInner {
    context: Rc<ContextDescriptor>,
    stats: Vec<StatDescriptor>,
    transport: Rc<dyn DashboardTransport>,
    state: RefCell<StatsState>,
}

/// Statistics cards of one dashboard.
#[derive(Clone)]
pub struct StatsBoard {
    inner: Rc<StatsInner>,
}

impl StatsBoard {
    pub(crate) fn new(
        context: Rc<ContextDescriptor>,
        stats: Vec<StatDescriptor>,
        transport: Rc<dyn DashboardTransport>,
    ) -> Self {
        Self {
            inner: Rc::new(StatsInner {
                context,
                stats,
                transport,
                state: RefCell::new(StatsState::default()),
            }),
        }
    }

    pub fn descriptors(&self) -> &[StatDescriptor] {
        &self.inner.stats
    }

    /// Every registered stat in priority order; missing values are zero.
    pub fn values(&self) -> Vec<StatValue> {
        let state = self.inner.state.borrow();
        self.inner
            .stats
            .iter()
            .map(|descriptor| StatValue {
                value: state.values.get(&descriptor.id).copied().unwrap_or(0.0),
                descriptor: descriptor.clone(),
            })
            .collect()
    }

    pub fn value(&self, stat_id: &str) -> Option<f64> {
        self.values()
            .into_iter()
            .find(|stat| stat.descriptor.id == stat_id)
            .map(|stat| stat.value)
    }

    pub fn error(&self) -> Option<TransportError> {
        self.inner.state.borrow().error.clone()
    }

    /// Fetches fresh values; a later refresh supersedes this one.
    pub fn refresh(&self) -> LocalBoxFuture<'static, Settled> {
        let inner = Rc::clone(&self.inner);
        let token = {
            let mut state = inner.state.borrow_mut();
            state.token += 1;
            state.token
        };
        let request = StatsRequest {
            token: inner.context.auth_token().to_string(),
            action: inner.context.stats_action().to_string(),
        };
        let response = inner.transport.fetch_stats(request);
        async move {
            let result = response.await.and_then(|envelope| envelope.into_result());
            inner.settle(token, result)
        }
        .boxed_local()
    }
}

impl StatsInner {
    fn settle(&self, captured: u64, result: Result<BTreeMap<String, f64>, TransportError>) -> Settled {
        let mut state = self.state.borrow_mut();
        if captured != state.token {
            debug!(
                "event=stale_response_discarded module=stats status=stale kind=stats captured={} live={}",
                captured, state.token
            );
            return Settled::Stale {
                captured,
                live: state.token,
            };
        }
        match result {
            Ok(values) => {
                state.values = self
                    .stats
                    .iter()
                    .filter_map(|stat| values.get(&stat.id).map(|value| (stat.id.clone(), *value)))
                    .collect();
                state.error = None;
                Settled::Applied
            }
            Err(err) => {
                warn!(
                    "event=stats_fetch_failed module=stats status=error context={} reason={}",
                    self.context.id(),
                    err
                );
                state.error = Some(err.clone());
                Settled::Failed(err)
            }
        }
    }
}
