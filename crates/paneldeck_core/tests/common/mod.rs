#![allow(dead_code)]

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use paneldeck_core::{
    Contribution, ContextDescriptor, Dashboard, DashboardTransport, DetailEnvelope, DetailRequest,
    ExtensionPoint, ExtensionRegistry, FetchResult, History, MemoryHistory, PanelObserver,
    PanelStatus, Payload, ResolutionMode, StatDescriptor, StatsEnvelope, StatsRequest,
    TabDescriptor, TabEnvelope, TabRequest, TransportError,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

type Reply<T> = oneshot::Sender<FetchResult<T>>;
type Answer<Req, T> = RefCell<Option<Box<dyn Fn(&Req) -> FetchResult<T>>>>;
type Issued<Req, T> = RefCell<Vec<(Req, Option<Reply<T>>)>>;

/// Transport that records every request as it is issued.
///
/// Without an answer function a request stays pending until the test calls
/// `reply_*` with its index, so arrival order is fully scripted.
#[derive(Default)]
pub struct ScriptedTransport {
    details: Issued<DetailRequest, DetailEnvelope>,
    tabs: Issued<TabRequest, TabEnvelope>,
    stats: Issued<StatsRequest, StatsEnvelope>,
    detail_answer: Answer<DetailRequest, DetailEnvelope>,
    tab_answer: Answer<TabRequest, TabEnvelope>,
    stats_answer: Answer<StatsRequest, StatsEnvelope>,
}

impl ScriptedTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Transport answering every detail and tab fetch immediately.
    pub fn answering() -> Rc<Self> {
        let transport = Self::new();
        transport.answer_details_with(detail_ok);
        transport.answer_tabs_with(tab_ok);
        transport
    }

    pub fn answer_details_with(
        &self,
        answer: impl Fn(&DetailRequest) -> FetchResult<DetailEnvelope> + 'static,
    ) {
        *self.detail_answer.borrow_mut() = Some(Box::new(answer));
    }

    pub fn answer_tabs_with(
        &self,
        answer: impl Fn(&TabRequest) -> FetchResult<TabEnvelope> + 'static,
    ) {
        *self.tab_answer.borrow_mut() = Some(Box::new(answer));
    }

    pub fn answer_stats_with(
        &self,
        answer: impl Fn(&StatsRequest) -> FetchResult<StatsEnvelope> + 'static,
    ) {
        *self.stats_answer.borrow_mut() = Some(Box::new(answer));
    }

    /// Switches detail fetches back to scripted replies.
    pub fn hold_details(&self) {
        *self.detail_answer.borrow_mut() = None;
    }

    pub fn hold_tabs(&self) {
        *self.tab_answer.borrow_mut() = None;
    }

    pub fn hold_stats(&self) {
        *self.stats_answer.borrow_mut() = None;
    }

    pub fn detail_requests(&self) -> Vec<DetailRequest> {
        self.details.borrow().iter().map(|(request, _)| request.clone()).collect()
    }

    pub fn tab_requests(&self) -> Vec<TabRequest> {
        self.tabs.borrow().iter().map(|(request, _)| request.clone()).collect()
    }

    pub fn stats_requests(&self) -> Vec<StatsRequest> {
        self.stats.borrow().iter().map(|(request, _)| request.clone()).collect()
    }

    pub fn reply_detail(&self, index: usize, result: FetchResult<DetailEnvelope>) {
        reply(&self.details, index, result);
    }

    pub fn reply_tab(&self, index: usize, result: FetchResult<TabEnvelope>) {
        reply(&self.tabs, index, result);
    }

    pub fn reply_stats(&self, index: usize, result: FetchResult<StatsEnvelope>) {
        reply(&self.stats, index, result);
    }
}

impl DashboardTransport for ScriptedTransport {
    fn fetch_detail(
        &self,
        request: DetailRequest,
    ) -> LocalBoxFuture<'static, FetchResult<DetailEnvelope>> {
        issue(&self.details, &self.detail_answer, request)
    }

    fn fetch_tab(&self, request: TabRequest) -> LocalBoxFuture<'static, FetchResult<TabEnvelope>> {
        issue(&self.tabs, &self.tab_answer, request)
    }

    fn fetch_stats(
        &self,
        request: StatsRequest,
    ) -> LocalBoxFuture<'static, FetchResult<StatsEnvelope>> {
        issue(&self.stats, &self.stats_answer, request)
    }
}

fn issue<Req, T: 'static>(
    issued: &Issued<Req, T>,
    answer: &Answer<Req, T>,
    request: Req,
) -> LocalBoxFuture<'static, FetchResult<T>> {
    if let Some(answer) = answer.borrow().as_ref() {
        let result = answer(&request);
        issued.borrow_mut().push((request, None));
        return future::ready(result).boxed_local();
    }
    let (sender, receiver) = oneshot::channel();
    issued.borrow_mut().push((request, Some(sender)));
    async move {
        receiver
            .await
            .unwrap_or_else(|_| Err(TransportError::Network("reply dropped".to_string())))
    }
    .boxed_local()
}

fn reply<Req, T>(issued: &Issued<Req, T>, index: usize, result: FetchResult<T>) {
    let sender = issued.borrow_mut()[index]
        .1
        .take()
        .expect("request still pending");
    let _ = sender.send(result);
}

pub fn detail_ok(request: &DetailRequest) -> FetchResult<DetailEnvelope> {
    Ok(DetailEnvelope::success(
        format!("Customer {}", request.id),
        json!({ "id": request.id }),
    ))
}

pub fn tab_ok(request: &TabRequest) -> FetchResult<TabEnvelope> {
    Ok(TabEnvelope::success(
        json!({ "customer": request.id, "tab": request.tab }),
    ))
}

pub fn customer_context() -> ContextDescriptor {
    ContextDescriptor::builder("customer")
        .with_tabs(true)
        .with_stats(true)
        .auth_token("nonce-1")
        .build()
        .expect("customer context")
}

/// `details` (inline, p10), `membership` (deferred, p20), `orders`
/// (deferred, p30) and stats `total`, `active`, `inactive`.
pub fn customer_registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    registry
        .register(
            &ExtensionPoint::TabsRegistry,
            "customer",
            ResolutionMode::CollectAll,
            Contribution::fixed(
                "core",
                10,
                Payload::Tabs(vec![
                    TabDescriptor::deferred("membership", "Membership", 20),
                    TabDescriptor::inline("details", "Details", 10, "customer/details"),
                ]),
            ),
        )
        .expect("core tabs");
    registry
        .register(
            &ExtensionPoint::TabsRegistry,
            "customer",
            ResolutionMode::CollectAll,
            Contribution::fixed(
                "orders-addon",
                20,
                Payload::Tabs(vec![TabDescriptor::deferred("orders", "Orders", 30)]),
            ),
        )
        .expect("addon tabs");
    registry
        .register(
            &ExtensionPoint::StatsContent,
            "customer",
            ResolutionMode::CollectAll,
            Contribution::fixed(
                "core",
                10,
                Payload::Stats(vec![
                    StatDescriptor::new("total", "Total", 10),
                    StatDescriptor::new("active", "Active", 20),
                    StatDescriptor::new("inactive", "Inactive", 30),
                ]),
            ),
        )
        .expect("stats");
    registry
}

pub fn mount(transport: &Rc<ScriptedTransport>, history: &Rc<MemoryHistory>) -> Dashboard {
    let transport: Rc<dyn DashboardTransport> = transport.clone();
    let history: Rc<dyn History> = history.clone();
    Dashboard::mount(customer_context(), &customer_registry(), transport, history)
        .expect("dashboard mounts")
}

/// Records every panel transition.
#[derive(Default)]
pub struct RecordingObserver {
    transitions: RefCell<Vec<(PanelStatus, PanelStatus)>>,
}

impl RecordingObserver {
    pub fn transitions(&self) -> Vec<(PanelStatus, PanelStatus)> {
        self.transitions.borrow().clone()
    }
}

impl PanelObserver for RecordingObserver {
    fn on_transition(&self, from: PanelStatus, to: PanelStatus) {
        self.transitions.borrow_mut().push((from, to));
    }
}
