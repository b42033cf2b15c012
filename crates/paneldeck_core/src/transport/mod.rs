//! Fetch contracts and the transport seam used by client controllers.
//!
//! # Responsibility
//! - Define request/response envelopes for detail, tab and statistics
//!   fetches.
//! - Define the `DashboardTransport` trait implemented by the external
//!   data-provider collaborator.
//!
//! # Invariants
//! - Issuing a fetch happens when the trait method is called; the returned
//!   future only completes it.
//! - Transport failures are always recoverable; timeouts use the same path.

pub mod contract;

pub use contract::{
    DetailEnvelope, DetailPayload, DetailRequest, StatsEnvelope, StatsRequest, TabEnvelope,
    TabRequest,
};

use futures::future::LocalBoxFuture;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of one awaited fetch.
pub type FetchResult<T> = Result<T, TransportError>;

/// Recoverable fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Transport-level failure (connection, HTTP status, ...).
    Network(String),
    /// Provider answered `success: false`.
    Rejected(String),
    /// Response did not match the contract.
    Decode(String),
    /// Caller-supplied timeout elapsed.
    Timeout,
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(details) => write!(f, "network failure: {details}"),
            Self::Rejected(message) => write!(f, "request rejected: {message}"),
            Self::Decode(details) => write!(f, "malformed response: {details}"),
            Self::Timeout => write!(f, "request timed out"),
        }
    }
}

impl Error for TransportError {}

/// Client-side data provider.
///
/// The client runs single-threaded, so futures are not required to be
/// `Send`.
pub trait DashboardTransport {
    fn fetch_detail(
        &self,
        request: DetailRequest,
    ) -> LocalBoxFuture<'static, FetchResult<DetailEnvelope>>;

    fn fetch_tab(&self, request: TabRequest) -> LocalBoxFuture<'static, FetchResult<TabEnvelope>>;

    fn fetch_stats(
        &self,
        request: StatsRequest,
    ) -> LocalBoxFuture<'static, FetchResult<StatsEnvelope>>;
}
