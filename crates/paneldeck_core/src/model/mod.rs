//! Value types shared by the server-side renderer and client controllers.
//!
//! # Responsibility
//! - Define contribution payloads and the request scope producers see.
//! - Define tab and statistic descriptors contributed through extension
//!   points.
//!
//! # Invariants
//! - Tab ids are unique per context and safe to embed in location fragments.
//! - Tab and stat order is always ascending priority, ties by contribution
//!   order.

pub mod payload;
pub mod stat;
pub mod tab;
