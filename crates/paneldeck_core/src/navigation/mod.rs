//! Deep-link navigation.
//!
//! # Responsibility
//! - Map location fragments to (detail id, tab id) and back.
//! - Own browser-history integration through the `History` seam.
//!
//! # Invariants
//! - `parse(build(id, tab)) == (id, tab)` for every id and fragment-safe tab.
//! - Malformed fragments never fail a caller; they mean "no deep link".
//!
//! Fragment grammar: `#<namespace>-<id>` optionally followed by
//! `&tab=<tabId>`.

pub mod history;
pub mod location;

pub use history::{History, MemoryHistory};
pub use location::{DeepLink, NavigationError, NavigationResolver};
