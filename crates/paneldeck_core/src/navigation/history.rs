//! History seam and an in-memory implementation.

use std::cell::{Cell, RefCell};

/// Browser-history operations the resolver needs.
pub trait History {
    /// Adds an entry and drops any forward entries.
    fn push(&self, fragment: &str);
    /// Rewrites the current entry.
    fn replace(&self, fragment: &str);
    /// Fragment of the current entry.
    fn current(&self) -> String;
}

/// History stack kept in memory. Used by the CLI and tests; `back` and
/// `forward` return the fragment to feed into a pop handler.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<String>>,
    index: Cell<usize>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: RefCell::new(vec![initial.into()]),
            index: Cell::new(0),
        }
    }

    pub fn back(&self) -> Option<String> {
        let index = self.index.get();
        if index == 0 {
            return None;
        }
        self.index.set(index - 1);
        self.entries.borrow().get(index - 1).cloned()
    }

    pub fn forward(&self) -> Option<String> {
        let index = self.index.get() + 1;
        let entry = self.entries.borrow().get(index).cloned()?;
        self.index.set(index);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl History for MemoryHistory {
    fn push(&self, fragment: &str) {
        let mut entries = self.entries.borrow_mut();
        let index = self.index.get();
        entries.truncate(index + 1);
        entries.push(fragment.to_string());
        self.index.set(entries.len() - 1);
    }

    fn replace(&self, fragment: &str) {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.get_mut(self.index.get()) {
            *entry = fragment.to_string();
        }
    }

    fn current(&self) -> String {
        self.entries
            .borrow()
            .get(self.index.get())
            .cloned()
            .unwrap_or_default()
    }
}
