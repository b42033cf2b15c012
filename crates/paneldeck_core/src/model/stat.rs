//! Statistic descriptors contributed through `stats-content`.

use serde::{Deserialize, Serialize};

/// One registered statistic card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDescriptor {
    /// Key matched 1:1 against the statistics-fetch `data` map.
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub priority: i32,
}

impl StatDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            priority,
        }
    }
}

/// Sorts stats by ascending priority; ties keep contribution order.
pub fn sort_stats(stats: &mut [StatDescriptor]) {
    stats.sort_by_key(|stat| stat.priority);
}
