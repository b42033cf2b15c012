//! Wire envelopes for detail, tab and statistics fetches.

use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const DETAIL_FAILURE_MESSAGE: &str = "could not load details";
const TAB_FAILURE_MESSAGE: &str = "could not load tab content";
const STATS_FAILURE_MESSAGE: &str = "could not load statistics";

/// Detail fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRequest {
    pub id: u64,
    /// Opaque auth token of the context.
    pub token: String,
    pub action: String,
}

/// Detail fetch response as sent by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Pre-rendered tab content keyed by tab id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tabs: BTreeMap<String, Value>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Successful, decoded detail response.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPayload {
    pub title: String,
    pub tabs: BTreeMap<String, Value>,
    pub data: Value,
}

impl DetailEnvelope {
    pub fn success(title: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            title: Some(title.into()),
            tabs: BTreeMap::new(),
            data,
            message: None,
        }
    }

    pub fn with_tab(mut self, tab_id: impl Into<String>, content: Value) -> Self {
        self.tabs.insert(tab_id.into(), content);
        self
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            title: None,
            tabs: BTreeMap::new(),
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    /// Converts the envelope into a typed result.
    ///
    /// # Errors
    /// - `Rejected` for `success: false`.
    /// - `Decode` for a successful envelope without `title`.
    pub fn into_result(self) -> Result<DetailPayload, TransportError> {
        if !self.success {
            return Err(TransportError::Rejected(
                self.message
                    .unwrap_or_else(|| DETAIL_FAILURE_MESSAGE.to_string()),
            ));
        }
        let title = self
            .title
            .ok_or_else(|| TransportError::Decode("detail response missing `title`".to_string()))?;
        Ok(DetailPayload {
            title,
            tabs: self.tabs,
            data: self.data,
        })
    }
}

/// Deferred tab fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRequest {
    pub id: u64,
    pub tab: String,
    pub token: String,
    pub action: String,
}

/// Deferred tab fetch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TabEnvelope {
    pub fn success(content: Value) -> Self {
        Self {
            success: true,
            content: Some(content),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            message: Some(message.into()),
        }
    }

    /// Default failure used when no producer contributes tab content.
    pub fn not_found() -> Self {
        Self::failure(TAB_FAILURE_MESSAGE)
    }

    pub fn into_result(self) -> Result<Value, TransportError> {
        if !self.success {
            return Err(TransportError::Rejected(
                self.message
                    .unwrap_or_else(|| TAB_FAILURE_MESSAGE.to_string()),
            ));
        }
        self.content
            .ok_or_else(|| TransportError::Decode("tab response missing `content`".to_string()))
    }
}

/// Statistics fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRequest {
    pub token: String,
    pub action: String,
}

/// Statistics fetch response; `data` maps stat ids to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatsEnvelope {
    pub fn success<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            success: true,
            data: values
                .into_iter()
                .map(|(key, value)| (key.into(), Value::from(value)))
                .collect(),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: BTreeMap::new(),
            message: Some(message.into()),
        }
    }

    /// Numeric values only; non-numeric entries are dropped.
    pub fn into_result(self) -> Result<BTreeMap<String, f64>, TransportError> {
        if !self.success {
            return Err(TransportError::Rejected(
                self.message
                    .unwrap_or_else(|| STATS_FAILURE_MESSAGE.to_string()),
            ));
        }
        Ok(self
            .data
            .into_iter()
            .filter_map(|(key, value)| value.as_f64().map(|number| (key, number)))
            .collect())
    }
}
