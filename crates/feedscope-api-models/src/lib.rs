#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
//! Shared HTTP DTOs for the feedback-insights API.
//!
//! These types mirror the backend's JSON contract so the client encodes requests
//! and decodes responses from a single definition. The backend owns every field
//! here; the client only holds transient copies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message synthesized when a delete is acknowledged without a body.
pub const DELETE_ACK_MESSAGE: &str = "Product deleted successfully";

/// Product registered by the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Backend-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Owner identifier derived by the backend from the caller's token.
    pub owner_id: String,
    /// Scraper configuration, when one has been attached.
    #[serde(default)]
    pub config: Option<ScraperConfig>,
}

/// Scraper configuration persisted alongside a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    /// Backend-assigned identifier.
    pub id: i64,
    /// Identifier of the owning product.
    pub product_id: i64,
    /// Free-text web search query; the backend falls back to the product name.
    #[serde(default)]
    pub search_query: Option<String>,
    /// YouTube keywords used to filter comments, in submission order.
    #[serde(default)]
    pub youtube_keywords: Vec<String>,
    /// Subreddit names without the `r/` prefix, in submission order.
    #[serde(default)]
    pub reddit_subreddits: Vec<String>,
}

/// Scraper parameters submitted when creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScraperConfigInput {
    /// Optional search query, serialized as `null` when absent.
    pub search_query: Option<String>,
    /// YouTube keywords.
    pub youtube_keywords: Vec<String>,
    /// Reddit subreddit names.
    pub reddit_subreddits: Vec<String>,
}

/// Request body for `POST /products`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductCreate {
    /// Product display name.
    pub name: String,
    /// Nested scraper configuration.
    pub config: ScraperConfigInput,
}

/// Acknowledgment returned when a background job was handed to the backend queue.
///
/// This is not a job handle: there is no way to poll for completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskQueueResult {
    /// Optional status tag such as `success` or `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error text some handlers return with a 2xx status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskQueueResult {
    /// Message describing why the backend refused the job despite answering 2xx.
    #[must_use]
    pub fn rejection(&self) -> Option<&str> {
        if let Some(error) = self.error.as_deref() {
            return Some(error);
        }
        if self.status.as_deref() == Some("error") {
            return Some(if self.message.is_empty() {
                "the backend rejected the request"
            } else {
                self.message.as_str()
            });
        }
        None
    }
}

/// Confirmation returned by `DELETE /products/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteAck {
    /// Human-readable confirmation.
    pub message: String,
}

impl Default for DeleteAck {
    fn default() -> Self {
        Self {
            message: DELETE_ACK_MESSAGE.to_string(),
        }
    }
}

/// Request body for `POST /products/{id}/ask`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionRequest {
    /// Natural-language question about the product's collected feedback.
    pub question: String,
}

/// Error envelope returned on non-2xx responses.
///
/// `detail` is either a plain string or a list of validation entries, depending
/// on whether the failure came from a handler or from request validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ErrorBody {
    /// Handler-provided detail or validation entries.
    #[serde(default)]
    pub detail: Option<Value>,
    /// Alternate message key used by some handlers.
    #[serde(default)]
    pub message: Option<String>,
    /// Alternate error key used by some handlers.
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message carried by the envelope.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let detail = self.detail.as_ref().and_then(|detail| match detail {
            Value::String(text) => Some(text.clone()),
            Value::Array(entries) => {
                let messages = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                    .collect::<Vec<_>>();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            Value::Null => None,
            other => Some(other.to_string()),
        });
        detail
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}
