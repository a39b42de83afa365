//! REST client for the feedback-insights backend, plus CLI error classification.

use std::fmt::{self, Display, Formatter};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use feedscope_api_models::{
    DeleteAck, ErrorBody, Product, ProductCreate, QuestionRequest, TaskQueueResult,
};
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::auth::{TokenError, TokenProvider};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// Failures surfaced by [`ApiClient`] operations.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    /// No usable token; raised before any request is sent.
    #[error("Authentication token not found. Please sign in again.")]
    AuthTokenMissing,
    /// The token source itself failed.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Non-2xx response.
    #[error("{message}")]
    Http {
        /// Response status.
        status: StatusCode,
        /// Message extracted from the error body.
        message: String,
    },
    /// Connection, timeout, or body read failure.
    #[error("request to {path} failed: {source}")]
    Transport {
        /// Request path.
        path: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// 2xx body that did not match the expected shape.
    #[error("failed to parse response from {path}: {source}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Base URL and path could not be combined.
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// 2xx acknowledgment carrying an error payload.
    #[error("{0}")]
    Rejected(String),
}

/// Chunked answer streamed back by the `ask` endpoint.
pub(crate) struct AnswerStream {
    path: String,
    body: Pin<Box<dyn Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>,
    pending: Vec<u8>,
}

impl AnswerStream {
    /// Next decoded chunk of text. Multi-byte characters split across chunks are reassembled.
    pub(crate) async fn next_chunk(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            match self.body.next().await {
                Some(Ok(bytes)) => {
                    self.pending.extend_from_slice(&bytes);
                    let text = take_utf8_prefix(&mut self.pending);
                    if !text.is_empty() {
                        return Some(Ok(text));
                    }
                }
                Some(Err(source)) => {
                    return Some(Err(ApiError::Transport {
                        path: self.path.clone(),
                        source,
                    }));
                }
                None if self.pending.is_empty() => return None,
                None => {
                    let rest = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    return Some(Ok(rest));
                }
            }
        }
    }
}

fn take_utf8_prefix(buffer: &mut Vec<u8>) -> String {
    let valid = match std::str::from_utf8(buffer) {
        Ok(_) => buffer.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(_) => {
            let text = String::from_utf8_lossy(buffer).into_owned();
            buffer.clear();
            return text;
        }
    };
    let rest = buffer.split_off(valid);
    let text = String::from_utf8_lossy(buffer).into_owned();
    *buffer = rest;
    text
}

/// Typed wrapper over the backend's product endpoints.
#[derive(Clone)]
pub(crate) struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub(crate) fn new(http: Client, base_url: Url, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// Build the HTTP client with the per-invocation request id and timeout.
    pub(crate) fn build_http(timeout: Duration, trace_id: &str) -> CliResult<Client> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
    }

    /// Whether the token source currently yields a usable token.
    pub(crate) async fn signed_in(&self) -> Result<bool, ApiError> {
        Ok(self.tokens.token().await?.is_some())
    }

    /// `GET /products`
    pub(crate) async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let path = "products";
        let url = self.endpoint(path)?;
        let response = self.execute(self.http.get(url), path).await?;
        decode(response, path).await
    }

    /// `POST /products`
    pub(crate) async fn create_product(&self, draft: &ProductCreate) -> Result<Product, ApiError> {
        let path = "products";
        let url = self.endpoint(path)?;
        let response = self.execute(self.http.post(url).json(draft), path).await?;
        decode(response, path).await
    }

    /// `DELETE /products/{id}`
    pub(crate) async fn delete_product(&self, id: i64) -> Result<DeleteAck, ApiError> {
        let path = format!("products/{id}");
        let url = self.endpoint(&path)?;
        let response = self.execute(self.http.delete(url), &path).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(DeleteAck::default());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;
        Ok(serde_json::from_slice::<DeleteAck>(&bytes).unwrap_or_default())
    }

    /// `POST /products/{id}/ingest`
    pub(crate) async fn trigger_ingestion(&self, id: i64) -> Result<TaskQueueResult, ApiError> {
        self.post_trigger(&format!("products/{id}/ingest")).await
    }

    /// `POST /products/{id}/email-report`
    pub(crate) async fn trigger_email_report(&self, id: i64) -> Result<TaskQueueResult, ApiError> {
        self.post_trigger(&format!("products/{id}/email-report"))
            .await
    }

    /// `POST /products/{id}/ask`, streaming the answer as it is produced.
    pub(crate) async fn ask(&self, id: i64, question: &str) -> Result<AnswerStream, ApiError> {
        let path = format!("products/{id}/ask");
        let url = self.endpoint(&path)?;
        let body = QuestionRequest {
            question: question.to_string(),
        };
        let response = self.execute(self.http.post(url).json(&body), &path).await?;
        Ok(AnswerStream {
            path,
            body: Box::pin(response.bytes_stream()),
            pending: Vec::new(),
        })
    }

    async fn post_trigger(&self, path: &str) -> Result<TaskQueueResult, ApiError> {
        let url = self.endpoint(path)?;
        let response = self
            .execute(self.http.post(url).json(&json!({})), path)
            .await?;
        decode(response, path).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    async fn bearer(&self) -> Result<String, ApiError> {
        self.tokens.token().await?.ok_or(ApiError::AuthTokenMissing)
    }

    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let token = self.bearer().await?;
        tracing::debug!(path, "sending request");
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "request succeeded");
            Ok(response)
        } else {
            let err = classify_response(response).await;
            tracing::warn!(path, status = status.as_u16(), error = %err, "request failed");
            Err(err)
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Convert a non-2xx response into an [`ApiError::Http`].
pub(crate) async fn classify_response(response: Response) -> ApiError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&bytes).trim().to_string();

    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.summary())
        .or_else(|| (!body_text.is_empty()).then_some(body_text))
        .unwrap_or_else(|| format!("request failed with status {status}"));

    ApiError::Http { status, message }
}

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::AuthTokenMissing => Self::validation(err.to_string()),
            ApiError::Http { status, .. }
                if matches!(
                    *status,
                    StatusCode::BAD_REQUEST
                        | StatusCode::CONFLICT
                        | StatusCode::UNPROCESSABLE_ENTITY
                ) =>
            {
                Self::validation(err.to_string())
            }
            _ => Self::failure(err),
        }
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
