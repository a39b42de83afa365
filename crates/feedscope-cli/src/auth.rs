//! Bearer token sources.
//!
//! # Design
//! - Tokens are issued by the external identity provider; this crate only reads them.
//! - Every request asks its provider again, so a rotated token is picked up without restart.
//! - Blank tokens count as signed out.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Environment variable consulted when no explicit token source is configured.
pub(crate) const TOKEN_ENV: &str = "FEEDSCOPE_TOKEN";

/// Failures while reading a token source.
#[derive(Debug, Error)]
pub(crate) enum TokenError {
    /// The token file could not be read.
    #[error("failed to read token file '{path}': {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

/// Source of bearer tokens for outbound requests.
#[async_trait]
pub(crate) trait TokenProvider: Send + Sync {
    /// Fetch the current token, `None` when signed out.
    async fn token(&self) -> Result<Option<String>, TokenError>;
}

/// Token fixed for the lifetime of the process.
#[derive(Clone, Debug)]
pub(crate) struct StaticToken(pub(crate) Option<String>);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>, TokenError> {
        Ok(normalize(self.0.clone()))
    }
}

/// Token read from an environment variable on every call.
#[derive(Clone, Debug)]
pub(crate) struct EnvToken {
    pub(crate) var: String,
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self) -> Result<Option<String>, TokenError> {
        Ok(normalize(std::env::var(&self.var).ok()))
    }
}

/// Token read from a file on every call; a missing file means signed out.
#[derive(Clone, Debug)]
pub(crate) struct FileToken {
    pub(crate) path: PathBuf,
}

#[async_trait]
impl TokenProvider for FileToken {
    async fn token(&self) -> Result<Option<String>, TokenError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(normalize(Some(contents))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TokenError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn normalize(token: Option<String>) -> Option<String> {
    token
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
