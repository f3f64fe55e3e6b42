//! Inference session capability.
//!
//! A session is opened once per connection and runs one chunk at a time.
//! Which implementation backs it is decided by the `SessionFactory` handed to
//! the server; business logic never probes for a backend at runtime.

pub mod noop;
pub mod remote;

pub use noop::{NoopSession, NoopSessionFactory};

use {
    crate::{error::InferError, result::InferenceResult, scheduler::Chunk},
    async_trait::async_trait,
    http::HeaderMap,
    std::{net::SocketAddr, sync::Arc},
};

#[async_trait]
pub trait InferenceSession: Send + Sync {
    /// Short name for logs, e.g. "remote" or "noop".
    fn kind(&self) -> &'static str;

    /// Narrate one chunk. May take far longer than a frame interval.
    async fn run(&self, chunk: Chunk, prompt: &str) -> Result<InferenceResult, InferError>;

    /// Release remote resources. Best effort.
    async fn close(&self) -> Result<(), InferError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a session for a new connection.
    ///
    /// Never fails: an unreachable or unauthenticated backend yields a
    /// `NoopSession` instead.
    async fn open(&self, info: &ConnectInfo) -> Arc<dyn InferenceSession>;
}

/// What a factory may know about the connection it opens a session for.
#[derive(Debug, Clone, Default)]
pub struct ConnectInfo {
    pub peer: Option<SocketAddr>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl ConnectInfo {
    pub fn new(peer: Option<SocketAddr>, headers: HeaderMap, query: Option<&str>) -> Self {
        let query = query
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self {
            peer,
            headers,
            query,
        }
    }

    /// Non-empty, trimmed header value.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Non-empty, trimmed query parameter value. The first occurrence wins.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}
