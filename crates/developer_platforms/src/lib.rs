//! # Campaign Runner Developer Platforms
//!
//! Clients for the remote systems a code-fix campaign talks to:
//!
//! - the code-transformation service, reached through a GraphQL endpoint
//!   ([`moderne::ModerneGraphQlClient`] and the typed [`moderne::ModerneClient`])
//! - repository hosts and static data sources, reached through plain HTTP
//!   ([`github::HttpFileFetcher`])
//!
//! The two seams the rest of the workspace depends on are the
//! [`QueryExecutor`] and [`FileFetcher`] traits. Tests replace them with
//! in-memory implementations.

use async_trait::async_trait;
use serde_json::Value;

pub mod auth;

pub mod errors;

pub mod github;

pub mod models;

pub mod moderne;

pub mod paged;
use errors::Error;

/// Executes GraphQL documents against the code-transformation service.
///
/// Implementations are scoped resources: `connect` must be called before the
/// first `execute`, and `close` must be called on every exit path to release
/// the underlying connection pool.
///
/// # Example Implementation
///
/// ```rust
/// use async_trait::async_trait;
/// use campaign_runner_developer_platforms::{errors::Error, QueryExecutor};
/// use serde_json::{json, Value};
///
/// struct EchoExecutor;
///
/// #[async_trait]
/// impl QueryExecutor for EchoExecutor {
///     async fn connect(&self) -> Result<(), Error> {
///         Ok(())
///     }
///
///     async fn execute(&self, _document: &str, variables: Value) -> Result<Value, Error> {
///         Ok(json!({ "echo": variables }))
///     }
///
///     async fn close(&self) -> Result<(), Error> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Opens the connection pool used by subsequent queries.
    async fn connect(&self) -> Result<(), Error>;

    /// Executes a query or mutation document with the given variables.
    ///
    /// # Arguments
    ///
    /// * `document` - The GraphQL document
    /// * `variables` - A JSON object holding the named variables
    ///
    /// # Returns
    ///
    /// The `data` member of the response. A request that exceeds the
    /// configured timeout fails with [`Error::Timeout`]; every other failure
    /// uses a different variant.
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, Error>;

    /// Releases the connection pool. Calling `close` twice is harmless.
    async fn close(&self) -> Result<(), Error>;
}

/// Fetches static files over HTTP.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Fetch the content of the file at the given URL.
    /// Returns Ok(Some(content)) on 200, Ok(None) on 404, or Err on any other status.
    async fn fetch_file(&self, url: &str) -> Result<Option<String>, Error>;
}
