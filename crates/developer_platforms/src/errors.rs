use std::time::Duration;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error types for remote platform operations.
///
/// This enum represents every failure that can occur when talking to the
/// code-transformation service or to a repository host. Timeouts are kept
/// separate from all other transport failures because the campaign executor
/// reacts to them differently when a recipe run is submitted.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use campaign_runner_developer_platforms::errors::Error;
///
/// let timeout = Error::Timeout { elapsed: Duration::from_secs(55) };
/// assert!(timeout.is_timeout());
///
/// let not_connected = Error::NotConnected;
/// assert!(!not_connected.is_timeout());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials could not be discovered or were rejected.
    ///
    /// The string parameter describes which source was consulted and why it
    /// was not usable.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The remote service answered with GraphQL errors instead of data.
    #[error("The remote service returned errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// An HTTP request completed with an unexpected status code.
    ///
    /// Repository filters rely on this variant to abort a filtering pass
    /// when a data source answers with anything other than 200 or 404.
    #[error("Request to {url} failed with HTTP status {status}")]
    HttpStatus {
        /// The URL that was requested
        url: String,

        /// The HTTP status code that was received
        status: u16,
    },

    /// The response body was not in the expected shape.
    ///
    /// This covers missing fields, malformed JSON and unknown enum values.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// One or more required environment variables are not set.
    ///
    /// All missing names are collected before the error is raised so the
    /// caller can fix them in one go.
    #[error("Environment variables {0:?} are not set")]
    MissingEnvironmentVariables(Vec<String>),

    /// The client was used before `connect` or after `close`.
    #[error("Client is not connected. Call `connect` before executing queries")]
    NotConnected,

    /// A paged query kept reporting further pages beyond the configured limit.
    #[error("Paged query did not terminate after {0} pages")]
    PaginationLimitExceeded(usize),

    /// The request did not complete within the configured timeout.
    #[error("The remote service timed out after {elapsed:?}. Please try again later")]
    Timeout {
        /// How long the request ran before it was abandoned
        elapsed: Duration,
    },

    /// Any other transport failure (connection refused, TLS, DNS, ...).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Returns `true` when the failure was a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
