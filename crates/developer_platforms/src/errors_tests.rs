use super::*;
use std::error::Error as StdError;

#[test]
fn test_auth_error() {
    let error = Error::AuthError("Token file is empty".to_string());

    assert_eq!(error.to_string(), "Authentication failed: Token file is empty");
    assert!(error.source().is_none());
    assert!(!error.is_timeout());
}

#[test]
fn test_graphql_error_joins_messages() {
    let error = Error::GraphQl(vec![
        "Recipe not found".to_string(),
        "Organization unknown".to_string(),
    ]);

    assert_eq!(
        error.to_string(),
        "The remote service returned errors: Recipe not found; Organization unknown"
    );
}

#[test]
fn test_http_status_error() {
    let error = Error::HttpStatus {
        url: "https://example.com/robots".to_string(),
        status: 500,
    };

    assert_eq!(
        error.to_string(),
        "Request to https://example.com/robots failed with HTTP status 500"
    );
}

#[test]
fn test_missing_environment_variables_names_every_variable() {
    let error = Error::MissingEnvironmentVariables(vec![
        "GPG_KEY_PASSPHRASE".to_string(),
        "GPG_KEY_PUBLIC_KEY".to_string(),
    ]);

    let message = error.to_string();
    assert!(message.contains("GPG_KEY_PASSPHRASE"));
    assert!(message.contains("GPG_KEY_PUBLIC_KEY"));
}

#[test]
fn test_not_connected_error() {
    let error = Error::NotConnected;

    assert_eq!(
        error.to_string(),
        "Client is not connected. Call `connect` before executing queries"
    );
}

#[test]
fn test_pagination_limit_error() {
    let error = Error::PaginationLimitExceeded(3);

    assert_eq!(error.to_string(), "Paged query did not terminate after 3 pages");
}

#[test]
fn test_timeout_is_timeout() {
    let error = Error::Timeout {
        elapsed: Duration::from_secs(2),
    };

    assert!(error.is_timeout());
    assert!(error.to_string().contains("timed out"));
}

#[test]
fn test_transport_error_is_not_timeout() {
    let error = Error::Transport("connection refused".to_string());

    assert!(!error.is_timeout());
    assert_eq!(error.to_string(), "Transport error: connection refused");
}
