use super::*;
use anyhow::anyhow;
use campaign_runner_core::filters::FilterReason;
use std::time::Duration;

#[test]
fn test_config_error_display() {
    let err = CliError::ConfigError("bad config".to_string());
    assert_eq!(format!("{}", err), "Configuration error: bad config");
}

#[test]
fn test_interrupted_display() {
    assert_eq!(format!("{}", CliError::Interrupted), "Interrupted by user");
}

#[test]
fn test_exit_codes() {
    assert_eq!(CliError::ConfigError(String::new()).exit_code(), 2);
    assert_eq!(CliError::AuthError(String::new()).exit_code(), 3);
    assert_eq!(CliError::NetworkError(String::new()).exit_code(), 4);
    assert_eq!(CliError::InvalidArguments(String::new()).exit_code(), 5);
    assert_eq!(CliError::Interrupted.exit_code(), 130);
    assert_eq!(CliError::Other(String::new()).exit_code(), 1);
}

#[test]
fn test_from_anyhow_error() {
    let err: CliError = anyhow!("anyhow error").into();
    assert!(matches!(err, CliError::Other(_)));
}

#[test]
fn test_platform_errors_map_to_categories() {
    let timeout: CliError = PlatformError::Timeout {
        elapsed: Duration::from_secs(55),
    }
    .into();
    let missing: CliError =
        PlatformError::MissingEnvironmentVariables(vec!["GPG_KEY_PASSPHRASE".to_string()]).into();
    let graphql: CliError = PlatformError::GraphQl(vec!["Unauthorized".to_string()]).into();

    assert!(matches!(timeout, CliError::NetworkError(_)));
    assert!(matches!(missing, CliError::AuthError(_)));
    assert!(matches!(graphql, CliError::NetworkError(_)));
}

#[test]
fn test_campaign_errors_map_to_categories() {
    let wrapped: CliError = CampaignError::Platform(PlatformError::AuthError("no token".to_string())).into();
    let load: CliError = CampaignError::CampaignLoad {
        name: "https".to_string(),
        message: "missing".to_string(),
    }
    .into();
    let repository: CliError = CampaignError::InvalidRepository("acme".to_string()).into();
    let unregistered: CliError = CampaignError::UnregisteredFilter(FilterReason::Other).into();

    assert!(matches!(wrapped, CliError::AuthError(_)));
    assert!(matches!(load, CliError::ConfigError(_)));
    assert!(matches!(repository, CliError::InvalidArguments(_)));
    assert!(matches!(unregistered, CliError::ConfigError(_)));
}

#[test]
fn test_recovery_exhaustion_is_a_network_error() {
    let err: CliError = CampaignError::RecoveryExhausted {
        correlation_token: "abc".to_string(),
        attempts: 20,
        source: PlatformError::Timeout {
            elapsed: Duration::from_secs(55),
        },
    }
    .into();

    match err {
        CliError::NetworkError(message) => {
            assert!(message.contains("correlation token 'abc'"));
            assert!(message.ends_with(": The remote service timed out after 55s. Please try again later"));
        }
        other => panic!("expected network error, got {:?}", other),
    }
}
