use super::*;

#[test]
fn test_executor_config_defaults() {
    let config = ExecutorConfig::default();

    assert_eq!(config.poll_interval(), Duration::from_secs(5));
    assert_eq!(config.recovery_attempts, 20);
    assert_eq!(config.recovery_delay(), Duration::from_secs(10));
    assert_eq!(config.max_pages, 10_000);
    assert_eq!(config.priority, RecipeRunPriority::Low);
    assert_eq!(config.fork_organization, "BulkSecurityGeneratorProjectV2");
    assert!(config.validate().is_ok());
}

#[test]
fn test_only_finished_and_canceled_are_terminal_by_default() {
    let config = ExecutorConfig::default();

    for state in RunState::ALL {
        let expected = matches!(state, RunState::Finished | RunState::Canceled);
        assert_eq!(config.is_terminal(state), expected, "state {}", state);
    }
}

#[test]
fn test_executor_config_from_partial_toml() {
    let config: ExecutorConfig = toml::from_str(
        r#"
            poll_interval_secs = 1
            terminal_run_states = ["FINISHED", "CANCELED", "ERROR"]
            priority = "NORMAL"
        "#,
    )
    .unwrap();

    assert_eq!(config.poll_interval_secs, 1);
    assert!(config.is_terminal(RunState::Error));
    assert_eq!(config.priority, RecipeRunPriority::Normal);
    assert_eq!(config.recovery_attempts, 20);
}

#[test]
fn test_validate_rejects_empty_terminal_states() {
    let config = ExecutorConfig {
        terminal_run_states: Vec::new(),
        ..ExecutorConfig::default()
    };

    assert!(matches!(
        config.validate(),
        Err(CampaignError::ConfigError(_))
    ));
}

#[test]
fn test_validate_rejects_zero_pages_and_attempts() {
    let no_pages = ExecutorConfig {
        max_pages: 0,
        ..ExecutorConfig::default()
    };
    let no_attempts = ExecutorConfig {
        recovery_attempts: 0,
        ..ExecutorConfig::default()
    };

    assert!(no_pages.validate().is_err());
    assert!(no_attempts.validate().is_err());
}

#[test]
fn test_filter_config_defaults() {
    let config = FilterConfig::default();

    assert_eq!(
        config.enabled,
        vec![
            FilterReason::GhRobotsTxt,
            FilterReason::TopTenThousand,
            FilterReason::Other
        ]
    );
    assert_eq!(config.robots_user_agents, vec!["JLLeitschuh/security-research"]);
    assert_eq!(config.robots_base_url, "https://raw.githubusercontent.com");
    assert!(config.exclusions.is_empty());
}

#[test]
fn test_filter_config_from_toml() {
    let config: FilterConfig = toml::from_str(
        r#"
            enabled = ["OTHER", "GH_ROBOTS_TXT"]

            [exclusions]
            "https://github.com/acme/fork" = ["Fork of acme/upstream"]
        "#,
    )
    .unwrap();

    assert_eq!(
        config.enabled,
        vec![FilterReason::Other, FilterReason::GhRobotsTxt]
    );
    assert_eq!(
        config.exclusions["https://github.com/acme/fork"],
        vec!["Fork of acme/upstream"]
    );
    assert_eq!(config.robots_user_agents, vec![DEFAULT_ROBOTS_USER_AGENT]);
}
