use super::*;
use std::time::Duration;

#[tokio::test]
async fn test_interrupted_resolves_on_signal() {
    let result = tokio::time::timeout(Duration::from_secs(1), interrupted(async { Ok(()) })).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_failed_signal_listener_never_interrupts() {
    let listener = interrupted(async { Err(io::Error::other("no signal handler")) });

    let result = tokio::time::timeout(Duration::from_millis(50), listener).await;

    assert!(result.is_err());
}
