use super::*;
use std::collections::HashMap;
use tempfile::TempDir;

fn write_token_file(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("token.txt");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_token_file_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let path = write_token_file(&dir, "  abc123\n");

    let token = discover_api_token(Some(&path), Some("from-env".to_string())).unwrap();

    assert_eq!(token, "abc123");
}

#[test]
fn test_empty_token_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_token_file(&dir, "\n  \n");

    let result = discover_api_token(Some(&path), Some("from-env".to_string()));

    match result {
        Err(Error::AuthError(message)) => assert!(message.contains("is empty")),
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[test]
fn test_missing_token_file_falls_back_to_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.txt");

    let token = discover_api_token(Some(&path), Some("from-env".to_string())).unwrap();

    assert_eq!(token, "from-env");
}

#[test]
fn test_no_token_anywhere() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.txt");

    let result = discover_api_token(Some(&path), None);

    match result {
        Err(Error::AuthError(message)) => assert!(message.contains(TOKEN_ENV_VAR)),
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[test]
fn test_blank_environment_token_is_ignored() {
    let result = discover_api_token(None, Some("   ".to_string()));

    assert!(matches!(result, Err(Error::AuthError(_))));
}

#[test]
fn test_gpg_key_unescapes_newlines() {
    let vars: HashMap<&str, &str> = HashMap::from([
        (GPG_PASSPHRASE_ENV_VAR, "secret"),
        (GPG_PRIVATE_KEY_ENV_VAR, "-----BEGIN-----\\nabc\\n-----END-----"),
        (GPG_PUBLIC_KEY_ENV_VAR, "public"),
    ]);

    let key = gpg_key_from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

    assert_eq!(key.passphrase, "secret");
    assert_eq!(key.private_key, "-----BEGIN-----\nabc\n-----END-----");
    assert_eq!(key.public_key, "public");
}

#[test]
fn test_gpg_passphrase_is_not_unescaped() {
    let vars: HashMap<&str, &str> = HashMap::from([
        (GPG_PASSPHRASE_ENV_VAR, "pa\\nss"),
        (GPG_PRIVATE_KEY_ENV_VAR, "private"),
        (GPG_PUBLIC_KEY_ENV_VAR, "-----BEGIN-----\\nxyz"),
    ]);

    let key = gpg_key_from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

    assert_eq!(key.passphrase, "pa\\nss");
    assert_eq!(key.public_key, "-----BEGIN-----\nxyz");
}

#[test]
fn test_gpg_key_reports_every_missing_variable() {
    let vars: HashMap<&str, &str> = HashMap::from([(GPG_PRIVATE_KEY_ENV_VAR, "private")]);

    let result = gpg_key_from_lookup(|name| vars.get(name).map(|v| v.to_string()));

    match result {
        Err(Error::MissingEnvironmentVariables(names)) => assert_eq!(
            names,
            vec![
                GPG_PASSPHRASE_ENV_VAR.to_string(),
                GPG_PUBLIC_KEY_ENV_VAR.to_string()
            ]
        ),
        other => panic!("expected missing variables, got {:?}", other),
    }
}

#[test]
fn test_gpg_key_debug_output_is_redacted() {
    let key = gpg_key_from_lookup(|_| Some("sensitive".to_string())).unwrap();

    assert!(!format!("{:?}", key).contains("sensitive"));
}
