//! Credential discovery.
//!
//! The API token is read from `~/.moderne/token.txt`, falling back to the
//! `MODERNE_API_TOKEN` environment variable. The GPG key used to sign
//! generated commits only ever comes from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::{errors::Error, models::GpgKey};

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

pub const TOKEN_ENV_VAR: &str = "MODERNE_API_TOKEN";

pub const GPG_PASSPHRASE_ENV_VAR: &str = "GPG_KEY_PASSPHRASE";
pub const GPG_PRIVATE_KEY_ENV_VAR: &str = "GPG_KEY_PRIVATE_KEY";
pub const GPG_PUBLIC_KEY_ENV_VAR: &str = "GPG_KEY_PUBLIC_KEY";

/// Location of the token file in the user's home directory.
pub fn default_token_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".moderne").join("token.txt"))
}

/// Resolves the API token from a token file or an environment value.
///
/// The file wins when it exists. An existing but empty file is an error
/// rather than a reason to fall back, so a stale setup is noticed.
///
/// # Arguments
///
/// * `token_file` - The token file to consult, if any
/// * `env_value` - The value of the fallback environment variable, if set
///
/// # Errors
///
/// Returns [`Error::AuthError`] if neither source yields a token.
#[instrument(skip(env_value))]
pub fn discover_api_token(
    token_file: Option<&Path>,
    env_value: Option<String>,
) -> Result<String, Error> {
    if let Some(path) = token_file.filter(|p| p.is_file()) {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::AuthError(format!("Failed to read token file {}: {}", path.display(), e))
        })?;
        let token = content.trim();
        if token.is_empty() {
            return Err(Error::AuthError(format!(
                "Token file {} is empty",
                path.display()
            )));
        }

        debug!(path = %path.display(), "Using API token from file");
        return Ok(token.to_string());
    }

    match env_value.map(|v| v.trim().to_string()) {
        Some(token) if !token.is_empty() => {
            debug!(variable = TOKEN_ENV_VAR, "Using API token from environment");
            Ok(token)
        }
        _ => Err(Error::AuthError(format!(
            "No API token found. Write it to {} or set {}",
            token_file.map_or_else(|| "~/.moderne/token.txt".to_string(), |p| p.display().to_string()),
            TOKEN_ENV_VAR
        ))),
    }
}

/// Resolves the API token from the default token file and the process
/// environment.
pub fn load_api_token() -> Result<String, Error> {
    discover_api_token(
        default_token_file().as_deref(),
        std::env::var(TOKEN_ENV_VAR).ok(),
    )
}

/// Builds the GPG key from a variable lookup.
///
/// Every missing or empty variable is reported in a single
/// [`Error::MissingEnvironmentVariables`]. Literal `\n` sequences in the
/// private and public keys are turned into newlines; the passphrase is used
/// as given.
pub fn gpg_key_from_lookup<F>(lookup: F) -> Result<GpgKey, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let mut read = |name: &str| match lookup(name).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => {
            missing.push(name.to_string());
            String::new()
        }
    };

    let passphrase = read(GPG_PASSPHRASE_ENV_VAR);
    let private_key = unescape_newlines(&read(GPG_PRIVATE_KEY_ENV_VAR));
    let public_key = unescape_newlines(&read(GPG_PUBLIC_KEY_ENV_VAR));

    if !missing.is_empty() {
        return Err(Error::MissingEnvironmentVariables(missing));
    }

    Ok(GpgKey {
        passphrase,
        private_key,
        public_key,
    })
}

fn unescape_newlines(key: &str) -> String {
    key.replace("\\n", "\n")
}

/// Builds the GPG key from the process environment.
pub fn load_gpg_key() -> Result<GpgKey, Error> {
    gpg_key_from_lookup(|name| std::env::var(name).ok())
}
