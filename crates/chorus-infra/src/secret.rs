//! API key lookup.
//!
//! Keys never live in `chorus.toml`; the config names an environment
//! variable and the value is read here and wrapped in a [`SecretString`].

use secrecy::SecretString;

/// Read the secret held by the environment variable `var`.
///
/// Missing, empty and non-Unicode variables all resolve to `None`.
pub fn env_secret(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        Ok(_) => None,
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            tracing::warn!(var, "Environment variable is not valid Unicode; ignoring");
            None
        }
    }
}

/// Resolve an optional variable name to its secret.
pub fn resolve_api_key(var: Option<&str>) -> Option<SecretString> {
    var.and_then(env_secret)
}
