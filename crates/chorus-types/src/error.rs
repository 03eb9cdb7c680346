use thiserror::Error;

/// Errors from persona registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Selection or lookup was attempted before any persona was registered.
    #[error("agent registry is empty")]
    Empty,

    #[error("agent '{new}' cannot be default: '{existing}' is already the default agent")]
    DuplicateDefault { existing: String, new: String },

    #[error("invalid agent definition: {0}")]
    InvalidAgent(String),

    #[error("failed to build LLM provider for agent '{agent_id}': {message}")]
    Provider { agent_id: String, message: String },
}

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::DuplicateDefault {
            existing: "helper".to_string(),
            new: "coder".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "agent 'coder' cannot be default: 'helper' is already the default agent"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "group_chat.chain_threshold",
            reason: "must be within [0, 1]".to_string(),
        };
        assert!(err.to_string().contains("chain_threshold"));
    }
}
