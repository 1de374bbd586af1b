//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid PORT '{0}'")]
    InvalidPort(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply process environment overrides.
///
/// Only `PORT` is honoured: it replaces the port of `listener.bind_address`
/// and keeps the host.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup("PORT") else {
        return Ok(());
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(());
    }

    let port: u16 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;

    let host = config
        .listener
        .bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or("0.0.0.0");
    config.listener.bind_address = format!("{}:{}", host, port);

    tracing::debug!(port, "Listener port overridden from environment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_port_override_keeps_host() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "127.0.0.1:3001".into();

        apply_env_overrides(&mut config, env(&[("PORT", "8088")])).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8088");
    }

    #[test]
    fn test_blank_port_is_ignored() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env(&[("PORT", "  ")])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3001");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref p) if p == "http"));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("gateway-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[timeouts]\nrequest_secs = 5\n\n[upstreams]\ndefault_chat_model = \"gpt-4o\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.timeouts.request_secs, 5);
        assert_eq!(config.upstreams.default_chat_model, "gpt-4o");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("gateway-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("timeouts.request_secs"));

        fs::remove_file(&path).unwrap();
    }
}
