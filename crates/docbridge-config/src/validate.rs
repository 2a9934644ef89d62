//! Configuration validation rules.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, StorageBackend, TableEngine};

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first offending field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_storage(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    let storage = &config.storage;

    validate_endpoint("storage.native.endpoint", &storage.native.endpoint)?;
    validate_timeout("storage.native.timeout_secs", storage.native.timeout_secs)?;
    validate_timeout(
        "storage.remote_search.timeout_secs",
        storage.remote_search.timeout_secs,
    )?;

    if let Some(endpoint) = &storage.remote_search.endpoint {
        validate_endpoint("storage.remote_search.endpoint", endpoint)?;
    } else if storage.backend == StorageBackend::Kv {
        return Err(ConfigError::ValidationError {
            field: "storage.remote_search.endpoint".to_owned(),
            message: "the kv backend delegates search and needs a remote search endpoint"
                .to_owned(),
        });
    }

    if storage.table.engine == TableEngine::Surrealkv
        && storage.table.path.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::ValidationError {
            field: "storage.table.path".to_owned(),
            message: "the surrealkv engine needs a data directory".to_owned(),
        });
    }

    Ok(())
}

fn validate_endpoint(field: &str, endpoint: &str) -> ConfigResult<()> {
    let url = Url::parse(endpoint).map_err(|e| ConfigError::ValidationError {
        field: field.to_owned(),
        message: format!("invalid URL '{endpoint}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: format!("unsupported scheme '{}'; expected http or https", url.scheme()),
        });
    }
    Ok(())
}

fn validate_timeout(field: &str, secs: u64) -> ConfigResult<()> {
    if secs == 0 {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: "timeout must be greater than zero".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_kv_requires_search_endpoint() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Kv;
        assert_eq!(
            field_of(validate(&config)),
            "storage.remote_search.endpoint"
        );

        config.storage.remote_search.endpoint = Some("http://search:9200".to_owned());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut config = Config::default();
        config.storage.native.endpoint = "not a url".to_owned();
        assert_eq!(field_of(validate(&config)), "storage.native.endpoint");

        config.storage.native.endpoint = "ftp://host".to_owned();
        assert_eq!(field_of(validate(&config)), "storage.native.endpoint");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.storage.remote_search.timeout_secs = 0;
        assert_eq!(
            field_of(validate(&config)),
            "storage.remote_search.timeout_secs"
        );
    }

    #[test]
    fn test_surrealkv_requires_path() {
        let mut config = Config::default();
        config.storage.table.engine = TableEngine::Surrealkv;
        assert_eq!(field_of(validate(&config)), "storage.table.path");

        config.storage.table.path = Some("/var/lib/docbridge".to_owned());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.level");
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
