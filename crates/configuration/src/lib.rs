use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{Config, LogFormat, LoggingConfig, StorageConfig, SyncConfig, TablesConfig};

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "DEVOPS_METRICS";
const ENV_SEPARATOR: &str = "__";

/// Loads `config.toml` from the working directory, if present, layered
/// under `DEVOPS_METRICS__*` environment variables.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Like `load_config`, reading the file at `path`. A missing file is not an
/// error; every field has a default.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        // e.g. DEVOPS_METRICS__SYNC__NUMBER_OF_DAYS=7
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );
    finish(builder)
}

/// Parses configuration from TOML text, without environment overrides.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder =
        config::Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml));
    finish(builder)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate().map_err(ConfigError::ValidationError)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.sync.number_of_days, 30);
        assert_eq!(config.sync.max_number_of_items, 20);
        assert_eq!(config.storage.max_connections, 5);
        assert!(config.storage.database_url.is_none());
        assert_eq!(config.tables.azure_devops_builds, "AzureDevOpsBuilds");
        assert_eq!(config.tables.github_pull_request_commits, "GitHubPRCommits");
        assert_eq!(config.tables.settings, "Settings");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = parse_config(
            r#"
            [storage]
            database_url = "postgres://localhost/metrics"

            [tables]
            github_runs = "Runs"

            [sync]
            number_of_days = 7

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.database_url.as_deref(), Some("postgres://localhost/metrics"));
        assert_eq!(config.tables.github_runs, "Runs");
        assert_eq!(config.tables.github_pull_requests, "GitHubPRs");
        assert_eq!(config.sync.number_of_days, 7);
        assert_eq!(config.sync.max_number_of_items, 20);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = parse_config("[sync]\nnumber_of_days = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("number_of_days")));

        let err = parse_config("[sync]\nmax_number_of_items = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let err = parse_config("[sync]\nnumber_of_days = 200000000").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("at most 36500")));

        assert!(parse_config("[sync]\nnumber_of_days = 36500").is_ok());
    }

    #[test]
    fn blank_table_name_is_rejected() {
        let err = parse_config("[tables]\nsettings = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("tables.settings")));
    }

    #[test]
    fn sync_section_converts_to_a_window() {
        let config = parse_config("[sync]\nnumber_of_days = 14\nmax_number_of_items = 50").unwrap();
        let window = config.sync.window().unwrap();
        assert_eq!(window.number_of_days, 14);
        assert_eq!(window.max_number_of_items, 50);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let config = load_config_from(Path::new("does-not-exist.toml")).unwrap();
        assert!(config.validate().is_ok());
    }
}
