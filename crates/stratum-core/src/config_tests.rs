//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::path::PathBuf;

    // ========================================================================
    // Defaults
    // ========================================================================

    #[test]
    fn test_config_default_values() {
        // Arrange & Act
        let config = StratumConfig::default();

        // Assert
        assert_eq!(config.storage.data_dir, PathBuf::from("./stratum_data"));
        assert_eq!(config.storage.catalog_file, "storage.json");
        assert_eq!(config.storage.max_chunks_per_file, 50);
        assert!(!config.storage.sync_on_append);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_catalog_path_joins_data_dir() {
        let storage = StorageConfig::with_data_dir("/tmp/strata");

        assert_eq!(
            storage.catalog_path(),
            PathBuf::from("/tmp/strata/storage.json")
        );
    }

    // ========================================================================
    // TOML parsing
    // ========================================================================

    #[test]
    fn test_config_from_toml_minimal() {
        // Arrange
        let toml_str = r#"
[storage]
data_dir = "/var/lib/stratum"
"#;

        // Act
        let config = StratumConfig::from_toml(toml_str).expect("parse");

        // Assert
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/stratum"));
        assert_eq!(config.storage.max_chunks_per_file, 50); // default kept
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_from_toml_full() {
        // Arrange
        let toml_str = r#"
[storage]
data_dir = "data"
catalog_file = "catalog.json"
max_chunks_per_file = 10
sync_on_append = true

[logging]
level = "debug"
format = "json"
"#;

        // Act
        let config = StratumConfig::from_toml(toml_str).expect("parse");

        // Assert
        assert_eq!(config.storage.catalog_file, "catalog.json");
        assert_eq!(config.storage.max_chunks_per_file, 10);
        assert!(config.storage.sync_on_append);
        assert_eq!(config.logging.format, "json");
        config.validate().expect("valid");
    }

    #[test]
    fn test_config_from_toml_wrong_type() {
        let toml_str = r#"
[storage]
max_chunks_per_file = "many"
"#;

        let result = StratumConfig::from_toml(toml_str);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_config_validate_success() {
        assert!(StratumConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validate_chunk_cap_bounds() {
        for cap in [0, 51] {
            // Arrange
            let mut config = StratumConfig::default();
            config.storage.max_chunks_per_file = cap;

            // Act
            let result = config.validate();

            // Assert
            match result {
                Err(ConfigError::InvalidValue { key, .. }) => {
                    assert_eq!(key, "storage.max_chunks_per_file");
                }
                other => panic!("expected InvalidValue for {cap}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_validate_catalog_file_is_plain_name() {
        let mut config = StratumConfig::default();
        config.storage.catalog_file = "../escape.json".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_invalid_log_level() {
        let mut config = StratumConfig::default();
        config.logging.level = "verbose".to_string();

        let result = config.validate();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_config_validate_invalid_log_format() {
        let mut config = StratumConfig::default();
        config.logging.format = "xml".to_string();

        assert!(config.validate().is_err());
    }

    // ========================================================================
    // Files and serialization
    // ========================================================================

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let config = StratumConfig::load_from_path(dir.path().join("absent.toml")).expect("load");

        assert_eq!(config.storage.max_chunks_per_file, 50);
    }

    #[test]
    fn test_load_required_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");

        let result = StratumConfig::load_required(dir.path().join("absent.toml"));

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stratum.toml");
        std::fs::write(&path, "[storage]\nmax_chunks_per_file = 7\n").expect("write");

        // Act
        let config = StratumConfig::load_required(&path).expect("load");

        // Assert
        assert_eq!(config.storage.max_chunks_per_file, 7);
    }

    #[test]
    fn test_config_roundtrip() {
        // Arrange
        let mut original = StratumConfig::default();
        original.storage.max_chunks_per_file = 12;
        original.logging.level = "trace".to_string();

        // Act
        let toml_str = original.to_toml().expect("serialize");
        let parsed = StratumConfig::from_toml(&toml_str).expect("parse");

        // Assert
        assert_eq!(parsed, original);
    }
}
