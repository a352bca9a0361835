use audio_context_manager::config::{AuxiliarySends, Config, ContextConfig};
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper function to create a temporary config file with given content
fn create_temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write temp config");
    (temp_dir, config_path)
}

/// Test basic configuration loading and parsing
#[cfg(test)]
mod config_loading {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[logging]
level = "debug"
file_output = true

[context]
device = "Headphones"
frequency = 48000
refresh_rate = 60
synchronous = true
mono_sources = 32
stereo_sources = 4
enable_efx = true
max_auxiliary_sends = 2
"#;

        let (_temp_dir, config_path) = create_temp_config(config_content);
        let config = Config::load(Some(config_path.to_str().unwrap())).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file_output);
        assert!(!config.logging.json_format);

        let context = &config.context;
        assert_eq!(context.requested_device(), Some("Headphones"));
        assert_eq!(context.frequency, 48000);
        assert_eq!(context.refresh_rate, 60);
        assert!(context.synchronous);
        assert_eq!(context.mono_sources, 32);
        assert_eq!(context.stereo_sources, 4);
        assert!(context.enable_efx);
        assert_eq!(context.max_auxiliary_sends, AuxiliarySends::Two);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_temp_dir, config_path) = create_temp_config("");
        let config = Config::load(Some(config_path.to_str().unwrap())).unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.context, ContextConfig::default());
    }

    #[test]
    fn test_missing_file_writes_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");

        let config = Config::load(Some(config_path.to_str().unwrap())).unwrap();

        assert_eq!(config.context, ContextConfig::default());
        assert!(config_path.exists());

        let reloaded = Config::load(Some(config_path.to_str().unwrap())).unwrap();
        assert_eq!(reloaded.context, config.context);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.context = ContextConfig::default()
            .with_device("Speakers")
            .with_frequency(44100)
            .with_efx(AuxiliarySends::Four);
        config.save(&config_path).unwrap();

        let reloaded = Config::load(Some(config_path.to_str().unwrap())).unwrap();
        assert_eq!(reloaded.context, config.context);
    }
}

/// Invalid values are rejected when the file is loaded
#[cfg(test)]
mod config_validation {
    use super::*;

    fn load_error(content: &str) -> String {
        let (_temp_dir, config_path) = create_temp_config(content);
        let err = Config::load(Some(config_path.to_str().unwrap())).unwrap_err();
        format!("{:#}", err)
    }

    #[test]
    fn test_negative_frequency_is_rejected() {
        let message = load_error("[context]\nfrequency = -44100\n");
        assert!(message.contains("frequency"));
    }

    #[test]
    fn test_source_hint_below_driver_default_is_rejected() {
        let message = load_error("[context]\nmono_sources = -2\n");
        assert!(message.contains("mono_sources"));
    }

    #[test]
    fn test_too_many_auxiliary_sends_is_rejected() {
        let message = load_error("[context]\nmax_auxiliary_sends = 9\n");
        assert!(message.contains("max_auxiliary_sends"));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let message = load_error("[context\nfrequency = 1");
        assert!(message.contains("Invalid configuration file"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let message = load_error("[context]\nsynchronous = \"yes\"\n");
        assert!(message.contains("Failed to parse configuration"));
    }
}
