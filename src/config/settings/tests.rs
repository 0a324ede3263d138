use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.server.name, "mcp-toolkit");
    assert_eq!(config.file_manager.max_file_size, 1_024_000);
    assert_eq!(
        config.file_manager.allowed_extensions,
        vec![".txt", ".json", ".py", ".md"]
    );
    assert!(config.web_api.allowed_domains.is_empty());
    assert_eq!(config.web_api.simulated_latency_ms, 100);
    assert_eq!(config.data_processor.max_depth, 3);
    assert!(config.validate().is_ok());
}

#[test]
fn config_validation() {
    let config = Config::default();

    let mut invalid_config = config.clone();
    invalid_config.server.name = "  ".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidServerName(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.file_manager.max_file_size = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidFileManager(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.file_manager.allowed_extensions = vec!["txt".to_string()];
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.web_api.simulated_latency_ms = 60_000;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidLatency(60_000))
    ));

    let mut invalid_config = config;
    invalid_config.data_processor.max_depth = 1000;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidMaxDepth(1000))
    ));
}

#[test]
fn allowed_domains_must_be_bare_hosts() {
    let mut config = Config::default();
    config.web_api.allowed_domains = vec!["api.example.com".to_string()];
    assert!(config.validate().is_ok());

    for bad in ["https://api.example.com", "api.example.com:8080", "a b", ""] {
        config.web_api.allowed_domains = vec![bad.to_string()];
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidDomain(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn toml_serialization() {
    let mut config = Config::default();
    config.web_api.allowed_domains = vec!["api.example.com".to_string()];
    let toml_str = config.to_toml().expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let parsed: Config = toml::from_str(
        r#"
        [web_api]
        allowed_domains = ["jsonplaceholder.typicode.com"]
        "#,
    )
    .expect("should parse partial toml");

    assert_eq!(
        parsed.web_api.allowed_domains,
        vec!["jsonplaceholder.typicode.com"]
    );
    assert_eq!(parsed.web_api.simulated_latency_ms, 100);
    assert_eq!(parsed.file_manager, FileManagerConfig::default());
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::load(temp_dir.path()).expect("missing file falls back to defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.server, ServerConfig::default());
}

#[test]
fn save_then_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().join("nested"),
        ..Config::default()
    };
    config.data_processor.max_depth = 5;
    config.save().expect("should save config");

    assert!(config.config_file_path().exists());
    let loaded = Config::load(temp_dir.path().join("nested")).expect("should load config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[file_manager]\nmax_file_size = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn save_refuses_invalid_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.web_api.simulated_latency_ms = u64::MAX;
    assert!(config.save().is_err());
    assert!(!config.config_file_path().exists());
}
