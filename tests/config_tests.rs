use sql_console::config::{Config, DatabaseConfig, RetryConfig};

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.llm.api_key.is_none());
    assert!(config.llm.provider.is_none());
    assert!(config.llm.model.is_none());
    assert!(config.llm.max_tokens.is_none());
    assert_eq!(
        config.llm.ollama_url.as_deref(),
        Some("http://localhost:11434")
    );
}

#[test]
fn test_default_retry_config() {
    let config = Config::default();

    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.initial_delay_ms, 1000);
    assert_eq!(config.retry.max_delay_ms, 30000);
    assert_eq!(config.retry.backoff_factor, 2.0);
}

#[test]
fn test_default_database_config() {
    let config = DatabaseConfig::default();

    assert!(config.path.is_none());
    assert!(config.schema.is_none());
}

#[test]
fn test_parse_full_config() {
    let toml = r#"
        [llm]
        provider = "openai"
        model = "gpt-4o"
        api_key = "sk-test"
        max_tokens = 150

        [retry]
        max_retries = 5
        initial_delay_ms = 500
        max_delay_ms = 10000
        backoff_factor = 1.5

        [database]
        path = "sakila.db"
        schema = "schema.txt"
    "#;
    let config: Config = toml::from_str(toml).unwrap();

    assert_eq!(config.llm.provider.as_deref(), Some("openai"));
    assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
    assert_eq!(config.llm.max_tokens, Some(150));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.database.path.as_deref(), Some("sakila.db"));
    assert_eq!(config.database.schema.as_deref(), Some("schema.txt"));
}

#[test]
fn test_parse_partial_config_uses_defaults() {
    let toml = r#"
        [database]
        path = "console.db"
    "#;
    let config: Config = toml::from_str(toml).unwrap();

    assert_eq!(config.database.path.as_deref(), Some("console.db"));
    assert_eq!(config.retry.max_retries, 3);
    assert!(config.llm.provider.is_none());
}

#[test]
fn test_config_clone() {
    let config = Config::default();
    let cloned = config.clone();
    assert_eq!(cloned.retry.max_retries, config.retry.max_retries);
}

#[test]
fn test_retry_config_debug() {
    let retry = RetryConfig::default();
    let debug = format!("{:?}", retry);
    assert!(debug.contains("RetryConfig"));
}
