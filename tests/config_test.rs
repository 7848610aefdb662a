//! Tests for config loading from files and environment

use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;
use wikilabel::config::Config;
use wikilabel::endpoint::WIKIDATA_SPARQL_URL;
use wikilabel::error::Error;

const ENV_KEYS: &[&str] = &[
    "WIKILABEL_ENDPOINT_URL",
    "WIKILABEL_USER_AGENT",
    "WIKILABEL_TIMEOUT",
    "WIKILABEL_REQUESTS_PER_SECOND",
    "WIKILABEL_LIMIT",
    "WIKILABEL_BATCH_SIZE",
    "WIKILABEL_MAX_BATCH_CHARS",
    "WIKILABEL_DEDUP_LABELS",
    "WIKILABEL_MAX_CONCURRENT_AUXILIARY",
    "WIKILABEL_LOG_LEVEL",
    "WIKILABEL_LOG_FORMAT",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    file.write_all(content.as_bytes())
        .expect("Should write config");
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let file = write_config(
        r#"
[endpoint]
user_agent = "wikilabel-test/0.1 (test@example.org)"
timeout_secs = 30

[query]
limit = 1000
batch_size = 50
max_concurrent_auxiliary = 2

[logging]
format = "json"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.endpoint.url, WIKIDATA_SPARQL_URL);
    assert_eq!(config.endpoint.timeout_secs, 30);
    assert_eq!(config.query.limit, 1000);
    assert_eq!(config.query.batch_size, 50);
    assert_eq!(config.query.max_batch_chars, 6000);
    assert_eq!(config.query.max_concurrent_auxiliary, 2);
    assert!(!config.query.dedup_labels);
    assert_eq!(config.logging.format, "json");
}

#[test]
#[serial]
fn test_file_without_user_agent_rejected() {
    clear_env();
    let file = write_config("[query]\nlimit = 10\n");

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config { ref name, .. } if name == "endpoint.user_agent"));
}

#[test]
#[serial]
fn test_malformed_toml_rejected() {
    clear_env();
    let file = write_config("[endpoint\nuser_agent = ");

    assert!(matches!(Config::from_file(file.path()), Err(Error::Toml(_))));
}

#[test]
#[serial]
fn test_missing_file_is_io_error() {
    clear_env();
    let result = Config::from_file(std::path::Path::new("/nonexistent/wikilabel.toml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config(
        r#"
[endpoint]
user_agent = "from-file/0.1"

[query]
limit = 1000
"#,
    );

    std::env::set_var("WIKILABEL_USER_AGENT", "from-env/0.1");
    std::env::set_var("WIKILABEL_LIMIT", "250");
    let config = Config::from_file(file.path());
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.endpoint.user_agent, "from-env/0.1");
    assert_eq!(config.query.limit, 250);
}

#[test]
#[serial]
fn test_from_env() {
    clear_env();
    std::env::set_var("WIKILABEL_USER_AGENT", "env-only/0.1");
    std::env::set_var("WIKILABEL_ENDPOINT_URL", "http://localhost:9999/sparql");
    std::env::set_var("WIKILABEL_REQUESTS_PER_SECOND", "2");
    let config = Config::from_env();
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.endpoint.url, "http://localhost:9999/sparql");
    assert_eq!(config.endpoint.requests_per_second, 2);
}

#[test]
#[serial]
fn test_env_covers_query_section() {
    clear_env();
    std::env::set_var("WIKILABEL_USER_AGENT", "env-only/0.1");
    std::env::set_var("WIKILABEL_BATCH_SIZE", "50");
    std::env::set_var("WIKILABEL_MAX_BATCH_CHARS", "1200");
    std::env::set_var("WIKILABEL_DEDUP_LABELS", "true");
    std::env::set_var("WIKILABEL_MAX_CONCURRENT_AUXILIARY", "3");
    let config = Config::from_env();
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.query.batch_size, 50);
    assert_eq!(config.query.max_batch_chars, 1200);
    assert!(config.query.dedup_labels);
    assert_eq!(config.query.max_concurrent_auxiliary, 3);
}

#[test]
#[serial]
fn test_env_zero_concurrency_is_invalid() {
    clear_env();
    std::env::set_var("WIKILABEL_USER_AGENT", "env-only/0.1");
    std::env::set_var("WIKILABEL_MAX_CONCURRENT_AUXILIARY", "0");
    let result = Config::from_env();
    clear_env();

    assert!(matches!(result, Err(Error::Config { .. })));
}

#[test]
#[serial]
fn test_from_env_requires_user_agent() {
    clear_env();
    assert!(Config::from_env().is_err());
}
