use std::io::Write;

use mturk_rs::config::{Config, Endpoint};

// Env vars are process-wide, so every env case lives in this one test.
#[test]
fn config_from_env_requires_endpoint_and_credentials() {
    unsafe {
        std::env::set_var("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "wJalrXUtnFEMI");
        std::env::remove_var("MTURK_ENDPOINT");
        std::env::remove_var("MTURK_REQUESTS_PER_SECOND");
    }

    // No implicit endpoint.
    assert!(Config::from_env().is_err());

    unsafe {
        std::env::set_var("MTURK_ENDPOINT", "sandbox");
        std::env::set_var("MTURK_REQUESTS_PER_SECOND", "2");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.endpoint, Endpoint::Sandbox);
    assert_eq!(config.requests_per_second.map(|r| r.get()), Some(2));
    assert!(!config.log_level.is_empty());
    assert_eq!(config.client_config().throttle().requests_per_second.get(), 2);

    // An explicit endpoint wins over MTURK_ENDPOINT.
    let config = Config::load(None, Some(Endpoint::Production)).unwrap();
    assert_eq!(config.endpoint, Endpoint::Production);

    unsafe {
        std::env::set_var("MTURK_REQUESTS_PER_SECOND", "0");
    }
    assert!(Config::from_env().is_err());

    unsafe {
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        std::env::remove_var("MTURK_ENDPOINT");
        std::env::remove_var("MTURK_REQUESTS_PER_SECOND");
    }
    assert!(Config::from_env().is_err());
}

#[test]
fn config_from_file_reads_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
access_key_id = "AKIDEXAMPLE"
secret_access_key = "wJalrXUtnFEMI"
endpoint = "production"
otel_endpoint = "http://localhost:4317"
log_level = "debug"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.endpoint, Endpoint::Production);
    assert_eq!(config.otel_endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.credentials().access_key_id, "AKIDEXAMPLE");
    assert!(!format!("{config:?}").contains("wJalrXUtnFEMI"));
}

#[test]
fn config_from_missing_file_is_a_config_error() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/mturk.toml")).unwrap_err();
    assert!(matches!(err, mturk_rs::Error::Config(_)));
}

#[test]
fn file_errors_name_the_path_once() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
access_key_id = "AKIDEXAMPLE"
secret_access_key = "wJalrXUtnFEMI"
"#
    )
    .unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, mturk_rs::Error::Config(_)));
    assert_eq!(message.matches("configuration error").count(), 1, "{message}");
    assert!(message.contains(&file.path().display().to_string()), "{message}");
    assert!(message.contains("endpoint is required"), "{message}");
}
