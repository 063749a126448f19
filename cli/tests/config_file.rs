use dumbly_cli::{ConfigError, FileConfig};
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("dumbly-{}-{}.toml", name, std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_from_disk() {
    let path = write_temp(
        "api",
        r#"
[api]
listen = "127.0.0.1:8123"
allowed_origin = "https://admin.example"

[node]
confirmation_rounds = 10
"#,
    );

    let config = FileConfig::load(&path).unwrap();
    let api = config.api_settings().unwrap();
    assert_eq!(api.listen.port(), 8123);
    assert_eq!(api.allowed_origin, "https://admin.example");
    assert_eq!(config.confirmation_rounds(), 10);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file() {
    let err = FileConfig::load(&PathBuf::from("/nonexistent/dumbly.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/dumbly.toml"));
}

#[test]
fn test_invalid_listen_address() {
    let path = write_temp("listen", "[api]\nlisten = \"not an address\"\n");
    let config = FileConfig::load(&path).unwrap();
    assert!(matches!(
        config.api_settings(),
        Err(ConfigError::Invalid {
            field: "api.listen",
            ..
        })
    ));
    std::fs::remove_file(path).ok();
}
