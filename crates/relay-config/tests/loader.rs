//! Tests for layered configuration loading.

use std::io::Write;
use std::path::Path;

use relay_config::{load_config, ConfigError, DedupScopeSetting};
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

#[test]
fn defaults_without_file() {
    figment::Jail::expect_with(|_jail| {
        let config = load_config(None).expect("load");
        assert_eq!(config.chain.max_depth, 5);
        Ok(())
    });
}

#[test]
fn file_overrides_defaults() {
    let file = config_file(
        r#"
        [chain]
        max_depth = 3
        chain_timeout_ms = 0

        [dedup]
        scope = "process"
        ttl_ms = 1000
        "#,
    );
    figment::Jail::expect_with(|_jail| {
        let config = load_config(Some(file.path())).expect("load");
        assert_eq!(config.chain.max_depth, 3);
        assert!(config.chain.chain_timeout().is_none());
        assert_eq!(config.chain.timeout_ms, 30_000);
        assert_eq!(config.dedup.scope, DedupScopeSetting::Process);
        assert_eq!(config.dedup.ttl_ms, 1000);
        Ok(())
    });
}

#[test]
fn env_overrides_file() {
    let file = config_file("[chain]\nmax_depth = 3\n");
    figment::Jail::expect_with(|jail| {
        jail.set_env("RELAY_CHAIN__MAX_DEPTH", "9");
        jail.set_env("RELAY_LOGGING__LEVEL", "debug");
        let config = load_config(Some(file.path())).expect("load");
        assert_eq!(config.chain.max_depth, 9);
        assert_eq!(config.logging.level, "debug");
        Ok(())
    });
}

#[test]
fn missing_file_is_reported() {
    let result = load_config(Some(Path::new("/definitely/not/here/relay.toml")));
    assert!(matches!(result, Err(ConfigError::Missing(_))));
}

#[test]
fn invalid_values_are_rejected() {
    let file = config_file("[dedup]\ncapacity = 0\n");
    figment::Jail::expect_with(|_jail| {
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        Ok(())
    });
}

#[test]
fn malformed_toml_is_a_load_error() {
    let file = config_file("[chain\nmax_depth = ");
    figment::Jail::expect_with(|_jail| {
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Load(_))));
        Ok(())
    });
}
