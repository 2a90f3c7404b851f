use std::time::Duration;
use std::{env, fs};

use octoacs_core::config::{ConfigError, load_config};

#[test]
fn config_file_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("octoacs.toml");

    let toml_content = r#"
[reconcile]
default_token_lifetime = "5m"

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(
        cfg.reconcile.default_token_lifetime,
        Duration::from_secs(300)
    );
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.settings().default_token_lifetime, 300);

    // 2) Env override wins over the file
    unsafe {
        env::set_var("OCTOACS__RECONCILE__DEFAULT_TOKEN_LIFETIME", "15m");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.settings().default_token_lifetime, 900);
    unsafe {
        env::remove_var("OCTOACS__RECONCILE__DEFAULT_TOKEN_LIFETIME");
    }

    // 3) Out-of-range values are rejected
    let bad_path = dir.path().join("bad.toml");
    fs::write(
        &bad_path,
        r#"
[reconcile]
default_token_lifetime = "0s"
"#,
    )
    .expect("write bad toml");
    let err = load_config(bad_path.to_str()).expect_err("zero lifetime must fail");
    assert!(matches!(err, ConfigError::Validation(_)));

    // 4) A missing file falls back to defaults
    let missing = dir.path().join("missing.toml");
    let cfg_default = load_config(missing.to_str()).expect("defaults");
    assert_eq!(cfg_default.settings().default_token_lifetime, 600);
    assert_eq!(cfg_default.logging.level, "info");
}
