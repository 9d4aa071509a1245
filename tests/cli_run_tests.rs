//! Config files and the `run` command against a local fixture server

mod common;

use common::{FixtureServer, TEXT_CONTENTS, TEXT_MD5};
use hostsuite::cli::{execute_run, exit_code, RunArgs, RunPlan};
use hostsuite::config::{ConfigError, HarnessConfig};
use hostsuite::suites::SuiteKind;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_config_file_formats() {
    let dir = TempDir::new().unwrap();

    let yaml_path = dir.path().join("hostsuite.yml");
    tokio::fs::write(&yaml_path, "default_timeout_ms: 1500\nfilter: loadAsync\n")
        .await
        .unwrap();
    let config = HarnessConfig::from_file(&yaml_path).await.unwrap();
    assert_eq!(config.default_timeout(), Duration::from_millis(1500));
    assert_eq!(config.filter.as_deref(), Some("loadAsync"));

    let json_path = dir.path().join("hostsuite.json");
    tokio::fs::write(&json_path, r#"{"audio": {"start_latency_ms": 5}}"#)
        .await
        .unwrap();
    let config = HarnessConfig::from_file(&json_path).await.unwrap();
    assert_eq!(config.audio.start_latency(), Duration::from_millis(5));
    assert_eq!(config.default_timeout_ms, 5000);

    let err = HarnessConfig::from_file(dir.path().join("missing.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[tokio::test]
async fn test_command_line_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostsuite.yaml");
    tokio::fs::write(&path, "default_timeout_ms: 1500\nfilter: loadAsync\n")
        .await
        .unwrap();

    let args = RunArgs {
        config: Some(path),
        timeout: Some(250),
        filter: Some("setRateAsync".to_string()),
        ..RunArgs::default()
    };
    let plan = RunPlan::from_args(&args).await.unwrap();

    assert_eq!(plan.config.default_timeout_ms, 250);
    assert_eq!(plan.runner_config().filter.as_deref(), Some("setRateAsync"));
    assert_eq!(plan.suites, SuiteKind::all());
}

#[tokio::test]
async fn test_run_filesystem_suite_from_config_file() {
    let server = FixtureServer::start(vec![
        ("/avatar2.png", TEXT_CONTENTS.as_bytes().to_vec()),
        ("/text-file.txt", TEXT_CONTENTS.as_bytes().to_vec()),
    ])
    .await;
    let dir = TempDir::new().unwrap();
    let sandbox = dir.path().join("sandbox");

    let config = serde_json::json!({
        "fixtures": {
            "image_url": server.url("/avatar2.png"),
            "image_md5": TEXT_MD5,
            "image_size": TEXT_CONTENTS.len(),
            "text_url": server.url("/text-file.txt"),
            "escape_url": server.url("/text-file.txt"),
        }
    });
    let config_path = dir.path().join("hostsuite.json");
    tokio::fs::write(&config_path, config.to_string()).await.unwrap();

    let args = RunArgs {
        suites: vec![SuiteKind::Filesystem],
        root: Some(sandbox.clone()),
        config: Some(config_path),
        ..RunArgs::default()
    };
    let plan = RunPlan::from_args(&args).await.unwrap();
    let report = execute_run(&plan).await.unwrap();

    assert!(report.success, "{:?}", report.failures().collect::<Vec<_>>());
    assert_eq!(exit_code(&report), 0);
    assert!(sandbox.is_dir());
}
