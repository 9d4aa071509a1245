//! End-to-end runs of the bundled suites against a local sandbox

mod common;

use common::{FixtureServer, TestEnvironment, TEXT_CONTENTS, TEXT_MD5};
use hostsuite::capabilities::filesystem::StreamingMd5;
use hostsuite::config::{FixtureSettings, HarnessConfig};
use hostsuite::harness::{Outcome, RunnerConfig, SuiteRunner};
use hostsuite::suites::{self, SuiteContext, SuiteKind, ROOT_SUITE};
use std::sync::Arc;

fn image_bytes() -> Vec<u8> {
    (0..3230u32).map(|i| (i * 31 % 251) as u8).collect()
}

async fn local_fixtures() -> (FixtureServer, FixtureSettings) {
    let image = image_bytes();
    let mut hasher = StreamingMd5::new();
    hasher.update(&image);
    let image_md5 = hasher.finish();
    let image_size = image.len() as u64;

    let server = FixtureServer::start(vec![
        ("/avatar2.png", image),
        ("/text-file.txt", TEXT_CONTENTS.as_bytes().to_vec()),
    ])
    .await;

    let fixtures = FixtureSettings {
        image_url: server.url("/avatar2.png"),
        image_md5,
        image_size,
        text_url: server.url("/text-file.txt"),
        text_md5: TEXT_MD5.to_string(),
        text_contents: TEXT_CONTENTS.to_string(),
        escape_url: server.url("/text-file.txt"),
        ..FixtureSettings::default()
    };
    (server, fixtures)
}

fn context_for(env: &TestEnvironment, fixtures: FixtureSettings) -> SuiteContext {
    let config = HarnessConfig {
        fixtures,
        ..HarnessConfig::default()
    };
    SuiteContext::new(Arc::new(env.fs.clone()), &config)
}

#[tokio::test]
async fn test_filesystem_suite_passes_against_local_server() {
    let env = TestEnvironment::new();
    let (_server, fixtures) = local_fixtures().await;
    let suite = suites::build(&context_for(&env, fixtures), &[SuiteKind::Filesystem]);

    let report = SuiteRunner::new(RunnerConfig::default()).run(&suite).await;

    for failure in report.failures() {
        eprintln!("{}: {:?}", failure.full_name(), failure.message);
    }
    assert!(report.success);
    assert_eq!(report.summary.total, 11);
    assert_eq!(report.summary.passed, 11);
}

#[tokio::test]
async fn test_audio_suite_passes() {
    let env = TestEnvironment::new();
    let suite = suites::build(
        &context_for(&env, FixtureSettings::default()),
        &[SuiteKind::Audio],
    );

    let report = SuiteRunner::new(RunnerConfig::default()).run(&suite).await;

    for failure in report.failures() {
        eprintln!("{}: {:?}", failure.full_name(), failure.message);
    }
    assert!(report.success);
    assert_eq!(report.summary.passed, suite.test_count());
}

#[tokio::test]
async fn test_filter_selects_matching_tests_only() {
    let env = TestEnvironment::new();
    let (_server, fixtures) = local_fixtures().await;
    let suite = suites::build(&context_for(&env, fixtures), &SuiteKind::all());

    let runner = SuiteRunner::new(RunnerConfig {
        filter: Some("setVolumeAsync".to_string()),
        ..RunnerConfig::default()
    });
    let report = runner.run(&suite).await;

    assert!(report.success);
    let ran: Vec<_> = report
        .records
        .iter()
        .filter(|record| record.outcome != Outcome::Skipped)
        .collect();
    assert!(!ran.is_empty());
    assert!(ran
        .iter()
        .all(|record| record.full_name().contains("setVolumeAsync")));
}

#[tokio::test]
async fn test_unreachable_download_fails_only_download_tests() {
    let env = TestEnvironment::new();
    let (server, mut fixtures) = local_fixtures().await;
    fixtures.image_url = server.url("/gone.png");
    let suite = suites::build(&context_for(&env, fixtures), &[SuiteKind::Filesystem]);

    let report = SuiteRunner::new(RunnerConfig::default()).run(&suite).await;

    assert!(!report.success);
    assert_eq!(report.summary.failed, 2);
    assert!(report
        .failures()
        .all(|record| record.name.contains("download(md5")));
}

#[test]
fn test_outline_lists_suites_in_order() {
    let env = TestEnvironment::new();
    let suite = suites::build(
        &context_for(&env, FixtureSettings::default()),
        &[SuiteKind::Audio, SuiteKind::Filesystem],
    );

    let outline = suite.outline();
    assert_eq!(outline[0], ROOT_SUITE);
    let audio = outline.iter().position(|line| line.contains("Audio class"));
    let filesystem = outline.iter().position(|line| line.contains("FileSystem"));
    assert!(audio < filesystem);
}
