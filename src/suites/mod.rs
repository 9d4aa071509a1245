//! Integration suites for the filesystem and audio capabilities

pub mod audio;
pub mod filesystem;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::capabilities::audio::AudioSession;
use crate::capabilities::filesystem::FileSystem;
use crate::config::{FixtureSettings, HarnessConfig};
use crate::harness::{Suite, SuiteBuilder};
use crate::poller::PollConfig;

pub const ROOT_SUITE: &str = "hostsuite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SuiteKind {
    Filesystem,
    Audio,
}

impl SuiteKind {
    pub fn all() -> Vec<SuiteKind> {
        vec![SuiteKind::Filesystem, SuiteKind::Audio]
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteKind::Filesystem => write!(f, "filesystem"),
            SuiteKind::Audio => write!(f, "audio"),
        }
    }
}

/// Capabilities and settings the suites are registered against
#[derive(Clone)]
pub struct SuiteContext {
    pub fs: Arc<dyn FileSystem>,
    pub audio: AudioSession,
    pub poll: PollConfig,
    pub fixtures: FixtureSettings,
}

impl SuiteContext {
    pub fn new(fs: Arc<dyn FileSystem>, config: &HarnessConfig) -> Self {
        Self {
            fs,
            audio: AudioSession::new(config.audio.media_catalog(), config.audio.start_latency()),
            poll: config.poll.to_poll_config(),
            fixtures: config.fixtures.clone(),
        }
    }
}

/// Build the root suite containing the requested suites in the given order
pub fn build(context: &SuiteContext, kinds: &[SuiteKind]) -> Suite {
    let mut root = SuiteBuilder::new(ROOT_SUITE);
    for kind in kinds {
        match kind {
            SuiteKind::Filesystem => filesystem::register(&mut root, context),
            SuiteKind::Audio => audio::register(&mut root, context),
        }
    }
    root.build()
}
