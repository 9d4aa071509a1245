//! Process-level audio state shared by every sound

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::catalog::MediaCatalog;
use super::error::AudioError;
use super::sound::Sound;

pub const DEFAULT_START_LATENCY: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionModeIos {
    #[default]
    MixWithOthers,
    DoNotMix,
    DuckOthers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionModeAndroid {
    DoNotMix,
    #[default]
    DuckOthers,
}

/// How the session interacts with other audio on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMode {
    pub plays_in_silent_mode_ios: bool,
    pub allows_recording_ios: bool,
    pub interruption_mode_ios: InterruptionModeIos,
    pub should_duck_android: bool,
    pub interruption_mode_android: InterruptionModeAndroid,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self {
            plays_in_silent_mode_ios: false,
            allows_recording_ios: false,
            interruption_mode_ios: InterruptionModeIos::default(),
            should_duck_android: true,
            interruption_mode_android: InterruptionModeAndroid::default(),
        }
    }
}

impl AudioMode {
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.allows_recording_ios && !self.plays_in_silent_mode_ios {
            return Err(AudioError::ImpossibleAudioMode {
                reason: "recording requires playback in silent mode".to_string(),
            });
        }
        Ok(())
    }
}

pub(super) struct SessionState {
    pub(super) enabled: AtomicBool,
    pub(super) mode: RwLock<AudioMode>,
    pub(super) catalog: MediaCatalog,
    pub(super) start_latency: Duration,
}

/// Entry point of the audio capability; cheap to clone
#[derive(Clone)]
pub struct AudioSession {
    state: Arc<SessionState>,
}

impl AudioSession {
    pub fn new(catalog: MediaCatalog, start_latency: Duration) -> Self {
        Self {
            state: Arc::new(SessionState {
                enabled: AtomicBool::new(true),
                mode: RwLock::new(AudioMode::default()),
                catalog,
                start_latency,
            }),
        }
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), AudioError> {
        tracing::debug!("Audio session enabled: {}", enabled);
        self.state.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    /// Replace the audio mode; an invalid mode leaves the current one in place
    pub async fn set_audio_mode(&self, mode: AudioMode) -> Result<(), AudioError> {
        mode.validate()?;
        *self.state.mode.write().await = mode;
        Ok(())
    }

    pub async fn audio_mode(&self) -> AudioMode {
        *self.state.mode.read().await
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.state.catalog
    }

    pub fn start_latency(&self) -> Duration {
        self.state.start_latency
    }

    pub fn create_sound(&self) -> Sound {
        Sound::new(self.state.clone())
    }
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new(MediaCatalog::default(), DEFAULT_START_LATENCY)
    }
}
