//! Simulated sound object
//!
//! Playback time is derived from `tokio::time::Instant` whenever the status
//! is observed, so a sound never owns a background task.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::catalog::{MediaInfo, SoundSource};
use super::error::AudioError;
use super::session::SessionState;
use super::status::{LoadedStatus, PlaybackStatus, PlaybackStatusUpdate};
use crate::poller::{Snapshot, StatusSource};

pub const MIN_RATE: f64 = 0.0;
pub const MAX_RATE: f64 = 32.0;
const DEFAULT_PROGRESS_UPDATE_INTERVAL_MILLIS: u64 = 500;

pub type StatusCallback = Arc<dyn Fn(&PlaybackStatus) + Send + Sync>;

/// Handle to one sound; clones share the same underlying object
#[derive(Clone)]
pub struct Sound {
    inner: Arc<SoundInner>,
}

struct SoundInner {
    session: Arc<SessionState>,
    state: Mutex<SoundState>,
}

#[derive(Default)]
struct SoundState {
    loaded: Option<Playback>,
    callback: Option<StatusCallback>,
}

#[derive(Clone)]
struct Playback {
    media: MediaInfo,
    should_play: bool,
    rate: f64,
    should_correct_pitch: bool,
    volume: f64,
    is_muted: bool,
    is_looping: bool,
    progress_update_interval_millis: u64,
    /// Position in milliseconds as of `anchor`
    position: f64,
    anchor: Instant,
    /// When playback becomes audible; `None` while paused
    started_at: Option<Instant>,
    just_finished: bool,
    interrupted: bool,
}

impl Playback {
    fn new(media: MediaInfo, now: Instant) -> Self {
        Self {
            media,
            should_play: false,
            rate: 1.0,
            should_correct_pitch: false,
            volume: 1.0,
            is_muted: false,
            is_looping: false,
            progress_update_interval_millis: DEFAULT_PROGRESS_UPDATE_INTERVAL_MILLIS,
            position: 0.0,
            anchor: now,
            started_at: None,
            just_finished: false,
            interrupted: false,
        }
    }

    fn duration(&self) -> f64 {
        self.media.duration_millis as f64
    }

    fn is_playing(&self, now: Instant) -> bool {
        self.started_at.is_some_and(|start| now >= start)
    }

    /// Bring the position up to `now`, settling the end of the media
    fn advance(&mut self, now: Instant) {
        if let Some(start) = self.started_at {
            let since = self.anchor.max(start);
            if now > since {
                self.position += (now - since).as_micros() as f64 / 1000.0 * self.rate;
            }
        }
        self.anchor = now;

        let duration = self.duration();
        if self.position >= duration {
            if self.is_looping && duration > 0.0 && self.started_at.is_some() {
                self.position %= duration;
            } else {
                if self.started_at.is_some() {
                    self.just_finished = true;
                }
                self.position = duration;
                self.should_play = false;
                self.started_at = None;
            }
        }
    }

    fn play(&mut self, now: Instant, latency: Duration) {
        if self.started_at.is_none() {
            if self.position >= self.duration() {
                self.position = 0.0;
            }
            self.started_at = Some(now + latency);
        }
        self.should_play = true;
    }

    fn pause(&mut self) {
        self.should_play = false;
        self.started_at = None;
    }

    fn replay(&mut self, now: Instant, latency: Duration) {
        let was_playing = self.is_playing(now);
        self.interrupted = was_playing;
        self.position = 0.0;
        self.should_play = true;
        self.started_at = Some(if was_playing { now } else { now + latency });
    }

    fn set_position(&mut self, position: u64) -> Result<(), AudioError> {
        if position > self.media.duration_millis {
            return Err(AudioError::InvalidPosition {
                position,
                duration: self.media.duration_millis,
            });
        }
        self.position = position as f64;
        Ok(())
    }

    fn apply(
        &mut self,
        update: &PlaybackStatusUpdate,
        now: Instant,
        latency: Duration,
    ) -> Result<(), AudioError> {
        if let Some(volume) = update.volume {
            validate_volume(volume)?;
        }
        if let Some(rate) = update.rate {
            validate_rate(rate)?;
        }
        if let Some(position) = update.position_millis {
            self.set_position(position)?;
        }
        if let Some(rate) = update.rate {
            self.rate = rate;
        }
        if let Some(correct) = update.should_correct_pitch {
            self.should_correct_pitch = correct;
        }
        if let Some(volume) = update.volume {
            self.volume = volume;
        }
        if let Some(muted) = update.is_muted {
            self.is_muted = muted;
        }
        if let Some(looping) = update.is_looping {
            self.is_looping = looping;
        }
        if let Some(interval) = update.progress_update_interval_millis {
            self.progress_update_interval_millis = interval;
        }
        match update.should_play {
            Some(true) => self.play(now, latency),
            Some(false) => self.pause(),
            None => {}
        }
        Ok(())
    }

    /// Status as of `now`; one-shot flags are cleared once reported
    fn report(&mut self, now: Instant) -> LoadedStatus {
        LoadedStatus {
            uri: self.media.uri.clone(),
            duration_millis: self.media.duration_millis,
            position_millis: self.position.round() as u64,
            should_play: self.should_play,
            is_playing: self.is_playing(now),
            is_buffering: false,
            rate: self.rate,
            should_correct_pitch: self.should_correct_pitch,
            volume: self.volume,
            is_muted: self.is_muted,
            is_looping: self.is_looping,
            did_just_finish: std::mem::take(&mut self.just_finished),
            has_just_been_interrupted: std::mem::take(&mut self.interrupted),
            progress_update_interval_millis: self.progress_update_interval_millis,
        }
    }
}

fn validate_volume(volume: f64) -> Result<(), AudioError> {
    if (0.0..=1.0).contains(&volume) {
        Ok(())
    } else {
        Err(AudioError::InvalidVolume { value: volume })
    }
}

fn validate_rate(rate: f64) -> Result<(), AudioError> {
    if (MIN_RATE..=MAX_RATE).contains(&rate) {
        Ok(())
    } else {
        Err(AudioError::InvalidRate {
            value: rate,
            min: MIN_RATE,
            max: MAX_RATE,
        })
    }
}

impl Sound {
    pub(super) fn new(session: Arc<SessionState>) -> Self {
        Self {
            inner: Arc::new(SoundInner {
                session,
                state: Mutex::new(SoundState::default()),
            }),
        }
    }

    /// Load media and apply the initial status
    pub async fn load(
        &self,
        source: SoundSource,
        initial: PlaybackStatusUpdate,
    ) -> Result<PlaybackStatus, AudioError> {
        if !self
            .inner
            .session
            .enabled
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(AudioError::Disabled);
        }

        let now = Instant::now();
        let (status, callback) = {
            let mut state = self.inner.state.lock().await;
            if state.loaded.is_some() {
                return Err(AudioError::AlreadyLoaded);
            }

            let media = self.inner.session.catalog.resolve(&source)?;
            let mut playback = Playback::new(media, now);
            playback.apply(&initial, now, self.inner.session.start_latency)?;

            let status = PlaybackStatus::Loaded(playback.report(now));
            state.loaded = Some(playback);
            (status, state.callback.clone())
        };

        tracing::debug!("Loaded sound from {}", source);
        notify(callback, &status);
        Ok(status)
    }

    /// Release the media; a sound that is not loaded is left as is
    pub async fn unload(&self) -> Result<PlaybackStatus, AudioError> {
        let (was_loaded, callback) = {
            let mut state = self.inner.state.lock().await;
            (state.loaded.take().is_some(), state.callback.clone())
        };

        let status = PlaybackStatus::Unloaded;
        if was_loaded {
            notify(callback, &status);
        }
        Ok(status)
    }

    pub async fn play(&self) -> Result<PlaybackStatus, AudioError> {
        let latency = self.inner.session.start_latency;
        self.modify(|playback, now| {
            playback.play(now, latency);
            Ok(())
        })
        .await
    }

    pub async fn pause(&self) -> Result<PlaybackStatus, AudioError> {
        self.modify(|playback, _| {
            playback.pause();
            Ok(())
        })
        .await
    }

    pub async fn stop(&self) -> Result<PlaybackStatus, AudioError> {
        self.modify(|playback, _| {
            playback.pause();
            playback.position = 0.0;
            Ok(())
        })
        .await
    }

    /// Restart from the beginning, flagging the interruption if it was playing
    pub async fn replay(&self) -> Result<PlaybackStatus, AudioError> {
        let latency = self.inner.session.start_latency;
        self.modify(|playback, now| {
            playback.replay(now, latency);
            Ok(())
        })
        .await
    }

    pub async fn set_position(&self, position_millis: u64) -> Result<PlaybackStatus, AudioError> {
        self.modify(|playback, _| playback.set_position(position_millis))
            .await
    }

    pub async fn set_volume(&self, volume: f64) -> Result<PlaybackStatus, AudioError> {
        validate_volume(volume)?;
        self.modify(|playback, _| {
            playback.volume = volume;
            Ok(())
        })
        .await
    }

    pub async fn set_is_muted(&self, muted: bool) -> Result<PlaybackStatus, AudioError> {
        self.modify(|playback, _| {
            playback.is_muted = muted;
            Ok(())
        })
        .await
    }

    pub async fn set_is_looping(&self, looping: bool) -> Result<PlaybackStatus, AudioError> {
        self.modify(|playback, _| {
            playback.is_looping = looping;
            Ok(())
        })
        .await
    }

    pub async fn set_rate(
        &self,
        rate: f64,
        should_correct_pitch: bool,
    ) -> Result<PlaybackStatus, AudioError> {
        validate_rate(rate)?;
        self.modify(|playback, _| {
            playback.rate = rate;
            playback.should_correct_pitch = should_correct_pitch;
            Ok(())
        })
        .await
    }

    pub async fn set_progress_update_interval(
        &self,
        interval_millis: u64,
    ) -> Result<PlaybackStatus, AudioError> {
        self.modify(|playback, _| {
            playback.progress_update_interval_millis = interval_millis;
            Ok(())
        })
        .await
    }

    /// Apply several status fields at once; nothing changes if any field is invalid
    pub async fn set_status(
        &self,
        update: PlaybackStatusUpdate,
    ) -> Result<PlaybackStatus, AudioError> {
        let latency = self.inner.session.start_latency;
        self.modify(|playback, now| playback.apply(&update, now, latency))
            .await
    }

    pub async fn status(&self) -> PlaybackStatus {
        let now = Instant::now();
        let mut state = self.inner.state.lock().await;
        match state.loaded.as_mut() {
            Some(playback) => {
                playback.advance(now);
                PlaybackStatus::Loaded(playback.report(now))
            }
            None => PlaybackStatus::Unloaded,
        }
    }

    pub async fn set_on_playback_status_update<F>(&self, callback: F)
    where
        F: Fn(&PlaybackStatus) + Send + Sync + 'static,
    {
        self.inner.state.lock().await.callback = Some(Arc::new(callback));
    }

    pub async fn clear_on_playback_status_update(&self) {
        self.inner.state.lock().await.callback = None;
    }

    async fn modify<F>(&self, change: F) -> Result<PlaybackStatus, AudioError>
    where
        F: FnOnce(&mut Playback, Instant) -> Result<(), AudioError>,
    {
        let now = Instant::now();
        let (status, callback) = {
            let mut state = self.inner.state.lock().await;
            let playback = state.loaded.as_mut().ok_or(AudioError::NotLoaded)?;
            playback.advance(now);

            // validate against a copy so a rejected update leaves no partial change
            let mut candidate = playback.clone();
            change(&mut candidate, now)?;
            *playback = candidate;

            let status = PlaybackStatus::Loaded(playback.report(now));
            (status, state.callback.clone())
        };

        notify(callback, &status);
        Ok(status)
    }
}

fn notify(callback: Option<StatusCallback>, status: &PlaybackStatus) {
    if let Some(callback) = callback {
        callback(status);
    }
}

#[async_trait]
impl StatusSource for Sound {
    type Error = AudioError;

    async fn snapshot(&self) -> Result<Snapshot, AudioError> {
        Ok(self.status().await.to_snapshot())
    }
}
