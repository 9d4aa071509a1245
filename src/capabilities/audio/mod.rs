//! Simulated audio capability
//!
//! Models the load/playback state machine of a sound object without decoding
//! or output. Durations come from a [`MediaCatalog`].

pub mod catalog;
pub mod error;
pub mod session;
pub mod sound;
pub mod status;

pub use catalog::{
    default_entries, CatalogEntry, MediaCatalog, MediaInfo, SoundSource, BUNDLED_ASSET,
    REMOTE_SOUND_URI,
};
pub use error::AudioError;
pub use session::{
    AudioMode, AudioSession, InterruptionModeAndroid, InterruptionModeIos, DEFAULT_START_LATENCY,
};
pub use sound::{Sound, StatusCallback, MAX_RATE, MIN_RATE};
pub use status::{LoadedStatus, PlaybackStatus, PlaybackStatusUpdate};
