use thiserror::Error;

/// Rejections raised by the audio capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("The Sound is already loaded.")]
    AlreadyLoaded,

    #[error("Cannot complete operation because sound is not loaded.")]
    NotLoaded,

    #[error("Volume value {value} is not between 0.0 and 1.0")]
    InvalidVolume { value: f64 },

    #[error("Rate value {value} is not between {min} and {max}")]
    InvalidRate { value: f64, min: f64, max: f64 },

    #[error("Position {position} ms is beyond the duration of {duration} ms")]
    InvalidPosition { position: u64, duration: u64 },

    #[error("Sound source '{name}' could not be found")]
    SourceNotFound { name: String },

    #[error("Cannot load sound while audio is disabled")]
    Disabled,

    #[error("Impossible audio mode: {reason}")]
    ImpossibleAudioMode { reason: String },
}
