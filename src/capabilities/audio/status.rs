//! Playback status snapshots and partial status updates

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::poller::{Snapshot, StatusShape};

/// Status of a sound at one point in time
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackStatus {
    Unloaded,
    Loaded(LoadedStatus),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedStatus {
    pub uri: String,
    pub duration_millis: u64,
    pub position_millis: u64,
    pub should_play: bool,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub rate: f64,
    pub should_correct_pitch: bool,
    pub volume: f64,
    pub is_muted: bool,
    pub is_looping: bool,
    pub did_just_finish: bool,
    pub has_just_been_interrupted: bool,
    pub progress_update_interval_millis: u64,
}

impl PlaybackStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, PlaybackStatus::Loaded(_))
    }

    pub fn loaded(&self) -> Option<&LoadedStatus> {
        match self {
            PlaybackStatus::Loaded(status) => Some(status),
            PlaybackStatus::Unloaded => None,
        }
    }

    /// Field map with camelCase names; an unloaded sound only has `isLoaded`
    pub fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert("isLoaded".to_string(), Value::Bool(self.is_loaded()));
        if let PlaybackStatus::Loaded(status) = self {
            if let Ok(Value::Object(fields)) = serde_json::to_value(status) {
                snapshot.extend(fields);
            }
        }
        snapshot
    }
}

impl Serialize for PlaybackStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_snapshot().serialize(serializer)
    }
}

/// Partial status applied by `load` and `set_status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_play: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_millis: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_correct_pitch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_looping: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_update_interval_millis: Option<u64>,
}

impl PlaybackStatusUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_play(mut self, value: bool) -> Self {
        self.should_play = Some(value);
        self
    }

    pub fn position_millis(mut self, value: u64) -> Self {
        self.position_millis = Some(value);
        self
    }

    pub fn rate(mut self, value: f64) -> Self {
        self.rate = Some(value);
        self
    }

    pub fn should_correct_pitch(mut self, value: bool) -> Self {
        self.should_correct_pitch = Some(value);
        self
    }

    pub fn volume(mut self, value: f64) -> Self {
        self.volume = Some(value);
        self
    }

    pub fn is_muted(mut self, value: bool) -> Self {
        self.is_muted = Some(value);
        self
    }

    pub fn is_looping(mut self, value: bool) -> Self {
        self.is_looping = Some(value);
        self
    }

    pub fn progress_update_interval_millis(mut self, value: u64) -> Self {
        self.progress_update_interval_millis = Some(value);
        self
    }

    /// Expected shape matching exactly the fields this update sets
    pub fn to_shape(&self) -> StatusShape {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => StatusShape::from(fields),
            _ => StatusShape::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unloaded_snapshot_has_only_is_loaded() {
        let snapshot = PlaybackStatus::Unloaded.to_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["isLoaded"], json!(false));
    }

    #[test]
    fn test_update_shape_uses_camel_case_fields() {
        let shape = PlaybackStatusUpdate::new()
            .should_play(true)
            .is_looping(true)
            .volume(0.5)
            .to_shape();

        assert_eq!(shape.len(), 3);
        let snapshot = json!({
            "isLoaded": true,
            "shouldPlay": true,
            "isLooping": true,
            "volume": 0.5,
            "rate": 1.0,
        });
        let Value::Object(snapshot) = snapshot else {
            unreachable!()
        };
        assert!(shape.matches(&snapshot));
    }
}
