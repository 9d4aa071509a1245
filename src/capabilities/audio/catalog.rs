//! Media known to the simulated audio backend

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::error::AudioError;

pub const BUNDLED_ASSET: &str = "LLizard.mp3";
pub const REMOTE_SOUND_URI: &str = "http://www.noiseaddicts.com/samples_1w72b820/280.mp3";

const BUNDLED_ASSET_DURATION_MILLIS: u64 = 12_000;
const REMOTE_SOUND_DURATION_MILLIS: u64 = 9_000;

/// Where a sound is loaded from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundSource {
    /// Bundled asset, by file name
    Asset(String),
    /// Remote media
    Uri(String),
    /// File on local storage
    File(String),
}

impl SoundSource {
    pub fn asset(name: impl Into<String>) -> Self {
        SoundSource::Asset(name.into())
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        SoundSource::Uri(uri.into())
    }

    /// URI reported in the playback status
    pub fn location(&self) -> String {
        match self {
            SoundSource::Asset(name) => format!("asset:///{}", name),
            SoundSource::Uri(uri) => uri.clone(),
            SoundSource::File(path) if path.starts_with("file://") => path.clone(),
            SoundSource::File(path) => format!("file://{}", path),
        }
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}

/// Catalog entry as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub source: SoundSource,
    pub duration_millis: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub uri: String,
    pub duration_millis: u64,
}

#[derive(Debug, Clone)]
pub struct MediaCatalog {
    durations: HashMap<SoundSource, u64>,
}

impl MediaCatalog {
    pub fn empty() -> Self {
        Self {
            durations: HashMap::new(),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::empty();
        for entry in entries {
            catalog.insert(entry.source, entry.duration_millis);
        }
        catalog
    }

    pub fn insert(&mut self, source: SoundSource, duration_millis: u64) {
        self.durations.insert(source, duration_millis);
    }

    pub fn resolve(&self, source: &SoundSource) -> Result<MediaInfo, AudioError> {
        let duration_millis =
            self.durations
                .get(source)
                .copied()
                .ok_or_else(|| AudioError::SourceNotFound {
                    name: source.to_string(),
                })?;

        Ok(MediaInfo {
            uri: source.location(),
            duration_millis,
        })
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}

impl Default for MediaCatalog {
    fn default() -> Self {
        Self::from_entries(default_entries())
    }
}

/// The bundled lizard sample and the remote mp3
pub fn default_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            source: SoundSource::asset(BUNDLED_ASSET),
            duration_millis: BUNDLED_ASSET_DURATION_MILLIS,
        },
        CatalogEntry {
            source: SoundSource::uri(REMOTE_SOUND_URI),
            duration_millis: REMOTE_SOUND_DURATION_MILLIS,
        },
    ]
}
