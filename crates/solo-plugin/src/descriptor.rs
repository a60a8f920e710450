//! Plugin descriptors produced by scanning.
//!
//! A descriptor identifies one loadable unit inside a plugin file. A single
//! file can produce several (CLAP factories, VST2 shells).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio I/O configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioIO {
    /// Number of audio input channels
    pub inputs: usize,
    /// Number of audio output channels
    pub outputs: usize,
}

impl AudioIO {
    /// Stereo in, stereo out
    pub fn stereo() -> Self {
        Self {
            inputs: 2,
            outputs: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginCategory {
    Instrument,
    Effect,
    Analyzer,
    Generator,
    /// Container exposing several sub-plugins (VST2 shell).
    Shell,
    #[default]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Name of the format that produced this descriptor (`"VST2"`, `"CLAP"`, ...).
    pub format: String,

    /// File or bundle the plugin was found in
    pub path: PathBuf,

    /// Format-native identifier (CLAP plugin id, VST2 unique id)
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Vendor/author name
    pub vendor: String,

    /// Version string
    pub version: String,

    pub category: PluginCategory,

    /// Audio I/O configuration
    pub audio_io: AudioIO,

    /// Does this plugin receive MIDI?
    pub receives_midi: bool,
}

impl PluginDescriptor {
    /// Create new descriptor with required fields
    pub fn new(
        format: impl Into<String>,
        path: impl Into<PathBuf>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            format: format.into(),
            path: path.into(),
            id: id.into(),
            name: name.into(),
            vendor: String::new(),
            version: "1.0.0".to_string(),
            category: PluginCategory::Unknown,
            audio_io: AudioIO::stereo(),
            receives_midi: false,
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn category(mut self, category: PluginCategory) -> Self {
        self.category = category;
        self
    }

    pub fn audio_io(mut self, inputs: usize, outputs: usize) -> Self {
        self.audio_io = AudioIO { inputs, outputs };
        self
    }

    pub fn midi(mut self, receives_midi: bool) -> Self {
        self.receives_midi = receives_midi;
        self
    }

    pub fn is_instrument(&self) -> bool {
        self.category == PluginCategory::Instrument
    }
}
