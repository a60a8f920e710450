//! Error types for the Solo host.

use solo_plugin::PluginError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No plugin found in {0}")]
    NotFound(PathBuf),

    #[error("Failed to instantiate plugin '{name}': {source}")]
    Instantiation {
        name: String,
        #[source]
        source: PluginError,
    },

    #[error("No plugin loaded")]
    NotLoaded,

    #[error("Plugin fault: {0}")]
    Fault(String),

    #[error("Preset loading is not available in this build")]
    UnsupportedBuild,

    #[error("MIDI queue full, event dropped")]
    MidiQueueFull,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
