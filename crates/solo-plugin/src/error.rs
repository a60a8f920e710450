//! Error types for plugin scanning, instantiation and control.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Scanning,
    Opening,
    Factory,
    Instantiation,
    Initialization,
    Activation,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::Scanning => write!(f, "scanning"),
            LoadStage::Opening => write!(f, "opening library"),
            LoadStage::Factory => write!(f, "getting factory"),
            LoadStage::Instantiation => write!(f, "creating instance"),
            LoadStage::Initialization => write!(f, "initializing processor"),
            LoadStage::Activation => write!(f, "activating"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin load failed at {stage} stage: {path}\n  Reason: {reason}")]
    LoadFailed {
        path: PathBuf,
        stage: LoadStage,
        reason: String,
    },

    #[error("No registered format named '{0}'")]
    UnknownFormat(String),

    #[error("Parameter index {index} out of range (plugin has {count})")]
    InvalidParameter { index: usize, count: usize },

    #[error("Program index {index} out of range (plugin has {count})")]
    InvalidProgram { index: usize, count: usize },

    #[error("Unsupported by this plugin: {0}")]
    Unsupported(&'static str),

    #[error("Invalid preset data: {0}")]
    Preset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    pub(crate) fn load_failed(
        path: impl Into<PathBuf>,
        stage: LoadStage,
        reason: impl Into<String>,
    ) -> Self {
        PluginError::LoadFailed {
            path: path.into(),
            stage,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;
