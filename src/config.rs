//! Host configuration.

use crate::{Error, Result};

/// Configuration for a [`PluginHost`](crate::PluginHost).
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub sample_rate: f64,
    /// Largest block handed to the plugin in one call. Longer callbacks are
    /// split into several plugin calls.
    pub block_size: usize,
    /// Notes that can wait for the next block before `note_on` starts failing.
    pub midi_queue_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
            midi_queue_capacity: 1024,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(1..=65536).contains(&self.block_size) {
            return Err(Error::InvalidConfig(format!(
                "block_size {} out of range (1-65536 frames)",
                self.block_size
            )));
        }
        if self.midi_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "midi_queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
