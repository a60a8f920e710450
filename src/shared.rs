//! Mutex-guarded host for split control and audio threads.

use crate::{PluginHost, Result};
use parking_lot::{Mutex, MutexGuard};
use solo_midi::NoteSender;
use solo_plugin::{PluginDescriptor, CHANNELS};
use std::path::Path;
use std::sync::Arc;

/// A [`PluginHost`] shared between an audio callback and a control thread.
///
/// The audio side never blocks: if a control call holds the lock when a tick
/// arrives, that tick is silent and queued notes wait for the next one.
/// Notes go through the lock-free queue and never take the lock.
#[derive(Clone)]
pub struct SharedPluginHost {
    host: Arc<Mutex<PluginHost>>,
    notes: NoteSender,
}

impl SharedPluginHost {
    pub fn new(host: PluginHost) -> Self {
        let notes = host.note_sender();
        Self {
            host: Arc::new(Mutex::new(host)),
            notes,
        }
    }

    /// Audio-thread entry point. Returns `false` if the tick was skipped
    /// because the host was busy.
    pub fn process(&self, input: &[f32], output: &mut [f32], frames: usize) -> bool {
        if let Some(mut host) = self.host.try_lock() {
            host.process(input, output, frames);
            true
        } else {
            let frames = frames.min(output.len() / CHANNELS);
            output[..frames * CHANNELS].fill(0.0);
            false
        }
    }

    /// Blocks until the audio thread is between ticks.
    pub fn lock(&self) -> MutexGuard<'_, PluginHost> {
        self.host.lock()
    }

    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<PluginDescriptor> {
        self.host.lock().load_plugin(path).cloned()
    }

    pub fn load_preset(&self, path: impl AsRef<Path>) -> Result<()> {
        self.host.lock().load_preset(path)
    }

    pub fn unload(&self) -> bool {
        self.host.lock().unload()
    }

    pub fn set_parameter(&self, index: usize, value: f32) -> Result<()> {
        self.host.lock().set_parameter(index, value)
    }

    pub fn parameter(&self, index: usize) -> f32 {
        self.host.lock().parameter(index)
    }

    pub fn note_on(&self, note: i32, velocity: f32) -> Result<()> {
        self.notes
            .note_on(note, velocity)
            .map_err(|_| crate::Error::MidiQueueFull)
    }

    pub fn note_off(&self, note: i32, velocity: f32) -> Result<()> {
        self.notes
            .note_off(note, velocity)
            .map_err(|_| crate::Error::MidiQueueFull)
    }
}
