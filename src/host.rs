//! The single-slot plugin host.
//!
//! [`PluginHost`] owns at most one plugin instance and exposes three groups
//! of operations:
//!
//! - loading: [`load_plugin`](PluginHost::load_plugin),
//!   [`load_preset`](PluginHost::load_preset), [`unload`](PluginHost::unload)
//! - the audio tick: [`process`](PluginHost::process), interleaved stereo in
//!   and out
//! - control: parameters and notes
//!
//! Loading and presets do blocking file I/O and must never be called from
//! the audio callback. Everything that touches the instance takes
//! `&mut self`, so a single owner cannot overlap a load with a tick. When
//! the two run on different threads, wrap the host in a
//! [`SharedPluginHost`](crate::SharedPluginHost).

use crate::{Error, HostConfig, PluginHostBuilder, Result};
use solo_midi::{MidiEvent, MidiEventVec, MidiQueue, NoteSender};
use solo_plugin::{
    FormatManager, ParameterHandle, PlanarBuffer, PluginDescriptor, PluginInstance, CHANNELS,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Hosts one plugin inside a real-time audio callback.
pub struct PluginHost {
    config: HostConfig,
    formats: FormatManager,

    instance: Option<Box<dyn PluginInstance>>,
    plugin_path: Option<PathBuf>,

    buffer: PlanarBuffer,
    midi_queue: MidiQueue,
    render_midi: MidiEventVec,

    faults: u64,
}

impl PluginHost {
    pub fn builder() -> PluginHostBuilder {
        PluginHostBuilder::default()
    }

    /// A host with the default configuration at `sample_rate`, using every
    /// plugin format compiled into the build.
    pub fn new(sample_rate: f64) -> Result<Self> {
        Self::builder().sample_rate(sample_rate).build()
    }

    pub(crate) fn from_parts(config: HostConfig, formats: FormatManager) -> Self {
        let midi_queue = MidiQueue::new(config.midi_queue_capacity);
        let render_midi = midi_queue.render_buffer();

        Self {
            buffer: PlanarBuffer::new(config.block_size),
            config,
            formats,
            instance: None,
            plugin_path: None,
            midi_queue,
            render_midi,
            faults: 0,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn formats(&self) -> &FormatManager {
        &self.formats
    }

    pub fn formats_mut(&mut self) -> &mut FormatManager {
        &mut self.formats
    }

    pub fn is_loaded(&self) -> bool {
        self.instance.is_some()
    }

    /// File the current plugin was loaded from.
    pub fn plugin_path(&self) -> Option<&Path> {
        self.plugin_path.as_deref()
    }

    pub fn descriptor(&self) -> Option<&PluginDescriptor> {
        self.instance.as_ref().map(|instance| instance.descriptor())
    }

    /// Number of audio blocks replaced by silence because the plugin panicked.
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads the first plugin found in `path` at the configured sample rate.
    ///
    /// The replacement is constructed and prepared before the current
    /// instance is released, so on any error the previous plugin (or the
    /// empty slot) stays exactly as it was.
    pub fn load_plugin(&mut self, path: impl AsRef<Path>) -> Result<&PluginDescriptor> {
        let sample_rate = self.config.sample_rate;
        self.load_plugin_at(path, sample_rate)
    }

    /// Like [`load_plugin`](Self::load_plugin), switching the host to
    /// `sample_rate` if the load succeeds.
    pub fn load_plugin_at(
        &mut self,
        path: impl AsRef<Path>,
        sample_rate: f64,
    ) -> Result<&PluginDescriptor> {
        let path = path.as_ref();

        let config = HostConfig {
            sample_rate,
            ..self.config.clone()
        };
        config.validate()?;

        let Some(descriptor) = self.formats.scan(path).into_iter().next() else {
            tracing::warn!("No plugin found in {}", path.display());
            return Err(Error::NotFound(path.to_path_buf()));
        };

        let instance = match self.construct(&descriptor, &config) {
            Ok(instance) => instance,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", path.display(), e);
                return Err(e);
            }
        };

        if let Some(previous) = self.instance.take() {
            release_instance(previous);
        }

        self.config = config;
        self.plugin_path = Some(path.to_path_buf());

        tracing::info!(
            "Loaded {} plugin '{}' from {} ({} Hz, {} frames)",
            descriptor.format,
            descriptor.name,
            path.display(),
            self.config.sample_rate,
            self.config.block_size
        );

        let instance = self.instance.insert(instance);
        Ok(instance.descriptor())
    }

    fn construct(
        &self,
        descriptor: &PluginDescriptor,
        config: &HostConfig,
    ) -> Result<Box<dyn PluginInstance>> {
        let formats = &self.formats;
        let (sample_rate, block_size) = (config.sample_rate, config.block_size);
        let max_events = config.midi_queue_capacity;

        guarded(|| {
            let mut instance = formats.instantiate(descriptor, sample_rate, block_size)?;
            instance.set_max_events(max_events);
            instance.prepare(sample_rate, block_size)?;
            instance.set_non_realtime(false);
            Ok(instance)
        })
        .map_err(|e| match e {
            Error::Plugin(source) => Error::Instantiation {
                name: descriptor.name.clone(),
                source,
            },
            other => other,
        })
    }

    /// Releases and drops the current plugin. Returns whether one was loaded.
    pub fn unload(&mut self) -> bool {
        self.plugin_path = None;
        match self.instance.take() {
            Some(instance) => {
                release_instance(instance);
                true
            }
            None => false,
        }
    }

    /// Applies a legacy `.fxb` / `.fxp` preset file to the loaded plugin.
    ///
    /// Best-effort: an error part way through leaves whatever the plugin had
    /// already accepted.
    pub fn load_preset(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let instance = self.instance.as_deref_mut().ok_or(Error::NotLoaded)?;

        match apply_preset_file(instance, path) {
            Ok(()) => {
                tracing::info!("Applied preset {}", path.display());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to apply preset {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Audio
    // =========================================================================

    /// Runs one audio tick over interleaved stereo buffers.
    ///
    /// Frames that do not fit in either slice are ignored. Without a plugin
    /// the output is silence and any queued notes are discarded. A panic
    /// inside the plugin turns this block into silence and bumps
    /// [`fault_count`](Self::fault_count).
    pub fn process(&mut self, input: &[f32], output: &mut [f32], frames: usize) {
        let frames = frames
            .min(input.len() / CHANNELS)
            .min(output.len() / CHANNELS);
        if frames == 0 {
            return;
        }

        let Some(instance) = self.instance.as_mut() else {
            output[..frames * CHANNELS].fill(0.0);
            self.midi_queue.clear();
            return;
        };

        self.buffer.set_size(frames);
        self.buffer.deinterleave_from(input, frames);
        self.midi_queue.drain_into(&mut self.render_midi);

        let block_size = self.config.block_size;
        let buffer = &mut self.buffer;
        let midi = &mut self.render_midi;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut start = 0;
            while start < frames {
                let len = block_size.min(frames - start);
                let mut block = buffer.block_range(start, len);
                instance.process(&mut block, midi);
                // Queued events belong to the first sub-block only.
                midi.clear();
                start += len;
            }
        }));

        self.render_midi.clear();

        match result {
            Ok(()) => self.buffer.interleave_into(output, frames),
            Err(_) => {
                output[..frames * CHANNELS].fill(0.0);
                self.faults += 1;
            }
        }
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// 0 when nothing is loaded.
    pub fn num_parameters(&self) -> usize {
        self.with_instance(|instance| Ok(instance.parameter_count()))
            .unwrap_or(0)
    }

    pub fn try_parameter_name(&self, index: usize) -> Result<String> {
        self.with_instance(|instance| Ok(instance.parameter_name(index)?))
    }

    /// Empty when nothing is loaded, the index is out of range or the
    /// plugin fails.
    pub fn parameter_name(&self, index: usize) -> String {
        self.try_parameter_name(index).unwrap_or_default()
    }

    pub fn try_parameter(&self, index: usize) -> Result<f32> {
        self.with_instance(|instance| Ok(instance.get_parameter(index)?))
    }

    /// Normalized value, or 0.0 under the same conditions as
    /// [`parameter_name`](Self::parameter_name).
    pub fn parameter(&self, index: usize) -> f32 {
        self.try_parameter(index).unwrap_or(0.0)
    }

    pub fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        let instance = self.instance.as_deref_mut().ok_or(Error::NotLoaded)?;
        guarded(|| Ok(instance.set_parameter(index, value)?))
    }

    /// Snapshot of every parameter. Empty when nothing is loaded.
    pub fn parameters(&self) -> Vec<ParameterHandle> {
        (0..self.num_parameters())
            .map(|index| ParameterHandle {
                index,
                name: self.parameter_name(index),
                value: self.parameter(index),
            })
            .collect()
    }

    fn with_instance<T>(&self, f: impl FnOnce(&dyn PluginInstance) -> Result<T>) -> Result<T> {
        let instance = self.instance.as_deref().ok_or(Error::NotLoaded)?;
        guarded(|| f(instance))
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// Queues a channel-1 note-on for the start of the next block.
    ///
    /// Queuing does not require a loaded plugin. The note number is masked
    /// to 7 bits and the velocity scaled from 0..1.
    pub fn note_on(&self, note: i32, velocity: f32) -> Result<()> {
        self.queue(MidiEvent::host_note_on(note, velocity))
    }

    /// Queues a channel-1 note-off for the start of the next block.
    pub fn note_off(&self, note: i32, velocity: f32) -> Result<()> {
        self.queue(MidiEvent::host_note_off(note, velocity))
    }

    pub fn queue(&self, event: MidiEvent) -> Result<()> {
        self.midi_queue.push(event).map_err(|rejected| {
            tracing::warn!("MIDI queue full, dropping {:?}", rejected.msg);
            Error::MidiQueueFull
        })
    }

    /// Handle for queuing notes from another thread without borrowing the host.
    pub fn note_sender(&self) -> NoteSender {
        self.midi_queue.sender()
    }

    /// Events waiting for the next tick.
    pub fn pending_midi(&self) -> usize {
        self.midi_queue.len()
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Runs `f`, turning a panic into [`Error::Fault`].
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Error::Fault(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "plugin panicked".to_string()
    }
}

fn release_instance(mut instance: Box<dyn PluginInstance>) {
    let name = instance.descriptor().name.clone();
    let released = guarded(move || {
        instance.release();
        drop(instance);
        Ok(())
    });

    match released {
        Ok(()) => tracing::info!("Unloaded plugin '{}'", name),
        Err(e) => tracing::warn!("Plugin '{}' faulted while unloading: {}", name, e),
    }
}

#[cfg(feature = "vst2")]
fn apply_preset_file(instance: &mut dyn PluginInstance, path: &Path) -> Result<()> {
    use solo_plugin::FxPreset;

    let data = std::fs::read(path)?;
    guarded(|| {
        let preset = FxPreset::parse(&data)?;
        tracing::debug!(
            "Preset {} written by plugin id {:#010x}",
            path.display(),
            preset.fx_id
        );
        preset.apply_to(instance)?;
        Ok(())
    })
}

#[cfg(not(feature = "vst2"))]
fn apply_preset_file(_instance: &mut dyn PluginInstance, _path: &Path) -> Result<()> {
    Err(Error::UnsupportedBuild)
}
