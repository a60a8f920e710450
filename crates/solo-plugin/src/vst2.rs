//! VST2 format backend.

use crate::buffer::{AudioBlock, CHANNELS};
use crate::descriptor::{PluginCategory, PluginDescriptor};
use crate::error::{LoadStage, PluginError, Result};
use crate::format::{home_dir, PluginFormat};
use crate::instance::{check_parameter_index, ChunkKind, PluginInstance};
use solo_midi::{MidiEvent, MidiEventVec, MIDI_STACK_CAPACITY};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use vst::api;
use vst::host::{Host, PluginLoader};
use vst::plugin::{Category, Info, Plugin as VstPlugin, PluginParameters};

pub const FORMAT_NAME: &str = "VST2";

/// Wrapper to make `Arc<dyn PluginParameters>` Send.
/// Safety: the concrete type behind `get_parameter_object()` is
/// `Send + Sync`, but the trait object erases it. The owning instance is only
/// used from one thread at a time.
struct SendParams(Arc<dyn PluginParameters>);
unsafe impl Send for SendParams {}

impl std::ops::Deref for SendParams {
    type Target = dyn PluginParameters;
    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// Host callbacks handed to the plugin.
struct SoloHost;

impl Host for SoloHost {
    fn automate(&self, _index: i32, _value: f32) {
        // Parameter values are read back on demand.
    }

    fn get_plugin_id(&self) -> i32 {
        0x536F_6C6F // "Solo"
    }

    fn idle(&self) {}
}

/// Resolve a macOS `.vst` bundle to the binary inside it.
///
/// The `vst` crate's loader hands the path straight to `dlopen`.
fn resolve_bundle_path(path: &Path) -> PathBuf {
    if path.is_dir() && path.extension().and_then(|e| e.to_str()) == Some("vst") {
        if let Some(stem) = path.file_stem() {
            let inner = path.join("Contents").join("MacOS").join(stem);
            if inner.exists() {
                return inner;
            }
        }
    }
    path.to_path_buf()
}

fn map_category(category: &Category) -> PluginCategory {
    match category {
        Category::Synth => PluginCategory::Instrument,
        Category::Analysis => PluginCategory::Analyzer,
        Category::Generator => PluginCategory::Generator,
        Category::Shell => PluginCategory::Shell,
        Category::Unknown => PluginCategory::Unknown,
        _ => PluginCategory::Effect,
    }
}

fn descriptor_from_info(path: &Path, info: &Info) -> PluginDescriptor {
    PluginDescriptor::new(FORMAT_NAME, path, info.unique_id.to_string(), info.name.clone())
        .vendor(info.vendor.clone())
        .version(info.version.to_string())
        .category(map_category(&info.category))
        .audio_io(info.inputs.max(0) as usize, info.outputs.max(0) as usize)
        .midi(info.midi_inputs > 0 || matches!(info.category, Category::Synth))
}

fn scan_descriptors(path: &Path, info: &Info) -> Vec<PluginDescriptor> {
    if matches!(info.category, Category::Shell) {
        tracing::warn!(
            "{} is a VST2 shell; its sub-plugins are not enumerated",
            path.display()
        );
    }
    vec![descriptor_from_info(path, info)]
}

fn open(path: &Path) -> Result<(vst::host::PluginInstance, Arc<Mutex<SoloHost>>)> {
    let resolved = resolve_bundle_path(path);
    let host = Arc::new(Mutex::new(SoloHost));

    let mut loader = PluginLoader::load(&resolved, Arc::clone(&host)).map_err(|e| {
        PluginError::load_failed(path, LoadStage::Opening, format!("Failed to load VST: {:?}", e))
    })?;

    let mut instance = loader.instance().map_err(|e| {
        PluginError::load_failed(
            path,
            LoadStage::Instantiation,
            format!("Failed to create instance: {:?}", e),
        )
    })?;

    instance.init();
    Ok((instance, host))
}

/// Loads `.so`, `.vst` and `.dll` VST2 plugins.
#[derive(Debug, Default)]
pub struct Vst2Format;

impl Vst2Format {
    pub fn new() -> Self {
        Self
    }
}

impl PluginFormat for Vst2Format {
    fn name(&self) -> &str {
        FORMAT_NAME
    }

    fn file_might_contain(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => matches!(ext.to_ascii_lowercase().as_str(), "so" | "vst" | "dll"),
            None => false,
        }
    }

    /// A shell file reports as one [`PluginCategory::Shell`] descriptor.
    ///
    /// The `vst` crate does not expose `effShellGetNextPlugin`, so the
    /// sub-plugins inside a shell cannot be listed or selected.
    fn scan(&self, path: &Path) -> Result<Vec<PluginDescriptor>> {
        let (instance, _host) = open(path)?;
        Ok(scan_descriptors(path, &instance.get_info()))
    }

    fn instantiate(
        &self,
        descriptor: &PluginDescriptor,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<Box<dyn PluginInstance>> {
        let instance = Vst2Instance::load(&descriptor.path, sample_rate, block_size)?;
        Ok(Box::new(instance))
    }

    fn default_locations(&self) -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            vec![
                PathBuf::from("/Library/Audio/Plug-Ins/VST"),
                home_dir("Library/Audio/Plug-Ins/VST"),
            ]
        }

        #[cfg(target_os = "windows")]
        {
            vec![
                PathBuf::from("C:\\Program Files\\VstPlugins"),
                PathBuf::from("C:\\Program Files\\Common Files\\VST2"),
                PathBuf::from("C:\\Program Files (x86)\\VstPlugins"),
            ]
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            vec![
                PathBuf::from("/usr/lib/vst"),
                PathBuf::from("/usr/local/lib/vst"),
                home_dir(".vst"),
            ]
        }
    }
}

/// Pre-sized scratch for the `processReplacing` call.
struct ChannelScratch {
    inputs: Vec<Vec<f32>>,
    outputs: Vec<Vec<f32>>,
    input_ptrs: Vec<*const f32>,
    output_ptrs: Vec<*mut f32>,
}

impl ChannelScratch {
    fn new(inputs: usize, outputs: usize, frames: usize) -> Self {
        Self {
            inputs: vec![vec![0.0; frames]; inputs],
            outputs: vec![vec![0.0; frames]; outputs],
            input_ptrs: vec![std::ptr::null(); inputs],
            output_ptrs: vec![std::ptr::null_mut(); outputs],
        }
    }
}

/// Pre-sized `VstEvents` block.
///
/// `api::Events` ends in a two-element pointer array that the plugin reads
/// past; `header` is sized for `capacity` pointers and kept 8-byte aligned.
struct EventScratch {
    events: Vec<api::MidiEvent>,
    header: Vec<u64>,
    capacity: usize,
}

impl EventScratch {
    fn new(capacity: usize) -> Self {
        let offset = std::mem::offset_of!(api::Events, events);
        let needed = offset + capacity * std::mem::size_of::<*mut api::Event>();
        let size = needed.max(std::mem::size_of::<api::Events>());
        Self {
            events: Vec::with_capacity(capacity),
            header: vec![0u64; size.div_ceil(8)],
            capacity,
        }
    }

    /// Converts every event in `midi`. Grows first if the block holds more
    /// events than the scratch was sized for, so nothing is ever dropped.
    fn fill(&mut self, midi: &MidiEventVec) -> usize {
        if midi.len() > self.capacity {
            tracing::debug!(
                "Growing VST2 event scratch from {} to {} events",
                self.capacity,
                midi.len()
            );
            *self = Self::new(midi.len());
        }
        self.events.clear();
        self.events.extend(midi.iter().filter_map(to_api_event));
        self.events.len()
    }
}

fn to_api_event(event: &MidiEvent) -> Option<api::MidiEvent> {
    let midi_data = event.to_raw()?;
    Some(api::MidiEvent {
        event_type: api::EventType::Midi,
        byte_size: std::mem::size_of::<api::MidiEvent>() as i32,
        delta_frames: event.frame_offset as i32,
        flags: api::MidiEventFlags::REALTIME_EVENT.bits(),
        note_length: 0,
        note_offset: 0,
        midi_data,
        _midi_reserved: 0,
        detune: 0,
        note_off_velocity: 0,
        _reserved1: 0,
        _reserved2: 0,
    })
}

pub struct Vst2Instance {
    instance: vst::host::PluginInstance,
    #[allow(dead_code)]
    host: Arc<Mutex<SoloHost>>,
    params: SendParams,
    info: Info,
    descriptor: PluginDescriptor,
    scratch: ChannelScratch,
    event_scratch: EventScratch,
    active: bool,
}

// SAFETY: the scratch pointer arrays are rewritten before every process call
// and only ever point into buffers owned by this instance.
unsafe impl Send for Vst2Instance {}

impl Vst2Instance {
    pub fn load(path: &Path, sample_rate: f64, block_size: usize) -> Result<Self> {
        let (mut instance, host) = open(path)?;

        instance.set_sample_rate(sample_rate as f32);
        instance.set_block_size(block_size as i64);

        let info = instance.get_info();
        let descriptor = descriptor_from_info(path, &info);
        let params = SendParams(instance.get_parameter_object());
        let scratch = ChannelScratch::new(
            info.inputs.max(0) as usize,
            info.outputs.max(0) as usize,
            block_size,
        );

        tracing::debug!(
            "Opened VST2 {} ({} in / {} out, {} params)",
            info.name,
            info.inputs,
            info.outputs,
            info.parameters
        );

        Ok(Self {
            instance,
            host,
            params,
            info,
            descriptor,
            scratch,
            event_scratch: EventScratch::new(MIDI_STACK_CAPACITY),
            active: false,
        })
    }

    fn send_midi_events(&mut self, midi: &MidiEventVec) {
        let scratch = &mut self.event_scratch;
        if scratch.fill(midi) == 0 {
            return;
        }

        let offset = std::mem::offset_of!(api::Events, events);
        // SAFETY: `header` is 8-byte aligned and large enough for the fixed
        // part of `api::Events` plus `capacity` pointers; `events` is not
        // touched until `process_events` has returned.
        unsafe {
            let p = scratch.header.as_mut_ptr() as *mut u8;
            let events = &mut *(p as *mut api::Events);
            events.num_events = scratch.events.len() as i32;
            events._reserved = 0;
            let base = p.add(offset) as *mut *mut api::Event;
            for (i, event) in scratch.events.iter_mut().enumerate() {
                *base.add(i) = event as *mut api::MidiEvent as *mut api::Event;
            }
            self.instance.process_events(events);
        }
    }

    fn program_index(&self, index: usize) -> Result<i32> {
        let count = self.program_count();
        if index < count {
            Ok(index as i32)
        } else {
            Err(PluginError::InvalidProgram { index, count })
        }
    }
}

impl PluginInstance for Vst2Instance {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn set_max_events(&mut self, max_events: usize) {
        if max_events > self.event_scratch.capacity {
            self.event_scratch = EventScratch::new(max_events);
        }
    }

    fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> Result<()> {
        if self.active {
            self.release();
        }

        self.instance.set_sample_rate(sample_rate as f32);
        self.instance.set_block_size(max_block_size as i64);
        self.scratch = ChannelScratch::new(
            self.info.inputs.max(0) as usize,
            self.info.outputs.max(0) as usize,
            max_block_size,
        );

        self.instance.resume();
        self.instance.start_process();
        self.active = true;
        Ok(())
    }

    fn release(&mut self) {
        if self.active {
            self.instance.stop_process();
            self.instance.suspend();
            self.active = false;
        }
    }

    fn process(&mut self, block: &mut AudioBlock<'_>, midi: &mut MidiEventVec) {
        use vst::buffer::AudioBuffer as VstBuffer;

        let frames = block.num_frames();
        if frames == 0 {
            return;
        }

        if !midi.is_empty() {
            self.send_midi_events(midi);
            midi.clear();
        }

        let scratch = &mut self.scratch;
        for (c, input) in scratch.inputs.iter_mut().enumerate() {
            if c < CHANNELS {
                input[..frames].copy_from_slice(block.channel(c));
            } else {
                input[..frames].fill(0.0);
            }
        }
        for output in scratch.outputs.iter_mut() {
            output[..frames].fill(0.0);
        }
        for (ptr, input) in scratch.input_ptrs.iter_mut().zip(&scratch.inputs) {
            *ptr = input.as_ptr();
        }
        for (ptr, output) in scratch.output_ptrs.iter_mut().zip(&mut scratch.outputs) {
            *ptr = output.as_mut_ptr();
        }

        // SAFETY: every pointer refers to a buffer of at least `frames`
        // samples that outlives the call.
        let mut vst_buffer = unsafe {
            VstBuffer::from_raw(
                scratch.input_ptrs.len(),
                scratch.output_ptrs.len(),
                scratch.input_ptrs.as_ptr(),
                scratch.output_ptrs.as_mut_ptr(),
                frames,
            )
        };
        self.instance.process(&mut vst_buffer);

        // Mono plugins feed both host channels; missing outputs are silent.
        for c in 0..CHANNELS {
            let out = block.channel_mut(c);
            match scratch.outputs.get(c).or_else(|| scratch.outputs.first()) {
                Some(source) => out.copy_from_slice(&source[..frames]),
                None => out.fill(0.0),
            }
        }
    }

    fn parameter_count(&self) -> usize {
        self.info.parameters.max(0) as usize
    }

    fn parameter_name(&self, index: usize) -> Result<String> {
        check_parameter_index(index, self.parameter_count())?;
        Ok(self.params.get_parameter_name(index as i32))
    }

    fn get_parameter(&self, index: usize) -> Result<f32> {
        check_parameter_index(index, self.parameter_count())?;
        Ok(self.params.get_parameter(index as i32))
    }

    fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        check_parameter_index(index, self.parameter_count())?;
        self.params.set_parameter(index as i32, value.clamp(0.0, 1.0));
        Ok(())
    }

    fn program_count(&self) -> usize {
        self.info.presets.max(0) as usize
    }

    fn current_program(&self) -> usize {
        self.params.get_preset_num().max(0) as usize
    }

    fn set_current_program(&mut self, index: usize) -> Result<()> {
        let program = self.program_index(index)?;
        self.params.change_preset(program);
        Ok(())
    }

    fn set_program_name(&mut self, name: &str) -> Result<()> {
        self.params.set_preset_name(name.to_string());
        Ok(())
    }

    fn load_chunk(&mut self, data: &[u8], kind: ChunkKind) -> Result<()> {
        if !self.info.preset_chunks {
            return Err(PluginError::Unsupported("state chunks"));
        }
        match kind {
            ChunkKind::Bank => self.params.load_bank_data(data),
            ChunkKind::Program => self.params.load_preset_data(data),
        }
        Ok(())
    }
}

impl Drop for Vst2Instance {
    fn drop(&mut self) {
        self.release();
    }
}
