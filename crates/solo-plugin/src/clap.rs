//! CLAP format backend.
//!
//! Talks to the plugin through the raw `clap-sys` ABI. Each library is
//! opened once per process and shared between scans and instances, so its
//! `clap_entry` sees exactly one `init` and one matching `deinit` after the
//! last user is gone.

use crate::buffer::{AudioBlock, CHANNELS};
use crate::descriptor::{PluginCategory, PluginDescriptor};
use crate::error::{LoadStage, PluginError, Result};
use crate::format::{home_dir, PluginFormat};
use crate::instance::{check_parameter_index, PluginInstance};
use clap_sys::audio_buffer::clap_audio_buffer;
use clap_sys::entry::clap_plugin_entry;
use clap_sys::events::{
    clap_event_header, clap_event_midi, clap_event_note, clap_event_param_value,
    clap_input_events, clap_output_events, CLAP_CORE_EVENT_SPACE_ID, CLAP_EVENT_MIDI,
    CLAP_EVENT_NOTE_OFF, CLAP_EVENT_NOTE_ON, CLAP_EVENT_PARAM_VALUE,
};
use clap_sys::ext::params::{clap_param_info, clap_plugin_params, CLAP_EXT_PARAMS};
use clap_sys::ext::render::{
    clap_plugin_render, CLAP_EXT_RENDER, CLAP_RENDER_OFFLINE, CLAP_RENDER_REALTIME,
};
use clap_sys::factory::plugin_factory::{clap_plugin_factory, CLAP_PLUGIN_FACTORY_ID};
use clap_sys::host::clap_host;
use clap_sys::plugin::{clap_plugin, clap_plugin_descriptor};
use clap_sys::process::clap_process;
use clap_sys::version::CLAP_VERSION;
use solo_midi::{ChannelVoiceMsg, MidiEvent, MidiEventVec, MIDI_STACK_CAPACITY};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::{Arc, OnceLock, Weak};

pub const FORMAT_NAME: &str = "CLAP";

/// Resolve a macOS `.clap` bundle to the binary inside it.
fn resolve_bundle_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        if let Some(stem) = path.file_stem() {
            let inner = path.join("Contents").join("MacOS").join(stem);
            if inner.exists() {
                return inner;
            }
        }
    }
    path.to_path_buf()
}

/// # Safety
/// `ptr` must be null or point to a nul-terminated string.
unsafe fn c_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Live handles keyed by the resolved binary path.
struct LibraryRegistry<T> {
    entries: Mutex<HashMap<PathBuf, Weak<T>>>,
}

impl<T> LibraryRegistry<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live handle for `key`, or opens a new one.
    ///
    /// `open` runs under the registry lock, so two callers never open the
    /// same library side by side.
    fn get_or_open(&self, key: &Path, open: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(key).and_then(Weak::upgrade) {
            return Ok(existing);
        }
        entries.retain(|_, handle| handle.strong_count() > 0);

        let opened = Arc::new(open()?);
        entries.insert(key.to_path_buf(), Arc::downgrade(&opened));
        Ok(opened)
    }
}

fn libraries() -> &'static LibraryRegistry<ClapLibrary> {
    static REGISTRY: OnceLock<LibraryRegistry<ClapLibrary>> = OnceLock::new();
    REGISTRY.get_or_init(LibraryRegistry::new)
}

/// An opened library with its `clap_entry` initialised.
struct ClapLibrary {
    entry: *const clap_plugin_entry,
    _library: libloading::Library,
}

// SAFETY: `clap_entry` is a process-wide static; `get_factory` and the
// factory functions may be called from any thread. `init` and `deinit` are
// serialised through the registry lock.
unsafe impl Send for ClapLibrary {}
unsafe impl Sync for ClapLibrary {}

impl ClapLibrary {
    /// The process-wide handle for `path`, opening it on first use.
    fn shared(path: &Path) -> Result<Arc<Self>> {
        let binary = resolve_bundle_path(path);
        let key = std::fs::canonicalize(&binary).unwrap_or(binary);
        libraries().get_or_open(&key, || Self::open(path))
    }

    fn open(path: &Path) -> Result<Self> {
        let binary = resolve_bundle_path(path);

        // SAFETY: loading a plugin library runs its initialisers; that is
        // the point of hosting it.
        let library = unsafe { libloading::Library::new(&binary) }.map_err(|e| {
            PluginError::load_failed(path, LoadStage::Opening, format!("Failed to load library: {}", e))
        })?;

        // `clap_entry` is an exported static, not a function.
        // SAFETY: the symbol type matches the CLAP ABI.
        let entry: *const clap_plugin_entry = unsafe {
            let symbol = library
                .get::<*const clap_plugin_entry>(b"clap_entry\0")
                .map_err(|e| {
                    PluginError::load_failed(
                        path,
                        LoadStage::Opening,
                        format!("No clap_entry symbol: {}", e),
                    )
                })?;
            *symbol
        };
        if entry.is_null() {
            return Err(PluginError::load_failed(path, LoadStage::Opening, "clap_entry is null"));
        }

        let init = unsafe { (*entry).init }.ok_or_else(|| {
            PluginError::load_failed(path, LoadStage::Opening, "No init function")
        })?;
        let path_c = CString::new(path.to_string_lossy().as_bytes()).map_err(|e| {
            PluginError::load_failed(path, LoadStage::Opening, format!("Invalid path: {}", e))
        })?;
        if !unsafe { init(path_c.as_ptr()) } {
            return Err(PluginError::load_failed(path, LoadStage::Opening, "Entry init failed"));
        }

        Ok(Self {
            entry,
            _library: library,
        })
    }

    fn factory(&self, path: &Path) -> Result<&clap_plugin_factory> {
        let get_factory = unsafe { (*self.entry).get_factory }.ok_or_else(|| {
            PluginError::load_failed(path, LoadStage::Factory, "No get_factory function")
        })?;
        let factory = unsafe { get_factory(CLAP_PLUGIN_FACTORY_ID.as_ptr()) }
            as *const clap_plugin_factory;
        if factory.is_null() {
            return Err(PluginError::load_failed(path, LoadStage::Factory, "No plugin factory"));
        }
        Ok(unsafe { &*factory })
    }

    /// Every plugin descriptor the factory exposes, in factory order.
    fn descriptors(&self, path: &Path) -> Result<Vec<PluginDescriptor>> {
        let factory = self.factory(path)?;
        let (Some(count_fn), Some(desc_fn)) =
            (factory.get_plugin_count, factory.get_plugin_descriptor)
        else {
            return Err(PluginError::load_failed(
                path,
                LoadStage::Factory,
                "Factory is missing enumeration functions",
            ));
        };

        let count = unsafe { count_fn(factory) };
        let mut found = Vec::with_capacity(count as usize);
        for index in 0..count {
            let desc = unsafe { desc_fn(factory, index) };
            if desc.is_null() {
                continue;
            }
            found.push(unsafe { descriptor_from_clap(path, &*desc) });
        }
        Ok(found)
    }
}

impl Drop for ClapLibrary {
    fn drop(&mut self) {
        // Serialised with any `init` running in `shared`.
        let _entries = libraries().entries.lock();
        if let Some(deinit) = unsafe { (*self.entry).deinit } {
            unsafe { deinit() };
        }
    }
}

/// # Safety
/// `desc` must come from a live factory.
unsafe fn descriptor_from_clap(path: &Path, desc: &clap_plugin_descriptor) -> PluginDescriptor {
    let features = features(desc);
    let category = category_from_features(&features);
    let receives_midi = features
        .iter()
        .any(|f| f == "instrument" || f == "note-effect");

    PluginDescriptor::new(FORMAT_NAME, path, c_str(desc.id), c_str(desc.name))
        .vendor(c_str(desc.vendor))
        .version(c_str(desc.version))
        .category(category)
        .midi(receives_midi)
}

/// # Safety
/// The feature list must be null or a null-terminated array of C strings.
unsafe fn features(desc: &clap_plugin_descriptor) -> Vec<String> {
    let mut out = Vec::new();
    if desc.features.is_null() {
        return out;
    }
    let mut cursor = desc.features;
    while !(*cursor).is_null() {
        out.push(c_str(*cursor));
        cursor = cursor.add(1);
    }
    out
}

fn category_from_features<S: AsRef<str>>(features: &[S]) -> PluginCategory {
    let has = |name: &str| features.iter().any(|f| f.as_ref() == name);
    if has("instrument") {
        PluginCategory::Instrument
    } else if has("analyzer") {
        PluginCategory::Analyzer
    } else if has("audio-effect") || has("note-effect") {
        PluginCategory::Effect
    } else {
        PluginCategory::Unknown
    }
}

fn host_callbacks() -> clap_host {
    unsafe extern "C" fn get_extension(
        _host: *const clap_host,
        _extension_id: *const c_char,
    ) -> *const c_void {
        ptr::null()
    }
    unsafe extern "C" fn request_restart(_host: *const clap_host) {}
    unsafe extern "C" fn request_process(_host: *const clap_host) {}
    unsafe extern "C" fn request_callback(_host: *const clap_host) {}

    clap_host {
        clap_version: CLAP_VERSION,
        host_data: ptr::null_mut(),
        name: c"Solo".as_ptr(),
        vendor: c"Solo".as_ptr(),
        url: c"".as_ptr(),
        version: c"0.0.1".as_ptr(),
        get_extension: Some(get_extension),
        request_restart: Some(request_restart),
        request_process: Some(request_process),
        request_callback: Some(request_callback),
    }
}

/// Loads `.clap` plugins.
#[derive(Debug, Default)]
pub struct ClapFormat;

impl ClapFormat {
    pub fn new() -> Self {
        Self
    }
}

impl PluginFormat for ClapFormat {
    fn name(&self) -> &str {
        FORMAT_NAME
    }

    fn file_might_contain(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("clap"))
    }

    fn scan(&self, path: &Path) -> Result<Vec<PluginDescriptor>> {
        let library = ClapLibrary::shared(path)?;
        library.descriptors(path)
    }

    fn instantiate(
        &self,
        descriptor: &PluginDescriptor,
        _sample_rate: f64,
        block_size: usize,
    ) -> Result<Box<dyn PluginInstance>> {
        // The sample rate is applied on activation in `prepare`.
        let instance = ClapInstance::load(descriptor, block_size)?;
        Ok(Box::new(instance))
    }

    fn default_locations(&self) -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            vec![
                PathBuf::from("/Library/Audio/Plug-Ins/CLAP"),
                home_dir("Library/Audio/Plug-Ins/CLAP"),
            ]
        }

        #[cfg(target_os = "windows")]
        {
            vec![
                PathBuf::from("C:\\Program Files\\Common Files\\CLAP"),
                PathBuf::from("C:\\Program Files (x86)\\Common Files\\CLAP"),
            ]
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            vec![
                PathBuf::from("/usr/lib/clap"),
                PathBuf::from("/usr/local/lib/clap"),
                home_dir(".clap"),
            ]
        }
    }
}

/// Parameter info cached at load time.
#[derive(Debug, Clone)]
struct ParamInfo {
    id: u32,
    cookie: *mut c_void,
    name: String,
    min: f64,
    max: f64,
}

impl ParamInfo {
    fn normalize(&self, plain: f64) -> f32 {
        if self.max > self.min {
            ((plain - self.min) / (self.max - self.min)).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }

    fn denormalize(&self, normalized: f32) -> f64 {
        self.min + f64::from(normalized.clamp(0.0, 1.0)) * (self.max - self.min)
    }
}

/// One input event, stored as the `clap-sys` struct so the header pointer
/// can be cast back by the plugin.
enum InputEvent {
    Note(clap_event_note),
    Midi(clap_event_midi),
    Param(clap_event_param_value),
}

impl InputEvent {
    fn header(&self) -> *const clap_event_header {
        match self {
            InputEvent::Note(e) => &e.header,
            InputEvent::Midi(e) => &e.header,
            InputEvent::Param(e) => &e.header,
        }
    }
}

fn header(size: usize, time: u32, type_: u16) -> clap_event_header {
    clap_event_header {
        size: size as u32,
        time,
        space_id: CLAP_CORE_EVENT_SPACE_ID,
        type_,
        flags: 0,
    }
}

fn to_input_event(event: &MidiEvent, max_time: u32) -> Option<InputEvent> {
    let time = (event.frame_offset as u32).min(max_time);
    let channel = event.channel_num() as i16;
    let note = |type_: u16, key: u8, velocity: u8| {
        InputEvent::Note(clap_event_note {
            header: header(std::mem::size_of::<clap_event_note>(), time, type_),
            note_id: -1,
            port_index: 0,
            channel,
            key: key as i16,
            velocity: f64::from(velocity) / 127.0,
        })
    };

    match event.msg {
        ChannelVoiceMsg::NoteOn { note: key, velocity } if velocity > 0 => {
            Some(note(CLAP_EVENT_NOTE_ON, key, velocity))
        }
        ChannelVoiceMsg::NoteOn { note: key, velocity }
        | ChannelVoiceMsg::NoteOff { note: key, velocity } => {
            Some(note(CLAP_EVENT_NOTE_OFF, key, velocity))
        }
        _ => event.to_raw().map(|data| {
            InputEvent::Midi(clap_event_midi {
                header: header(std::mem::size_of::<clap_event_midi>(), time, CLAP_EVENT_MIDI),
                port_index: 0,
                data,
            })
        }),
    }
}

/// Appends every event in `midi` that has a CLAP form.
fn push_midi_events(events: &mut Vec<InputEvent>, midi: &MidiEventVec, max_time: u32) {
    events.extend(midi.iter().filter_map(|e| to_input_event(e, max_time)));
}

unsafe extern "C" fn input_events_size(list: *const clap_input_events) -> u32 {
    let events = &*((*list).ctx as *const Vec<InputEvent>);
    events.len() as u32
}

unsafe extern "C" fn input_events_get(
    list: *const clap_input_events,
    index: u32,
) -> *const clap_event_header {
    let events = &*((*list).ctx as *const Vec<InputEvent>);
    events
        .get(index as usize)
        .map_or(ptr::null(), InputEvent::header)
}

unsafe extern "C" fn output_events_try_push(
    _list: *const clap_output_events,
    _event: *const clap_event_header,
) -> bool {
    // Plugin output events are not forwarded anywhere.
    true
}

pub struct ClapInstance {
    plugin: *const clap_plugin,
    descriptor: PluginDescriptor,
    params: Vec<ParamInfo>,
    /// Normalized values set since the last block.
    pending: Vec<Option<f32>>,
    events: Vec<InputEvent>,
    inputs: [Vec<f32>; CHANNELS],
    max_frames: usize,
    active: bool,
    processing: bool,
    _host: Box<clap_host>,
    _library: Arc<ClapLibrary>,
}

// SAFETY: the plugin is driven from one thread at a time (`&mut self`); the
// raw pointers are owned by this instance and never shared.
unsafe impl Send for ClapInstance {}

impl ClapInstance {
    pub fn load(descriptor: &PluginDescriptor, block_size: usize) -> Result<Self> {
        let path = descriptor.path.as_path();
        let library = ClapLibrary::shared(path)?;
        let factory = library.factory(path)?;
        let host = Box::new(host_callbacks());

        let create = factory.create_plugin.ok_or_else(|| {
            PluginError::load_failed(path, LoadStage::Instantiation, "No create_plugin function")
        })?;
        let id = CString::new(descriptor.id.as_str()).map_err(|e| {
            PluginError::load_failed(
                path,
                LoadStage::Instantiation,
                format!("Invalid plugin ID (contains null byte): {}", e),
            )
        })?;

        let plugin = unsafe { create(factory, &*host, id.as_ptr()) };
        if plugin.is_null() {
            return Err(PluginError::load_failed(
                path,
                LoadStage::Instantiation,
                format!("create_plugin returned null for {}", descriptor.id),
            ));
        }

        let mut instance = Self {
            plugin,
            descriptor: descriptor.clone(),
            params: Vec::new(),
            pending: Vec::new(),
            events: Vec::new(),
            inputs: [vec![0.0; block_size], vec![0.0; block_size]],
            max_frames: block_size,
            active: false,
            processing: false,
            _host: host,
            _library: library,
        };

        let init = unsafe { (*plugin).init }.ok_or_else(|| {
            PluginError::load_failed(path, LoadStage::Initialization, "No plugin init function")
        })?;
        if !unsafe { init(plugin) } {
            return Err(PluginError::load_failed(
                path,
                LoadStage::Initialization,
                "Plugin init failed",
            ));
        }

        instance.params = instance.query_params();
        instance.pending = vec![None; instance.params.len()];
        instance.events = Vec::with_capacity(MIDI_STACK_CAPACITY + instance.params.len());

        tracing::debug!(
            "Created CLAP {} with {} params",
            descriptor.id,
            instance.params.len()
        );
        Ok(instance)
    }

    fn extension<T>(&self, id: &CStr) -> Option<&T> {
        let get_extension = unsafe { (*self.plugin).get_extension }?;
        let ext = unsafe { get_extension(self.plugin, id.as_ptr()) };
        if ext.is_null() {
            None
        } else {
            Some(unsafe { &*(ext as *const T) })
        }
    }

    fn query_params(&self) -> Vec<ParamInfo> {
        let Some(params) = self.extension::<clap_plugin_params>(CLAP_EXT_PARAMS) else {
            return Vec::new();
        };
        let (Some(count_fn), Some(info_fn)) = (params.count, params.get_info) else {
            return Vec::new();
        };

        let count = unsafe { count_fn(self.plugin) };
        let mut infos = Vec::with_capacity(count as usize);
        for index in 0..count {
            // SAFETY: clap_param_info is plain data; all-zero is a valid value.
            let mut info: clap_param_info = unsafe { std::mem::zeroed() };
            if unsafe { info_fn(self.plugin, index, &mut info) } {
                infos.push(ParamInfo {
                    id: info.id,
                    cookie: info.cookie,
                    name: unsafe { c_str(info.name.as_ptr()) },
                    min: info.min_value,
                    max: info.max_value,
                });
            }
        }
        infos
    }

    /// Moves pending parameter values into the event list.
    fn push_param_events(&mut self) {
        for (info, pending) in self.params.iter().zip(self.pending.iter_mut()) {
            if let Some(value) = pending.take() {
                self.events.push(InputEvent::Param(clap_event_param_value {
                    header: header(
                        std::mem::size_of::<clap_event_param_value>(),
                        0,
                        CLAP_EVENT_PARAM_VALUE,
                    ),
                    param_id: info.id,
                    cookie: info.cookie,
                    note_id: -1,
                    port_index: -1,
                    channel: -1,
                    key: -1,
                    value: info.denormalize(value),
                }));
            }
        }
    }

    fn input_events(&self) -> clap_input_events {
        clap_input_events {
            ctx: &self.events as *const Vec<InputEvent> as *mut c_void,
            size: Some(input_events_size),
            get: Some(input_events_get),
        }
    }

    /// Delivers pending parameter values outside of `process`.
    fn flush_params(&mut self) {
        self.events.clear();
        self.push_param_events();
        if self.events.is_empty() {
            return;
        }

        if let Some(flush) = self
            .extension::<clap_plugin_params>(CLAP_EXT_PARAMS)
            .and_then(|p| p.flush)
        {
            let in_events = self.input_events();
            let out_events = clap_output_events {
                ctx: ptr::null_mut(),
                try_push: Some(output_events_try_push),
            };
            unsafe { flush(self.plugin, &in_events, &out_events) };
        }
        self.events.clear();
    }

    fn start_processing(&mut self) -> bool {
        if self.processing {
            return true;
        }
        if !self.active {
            return false;
        }
        if let Some(start) = unsafe { (*self.plugin).start_processing } {
            self.processing = unsafe { start(self.plugin) };
        }
        self.processing
    }
}

impl PluginInstance for ClapInstance {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn set_max_events(&mut self, max_events: usize) {
        let needed = max_events + self.params.len();
        self.events.reserve(needed.saturating_sub(self.events.len()));
    }

    fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> Result<()> {
        self.release();

        self.max_frames = max_block_size;
        for input in &mut self.inputs {
            input.resize(max_block_size, 0.0);
        }

        let activate = unsafe { (*self.plugin).activate }.ok_or_else(|| {
            PluginError::load_failed(
                &self.descriptor.path,
                LoadStage::Activation,
                "No activate function",
            )
        })?;
        if !unsafe { activate(self.plugin, sample_rate, 1, max_block_size as u32) } {
            return Err(PluginError::load_failed(
                &self.descriptor.path,
                LoadStage::Activation,
                "Activate failed",
            ));
        }
        self.active = true;
        Ok(())
    }

    fn release(&mut self) {
        if self.processing {
            if let Some(stop) = unsafe { (*self.plugin).stop_processing } {
                unsafe { stop(self.plugin) };
            }
            self.processing = false;
        }
        if self.active {
            if let Some(deactivate) = unsafe { (*self.plugin).deactivate } {
                unsafe { deactivate(self.plugin) };
            }
            self.active = false;
        }
    }

    fn set_non_realtime(&mut self, non_realtime: bool) {
        if let Some(set) = self
            .extension::<clap_plugin_render>(CLAP_EXT_RENDER)
            .and_then(|r| r.set)
        {
            let mode = if non_realtime {
                CLAP_RENDER_OFFLINE
            } else {
                CLAP_RENDER_REALTIME
            };
            unsafe { set(self.plugin, mode) };
        }
    }

    fn process(&mut self, block: &mut AudioBlock<'_>, midi: &mut MidiEventVec) {
        let frames = block.num_frames().min(self.max_frames);
        if frames == 0 {
            return;
        }
        if !self.start_processing() {
            block.fill(0.0);
            midi.clear();
            return;
        }

        self.events.clear();
        self.push_param_events();
        push_midi_events(&mut self.events, midi, frames as u32 - 1);
        midi.clear();

        for (c, input) in self.inputs.iter_mut().enumerate() {
            input[..frames].copy_from_slice(&block.channel(c)[..frames]);
        }
        let mut input_ptrs = [self.inputs[0].as_mut_ptr(), self.inputs[1].as_mut_ptr()];
        let mut output_ptrs = block.as_mut_ptrs();

        let audio_inputs = clap_audio_buffer {
            data32: input_ptrs.as_mut_ptr(),
            data64: ptr::null_mut(),
            channel_count: CHANNELS as u32,
            latency: 0,
            constant_mask: 0,
        };
        let mut audio_outputs = clap_audio_buffer {
            data32: output_ptrs.as_mut_ptr(),
            data64: ptr::null_mut(),
            channel_count: CHANNELS as u32,
            latency: 0,
            constant_mask: 0,
        };
        let in_events = self.input_events();
        let out_events = clap_output_events {
            ctx: ptr::null_mut(),
            try_push: Some(output_events_try_push),
        };

        let process_data = clap_process {
            steady_time: -1,
            frames_count: frames as u32,
            transport: ptr::null(),
            audio_inputs: &audio_inputs,
            audio_outputs: &mut audio_outputs,
            audio_inputs_count: 1,
            audio_outputs_count: 1,
            in_events: &in_events,
            out_events: &out_events,
        };

        if let Some(process) = unsafe { (*self.plugin).process } {
            unsafe { process(self.plugin, &process_data) };
        }
        self.events.clear();
    }

    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn parameter_name(&self, index: usize) -> Result<String> {
        check_parameter_index(index, self.params.len())?;
        Ok(self.params[index].name.clone())
    }

    fn get_parameter(&self, index: usize) -> Result<f32> {
        check_parameter_index(index, self.params.len())?;
        if let Some(value) = self.pending[index] {
            return Ok(value);
        }

        let info = &self.params[index];
        let get_value = self
            .extension::<clap_plugin_params>(CLAP_EXT_PARAMS)
            .and_then(|p| p.get_value)
            .ok_or(PluginError::Unsupported("parameter values"))?;

        let mut plain = 0.0;
        if unsafe { get_value(self.plugin, info.id, &mut plain) } {
            Ok(info.normalize(plain))
        } else {
            Err(PluginError::Unsupported("parameter values"))
        }
    }

    fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        check_parameter_index(index, self.params.len())?;
        self.pending[index] = Some(value.clamp(0.0, 1.0));
        if !self.processing {
            self.flush_params();
        }
        Ok(())
    }
}

impl Drop for ClapInstance {
    fn drop(&mut self) {
        self.release();
        if let Some(destroy) = unsafe { (*self.plugin).destroy } {
            unsafe { destroy(self.plugin) };
        }
    }
}
