//! In-process plugin hosting for Solo
//!
//! This crate knows how to find, open and drive third-party plugins. It has
//! no notion of a "current" plugin; the `solo` crate builds the single-slot
//! host on top of it.
//!
//! ## Pieces
//!
//! - [`PluginFormat`] / [`FormatManager`]: scanning files for plugins and
//!   creating instances from the resulting [`PluginDescriptor`]s
//! - [`PluginInstance`]: the one interface every format backend implements
//! - [`PlanarBuffer`] / [`AudioBlock`]: the non-interleaved stereo buffer
//!   plugins process in place
//! - [`FxPreset`]: legacy `.fxb` / `.fxp` preset files
//!
//! ## Usage
//!
//! ```ignore
//! use solo_plugin::FormatManager;
//!
//! let formats = FormatManager::with_default_formats();
//! let found = formats.scan("/usr/lib/vst/synth.so".as_ref());
//! let mut plugin = formats.instantiate(&found[0], 48000.0, 512)?;
//! plugin.prepare(48000.0, 512)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `vst2` - VST2 backend (`vst` crate)
//! - `clap` - CLAP backend (`clap-sys` + `libloading`)

pub mod error;
pub use error::{LoadStage, PluginError, Result};

mod buffer;
pub use buffer::{AudioBlock, PlanarBuffer, CHANNELS};

mod descriptor;
pub use descriptor::{AudioIO, PluginCategory, PluginDescriptor};

mod instance;
pub use instance::{check_parameter_index, ChunkKind, ParameterHandle, PluginInstance};

mod format;
pub use format::{is_plugin_file, FormatManager, PluginFormat};

pub mod preset;
pub use preset::{FxPreset, FxProgram, PresetContent};

#[cfg(feature = "vst2")]
pub mod vst2;
#[cfg(feature = "vst2")]
pub use vst2::{Vst2Format, Vst2Instance};

#[cfg(feature = "clap")]
pub mod clap;
#[cfg(feature = "clap")]
pub use clap::{ClapFormat, ClapInstance};

pub use solo_midi::{MidiEvent, MidiEventVec};
