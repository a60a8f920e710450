//! # Solo - single-plugin real-time host
//!
//! Hosts exactly one third-party audio plugin (instrument or effect) inside
//! a real-time audio callback.
//!
//! ## Architecture
//!
//! - **solo-plugin** - format scanning (VST2, CLAP), plugin instances,
//!   planar buffers, `.fxb` / `.fxp` presets
//! - **solo-midi** - MIDI events and the lock-free pending-note queue
//! - **solo** (this crate) - the single-slot [`PluginHost`]: loading, the
//!   interleaved stereo audio tick, parameters and notes
//!
//! ## Quick Start
//!
//! ```ignore
//! use solo::PluginHost;
//!
//! let mut host = PluginHost::new(48000.0)?;
//! host.load_plugin("/usr/lib/vst/synth.so")?;
//! host.load_preset("/home/me/presets/pads.fxb")?;
//!
//! host.note_on(60, 0.8)?;
//!
//! // In the audio callback:
//! host.process(&input, &mut output, frames);
//! ```
//!
//! ## Threading
//!
//! The host creates no threads. Loading and presets block on file I/O and
//! must stay off the audio thread. A single owner gets this for free from
//! `&mut self`; for separate audio and control threads use
//! [`SharedPluginHost`].
//!
//! ## Feature Flags
//!
//! - `vst2` - VST2 plugins and preset loading
//! - `clap` - CLAP plugins

mod builder;
mod config;
mod error;
mod host;
mod shared;

pub use builder::PluginHostBuilder;
pub use config::HostConfig;
pub use error::{Error, Result};
pub use host::PluginHost;
pub use shared::SharedPluginHost;

/// Re-export of solo-plugin for custom formats
pub use solo_plugin as plugin;

/// Re-export of solo-midi
pub use solo_midi as midi;

pub use solo_midi::{MidiEvent, NoteSender};
pub use solo_plugin::{
    AudioBlock, FormatManager, ParameterHandle, PluginCategory, PluginDescriptor, PluginError,
    PluginFormat, PluginInstance,
};

/// Common imports for hosting a plugin.
pub mod prelude {
    pub use crate::{
        Error, HostConfig, ParameterHandle, PluginDescriptor, PluginHost, Result,
        SharedPluginHost,
    };
}
