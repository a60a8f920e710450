//! Plugin instance trait.
//!
//! This module defines a unified interface for every hosted format. The host
//! only ever talks to `Box<dyn PluginInstance>`; format-specific construction
//! lives behind [`PluginFormat`](crate::PluginFormat).

use crate::buffer::AudioBlock;
use crate::descriptor::PluginDescriptor;
use crate::error::{PluginError, Result};
use solo_midi::MidiEventVec;

/// Which part of the plugin state a chunk replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Every program of the plugin.
    Bank,
    /// Only the current program.
    Program,
}

/// Snapshot of one parameter. The index is the only stable identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterHandle {
    pub index: usize,
    pub name: String,
    pub value: f32,
}

/// Unified interface for hosted plugin instances.
///
/// Lifecycle: constructed by a format, `prepare`d before the first
/// `process`, `release`d before being dropped. Parameter values are
/// normalized to 0..1.
pub trait PluginInstance: Send {
    fn descriptor(&self) -> &PluginDescriptor;

    /// Largest number of MIDI events one `process` call can be handed.
    ///
    /// Called before `prepare`. Backends that copy events into their own
    /// scratch size it here so a full queue never has to be truncated.
    fn set_max_events(&mut self, _max_events: usize) {}

    /// Allocate processing resources for the given rate and maximum block size.
    fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> Result<()>;

    /// Free processing resources. Safe to call more than once.
    fn release(&mut self);

    /// Tell the plugin whether it is rendering offline.
    fn set_non_realtime(&mut self, _non_realtime: bool) {}

    /// Process one block in place.
    ///
    /// `midi` holds every event due in this block; the plugin may consume
    /// and clear it. `block.num_frames()` never exceeds the prepared maximum.
    fn process(&mut self, block: &mut AudioBlock<'_>, midi: &mut MidiEventVec);

    fn parameter_count(&self) -> usize;

    fn parameter_name(&self, index: usize) -> Result<String>;

    /// Normalized 0..1.
    fn get_parameter(&self, index: usize) -> Result<f32>;

    /// Normalized 0..1.
    fn set_parameter(&mut self, index: usize, value: f32) -> Result<()>;

    fn program_count(&self) -> usize {
        0
    }

    fn current_program(&self) -> usize {
        0
    }

    fn set_current_program(&mut self, index: usize) -> Result<()> {
        Err(PluginError::InvalidProgram {
            index,
            count: self.program_count(),
        })
    }

    fn set_program_name(&mut self, _name: &str) -> Result<()> {
        Err(PluginError::Unsupported("program names"))
    }

    /// Replace plugin state with an opaque chunk in the legacy bank convention.
    fn load_chunk(&mut self, _data: &[u8], _kind: ChunkKind) -> Result<()> {
        Err(PluginError::Unsupported("state chunks"))
    }
}

/// Bounds check shared by format backends.
#[inline]
pub fn check_parameter_index(index: usize, count: usize) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(PluginError::InvalidParameter { index, count })
    }
}
