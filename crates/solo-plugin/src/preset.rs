//! Legacy VST bank (`.fxb`) and program (`.fxp`) files.
//!
//! Every file starts with a big-endian `CcnK` header followed by a four
//! character kind:
//!
//! | kind   | contents                                   |
//! |--------|--------------------------------------------|
//! | `FxBk` | bank of parameter programs                 |
//! | `FBCh` | bank stored as one opaque plugin chunk     |
//! | `FxCk` | single parameter program                   |
//! | `FPCh` | single program stored as an opaque chunk   |
//!
//! Applying a preset is best-effort: a failure part way through leaves
//! whatever was already applied.

use crate::error::{PluginError, Result};
use crate::instance::{ChunkKind, PluginInstance};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

const CHUNK_MAGIC: &[u8; 4] = b"CcnK";
const BANK_MAGIC: &[u8; 4] = b"FxBk";
const BANK_CHUNK_MAGIC: &[u8; 4] = b"FBCh";
const PROGRAM_MAGIC: &[u8; 4] = b"FxCk";
const PROGRAM_CHUNK_MAGIC: &[u8; 4] = b"FPCh";

/// Program names are stored in a fixed 28-byte field.
const NAME_LEN: usize = 28;
/// Reserved bytes after the bank header fields.
const BANK_RESERVED: usize = 128;
/// Newest container version this reader understands.
const FORMAT_VERSION: i32 = 1;

/// One program of parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct FxProgram {
    pub name: String,
    /// Normalized values, parameter 0 first.
    pub params: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresetContent {
    ParameterBank(Vec<FxProgram>),
    ChunkBank(Vec<u8>),
    Program(FxProgram),
    ChunkProgram { name: String, chunk: Vec<u8> },
}

/// A decoded `.fxb` / `.fxp` file.
#[derive(Debug, Clone, PartialEq)]
pub struct FxPreset {
    /// Unique id of the plugin that wrote the file.
    pub fx_id: i32,
    pub fx_version: i32,
    pub content: PresetContent,
}

fn truncated(_: std::io::Error) -> PluginError {
    PluginError::Preset("unexpected end of data".into())
}

fn read_magic(cursor: &mut Cursor<&[u8]>) -> Result<[u8; 4]> {
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).map_err(truncated)?;
    Ok(magic)
}

fn read_name(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let mut raw = [0u8; NAME_LEN];
    cursor.read_exact(&mut raw).map_err(truncated)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

fn read_count(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<usize> {
    let value = cursor.read_i32::<BigEndian>().map_err(truncated)?;
    usize::try_from(value).map_err(|_| PluginError::Preset(format!("negative {}: {}", what, value)))
}

fn read_chunk(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let size = read_count(cursor, "chunk size")?;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if size > remaining {
        return Err(PluginError::Preset(format!(
            "chunk claims {} bytes but only {} remain",
            size, remaining
        )));
    }
    let mut chunk = vec![0u8; size];
    cursor.read_exact(&mut chunk).map_err(truncated)?;
    Ok(chunk)
}

/// Reads `numParams`, the name and the values of an `FxCk` program whose
/// common header has already been consumed.
fn read_program_body(cursor: &mut Cursor<&[u8]>) -> Result<FxProgram> {
    let num_params = read_count(cursor, "parameter count")?;
    let name = read_name(cursor)?;

    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if num_params.saturating_mul(4) > remaining {
        return Err(PluginError::Preset(format!(
            "program claims {} parameters but only {} bytes remain",
            num_params, remaining
        )));
    }

    let mut params = Vec::with_capacity(num_params);
    for _ in 0..num_params {
        params.push(cursor.read_f32::<BigEndian>().map_err(truncated)?);
    }
    Ok(FxProgram { name, params })
}

/// Common header: `CcnK`, byte size, kind, format version, fx id, fx version.
fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<([u8; 4], i32, i32)> {
    if &read_magic(cursor)? != CHUNK_MAGIC {
        return Err(PluginError::Preset("missing CcnK magic".into()));
    }
    let _byte_size = cursor.read_i32::<BigEndian>().map_err(truncated)?;
    let kind = read_magic(cursor)?;
    let format_version = cursor.read_i32::<BigEndian>().map_err(truncated)?;
    if format_version > FORMAT_VERSION {
        return Err(PluginError::Preset(format!(
            "unsupported format version {}",
            format_version
        )));
    }
    let fx_id = cursor.read_i32::<BigEndian>().map_err(truncated)?;
    let fx_version = cursor.read_i32::<BigEndian>().map_err(truncated)?;
    Ok((kind, fx_id, fx_version))
}

impl FxPreset {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let (kind, fx_id, fx_version) = read_header(&mut cursor)?;

        let content = match &kind {
            BANK_MAGIC => {
                let num_programs = read_count(&mut cursor, "program count")?;
                cursor.set_position(cursor.position() + BANK_RESERVED as u64);

                let mut programs = Vec::with_capacity(num_programs.min(1024));
                for _ in 0..num_programs {
                    let (program_kind, _, _) = read_header(&mut cursor)?;
                    if &program_kind != PROGRAM_MAGIC {
                        return Err(PluginError::Preset(format!(
                            "bank entry is {} rather than FxCk",
                            String::from_utf8_lossy(&program_kind)
                        )));
                    }
                    programs.push(read_program_body(&mut cursor)?);
                }
                PresetContent::ParameterBank(programs)
            }
            BANK_CHUNK_MAGIC => {
                let _num_programs = read_count(&mut cursor, "program count")?;
                let mut reserved = [0u8; BANK_RESERVED];
                cursor.read_exact(&mut reserved).map_err(truncated)?;
                PresetContent::ChunkBank(read_chunk(&mut cursor)?)
            }
            PROGRAM_MAGIC => PresetContent::Program(read_program_body(&mut cursor)?),
            PROGRAM_CHUNK_MAGIC => {
                let _num_programs = read_count(&mut cursor, "program count")?;
                let name = read_name(&mut cursor)?;
                let chunk = read_chunk(&mut cursor)?;
                PresetContent::ChunkProgram { name, chunk }
            }
            other => {
                return Err(PluginError::Preset(format!(
                    "unknown preset kind {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };

        Ok(Self {
            fx_id,
            fx_version,
            content,
        })
    }

    /// Applies the preset the way VST hosts traditionally do.
    ///
    /// For a parameter bank every other program is selected and restored
    /// first, then the originally selected program is restored last so the
    /// plugin ends up where it started.
    pub fn apply_to(&self, plugin: &mut dyn PluginInstance) -> Result<()> {
        match &self.content {
            PresetContent::ParameterBank(programs) => {
                let current = plugin.current_program();
                let selected = programs.get(current).ok_or_else(|| {
                    PluginError::Preset(format!(
                        "bank has {} programs, current program is {}",
                        programs.len(),
                        current
                    ))
                })?;

                let selectable = plugin.program_count();
                for (index, program) in programs.iter().enumerate() {
                    if index == current || index >= selectable {
                        continue;
                    }
                    plugin.set_current_program(index)?;
                    restore_program(plugin, program)?;
                }

                if selectable > 0 {
                    plugin.set_current_program(current)?;
                }
                restore_program(plugin, selected)
            }
            PresetContent::ChunkBank(chunk) => plugin.load_chunk(chunk, ChunkKind::Bank),
            PresetContent::Program(program) => restore_program(plugin, program),
            PresetContent::ChunkProgram { name, chunk } => {
                plugin.load_chunk(chunk, ChunkKind::Program)?;
                rename_current(plugin, name);
                Ok(())
            }
        }
    }
}

fn rename_current(plugin: &mut dyn PluginInstance, name: &str) {
    if let Err(e) = plugin.set_program_name(name) {
        tracing::debug!("Program name not applied: {}", e);
    }
}

/// Extra values beyond the plugin's parameter count are ignored.
fn restore_program(plugin: &mut dyn PluginInstance, program: &FxProgram) -> Result<()> {
    rename_current(plugin, &program.name);
    let count = plugin.parameter_count();
    for (index, value) in program.params.iter().take(count).enumerate() {
        plugin.set_parameter(index, *value)?;
    }
    Ok(())
}
