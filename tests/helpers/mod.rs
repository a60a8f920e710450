//! Test helpers and fixtures for Solo integration tests
//!
//! Plugins are provided by [`mock_format::MockFormat`], an in-memory format
//! that claims `*.mock` paths and picks the plugin behavior from the file
//! stem. Nothing touches a real plugin binary.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

pub use mock_format::{MockFormat, PluginLog, Probe, MOCK_FORMAT};

use solo::prelude::*;
use std::sync::Once;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard block size for deterministic testing
pub const TEST_BLOCK_SIZE: usize = 512;

static TRACING: Once = Once::new();

/// Route host logs to the test harness output (`RUST_LOG=debug` for more).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Host with only the mock format registered, plus the probe its plugins
/// report to.
pub fn test_host() -> (PluginHost, Probe) {
    test_host_with_block(TEST_BLOCK_SIZE)
}

pub fn test_host_with_block(block_size: usize) -> (PluginHost, Probe) {
    init_tracing();
    let format = MockFormat::new();
    let probe = format.probe();
    let host = PluginHost::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .block_size(block_size)
        .no_default_formats()
        .format(Box::new(format))
        .build()
        .expect("Failed to create test host");
    (host, probe)
}

/// Interleaved stereo signal whose left samples are `i` and right samples
/// are `-(i + 0.5)`, so a swapped or shifted frame is always visible.
pub fn generate_stereo_staircase(frames: usize) -> Vec<f32> {
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        samples.push(i as f32);
        samples.push(-(i as f32 + 0.5));
    }
    samples
}

/// Interleaved stereo signal of pseudo-random samples in -1..1.
pub fn generate_noise(frames: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..frames * 2)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that every sample is exactly zero.
pub fn assert_silence(samples: &[f32]) {
    if let Some(position) = samples.iter().position(|s| *s != 0.0) {
        panic!(
            "Expected silence, but sample {} was {}",
            position, samples[position]
        );
    }
}

// =============================================================================
// Preset files
// =============================================================================

fn write_name(out: &mut Vec<u8>, name: &str) {
    let mut field = [0u8; 28];
    let bytes = name.as_bytes();
    let len = bytes.len().min(27);
    field[..len].copy_from_slice(&bytes[..len]);
    out.extend_from_slice(&field);
}

fn write_header(out: &mut Vec<u8>, kind: &[u8; 4], byte_size: usize, fx_id: i32) {
    out.extend_from_slice(b"CcnK");
    out.extend_from_slice(&(byte_size as i32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(&1i32.to_be_bytes());
    out.extend_from_slice(&fx_id.to_be_bytes());
    out.extend_from_slice(&1i32.to_be_bytes());
}

/// `.fxb` bank of parameter programs.
pub fn fxb_parameter_bank(fx_id: i32, programs: &[(&str, &[f32])]) -> Vec<u8> {
    let mut out = Vec::new();
    write_header(&mut out, b"FxBk", 0, fx_id);
    out.extend_from_slice(&(programs.len() as i32).to_be_bytes());
    out.extend_from_slice(&[0u8; 128]);

    for (name, params) in programs {
        write_header(&mut out, b"FxCk", 48 + 4 * params.len(), fx_id);
        out.extend_from_slice(&(params.len() as i32).to_be_bytes());
        write_name(&mut out, name);
        for value in params.iter() {
            out.extend_from_slice(&value.to_be_bytes());
        }
    }

    let size = (out.len() - 8) as i32;
    out[4..8].copy_from_slice(&size.to_be_bytes());
    out
}

/// `.fxb` bank stored as one opaque chunk.
pub fn fxb_chunk_bank(fx_id: i32, num_programs: i32, chunk: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    write_header(&mut out, b"FBCh", 152 + chunk.len(), fx_id);
    out.extend_from_slice(&num_programs.to_be_bytes());
    out.extend_from_slice(&[0u8; 128]);
    out.extend_from_slice(&(chunk.len() as i32).to_be_bytes());
    out.extend_from_slice(chunk);
    out
}
