//! Preset loading integration tests
//!
//! Tests `.fxb` bank application through the host. Preset support is tied
//! to the `vst2` feature; without it every load reports an unsupported build.

use crate::helpers::*;
use solo::prelude::*;

fn write_preset(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_preset_requires_loaded_plugin() {
    let (mut host, _) = test_host();
    let dir = tempfile::tempdir().unwrap();
    let path = write_preset(&dir, "bank.fxb", &fxb_parameter_bank(1, &[("A", &[0.1])]));

    assert!(matches!(host.load_preset(&path), Err(Error::NotLoaded)));
    assert!(matches!(
        host.load_preset("/nonexistent/bank.fxb"),
        Err(Error::NotLoaded)
    ));
}

#[cfg(feature = "vst2")]
mod with_vst2 {
    use super::*;
    use solo::plugin::{ChunkKind, PluginError};

    #[test]
    fn test_parameter_bank_restores_every_program() {
        let (mut host, probe) = test_host();
        host.load_plugin("/plugins/gain.mock").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let bank = fxb_parameter_bank(
            0x4761_696E,
            &[
                ("Warm", &[0.6, 0.1]),
                ("Soft", &[0.2, 0.2]),
                ("Off", &[0.0, 0.3]),
            ],
        );
        let path = write_preset(&dir, "gain.fxb", &bank);

        host.load_preset(&path).unwrap();

        assert_eq!(probe.lock().program_switches, [1, 2, 0]);
        assert_eq!(host.parameter(0), 0.6);
        assert_eq!(host.parameter(1), 0.1);

        // The current program drives the audio.
        let mut output = vec![0.0f32; 8];
        host.process(&[1.0; 8], &mut output, 4);
        assert!(output.iter().all(|s| (*s - 0.6).abs() < tolerances::FLOAT_EPSILON));
    }

    #[test]
    fn test_chunk_bank_goes_to_plugin() {
        let (mut host, probe) = test_host();
        host.load_plugin("/plugins/chunky.mock").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_preset(&dir, "state.fxb", &fxb_chunk_bank(7, 1, b"opaque-state"));
        host.load_preset(&path).unwrap();

        let log = probe.lock();
        assert_eq!(log.chunks.len(), 1);
        assert_eq!(log.chunks[0].0, b"opaque-state");
        assert_eq!(log.chunks[0].1, ChunkKind::Bank);
    }

    #[test]
    fn test_chunk_bank_rejected_by_plain_plugin() {
        let (mut host, _) = test_host();
        host.load_plugin("/plugins/identity.mock").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_preset(&dir, "state.fxb", &fxb_chunk_bank(7, 1, b"xyz"));

        assert!(matches!(
            host.load_preset(&path),
            Err(Error::Plugin(PluginError::Unsupported(_)))
        ));
        assert!(host.is_loaded());
    }

    #[test]
    fn test_malformed_and_missing_files() {
        let (mut host, _) = test_host();
        host.load_plugin("/plugins/gain.mock").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let garbage = write_preset(&dir, "garbage.fxb", b"definitely not a bank");
        assert!(matches!(
            host.load_preset(&garbage),
            Err(Error::Plugin(PluginError::Preset(_)))
        ));

        let mut truncated = fxb_parameter_bank(1, &[("A", &[0.5, 0.5])]);
        truncated.truncate(truncated.len() - 3);
        let truncated = write_preset(&dir, "truncated.fxb", &truncated);
        assert!(host.load_preset(&truncated).is_err());

        let mut newer = fxb_parameter_bank(1, &[("A", &[0.5, 0.5])]);
        newer[12..16].copy_from_slice(&2i32.to_be_bytes());
        let newer = write_preset(&dir, "newer.fxb", &newer);
        assert!(matches!(
            host.load_preset(&newer),
            Err(Error::Plugin(PluginError::Preset(_)))
        ));

        assert!(matches!(
            host.load_preset(dir.path().join("absent.fxb")),
            Err(Error::Io(_))
        ));

        // The plugin is untouched by rejected files.
        assert_eq!(host.parameter(0), 1.0);
    }

    #[test]
    fn test_panicking_plugin_preset_is_a_fault() {
        let (mut host, _) = test_host();
        host.load_plugin("/plugins/panicker.mock").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_preset(&dir, "bank.fxb", &fxb_parameter_bank(1, &[("A", &[0.5])]));

        assert!(matches!(host.load_preset(&path), Err(Error::Fault(_))));
    }
}

#[cfg(not(feature = "vst2"))]
#[test]
fn test_preset_unsupported_without_vst2() {
    let (mut host, _) = test_host();
    host.load_plugin("/plugins/gain.mock").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_preset(&dir, "bank.fxb", &fxb_parameter_bank(1, &[("A", &[0.1])]));

    assert!(matches!(host.load_preset(&path), Err(Error::UnsupportedBuild)));
}
