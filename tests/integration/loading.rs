//! Plugin loading integration tests
//!
//! Tests scanning, instantiation, replacement of the live instance and
//! release on unload and drop.

use crate::helpers::*;
use solo::plugin::{LoadStage, PluginCategory, PluginError};
use solo::prelude::*;
use std::path::Path;

#[test]
fn test_load_identity_plugin() {
    let (mut host, probe) = test_host();

    let descriptor = host.load_plugin("/plugins/identity.mock").unwrap();
    assert_eq!(descriptor.name, "identity");
    assert_eq!(descriptor.format, MOCK_FORMAT);

    assert!(host.is_loaded());
    assert_eq!(host.plugin_path(), Some(Path::new("/plugins/identity.mock")));
    assert_eq!(host.descriptor().map(|d| d.id.as_str()), Some("identity"));

    let log = probe.lock();
    assert_eq!(
        log.prepared,
        [("identity".to_string(), TEST_SAMPLE_RATE, TEST_BLOCK_SIZE)]
    );
    assert_eq!(log.non_realtime, [false]);
}

#[test]
fn test_parameter_count_after_load() {
    let (mut host, _) = test_host();
    assert_eq!(host.num_parameters(), 0);

    host.load_plugin("/plugins/gain.mock").unwrap();
    assert_eq!(host.num_parameters(), 2);

    host.load_plugin("/plugins/identity.mock").unwrap();
    assert_eq!(host.num_parameters(), 0);
}

#[test]
fn test_first_descriptor_wins() {
    let (mut host, _) = test_host();
    let descriptor = host.load_plugin("/plugins/pair.mock").unwrap();
    assert_eq!(descriptor.id, "pair-a");
}

#[test]
fn test_unrecognised_paths_are_not_found() {
    let (mut host, _) = test_host();

    for path in ["/plugins/missing.mock", "/plugins/readme.txt", ""] {
        assert!(
            matches!(host.load_plugin(path), Err(Error::NotFound(_))),
            "{:?} should not load",
            path
        );
    }
    assert!(!host.is_loaded());
    assert!(host.plugin_path().is_none());
}

#[test]
fn test_failed_load_keeps_previous_instance() {
    let (mut host, probe) = test_host();
    host.load_plugin("/plugins/gain.mock").unwrap();
    host.set_parameter(0, 0.5).unwrap();

    assert!(host.load_plugin("/plugins/missing.mock").is_err());
    assert!(host.load_plugin("/plugins/broken.mock").is_err());
    assert!(host.load_plugin("/plugins/unpreparable.mock").is_err());

    assert_eq!(host.descriptor().map(|d| d.id.as_str()), Some("gain"));
    assert_eq!(host.plugin_path(), Some(Path::new("/plugins/gain.mock")));
    assert!(probe.lock().released.is_empty());

    let input = vec![0.8f32; 64];
    let mut output = vec![0.0f32; 64];
    host.process(&input, &mut output, 32);
    assert!(output.iter().all(|s| (*s - 0.4).abs() < tolerances::FLOAT_EPSILON));
}

#[test]
fn test_failed_load_with_nothing_loaded_stays_silent() {
    let (mut host, _) = test_host();
    assert!(host.load_plugin("/plugins/broken.mock").is_err());

    let mut output = vec![1.0f32; 128];
    host.process(&generate_noise(64, 3), &mut output, 64);
    assert_silence(&output);
}

#[test]
fn test_instantiation_error_keeps_reason() {
    let (mut host, _) = test_host();

    match host.load_plugin("/plugins/broken.mock") {
        Err(Error::Instantiation { name, source }) => {
            assert_eq!(name, "broken");
            assert!(matches!(
                &source,
                PluginError::LoadFailed {
                    stage: LoadStage::Instantiation,
                    ..
                }
            ));
            assert!(source.to_string().contains("mock constructor refused"));
        }
        other => panic!("expected an instantiation error, got {:?}", other.err()),
    }

    match host.load_plugin("/plugins/unpreparable.mock") {
        Err(e @ Error::Instantiation { .. }) => {
            assert!(e.to_string().contains("mock activation refused"));
        }
        other => panic!("expected an instantiation error, got {:?}", other.err()),
    }
}

#[test]
fn test_replacing_releases_previous_instance() {
    let (mut host, probe) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();
    host.load_plugin("/plugins/gain.mock").unwrap();

    let log = probe.lock();
    assert_eq!(log.released, ["identity"]);
    assert_eq!(log.prepared.len(), 2);
    assert_eq!(log.prepared[1].0, "gain");
}

#[test]
fn test_unload_and_drop_release_instance() {
    let (mut host, probe) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();

    assert!(host.unload());
    assert!(!host.unload());
    assert!(!host.is_loaded());
    assert!(host.plugin_path().is_none());

    host.load_plugin("/plugins/gain.mock").unwrap();
    drop(host);

    assert_eq!(probe.lock().released, ["identity", "gain"]);
}

#[test]
fn test_load_at_other_sample_rate() {
    let (mut host, probe) = test_host();
    host.load_plugin_at("/plugins/identity.mock", 96000.0).unwrap();

    assert_eq!(host.config().sample_rate, 96000.0);
    assert_eq!(probe.lock().prepared[0].1, 96000.0);

    // A failed load does not switch the rate.
    assert!(host.load_plugin_at("/plugins/broken.mock", 44100.0).is_err());
    assert_eq!(host.config().sample_rate, 96000.0);
}

#[test]
fn test_descriptor_serde_round_trip() {
    let (mut host, _) = test_host();
    let descriptor = host.load_plugin("/plugins/recorder.mock").unwrap().clone();
    assert_eq!(descriptor.category, PluginCategory::Instrument);
    assert!(descriptor.receives_midi);

    let json = serde_json::to_string(&descriptor).unwrap();
    let back: PluginDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, descriptor);
}

#[test]
fn test_host_without_formats_finds_nothing() {
    let mut host = PluginHost::builder().no_default_formats().build().unwrap();
    assert!(matches!(
        host.load_plugin("/plugins/identity.mock"),
        Err(Error::NotFound(_))
    ));
}
