//! Audio bridge integration tests
//!
//! Tests the interleaved tick: silence with no plugin, exact round trips
//! through an identity plugin, buffer growth, sub-block splitting and
//! plugin faults.

use crate::helpers::*;
use approx::assert_relative_eq;
use proptest::prelude::*;

#[test]
fn test_identity_round_trip() {
    let (mut host, _) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();

    for frames in [0usize, 1, 512, 4096] {
        let input = generate_stereo_staircase(frames);
        let mut output = vec![f32::NAN; frames * 2];
        host.process(&input, &mut output, frames);
        assert_eq!(output, input, "round trip failed for {} frames", frames);
    }
}

#[test]
fn test_zero_frames_is_a_no_op() {
    let (mut host, probe) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();

    let mut output = vec![7.0f32; 16];
    host.process(&[1.0; 16], &mut output, 0);

    assert_eq!(output, [7.0; 16]);
    assert!(probe.lock().blocks.is_empty());
}

#[test]
fn test_resize_up_and_down_keeps_output_correct() {
    let (mut host, _) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();

    for (seed, frames) in [(1u64, 512usize), (2, 2048), (3, 512), (4, 2048)] {
        let input = generate_noise(frames, seed);
        let mut output = vec![0.0f32; frames * 2];
        host.process(&input, &mut output, frames);
        assert_eq!(output, input, "corrupted output at {} frames", frames);
    }
}

#[test]
fn test_long_callbacks_are_split_into_blocks() {
    let (mut host, probe) = test_host_with_block(256);
    host.load_plugin("/plugins/identity.mock").unwrap();

    let input = generate_stereo_staircase(700);
    let mut output = vec![0.0f32; 1400];
    host.process(&input, &mut output, 700);

    assert_eq!(probe.lock().blocks, [256, 256, 188]);
    assert_eq!(output, input);
}

#[test]
fn test_gain_plugin_scales_both_channels() {
    let (mut host, _) = test_host();
    host.load_plugin("/plugins/gain.mock").unwrap();
    host.set_parameter(0, 0.25).unwrap();

    let input = generate_noise(128, 9);
    let mut output = vec![0.0f32; 256];
    host.process(&input, &mut output, 128);

    for (out, inp) in output.iter().zip(&input) {
        assert_relative_eq!(*out, inp * 0.25, epsilon = tolerances::FLOAT_EPSILON);
    }
}

#[test]
fn test_short_slices_clamp_frames() {
    let (mut host, probe) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();

    let input = generate_stereo_staircase(10);
    let mut output = vec![-1.0f32; 8];
    host.process(&input, &mut output, 10);

    assert_eq!(output, input[..8]);
    assert_eq!(probe.lock().blocks, [4]);
}

#[test]
fn test_panicking_plugin_yields_silence() {
    let (mut host, _) = test_host();
    host.load_plugin("/plugins/panicker.mock").unwrap();

    let mut output = vec![1.0f32; 64];
    host.process(&generate_noise(32, 5), &mut output, 32);
    assert_silence(&output);
    assert_eq!(host.fault_count(), 1);

    // Still loaded, still contained.
    assert!(host.is_loaded());
    host.process(&generate_noise(32, 6), &mut output, 32);
    assert_eq!(host.fault_count(), 2);
    assert!(peak(&output) < tolerances::SILENCE_THRESHOLD);
}

#[test]
fn test_unload_returns_to_silence() {
    let (mut host, _) = test_host();
    host.load_plugin("/plugins/identity.mock").unwrap();
    host.unload();

    let mut output = vec![1.0f32; 64];
    host.process(&generate_noise(32, 11), &mut output, 32);
    assert_silence(&output);
}

proptest! {
    #[test]
    fn unloaded_host_is_always_silent(frames in 0usize..4096, seed in any::<u64>()) {
        let (mut host, _) = test_host();
        let input = generate_noise(frames, seed);
        let mut output = vec![1.0f32; frames * 2];
        host.process(&input, &mut output, frames);
        prop_assert!(output.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn identity_round_trip_any_length(frames in 0usize..3000, seed in any::<u64>()) {
        let (mut host, _) = test_host();
        host.load_plugin("/plugins/identity.mock").unwrap();

        let input = generate_noise(frames, seed);
        let mut output = vec![0.0f32; frames * 2];
        host.process(&input, &mut output, frames);
        prop_assert_eq!(output, input);
    }
}
