//! Shared host integration tests
//!
//! An audio thread ticks through `try_lock` while a control thread loads
//! plugins and sends notes.

use crate::helpers::*;
use solo::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_load_while_audio_thread_runs() {
    let (host, probe) = test_host();
    let shared = SharedPluginHost::new(host);
    let running = Arc::new(AtomicBool::new(true));

    let audio = {
        let shared = shared.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let input = generate_stereo_staircase(128);
            let mut output = vec![0.0f32; 256];
            let mut ticks = 0usize;
            loop {
                shared.process(&input, &mut output, 128);
                // Either silence (unloaded or busy) or the identity signal.
                assert!(output == input || output.iter().all(|s| *s == 0.0));
                ticks += 1;
                if !running.load(Ordering::Acquire) {
                    break;
                }
            }
            ticks
        })
    };

    for _ in 0..20 {
        shared.load_plugin("/plugins/identity.mock").unwrap();
        shared.note_on(60, 1.0).unwrap();
        shared.note_off(60, 1.0).unwrap();
    }

    running.store(false, Ordering::Release);
    let ticks = audio.join().unwrap();
    assert!(ticks > 0);

    assert!(shared.lock().is_loaded());
    assert_eq!(probe.lock().released.len(), 19);
}

#[test]
fn test_control_calls_through_shared_handle() {
    let (host, _) = test_host();
    let shared = SharedPluginHost::new(host);

    assert!(shared.load_preset("/presets/any.fxb").is_err());
    let descriptor = shared.load_plugin("/plugins/gain.mock").unwrap();
    assert_eq!(descriptor.name, "gain");

    shared.set_parameter(0, 0.5).unwrap();
    assert_eq!(shared.parameter(0), 0.5);

    let mut output = vec![0.0f32; 8];
    assert!(shared.process(&[1.0; 8], &mut output, 4));
    assert!(output.iter().all(|s| (*s - 0.5).abs() < tolerances::FLOAT_EPSILON));

    assert!(shared.unload());
    assert!(!shared.lock().is_loaded());
}
