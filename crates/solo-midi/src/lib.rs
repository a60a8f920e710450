//! MIDI types for the Solo plugin host.
//!
//! Two pieces live here:
//!
//! - [`MidiEvent`]: a `Copy` channel voice event with a frame offset and an
//!   allocation-free byte encoding, safe to move around on the audio thread.
//! - [`MidiQueue`] / [`NoteSender`]: the hand-off between the control context
//!   (which queues notes) and the audio callback (which drains them once per
//!   block into a [`MidiEventVec`]).

mod event;
pub use event::{note_number, velocity_to_u8, MidiEvent, NOTE_CHANNEL};

mod queue;
pub use queue::{MidiEventVec, MidiQueue, NoteSender, MIDI_STACK_CAPACITY};

pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};
