//! RT-safe MIDI event type.

use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};

/// Channel used for notes queued through the host's note API (MIDI channel 1).
pub const NOTE_CHANNEL: Channel = Channel::Ch1;

/// Masks an arbitrary note number into the 7-bit MIDI range.
///
/// Out-of-range values are not rejected; like any MIDI byte they wrap.
#[inline]
pub fn note_number(note: i32) -> u8 {
    (note & 0x7F) as u8
}

/// Converts a unit velocity (0.0..=1.0) to a MIDI velocity byte.
///
/// Values outside the unit range clamp; NaN maps to 0.
#[inline]
pub fn velocity_to_u8(velocity: f32) -> u8 {
    let scaled = (velocity * 127.0).round();
    if scaled.is_nan() {
        0
    } else {
        scaled.clamp(0.0, 127.0) as u8
    }
}

/// MIDI channel voice event with an offset into the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    /// Offset within the current buffer (0 = first sample).
    pub frame_offset: usize,
    pub channel: Channel,
    pub msg: ChannelVoiceMsg,
}

impl MidiEvent {
    #[inline]
    pub fn new(frame_offset: usize, channel: Channel, msg: ChannelVoiceMsg) -> Self {
        Self {
            frame_offset,
            channel,
            msg,
        }
    }

    #[inline]
    pub fn note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::NoteOn { note, velocity },
        }
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::NoteOff { note, velocity },
        }
    }

    /// Note-on on [`NOTE_CHANNEL`] at the start of the next block.
    #[inline]
    pub fn host_note_on(note: i32, velocity: f32) -> Self {
        Self::new(
            0,
            NOTE_CHANNEL,
            ChannelVoiceMsg::NoteOn {
                note: note_number(note),
                velocity: velocity_to_u8(velocity),
            },
        )
    }

    /// Note-off on [`NOTE_CHANNEL`] at the start of the next block.
    #[inline]
    pub fn host_note_off(note: i32, velocity: f32) -> Self {
        Self::new(
            0,
            NOTE_CHANNEL,
            ChannelVoiceMsg::NoteOff {
                note: note_number(note),
                velocity: velocity_to_u8(velocity),
            },
        )
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control: cc, value },
            },
        }
    }

    #[inline]
    pub fn channel_num(&self) -> u8 {
        self.channel as u8
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self.msg, ChannelVoiceMsg::NoteOn { velocity, .. } if velocity > 0)
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::NoteOff { .. } | ChannelVoiceMsg::NoteOn { velocity: 0, .. }
        )
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { note, .. }
            | ChannelVoiceMsg::NoteOff { note, .. }
            | ChannelVoiceMsg::PolyPressure { note, .. } => Some(note),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { velocity, .. }
            | ChannelVoiceMsg::NoteOff { velocity, .. } => Some(velocity),
            _ => None,
        }
    }

    /// Encodes the event as status + two data bytes without allocating.
    ///
    /// Two-byte messages (program change, channel pressure) leave the last
    /// byte zero. Returns `None` for messages with no 3-byte encoding.
    pub fn to_raw(&self) -> Option<[u8; 3]> {
        let ch = self.channel_num() & 0x0F;
        let bytes = match self.msg {
            ChannelVoiceMsg::NoteOff { note, velocity } => [0x80 | ch, note, velocity],
            ChannelVoiceMsg::NoteOn { note, velocity } => [0x90 | ch, note, velocity],
            ChannelVoiceMsg::PolyPressure { note, pressure } => [0xA0 | ch, note, pressure],
            ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control, value },
            } => [0xB0 | ch, control, value],
            ChannelVoiceMsg::ProgramChange { program } => [0xC0 | ch, program, 0],
            ChannelVoiceMsg::ChannelPressure { pressure } => [0xD0 | ch, pressure, 0],
            ChannelVoiceMsg::PitchBend { bend } => {
                [0xE0 | ch, (bend & 0x7F) as u8, ((bend >> 7) & 0x7F) as u8]
            }
            _ => return None,
        };
        Some(bytes)
    }
}
