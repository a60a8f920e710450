//! Pending-MIDI hand-off between the control context and the audio callback.
//!
//! The control side pushes into a bounded lock-free [`ArrayQueue`]; the audio
//! side drains everything queued so far into a pre-reserved [`MidiEventVec`]
//! at the start of each block. Draining is the only consumer, so every event
//! reaches exactly one block.

use crate::MidiEvent;
use crossbeam::queue::ArrayQueue;
use smallvec::SmallVec;
use std::sync::Arc;

pub const MIDI_STACK_CAPACITY: usize = 256;

pub type MidiEventVec = SmallVec<[MidiEvent; MIDI_STACK_CAPACITY]>;

/// Bounded queue of events waiting for the next processed block.
pub struct MidiQueue {
    inner: Arc<ArrayQueue<MidiEvent>>,
}

impl MidiQueue {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(ArrayQueue::new(capacity)),
        }
    }

    /// Producer handle for another thread. Clone is cheap (Arc clone).
    pub fn sender(&self) -> NoteSender {
        NoteSender {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns the event back if the queue is full.
    #[inline]
    pub fn push(&self, event: MidiEvent) -> Result<(), MidiEvent> {
        self.inner.push(event)
    }

    /// A render buffer large enough that [`drain_into`](Self::drain_into)
    /// never has to grow it.
    pub fn render_buffer(&self) -> MidiEventVec {
        SmallVec::with_capacity(self.inner.capacity())
    }

    /// Moves every queued event into `out`, in push order.
    ///
    /// RT-safe as long as `out` came from [`render_buffer`](Self::render_buffer)
    /// and was cleared after the previous block.
    #[inline]
    pub fn drain_into(&self, out: &mut MidiEventVec) -> usize {
        let mut drained = 0;
        while let Some(event) = self.inner.pop() {
            out.push(event);
            drained += 1;
        }
        drained
    }

    /// Drops everything queued. Returns how many events were discarded.
    #[inline]
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.inner.pop().is_some() {
            dropped += 1;
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Cloneable producer side of a [`MidiQueue`].
#[derive(Clone)]
pub struct NoteSender {
    inner: Arc<ArrayQueue<MidiEvent>>,
}

impl NoteSender {
    #[inline]
    pub fn push(&self, event: MidiEvent) -> Result<(), MidiEvent> {
        self.inner.push(event)
    }

    /// Queues a channel-1 note-on for the start of the next block.
    #[inline]
    pub fn note_on(&self, note: i32, velocity: f32) -> Result<(), MidiEvent> {
        self.push(MidiEvent::host_note_on(note, velocity))
    }

    /// Queues a channel-1 note-off for the start of the next block.
    #[inline]
    pub fn note_off(&self, note: i32, velocity: f32) -> Result<(), MidiEvent> {
        self.push(MidiEvent::host_note_off(note, velocity))
    }

    pub fn pending(&self) -> usize {
        self.inner.len()
    }
}
