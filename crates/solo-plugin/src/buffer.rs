//! Planar stereo buffer shared between the host's audio bridge and the plugin.
//!
//! Plugins process in place: they read the input samples from the block and
//! overwrite them with their output.

/// The host bridges exactly two channels in and two out.
pub const CHANNELS: usize = 2;

/// Reusable planar float buffer.
///
/// `set_size` changes the visible frame count every callback; the backing
/// storage only grows, and only when a callback asks for more frames than
/// any previous one.
pub struct PlanarBuffer {
    channels: [Vec<f32>; CHANNELS],
}

impl PlanarBuffer {
    pub fn new(frames: usize) -> Self {
        Self {
            channels: [vec![0.0; frames], vec![0.0; frames]],
        }
    }

    /// Resize to `frames` visible frames. Contents past the old length are
    /// zeroed; allocates only when `frames` exceeds the current capacity.
    pub fn set_size(&mut self, frames: usize) {
        for channel in &mut self.channels {
            if frames > channel.capacity() {
                channel.reserve_exact(frames - channel.len());
            }
            channel.resize(frames, 0.0);
        }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Largest frame count reachable without reallocating.
    pub fn capacity(&self) -> usize {
        self.channels[0].capacity().min(self.channels[1].capacity())
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel]
    }

    /// Copies `frames` interleaved stereo frames into the planar channels:
    /// `input[i * 2 + c]` lands at channel `c`, position `i`.
    pub fn deinterleave_from(&mut self, input: &[f32], frames: usize) {
        for (c, channel) in self.channels.iter_mut().enumerate() {
            for (i, sample) in channel[..frames].iter_mut().enumerate() {
                *sample = input[i * 2 + c];
            }
        }
    }

    /// Writes `frames` frames back out interleaved: channel `c`, position `i`
    /// goes to `output[c + 2 * i]`.
    pub fn interleave_into(&self, output: &mut [f32], frames: usize) {
        for (c, channel) in self.channels.iter().enumerate() {
            for (i, sample) in channel[..frames].iter().enumerate() {
                output[c + 2 * i] = *sample;
            }
        }
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Borrowed view of every visible frame.
    pub fn block(&mut self) -> AudioBlock<'_> {
        let frames = self.num_frames();
        self.block_range(0, frames)
    }

    /// Borrowed view of `len` frames starting at `start`.
    ///
    /// # Panics
    /// If the range extends past [`num_frames`](Self::num_frames).
    pub fn block_range(&mut self, start: usize, len: usize) -> AudioBlock<'_> {
        let [left, right] = &mut self.channels;
        AudioBlock {
            channels: [
                &mut left[start..start + len],
                &mut right[start..start + len],
            ],
        }
    }
}

/// Two equally long mutable channel slices handed to a plugin for one call.
pub struct AudioBlock<'a> {
    channels: [&'a mut [f32]; CHANNELS],
}

impl<'a> AudioBlock<'a> {
    pub fn from_channels(left: &'a mut [f32], right: &'a mut [f32]) -> Self {
        debug_assert_eq!(left.len(), right.len());
        Self {
            channels: [left, right],
        }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.channels[0].len()
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        &*self.channels[channel]
    }

    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut *self.channels[channel]
    }

    pub fn channels_mut(&mut self) -> &mut [&'a mut [f32]; CHANNELS] {
        &mut self.channels
    }

    /// Raw channel pointers for FFI process calls.
    pub fn as_mut_ptrs(&mut self) -> [*mut f32; CHANNELS] {
        [self.channels[0].as_mut_ptr(), self.channels[1].as_mut_ptr()]
    }

    pub fn fill(&mut self, value: f32) {
        for channel in self.channels.iter_mut() {
            channel.fill(value);
        }
    }
}
