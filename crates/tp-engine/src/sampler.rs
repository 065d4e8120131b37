//! Output format requested by the external mixer, and the premix it gets back.

use alloc::vec::Vec;

use tp_ir::{AudioBuffer, MAX_CHANNELS};

use crate::period::{Frequency, BASE_CLOCK};

/// Output format of one render quantum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sampler {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Interleave width of the output (1 = mono, 2 = stereo, ...)
    pub output_channels: u16,
    /// Clock that periods are divided into
    pub base_clock: Frequency,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(44100, 2)
    }
}

impl Sampler {
    pub fn new(sample_rate: u32, output_channels: u16) -> Self {
        Self {
            sample_rate,
            output_channels: output_channels.clamp(1, MAX_CHANNELS),
            base_clock: BASE_CLOCK,
        }
    }

    /// Frames in one tick at `tempo` (2.5 / tempo seconds), never zero.
    pub fn samples_per_tick(&self, tempo: u16) -> usize {
        if tempo == 0 {
            return 1;
        }
        ((self.sample_rate as usize * 5) / (tempo as usize * 2)).max(1)
    }
}

/// One song channel's premixed output for a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelData {
    pub buffer: AudioBuffer,
    /// Voices that contributed (foreground plus background)
    pub voices: usize,
}

/// Everything rendered during one tick, one buffer per song channel.
#[derive(Clone, Debug, PartialEq)]
pub struct PremixData {
    pub samples_len: usize,
    pub data: Vec<ChannelData>,
    /// Song mixing volume times global volume
    pub mix_volume: f32,
}

impl PremixData {
    /// Sum every channel at `mix_volume`, clamped to [-1, 1].
    pub fn mixdown(&self, output_channels: u16) -> AudioBuffer {
        let mut out = AudioBuffer::new(output_channels, self.samples_len);
        for ch in &self.data {
            out.mix_from_scaled(&ch.buffer, self.mix_volume);
        }
        for c in 0..out.channels() {
            for s in out.channel_mut(c) {
                *s = s.clamp(-1.0, 1.0);
            }
        }
        out
    }

    pub fn active_voices(&self) -> usize {
        self.data.iter().map(|c| c.voices).sum()
    }
}
