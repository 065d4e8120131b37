//! Audio frame type.

/// Maximum number of channels a frame carries.
pub const MAX_FRAME_CHANNELS: usize = tp_ir::MAX_CHANNELS as usize;

/// One multichannel f32 sample frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    samples: [f32; MAX_FRAME_CHANNELS],
    channels: u8,
}

impl Frame {
    /// Create a silent frame with `channels` channels.
    pub fn silence(channels: usize) -> Self {
        Self {
            samples: [0.0; MAX_FRAME_CHANNELS],
            channels: channels.min(MAX_FRAME_CHANNELS) as u8,
        }
    }

    /// Create a single-channel frame.
    pub fn mono(value: f32) -> Self {
        let mut f = Self::silence(1);
        f.samples[0] = value;
        f
    }

    /// Create a two-channel frame.
    pub fn stereo(left: f32, right: f32) -> Self {
        let mut f = Self::silence(2);
        f.samples[0] = left;
        f.samples[1] = right;
        f
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// Sample of channel `ch`, 0 past the channel count.
    pub fn get(&self, ch: usize) -> f32 {
        if ch < self.channels() {
            self.samples[ch]
        } else {
            0.0
        }
    }

    /// Set channel `ch`; ignored past the channel count.
    pub fn set(&mut self, ch: usize, value: f32) {
        if ch < self.channels() {
            self.samples[ch] = value;
        }
    }

    /// The populated samples.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples[..self.channels()]
    }

    /// Scale every channel by `gain`.
    pub fn scaled(mut self, gain: f32) -> Self {
        for s in &mut self.samples[..self.channels as usize] {
            *s *= gain;
        }
        self
    }

    /// Add another frame channel by channel, keeping this frame's width.
    pub fn mix(&mut self, other: &Frame) {
        for ch in 0..self.channels() {
            self.samples[ch] += other.get(ch);
        }
    }

    /// Average of all channels.
    pub fn to_mono(&self) -> f32 {
        if self.channels == 0 {
            return 0.0;
        }
        self.as_slice().iter().sum::<f32>() / self.channels as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_requested_width() {
        let f = Frame::silence(2);
        assert_eq!(f.channels(), 2);
        assert_eq!(f.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn out_of_range_access_is_quiet() {
        let mut f = Frame::mono(0.5);
        f.set(3, 1.0);
        assert_eq!(f.get(3), 0.0);
        assert_eq!(f.get(0), 0.5);
    }

    #[test]
    fn mix_keeps_own_width() {
        let mut f = Frame::mono(0.25);
        f.mix(&Frame::stereo(0.25, 1.0));
        assert_eq!(f.as_slice(), &[0.5]);
    }

    #[test]
    fn scaled_and_mono_downmix() {
        let f = Frame::stereo(1.0, -0.5).scaled(0.5);
        assert_eq!(f.as_slice(), &[0.5, -0.25]);
        assert!((f.to_mono() - 0.125).abs() < 1e-6);
    }
}
