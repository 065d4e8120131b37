/// Amplitude: note volume, mixing volume and mute.
#[derive(Clone, Debug)]
pub struct AmpModulator {
    default_volume: f32,
    mixing_volume: f32,
    volume: f32,
    delta: f32,
    muted: bool,
}

impl Default for AmpModulator {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl AmpModulator {
    /// `default_volume` is restored on reset; `mixing_volume` scales the
    /// final value (instrument and sample global volume).
    pub fn new(default_volume: f32, mixing_volume: f32) -> Self {
        Self {
            default_volume: default_volume.clamp(0.0, 1.0),
            mixing_volume: mixing_volume.max(0.0),
            volume: default_volume.clamp(0.0, 1.0),
            delta: 0.0,
            muted: false,
        }
    }

    pub fn reset(&mut self) {
        self.volume = self.default_volume;
        self.delta = 0.0;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Temporary offset (tremolo and similar), cleared by reset.
    pub fn set_volume_delta(&mut self, delta: f32) {
        self.delta = delta;
    }

    pub fn mixing_volume(&self) -> f32 {
        self.mixing_volume
    }

    pub fn set_mixing_volume(&mut self, mixing_volume: f32) {
        self.mixing_volume = mixing_volume.max(0.0);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Combined output gain.
    pub fn final_volume(&self) -> f32 {
        if self.muted {
            return 0.0;
        }
        (self.volume + self.delta).clamp(0.0, 1.0) * self.mixing_volume
    }
}
