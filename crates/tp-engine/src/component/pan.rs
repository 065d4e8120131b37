/// Stereo position in [-1.0, 1.0] (0 = center).
#[derive(Clone, Debug)]
pub struct PanModulator {
    enabled: bool,
    initial: f32,
    pan: f32,
    delta: f32,
}

impl Default for PanModulator {
    fn default() -> Self {
        Self::new(true, 0.0)
    }
}

impl PanModulator {
    pub fn new(enabled: bool, initial: f32) -> Self {
        let initial = initial.clamp(-1.0, 1.0);
        Self {
            enabled,
            initial,
            pan: initial,
            delta: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.pan = self.initial;
        self.delta = 0.0;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Ignored when panning is disabled.
    pub fn set_pan(&mut self, pan: f32) {
        if self.enabled {
            self.pan = pan.clamp(-1.0, 1.0);
        }
    }

    /// Temporary offset (panbrello and similar).
    pub fn set_pan_delta(&mut self, delta: f32) {
        if self.enabled {
            self.delta = delta;
        }
    }

    pub fn final_pan(&self) -> f32 {
        (self.pan + self.delta).clamp(-1.0, 1.0)
    }
}
