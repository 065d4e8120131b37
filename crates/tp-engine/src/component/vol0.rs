/// Silence-skip tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vol0Settings {
    pub enabled: bool,
    /// Consecutive silent ticks before the voice counts as done
    pub max_ticks_at_zero: u32,
    /// Volumes at or below this are silent
    pub threshold: f32,
}

impl Default for Vol0Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_ticks_at_zero: 64,
            threshold: 1.0 / 65536.0,
        }
    }
}

/// Counts consecutive near-silent ticks so inaudible voices can be retired.
#[derive(Clone, Debug, Default)]
pub struct Vol0Optimization {
    settings: Vol0Settings,
    ticks_at_zero: u32,
}

impl Vol0Optimization {
    pub fn new(settings: Vol0Settings) -> Self {
        Self {
            settings,
            ticks_at_zero: 0,
        }
    }

    pub fn reset(&mut self) {
        self.ticks_at_zero = 0;
    }

    /// Record one tick's final volume.
    pub fn observe(&mut self, volume: f32) {
        if !self.settings.enabled {
            return;
        }
        if volume <= self.settings.threshold {
            self.ticks_at_zero = self.ticks_at_zero.saturating_add(1);
        } else {
            self.ticks_at_zero = 0;
        }
    }

    pub fn is_done(&self) -> bool {
        self.settings.enabled && self.ticks_at_zero >= self.settings.max_ticks_at_zero
    }
}
