use tp_ir::AutoVibrato;

use super::Oscillator;
use crate::period::Delta;

/// Sample auto-vibrato: an oscillator whose depth ramps in over a sweep.
#[derive(Clone, Debug, Default)]
pub struct AutoVibratoModulator {
    settings: AutoVibrato,
    osc: Oscillator,
    age: u32,
    delta: Delta,
}

impl AutoVibratoModulator {
    pub fn new(settings: AutoVibrato) -> Self {
        Self {
            settings,
            osc: Oscillator::new(settings.waveform),
            age: 0,
            delta: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_enabled()
    }

    pub fn reset(&mut self) {
        self.osc.reset();
        self.age = 0;
        self.delta = 0.0;
    }

    /// Current depth: ramps linearly from 0 to full over the sweep ticks.
    pub fn depth(&self) -> f32 {
        let sweep = self.settings.sweep as u32;
        if sweep == 0 || self.age >= sweep {
            self.settings.depth
        } else {
            self.settings.depth * self.age as f32 / sweep as f32
        }
    }

    pub fn advance(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.age = self.age.saturating_add(1);
        self.osc.advance(self.settings.speed);
        self.delta = (self.osc.value() * self.depth()) as Delta;
    }

    /// Period offset toward higher pitch.
    pub fn final_delta(&self) -> Delta {
        self.delta
    }
}
