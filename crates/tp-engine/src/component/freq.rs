use crate::period::{Delta, Period};

/// Base period plus effect and auto-vibrato offsets.
#[derive(Clone, Debug, Default)]
pub struct FreqModulator<P> {
    period: P,
    delta: Delta,
    auto_vibrato_delta: Delta,
}

impl<P: Period> FreqModulator<P> {
    pub fn period(&self) -> P {
        self.period
    }

    pub fn set_period(&mut self, period: P) {
        self.period = period;
    }

    /// Effect offset (vibrato and similar), in period units toward higher pitch.
    pub fn set_delta(&mut self, delta: Delta) {
        self.delta = delta;
    }

    pub fn set_auto_vibrato_delta(&mut self, delta: Delta) {
        self.auto_vibrato_delta = delta;
    }

    pub fn reset(&mut self) {
        self.delta = 0.0;
        self.auto_vibrato_delta = 0.0;
    }

    pub fn final_period(&self) -> P {
        let total = self.delta + self.auto_vibrato_delta;
        if total == 0.0 {
            return self.period;
        }
        self.period.add_delta(total, P::HIGHER_PITCH_SIGN)
    }
}
