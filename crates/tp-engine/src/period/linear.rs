use core::cmp::Ordering;

use super::{
    normalize_instrument_frequency, Delta, Frequency, Period, FINETUNES_PER_KEY,
    FINETUNES_PER_OCTAVE, MIDDLE_C_FREQUENCY, SEMITONE_PERIOD_TABLE,
};

/// Linear period: a count of finetune steps (64 per semitone). Higher
/// values sound higher. Zero is silent; sounding periods never reach it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearPeriod {
    finetune: i32,
    freq_ratio: f64,
}

impl Default for LinearPeriod {
    fn default() -> Self {
        Self { finetune: 0, freq_ratio: 1.0 }
    }
}

impl LinearPeriod {
    pub fn new(finetune: i32, freq_ratio: f64) -> Self {
        Self { finetune, freq_ratio }
    }

    /// Finetune step count.
    pub fn finetune(&self) -> i32 {
        self.finetune
    }
}

impl Period for LinearPeriod {
    const HIGHER_PITCH_SIGN: i32 = 1;

    fn from_semitone(semitone: u8, finetune: i16, instrument_frequency: Frequency) -> Self {
        Self {
            // 0 is the silent sentinel, so C-0 sounds one step sharp
            finetune: (semitone as i32 * FINETUNES_PER_KEY + finetune as i32).max(1),
            freq_ratio: normalize_instrument_frequency(instrument_frequency) / MIDDLE_C_FREQUENCY,
        }
    }

    fn add_integer(self, delta: i32, sign: i32) -> Self {
        self.add_delta(delta as Delta, sign)
    }

    fn add_delta(self, delta: Delta, sign: i32) -> Self {
        if self.is_silent() {
            return Self { finetune: 0, ..self };
        }
        let d = delta as i32 * sign;
        Self {
            finetune: self.finetune.saturating_add(d).max(1),
            ..self
        }
    }

    fn compare(&self, rhs: &Self) -> Ordering {
        match (self.is_silent(), rhs.is_silent()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.finetune.cmp(&rhs.finetune),
        }
    }

    fn frequency(&self, base_clock: Frequency) -> Frequency {
        if self.is_silent() {
            return 0.0;
        }
        let lin = libm::pow(2.0, self.finetune as f64 / FINETUNES_PER_OCTAVE as f64);
        base_clock * lin / SEMITONE_PERIOD_TABLE[0] as f64 * self.freq_ratio
    }

    fn is_silent(&self) -> bool {
        self.finetune <= 0
    }
}
