use core::cmp::Ordering;

use super::{
    normalize_instrument_frequency, Delta, Frequency, Period, FINETUNES_PER_OCTAVE, KEYS_PER_OCTAVE,
    MIDDLE_C_FREQUENCY, SEMITONE_PERIOD_TABLE,
};

/// Inverse period: lower values sound higher. Values at or below zero
/// are silent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmigaPeriod {
    value: f64,
    freq_ratio: f64,
}

impl Default for AmigaPeriod {
    fn default() -> Self {
        Self { value: 0.0, freq_ratio: 1.0 }
    }
}

impl AmigaPeriod {
    pub fn new(value: f64, freq_ratio: f64) -> Self {
        Self { value, freq_ratio }
    }

    /// Raw period value.
    pub fn value(&self) -> f64 {
        self.value
    }

    fn with_value(self, value: f64) -> Self {
        Self {
            value: if value <= 0.0 { 0.0 } else { value },
            ..self
        }
    }
}

impl Period for AmigaPeriod {
    const HIGHER_PITCH_SIGN: i32 = -1;

    fn from_semitone(semitone: u8, finetune: i16, instrument_frequency: Frequency) -> Self {
        let key = (semitone as i32 % KEYS_PER_OCTAVE) as usize;
        let octave = semitone as u32 / KEYS_PER_OCTAVE as u32;
        let kp = SEMITONE_PERIOD_TABLE[key] >> octave;

        let mut inst_freq = normalize_instrument_frequency(instrument_frequency);
        if finetune != 0 {
            inst_freq /= libm::pow(2.0, finetune as f64 / FINETUNES_PER_OCTAVE as f64);
        }

        Self {
            value: kp as f64,
            freq_ratio: inst_freq / MIDDLE_C_FREQUENCY,
        }
    }

    fn add_integer(self, delta: i32, sign: i32) -> Self {
        if self.is_silent() {
            return Self { value: 0.0, ..self };
        }
        let base = libm::trunc(self.value);
        self.with_value(base + (delta * sign) as f64)
    }

    fn add_delta(self, delta: Delta, sign: i32) -> Self {
        if self.is_silent() {
            return Self { value: 0.0, ..self };
        }
        self.with_value(self.value + delta * sign as f64)
    }

    fn compare(&self, rhs: &Self) -> Ordering {
        match (self.is_silent(), rhs.is_silent()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // lower period, higher pitch
            (false, false) => rhs.value.partial_cmp(&self.value).unwrap_or(Ordering::Equal),
        }
    }

    fn frequency(&self, base_clock: Frequency) -> Frequency {
        if self.is_silent() {
            return 0.0;
        }
        base_clock / self.value * self.freq_ratio
    }

    fn is_silent(&self) -> bool {
        self.value <= 0.0
    }
}
