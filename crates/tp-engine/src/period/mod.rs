//! Pitch representation.
//!
//! Two period families share one capability set: [`AmigaPeriod`], where
//! the value is inversely proportional to frequency, and [`LinearPeriod`],
//! a count of finetune steps. Playback is generic over [`Period`] so the
//! family is picked once when a song is loaded.

mod amiga;
mod linear;

use core::cmp::Ordering;
use core::fmt;

pub use amiga::AmigaPeriod;
pub use linear::LinearPeriod;

/// Frequency in Hz.
pub type Frequency = f64;

/// Fractional period adjustment (slides, vibrato, envelopes).
pub type Delta = f64;

/// Default C-4 sample rate.
pub const MIDDLE_C_FREQUENCY: Frequency = 8363.0;

/// Inverse period of C-4.
pub const MIDDLE_C_PERIOD: f64 = 1712.0;

/// Clock all periods are derived from.
pub const BASE_CLOCK: Frequency = MIDDLE_C_FREQUENCY * MIDDLE_C_PERIOD;

/// Semitones per octave.
pub const KEYS_PER_OCTAVE: i32 = 12;

/// Finetune steps per semitone.
pub const FINETUNES_PER_KEY: i32 = 64;

/// Finetune steps per octave.
pub const FINETUNES_PER_OCTAVE: i32 = KEYS_PER_OCTAVE * FINETUNES_PER_KEY;

/// Octave-zero inverse periods, one per semitone.
pub const SEMITONE_PERIOD_TABLE: [u32; 12] = [
    27392, 25856, 24384, 23040, 21696, 20480, 19328, 18240, 17216, 16256, 15360, 14496,
];

/// Pitch value with frequency-aware arithmetic.
///
/// `Default` is the silent sentinel. Arithmetic on the sentinel returns
/// the sentinel.
pub trait Period: Copy + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Sign to pass to [`add_integer`](Period::add_integer) /
    /// [`add_delta`](Period::add_delta) to raise the pitch.
    const HIGHER_PITCH_SIGN: i32;

    /// Period of `semitone` plus `finetune` steps for an instrument whose
    /// C-4 plays at `instrument_frequency` Hz.
    fn from_semitone(semitone: u8, finetune: i16, instrument_frequency: Frequency) -> Self;

    /// Add `delta * sign`, truncating the current value first where the
    /// family stores fractions.
    fn add_integer(self, delta: i32, sign: i32) -> Self;

    /// Add `delta * sign`.
    fn add_delta(self, delta: Delta, sign: i32) -> Self;

    /// `Greater` when `self` sounds higher than `rhs`. The sentinel is
    /// lower than anything audible.
    fn compare(&self, rhs: &Self) -> Ordering;

    /// Playback frequency in Hz, 0 for the sentinel.
    fn frequency(&self, base_clock: Frequency) -> Frequency;

    /// True for the "not sounding" sentinel.
    fn is_silent(&self) -> bool;

    /// Sample frames to advance per output frame.
    fn sampler_add(&self, base_clock: Frequency, sample_rate: Frequency) -> f64 {
        if sample_rate <= 0.0 {
            return 0.0;
        }
        self.frequency(base_clock) / sample_rate
    }
}

fn normalize_instrument_frequency(freq: Frequency) -> Frequency {
    if freq == 0.0 {
        MIDDLE_C_FREQUENCY
    } else {
        freq
    }
}

/// C-4 frequency of an instrument after applying `finetune` steps.
pub fn finetune_c4_speed<P: Period>(c4_speed: Frequency, finetune: i16) -> Frequency {
    if finetune == 0 {
        return c4_speed;
    }
    let nft = 4 * FINETUNES_PER_OCTAVE + finetune as i32;
    let semitone = nft.div_euclid(FINETUNES_PER_KEY);
    let ft = nft.rem_euclid(FINETUNES_PER_KEY);
    P::from_semitone(semitone.clamp(0, u8::MAX as i32) as u8, ft as i16, c4_speed).frequency(BASE_CLOCK)
}

/// Frequency of `semitone` for an instrument whose C-4 plays at `c4_speed`.
pub fn frequency_from_semitone<P: Period>(semitone: u8, c4_speed: Frequency) -> Frequency {
    P::from_semitone(semitone, 0, c4_speed).frequency(BASE_CLOCK)
}
