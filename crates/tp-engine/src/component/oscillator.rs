use core::f32::consts::TAU;

use rand::RngCore;
use rand_pcg::Pcg32;
use tp_ir::VibratoWaveform;

/// Phase steps per cycle.
const CYCLE: u8 = 64;

const RNG_STATE: u64 = 0xcafe_f00d_d15e_a5e5;
const RNG_STREAM: u64 = 0x0a02_bdbf_7bb3_c0a7;

/// Low-frequency oscillator with tracker waveforms. Cloning copies the
/// noise generator state, so clones produce the same random sequence.
#[derive(Clone, Debug)]
pub struct Oscillator {
    waveform: VibratoWaveform,
    pos: u8,
    rng: Pcg32,
    random: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(VibratoWaveform::Sine)
    }
}

impl Oscillator {
    pub fn new(waveform: VibratoWaveform) -> Self {
        Self {
            waveform,
            pos: 0,
            rng: Pcg32::new(RNG_STATE, RNG_STREAM),
            random: 0.0,
        }
    }

    pub fn waveform(&self) -> VibratoWaveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: VibratoWaveform) {
        self.waveform = waveform;
    }

    /// Restart the cycle.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.random = 0.0;
    }

    /// Step the phase by `speed` (64 steps per cycle).
    pub fn advance(&mut self, speed: u8) {
        self.pos = self.pos.wrapping_add(speed) % CYCLE;
        if self.waveform == VibratoWaveform::Random {
            self.random = (self.rng.next_u32() as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32;
        }
    }

    /// Current output in [-1.0, 1.0].
    pub fn value(&self) -> f32 {
        let phase = self.pos as f32 / CYCLE as f32;
        match self.waveform {
            VibratoWaveform::Sine => libm::sinf(TAU * phase),
            VibratoWaveform::Sawtooth => 1.0 - 2.0 * phase,
            VibratoWaveform::Square => {
                if self.pos < CYCLE / 2 {
                    1.0
                } else {
                    -1.0
                }
            }
            VibratoWaveform::Random => self.random,
            VibratoWaveform::InverseSawtooth => 2.0 * phase - 1.0,
        }
    }
}
