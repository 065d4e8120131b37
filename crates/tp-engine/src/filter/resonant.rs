use alloc::boxed::Box;
use alloc::string::ToString;
use core::f64::consts::PI;

use tp_ir::{FilterParams, ResonantParams};

use super::Filter;
use crate::error::EngineError;
use crate::frame::{Frame, MAX_FRAME_CHANNELS};
use crate::period::Frequency;

/// Standard IT cutoff range.
const IT_FILTER_RANGE: f64 = 24.0;
/// Extended (OpenMPT) cutoff range.
const EXTENDED_FILTER_RANGE: f64 = 20.0;
const DAMPING_FACTOR_DIVISOR: f64 = (24.0 / 128.0) / 20.0;

#[derive(Clone, Copy, Debug, Default)]
struct History {
    y1: f32,
    y2: f32,
}

/// Two-pole resonant low/high-pass filter (IT style).
#[derive(Clone, Debug)]
pub struct ResonantFilter {
    history: [History; MAX_FRAME_CHANNELS],
    a0: f32,
    b0: f32,
    b1: f32,
    enabled: bool,
    cutoff: Option<u8>,
    resonance: Option<u8>,
    highpass: bool,
    extended_range: bool,
    f2: f64,
    fr: f64,
    efr: f64,
    playback_rate: Frequency,
}

impl ResonantFilter {
    pub const NAME: &'static str = "resonant";

    pub fn new(params: ResonantParams) -> Self {
        Self {
            history: [History::default(); MAX_FRAME_CHANNELS],
            a0: 0.0,
            b0: 0.0,
            b1: 0.0,
            enabled: false,
            cutoff: params.cutoff.map(|c| c.min(127)),
            resonance: params.resonance.map(|r| r.min(127)),
            highpass: params.highpass,
            extended_range: params.extended_range,
            f2: 0.0,
            fr: 0.0,
            efr: 0.0,
            playback_rate: 0.0,
        }
    }

    pub(super) fn construct(params: &FilterParams) -> Result<Box<dyn Filter>, EngineError> {
        match params {
            FilterParams::Resonant(p) => Ok(Box::new(Self::new(*p))),
            _ => Err(EngineError::InvalidFilterParams(Self::NAME.to_string())),
        }
    }

    /// False when the filter passes audio through untouched.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn recalculate(&mut self, value: u8) -> Result<(), EngineError> {
        let resonance = self.resonance.unwrap_or(0);
        let cutoff = match self.cutoff {
            None => 127,
            Some(_) => {
                let c = value.min(127);
                self.cutoff = Some(c);
                c
            }
        };

        let computed_cutoff = cutoff as u16 * 2;
        self.enabled = !(computed_cutoff >= 254 && resonance == 0);
        if !self.enabled {
            return Ok(());
        }

        let filter_range = if self.extended_range {
            EXTENDED_FILTER_RANGE
        } else {
            IT_FILTER_RANGE
        };

        let damping = libm::pow(10.0, -(resonance as f64) * DAMPING_FACTOR_DIVISOR);

        let mut freq = 110.0 * libm::pow(2.0, 0.25 + computed_cutoff as f64 / filter_range);
        freq = freq.clamp(120.0, 20000.0);
        if freq > self.f2 && self.f2 >= 120.0 {
            freq = self.f2;
        }

        let fc = freq * 4.0 * PI;

        let (d, e) = if self.extended_range {
            let r = fc * self.efr;
            let d = ((1.0 - 2.0 * damping) * r).min(2.0);
            if r != 0.0 {
                ((2.0 * damping - d) / r, 1.0 / (r * r))
            } else {
                (0.0, 0.0)
            }
        } else {
            let r = self.fr / fc;
            (damping * r + damping - 1.0, r * r)
        };

        let mut a = 1.0 / (1.0 + d + e);
        let b = (d + e + e) * a;
        let c = -e * a;
        if self.highpass {
            a = 1.0 - a;
        } else if a == 0.0 {
            // extremely low cutoff at a very high rate would go silent
            a = 1.0;
        }

        for (name, v) in [("a", a), ("b", b), ("c", c)] {
            if v.is_nan() {
                return Err(EngineError::FilterCoefficient { coefficient: name });
            }
        }

        self.a0 = a as f32;
        self.b0 = b as f32;
        self.b1 = c as f32;
        Ok(())
    }
}

impl Filter for ResonantFilter {
    fn filter(&mut self, dry: Frame) -> Frame {
        let mut wet = dry;
        for ch in 0..dry.channels() {
            let s = dry.get(ch);
            let h = &mut self.history[ch];

            let mut yn = s;
            if self.enabled {
                yn = (s * self.a0 + h.y1 * self.b0 + h.y2 * self.b1).clamp(-1.0, 1.0);
            }
            h.y2 = h.y1;
            h.y1 = yn;
            if self.highpass {
                h.y1 -= s;
            }
            wet.set(ch, yn);
        }
        wet
    }

    fn update_env(&mut self, value: u8) -> Result<(), EngineError> {
        self.recalculate(value)
    }

    fn set_playback_rate(&mut self, rate: Frequency) -> Result<(), EngineError> {
        if self.playback_rate == rate {
            return Ok(());
        }
        self.playback_rate = rate;
        self.f2 = rate / 2.0;
        self.fr = rate;
        if self.fr != 0.0 {
            self.efr = 1.0 / self.fr;
        }
        self.recalculate(self.cutoff.unwrap_or(127))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cutoff: Option<u8>, resonance: Option<u8>) -> ResonantParams {
        ResonantParams {
            cutoff,
            resonance,
            ..ResonantParams::default()
        }
    }

    #[test]
    fn max_cutoff_without_resonance_is_passthrough() {
        let mut f = ResonantFilter::new(params(Some(127), Some(0)));
        f.set_playback_rate(44100.0).unwrap();
        assert!(!f.is_enabled());
        for x in [0.5f32, -0.25, 1.0, -1.0, 0.0] {
            assert_eq!(f.filter(Frame::stereo(x, -x)), Frame::stereo(x, -x));
        }
    }

    #[test]
    fn unset_params_are_passthrough() {
        let mut f = ResonantFilter::new(ResonantParams::default());
        f.set_playback_rate(48000.0).unwrap();
        assert!(!f.is_enabled());
        assert_eq!(f.filter(Frame::mono(0.3)), Frame::mono(0.3));
    }

    #[test]
    fn low_cutoff_attenuates_alternating_signal() {
        let mut f = ResonantFilter::new(params(Some(20), Some(0)));
        f.set_playback_rate(44100.0).unwrap();
        assert!(f.is_enabled());
        let mut peak = 0.0f32;
        for i in 0..512 {
            let x = if i % 2 == 0 { 0.8 } else { -0.8 };
            let y = f.filter(Frame::mono(x)).get(0);
            if i > 256 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.1, "peak {peak}");
    }

    #[test]
    fn output_is_clamped_to_unit_range() {
        let mut f = ResonantFilter::new(params(Some(60), Some(127)));
        f.set_playback_rate(44100.0).unwrap();
        for i in 0..2048 {
            let x = if (i / 40) % 2 == 0 { 1.0 } else { -1.0 };
            let y = f.filter(Frame::mono(x)).get(0);
            assert!((-1.0..=1.0).contains(&y));
        }
    }

    #[test]
    fn envelope_moves_configured_cutoff_only() {
        let mut set = ResonantFilter::new(params(Some(127), Some(0)));
        set.set_playback_rate(44100.0).unwrap();
        set.update_env(40).unwrap();
        assert!(set.is_enabled());
        assert_eq!(set.cutoff, Some(40));
        set.update_env(200).unwrap();
        assert_eq!(set.cutoff, Some(127));
        assert!(!set.is_enabled());

        let mut unset = ResonantFilter::new(params(None, Some(0)));
        unset.set_playback_rate(44100.0).unwrap();
        unset.update_env(10).unwrap();
        assert!(!unset.is_enabled());
        assert_eq!(unset.cutoff, None);
    }

    #[test]
    fn extended_range_and_highpass_produce_finite_coefficients() {
        let mut f = ResonantFilter::new(ResonantParams {
            cutoff: Some(64),
            resonance: Some(32),
            extended_range: true,
            highpass: true,
        });
        f.set_playback_rate(44100.0).unwrap();
        assert!(f.a0.is_finite() && f.b0.is_finite() && f.b1.is_finite());
        let y = f.filter(Frame::mono(0.5)).get(0);
        assert!(y.is_finite());
    }

    #[test]
    fn repeated_rate_is_ignored() {
        let mut f = ResonantFilter::new(params(Some(50), Some(0)));
        f.set_playback_rate(44100.0).unwrap();
        let coeffs = (f.a0, f.b0, f.b1);
        f.set_playback_rate(44100.0).unwrap();
        assert_eq!(coeffs, (f.a0, f.b0, f.b1));
        f.set_playback_rate(22050.0).unwrap();
        assert_ne!(coeffs, (f.a0, f.b0, f.b1));
    }

    #[test]
    fn clone_copies_history() {
        let mut a = ResonantFilter::new(params(Some(30), Some(10)));
        a.set_playback_rate(44100.0).unwrap();
        a.filter(Frame::mono(0.9));
        let mut b = a.clone();
        assert_eq!(a.filter(Frame::mono(0.1)), b.filter(Frame::mono(0.1)));
    }
}
