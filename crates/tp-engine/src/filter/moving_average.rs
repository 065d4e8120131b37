use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::PI;

use tp_ir::FilterParams;

use super::Filter;
use crate::error::EngineError;
use crate::frame::Frame;
use crate::period::Frequency;

/// FIR smoothing filter with a normalized Gaussian window.
#[derive(Clone, Debug)]
pub struct MovingAverageFilter {
    points: Vec<Frame>,
    coeffs: Vec<f32>,
    write_pos: usize,
}

impl MovingAverageFilter {
    pub const NAME: &'static str = "moving-average";

    pub fn new(window_size: usize) -> Result<Self, EngineError> {
        if window_size == 0 {
            return Err(EngineError::InvalidWindowSize);
        }

        // bell width, height and center
        let sigma = window_size as f64 / (2.0 * PI);
        let a = 1.0 / (sigma * libm::sqrt(2.0 * PI));
        let mu = window_size as f64 / 2.0;
        let two_sigma_sq = 2.0 * sigma * sigma;

        let mut coeffs: Vec<f32> = (0..window_size)
            .map(|x| {
                let xmu = (x as f64 + 0.5) - mu;
                (a * libm::exp(-(xmu * xmu) / two_sigma_sq)).clamp(0.0, 1.0) as f32
            })
            .collect();

        let acc: f32 = coeffs.iter().sum();
        if acc != 1.0 && acc != 0.0 {
            let v = 1.0 / acc;
            for c in &mut coeffs {
                *c *= v;
            }
        }

        Ok(Self {
            points: vec![Frame::default(); window_size],
            coeffs,
            write_pos: 0,
        })
    }

    pub(super) fn construct(params: &FilterParams) -> Result<Box<dyn Filter>, EngineError> {
        match params {
            FilterParams::MovingAverage { window_size } => Ok(Box::new(Self::new(*window_size)?)),
            _ => Err(EngineError::InvalidFilterParams(Self::NAME.to_string())),
        }
    }

    /// Window coefficients, oldest tap first.
    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }
}

impl Filter for MovingAverageFilter {
    fn filter(&mut self, dry: Frame) -> Frame {
        if dry.channels() == 0 {
            return dry;
        }

        let len = self.points.len();
        self.points[self.write_pos] = dry;

        let mut wet = Frame::silence(dry.channels());
        let mut pos = self.write_pos;
        for &coeff in &self.coeffs {
            pos += 1;
            if pos >= len {
                pos -= len;
            }
            wet.mix(&self.points[pos].scaled(coeff));
        }

        self.write_pos += 1;
        if self.write_pos >= len {
            self.write_pos -= len;
        }
        wet
    }

    fn update_env(&mut self, _value: u8) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_playback_rate(&mut self, _rate: Frequency) -> Result<(), EngineError> {
        Ok(())
    }
}
