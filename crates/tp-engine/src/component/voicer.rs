use core::fmt::Debug;

use tp_ir::{LoopMode, LoopSettings, Sample, SampleKey};

use crate::frame::Frame;

/// Sound source driven by a voice. Key transitions are forwarded as they
/// happen; the deferred ones arrive once the envelopes have been advanced.
pub trait Voicer: Clone + Debug + Send {
    fn from_sample(key: SampleKey, sample: &Sample) -> Self;

    fn sample_key(&self) -> SampleKey;

    /// Cursor, in frames.
    fn position(&self) -> f64;

    fn set_position(&mut self, pos: f64);

    /// Played past the end without a loop.
    fn is_finished(&self) -> bool;

    /// Restart from the first frame.
    fn attack(&mut self);

    /// Key released.
    fn release(&mut self);

    fn fadeout(&mut self) {}

    fn deferred_attack(&mut self) {}

    fn deferred_release(&mut self) {}

    /// Frame at the cursor, in the sample's channel layout.
    fn sample_frame(&self, sample: &Sample) -> Frame;

    /// Move the cursor `step` frames.
    fn advance(&mut self, step: f64);
}

/// PCM playback cursor over one sample of the bank.
#[derive(Clone, Debug)]
pub struct SampleVoicer {
    sample: SampleKey,
    length: usize,
    channels: usize,
    whole_loop: LoopSettings,
    sustain_loop: LoopSettings,
    pos: f64,
    forward: bool,
    key_on: bool,
    finished: bool,
}

impl SampleVoicer {
    pub fn new(key: SampleKey, sample: &Sample) -> Self {
        Self {
            sample: key,
            length: sample.len(),
            channels: sample.data.num_channels() as usize,
            whole_loop: sample.loop_settings,
            sustain_loop: sample.sustain_loop,
            pos: 0.0,
            forward: true,
            key_on: true,
            finished: sample.is_empty(),
        }
    }

    /// Held key: the sustain loop applies.
    pub fn is_key_on(&self) -> bool {
        self.key_on
    }

    fn active_loop(&self) -> Option<LoopSettings> {
        let valid = |l: &LoopSettings| l.mode != LoopMode::Disabled && l.end > l.begin && (l.end as usize) <= self.length;
        if self.key_on && valid(&self.sustain_loop) {
            Some(self.sustain_loop)
        } else if valid(&self.whole_loop) {
            Some(self.whole_loop)
        } else {
            None
        }
    }
}

impl Voicer for SampleVoicer {
    fn from_sample(key: SampleKey, sample: &Sample) -> Self {
        Self::new(key, sample)
    }

    fn sample_key(&self) -> SampleKey {
        self.sample
    }

    fn position(&self) -> f64 {
        self.pos
    }

    fn set_position(&mut self, pos: f64) {
        self.pos = pos.max(0.0);
        self.finished = self.pos >= self.length as f64 && self.active_loop().is_none();
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn attack(&mut self) {
        self.pos = 0.0;
        self.forward = true;
        self.finished = self.length == 0;
    }

    /// Leave the sustain loop for the regular loop.
    fn release(&mut self) {
        self.key_on = false;
    }

    /// The sustain loop applies again.
    fn deferred_attack(&mut self) {
        self.key_on = true;
    }

    /// Interpolated toward the next frame, following the active loop.
    fn sample_frame(&self, sample: &Sample) -> Frame {
        let mut frame = Frame::silence(self.channels);
        if self.finished {
            return frame;
        }
        let idx = self.pos as usize;
        let next = match self.active_loop() {
            Some(lp) if idx + 1 >= lp.end as usize => Some(lp.begin as usize),
            _ if idx + 1 < self.length => Some(idx + 1),
            _ => None,
        };
        for ch in 0..self.channels {
            frame.set(ch, sample.data.read_interpolated(ch as u16, self.pos, next));
        }
        frame
    }

    fn advance(&mut self, step: f64) {
        if self.finished {
            return;
        }
        match self.active_loop() {
            None => {
                self.pos += step;
                if self.pos >= self.length as f64 {
                    self.finished = true;
                }
            }
            Some(lp) => {
                let begin = lp.begin as f64;
                let end = lp.end as f64;
                let len = end - begin;
                if lp.mode == LoopMode::PingPong {
                    self.pos += if self.forward { step } else { -step };
                    // bounce until inside the region
                    loop {
                        if self.forward && self.pos >= end {
                            self.pos = end - (self.pos - end);
                            self.forward = false;
                        } else if !self.forward && self.pos < begin {
                            self.pos = begin + (begin - self.pos);
                            self.forward = true;
                        } else {
                            break;
                        }
                    }
                } else {
                    self.pos += step;
                    if self.pos >= end {
                        self.pos = begin + (self.pos - end) % len;
                    }
                }
            }
        }
    }
}
