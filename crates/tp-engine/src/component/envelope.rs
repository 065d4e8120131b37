use tp_ir::{Envelope, EnvelopeValue, LoopMode, LoopSettings};

use super::VoiceAction;

/// Tick-driven envelope evaluator shared by the volume, panning, pitch and
/// filter envelopes.
///
/// The cursor moves one tick per [`advance`](Self::advance). While the key
/// is held the sustain loop wins over the regular loop. With no active loop
/// the terminal point holds and the envelope reports finished once.
#[derive(Clone, Debug)]
pub struct EnvelopeModulator<T> {
    settings: Envelope<T>,
    on_finished: Option<VoiceAction>,
    enabled: bool,
    pos: u32,
    forward: bool,
    released: bool,
    finished: bool,
    value: f32,
}

impl<T: EnvelopeValue> Default for EnvelopeModulator<T> {
    fn default() -> Self {
        Self::new(Envelope::default())
    }
}

impl<T: EnvelopeValue> EnvelopeModulator<T> {
    pub fn new(settings: Envelope<T>) -> Self {
        let enabled = settings.enabled && !settings.points.is_empty();
        let mut env = Self {
            settings,
            on_finished: None,
            enabled,
            pos: 0,
            forward: true,
            released: false,
            finished: false,
            value: 0.0,
        };
        env.reset();
        env
    }

    /// Action handed back to the voice when the terminal point is reached.
    pub fn with_finish_action(mut self, action: Option<VoiceAction>) -> Self {
        self.on_finished = action;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn the envelope on or off (only envelopes with points can run).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled && !self.settings.points.is_empty();
    }

    /// Back to position 0 with the key held.
    pub fn reset(&mut self) {
        self.forward = true;
        self.released = false;
        self.set_position(0);
    }

    /// Key released: the sustain loop stops applying.
    pub fn release(&mut self) {
        self.released = true;
    }

    /// Jump the cursor.
    pub fn set_position(&mut self, pos: u32) {
        self.pos = pos;
        self.finished = false;
        self.value = self.settings.value_at(pos);
    }

    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Current interpolated value.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True if the regular loop keeps the envelope running after release.
    pub fn can_loop(&self) -> bool {
        self.enabled && self.settings.loop_settings.is_enabled()
    }

    /// Value of the terminal point.
    pub fn terminal_value(&self) -> f32 {
        self.settings.points.last().map_or(0.0, |p| p.y.to_f32())
    }

    fn active_loop(&self) -> Option<LoopSettings> {
        if !self.released && self.settings.sustain.is_enabled() {
            Some(self.settings.sustain)
        } else if self.settings.loop_settings.is_enabled() {
            Some(self.settings.loop_settings)
        } else {
            None
        }
    }

    /// Move one tick. Returns the finish action on the tick the terminal
    /// point is first reached.
    pub fn advance(&mut self) -> Option<VoiceAction> {
        if !self.enabled || self.finished {
            return None;
        }

        let active = self.active_loop();
        match active {
            Some(lp) if lp.mode == LoopMode::PingPong => {
                if self.forward {
                    if self.pos >= lp.end {
                        self.forward = false;
                        self.pos = self.pos.saturating_sub(1).max(lp.begin);
                    } else {
                        self.pos += 1;
                    }
                } else if self.pos <= lp.begin {
                    self.forward = true;
                    self.pos = (self.pos + 1).min(lp.end);
                } else {
                    self.pos -= 1;
                }
            }
            Some(lp) => {
                self.pos += 1;
                if self.pos > lp.end {
                    self.pos = lp.begin;
                }
            }
            None => {
                self.forward = true;
                self.pos = self.pos.saturating_add(1);
            }
        }

        self.value = self.settings.value_at(self.pos);

        if active.is_none() && self.pos >= self.settings.terminal_pos() {
            self.finished = true;
            return self.on_finished;
        }
        None
    }
}
