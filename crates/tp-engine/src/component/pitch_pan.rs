use tp_ir::PitchPan;

/// Pan units per IT pan step (IT pan spans 0..64, ours -1..1).
const PAN_STEP: f32 = 1.0 / 32.0;

/// Spreads notes across the stereo field by distance from a center note.
#[derive(Clone, Debug, Default)]
pub struct PitchPanModulator {
    enabled: bool,
    center: u8,
    /// IT pan steps per semitone
    separation: f32,
    note: u8,
    offset: f32,
}

impl PitchPanModulator {
    pub fn new(settings: PitchPan) -> Self {
        Self {
            enabled: settings.is_enabled(),
            center: settings.center,
            separation: settings.separation as f32 / 8.0,
            note: settings.center,
            offset: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Note currently playing.
    pub fn set_note(&mut self, note: u8) {
        self.note = note;
    }

    pub fn reset(&mut self) {
        self.note = self.center;
        self.offset = 0.0;
    }

    pub fn advance(&mut self) {
        self.offset = if self.enabled {
            (self.note as f32 - self.center as f32) * self.separation * PAN_STEP
        } else {
            0.0
        };
    }

    /// `pan` shifted by the current pitch-pan offset, clamped.
    pub fn separated_pan(&self, pan: f32) -> f32 {
        (pan + self.offset).clamp(-1.0, 1.0)
    }
}
