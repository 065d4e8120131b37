use tp_ir::{FadeoutMode, FadeoutSettings};

/// Linear volume ramp to silence after note fade.
#[derive(Clone, Debug)]
pub struct FadeoutModulator {
    amount: f32,
    gate: bool,
    active: bool,
    volume: f32,
}

impl Default for FadeoutModulator {
    fn default() -> Self {
        Self::new(FadeoutSettings::default(), false)
    }
}

impl FadeoutModulator {
    /// The fadeout policy is evaluated here, once, against whether the
    /// volume envelope is enabled.
    pub fn new(settings: FadeoutSettings, vol_env_enabled: bool) -> Self {
        let gate = match settings.mode {
            FadeoutMode::Disabled => false,
            FadeoutMode::AlwaysActive => true,
            FadeoutMode::OnlyIfVolEnvActive => vol_env_enabled,
        };
        Self {
            amount: settings.amount.max(0.0),
            gate,
            active: false,
            volume: 1.0,
        }
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.volume = 1.0;
    }

    /// Start fading if the policy allows it.
    pub fn activate(&mut self) {
        if self.gate {
            self.active = true;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn advance(&mut self) {
        if self.active {
            self.volume = (self.volume - self.amount).max(0.0);
        }
    }

    /// Current fade multiplier.
    pub fn final_volume(&self) -> f32 {
        self.volume
    }

    /// Active and fully faded.
    pub fn is_done(&self) -> bool {
        self.active && self.volume <= 0.0
    }
}
