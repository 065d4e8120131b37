//! Voice modulator components.
//!
//! Each component owns its settings and runtime state, is advanced once
//! per tick by its voice, and exposes a final value the voice combines.

mod amp;
mod auto_vibrato;
mod envelope;
mod fadeout;
mod freq;
mod key;
mod oscillator;
mod pan;
mod pitch_pan;
mod vol0;
mod voicer;

pub use amp::AmpModulator;
pub use auto_vibrato::AutoVibratoModulator;
pub use envelope::EnvelopeModulator;
pub use fadeout::FadeoutModulator;
pub use freq::FreqModulator;
pub use key::{Deferred, KeyModulator, KeyState};
pub use oscillator::Oscillator;
pub use pan::PanModulator;
pub use pitch_pan::PitchPanModulator;
pub use vol0::{Vol0Optimization, Vol0Settings};
pub use voicer::{SampleVoicer, Voicer};

/// Action a component asks its voice to take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceAction {
    /// Move the key into fadeout
    Fadeout,
    /// Stop the voice outright
    Stop,
}
