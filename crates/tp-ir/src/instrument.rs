//! Instrument and envelope types.

use core::fmt;

use arrayvec::{ArrayString, ArrayVec};

use crate::error::SongError;
use crate::sample::{LoopMode, LoopSettings, SampleKey};
use crate::song::truncated;

/// Number of playable notes in the keyboard map.
pub const NUM_NOTES: usize = 120;

/// Maximum number of points per envelope.
pub const MAX_ENVELOPE_POINTS: usize = 25;

/// Segment length of the terminal envelope point: hold forever.
pub const ENVELOPE_HOLD: u32 = u32::MAX;

/// An instrument definition.
#[derive(Clone, Debug)]
pub struct Instrument {
    /// Instrument name
    pub name: ArrayString<26>,
    /// Sound source
    pub kind: InstrumentKind,
    /// Keyboard map: played note (0-119) -> remapped note and sample
    pub keyboard: [KeyMapping; NUM_NOTES],
    /// Volume envelope (0-64)
    pub volume_envelope: Envelope<u8>,
    /// Panning envelope (-32 to +32)
    pub panning_envelope: Envelope<i8>,
    /// Pitch or filter envelope (-32 to +32)
    pub pitch_envelope: Envelope<i8>,
    /// The pitch envelope drives the filter cutoff instead of pitch
    pub pitch_envelope_is_filter: bool,
    /// Reaching the end of the volume envelope starts the fadeout
    pub fade_at_volume_envelope_end: bool,
    /// Fadeout behavior after note fade
    pub fadeout: FadeoutSettings,
    /// What happens to the playing note when a new note triggers
    pub new_note_action: NewNoteAction,
    /// Pitch-pan separation
    pub pitch_pan: PitchPan,
    /// Default panning (-64 to +64), if the instrument overrides it
    pub default_pan: Option<i8>,
    /// Instrument global volume (0.0-1.0)
    pub global_volume: f32,
    /// Per-voice filter
    pub filter: Option<FilterInfo>,
}

impl Default for Instrument {
    fn default() -> Self {
        let mut keyboard = [KeyMapping::default(); NUM_NOTES];
        for (note, mapping) in keyboard.iter_mut().enumerate() {
            mapping.note = note as u8;
        }
        Self {
            name: ArrayString::new(),
            kind: InstrumentKind::Sampled,
            keyboard,
            volume_envelope: Envelope::default(),
            panning_envelope: Envelope::default(),
            pitch_envelope: Envelope::default(),
            pitch_envelope_is_filter: false,
            fade_at_volume_envelope_end: false,
            fadeout: FadeoutSettings::default(),
            new_note_action: NewNoteAction::Cut,
            pitch_pan: PitchPan::default(),
            default_pan: None,
            global_volume: 1.0,
            filter: None,
        }
    }
}

impl Instrument {
    /// Create a new instrument with default settings.
    pub fn new(name: &str) -> Self {
        Self {
            name: truncated(name),
            ..Self::default()
        }
    }

    /// Set all notes to map to a single sample.
    pub fn set_single_sample(&mut self, sample: SampleKey) {
        for mapping in &mut self.keyboard {
            mapping.sample = Some(sample);
        }
    }

    /// Look up the keyboard mapping for a played note.
    pub fn mapping(&self, note: u8) -> Option<KeyMapping> {
        self.keyboard.get(note as usize).copied()
    }
}

/// Sound source of an instrument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstrumentKind {
    /// PCM sample playback through the keyboard map
    #[default]
    Sampled,
    /// OPL2 FM patch (S3M adlib instruments)
    Adlib(AdlibPatch),
}

/// Raw OPL2 register values of an adlib instrument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdlibPatch {
    pub registers: [u8; 12],
}

/// One keyboard map entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyMapping {
    /// Note actually played
    pub note: u8,
    /// Sample to play, if any
    pub sample: Option<SampleKey>,
}

/// Action when a new note triggers on a channel already playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NewNoteAction {
    /// Cut the previous note immediately
    #[default]
    Cut,
    /// Continue the previous note (background)
    Continue,
    /// Send note-off to previous note
    Release,
    /// Fade out the previous note
    Fadeout,
}

/// When the fadeout volume ramp is allowed to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FadeoutMode {
    #[default]
    Disabled,
    /// Fade whenever the key enters fadeout
    AlwaysActive,
    /// Fade only if the volume envelope is enabled (XM behavior)
    OnlyIfVolEnvActive,
}

/// Fadeout configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FadeoutSettings {
    pub mode: FadeoutMode,
    /// Volume removed per tick (1.0 = full volume)
    pub amount: f32,
}

impl FadeoutSettings {
    /// IT fadeout: `fadeout / 1024` per tick, or `/ 512` for the old
    /// instrument format.
    pub fn from_it(fadeout: u16, old_format: bool) -> Self {
        let scale = if old_format { 512.0 } else { 1024.0 };
        Self {
            mode: FadeoutMode::AlwaysActive,
            amount: fadeout as f32 / scale,
        }
    }

    /// XM fadeout: `fadeout / 65536` per tick, only with a volume envelope.
    pub fn from_xm(fadeout: u16) -> Self {
        Self {
            mode: FadeoutMode::OnlyIfVolEnvActive,
            amount: fadeout as f32 / 65536.0,
        }
    }
}

/// Pitch-pan separation: notes away from `center` are panned apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PitchPan {
    /// Center note
    pub center: u8,
    /// Separation (-32 to +32)
    pub separation: i8,
}

impl PitchPan {
    pub fn is_enabled(&self) -> bool {
        self.separation != 0
    }
}

/// Named per-voice filter reference, resolved by the engine's filter factory.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterInfo {
    pub name: ArrayString<16>,
    pub params: FilterParams,
}

impl FilterInfo {
    pub fn new(name: &str, params: FilterParams) -> Self {
        Self {
            name: truncated(name),
            params,
        }
    }
}

/// Filter construction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterParams {
    Resonant(ResonantParams),
    MovingAverage { window_size: usize },
}

/// Resonant low/high-pass parameters. `None` means not configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResonantParams {
    /// Cutoff (0-127)
    pub cutoff: Option<u8>,
    /// Resonance (0-127)
    pub resonance: Option<u8>,
    pub extended_range: bool,
    pub highpass: bool,
}

impl ResonantParams {
    /// Decode IT instrument filter bytes: bit 7 marks the value as set.
    pub fn from_it(cutoff: u8, resonance: u8) -> Self {
        Self {
            cutoff: (cutoff & 0x80 != 0).then_some(cutoff & 0x7f),
            resonance: (resonance & 0x80 != 0).then_some(resonance & 0x7f),
            extended_range: false,
            highpass: false,
        }
    }
}

/// A value an envelope can carry.
pub trait EnvelopeValue: Copy + Default + fmt::Debug + PartialEq {
    fn to_f32(self) -> f32;
}

impl EnvelopeValue for u8 {
    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl EnvelopeValue for i8 {
    fn to_f32(self) -> f32 {
        self as f32
    }
}

/// Decode a raw volume-envelope byte. Values above 64 clamp to full
/// volume, so 0xFF reads as 64 rather than wrapping negative.
pub fn volume_envelope_value(raw: u8) -> u8 {
    raw.min(64)
}

/// An envelope (volume, panning, pitch or filter).
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope<T> {
    /// Points sorted by position
    pub points: ArrayVec<EnvelopePoint<T>, MAX_ENVELOPE_POINTS>,
    /// Regular loop (tick positions)
    pub loop_settings: LoopSettings,
    /// Sustain loop (tick positions), active until release
    pub sustain: LoopSettings,
    /// Is the envelope enabled?
    pub enabled: bool,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            points: ArrayVec::new(),
            loop_settings: LoopSettings::default(),
            sustain: LoopSettings::default(),
            enabled: false,
        }
    }
}

/// A point in an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvelopePoint<T> {
    /// Tick position
    pub pos: u32,
    /// Ticks until the next point (`ENVELOPE_HOLD` on the last point)
    pub length: u32,
    /// Value
    pub y: T,
}

/// A tick/value node as stored by module formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvelopeNode<T> {
    pub tick: u16,
    pub y: T,
}

impl<T: EnvelopeValue> Envelope<T> {
    /// Build an enabled envelope from format nodes. Loop ranges are node
    /// indices and are converted to tick positions.
    pub fn from_nodes(
        nodes: &[EnvelopeNode<T>],
        loop_range: Option<(usize, usize)>,
        sustain_range: Option<(usize, usize)>,
    ) -> Result<Self, SongError> {
        if nodes.len() > MAX_ENVELOPE_POINTS {
            return Err(SongError::TooManyEnvelopePoints {
                count: nodes.len(),
                max: MAX_ENVELOPE_POINTS,
            });
        }

        let mut env = Self {
            enabled: true,
            ..Self::default()
        };
        for (i, node) in nodes.iter().enumerate() {
            let length = match nodes.get(i + 1) {
                Some(next) => u32::from(next.tick.saturating_sub(node.tick)),
                None => ENVELOPE_HOLD,
            };
            env.points.push(EnvelopePoint {
                pos: node.tick as u32,
                length,
                y: node.y,
            });
        }

        let tick_of = |index: usize| -> Result<u32, SongError> {
            nodes
                .get(index)
                .map(|n| n.tick as u32)
                .ok_or(SongError::EnvelopeIndex { index, len: nodes.len() })
        };
        if let Some((begin, end)) = loop_range {
            env.loop_settings = LoopSettings::new(LoopMode::Normal, tick_of(begin)?, tick_of(end)?);
        }
        if let Some((begin, end)) = sustain_range {
            env.sustain = LoopSettings::new(LoopMode::Normal, tick_of(begin)?, tick_of(end)?);
        }
        Ok(env)
    }

    /// Position of the terminal point.
    pub fn terminal_pos(&self) -> u32 {
        self.points.last().map_or(0, |p| p.pos)
    }

    /// Interpolated value at a tick position. Before the first point the
    /// first value holds; past the terminal point the last value holds.
    pub fn value_at(&self, pos: u32) -> f32 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        let idx = self.points.iter().rposition(|p| p.pos <= pos).unwrap_or(0);
        let cur = &self.points[idx];
        if pos < first.pos {
            return first.y.to_f32();
        }
        match self.points.get(idx + 1) {
            Some(next) if cur.length != ENVELOPE_HOLD && cur.length > 0 => {
                let t = (pos - cur.pos).min(cur.length) as f32 / cur.length as f32;
                let a = cur.y.to_f32();
                a + (next.y.to_f32() - a) * t
            }
            _ => cur.y.to_f32(),
        }
    }
}
