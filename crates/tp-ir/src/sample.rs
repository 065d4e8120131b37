//! Sample data types.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::song::truncated;

slotmap::new_key_type! {
    /// Key for referencing samples in the song's sample bank.
    pub struct SampleKey;
}

/// A sample definition.
#[derive(Clone, Debug)]
pub struct Sample {
    /// Sample name
    pub name: ArrayString<26>,
    /// Audio data
    pub data: SampleData,
    /// Regular loop
    pub loop_settings: LoopSettings,
    /// Sustain loop, active until the key is released
    pub sustain_loop: LoopSettings,
    /// Default volume (0-64)
    pub default_volume: u8,
    /// Default panning (-64 to +64, 0 = center), if the sample overrides it
    pub default_pan: Option<i8>,
    /// Sample global volume (0.0-1.0)
    pub global_volume: f32,
    /// Frequency of C-4 in Hz (typically 8363)
    pub c4_speed: u32,
    /// Finetune in 1/64 semitone steps
    pub finetune: i16,
    /// Auto-vibrato settings
    pub vibrato: AutoVibrato,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: ArrayString::new(),
            data: SampleData::Mono8(Vec::new()),
            loop_settings: LoopSettings::default(),
            sustain_loop: LoopSettings::default(),
            default_volume: 64,
            default_pan: None,
            global_volume: 1.0,
            c4_speed: 8363,
            finetune: 0,
            vibrato: AutoVibrato::default(),
        }
    }
}

impl Sample {
    /// Create a new empty sample.
    pub fn new(name: &str) -> Self {
        Self {
            name: truncated(name),
            ..Self::default()
        }
    }

    /// Get the length of the sample in frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sample has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if the sample has a usable regular loop.
    pub fn has_loop(&self) -> bool {
        self.loop_settings.is_enabled()
    }
}

/// Sample audio data.
#[derive(Clone, Debug)]
pub enum SampleData {
    /// 8-bit mono samples
    Mono8(Vec<i8>),
    /// 16-bit mono samples
    Mono16(Vec<i16>),
    /// 8-bit stereo samples (left, right)
    Stereo8(Vec<i8>, Vec<i8>),
    /// 16-bit stereo samples (left, right)
    Stereo16(Vec<i16>, Vec<i16>),
}

impl SampleData {
    /// Get the number of sample frames.
    pub fn len(&self) -> usize {
        match self {
            SampleData::Mono8(v) => v.len(),
            SampleData::Mono16(v) => v.len(),
            SampleData::Stereo8(l, _) => l.len(),
            SampleData::Stereo16(l, _) => l.len(),
        }
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of channels in the sample data.
    pub fn num_channels(&self) -> u16 {
        match self {
            SampleData::Mono8(_) | SampleData::Mono16(_) => 1,
            SampleData::Stereo8(_, _) | SampleData::Stereo16(_, _) => 2,
        }
    }

    /// Read one sample as f32 in [-1.0, 1.0). Out-of-range reads yield 0.
    /// Mono data answers every channel with its single plane.
    pub fn read_f32(&self, ch: u16, frame: usize) -> f32 {
        let raw = match self {
            SampleData::Mono8(v) => v.get(frame).map(|&s| s as i16 * 256),
            SampleData::Mono16(v) => v.get(frame).copied(),
            SampleData::Stereo8(l, r) => {
                let plane = if ch == 0 { l } else { r };
                plane.get(frame).map(|&s| s as i16 * 256)
            }
            SampleData::Stereo16(l, r) => {
                let plane = if ch == 0 { l } else { r };
                plane.get(frame).copied()
            }
        };
        raw.unwrap_or(0) as f32 / 32768.0
    }

    /// Linearly interpolated read at a fractional frame position.
    /// `next` is the frame blended toward (loop-aware callers pass the
    /// loop start when wrapping); `None` blends toward silence.
    pub fn read_interpolated(&self, ch: u16, pos: f64, next: Option<usize>) -> f32 {
        if pos < 0.0 {
            return 0.0;
        }
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = self.read_f32(ch, idx);
        let b = next.map_or(0.0, |n| self.read_f32(ch, n));
        a + (b - a) * frac
    }
}

/// How a loop region repeats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// No loop
    #[default]
    Disabled,
    /// Forward loop: wrap from end back to begin
    Normal,
    /// Ping-pong (bidirectional) loop
    PingPong,
}

/// A loop region. Used for sample loops (frame positions) and envelope
/// loops (tick positions).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopSettings {
    pub mode: LoopMode,
    pub begin: u32,
    pub end: u32,
}

impl LoopSettings {
    pub const fn new(mode: LoopMode, begin: u32, end: u32) -> Self {
        Self { mode, begin, end }
    }

    /// True when the loop repeats and covers a valid region.
    pub fn is_enabled(&self) -> bool {
        self.mode != LoopMode::Disabled && self.end >= self.begin
    }

    /// Loop length in positions (inclusive region `begin..=end` for
    /// envelopes, `begin..end` for samples; callers pick the convention).
    pub fn length(&self) -> u32 {
        self.end.saturating_sub(self.begin)
    }
}

/// Auto-vibrato waveform selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VibratoWaveform {
    #[default]
    Sine,
    /// Ramp down
    Sawtooth,
    Square,
    Random,
    /// Ramp up
    InverseSawtooth,
}

/// Auto-vibrato settings for a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AutoVibrato {
    /// Phase advance per tick (64 steps per cycle)
    pub speed: u8,
    /// Peak pitch deviation in finetune units
    pub depth: f32,
    /// Ticks to ramp from zero to full depth (0 = immediate)
    pub sweep: u16,
    /// Waveform type
    pub waveform: VibratoWaveform,
}

impl AutoVibrato {
    /// Auto-vibrato only runs when it can move the pitch.
    pub fn is_enabled(&self) -> bool {
        self.depth != 0.0 && self.speed != 0
    }
}
