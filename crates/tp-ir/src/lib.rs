//! Song data IR for the tickplay playback core.
//!
//! Module loaders produce these types; the engine consumes them through
//! the [`SongData`] contract and the instrument/sample tables.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_buffer;
mod error;
mod instrument;
mod pattern;
mod sample;
pub mod song;

pub use audio_buffer::{AudioBuffer, MAX_CHANNELS};
pub use error::SongError;
pub use instrument::{
    volume_envelope_value, AdlibPatch, Envelope, EnvelopeNode, EnvelopePoint, EnvelopeValue,
    FadeoutMode, FadeoutSettings, FilterInfo, FilterParams, Instrument, InstrumentKind,
    KeyMapping, NewNoteAction, PitchPan, ResonantParams, ENVELOPE_HOLD, MAX_ENVELOPE_POINTS,
    NUM_NOTES,
};
pub use pattern::{Cell, EffectData, Note, Pattern};
pub use sample::{AutoVibrato, LoopMode, LoopSettings, Sample, SampleData, SampleKey, VibratoWaveform};
pub use song::{ChannelSettings, OrderEntry, Song, SongData};
