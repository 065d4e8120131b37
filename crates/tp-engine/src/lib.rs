//! Playback engine for tickplay.
//!
//! Advances a song tick by tick: the [`Machine`] walks orders and rows,
//! channels trigger and retire voices, and each voice runs its modulators
//! and optional filter to produce one premix buffer per tick.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
pub mod component;
pub mod effect;
mod error;
pub mod filter;
mod frame;
mod machine;
pub mod period;
mod sampler;
mod ticker;
mod voice;

pub use channel::{Channel, ChannelMemory, MAX_BACKGROUND_VOICES};
pub use component::{KeyState, SampleVoicer, Voicer, Vol0Settings};
pub use effect::{BasicEffects, Effect, EffectFactory};
pub use error::EngineError;
pub use filter::{Filter, FilterFactory, MovingAverageFilter, ResonantFilter};
pub use frame::{Frame, MAX_FRAME_CHANNELS};
pub use machine::{load, Machine, MachineSettings, Playback, TickOutcome, TickerStatus, MAX_EVENTS_PER_TICK};
pub use period::{AmigaPeriod, Delta, Frequency, LinearPeriod, Period};
pub use sampler::{ChannelData, PremixData, Sampler};
pub use ticker::{Ticker, TickerEvent, TickerState, Transport};
pub use voice::{pan_gains, Voice, VoiceSetup};
