//! The scheduler: drives channels through orders, rows and ticks and
//! hands back one premix per tick.

use alloc::boxed::Box;
use alloc::vec::Vec;

use tp_ir::{Song, SongData, SongError};

use crate::channel::Channel;
use crate::component::Vol0Settings;
use crate::effect::{BasicEffects, EffectFactory};
use crate::error::EngineError;
use crate::filter::FilterFactory;
use crate::period::{AmigaPeriod, LinearPeriod, Period};
use crate::sampler::{PremixData, Sampler};
use crate::ticker::{Ticker, TickerEvent, Transport};

/// Most hooks one quantum can fire: row end, order end, order start, row
/// start and the tick itself.
pub const MAX_EVENTS_PER_TICK: usize = 8;

/// Engine knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MachineSettings {
    /// Wrap to the song's restart order when the order list runs out
    pub song_loop: bool,
    pub vol0: Vol0Settings,
    pub start_order: usize,
    pub start_row: u16,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            song_loop: false,
            vol0: Vol0Settings::default(),
            start_order: 0,
            start_row: 0,
        }
    }
}

/// Result of one [`Machine::tick`].
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    Premix(PremixData),
    /// The order list ran out and the song does not loop.
    SongEnded,
}

/// Ticker state after a quantum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerStatus {
    Continue,
    SongEnded,
}

/// Playback state machine for one song, specialized on a period family.
pub struct Machine<P: Period> {
    song: Song,
    settings: MachineSettings,
    channels: Vec<Channel<P>>,
    transport: Transport,
    ticker: Ticker,
    filters: FilterFactory,
    effects: Box<dyn EffectFactory<P>>,
    events: heapless::Vec<TickerEvent, MAX_EVENTS_PER_TICK>,
    current_tick: u32,
    age: u64,
    finished: bool,
}

impl<P: Period> Machine<P> {
    /// A machine playing `song` with the shared effect set.
    pub fn new(song: Song, settings: MachineSettings) -> Self {
        Self::with_effects(song, settings, Box::new(BasicEffects))
    }

    pub fn with_effects(song: Song, settings: MachineSettings, effects: Box<dyn EffectFactory<P>>) -> Self {
        let channels = song
            .channels
            .iter()
            .enumerate()
            .map(|(i, s)| Channel::new(i, s, settings.vol0))
            .collect();
        let mut transport = Transport::from_song(&song);
        let mut ticker = Ticker::new(settings.song_loop);
        ticker.seek(&mut transport, settings.start_order, settings.start_row);
        Self {
            song,
            settings,
            channels,
            transport,
            ticker,
            filters: FilterFactory::default(),
            effects,
            events: heapless::Vec::new(),
            current_tick: 0,
            age: 0,
            finished: false,
        }
    }

    /// Replace the filter registry used at voice setup.
    pub fn with_filters(mut self, filters: FilterFactory) -> Self {
        self.filters = filters;
        self
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn channels(&self) -> &[Channel<P>] {
        &self.channels
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut Channel<P>> {
        self.channels.get_mut(index)
    }

    /// Ticks rendered so far.
    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Hooks fired by the last quantum, in order.
    pub fn last_events(&self) -> &[TickerEvent] {
        &self.events
    }

    pub fn status(&self) -> TickerStatus {
        if self.finished {
            TickerStatus::SongEnded
        } else {
            TickerStatus::Continue
        }
    }

    /// Voices alive across every channel.
    pub fn active_voices(&self) -> usize {
        self.channels.iter().map(|c| c.active_voices()).sum()
    }

    /// Advance playback by one tick.
    pub fn tick(&mut self, sampler: &Sampler) -> Result<TickOutcome, EngineError> {
        if sampler.sample_rate == 0 || sampler.output_channels == 0 {
            return Err(EngineError::InvalidSampler);
        }
        self.events.clear();
        if self.finished {
            return Ok(TickOutcome::SongEnded);
        }

        self.note_actions(sampler)?;
        let premix = self.render(sampler);
        self.advance_ticker()?;
        self.age += 1;
        Ok(TickOutcome::Premix(premix))
    }

    fn note_actions(&mut self, sampler: &Sampler) -> Result<(), EngineError> {
        let Self {
            song,
            channels,
            filters,
            current_tick,
            ..
        } = self;
        song.for_each_channel::<EngineError, _>(true, |ch| {
            channel_at(channels, ch)?.do_note_action(song, filters, sampler, *current_tick)?;
            Ok(true)
        })
    }

    fn render(&mut self, sampler: &Sampler) -> PremixData {
        let frames = sampler.samples_per_tick(self.transport.tempo());
        let data = self
            .channels
            .iter_mut()
            .map(|c| c.render(&self.song, sampler, frames))
            .collect();
        PremixData {
            samples_len: frames,
            data,
            mix_volume: self.song.mixing_volume * self.transport.global_volume(),
        }
    }

    /// Step the ticker up to and including the next tick, firing hooks.
    fn advance_ticker(&mut self) -> Result<TickerStatus, EngineError> {
        loop {
            let event = self.ticker.step(&self.song, &mut self.transport)?;
            if self.events.push(event).is_err() {
                tracing::warn!(?event, "quantum event list full");
            }
            match event {
                TickerEvent::OrderStart { order } => {
                    tracing::trace!(order, "order start");
                    self.each_channel(|c, _| {
                        c.order_start();
                        Ok(())
                    })?;
                }
                TickerEvent::RowStart { order, row } => self.row_start(order, row)?,
                TickerEvent::Tick(tick) => {
                    self.current_tick = tick;
                    self.each_channel(|c, t| c.tick(t, tick))?;
                    return Ok(TickerStatus::Continue);
                }
                TickerEvent::RowEnd => {
                    self.each_channel(|c, _| {
                        c.row_end();
                        Ok(())
                    })?;
                }
                TickerEvent::OrderEnd => {}
                TickerEvent::SongEnded => {
                    self.finished = true;
                    tracing::debug!(age = self.age, "song ended");
                    return Ok(TickerStatus::SongEnded);
                }
            }
        }
    }

    fn row_start(&mut self, order: usize, row: u16) -> Result<(), EngineError> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let text = self.song.render_row(order, row)?;
            tracing::trace!(order, row, "{}", text);
        }

        let Self {
            song,
            channels,
            effects,
            ..
        } = self;
        let cells = song.row(order, row)?;
        song.for_each_channel::<EngineError, _>(true, |ch| {
            let cell = cells.get(ch).copied().unwrap_or_default();
            channel_at(channels, ch)?.set_row(&cell, &**effects);
            Ok(true)
        })?;

        self.each_channel(|c, t| c.pre_start(t))?;
        self.each_channel(|c, t| c.start(t))
    }

    /// Run `f` on every enabled channel, in order.
    fn each_channel<F>(&mut self, mut f: F) -> Result<(), EngineError>
    where
        F: FnMut(&mut Channel<P>, &mut Transport) -> Result<(), EngineError>,
    {
        let Self {
            song,
            channels,
            transport,
            ..
        } = self;
        song.for_each_channel::<EngineError, _>(true, |ch| {
            f(channel_at(channels, ch)?, transport)?;
            Ok(true)
        })
    }
}

fn channel_at<P: Period>(channels: &mut [Channel<P>], ch: usize) -> Result<&mut Channel<P>, EngineError> {
    let count = channels.len();
    channels.get_mut(ch).ok_or_else(|| {
        SongError::ChannelOutOfRange {
            channel: ch,
            channels: count,
        }
        .into()
    })
}

/// A machine with its period family erased.
pub trait Playback: Send {
    fn tick(&mut self, sampler: &Sampler) -> Result<TickOutcome, EngineError>;
    fn age(&self) -> u64;
    fn is_finished(&self) -> bool;
    /// Order, row and tick of the last rendered tick.
    fn position(&self) -> (usize, u16, u32);
    fn active_voices(&self) -> usize;
}

impl<P: Period> Playback for Machine<P> {
    fn tick(&mut self, sampler: &Sampler) -> Result<TickOutcome, EngineError> {
        Machine::tick(self, sampler)
    }

    fn age(&self) -> u64 {
        self.age
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn position(&self) -> (usize, u16, u32) {
        (self.transport.order(), self.transport.row(), self.current_tick)
    }

    fn active_voices(&self) -> usize {
        Machine::active_voices(self)
    }
}

/// Build a machine for `song`, picking linear or Amiga periods from the
/// song header.
pub fn load(song: Song, settings: MachineSettings) -> Box<dyn Playback> {
    if song.linear_slides {
        Box::new(Machine::<LinearPeriod>::new(song, settings))
    } else {
        Box::new(Machine::<AmigaPeriod>::new(song, settings))
    }
}
