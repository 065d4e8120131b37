//! Order/row/tick counters and the state machine that walks them.

use tp_ir::{OrderEntry, Song, SongData};

use crate::error::EngineError;

/// Playback position and timing that effects may change at runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct Transport {
    speed: u8,
    tempo: u16,
    global_volume: f32,
    pattern_delay: u8,
    next_order: Option<usize>,
    next_row: Option<u16>,
    loop_row: Option<u16>,
    order: usize,
    row: u16,
    tick: u32,
}

impl Transport {
    pub fn new(speed: u8, tempo: u16, global_volume: f32) -> Self {
        Self {
            speed: speed.max(1),
            tempo: tempo.max(1),
            global_volume: global_volume.clamp(0.0, 1.0),
            pattern_delay: 0,
            next_order: None,
            next_row: None,
            loop_row: None,
            order: 0,
            row: 0,
            tick: 0,
        }
    }

    pub fn from_song(song: &Song) -> Self {
        Self::new(song.initial_speed, song.initial_tempo as u16, song.global_volume as f32 / 128.0)
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Ticks per row.
    pub fn set_speed(&mut self, speed: u8) -> Result<(), EngineError> {
        if speed == 0 {
            return Err(EngineError::InvalidSpeed);
        }
        self.speed = speed;
        Ok(())
    }

    pub fn tempo(&self) -> u16 {
        self.tempo
    }

    /// Tick length is 2.5 / tempo seconds.
    pub fn set_tempo(&mut self, tempo: u16) -> Result<(), EngineError> {
        if tempo == 0 {
            return Err(EngineError::InvalidTempo);
        }
        self.tempo = tempo;
        Ok(())
    }

    pub fn global_volume(&self) -> f32 {
        self.global_volume
    }

    pub fn set_global_volume(&mut self, volume: f32) {
        self.global_volume = volume.clamp(0.0, 1.0);
    }

    pub fn pattern_delay(&self) -> u8 {
        self.pattern_delay
    }

    /// Repeat the current row `delay` more times. The first request in a
    /// row wins.
    pub fn set_pattern_delay(&mut self, delay: u8) {
        if self.pattern_delay == 0 {
            self.pattern_delay = delay;
        }
    }

    /// Position jump: continue at `order` after this row.
    pub fn set_next_order(&mut self, order: usize) {
        self.next_order = Some(order);
    }

    /// Pattern break: continue at `row` of the next order after this row.
    pub fn set_next_row(&mut self, row: u16) {
        self.next_row = Some(row);
    }

    /// Pattern loop: go back to `row` of the current order after this row.
    pub fn set_pattern_loop(&mut self, row: u16) {
        self.loop_row = Some(row);
    }

    /// Ticks the current row lasts, pattern delay included.
    pub fn row_ticks(&self) -> u32 {
        self.speed as u32 * (1 + self.pattern_delay as u32)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    /// Tick within the current row.
    pub fn tick(&self) -> u32 {
        self.tick
    }
}

/// Ticker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerState {
    OrderStart,
    RowStart,
    Ticking,
    RowEnd,
    OrderEnd,
    Ended,
}

/// Hook the scheduler has to fire, in the order the ticker emits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerEvent {
    OrderStart { order: usize },
    RowStart { order: usize, row: u16 },
    Tick(u32),
    RowEnd,
    OrderEnd,
    SongEnded,
}

/// Walks orders, rows and ticks. One render quantum is every event up to
/// and including the next [`TickerEvent::Tick`].
#[derive(Clone, Debug)]
pub struct Ticker {
    state: TickerState,
    song_loop: bool,
}

impl Ticker {
    pub fn new(song_loop: bool) -> Self {
        Self {
            state: TickerState::OrderStart,
            song_loop,
        }
    }

    pub fn state(&self) -> TickerState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == TickerState::Ended
    }

    /// Point the ticker at a start position.
    pub fn seek(&mut self, transport: &mut Transport, order: usize, row: u16) {
        transport.order = order;
        transport.row = row;
        transport.tick = 0;
        self.state = TickerState::OrderStart;
    }

    /// Resolve the order cursor to a playable pattern, skipping `Skip`
    /// entries and wrapping to the restart order when looping.
    fn resolve_order<S: SongData>(&self, song: &S, restart: Option<usize>, transport: &mut Transport) -> Result<bool, EngineError> {
        let count = song.order_count();
        let mut wrapped = false;
        // every order can be visited once per wrap
        for _ in 0..=count * 2 {
            let entry = if transport.order < count {
                song.order(transport.order)?
            } else {
                OrderEntry::End
            };
            match entry {
                OrderEntry::Pattern(_) if song.rows_at(transport.order)? > 0 => {
                    if transport.row >= song.rows_at(transport.order)? {
                        transport.row = 0;
                    }
                    return Ok(true);
                }
                OrderEntry::Pattern(_) | OrderEntry::Skip => {
                    transport.order += 1;
                    transport.row = 0;
                }
                OrderEntry::End => match restart {
                    Some(order) if self.song_loop && !wrapped && order < count => {
                        tracing::debug!(order, "order list ended, restarting");
                        transport.order = order;
                        transport.row = 0;
                        wrapped = true;
                    }
                    _ => return Ok(false),
                },
            }
        }
        Ok(false)
    }

    /// Emit the next hook and move the state machine.
    pub fn step(&mut self, song: &Song, transport: &mut Transport) -> Result<TickerEvent, EngineError> {
        let event = match self.state {
            TickerState::OrderStart => {
                if self.resolve_order(song, song.restart_order, transport)? {
                    self.state = TickerState::RowStart;
                    TickerEvent::OrderStart { order: transport.order }
                } else {
                    self.state = TickerState::Ended;
                    TickerEvent::SongEnded
                }
            }
            TickerState::RowStart => {
                transport.tick = 0;
                self.state = TickerState::Ticking;
                TickerEvent::RowStart {
                    order: transport.order,
                    row: transport.row,
                }
            }
            TickerState::Ticking => {
                let tick = transport.tick;
                transport.tick += 1;
                if transport.tick >= transport.row_ticks() {
                    self.state = TickerState::RowEnd;
                }
                TickerEvent::Tick(tick)
            }
            TickerState::RowEnd => {
                self.state = self.next_row(song, transport)?;
                TickerEvent::RowEnd
            }
            TickerState::OrderEnd => {
                self.state = TickerState::OrderStart;
                TickerEvent::OrderEnd
            }
            TickerState::Ended => TickerEvent::SongEnded,
        };
        tracing::trace!(?event, state = ?self.state, "ticker");
        Ok(event)
    }

    fn next_row(&self, song: &Song, transport: &mut Transport) -> Result<TickerState, EngineError> {
        transport.pattern_delay = 0;
        if let Some(row) = transport.loop_row.take() {
            transport.next_order = None;
            transport.next_row = None;
            transport.row = row;
            return Ok(TickerState::RowStart);
        }
        match (transport.next_order.take(), transport.next_row.take()) {
            (None, None) => {}
            (order, row) => {
                let next = order.unwrap_or(transport.order + 1);
                tracing::debug!(from = transport.order, to = next, row = row.unwrap_or(0), "order jump");
                transport.order = next;
                transport.row = row.unwrap_or(0);
                return Ok(TickerState::OrderEnd);
            }
        }
        transport.row += 1;
        if transport.row >= song.rows_at(transport.order)? {
            transport.order += 1;
            transport.row = 0;
            return Ok(TickerState::OrderEnd);
        }
        Ok(TickerState::RowStart)
    }
}
