//! Song structure, order list and the song data query contract.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use arrayvec::ArrayString;
use slotmap::SlotMap;

use crate::error::SongError;
use crate::instrument::Instrument;
use crate::pattern::{Cell, Pattern};
use crate::sample::{Sample, SampleKey};

/// A complete song.
#[derive(Clone, Debug)]
pub struct Song {
    /// Song title
    pub title: ArrayString<32>,
    /// Initial tempo in BPM (32-255 typical)
    pub initial_tempo: u8,
    /// Initial speed (ticks per row, 1-31)
    pub initial_speed: u8,
    /// Global volume (0-128)
    pub global_volume: u8,
    /// Final mix gain applied by the output stage
    pub mixing_volume: f32,
    /// Linear frequency slides instead of Amiga periods
    pub linear_slides: bool,
    /// Order to jump to when the order list runs out, if the song loops
    pub restart_order: Option<usize>,
    /// Instruments (cells reference them 1-based)
    pub instruments: Vec<Instrument>,
    /// Sample bank
    pub samples: SlotMap<SampleKey, Sample>,
    /// Per-channel settings
    pub channels: Vec<ChannelSettings>,
    /// Patterns
    pub patterns: Vec<Pattern>,
    /// Order list
    pub orders: Vec<OrderEntry>,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: ArrayString::new(),
            initial_tempo: 125,
            initial_speed: 6,
            global_volume: 128,
            mixing_volume: 0.5,
            linear_slides: false,
            restart_order: None,
            instruments: Vec::new(),
            samples: SlotMap::with_key(),
            channels: Vec::new(),
            patterns: Vec::new(),
            orders: Vec::new(),
        }
    }
}

impl Song {
    /// Create a new empty song.
    pub fn new(title: &str) -> Self {
        Self {
            title: truncated(title),
            ..Self::default()
        }
    }

    /// Create a song with a given number of channels.
    /// Panning follows the classic Amiga L R R L layout.
    pub fn with_channels(title: &str, num_channels: u8) -> Self {
        let mut song = Self::new(title);
        for i in 0..num_channels {
            song.channels.push(ChannelSettings {
                initial_pan: if i % 4 == 0 || i % 4 == 3 { -32 } else { 32 },
                ..ChannelSettings::default()
            });
        }
        song
    }

    /// Add a sample to the bank.
    pub fn add_sample(&mut self, sample: Sample) -> SampleKey {
        self.samples.insert(sample)
    }

    /// Instrument for a 1-based cell instrument number.
    pub fn instrument(&self, number: u8) -> Option<&Instrument> {
        (number as usize).checked_sub(1).and_then(|i| self.instruments.get(i))
    }

    /// Pattern referenced by an order slot.
    pub fn pattern_at(&self, order: usize) -> Result<&Pattern, SongError> {
        match self.order(order)? {
            OrderEntry::Pattern(p) => self.patterns.get(p as usize).ok_or(SongError::PatternOutOfRange {
                pattern: p as usize,
                len: self.patterns.len(),
            }),
            OrderEntry::Skip | OrderEntry::End => Err(SongError::NotAPattern { order }),
        }
    }
}

/// `text` cut to at most `N` bytes, on a char boundary.
pub(crate) fn truncated<const N: usize>(text: &str) -> ArrayString<N> {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    ArrayString::from(&text[..end]).unwrap_or_default()
}

/// An entry in the order list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderEntry {
    /// Play pattern with this index
    Pattern(u8),
    /// Skip marker (+++), continue to next
    Skip,
    /// End of song marker (---)
    End,
}

/// Per-channel settings.
#[derive(Clone, Copy, Debug)]
pub struct ChannelSettings {
    /// Initial panning (-64 to +64, 0 = center)
    pub initial_pan: i8,
    /// Stereo playback; when false, voices keep their initial pan
    pub pan_enabled: bool,
    /// Initial volume (0-64)
    pub initial_vol: u8,
    /// Is the channel muted?
    pub muted: bool,
    /// Disabled channels are skipped by playback entirely
    pub enabled: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            initial_pan: 0,
            pan_enabled: true,
            initial_vol: 64,
            muted: false,
            enabled: true,
        }
    }
}

/// Read-only queries the playback engine makes against song data.
pub trait SongData {
    /// Number of channels.
    fn num_channels(&self) -> usize;

    /// Visit channel indices in order, optionally only enabled ones.
    /// The visitor returns `Ok(false)` to stop early.
    fn for_each_channel<E, F>(&self, enabled_only: bool, f: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<bool, E>;

    /// Number of entries in the order list.
    fn order_count(&self) -> usize;

    /// Order list entry.
    fn order(&self, order: usize) -> Result<OrderEntry, SongError>;

    /// Number of rows in the pattern an order slot references.
    fn rows_at(&self, order: usize) -> Result<u16, SongError>;

    /// Cells of one row.
    fn row(&self, order: usize, row: u16) -> Result<&[Cell], SongError>;

    /// Row as human-readable text, one column group per channel.
    fn render_row(&self, order: usize, row: u16) -> Result<String, SongError>;
}

impl SongData for Song {
    fn num_channels(&self) -> usize {
        self.channels.len()
    }

    fn for_each_channel<E, F>(&self, enabled_only: bool, mut f: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<bool, E>,
    {
        for (i, settings) in self.channels.iter().enumerate() {
            if enabled_only && !settings.enabled {
                continue;
            }
            if !f(i)? {
                break;
            }
        }
        Ok(())
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn order(&self, order: usize) -> Result<OrderEntry, SongError> {
        self.orders.get(order).copied().ok_or(SongError::OrderOutOfRange {
            order,
            len: self.orders.len(),
        })
    }

    fn rows_at(&self, order: usize) -> Result<u16, SongError> {
        Ok(self.pattern_at(order)?.rows)
    }

    fn row(&self, order: usize, row: u16) -> Result<&[Cell], SongError> {
        let pattern = self.pattern_at(order)?;
        pattern.row(row).ok_or(SongError::RowOutOfRange {
            row,
            rows: pattern.rows,
        })
    }

    fn render_row(&self, order: usize, row: u16) -> Result<String, SongError> {
        let cells = self.row(order, row)?;
        let mut text = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                text.push_str(" | ");
            }
            let _ = write!(text, "{}", cell);
        }
        Ok(text)
    }
}
