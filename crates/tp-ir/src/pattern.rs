//! Pattern and cell types for tracker sequences.

use alloc::vec::Vec;
use core::fmt;

/// A note value in a pattern cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Note {
    /// No note
    #[default]
    None,
    /// Note on (0-119, where 48 = C-4)
    On(u8),
    /// Note off / key release
    Off,
    /// Note fade (IT-specific)
    Fade,
    /// Note cut
    Cut,
}

const NOTE_NAMES: [&str; 12] = ["C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-"];

impl Note {
    /// Create a note from octave (0-9) and semitone (0-11).
    pub const fn from_octave_semitone(octave: u8, semitone: u8) -> Self {
        Note::On(octave * 12 + semitone)
    }

    /// Get the octave (0-9) if this is a note on.
    pub const fn octave(self) -> Option<u8> {
        match self {
            Note::On(n) => Some(n / 12),
            _ => None,
        }
    }

    /// Get the semitone (0-11) if this is a note on.
    pub const fn semitone(self) -> Option<u8> {
        match self {
            Note::On(n) => Some(n % 12),
            _ => None,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Note::None => f.write_str("..."),
            Note::On(n) => write!(f, "{}{}", NOTE_NAMES[(n % 12) as usize], n / 12),
            Note::Off => f.write_str("==="),
            Note::Fade => f.write_str("~~~"),
            Note::Cut => f.write_str("^^^"),
        }
    }
}

/// Raw effect column: command letter (ASCII, e.g. `b'A'`) and parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EffectData {
    pub command: u8,
    pub param: u8,
}

impl EffectData {
    pub const fn new(command: u8, param: u8) -> Self {
        Self { command, param }
    }

    /// High nibble of the parameter.
    pub const fn hi(self) -> u8 {
        self.param >> 4
    }

    /// Low nibble of the parameter.
    pub const fn lo(self) -> u8 {
        self.param & 0x0F
    }
}

impl fmt::Display for EffectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = if self.command.is_ascii_graphic() { self.command as char } else { '?' };
        write!(f, "{}{:02X}", cmd, self.param)
    }
}

/// A single cell in a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Note value
    pub note: Note,
    /// Instrument number (0 = none, 1-255 = instrument index + 1)
    pub instrument: u8,
    /// Volume column set-volume (0-64)
    pub volume: Option<u8>,
    /// Effect column command
    pub effect: Option<EffectData>,
}

impl Cell {
    /// Create an empty cell.
    pub const fn empty() -> Self {
        Self {
            note: Note::None,
            instrument: 0,
            volume: None,
            effect: None,
        }
    }

    /// Returns true if the cell is completely empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.note)?;
        if self.instrument == 0 {
            f.write_str(".. ")?;
        } else {
            write!(f, "{:02} ", self.instrument)?;
        }
        match self.volume {
            Some(v) => write!(f, "{:02} ", v)?,
            None => f.write_str(".. ")?,
        }
        match self.effect {
            Some(e) => write!(f, "{}", e),
            None => f.write_str("..."),
        }
    }
}

/// A pattern containing rows of cells across channels.
#[derive(Clone, Debug)]
pub struct Pattern {
    /// Number of rows (typically 64, can be 1-256)
    pub rows: u16,
    /// Number of channels
    pub channels: u8,
    /// Pattern data, stored row-major: data[row * channels + channel]
    pub data: Vec<Cell>,
}

impl Pattern {
    /// Create a new pattern with empty cells.
    pub fn new(rows: u16, channels: u8) -> Self {
        Self {
            rows,
            channels,
            data: alloc::vec![Cell::empty(); rows as usize * channels as usize],
        }
    }

    /// Get a reference to a cell.
    pub fn cell(&self, row: u16, channel: u8) -> &Cell {
        debug_assert!(row < self.rows);
        debug_assert!(channel < self.channels);
        &self.data[row as usize * self.channels as usize + channel as usize]
    }

    /// Get a mutable reference to a cell.
    pub fn cell_mut(&mut self, row: u16, channel: u8) -> &mut Cell {
        debug_assert!(row < self.rows);
        debug_assert!(channel < self.channels);
        &mut self.data[row as usize * self.channels as usize + channel as usize]
    }

    /// All cells in a row, or `None` past the last row.
    pub fn row(&self, row: u16) -> Option<&[Cell]> {
        if row >= self.rows {
            return None;
        }
        let start = row as usize * self.channels as usize;
        self.data.get(start..start + self.channels as usize)
    }
}
