//! Song data lookup errors.

use thiserror::Error;

/// Errors raised while querying or converting song data.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SongError {
    #[error("order {order} out of range (order list has {len} entries)")]
    OrderOutOfRange { order: usize, len: usize },
    #[error("order {order} does not reference a pattern")]
    NotAPattern { order: usize },
    #[error("pattern {pattern} out of range ({len} patterns)")]
    PatternOutOfRange { pattern: usize, len: usize },
    #[error("row {row} out of range (pattern has {rows} rows)")]
    RowOutOfRange { row: u16, rows: u16 },
    #[error("channel {channel} out of range ({channels} channels)")]
    ChannelOutOfRange { channel: usize, channels: usize },
    #[error("envelope node index {index} out of range ({len} nodes)")]
    EnvelopeIndex { index: usize, len: usize },
    #[error("envelope has {count} nodes, at most {max} supported")]
    TooManyEnvelopePoints { count: usize, max: usize },
}
