//! Shared song builders for integration tests.

#![allow(dead_code)]

use tickplay::ir::{
    Instrument, LoopMode, LoopSettings, NewNoteAction, Note, OrderEntry, Pattern, Sample, SampleData, Song,
};

/// Route engine logs through the test writer (set `RUST_LOG` to see them).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A looping square wave sample.
pub fn square_sample() -> Sample {
    let data = (0..256).map(|i| if i < 128 { 12000 } else { -12000 }).collect();
    Sample {
        data: SampleData::Mono16(data),
        loop_settings: LoopSettings::new(LoopMode::Normal, 0, 256),
        ..Sample::new("square")
    }
}

/// One-pattern song with one instrument mapped to the square sample.
pub fn song(channels: u8, rows: u16, speed: u8, nna: NewNoteAction) -> Song {
    let mut song = Song::with_channels("test", channels);
    song.initial_speed = speed;
    let key = song.add_sample(square_sample());
    let mut inst = Instrument::new("square");
    inst.set_single_sample(key);
    inst.new_note_action = nna;
    song.instruments.push(inst);
    song.patterns.push(Pattern::new(rows, channels));
    song.orders = vec![OrderEntry::Pattern(0)];
    song
}

pub fn put_note(song: &mut Song, row: u16, channel: u8, note: u8) {
    let cell = song.patterns[0].cell_mut(row, channel);
    cell.note = Note::On(note);
    cell.instrument = 1;
}
