//! tickplay - a tick-driven tracker module playback core.
//!
//! Re-exports the song IR ([`ir`]) and the playback engine ([`engine`]),
//! plus a small helper for rendering a song to interleaved samples.

pub use tp_engine as engine;
pub use tp_ir as ir;

pub use tp_engine::{load, EngineError, MachineSettings, Playback, Sampler, TickOutcome};
pub use tp_ir::{Song, SongData};

/// Render up to `max_ticks` ticks as interleaved samples, stopping early
/// when the song ends.
pub fn render_interleaved(
    playback: &mut dyn Playback,
    sampler: &Sampler,
    max_ticks: usize,
) -> Result<Vec<f32>, EngineError> {
    let channels = sampler.output_channels;
    let mut out = Vec::new();
    for _ in 0..max_ticks {
        let premix = match playback.tick(sampler)? {
            TickOutcome::Premix(p) => p,
            TickOutcome::SongEnded => break,
        };
        let mixed = premix.mixdown(channels);
        out.reserve(mixed.frames() * channels as usize);
        for frame in 0..mixed.frames() {
            for ch in 0..channels {
                out.push(mixed.channel(ch)[frame]);
            }
        }
    }
    Ok(out)
}
