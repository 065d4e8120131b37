//! Effects shared by every format: timing, order flow, global volume,
//! tone portamento, vibrato and the note-control `S` commands.

use alloc::boxed::Box;

use tp_ir::{EffectData, NewNoteAction, VibratoWaveform};

use super::{Effect, EffectFactory};
use crate::channel::Channel;
use crate::error::EngineError;
use crate::period::{Delta, Period};
use crate::ticker::Transport;

/// Lowest tempo a `T` slide can reach.
const MIN_TEMPO: u16 = 32;
/// Highest tempo a `T` slide can reach.
const MAX_TEMPO: u16 = 255;
/// Period units per tone portamento speed step.
const PORTA_SCALE: i32 = 4;
/// Peak period offset per vibrato depth step. `U` is four times finer.
const VIBRATO_SCALE: Delta = 4.0;

/// Factory for the shared effect set, keyed by IT-style command letters.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicEffects;

impl<P: Period> EffectFactory<P> for BasicEffects {
    fn create(&self, data: EffectData) -> Option<Box<dyn Effect<P>>> {
        let param = data.param;
        let effect: Box<dyn Effect<P>> = match data.command {
            b'A' => Box::new(SetSpeed(param)),
            b'B' => Box::new(PositionJump(param)),
            b'C' => Box::new(PatternBreak(param)),
            b'G' => Box::new(TonePorta(param)),
            b'H' => Box::new(Vibrato::new(data, VIBRATO_SCALE)),
            b'U' => Box::new(Vibrato::new(data, VIBRATO_SCALE / 4.0)),
            b'T' => Box::new(Tempo(param)),
            b'V' => Box::new(GlobalVolume(param)),
            b'S' => {
                let x = data.lo();
                match data.hi() {
                    0x3 => Box::new(VibratoWaveformSelect(x)),
                    0x7 => Box::new(NoteActionControl(x)),
                    0xB => Box::new(PatternLoop(x)),
                    0xC => Box::new(NoteCut(x)),
                    0xD => Box::new(NoteDelay(x)),
                    0xE => Box::new(PatternDelay(x)),
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(effect)
    }
}

/// `Axx`: ticks per row.
#[derive(Debug)]
struct SetSpeed(u8);

impl<P: Period> Effect<P> for SetSpeed {
    fn pre_start(&mut self, _channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        if self.0 > 0 {
            transport.set_speed(self.0)?;
        }
        Ok(())
    }
}

/// `Bxx`: continue at order `xx` after this row.
#[derive(Debug)]
struct PositionJump(u8);

impl<P: Period> Effect<P> for PositionJump {
    fn pre_start(&mut self, _channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        transport.set_next_order(self.0 as usize);
        Ok(())
    }
}

/// `Cxx`: continue at row `xx` of the next order.
#[derive(Debug)]
struct PatternBreak(u8);

impl<P: Period> Effect<P> for PatternBreak {
    fn pre_start(&mut self, _channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        transport.set_next_row(self.0 as u16);
        Ok(())
    }
}

/// `Txx`: set tempo (`xx` >= 0x20), or slide it down (`T0x`) or up (`T1x`)
/// on every tick but the first.
#[derive(Debug)]
struct Tempo(u8);

impl<P: Period> Effect<P> for Tempo {
    fn pre_start(&mut self, _channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        if self.0 >= 0x20 {
            transport.set_tempo(self.0 as u16)?;
        }
        Ok(())
    }

    fn tick(&mut self, _channel: &mut Channel<P>, transport: &mut Transport, tick: u32) -> Result<(), EngineError> {
        if tick == 0 || self.0 >= 0x20 {
            return Ok(());
        }
        let amount = (self.0 & 0x0f) as u16;
        let tempo = if self.0 >> 4 == 0 {
            transport.tempo().saturating_sub(amount).max(MIN_TEMPO)
        } else {
            (transport.tempo() + amount).min(MAX_TEMPO)
        };
        transport.set_tempo(tempo)
    }
}

/// `Vxx`: global volume, 0x80 is full.
#[derive(Debug)]
struct GlobalVolume(u8);

impl<P: Period> Effect<P> for GlobalVolume {
    fn start(&mut self, _channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        transport.set_global_volume(self.0.min(0x80) as f32 / 128.0);
        Ok(())
    }
}

/// `Gxx`: slide toward the row's note instead of retriggering. `G00`
/// reuses the last speed.
#[derive(Debug)]
struct TonePorta(u8);

impl<P: Period> Effect<P> for TonePorta {
    fn start(&mut self, channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        if self.0 != 0 {
            channel.memory_mut().porta_speed = self.0;
        }
        channel.cancel_note_trigger();
        Ok(())
    }

    fn tick(&mut self, channel: &mut Channel<P>, _transport: &mut Transport, tick: u32) -> Result<(), EngineError> {
        if tick != 0 {
            let speed = channel.memory().porta_speed as i32;
            channel.porta_toward_target(speed * PORTA_SCALE);
        }
        Ok(())
    }
}

/// `Hxy`/`Uxy`: vibrato at speed `x` and depth `y`. A zero nibble reuses
/// the channel's last value.
#[derive(Debug)]
struct Vibrato {
    speed: u8,
    depth: u8,
    scale: Delta,
}

impl Vibrato {
    fn new(data: EffectData, scale: Delta) -> Self {
        Self {
            speed: data.hi(),
            depth: data.lo(),
            scale,
        }
    }
}

impl<P: Period> Effect<P> for Vibrato {
    fn start(&mut self, channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        let memory = channel.memory_mut();
        if self.speed != 0 {
            memory.vibrato_speed = self.speed;
        }
        if self.depth != 0 {
            memory.vibrato_depth = self.depth;
        }
        Ok(())
    }

    fn tick(&mut self, channel: &mut Channel<P>, _transport: &mut Transport, tick: u32) -> Result<(), EngineError> {
        if tick == 0 {
            return Ok(());
        }
        let memory = channel.memory_mut();
        let delta = memory.vibrato.value() as Delta * memory.vibrato_depth as Delta * self.scale;
        let speed = memory.vibrato_speed;
        memory.vibrato.advance(speed);
        channel.set_period_delta(delta);
        Ok(())
    }
}

/// `S3x`: vibrato waveform.
#[derive(Debug)]
struct VibratoWaveformSelect(u8);

impl<P: Period> Effect<P> for VibratoWaveformSelect {
    fn start(&mut self, channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        let waveform = match self.0 & 0x3 {
            0 => VibratoWaveform::Sine,
            1 => VibratoWaveform::Sawtooth,
            2 => VibratoWaveform::Square,
            _ => VibratoWaveform::Random,
        };
        channel.memory_mut().vibrato.set_waveform(waveform);
        Ok(())
    }
}

/// `S70..S72` act on background voices, `S73..S76` override the
/// new-note action of the current voice.
#[derive(Debug)]
struct NoteActionControl(u8);

impl<P: Period> Effect<P> for NoteActionControl {
    fn start(&mut self, channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        match self.0 {
            0 => channel.past_note_action(NewNoteAction::Cut),
            1 => channel.past_note_action(NewNoteAction::Release),
            2 => channel.past_note_action(NewNoteAction::Fadeout),
            3 => channel.set_new_note_action(NewNoteAction::Cut),
            4 => channel.set_new_note_action(NewNoteAction::Continue),
            5 => channel.set_new_note_action(NewNoteAction::Release),
            6 => channel.set_new_note_action(NewNoteAction::Fadeout),
            _ => {}
        }
        Ok(())
    }
}

/// `SB0` marks the loop start, `SBx` plays back to it `x` times.
#[derive(Debug)]
struct PatternLoop(u8);

impl<P: Period> Effect<P> for PatternLoop {
    fn start(&mut self, channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        let memory = channel.memory_mut();
        if self.0 == 0 {
            memory.loop_start = transport.row();
            return Ok(());
        }
        if memory.loop_count == 0 {
            memory.loop_count = self.0;
        } else {
            memory.loop_count -= 1;
            if memory.loop_count == 0 {
                return Ok(());
            }
        }
        transport.set_pattern_loop(memory.loop_start);
        Ok(())
    }
}

/// `SCx`: cut the note on tick `x` (`SC0` behaves as `SC1`).
#[derive(Debug)]
struct NoteCut(u8);

impl<P: Period> Effect<P> for NoteCut {
    fn tick(&mut self, channel: &mut Channel<P>, _transport: &mut Transport, tick: u32) -> Result<(), EngineError> {
        if tick == self.0.max(1) as u32 {
            channel.note_cut();
        }
        Ok(())
    }
}

/// `SDx`: hold the row's note back `x` ticks.
#[derive(Debug)]
struct NoteDelay(u8);

impl<P: Period> Effect<P> for NoteDelay {
    fn start(&mut self, channel: &mut Channel<P>, _transport: &mut Transport) -> Result<(), EngineError> {
        channel.delay_note(self.0 as u32);
        Ok(())
    }
}

/// `SEx`: repeat the row `x` more times.
#[derive(Debug)]
struct PatternDelay(u8);

impl<P: Period> Effect<P> for PatternDelay {
    fn pre_start(&mut self, _channel: &mut Channel<P>, transport: &mut Transport) -> Result<(), EngineError> {
        transport.set_pattern_delay(self.0);
        Ok(())
    }
}
