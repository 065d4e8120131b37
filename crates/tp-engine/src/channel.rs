//! Channel state for tracker playback.

use alloc::boxed::Box;
use core::cmp::Ordering;

use tp_ir::{AudioBuffer, Cell, ChannelSettings, NewNoteAction, Note, Song};

use crate::component::{Oscillator, Vol0Settings};
use crate::effect::{Effect, EffectFactory};
use crate::error::EngineError;
use crate::filter::FilterFactory;
use crate::period::{Delta, Frequency, Period};
use crate::sampler::{ChannelData, Sampler};
use crate::ticker::Transport;
use crate::voice::{Voice, VoiceSetup};

/// Ringing voices a channel keeps behind its foreground voice.
pub const MAX_BACKGROUND_VOICES: usize = 16;

/// Running per-channel state that outlives a single row.
#[derive(Clone, Debug, Default)]
pub struct ChannelMemory {
    /// Last non-zero tone portamento speed
    pub porta_speed: u8,
    /// Vibrato LFO, restarted by every new note
    pub vibrato: Oscillator,
    /// Last non-zero vibrato speed
    pub vibrato_speed: u8,
    /// Last non-zero vibrato depth
    pub vibrato_depth: u8,
    /// Pattern loop start row
    pub loop_start: u16,
    /// Pattern loop repetitions left
    pub loop_count: u8,
}

/// What a cell asks the channel to do with its note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NoteEvent {
    Trigger { note: u8, instrument: u8 },
    Off,
    Fade,
    Cut,
}

/// Note work queued by the current row, fired at or after `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingNote {
    tick: u32,
    event: Option<NoteEvent>,
    volume: Option<u8>,
    porta: bool,
}

/// One playback track: a foreground voice plus ringing background voices.
#[derive(Debug)]
pub struct Channel<P: Period> {
    index: usize,
    volume: f32,
    pan: f32,
    pan_enabled: bool,
    muted: bool,
    vol0: Vol0Settings,
    voice: Option<Voice<P>>,
    background: heapless::Vec<Voice<P>, MAX_BACKGROUND_VOICES>,
    nna: NewNoteAction,
    memory: ChannelMemory,
    cell: Cell,
    effect: Option<Box<dyn Effect<P>>>,
    pending: Option<PendingNote>,
    last_instrument: u8,
    porta_target: Option<P>,
}

impl<P: Period> Channel<P> {
    pub fn new(index: usize, settings: &ChannelSettings, vol0: Vol0Settings) -> Self {
        Self {
            index,
            volume: settings.initial_vol.min(64) as f32 / 64.0,
            pan: (settings.initial_pan as f32 / 64.0).clamp(-1.0, 1.0),
            pan_enabled: settings.pan_enabled,
            muted: settings.muted,
            vol0,
            voice: None,
            background: heapless::Vec::new(),
            nna: NewNoteAction::Cut,
            memory: ChannelMemory::default(),
            cell: Cell::default(),
            effect: None,
            pending: None,
            last_instrument: 0,
            porta_target: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn voice(&self) -> Option<&Voice<P>> {
        self.voice.as_ref()
    }

    pub fn voice_mut(&mut self) -> Option<&mut Voice<P>> {
        self.voice.as_mut()
    }

    pub fn background_voices(&self) -> &[Voice<P>] {
        &self.background
    }

    /// Foreground plus background voices still alive.
    pub fn active_voices(&self) -> usize {
        self.voice.iter().filter(|v| !v.is_done()).count() + self.background.len()
    }

    pub fn memory(&self) -> &ChannelMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ChannelMemory {
        &mut self.memory
    }

    /// Cell of the current row.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn new_note_action(&self) -> NewNoteAction {
        self.nna
    }

    /// Override what happens to the current voice when the next note hits.
    pub fn set_new_note_action(&mut self, nna: NewNoteAction) {
        self.nna = nna;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        for voice in self.voice.iter_mut().chain(self.background.iter_mut()) {
            voice.set_muted(muted);
        }
    }

    /// Period the foreground voice is heading to under tone portamento.
    pub fn porta_target(&self) -> Option<P> {
        self.porta_target
    }

    /// Keep the row's note from retriggering; it becomes a portamento
    /// target instead.
    pub fn cancel_note_trigger(&mut self) {
        if let Some(pending) = &mut self.pending {
            pending.porta = true;
        }
    }

    /// Hold the row's note back until `tick`.
    pub fn delay_note(&mut self, tick: u32) {
        if let Some(pending) = &mut self.pending {
            pending.tick = tick;
        }
    }

    /// Silence the foreground voice now.
    pub fn note_cut(&mut self) {
        if let Some(voice) = &mut self.voice {
            voice.stop();
        }
    }

    /// Apply a note action to every background voice.
    pub fn past_note_action(&mut self, action: NewNoteAction) {
        for voice in self.background.iter_mut() {
            match action {
                NewNoteAction::Cut => voice.stop(),
                NewNoteAction::Continue => {}
                NewNoteAction::Release => voice.release(),
                NewNoteAction::Fadeout => voice.fadeout(),
            }
        }
    }

    /// Offset the foreground pitch by `delta` period units (positive is
    /// higher) until the row ends.
    pub fn set_period_delta(&mut self, delta: Delta) {
        if let Some(voice) = &mut self.voice {
            voice.set_period_delta(delta);
        }
    }

    /// Slide the foreground period `amount` units toward the portamento
    /// target without overshooting it.
    pub fn porta_toward_target(&mut self, amount: i32) {
        let (Some(target), Some(voice)) = (self.porta_target, &mut self.voice) else {
            return;
        };
        let current = voice.period();
        let next = match current.compare(&target) {
            Ordering::Less => {
                let p = current.add_integer(amount, P::HIGHER_PITCH_SIGN);
                if p.compare(&target) == Ordering::Less {
                    p
                } else {
                    target
                }
            }
            Ordering::Greater => {
                let p = current.add_integer(amount, -P::HIGHER_PITCH_SIGN);
                if p.compare(&target) == Ordering::Greater {
                    p
                } else {
                    target
                }
            }
            Ordering::Equal => target,
        };
        voice.set_period(next);
    }

    /// Load a new row: remember the cell, build its effect, queue its note.
    pub fn set_row(&mut self, cell: &Cell, effects: &dyn EffectFactory<P>) {
        self.cell = *cell;
        self.effect = cell.effect.and_then(|data| {
            let effect = effects.create(data);
            if effect.is_none() {
                tracing::warn!(channel = self.index, effect = %data, "no handler for effect");
            }
            effect
        });

        let event = match cell.note {
            Note::On(note) => Some(NoteEvent::Trigger {
                note,
                instrument: cell.instrument,
            }),
            Note::Off => Some(NoteEvent::Off),
            Note::Fade => Some(NoteEvent::Fade),
            Note::Cut => Some(NoteEvent::Cut),
            Note::None => None,
        };
        if cell.instrument != 0 {
            self.last_instrument = cell.instrument;
        }
        self.pending = (event.is_some() || cell.volume.is_some()).then_some(PendingNote {
            tick: 0,
            event,
            volume: cell.volume,
            porta: false,
        });
    }

    /// New pattern: pattern loop state starts over.
    pub fn order_start(&mut self) {
        self.memory.loop_start = 0;
        self.memory.loop_count = 0;
    }

    /// The row's effect ends with the row, and so does a note delayed
    /// past the row's last tick.
    pub fn row_end(&mut self) {
        self.effect = None;
        self.set_period_delta(0.0);
        if self.pending.take().is_some() {
            tracing::trace!(channel = self.index, "delayed note dropped at row end");
        }
    }

    pub fn pre_start(&mut self, transport: &mut Transport) -> Result<(), EngineError> {
        let Some(mut effect) = self.effect.take() else {
            return Ok(());
        };
        let result = effect.pre_start(self, transport);
        self.effect = Some(effect);
        result
    }

    pub fn start(&mut self, transport: &mut Transport) -> Result<(), EngineError> {
        let Some(mut effect) = self.effect.take() else {
            return Ok(());
        };
        let result = effect.start(self, transport);
        self.effect = Some(effect);
        result
    }

    /// Fire the queued note work once its tick has come.
    pub fn do_note_action(
        &mut self,
        song: &Song,
        filters: &FilterFactory,
        sampler: &Sampler,
        tick: u32,
    ) -> Result<(), EngineError> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        if tick < pending.tick {
            return Ok(());
        }
        self.pending = None;

        match pending.event {
            Some(NoteEvent::Trigger { note, instrument }) => {
                if pending.porta && self.voice.is_some() {
                    self.set_porta_target(song, note, instrument);
                } else {
                    self.trigger(song, filters, sampler, note, instrument)?;
                }
            }
            Some(NoteEvent::Off) => {
                if let Some(voice) = &mut self.voice {
                    voice.release();
                }
            }
            Some(NoteEvent::Fade) => {
                if let Some(voice) = &mut self.voice {
                    voice.fadeout();
                }
            }
            Some(NoteEvent::Cut) => self.note_cut(),
            None => {}
        }

        if let (Some(volume), Some(voice)) = (pending.volume, &mut self.voice) {
            voice.set_volume(volume.min(64) as f32 / 64.0);
        }
        Ok(())
    }

    fn resolve_instrument(&self, instrument: u8) -> u8 {
        if instrument == 0 {
            self.last_instrument
        } else {
            instrument
        }
    }

    fn set_porta_target(&mut self, song: &Song, note: u8, instrument: u8) {
        let number = self.resolve_instrument(instrument);
        let target = song
            .instrument(number)
            .and_then(|inst| inst.mapping(note))
            .and_then(|m| Some((m.note, song.samples.get(m.sample?)?)))
            .map(|(note, sample)| P::from_semitone(note, sample.finetune, sample.c4_speed as Frequency));
        if target.is_some() {
            self.porta_target = target;
        }
    }

    fn trigger(
        &mut self,
        song: &Song,
        filters: &FilterFactory,
        sampler: &Sampler,
        note: u8,
        instrument: u8,
    ) -> Result<(), EngineError> {
        let number = self.resolve_instrument(instrument);
        let Some(inst) = song.instrument(number) else {
            tracing::trace!(channel = self.index, instrument = number, "no such instrument, note ignored");
            return Ok(());
        };
        let Some(mapping) = inst.mapping(note) else {
            return Ok(());
        };
        let Some(key) = mapping.sample else {
            tracing::trace!(channel = self.index, note, "note not mapped to a sample");
            return Ok(());
        };
        let sample = song
            .samples
            .get(key)
            .ok_or(EngineError::MissingSample { instrument: number })?;

        let mut voice: Voice<P> = Voice::new(VoiceSetup {
            instrument_number: number,
            instrument: inst,
            sample_key: key,
            sample,
            filters,
            playback_rate: sampler.sample_rate as Frequency,
            vol0: self.vol0,
            channel_pan: self.pan,
            pan_enabled: self.pan_enabled,
        })?;
        voice.set_period(P::from_semitone(mapping.note, sample.finetune, sample.c4_speed as Frequency));
        voice.set_note(mapping.note);
        voice.set_muted(self.muted);
        voice.attack();
        self.memory.vibrato.reset();

        if let Some(old) = self.voice.replace(voice) {
            self.retire(old);
        }
        self.nna = inst.new_note_action;
        self.porta_target = None;
        Ok(())
    }

    /// Apply the new-note action to the outgoing foreground voice.
    fn retire(&mut self, mut old: Voice<P>) {
        if old.is_done() {
            return;
        }
        match self.nna {
            NewNoteAction::Cut => return,
            NewNoteAction::Continue => old.set_background(),
            NewNoteAction::Release => {
                old.set_background();
                old.release();
            }
            NewNoteAction::Fadeout => {
                old.set_background();
                old.fadeout();
            }
        }
        if self.background.is_full() {
            tracing::warn!(channel = self.index, "background voices full, cutting oldest");
            self.background.remove(0);
        }
        if self.background.push(old).is_err() {
            tracing::warn!(channel = self.index, "background voice dropped");
        }
    }

    /// Per-tick work: the row effect first, then every voice.
    pub fn tick(&mut self, transport: &mut Transport, tick: u32) -> Result<(), EngineError> {
        if let Some(mut effect) = self.effect.take() {
            let result = effect.tick(self, transport, tick);
            self.effect = Some(effect);
            result?;
        }

        if let Some(voice) = &mut self.voice {
            voice.tick()?;
            if voice.is_done() {
                tracing::trace!(channel = self.index, "foreground voice done");
                self.voice = None;
            }
        }
        for voice in self.background.iter_mut() {
            voice.tick()?;
        }
        let before = self.background.len();
        self.background.retain(|v| !v.is_done());
        if self.background.len() != before {
            tracing::debug!(channel = self.index, retired = before - self.background.len(), "background voices retired");
        }
        Ok(())
    }

    /// Render every voice into a fresh buffer of `frames` frames.
    pub fn render(&mut self, song: &Song, sampler: &Sampler, frames: usize) -> ChannelData {
        let mut buffer = AudioBuffer::new(sampler.output_channels, frames);
        let mut voices = 0;
        for voice in self.voice.iter_mut().chain(self.background.iter_mut()) {
            let Some(sample) = voice.sample_key().and_then(|key| song.samples.get(key)) else {
                continue;
            };
            if voice.is_done() {
                continue;
            }
            voice.render(sample, sampler, self.volume, &mut buffer);
            voices += 1;
        }
        ChannelData { buffer, voices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::KeyState;
    use crate::effect::BasicEffects;
    use crate::period::{AmigaPeriod, LinearPeriod};
    use tp_ir::{EffectData, Instrument, LoopMode, LoopSettings, Sample, SampleData};

    fn song_with(nna: NewNoteAction) -> Song {
        let mut song = Song::with_channels("t", 1);
        let key = song.add_sample(Sample {
            data: SampleData::Mono8(vec![64; 128]),
            loop_settings: LoopSettings::new(LoopMode::Normal, 0, 128),
            ..Sample::default()
        });
        let mut inst = Instrument::new("i");
        inst.set_single_sample(key);
        inst.new_note_action = nna;
        song.instruments.push(inst);
        song
    }

    fn note(n: u8) -> Cell {
        Cell {
            note: Note::On(n),
            instrument: 1,
            ..Cell::default()
        }
    }

    struct Rig<P: Period> {
        song: Song,
        channel: Channel<P>,
        transport: Transport,
        filters: FilterFactory,
        sampler: Sampler,
    }

    impl<P: Period> Rig<P> {
        fn new(song: Song) -> Self {
            let channel = Channel::new(0, &song.channels[0], Vol0Settings::default());
            Self {
                transport: Transport::from_song(&song),
                song,
                channel,
                filters: FilterFactory::default(),
                sampler: Sampler::new(44100, 2),
            }
        }

        fn row(&mut self, cell: Cell) {
            self.channel.set_row(&cell, &BasicEffects);
            self.channel.pre_start(&mut self.transport).unwrap();
            self.channel.start(&mut self.transport).unwrap();
            self.channel.tick(&mut self.transport, 0).unwrap();
            self.channel
                .do_note_action(&self.song, &self.filters, &self.sampler, 0)
                .unwrap();
        }

        fn ticks(&mut self, from: u32, to: u32) {
            for t in from..to {
                self.channel.tick(&mut self.transport, t).unwrap();
                self.channel
                    .do_note_action(&self.song, &self.filters, &self.sampler, t)
                    .unwrap();
            }
        }
    }

    #[test]
    fn note_triggers_foreground_voice() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(note(48));
        let voice = rig.channel.voice().unwrap();
        assert_eq!(voice.key_state(), KeyState::Attacking);
        assert_eq!(voice.period(), LinearPeriod::from_semitone(48, 0, 8363.0));
    }

    #[test]
    fn nna_cut_discards_old_voice() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(note(48));
        rig.row(note(50));
        assert!(rig.channel.background_voices().is_empty());
        assert_eq!(rig.channel.active_voices(), 1);
    }

    #[test]
    fn nna_continue_keeps_old_voice_ringing() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Continue));
        rig.row(note(48));
        rig.ticks(1, 3);
        rig.row(note(50));
        let bg = rig.channel.background_voices();
        assert_eq!(bg.len(), 1);
        assert!(bg[0].is_background());
        assert_eq!(bg[0].key_state(), KeyState::Sustained);
        assert_eq!(bg[0].period(), LinearPeriod::from_semitone(48, 0, 8363.0));
        assert!(!rig.channel.voice().unwrap().is_background());
    }

    #[test]
    fn nna_release_and_fadeout() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Release));
        rig.row(note(48));
        rig.row(note(50));
        // no looping volume envelope: a released background voice fades
        assert_eq!(rig.channel.background_voices()[0].key_state(), KeyState::Fadeout);

        let mut rig: Rig<AmigaPeriod> = Rig::new(song_with(NewNoteAction::Fadeout));
        rig.row(note(48));
        rig.row(note(50));
        assert_eq!(rig.channel.background_voices()[0].key_state(), KeyState::Fadeout);
    }

    #[test]
    fn full_background_cuts_oldest() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Continue));
        for n in 0..(MAX_BACKGROUND_VOICES as u8 + 3) {
            rig.row(note(30 + n));
        }
        let bg = rig.channel.background_voices();
        assert_eq!(bg.len(), MAX_BACKGROUND_VOICES);
        assert_eq!(bg[0].period(), LinearPeriod::from_semitone(32, 0, 8363.0));
    }

    #[test]
    fn note_off_fade_and_cut() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(note(48));
        rig.row(Cell {
            note: Note::Off,
            ..Cell::default()
        });
        assert_eq!(rig.channel.voice().unwrap().key_state(), KeyState::Released);
        rig.row(Cell {
            note: Note::Fade,
            ..Cell::default()
        });
        assert_eq!(rig.channel.voice().unwrap().key_state(), KeyState::Fadeout);
        rig.row(Cell {
            note: Note::Cut,
            ..Cell::default()
        });
        assert_eq!(rig.channel.voice().unwrap().key_state(), KeyState::Stopped);
        rig.ticks(1, 2);
        assert!(rig.channel.voice().is_none());
    }

    #[test]
    fn volume_column_sets_voice_volume() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(Cell {
            volume: Some(32),
            ..note(48)
        });
        assert!((rig.channel.voice().unwrap().volume() - 0.5).abs() < 1e-6);
        rig.row(Cell {
            volume: Some(16),
            ..Cell::default()
        });
        assert!((rig.channel.voice().unwrap().volume() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn missing_instrument_is_ignored() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(Cell {
            instrument: 9,
            ..note(48)
        });
        assert!(rig.channel.voice().is_none());
    }

    #[test]
    fn instrument_zero_reuses_last() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(note(48));
        rig.row(Cell {
            note: Note::On(52),
            ..Cell::default()
        });
        assert_eq!(rig.channel.voice().unwrap().period(), LinearPeriod::from_semitone(52, 0, 8363.0));
    }

    #[test]
    fn removed_sample_is_a_fault() {
        let mut song = song_with(NewNoteAction::Cut);
        let key = song.samples.keys().next().unwrap();
        song.samples.remove(key);
        let mut rig: Rig<LinearPeriod> = Rig::new(song);
        rig.channel.set_row(&note(48), &BasicEffects);
        let result = rig.channel.do_note_action(&rig.song, &rig.filters, &rig.sampler, 0);
        assert_eq!(result, Err(EngineError::MissingSample { instrument: 1 }));
    }

    #[test]
    fn tone_porta_slides_without_retrigger() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(note(48));
        rig.row(Cell {
            effect: Some(EffectData::new(b'G', 16)),
            ..note(49)
        });
        let start = LinearPeriod::from_semitone(48, 0, 8363.0);
        let target = LinearPeriod::from_semitone(49, 0, 8363.0);
        assert_eq!(rig.channel.porta_target(), Some(target));
        assert_eq!(rig.channel.voice().unwrap().period(), start);
        assert_eq!(rig.channel.voice().unwrap().key_state(), KeyState::Sustained);

        rig.ticks(1, 2);
        assert_eq!(rig.channel.voice().unwrap().period().finetune(), start.finetune() + 64);
        assert_eq!(rig.channel.voice().unwrap().period(), target);
    }

    #[test]
    fn render_reports_contributing_voices() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Continue));
        rig.row(note(48));
        rig.row(note(55));
        let data = rig.channel.render(&rig.song, &rig.sampler, 32);
        assert_eq!(data.voices, 2);
        assert_eq!(data.buffer.frames(), 32);
        assert!(data.buffer.peak() > 0.0);
    }

    #[test]
    fn mute_silences_without_losing_volume() {
        let mut rig: Rig<LinearPeriod> = Rig::new(song_with(NewNoteAction::Cut));
        rig.row(note(48));
        rig.channel.set_muted(true);
        assert_eq!(rig.channel.voice().unwrap().final_volume(), 0.0);
        rig.channel.set_muted(false);
        assert_eq!(rig.channel.voice().unwrap().final_volume(), 1.0);
    }
}
