//! Voice: one sounding note and its modulator set.

use alloc::boxed::Box;

use tp_ir::{AudioBuffer, Instrument, InstrumentKind, Sample, SampleKey};

use crate::component::{
    AmpModulator, AutoVibratoModulator, Deferred, EnvelopeModulator, FadeoutModulator,
    FreqModulator, KeyModulator, KeyState, PanModulator, PitchPanModulator, SampleVoicer,
    VoiceAction, Voicer, Vol0Optimization, Vol0Settings,
};
use crate::error::EngineError;
use crate::filter::{Filter, FilterFactory};
use crate::period::{Delta, Frequency, Period};
use crate::sampler::Sampler;

/// Pitch-envelope steps are half-semitones: 32 finetune units each.
const PITCH_ENVELOPE_SCALE: Delta = 32.0;

/// Everything a voice needs to set itself up for one note.
pub struct VoiceSetup<'a> {
    /// 1-based instrument number, for error reporting
    pub instrument_number: u8,
    pub instrument: &'a Instrument,
    pub sample_key: SampleKey,
    pub sample: &'a Sample,
    pub filters: &'a FilterFactory,
    pub playback_rate: Frequency,
    pub vol0: Vol0Settings,
    /// Pan used when neither the instrument nor the sample sets one
    pub channel_pan: f32,
    /// When false the initial pan is fixed
    pub pan_enabled: bool,
}

/// Linear pan law: (left, right) gains for a pan in [-1.0, 1.0].
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let right = (pan.clamp(-1.0, 1.0) + 1.0) * 0.5;
    (1.0 - right, right)
}

/// Map a filter-envelope value (-32..32) to a cutoff (0..127).
fn filter_envelope_cutoff(value: f32) -> u8 {
    libm::roundf((value + 32.0) * 2.0).clamp(0.0, 127.0) as u8
}

/// One sounding note. Cloning is a full deep copy, filter history included.
#[derive(Clone, Debug)]
pub struct Voice<P: Period, V: Voicer = SampleVoicer> {
    background: bool,
    key: KeyModulator,
    voicer: Option<V>,
    amp: AmpModulator,
    fadeout: FadeoutModulator,
    freq: FreqModulator<P>,
    auto_vibrato: AutoVibratoModulator,
    pan: PanModulator,
    pitch_pan: PitchPanModulator,
    vol_env: EnvelopeModulator<u8>,
    pan_env: EnvelopeModulator<i8>,
    pitch_env: EnvelopeModulator<i8>,
    filter_env: EnvelopeModulator<i8>,
    vol0: Vol0Optimization,
    filter: Option<Box<dyn Filter>>,
    final_volume: f32,
    final_period: P,
    final_pan: f32,
}

impl<P: Period, V: Voicer> Default for Voice<P, V> {
    fn default() -> Self {
        Self {
            background: false,
            key: KeyModulator::default(),
            voicer: None,
            amp: AmpModulator::default(),
            fadeout: FadeoutModulator::default(),
            freq: FreqModulator::default(),
            auto_vibrato: AutoVibratoModulator::default(),
            pan: PanModulator::default(),
            pitch_pan: PitchPanModulator::default(),
            vol_env: EnvelopeModulator::default(),
            pan_env: EnvelopeModulator::default(),
            pitch_env: EnvelopeModulator::default(),
            filter_env: EnvelopeModulator::default(),
            vol0: Vol0Optimization::default(),
            filter: None,
            final_volume: 0.0,
            final_period: P::default(),
            final_pan: 0.0,
        }
    }
}

impl<P: Period, V: Voicer> Voice<P, V> {
    /// A voice set up for one note, not yet attacked.
    pub fn new(setup: VoiceSetup<'_>) -> Result<Self, EngineError> {
        let mut voice = Self::default();
        voice.setup(setup)?;
        Ok(voice)
    }

    /// Configure every component from the instrument and sample.
    pub fn setup(&mut self, setup: VoiceSetup<'_>) -> Result<(), EngineError> {
        let inst = setup.instrument;
        if let InstrumentKind::Adlib(_) = inst.kind {
            return Err(EngineError::UnsupportedInstrument {
                instrument: setup.instrument_number,
                kind: "adlib",
            });
        }
        let sample = setup.sample;

        let vol_env_action = if inst.fade_at_volume_envelope_end {
            Some(VoiceAction::Fadeout)
        } else if inst.volume_envelope.points.last().is_some_and(|p| p.y == 0) {
            Some(VoiceAction::Stop)
        } else {
            None
        };
        self.vol_env = EnvelopeModulator::new(inst.volume_envelope.clone()).with_finish_action(vol_env_action);
        self.pan_env = EnvelopeModulator::new(inst.panning_envelope.clone());
        self.pitch_env = EnvelopeModulator::new(inst.pitch_envelope.clone());
        self.filter_env = EnvelopeModulator::new(inst.pitch_envelope.clone());
        self.pitch_env.set_enabled(!inst.pitch_envelope_is_filter && inst.pitch_envelope.enabled);
        self.filter_env.set_enabled(inst.pitch_envelope_is_filter && inst.pitch_envelope.enabled);

        self.fadeout = FadeoutModulator::new(inst.fadeout, self.vol_env.is_enabled());
        self.amp = AmpModulator::new(
            sample.default_volume.min(64) as f32 / 64.0,
            inst.global_volume * sample.global_volume,
        );
        let pan = inst
            .default_pan
            .or(sample.default_pan)
            .map_or(setup.channel_pan, |p| p as f32 / 64.0);
        self.pan = PanModulator::new(setup.pan_enabled, pan);
        self.pitch_pan = PitchPanModulator::new(inst.pitch_pan);
        self.auto_vibrato = AutoVibratoModulator::new(sample.vibrato);
        self.freq = FreqModulator::default();
        self.vol0 = Vol0Optimization::new(setup.vol0);
        self.voicer = Some(V::from_sample(setup.sample_key, sample));

        self.filter = match &inst.filter {
            Some(info) => {
                let mut filter = setup.filters.create(info)?;
                filter.set_playback_rate(setup.playback_rate)?;
                Some(filter)
            }
            None => None,
        };

        self.key = KeyModulator::default();
        self.update_final();
        Ok(())
    }

    /// Deep copy marked as a background voice.
    pub fn clone_background(&self) -> Self {
        let mut voice = self.clone();
        voice.background = true;
        voice
    }

    pub fn set_background(&mut self) {
        self.background = true;
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn key_state(&self) -> KeyState {
        self.key.state()
    }

    pub fn sample_key(&self) -> Option<SampleKey> {
        self.voicer.as_ref().map(|v| v.sample_key())
    }

    pub fn voicer(&self) -> Option<&V> {
        self.voicer.as_ref()
    }

    /// Trigger the note from the top.
    pub fn attack(&mut self) {
        self.key.attack();
        self.vol_env.reset();
        self.pan_env.reset();
        self.pitch_env.reset();
        self.filter_env.reset();
        self.auto_vibrato.reset();
        self.fadeout.reset();
        self.vol0.reset();
        if let Some(voicer) = &mut self.voicer {
            voicer.attack();
        }
        self.update_final();
    }

    /// Note-off.
    pub fn release(&mut self) {
        if !self.key.release() {
            return;
        }
        self.vol_env.release();
        self.pan_env.release();
        self.pitch_env.release();
        self.filter_env.release();
        if let Some(voicer) = &mut self.voicer {
            voicer.release();
        }
        if self.background && !self.vol_env.can_loop() {
            self.fadeout();
        } else {
            self.update_final();
        }
    }

    /// Note fade.
    pub fn fadeout(&mut self) {
        if !self.key.fadeout() {
            return;
        }
        self.fadeout.activate();
        if let Some(voicer) = &mut self.voicer {
            voicer.fadeout();
        }
        self.update_final();
    }

    /// Silence immediately.
    pub fn stop(&mut self) {
        self.key.stop();
        self.update_final();
    }

    pub fn is_done(&self) -> bool {
        let Some(voicer) = &self.voicer else {
            return true;
        };
        self.key.is_stopped() || voicer.is_finished() || self.fadeout.is_done() || self.vol0.is_done()
    }

    pub fn period(&self) -> P {
        self.freq.period()
    }

    pub fn set_period(&mut self, period: P) {
        self.freq.set_period(period);
        self.update_final();
    }

    /// Effect period offset toward higher pitch.
    pub fn set_period_delta(&mut self, delta: Delta) {
        self.freq.set_delta(delta);
        self.update_final();
    }

    /// Note currently playing, for pitch-pan.
    pub fn set_note(&mut self, note: u8) {
        self.pitch_pan.set_note(note);
        self.pitch_pan.advance();
        self.update_final();
    }

    pub fn volume(&self) -> f32 {
        self.amp.volume()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.amp.set_volume(volume);
        self.update_final();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.amp.set_muted(muted);
        self.update_final();
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan.set_pan(pan);
        self.update_final();
    }

    pub fn set_volume_envelope_enabled(&mut self, enabled: bool) {
        self.vol_env.set_enabled(enabled);
        self.update_final();
    }

    /// Sample cursor, in frames.
    pub fn sample_position(&self) -> Option<f64> {
        self.voicer.as_ref().map(|v| v.position())
    }

    pub fn set_sample_position(&mut self, pos: f64) {
        if let Some(voicer) = &mut self.voicer {
            voicer.set_position(pos);
        }
    }

    pub fn final_volume(&self) -> f32 {
        self.final_volume
    }

    pub fn final_period(&self) -> P {
        self.final_period
    }

    pub fn final_pan(&self) -> f32 {
        self.final_pan
    }

    fn apply(&mut self, action: VoiceAction) {
        match action {
            VoiceAction::Fadeout => self.fadeout(),
            VoiceAction::Stop => self.stop(),
        }
    }

    /// Per-tick advance of every modulator.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.fadeout.advance();
        self.auto_vibrato.advance();
        self.freq.set_auto_vibrato_delta(self.auto_vibrato.final_delta());
        self.pitch_pan.advance();

        if let Some(action) = self.vol_env.advance() {
            self.apply(action);
        }
        self.pan_env.advance();
        self.pitch_env.advance();
        if self.filter_env.is_enabled() {
            self.filter_env.advance();
            if let Some(filter) = &mut self.filter {
                filter.update_env(filter_envelope_cutoff(self.filter_env.value()))?;
            }
        }

        if let Some(deferred) = self.key.take_deferred() {
            if let Some(voicer) = &mut self.voicer {
                match deferred {
                    Deferred::Attack => voicer.deferred_attack(),
                    Deferred::Release => voicer.deferred_release(),
                }
            }
        }
        self.key.advance();
        self.update_final();

        // only voices nothing can turn back up again
        if self.background && (!self.vol_env.is_enabled() || self.vol_env.is_finished()) {
            self.vol0.observe(self.final_volume);
        }
        Ok(())
    }

    fn update_final(&mut self) {
        if self.key.is_stopped() {
            self.final_volume = 0.0;
        } else {
            let env = if self.vol_env.is_enabled() {
                self.vol_env.value() / 64.0
            } else {
                1.0
            };
            self.final_volume = self.amp.final_volume() * env * self.fadeout.final_volume();
        }

        let mut period = self.freq.final_period();
        if self.pitch_env.is_enabled() {
            period = period.add_delta(self.pitch_env.value() as Delta * PITCH_ENVELOPE_SCALE, P::HIGHER_PITCH_SIGN);
        }
        self.final_period = period;

        self.final_pan = if self.pan_env.is_enabled() {
            self.pitch_pan.separated_pan(self.pan_env.value() / 32.0)
        } else {
            self.pan.final_pan()
        };
    }

    /// Mix this voice into `out` (planar, already sized for one tick).
    pub fn render(&mut self, sample: &Sample, sampler: &Sampler, gain: f32, out: &mut AudioBuffer) {
        if self.is_done() || self.final_period.is_silent() {
            return;
        }
        let Some(voicer) = &mut self.voicer else {
            return;
        };

        let step = self.final_period.sampler_add(sampler.base_clock, sampler.sample_rate as Frequency);
        let volume = self.final_volume * gain;
        let (left, right) = pan_gains(self.final_pan);

        for i in 0..out.frames() {
            if voicer.is_finished() {
                break;
            }
            let mut wet = voicer.sample_frame(sample);
            if let Some(filter) = &mut self.filter {
                wet = filter.filter(wet);
            }
            let wet = wet.scaled(volume);
            match out.channels() {
                0 => {}
                1 => out.accumulate(0, i, wet.to_mono()),
                _ => {
                    let r = if wet.channels() > 1 { 1 } else { 0 };
                    out.accumulate(0, i, wet.get(0) * left);
                    out.accumulate(1, i, wet.get(r) * right);
                }
            }
            voicer.advance(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::period::{AmigaPeriod, LinearPeriod};
    use slotmap::SlotMap;
    use tp_ir::{
        AdlibPatch, Envelope, EnvelopeNode, FadeoutMode, FadeoutSettings, FilterInfo, FilterParams,
        LoopMode, LoopSettings, PitchPan, ResonantParams, SampleData,
    };

    /// Sample voicer that logs the key transitions it is handed.
    #[derive(Clone, Debug)]
    struct Recording {
        inner: SampleVoicer,
        log: Vec<&'static str>,
    }

    impl Voicer for Recording {
        fn from_sample(key: SampleKey, sample: &Sample) -> Self {
            Self {
                inner: SampleVoicer::new(key, sample),
                log: Vec::new(),
            }
        }

        fn sample_key(&self) -> SampleKey {
            self.inner.sample_key()
        }

        fn position(&self) -> f64 {
            self.inner.position()
        }

        fn set_position(&mut self, pos: f64) {
            self.inner.set_position(pos);
        }

        fn is_finished(&self) -> bool {
            self.inner.is_finished()
        }

        fn attack(&mut self) {
            self.log.push("attack");
            self.inner.attack();
        }

        fn release(&mut self) {
            self.log.push("release");
            self.inner.release();
        }

        fn fadeout(&mut self) {
            self.log.push("fadeout");
        }

        fn deferred_attack(&mut self) {
            self.log.push("deferred_attack");
            self.inner.deferred_attack();
        }

        fn deferred_release(&mut self) {
            self.log.push("deferred_release");
        }

        fn sample_frame(&self, sample: &Sample) -> Frame {
            self.inner.sample_frame(sample)
        }

        fn advance(&mut self, step: f64) {
            self.inner.advance(step);
        }
    }

    fn pitch_panned(pan_envelope: Option<i8>) -> Instrument {
        Instrument {
            pitch_pan: PitchPan { center: 48, separation: 16 },
            panning_envelope: match pan_envelope {
                Some(y) => Envelope::from_nodes(&[EnvelopeNode { tick: 0, y }], None, None).unwrap(),
                None => Envelope::default(),
            },
            ..Instrument::default()
        }
    }

    struct Fixture {
        bank: SlotMap<SampleKey, Sample>,
        key: SampleKey,
        filters: FilterFactory,
    }

    impl Fixture {
        fn new() -> Self {
            let mut bank = SlotMap::with_key();
            let key = bank.insert(Sample {
                data: SampleData::Mono16(vec![16384; 256]),
                loop_settings: LoopSettings::new(LoopMode::Normal, 0, 256),
                ..Sample::default()
            });
            Self {
                bank,
                key,
                filters: FilterFactory::default(),
            }
        }

        fn voice<P: Period>(&self, inst: &Instrument) -> Voice<P> {
            self.voice_panned(inst, 0.0, true)
        }

        fn voice_panned<P: Period, V: Voicer>(&self, inst: &Instrument, pan: f32, pan_enabled: bool) -> Voice<P, V> {
            let mut v = Voice::new(VoiceSetup {
                instrument_number: 1,
                instrument: inst,
                sample_key: self.key,
                sample: &self.bank[self.key],
                filters: &self.filters,
                playback_rate: 44100.0,
                vol0: Vol0Settings::default(),
                channel_pan: pan,
                pan_enabled,
            })
            .unwrap();
            v.set_period(P::from_semitone(48, 0, 8363.0));
            v.attack();
            v
        }
    }

    fn fading_instrument(amount: f32) -> Instrument {
        Instrument {
            fadeout: FadeoutSettings {
                mode: FadeoutMode::AlwaysActive,
                amount,
            },
            ..Instrument::default()
        }
    }

    #[test]
    fn attack_is_audible_at_default_volume() {
        let fx = Fixture::new();
        let v: Voice<LinearPeriod> = fx.voice(&Instrument::default());
        assert_eq!(v.key_state(), KeyState::Attacking);
        assert_eq!(v.final_volume(), 1.0);
        assert!(!v.is_done());
    }

    #[test]
    fn first_tick_moves_attack_to_sustain() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod> = fx.voice(&Instrument::default());
        v.tick().unwrap();
        assert_eq!(v.key_state(), KeyState::Sustained);
    }

    #[test]
    fn stop_forces_silence() {
        let fx = Fixture::new();
        let mut v: Voice<AmigaPeriod> = fx.voice(&Instrument::default());
        v.stop();
        assert_eq!(v.final_volume(), 0.0);
        assert!(v.is_done());
        v.set_volume(1.0);
        assert_eq!(v.final_volume(), 0.0);
    }

    #[test]
    fn fadeout_completes_on_first_silent_tick() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod> = fx.voice(&fading_instrument(0.25));
        v.fadeout();
        for n in 1..=4 {
            v.tick().unwrap();
            let expected = (1.0 - n as f32 * 0.25).max(0.0);
            assert!((v.final_volume() - expected).abs() < 1e-6);
            assert_eq!(v.is_done(), n == 4);
        }
    }

    #[test]
    fn background_release_without_looping_envelope_fades() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod> = fx.voice(&fading_instrument(0.1));
        v.tick().unwrap();
        let mut bg = v.clone_background();
        bg.release();
        assert_eq!(bg.key_state(), KeyState::Fadeout);

        v.release();
        assert_eq!(v.key_state(), KeyState::Released);
    }

    #[test]
    fn background_release_with_looping_envelope_keeps_releasing() {
        let fx = Fixture::new();
        let inst = Instrument {
            volume_envelope: Envelope::from_nodes(
                &[EnvelopeNode { tick: 0, y: 64 }, EnvelopeNode { tick: 4, y: 32 }],
                Some((0, 1)),
                None,
            )
            .unwrap(),
            ..fading_instrument(0.1)
        };
        let mut v: Voice<LinearPeriod> = fx.voice(&inst);
        v.set_background();
        v.release();
        assert_eq!(v.key_state(), KeyState::Released);
    }

    #[test]
    fn volume_envelope_scales_final_volume() {
        let fx = Fixture::new();
        let inst = Instrument {
            volume_envelope: Envelope::from_nodes(
                &[EnvelopeNode { tick: 0, y: 0 }, EnvelopeNode { tick: 10, y: 64 }],
                None,
                None,
            )
            .unwrap(),
            ..Instrument::default()
        };
        let mut v: Voice<LinearPeriod> = fx.voice(&inst);
        assert_eq!(v.final_volume(), 0.0);
        for _ in 0..5 {
            v.tick().unwrap();
        }
        assert!((v.final_volume() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn envelope_ending_at_zero_stops_voice() {
        let fx = Fixture::new();
        let inst = Instrument {
            volume_envelope: Envelope::from_nodes(
                &[EnvelopeNode { tick: 0, y: 64 }, EnvelopeNode { tick: 2, y: 0 }],
                None,
                None,
            )
            .unwrap(),
            ..Instrument::default()
        };
        let mut v: Voice<LinearPeriod> = fx.voice(&inst);
        v.tick().unwrap();
        assert!(!v.is_done());
        v.tick().unwrap();
        assert!(v.is_done());
    }

    #[test]
    fn pitch_envelope_shifts_final_period() {
        let fx = Fixture::new();
        let inst = Instrument {
            pitch_envelope: Envelope::from_nodes(&[EnvelopeNode { tick: 0, y: 2 }], None, None).unwrap(),
            ..Instrument::default()
        };
        let v: Voice<LinearPeriod> = fx.voice(&inst);
        assert_eq!(v.final_period().finetune(), 48 * 64 + 64);
    }

    #[test]
    fn filter_envelope_does_not_touch_pitch() {
        let fx = Fixture::new();
        let inst = Instrument {
            pitch_envelope: Envelope::from_nodes(&[EnvelopeNode { tick: 0, y: -20 }], None, None).unwrap(),
            pitch_envelope_is_filter: true,
            filter: Some(FilterInfo::new(
                "resonant",
                FilterParams::Resonant(ResonantParams {
                    cutoff: Some(127),
                    ..ResonantParams::default()
                }),
            )),
            ..Instrument::default()
        };
        let mut v: Voice<LinearPeriod> = fx.voice(&inst);
        v.tick().unwrap();
        assert_eq!(v.final_period().finetune(), 48 * 64);
    }

    #[test]
    fn unknown_filter_fails_setup() {
        let fx = Fixture::new();
        let inst = Instrument {
            filter: Some(FilterInfo::new("nope", FilterParams::MovingAverage { window_size: 2 })),
            ..Instrument::default()
        };
        let result: Result<Voice<LinearPeriod>, _> = Voice::new(VoiceSetup {
            instrument_number: 3,
            instrument: &inst,
            sample_key: fx.key,
            sample: &fx.bank[fx.key],
            filters: &fx.filters,
            playback_rate: 44100.0,
            vol0: Vol0Settings::default(),
            channel_pan: 0.0,
            pan_enabled: true,
        });
        assert_eq!(result.unwrap_err(), EngineError::UnknownFilter("nope".into()));
    }

    #[test]
    fn adlib_instrument_is_unsupported() {
        let fx = Fixture::new();
        let inst = Instrument {
            kind: InstrumentKind::Adlib(AdlibPatch::default()),
            ..Instrument::default()
        };
        let result: Result<Voice<AmigaPeriod>, _> = Voice::new(VoiceSetup {
            instrument_number: 2,
            instrument: &inst,
            sample_key: fx.key,
            sample: &fx.bank[fx.key],
            filters: &fx.filters,
            playback_rate: 44100.0,
            vol0: Vol0Settings::default(),
            channel_pan: 0.0,
            pan_enabled: true,
        });
        assert!(matches!(result, Err(EngineError::UnsupportedInstrument { instrument: 2, .. })));
    }

    #[test]
    fn clone_is_independent_and_renders_identically() {
        let fx = Fixture::new();
        let inst = Instrument {
            filter: Some(FilterInfo::new("moving-average", FilterParams::MovingAverage { window_size: 8 })),
            ..fading_instrument(0.05)
        };
        let sampler = Sampler::new(44100, 2);
        let mut a: Voice<LinearPeriod> = fx.voice(&inst);
        let mut buf = AudioBuffer::new(2, 64);
        a.render(&fx.bank[fx.key], &sampler, 1.0, &mut buf);
        a.tick().unwrap();

        let mut b = a.clone();
        let mut out_a = AudioBuffer::new(2, 64);
        let mut out_b = AudioBuffer::new(2, 64);
        a.render(&fx.bank[fx.key], &sampler, 1.0, &mut out_a);
        b.render(&fx.bank[fx.key], &sampler, 1.0, &mut out_b);
        assert_eq!(out_a, out_b);

        // mutating one leaves the other untouched
        a.fadeout();
        a.tick().unwrap();
        b.tick().unwrap();
        assert_ne!(a.final_volume(), b.final_volume());
        assert_eq!(b.key_state(), KeyState::Sustained);
    }

    #[test]
    fn render_pans_center_equally() {
        let fx = Fixture::new();
        let sampler = Sampler::new(44100, 2);
        let mut v: Voice<LinearPeriod> = fx.voice(&Instrument::default());
        let mut buf = AudioBuffer::new(2, 16);
        v.render(&fx.bank[fx.key], &sampler, 1.0, &mut buf);
        assert!(buf.peak() > 0.0);
        assert_eq!(buf.channel(0), buf.channel(1));
        assert!((buf.channel(0)[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn pan_law_extremes() {
        assert_eq!(pan_gains(-1.0), (1.0, 0.0));
        assert_eq!(pan_gains(1.0), (0.0, 1.0));
        assert_eq!(pan_gains(0.0), (0.5, 0.5));
    }

    #[test]
    fn background_silence_is_retired_by_vol0() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod> = fx.voice(&Instrument::default());
        v.set_volume(0.0);
        for _ in 0..200 {
            v.tick().unwrap();
        }
        assert!(!v.is_done(), "foreground voices are never retired by silence");
        v.set_background();
        for _ in 0..Vol0Settings::default().max_ticks_at_zero {
            v.tick().unwrap();
        }
        assert!(v.is_done());
    }

    #[test]
    fn voicer_hears_release_at_once_and_again_after_tick() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod, Recording> = fx.voice_panned(&Instrument::default(), 0.0, true);
        v.tick().unwrap();
        v.release();
        assert_eq!(v.voicer().unwrap().log, vec!["attack", "deferred_attack", "release"]);
        v.tick().unwrap();
        v.fadeout();
        assert_eq!(
            v.voicer().unwrap().log,
            vec!["attack", "deferred_attack", "release", "deferred_release", "fadeout"]
        );
    }

    #[test]
    fn release_leaves_sample_sustain_loop_immediately() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod> = fx.voice(&Instrument::default());
        v.tick().unwrap();
        assert!(v.voicer().unwrap().is_key_on());
        v.release();
        assert!(!v.voicer().unwrap().is_key_on());
    }

    #[test]
    fn pitch_pan_is_ignored_without_pan_envelope() {
        let fx = Fixture::new();
        let mut v: Voice<LinearPeriod> = fx.voice_panned(&pitch_panned(None), 0.0, true);
        v.set_note(60);
        v.tick().unwrap();
        v.tick().unwrap();
        assert_eq!(v.final_pan(), 0.0);

        let mut v: Voice<LinearPeriod> = fx.voice_panned(&pitch_panned(None), -0.5, true);
        v.set_note(60);
        v.tick().unwrap();
        assert_eq!(v.final_pan(), -0.5);
    }

    #[test]
    fn pan_envelope_is_separated_by_pitch() {
        let fx = Fixture::new();
        // envelope -16 is -0.5; note 60 is 12 semitones above center, +0.75
        let mut v: Voice<LinearPeriod> = fx.voice_panned(&pitch_panned(Some(-16)), 0.5, true);
        v.set_note(60);
        v.tick().unwrap();
        assert!((v.final_pan() - 0.25).abs() < 1e-6);

        v.set_note(48);
        v.tick().unwrap();
        assert!((v.final_pan() - -0.5).abs() < 1e-6);
    }

    #[test]
    fn disabled_pan_keeps_initial_position() {
        let fx = Fixture::new();
        let mut fixed: Voice<LinearPeriod> = fx.voice_panned(&Instrument::default(), 0.25, false);
        fixed.set_pan(-1.0);
        assert_eq!(fixed.final_pan(), 0.25);

        let mut free: Voice<LinearPeriod> = fx.voice_panned(&Instrument::default(), 0.25, true);
        free.set_pan(-1.0);
        assert_eq!(free.final_pan(), -1.0);
    }
}
