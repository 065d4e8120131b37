//! A cloned voice must be indistinguishable from its source from then on.

mod common;

use tickplay::engine::{FilterFactory, LinearPeriod, Period, Sampler, Voice, VoiceSetup, Vol0Settings};
use tickplay::ir::{
    AudioBuffer, Envelope, EnvelopeNode, FilterInfo, FilterParams, Instrument, PitchPan, ResonantParams,
    Song,
};

use common::{init_tracing, square_sample};

fn instrument(song: &mut Song) -> Instrument {
    let key = song.add_sample(square_sample());
    let mut inst = Instrument::new("filtered");
    inst.set_single_sample(key);
    inst.volume_envelope = Envelope::from_nodes(
        &[
            EnvelopeNode { tick: 0, y: 64 },
            EnvelopeNode { tick: 8, y: 40 },
            EnvelopeNode { tick: 24, y: 16 },
        ],
        None,
        None,
    )
    .unwrap();
    inst.panning_envelope = Envelope::from_nodes(
        &[EnvelopeNode { tick: 0, y: -24 }, EnvelopeNode { tick: 20, y: 24 }],
        None,
        None,
    )
    .unwrap();
    inst.pitch_pan = PitchPan {
        center: 48,
        separation: 8,
    };
    inst.filter = Some(FilterInfo::new(
        "resonant",
        FilterParams::Resonant(ResonantParams {
            cutoff: Some(60),
            resonance: Some(90),
            ..ResonantParams::default()
        }),
    ));
    inst
}

#[test]
fn clone_renders_identically_after_divergent_history() {
    init_tracing();
    let mut song = Song::new("clone");
    let inst = instrument(&mut song);
    let key = inst.mapping(48).and_then(|m| m.sample).unwrap();
    let sample = &song.samples[key];
    let filters = FilterFactory::default();
    let sampler = Sampler::default();

    let mut voice: Voice<LinearPeriod> = Voice::new(VoiceSetup {
        instrument_number: 1,
        instrument: &inst,
        sample_key: key,
        sample,
        filters: &filters,
        playback_rate: sampler.sample_rate as f64,
        vol0: Vol0Settings::default(),
        channel_pan: 0.25,
        pan_enabled: true,
    })
    .unwrap();
    voice.set_period(LinearPeriod::from_semitone(52, 0, 8363.0));
    voice.set_note(52);
    voice.attack();

    // build up envelope position, sample position and filter history
    let frames = sampler.samples_per_tick(125);
    let mut scratch = AudioBuffer::new(2, frames);
    for _ in 0..5 {
        voice.tick().unwrap();
        voice.render(sample, &sampler, 1.0, &mut scratch);
    }

    // envelope around -12 (-0.375), pitch-pan adds 4 semitones * 1/32
    assert!((-0.4..-0.2).contains(&voice.final_pan()));

    let mut copy = voice.clone();
    for _ in 0..10 {
        voice.tick().unwrap();
        copy.tick().unwrap();
        let mut a = AudioBuffer::new(2, frames);
        let mut b = AudioBuffer::new(2, frames);
        voice.render(sample, &sampler, 1.0, &mut a);
        copy.render(sample, &sampler, 1.0, &mut b);

        assert_eq!(voice.final_volume(), copy.final_volume());
        assert_eq!(voice.final_period(), copy.final_period());
        assert_eq!(voice.final_pan(), copy.final_pan());
        assert_eq!(voice.sample_position(), copy.sample_position());
        for ch in 0..2 {
            assert_eq!(a.channel(ch), b.channel(ch));
        }
    }
}

#[test]
fn background_clone_leaves_source_in_foreground() {
    init_tracing();
    let mut song = Song::new("clone");
    let inst = instrument(&mut song);
    let key = inst.mapping(60).and_then(|m| m.sample).unwrap();
    let filters = FilterFactory::default();

    let mut voice: Voice<LinearPeriod> = Voice::new(VoiceSetup {
        instrument_number: 1,
        instrument: &inst,
        sample_key: key,
        sample: &song.samples[key],
        filters: &filters,
        playback_rate: 44100.0,
        vol0: Vol0Settings::default(),
        channel_pan: 0.0,
        pan_enabled: true,
    })
    .unwrap();
    voice.attack();
    voice.tick().unwrap();

    let mut bg = voice.clone_background();
    assert!(bg.is_background());
    assert!(!voice.is_background());

    bg.release();
    assert_ne!(bg.key_state(), voice.key_state());
}
