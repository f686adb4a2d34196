use crate::chip::{ChannelRegisters, RegisterSnapshot, NOISE_MASK, VOLUME_ENVELOPE_BIT};
use crate::effects::{Arpeggio, OnOff, Slide, Vibrato};
use crate::instrument::{scale_volume, AmplitudeSlide, InstrumentRow, MAX_TONE_PERIOD};

use super::state::MAX_AMPLITUDE_SLIDE;
use super::{ChannelEffectState, SongData, TrackerState};

/// Tone registers are 12 bits wide; periods wrap
const TONE_PERIOD_RANGE: i32 = MAX_TONE_PERIOD as i32 + 1;

fn clamp_note(note: i32, max_index: usize) -> usize {
    note.clamp(0, max_index as i32) as usize
}

/// Apply each channel's table offset to its base note and step the table
pub fn resolve_tables(state: &mut TrackerState, song: &SongData) {
    let max_index = song.tuning.max_index();
    for channel in state.channels.iter_mut() {
        let offset = match song.table(channel.table) {
            Some(table) => {
                let offset = table.offset(channel.table_position) as i32;
                channel.table_counter = channel.table_counter.saturating_add(1);
                if channel.table_counter >= table.speed.max(1) {
                    channel.table_counter = 0;
                    channel.table_position = table.next_position(channel.table_position);
                }
                offset
            }
            None => 0,
        };
        channel.current_note = clamp_note(channel.base_note as i32 + offset, max_index);
    }
}

/// Step every running effect by one tick
pub fn advance_effects(state: &mut TrackerState, song: &SongData) {
    let max_index = song.tuning.max_index();
    for channel in state.channels.iter_mut() {
        channel.slide = channel.slide.map(Slide::next);

        if let Some(porta) = channel.portamento {
            let (porta, landed) = porta.next();
            channel.portamento = Some(porta);
            if let Some(target) = landed {
                let table_offset = channel.current_note as i32 - channel.base_note as i32;
                channel.base_note = target;
                channel.current_note = clamp_note(target as i32 + table_offset, max_index);
                channel.portamento = None;
            }
        }

        channel.on_off = channel.on_off.map(OnOff::next);
        channel.arpeggio = channel.arpeggio.map(Arpeggio::next);
        channel.vibrato = channel.vibrato.map(Vibrato::next);
    }
    state.envelope_slide = state.envelope_slide.map(Slide::next);
}

/// Run the instrument macros and build the register state for this tick
pub fn drive(state: &mut TrackerState, song: &SongData) -> RegisterSnapshot {
    let mut snapshot = RegisterSnapshot {
        noise: state.noise_base & NOISE_MASK,
        envelope_period: state.envelope_period(),
        envelope_shape: state.envelope_shape,
        force_envelope_shape: std::mem::take(&mut state.force_envelope_shape),
        ..RegisterSnapshot::default()
    };

    let noise_base = state.noise_base;
    for (index, channel) in state.channels.iter_mut().enumerate() {
        let (registers, noise) = drive_channel(channel, song, noise_base);
        snapshot.channels[index] = registers;
        // Noise is shared; the last channel using it decides
        if let Some(noise) = noise {
            snapshot.noise = noise;
        }
    }
    snapshot
}

fn drive_channel(channel: &mut ChannelEffectState, song: &SongData, noise_base: u8) -> (ChannelRegisters, Option<u8>) {
    if channel.muted || !channel.sound_enabled {
        return (ChannelRegisters::silent(channel.last_tone), None);
    }

    let step = match song.instrument(channel.instrument) {
        Some(instrument) => {
            let step = instrument.step(channel.instrument_position).copied().unwrap_or_default();
            channel.instrument_position = instrument.next_position(channel.instrument_position);
            step
        }
        None => InstrumentRow::default(),
    };

    let tone_offset = channel.tone_accumulator + step.tone_add as i32;
    if step.tone_accumulate {
        channel.tone_accumulator = tone_offset;
    }
    let note = channel.current_note as i32 + channel.arpeggio.map_or(0, |a| a.offset());
    let period = song.tuning.period(note) as i32
        + tone_offset
        + channel.slide_offset()
        + channel.vibrato.map_or(0, |v| v.offset());
    let tone = period.rem_euclid(TONE_PERIOD_RANGE) as u16;
    channel.last_tone = tone;

    let noise_offset = channel.noise_accumulator + step.noise_add as i32;
    if step.noise_accumulate {
        channel.noise_accumulator = noise_offset;
    }
    let noise = step
        .noise
        .then(|| ((noise_base as i32 + noise_offset) & NOISE_MASK as i32) as u8);

    match step.amplitude_slide {
        AmplitudeSlide::Up => {
            channel.amplitude_sliding = (channel.amplitude_sliding + 1).min(MAX_AMPLITUDE_SLIDE);
        }
        AmplitudeSlide::Down => {
            channel.amplitude_sliding = (channel.amplitude_sliding - 1).max(-MAX_AMPLITUDE_SLIDE);
        }
        AmplitudeSlide::None => {}
    }
    if let Some(volume) = step.volume {
        channel.last_volume = volume.min(15);
    }
    let level = (channel.last_volume as i32 + channel.amplitude_sliding as i32).clamp(0, 15) as u8;

    if !channel.gate_open() {
        return (ChannelRegisters::silent(tone), None);
    }

    let envelope = step.envelope && channel.envelope_enabled;
    let mut volume = scale_volume(channel.pattern_volume, level);
    if envelope {
        volume |= VOLUME_ENVELOPE_BIT;
    }
    let registers = ChannelRegisters {
        tone,
        volume,
        tone_enabled: step.tone,
        noise_enabled: step.noise,
        envelope_enabled: envelope,
    };
    (registers, noise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Portamento;
    use crate::instrument::{Instrument, Table};

    fn song_with(rows: Vec<InstrumentRow>, loop_index: Option<usize>) -> SongData {
        let mut song = SongData::new();
        song.instruments = vec![Instrument::new("test", rows, loop_index)];
        song.tables = vec![Table::new("octave", vec![0, 12], Some(0)).with_speed(2)];
        song
    }

    fn playing_state(note: usize) -> TrackerState {
        let mut state = TrackerState::default();
        let channel = &mut state.channels[0];
        channel.sound_enabled = true;
        channel.instrument = 1;
        channel.base_note = note;
        channel.current_note = note;
        state
    }

    #[test]
    fn test_plain_note_registers() {
        let song = song_with(vec![InstrumentRow::tone(15)], Some(0));
        let mut state = playing_state(36);
        let snapshot = drive(&mut state, &song);
        let registers = snapshot.channels[0];
        assert_eq!(registers.tone, song.tuning.period(36));
        assert_eq!(registers.volume, 15);
        assert!(registers.tone_enabled);
        assert!(!registers.noise_enabled);
        assert!(snapshot.channels[1].is_silent());
    }

    #[test]
    fn test_pattern_volume_scales_level() {
        let song = song_with(vec![InstrumentRow::tone(15)], Some(0));
        let mut state = playing_state(36);
        state.channels[0].pattern_volume = 8;
        assert_eq!(drive(&mut state, &song).channels[0].volume, scale_volume(8, 15));
    }

    #[test]
    fn test_muted_channel_is_silent_and_frozen() {
        let song = song_with(vec![InstrumentRow::tone(15), InstrumentRow::tone(5)], Some(0));
        let mut state = playing_state(36);
        state.set_muted(0, true);
        let snapshot = drive(&mut state, &song);
        assert!(snapshot.channels[0].is_silent());
        assert_eq!(state.channels[0].instrument_position, 0);
    }

    #[test]
    fn test_accumulating_tone_compounds() {
        let step = InstrumentRow {
            tone_add: 2,
            tone_accumulate: true,
            ..InstrumentRow::tone(15)
        };
        let song = song_with(vec![step], Some(0));
        let mut state = playing_state(36);
        let base = song.tuning.period(36);
        let tones: Vec<u16> = (0..3).map(|_| drive(&mut state, &song).channels[0].tone).collect();
        assert_eq!(tones, vec![base + 2, base + 4, base + 6]);
    }

    #[test]
    fn test_fresh_tone_add_does_not_compound() {
        let step = InstrumentRow {
            tone_add: -3,
            ..InstrumentRow::tone(15)
        };
        let song = song_with(vec![step], Some(0));
        let mut state = playing_state(36);
        let base = song.tuning.period(36);
        for _ in 0..3 {
            assert_eq!(drive(&mut state, &song).channels[0].tone, base - 3);
        }
    }

    #[test]
    fn test_noise_channel_sets_shared_noise() {
        let song = song_with(vec![InstrumentRow::noise(12, 3)], Some(0));
        let mut state = playing_state(36);
        state.noise_base = 30;
        let snapshot = drive(&mut state, &song);
        assert_eq!(snapshot.noise, (30 + 3) & 0x1F);
        assert!(snapshot.channels[0].noise_enabled);
        assert!(!snapshot.channels[0].tone_enabled);
    }

    #[test]
    fn test_amplitude_slide_saturates() {
        let step = InstrumentRow {
            amplitude_slide: AmplitudeSlide::Down,
            ..InstrumentRow::tone(10)
        };
        let song = song_with(vec![step], Some(0));
        let mut state = playing_state(36);
        let volumes: Vec<u8> = (0..12).map(|_| drive(&mut state, &song).channels[0].volume).collect();
        assert_eq!(volumes[0], 9);
        assert_eq!(volumes[9], 0);
        assert_eq!(volumes[11], 0);
        assert_eq!(state.channels[0].amplitude_sliding, -12);
    }

    #[test]
    fn test_empty_macro_plays_default_step() {
        let song = song_with(vec![], None);
        let mut state = playing_state(36);
        for _ in 0..3 {
            let registers = drive(&mut state, &song).channels[0];
            assert_eq!(registers.tone, song.tuning.period(36));
            assert_eq!(registers.volume, 15);
            assert!(registers.tone_enabled);
            assert!(!registers.noise_enabled);
            assert!(!registers.envelope_enabled);
        }
        assert_eq!(state.channels[0].instrument_position, 0);
    }

    #[test]
    fn test_inherited_volume() {
        let song = song_with(
            vec![
                InstrumentRow::tone(9),
                InstrumentRow {
                    volume: None,
                    ..InstrumentRow::default()
                },
            ],
            None,
        );
        let mut state = playing_state(36);
        drive(&mut state, &song);
        assert_eq!(drive(&mut state, &song).channels[0].volume, 9);
    }

    #[test]
    fn test_closed_gate_silences() {
        let song = song_with(vec![InstrumentRow::tone(15)], Some(0));
        let mut state = playing_state(36);
        state.channels[0].on_off = Some(OnOff {
            enabled: false,
            ..OnOff::new(2, 2)
        });
        assert!(drive(&mut state, &song).channels[0].is_silent());
    }

    #[test]
    fn test_envelope_needs_channel_and_step() {
        let step = InstrumentRow {
            envelope: true,
            ..InstrumentRow::tone(15)
        };
        let song = song_with(vec![step], Some(0));
        let mut state = playing_state(36);
        let registers = drive(&mut state, &song).channels[0];
        assert!(!registers.envelope_enabled);
        assert_eq!(registers.volume, 15);

        state.channels[0].envelope_enabled = true;
        let registers = drive(&mut state, &song).channels[0];
        assert!(registers.envelope_enabled);
        assert_eq!(registers.volume, 15 | VOLUME_ENVELOPE_BIT);
    }

    #[test]
    fn test_tone_period_wraps_at_twelve_bits() {
        let step = InstrumentRow {
            tone_add: -2,
            ..InstrumentRow::tone(15)
        };
        let song = song_with(vec![step], Some(0));
        let mut state = playing_state(36);
        state.channels[0].slide = Some(Slide::new(-1, 1, -(song.tuning.period(36) as i32)));
        assert_eq!(drive(&mut state, &song).channels[0].tone, 4094);
    }

    #[test]
    fn test_table_offset_and_speed() {
        let song = song_with(vec![InstrumentRow::tone(15)], Some(0));
        let mut state = playing_state(36);
        state.channels[0].table = 1;
        let notes: Vec<usize> = (0..6)
            .map(|_| {
                resolve_tables(&mut state, &song);
                state.channels[0].current_note
            })
            .collect();
        assert_eq!(notes, vec![36, 36, 48, 48, 36, 36]);
        assert_eq!(state.channels[0].base_note, 36);
    }

    #[test]
    fn test_portamento_lands_on_target() {
        let song = song_with(vec![InstrumentRow::tone(15)], Some(0));
        let mut state = playing_state(36);
        let from = song.tuning.period(36);
        let to = song.tuning.period(38);
        state.channels[0].portamento = Some(Portamento::new(from, to, 38, 8, 1));

        let mut ticks = 0;
        while state.channels[0].portamento.is_some() {
            advance_effects(&mut state, &song);
            let tone = drive(&mut state, &song).channels[0].tone;
            assert!(tone <= from && tone >= to);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(state.channels[0].base_note, 38);
        assert_eq!(drive(&mut state, &song).channels[0].tone, to);
    }

    #[test]
    fn test_envelope_slide_moves_period() {
        let song = SongData::new();
        let mut state = TrackerState::default();
        state.envelope_base = 100;
        state.envelope_slide = Some(Slide::new(10, 1, 0));
        advance_effects(&mut state, &song);
        advance_effects(&mut state, &song);
        assert_eq!(drive(&mut state, &song).envelope_period, 120);
    }

    #[test]
    fn test_force_flag_consumed() {
        let song = SongData::new();
        let mut state = TrackerState::default();
        state.force_envelope_shape = true;
        assert!(drive(&mut state, &song).force_envelope_shape);
        assert!(!drive(&mut state, &song).force_envelope_shape);
    }
}
