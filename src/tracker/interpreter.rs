use crate::chip::NOISE_MASK;
use crate::effects::{Arpeggio, Effect, EnvelopeEffect, OnOff, Portamento, Slide, Vibrato};
use crate::sequencer::{Note, Pattern, PatternRow, Row, TableRef, CHANNELS, ENVELOPE_SHAPE_KEEP, ENVELOPE_SHAPE_OFF};

use super::{ChannelEffectState, SongData, TrackerState};

/// Changes made by a row that the render loop reports to the control side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowOutcome {
    /// Speed set by a speed effect on this row
    pub speed: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelOutcome {
    speed: Option<u8>,
    envelope_shape: Option<u8>,
}

/// Apply the row under the playback head to every channel and to the
/// shared noise/envelope state.
pub fn interpret_row(state: &mut TrackerState, song: &SongData, pattern: &Pattern) -> RowOutcome {
    let index = state.position.row;
    let mut outcome = RowOutcome::default();

    for channel in 0..CHANNELS {
        let row = pattern.row(channel, index);
        let result = interpret_channel(&mut state.channels[channel], &row, song);

        if let Some(speed) = result.speed {
            state.position.set_speed(speed);
            outcome.speed = Some(state.position.speed);
        }
        // Later channels win when several set a shape on the same row
        if let Some(shape) = result.envelope_shape {
            state.envelope_shape = shape;
            state.force_envelope_shape = true;
        }
    }

    interpret_globals(state, &pattern.pattern_row(index));
    outcome
}

fn interpret_channel(channel: &mut ChannelEffectState, row: &Row, song: &SongData) -> ChannelOutcome {
    let effect = Effect::decode(row.effect);
    let continuing = matches!(
        effect,
        Some(Effect::SlideUp { .. } | Effect::SlideDown { .. } | Effect::Portamento { .. })
    );
    let previous_note = channel.base_note;
    let previous_slide = channel.slide.map_or(0, |s| s.offset);
    let was_sounding = channel.sound_enabled;

    let new_note = match row.note {
        Note::None => None,
        Note::Off => {
            channel.sound_enabled = false;
            channel.tone_accumulator = 0;
            if !continuing {
                channel.clear_accumulators();
            }
            channel.clear_modulation();
            None
        }
        Note::Pitched { .. } => {
            let index = row.note.index().unwrap_or(0).min(song.tuning.max_index());
            channel.sound_enabled = true;
            if !continuing {
                channel.instrument_position = 0;
                channel.clear_accumulators();
            }
            channel.base_note = index;
            channel.current_note = index;
            channel.table_position = 0;
            channel.table_counter = 0;
            channel.clear_modulation();
            Some(index)
        }
    };

    let instrument = row.instrument as usize;
    // Naming an instrument always restarts its macro, even the same one
    if instrument != 0 && song.instrument(instrument).is_some() {
        channel.instrument = instrument;
        channel.instrument_position = 0;
    }

    match row.table {
        TableRef::Keep => {}
        TableRef::Off => channel.table = 0,
        TableRef::Use(number) => {
            if song.table(number as usize).is_some() {
                channel.table = number as usize;
                channel.table_position = 0;
                channel.table_counter = 0;
            }
        }
    }

    if row.volume != 0 {
        channel.pattern_volume = row.volume.min(15);
    }

    let envelope_shape = match row.envelope_shape & 0x0F {
        ENVELOPE_SHAPE_KEEP => None,
        ENVELOPE_SHAPE_OFF => {
            channel.envelope_enabled = false;
            None
        }
        shape => {
            channel.envelope_enabled = true;
            Some(shape)
        }
    };

    let mut speed = None;
    match effect {
        Some(Effect::SlideUp { step, delay }) => {
            let step = -(step as i32);
            let slide = Slide::new(step, delay, previous_slide);
            channel.slide = Some(match new_note {
                Some(_) => slide.seeded(previous_slide + step),
                None => slide,
            });
        }
        Some(Effect::SlideDown { step, delay }) => {
            let step = step as i32;
            channel.slide = Some(match new_note {
                // A fresh note restarts the downward slide from a single step
                Some(_) => Slide::new(step, delay, 0).seeded(step),
                None => Slide::new(step, delay, previous_slide),
            });
        }
        Some(Effect::Portamento { step, delay }) => {
            if let Some(target) = new_note.filter(|_| was_sounding) {
                let from = song.tuning.period(previous_note as i32);
                let to = song.tuning.period(target as i32);
                channel.portamento = Some(Portamento::new(from, to, target, step, delay));
                // Keep sounding the old note until the glide lands
                channel.base_note = previous_note;
                channel.current_note = previous_note;
            }
        }
        Some(Effect::OnOff { on, off }) => {
            channel.on_off = (on != 0 || off != 0).then(|| OnOff::new(on, off));
        }
        Some(Effect::Arpeggio {
            semitone1,
            semitone2,
            delay,
        }) => {
            channel.arpeggio = (semitone1 != 0 || semitone2 != 0).then(|| Arpeggio::new(semitone1, semitone2, delay));
        }
        Some(Effect::Vibrato { speed, depth, delay }) => {
            channel.vibrato = (depth != 0).then(|| Vibrato::new(speed, depth, delay));
        }
        Some(Effect::Speed(value)) => speed = Some(value),
        None => {}
    }

    ChannelOutcome { speed, envelope_shape }
}

fn interpret_globals(state: &mut TrackerState, row: &PatternRow) {
    if row.noise != 0 {
        state.noise_base = row.noise & NOISE_MASK;
    }
    if row.envelope != 0 {
        state.envelope_base = row.envelope;
        state.envelope_slide = None;
    }
    if let Some(effect) = EnvelopeEffect::decode(row.envelope_effect) {
        let offset = state.envelope_slide.map_or(0, |s| s.offset);
        state.envelope_slide = Some(effect.slide(offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{CODE_ENVELOPE_SLIDE_UP, CODE_ON_OFF, CODE_PORTAMENTO, CODE_SLIDE_DOWN, CODE_SLIDE_UP, CODE_SPEED};
    use crate::instrument::{Instrument, InstrumentRow, Table};
    use crate::sequencer::{NoteName, RawEffect};

    fn song() -> SongData {
        let mut song = SongData::new();
        song.instruments = vec![
            Instrument::new("lead", vec![InstrumentRow::tone(15)], Some(0)),
            Instrument::new("pad", vec![InstrumentRow::tone(10)], Some(0)),
        ];
        song.tables = vec![Table::new("major", vec![0, 4, 7], Some(0))];
        song
    }

    fn c4() -> Note {
        Note::pitched(NoteName::C, 4)
    }

    fn run_row(state: &mut TrackerState, row: Row) -> RowOutcome {
        let mut pattern = Pattern::new(4);
        pattern.set_row(0, state.position.row, row);
        interpret_row(state, &song(), &pattern)
    }

    #[test]
    fn test_note_sets_channel_state() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 2, 12).with_table(TableRef::Use(1)));
        let channel = &state.channels[0];
        assert!(channel.sound_enabled);
        assert_eq!(channel.base_note, 36);
        assert_eq!(channel.current_note, 36);
        assert_eq!(channel.instrument, 2);
        assert_eq!(channel.table, 1);
        assert_eq!(channel.pattern_volume, 12);
        assert!(!state.channels[1].sound_enabled);
    }

    #[test]
    fn test_note_off_silences_and_clears() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15));
        state.channels[0].tone_accumulator = 30;
        state.channels[0].slide = Some(Slide::new(5, 1, 20));
        run_row(&mut state, Row::note(Note::Off, 0, 0));
        let channel = &state.channels[0];
        assert!(!channel.sound_enabled);
        assert_eq!(channel.tone_accumulator, 0);
        assert!(channel.slide.is_none());
    }

    #[test]
    fn test_note_off_with_slide_keeps_slide() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15));
        state.channels[0].tone_accumulator = 30;
        state.channels[0].slide = Some(Slide::new(5, 1, 20));
        run_row(
            &mut state,
            Row::note(Note::Off, 0, 0).with_effect(RawEffect::new(CODE_SLIDE_DOWN, 1, 4)),
        );
        let channel = &state.channels[0];
        assert!(!channel.sound_enabled);
        assert_eq!(channel.tone_accumulator, 0);
        let slide = channel.slide.unwrap();
        assert_eq!(slide.offset, 20);
        assert_eq!(slide.step, 4);
    }

    #[test]
    fn test_note_off_with_portamento_keeps_glide() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15));
        let target = Note::pitched(NoteName::E, 4);
        run_row(&mut state, Row::note(target, 0, 0).with_effect(RawEffect::new(CODE_PORTAMENTO, 1, 5)));
        state.channels[0].tone_accumulator = -8;
        run_row(
            &mut state,
            Row::note(Note::Off, 0, 0).with_effect(RawEffect::new(CODE_PORTAMENTO, 1, 5)),
        );
        let channel = &state.channels[0];
        assert!(!channel.sound_enabled);
        assert_eq!(channel.tone_accumulator, 0);
        assert_eq!(channel.portamento.map(|p| p.target_note), Some(40));
    }

    #[test]
    fn test_instrument_column_restarts_macro() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15));
        state.channels[0].instrument_position = 2;

        // Same instrument, no note
        run_row(&mut state, Row { instrument: 1, ..Row::default() });
        assert_eq!(state.channels[0].instrument_position, 0);
        assert_eq!(state.channels[0].base_note, 36);

        state.channels[0].instrument_position = 3;
        run_row(&mut state, Row { instrument: 2, ..Row::default() });
        assert_eq!(state.channels[0].instrument, 2);
        assert_eq!(state.channels[0].instrument_position, 0);

        // Unknown instruments leave the macro running
        state.channels[0].instrument_position = 1;
        run_row(&mut state, Row { instrument: 9, ..Row::default() });
        assert_eq!(state.channels[0].instrument, 2);
        assert_eq!(state.channels[0].instrument_position, 1);
    }

    #[test]
    fn test_unknown_instrument_and_table_ignored() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 0));
        run_row(&mut state, Row::note(c4(), 9, 0).with_table(TableRef::Use(7)));
        assert_eq!(state.channels[0].instrument, 1);
        assert_eq!(state.channels[0].table, 0);
    }

    #[test]
    fn test_speed_effect_reported() {
        let mut state = TrackerState::default();
        let outcome = run_row(&mut state, Row::default().with_effect(RawEffect::new(CODE_SPEED, 0, 3)));
        assert_eq!(outcome.speed, Some(3));
        assert_eq!(state.position.speed, 3);

        let outcome = run_row(&mut state, Row::default());
        assert_eq!(outcome.speed, None);
    }

    #[test]
    fn test_slide_seeding_with_note() {
        let mut state = TrackerState::default();
        state.channels[0].slide = Some(Slide::new(-4, 1, -12));
        run_row(&mut state, Row::note(c4(), 1, 0).with_effect(RawEffect::new(CODE_SLIDE_UP, 1, 4)));
        let slide = state.channels[0].slide.unwrap();
        assert_eq!(slide.offset, -16);
        assert!(slide.already_applied);

        run_row(&mut state, Row::note(c4(), 1, 0).with_effect(RawEffect::new(CODE_SLIDE_DOWN, 1, 4)));
        let slide = state.channels[0].slide.unwrap();
        assert_eq!(slide.offset, 4);
        assert!(slide.already_applied);
    }

    #[test]
    fn test_slide_without_note_continues() {
        let mut state = TrackerState::default();
        state.channels[0].slide = Some(Slide::new(4, 1, 20));
        run_row(&mut state, Row::default().with_effect(RawEffect::new(CODE_SLIDE_DOWN, 2, 6)));
        let slide = state.channels[0].slide.unwrap();
        assert_eq!(slide.offset, 20);
        assert_eq!(slide.step, 6);
        assert!(!slide.already_applied);
    }

    #[test]
    fn test_portamento_keeps_previous_note() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15));
        let target = Note::pitched(NoteName::E, 4);
        run_row(&mut state, Row::note(target, 0, 0).with_effect(RawEffect::new(CODE_PORTAMENTO, 1, 5)));
        let channel = &state.channels[0];
        assert_eq!(channel.base_note, 36);
        let porta = channel.portamento.unwrap();
        assert_eq!(porta.target_note, 40);
        assert!(porta.delta < 0);
    }

    #[test]
    fn test_portamento_on_silent_channel_plays_note() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15).with_effect(RawEffect::new(CODE_PORTAMENTO, 1, 5)));
        assert_eq!(state.channels[0].base_note, 36);
        assert!(state.channels[0].portamento.is_none());
    }

    #[test]
    fn test_new_note_clears_modulation_then_row_effect_applies() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15).with_effect(RawEffect::new(CODE_ON_OFF, 0, 0x21)));
        assert!(state.channels[0].on_off.is_some());
        run_row(&mut state, Row::note(c4(), 1, 15));
        assert!(state.channels[0].on_off.is_none());
    }

    #[test]
    fn test_envelope_shape_column() {
        let mut state = TrackerState::default();
        run_row(&mut state, Row::note(c4(), 1, 15).with_envelope_shape(10));
        assert_eq!(state.envelope_shape, 10);
        assert!(state.force_envelope_shape);
        assert!(state.channels[0].envelope_enabled);

        state.force_envelope_shape = false;
        run_row(&mut state, Row::default().with_envelope_shape(ENVELOPE_SHAPE_OFF));
        assert!(!state.channels[0].envelope_enabled);
        assert!(!state.force_envelope_shape);
        assert_eq!(state.envelope_shape, 10);
    }

    #[test]
    fn test_globals_set_noise_and_envelope() {
        let mut state = TrackerState::default();
        let mut pattern = Pattern::new(2);
        pattern.set_pattern_row(
            0,
            PatternRow {
                noise: 0x25,
                envelope: 800,
                envelope_effect: RawEffect::new(CODE_ENVELOPE_SLIDE_UP, 1, 16),
            },
        );
        interpret_row(&mut state, &song(), &pattern);
        assert_eq!(state.noise_base, 0x05);
        assert_eq!(state.envelope_base, 800);
        assert_eq!(state.envelope_slide.map(|s| s.step), Some(16));
    }
}
