use aytracker::effects::{CODE_ARPEGGIO, CODE_ENVELOPE_SLIDE_DOWN, CODE_PORTAMENTO, CODE_VIBRATO};
use aytracker::instrument::{AmplitudeSlide, Instrument, InstrumentRow, Table};
use aytracker::sequencer::{Note, NoteName, Pattern, PatternRow, RawEffect, Row, TableRef};

const LEAD: u8 = 1;
const PLUCK: u8 = 2;
const HAT: u8 = 3;
const KICK: u8 = 4;
const BUZZ: u8 = 5;

const ROWS: usize = 32;

/// Small built-in song for the demo player
pub struct DemoSong {
    pub speed: u8,
    pub order: Vec<usize>,
    pub patterns: Vec<Pattern>,
    pub instruments: Vec<Instrument>,
    pub tables: Vec<Table>,
}

impl DemoSong {
    pub fn new() -> Self {
        Self {
            speed: 4,
            order: vec![0, 1, 0, 2],
            patterns: vec![groove(), melody(), buzz()],
            instruments: instruments(),
            tables: vec![Table::new("minor", vec![0, 3, 7], Some(0)), Table::new("octave", vec![0, 12], Some(0)).with_speed(2)],
        }
    }

    /// Pattern played at an order entry
    pub fn pattern_for(&self, order_index: usize) -> Option<&Pattern> {
        self.order.get(order_index).and_then(|&number| self.patterns.get(number))
    }
}

fn instruments() -> Vec<Instrument> {
    let lead = vec![
        InstrumentRow::tone(15),
        InstrumentRow::tone(14),
        InstrumentRow::tone(13),
        InstrumentRow::tone(12),
        InstrumentRow::tone(11),
    ];

    let pluck = [15, 12, 9, 7, 5, 4, 3, 2].into_iter().map(InstrumentRow::tone).collect();

    let hat = vec![
        InstrumentRow::noise(12, 0),
        InstrumentRow::noise(8, 0),
        InstrumentRow::noise(4, 0),
        InstrumentRow::noise(0, 0),
    ];

    // Pitch drops fast while the volume dies away
    let kick = [15, 13, 10, 6, 0]
        .into_iter()
        .map(|volume| InstrumentRow {
            tone_add: 40,
            tone_accumulate: true,
            ..InstrumentRow::tone(volume)
        })
        .collect();

    let buzz = vec![
        InstrumentRow {
            envelope: true,
            ..InstrumentRow::tone(15)
        },
        InstrumentRow {
            envelope: true,
            amplitude_slide: AmplitudeSlide::Down,
            volume: None,
            ..InstrumentRow::tone(15)
        },
    ];

    vec![
        Instrument::new("lead", lead, Some(4)),
        Instrument::new("pluck", pluck, Some(7)),
        Instrument::new("hat", hat, Some(3)),
        Instrument::new("kick", kick, Some(4)),
        Instrument::new("buzz", buzz, Some(1)),
    ]
}

fn note(name: NoteName, octave: u8) -> Note {
    Note::pitched(name, octave)
}

/// Kick on every half bar, hats in between
fn drums(pattern: &mut Pattern, channel: usize) {
    for row in 0..ROWS {
        if row % 8 == 0 {
            pattern.set_row(channel, row, Row::note(note(NoteName::C, 4), KICK, 15));
        } else if row % 4 == 2 {
            pattern.set_row(channel, row, Row::note(note(NoteName::C, 6), HAT, 10));
        }
    }
}

fn bass(pattern: &mut Pattern, channel: usize, roots: [NoteName; 4]) {
    for (bar, root) in roots.into_iter().enumerate() {
        for beat in 0..2 {
            let row = bar * 8 + beat * 4;
            pattern.set_row(channel, row, Row::note(note(root, 2), PLUCK, 14));
        }
    }
}

fn groove() -> Pattern {
    let mut pattern = Pattern::new(ROWS);
    bass(&mut pattern, 0, [NoteName::C, NoteName::A, NoteName::F, NoteName::G]);

    let arpeggio = RawEffect::new(CODE_ARPEGGIO, 1, 0x37);
    pattern.set_row(1, 0, Row::note(note(NoteName::C, 4), LEAD, 12).with_effect(arpeggio));
    pattern.set_row(1, 8, Row::note(note(NoteName::A, 3), LEAD, 12).with_effect(arpeggio));
    pattern.set_row(1, 16, Row::note(note(NoteName::F, 3), LEAD, 12).with_table(TableRef::Use(2)));
    pattern.set_row(1, 24, Row::note(note(NoteName::G, 3), LEAD, 12).with_table(TableRef::Off));
    pattern.set_row(1, 30, Row::note(Note::Off, 0, 0));

    drums(&mut pattern, 2);
    pattern.set_pattern_row(
        0,
        PatternRow {
            noise: 1,
            ..PatternRow::default()
        },
    );
    pattern
}

fn melody() -> Pattern {
    let mut pattern = Pattern::new(ROWS);
    bass(&mut pattern, 0, [NoteName::C, NoteName::A, NoteName::F, NoteName::G]);

    let line = [
        (0, NoteName::G, 4),
        (4, NoteName::DSharp, 4),
        (8, NoteName::C, 4),
        (14, NoteName::D, 4),
        (16, NoteName::DSharp, 4),
        (20, NoteName::F, 4),
        (24, NoteName::G, 4),
    ];
    for (row, name, octave) in line {
        pattern.set_row(1, row, Row::note(note(name, octave), LEAD, 13).with_table(TableRef::Off));
    }
    pattern.set_row(
        1,
        4,
        Row::note(note(NoteName::DSharp, 4), 0, 0).with_effect(RawEffect::new(CODE_PORTAMENTO, 1, 6)),
    );
    pattern.set_row(1, 24, Row::note(note(NoteName::G, 4), LEAD, 13).with_effect(RawEffect::new(CODE_VIBRATO, 0, 0x32)));

    drums(&mut pattern, 2);
    pattern
}

fn buzz() -> Pattern {
    let mut pattern = Pattern::new(ROWS);
    pattern.set_row(0, 0, Row::note(note(NoteName::C, 3), BUZZ, 15).with_envelope_shape(10));
    pattern.set_row(0, 16, Row::note(note(NoteName::G, 2), BUZZ, 15).with_envelope_shape(10));
    pattern.set_row(0, 28, Row::note(Note::Off, 0, 0).with_envelope_shape(15));
    pattern.set_pattern_row(
        0,
        PatternRow {
            envelope: 400,
            envelope_effect: RawEffect::new(CODE_ENVELOPE_SLIDE_DOWN, 2, 3),
            ..PatternRow::default()
        },
    );
    pattern.set_pattern_row(
        16,
        PatternRow {
            envelope: 600,
            ..PatternRow::default()
        },
    );

    pattern.set_row(1, 0, Row::note(note(NoteName::C, 4), LEAD, 10).with_table(TableRef::Use(1)));
    drums(&mut pattern, 2);
    pattern
}
