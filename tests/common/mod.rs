#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use aytracker::chip::{ChipCore, ChipLoader, ChipLog, RecordingChip};
use aytracker::instrument::{Instrument, InstrumentRow, TuningTable, DEFAULT_CHIP_CLOCK_HZ};
use aytracker::sequencer::{Note, NoteName, Pattern, Row};
use aytracker::{ChipError, Command, EngineConfig, EngineEvent, EngineHandle, RenderLoop};

pub const SAMPLE_RATE: u32 = 8000;
/// 8000 Hz / 50 Hz
pub const SAMPLES_PER_TICK: usize = 160;

pub fn test_config() -> EngineConfig {
    EngineConfig {
        sample_rate: SAMPLE_RATE,
        interrupt_hz: 50.0,
        fade_in_samples: 0,
        ..EngineConfig::default()
    }
}

pub fn recording_loader(chip: RecordingChip) -> ChipLoader {
    Box::new(move |_module: &[u8]| -> Result<Box<dyn ChipCore>, ChipError> {
        Ok(Box::new(chip.clone()))
    })
}

pub fn period(index: i32) -> u16 {
    TuningTable::equal_tempered(DEFAULT_CHIP_CLOCK_HZ).period(index)
}

/// Single-step instrument: tone on at full volume
pub fn lead() -> Vec<Instrument> {
    vec![Instrument::new("lead", vec![InstrumentRow::tone(15)], Some(0))]
}

/// Pattern with one note on channel A, row 0
pub fn single_note(name: NoteName, octave: u8, rows: usize) -> Pattern {
    let mut pattern = Pattern::new(rows);
    pattern.set_row(0, 0, Row::note(Note::pitched(name, octave), 1, 15));
    pattern
}

/// A render loop wired to a recording chip, driven frame by frame
pub struct Harness {
    pub render: RenderLoop,
    pub handle: EngineHandle,
    pub log: Arc<Mutex<ChipLog>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(test_config(), RecordingChip::new())
    }

    pub fn with(config: EngineConfig, chip: RecordingChip) -> Self {
        let log = chip.log();
        let (render, handle) = RenderLoop::with_buses(config, recording_loader(chip));
        Self { render, handle, log }
    }

    pub fn send(&self, cmd: Command) {
        assert!(self.handle.commands.send(cmd));
    }

    /// Init the chip, load instruments and one pattern, then start playing
    pub fn start(&mut self, speed: u8, pattern: Pattern) {
        self.send(Command::Init(Vec::new()));
        self.send(Command::InitInstruments(lead()));
        self.send(Command::InitSpeed(speed));
        self.send(Command::InitPattern {
            pattern,
            order_index: 0,
        });
        self.send(Command::Play);
    }

    pub fn run_frames(&mut self, frames: usize) -> Vec<(f32, f32)> {
        self.render.process_commands();
        (0..frames).map(|_| self.render.next_frame()).collect()
    }

    pub fn run_ticks(&mut self, ticks: usize) -> Vec<(f32, f32)> {
        self.run_frames(ticks * SAMPLES_PER_TICK)
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.handle.events.drain()
    }

    pub fn clear_writes(&self) {
        self.log.lock().writes.clear();
    }
}
