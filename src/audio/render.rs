use std::collections::VecDeque;

use crate::chip::{ChipCore, ChipLoader, RegisterSnapshot, RegisterWriter};
use crate::command::{Command, CommandBus, CommandReceiver};
use crate::config::{EngineConfig, MIN_INTERRUPT_HZ};
use crate::error::ChipError;
use crate::event::{EngineEvent, EventBus, EventSender};
use crate::instrument::TuningTable;
use crate::sequencer::{Clock, Pattern, Position, MAX_PATTERN_LENGTH};
use crate::tracker::{self, SongData, TrackerState};

use super::EngineHandle;

/// A pattern together with the order entry it was loaded for
struct LoadedPattern {
    order_index: usize,
    pattern: Pattern,
}

enum ChipSlot {
    /// No init command yet; commands are queued
    Empty,
    Ready(Box<dyn ChipCore>),
    /// Load or a later call failed; silent until the next successful init
    Failed,
}

/// Linear gain ramp applied after every (re)start
struct FadeIn {
    length: u32,
    position: u32,
}

impl FadeIn {
    fn new(length: u32) -> Self {
        Self {
            length,
            position: length,
        }
    }

    fn restart(&mut self) {
        self.position = 0;
    }

    fn next_gain(&mut self) -> f32 {
        if self.position >= self.length {
            return 1.0;
        }
        let gain = self.position as f32 / self.length as f32;
        self.position += 1;
        gain
    }
}

/// Real-time side of the engine.
///
/// Owns all playback state. Each output sample it advances the tick clock,
/// runs the tracker on tick boundaries, streams register changes to the chip
/// core and reads back one stereo frame. Control happens exclusively through
/// [`Command`]s; progress is reported through [`EngineEvent`]s.
pub struct RenderLoop {
    config: EngineConfig,
    loader: ChipLoader,
    chip: ChipSlot,
    commands: CommandReceiver,
    events: EventSender,
    /// Commands that arrived before the chip was ready, oldest first
    pending: VecDeque<Command>,
    clock: Clock,
    state: TrackerState,
    song: SongData,
    /// Tuning came from the control side and must survive clock changes
    custom_tuning: bool,
    current: Option<LoadedPattern>,
    /// Pattern uploaded ahead of time for a later order entry
    staged: Option<LoadedPattern>,
    /// Order entry whose pattern request was dropped on a full event bus
    unanswered: Option<usize>,
    writer: RegisterWriter,
    fade: FadeIn,
}

impl RenderLoop {
    pub fn new(config: EngineConfig, loader: ChipLoader, commands: CommandReceiver, events: EventSender) -> Self {
        Self {
            clock: Clock::new(config.sample_rate, config.interrupt_hz),
            state: TrackerState::new(config.initial_speed),
            song: SongData {
                tuning: TuningTable::equal_tempered(config.chip_clock_hz),
                ..SongData::default()
            },
            fade: FadeIn::new(config.fade_in_samples),
            config,
            loader,
            chip: ChipSlot::Empty,
            commands,
            events,
            pending: VecDeque::new(),
            custom_tuning: false,
            current: None,
            staged: None,
            unanswered: None,
            writer: RegisterWriter::new(),
        }
    }

    /// Build a render loop with fresh command and event buses
    pub fn with_buses(config: EngineConfig, loader: ChipLoader) -> (Self, EngineHandle) {
        let commands = CommandBus::new();
        let events = EventBus::new();
        let render = Self::new(config, loader, commands.receiver(), events.sender());
        let handle = EngineHandle {
            commands: commands.sender(),
            events: events.receiver(),
        };
        (render, handle)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    pub fn has_chip(&self) -> bool {
        matches!(self.chip, ChipSlot::Ready(_))
    }

    /// Commands waiting for the chip core
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Switch to the output device's actual rate
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.config.sample_rate {
            return;
        }
        self.config.sample_rate = sample_rate;
        self.clock.set_sample_rate(sample_rate);
        self.reconfigure();
    }

    /// Handle every command queued on the bus
    pub fn process_commands(&mut self) {
        while let Some(cmd) = self.commands.try_recv() {
            self.receive(cmd);
        }
    }

    /// Fill an interleaved buffer of `channels` samples per frame.
    /// Channels beyond the first two get the mono mix.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        self.process_commands();
        for frame in out.chunks_mut(channels.max(1)) {
            let (left, right) = self.next_frame();
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = match ch {
                    0 => left,
                    1 => right,
                    _ => (left + right) * 0.5,
                };
            }
        }
    }

    /// Produce one stereo frame
    pub fn next_frame(&mut self) -> (f32, f32) {
        if !self.has_chip() {
            return (0.0, 0.0);
        }
        if self.clock.tick() {
            self.tick();
        }
        match self.synthesize() {
            Ok((left, right)) => {
                let gain = self.fade.next_gain();
                (left * gain, right * gain)
            }
            Err(err) => {
                self.fail(err);
                (0.0, 0.0)
            }
        }
    }

    fn synthesize(&mut self) -> Result<(f32, f32), ChipError> {
        let ChipSlot::Ready(chip) = &mut self.chip else {
            return Ok((0.0, 0.0));
        };
        chip.process()?;
        chip.remove_dc()?;
        chip.output()
    }

    fn tick(&mut self) {
        self.retry_request();
        let Some(current) = self.current.as_ref() else {
            // Nothing to play yet: hold position and stay quiet
            let silent = self.writer.previous().map(RegisterSnapshot::silenced).unwrap_or_default();
            self.write_snapshot(&silent);
            return;
        };
        let pattern_len = current.pattern.len();
        let output = tracker::process_tick(&mut self.state, &self.song, &current.pattern);

        if let Some(row) = output.row {
            let position = self.state.position;
            self.events.send(EngineEvent::PositionUpdate {
                row: position.row,
                tick: position.tick,
                order_index: position.order_index,
            });
            if let Some(speed) = row.speed {
                self.events.send(EngineEvent::SpeedUpdate(speed));
            }
        }

        self.write_snapshot(&output.snapshot);

        if self.state.position.advance(pattern_len) {
            self.cross_boundary();
        }
    }

    /// The head moved to a new order entry
    fn cross_boundary(&mut self) {
        let index = self.state.position.order_index;
        match self.staged.take() {
            Some(next) if next.order_index == index => {
                self.current = Some(next);
                self.clamp_to_current();
            }
            staged => {
                self.staged = staged;
                if self.current.as_ref().is_some_and(|p| p.order_index != index) {
                    // Keep playing what we have until the answer arrives
                    self.request_pattern(index);
                }
            }
        }
    }

    /// Make the current pattern match the head after a jump. Without a
    /// matching pattern the loop holds silent until one is loaded.
    fn sync_pattern(&mut self) {
        let index = self.state.position.order_index;
        if self.current.as_ref().is_some_and(|p| p.order_index == index) {
            return;
        }
        if self.staged.as_ref().is_some_and(|p| p.order_index == index) {
            self.current = self.staged.take();
            self.clamp_to_current();
            return;
        }
        self.current = None;
        self.request_pattern(index);
    }

    fn request_pattern(&mut self, index: usize) {
        tracing::debug!("requesting pattern for order entry {}", index);
        let sent = self.events.send(EngineEvent::RequestPattern(index));
        if !sent && self.unanswered != Some(index) {
            tracing::warn!("event bus full, pattern request for order entry {} dropped", index);
        }
        self.unanswered = (!sent).then_some(index);
    }

    /// Send a dropped request again while the head still waits on it
    fn retry_request(&mut self) {
        let Some(index) = self.unanswered else {
            return;
        };
        let loaded = |slot: &Option<LoadedPattern>| slot.as_ref().is_some_and(|p| p.order_index == index);
        if index == self.state.position.order_index && !loaded(&self.current) && !loaded(&self.staged) {
            self.request_pattern(index);
        } else {
            self.unanswered = None;
        }
    }

    fn clamp_to_current(&mut self) {
        if let Some(current) = &self.current {
            self.state.position.clamp_row(current.pattern.len());
        }
    }

    fn write_snapshot(&mut self, snapshot: &RegisterSnapshot) {
        let ChipSlot::Ready(chip) = &mut self.chip else {
            return;
        };
        if let Err(err) = self.writer.write(snapshot, chip.as_mut()) {
            self.fail(err);
        }
    }

    fn fail(&mut self, err: ChipError) {
        tracing::error!("chip core disabled: {}", err);
        self.chip = ChipSlot::Failed;
        self.clock.stop();
        self.events.send(EngineEvent::ChipFailed(err.to_string()));
    }

    fn reconfigure(&mut self) {
        let ChipSlot::Ready(chip) = &mut self.chip else {
            return;
        };
        if let Err(err) = configure_chip(chip.as_mut(), &self.config) {
            self.fail(err);
            return;
        }
        // The core may have reset its registers
        self.writer.invalidate();
    }

    fn receive(&mut self, cmd: Command) {
        match cmd {
            Command::Init(module) => self.init(&module),
            cmd if !self.has_chip() => self.pending.push_back(cmd),
            cmd => self.apply(cmd),
        }
    }

    fn init(&mut self, module: &[u8]) {
        let result = (self.loader)(module).and_then(|mut chip| {
            configure_chip(chip.as_mut(), &self.config)?;
            Ok(chip)
        });

        match result {
            Ok(chip) => {
                tracing::info!(
                    "chip core ready ({:?}, {} Hz clock, {} Hz output)",
                    self.config.chip_type,
                    self.config.chip_clock_hz,
                    self.config.sample_rate
                );
                self.chip = ChipSlot::Ready(chip);
                self.writer.invalidate();
                self.fade.restart();
                while let Some(cmd) = self.pending.pop_front() {
                    self.apply(cmd);
                }
            }
            Err(err) => {
                tracing::error!("chip core failed to load: {}", err);
                self.chip = ChipSlot::Failed;
                self.events.send(EngineEvent::ChipFailed(err.to_string()));
            }
        }
    }

    fn apply(&mut self, cmd: Command) {
        tracing::debug!("{}", cmd.description());
        match cmd {
            Command::Init(module) => self.init(&module),
            Command::UpdateAyFrequency(hz) => {
                self.config.chip_clock_hz = hz.max(1);
                if !self.custom_tuning {
                    self.song.tuning = TuningTable::equal_tempered(self.config.chip_clock_hz);
                }
                self.reconfigure();
            }
            Command::UpdateIntFrequency(hz) => {
                if !hz.is_finite() {
                    tracing::warn!("ignoring interrupt rate {}", hz);
                    return;
                }
                self.config.interrupt_hz = hz.max(MIN_INTERRUPT_HZ);
                self.clock.set_interrupt_hz(self.config.interrupt_hz);
            }
            Command::Play => {
                if self.is_playing() {
                    return;
                }
                self.state.position.tick = 0;
                self.sync_pattern();
                self.start();
            }
            Command::PlayFromRow {
                row,
                order_index,
                speed,
            } => {
                if let Some(speed) = speed {
                    self.state.position.set_speed(speed);
                }
                let index = order_index.unwrap_or(self.state.position.order_index);
                self.state.position.jump(row, index, MAX_PATTERN_LENGTH);
                self.sync_pattern();
                self.clamp_to_current();
                self.start();
            }
            Command::Stop => self.stop(),
            Command::InitPattern { pattern, order_index } => {
                let head = self.state.position.order_index;
                let loaded = LoadedPattern { order_index, pattern };
                if order_index == head {
                    self.current = Some(loaded);
                    self.clamp_to_current();
                } else if self.current.is_none() && !self.is_playing() {
                    self.state.position.jump(0, order_index, loaded.pattern.len());
                    self.current = Some(loaded);
                } else {
                    self.staged = Some(loaded);
                }
            }
            Command::SetPatternData(pattern) => {
                match &mut self.current {
                    Some(current) => current.pattern = pattern,
                    None => {
                        self.current = Some(LoadedPattern {
                            order_index: self.state.position.order_index,
                            pattern,
                        })
                    }
                }
                self.clamp_to_current();
            }
            Command::UpdateOrder(order) => {
                self.state.position.set_order_len(order.len());
                let len = self.state.position.order_len();
                if self.staged.as_ref().is_some_and(|p| p.order_index >= len) {
                    self.staged = None;
                }
            }
            Command::InitTuningTable(periods) => {
                self.song.tuning = TuningTable::from_periods(periods);
                self.custom_tuning = true;
            }
            Command::InitSpeed(speed) => self.state.position.set_speed(speed),
            Command::InitTables(tables) => self.song.tables = tables,
            Command::InitInstruments(instruments) => self.song.instruments = instruments,
            Command::SetChannelMute { channel, muted } => self.state.set_muted(channel, muted),
            Command::ChangePatternDuringPlayback {
                row,
                order_index,
                pattern,
                speed,
            } => {
                if let Some(speed) = speed {
                    self.state.position.set_speed(speed);
                }
                if row.is_some() || order_index.is_some() {
                    let position = self.state.position;
                    self.state.position.jump(
                        row.unwrap_or(position.row),
                        order_index.unwrap_or(position.order_index),
                        MAX_PATTERN_LENGTH,
                    );
                }
                match pattern {
                    Some(pattern) => {
                        self.current = Some(LoadedPattern {
                            order_index: self.state.position.order_index,
                            pattern,
                        });
                    }
                    None => self.sync_pattern(),
                }
                self.clamp_to_current();
            }
        }
    }

    fn start(&mut self) {
        let position = self.state.position;
        tracing::info!("playing from order {} row {}", position.order_index, position.row);
        self.clock.start();
        self.fade.restart();
    }

    fn stop(&mut self) {
        tracing::info!("stopped");
        self.clock.stop();
        self.state.reset();
        self.write_snapshot(&RegisterSnapshot::default());
    }
}

/// Apply chip type, clock, sample rate and stereo placement
fn configure_chip(chip: &mut dyn ChipCore, config: &EngineConfig) -> Result<(), ChipError> {
    chip.configure(config.chip_type, config.chip_clock_hz, config.sample_rate)?;
    for (channel, (left, right)) in config.stereo.pans().into_iter().enumerate() {
        chip.set_pan(channel, left, right)?;
    }
    Ok(())
}
