mod demo;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aytracker::audio::AudioEngine;
use aytracker::chip::{ChipCore, ChipLoader, WasmChipCore};
use aytracker::sequencer::CHANNELS;
use aytracker::{ChipError, Command, EngineConfig, EngineEvent, EngineHandle, RenderLoop};

use demo::DemoSong;

/// aytracker - AY-3-8910 tracker playback engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebAssembly chip core to synthesize with
    #[arg(long)]
    core: PathBuf,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Song interrupt rate in Hz
    #[arg(long)]
    interrupt_hz: Option<f64>,

    /// Chip clock in Hz
    #[arg(long)]
    chip_clock: Option<u32>,

    /// Channels to mute, e.g. "A,C"
    #[arg(long, value_delimiter = ',')]
    mute: Vec<char>,

    /// Stop after this many seconds
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(hz) = args.interrupt_hz {
        config.interrupt_hz = hz;
    }
    if let Some(hz) = args.chip_clock {
        config.chip_clock_hz = hz;
    }
    let config = config.sanitized()?;

    let module = std::fs::read(&args.core)
        .with_context(|| format!("Failed to read chip core {}", args.core.display()))?;

    let offsets = config.output_offsets;
    let loader: ChipLoader = Box::new(move |bytes: &[u8]| -> Result<Box<dyn ChipCore>, ChipError> {
        let core = WasmChipCore::load(bytes, offsets)?;
        Ok(Box::new(core))
    });

    let (render, handle) = RenderLoop::with_buses(config, loader);
    let _audio = AudioEngine::new(render)?;

    let song = DemoSong::new();
    upload(&handle, &song, module, &args.mute)?;
    play(&handle, &song, Duration::from_secs_f64(args.seconds.max(0.0)))?;

    handle.commands.send(Command::Stop);
    // Let the stop reach the audio thread before the stream is dropped
    std::thread::sleep(Duration::from_millis(200));
    Ok(())
}

/// Send the chip module and the whole demo song, then start playback
fn upload(handle: &EngineHandle, song: &DemoSong, module: Vec<u8>, mute: &[char]) -> Result<()> {
    let first = song.pattern_for(0).context("Demo song has no patterns")?.clone();
    let commands = [
        Command::Init(module),
        Command::InitInstruments(song.instruments.clone()),
        Command::InitTables(song.tables.clone()),
        Command::UpdateOrder(song.order.clone()),
        Command::InitSpeed(song.speed),
        Command::InitPattern {
            pattern: first,
            order_index: 0,
        },
    ];
    for cmd in commands {
        if !handle.commands.send(cmd) {
            anyhow::bail!("Render loop is not accepting commands");
        }
    }

    for letter in mute {
        let channel = (letter.to_ascii_uppercase() as usize).wrapping_sub('A' as usize);
        if channel < CHANNELS {
            handle.commands.send(Command::SetChannelMute { channel, muted: true });
        } else {
            tracing::warn!("ignoring unknown channel '{}'", letter);
        }
    }

    handle.commands.send(Command::Play);
    Ok(())
}

/// Serve pattern requests and report progress until `duration` has passed
fn play(handle: &EngineHandle, song: &DemoSong, duration: Duration) -> Result<()> {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        let Some(event) = handle.events.recv_timeout(Duration::from_millis(100)) else {
            continue;
        };

        match &event {
            EngineEvent::PositionUpdate { row, order_index, .. } => {
                if *row == 0 {
                    tracing::info!("{}", event.description());
                    // Stage the following pattern so the boundary needs no round trip
                    let next = (order_index + 1) % song.order.len().max(1);
                    if let Some(pattern) = song.pattern_for(next) {
                        tracing::debug!(
                            "staging order entry {} (lead opens on {})",
                            next,
                            pattern.row(1, 0).note.label()
                        );
                        handle.commands.send(Command::InitPattern {
                            pattern: pattern.clone(),
                            order_index: next,
                        });
                    }
                }
            }
            EngineEvent::RequestPattern(index) => match song.pattern_for(*index) {
                Some(pattern) => {
                    handle.commands.send(Command::InitPattern {
                        pattern: pattern.clone(),
                        order_index: *index,
                    });
                }
                None => tracing::warn!("no pattern for order entry {}", index),
            },
            EngineEvent::SpeedUpdate(_) => tracing::info!("{}", event.description()),
            EngineEvent::ChipFailed(reason) => anyhow::bail!("Chip core failed: {}", reason),
        }
    }
    Ok(())
}
