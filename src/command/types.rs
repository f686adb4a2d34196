use serde::{Deserialize, Serialize};

use crate::instrument::{Instrument, Table};
use crate::sequencer::Pattern;

/// Control-side request to the render loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    // Chip
    /// Compile and start the chip core from a binary module
    Init(Vec<u8>),
    UpdateAyFrequency(u32),
    UpdateIntFrequency(f64),

    // Transport
    Play,
    PlayFromRow {
        row: usize,
        order_index: Option<usize>,
        speed: Option<u8>,
    },
    Stop,

    // Song data
    InitPattern { pattern: Pattern, order_index: usize },
    SetPatternData(Pattern),
    UpdateOrder(Vec<usize>),
    InitTuningTable(Vec<u16>),
    InitSpeed(u8),
    InitTables(Vec<Table>),
    InitInstruments(Vec<Instrument>),

    // Live
    SetChannelMute { channel: usize, muted: bool },
    ChangePatternDuringPlayback {
        row: Option<usize>,
        order_index: Option<usize>,
        pattern: Option<Pattern>,
        speed: Option<u8>,
    },
}

impl Command {
    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::Init(bytes) => format!("Init chip core ({} bytes)", bytes.len()),
            Command::UpdateAyFrequency(hz) => format!("Set chip clock to {} Hz", hz),
            Command::UpdateIntFrequency(hz) => format!("Set interrupt rate to {:.2} Hz", hz),
            Command::Play => "Play".to_string(),
            Command::PlayFromRow {
                row,
                order_index,
                speed,
            } => {
                let mut text = format!("Play from row {}", row);
                if let Some(index) = order_index {
                    text.push_str(&format!(" of order entry {}", index));
                }
                if let Some(speed) = speed {
                    text.push_str(&format!(" at speed {}", speed));
                }
                text
            }
            Command::Stop => "Stop".to_string(),
            Command::InitPattern { pattern, order_index } => {
                format!("Load {}-row pattern for order entry {}", pattern.len(), order_index)
            }
            Command::SetPatternData(pattern) => format!("Replace pattern data ({} rows)", pattern.len()),
            Command::UpdateOrder(order) => format!("Set order list ({} entries)", order.len()),
            Command::InitTuningTable(periods) => format!("Load tuning table ({} notes)", periods.len()),
            Command::InitSpeed(speed) => format!("Set speed to {}", speed),
            Command::InitTables(tables) => format!("Load {} tables", tables.len()),
            Command::InitInstruments(instruments) => format!("Load {} instruments", instruments.len()),
            Command::SetChannelMute { channel, muted } => {
                format!("{} channel {}", if *muted { "Mute" } else { "Unmute" }, channel)
            }
            Command::ChangePatternDuringPlayback {
                row, order_index, ..
            } => match (row, order_index) {
                (Some(row), Some(index)) => format!("Jump to row {} of order entry {}", row, index),
                (Some(row), None) => format!("Jump to row {}", row),
                (None, Some(index)) => format!("Jump to order entry {}", index),
                (None, None) => "Update playing pattern".to_string(),
            },
        }
    }
}
