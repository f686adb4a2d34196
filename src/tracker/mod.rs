//! Tick-level song playback.
//!
//! [`process_tick`] runs one interrupt of the tracker: the row under the
//! head is interpreted on its first tick, then table offsets are resolved,
//! effects are stepped and the instrument macros produce the register
//! snapshot to hand to the chip. Moving the head is left to the caller,
//! which owns pattern fetching.

pub mod driver;
pub mod interpreter;
pub mod song;
pub mod state;

use crate::chip::RegisterSnapshot;
use crate::sequencer::Pattern;

pub use driver::{advance_effects, drive, resolve_tables};
pub use interpreter::{interpret_row, RowOutcome};
pub use song::SongData;
pub use state::{ChannelEffectState, TrackerState};

/// Result of one tracker tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutput {
    pub snapshot: RegisterSnapshot,
    /// Set on the first tick of a row
    pub row: Option<RowOutcome>,
}

pub fn process_tick(state: &mut TrackerState, song: &SongData, pattern: &Pattern) -> TickOutput {
    let row = (state.position.tick == 0).then(|| interpret_row(state, song, pattern));
    resolve_tables(state, song);
    advance_effects(state, song);
    let snapshot = drive(state, song);
    TickOutput { snapshot, row }
}
