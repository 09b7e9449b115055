//! This crate provides the core logic for a delta sheet Turing machine: a single-tape machine
//! over the alphabet `{1, 0, B}` whose transition table is edited as a sheet and whose
//! execution is shown as an animated tape and sheet cursor.
//! It includes the tape and sheet models, the phase-by-phase execution engine, the
//! application context a front end drives, static analysis of sheets and built-in presets.

pub mod analyzer;
pub mod animation;
pub mod config;
pub mod machine;
pub mod presets;
pub mod sheet;
pub mod simulator;
pub mod tape;
pub mod types;

/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the `MachineConfig` struct from the config module.
pub use config::MachineConfig;
/// Re-exports the engine and its view types from the machine module.
pub use machine::{RunMode, Shutter, TuringMachine};
/// Re-exports `Preset`, `PresetInfo`, `PresetManager` and `PRESETS` from the presets module.
pub use presets::{Preset, PresetInfo, PresetManager, PRESETS};
/// Re-exports the sheet and its cursor from the sheet module.
pub use sheet::{Cursor, Row, Sheet};
/// Re-exports the application context and its input types from the simulator module.
pub use simulator::{Field, Key, Region, Simulator};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the value types shared across the crate from the types module.
pub use types::{
    Delta, Direction, Halt, MachineError, Mode, StateRef, Step, Symbol, Transition, HALT_SENTINEL,
};
