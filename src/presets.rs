use crate::config::MachineConfig;
use crate::sheet::Sheet;
use crate::types::{Direction, MachineError, StateRef, Symbol};

use crate::types::Direction::{Left as L, Right as R};
use crate::types::StateRef::{Halt as H, State as S};
use crate::types::Symbol::{Blank as B, One as I, Zero as O};

/// One rule of a preset: `(row, read, write, direction, next)`.
type Rule = (usize, Symbol, Symbol, Direction, StateRef);

/// A built-in delta sheet together with the tape it is meant to run on.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub rows: usize,
    pub initial: StateRef,
    pub input: &'static str,
    pub rules: Vec<Rule>,
}

impl Preset {
    /// Builds the preset's sheet.
    pub fn sheet(&self, config: &MachineConfig) -> Result<Sheet, MachineError> {
        let mut sheet = Sheet::new(config);
        for _ in 1..self.rows {
            sheet.add_row();
        }
        for &(row, read, write, direction, next) in &self.rules {
            sheet.rule(row, read, write, direction, next)?;
        }
        sheet.set_initial(self.initial)?;
        Ok(sheet)
    }

    /// Returns the tape content, written from the head rightwards.
    pub fn tape(&self) -> Vec<Symbol> {
        Symbol::parse_all(self.input)
    }
}

lazy_static::lazy_static! {
    pub static ref PRESETS: Vec<Preset> = vec![
        Preset {
            name: "Bit Inverter",
            description: "Flips every bit and stops at the first blank",
            rows: 1,
            initial: S(0),
            input: "1011001",
            rules: vec![
                (0, I, O, R, S(0)),
                (0, O, I, R, S(0)),
            ],
        },
        Preset {
            name: "Binary Increment",
            description: "Adds one to a binary number, head on its first digit",
            rows: 2,
            initial: S(0),
            input: "1011",
            rules: vec![
                (0, I, I, R, S(0)),
                (0, O, O, R, S(0)),
                (0, B, B, L, S(1)),
                (1, I, O, L, S(1)),
                (1, O, I, L, H),
                (1, B, I, L, H),
            ],
        },
        Preset {
            name: "Busy Beaver (2-state)",
            description: "Writes four ones in six steps on a blank tape",
            rows: 2,
            initial: S(0),
            input: "",
            rules: vec![
                (0, B, I, R, S(1)),
                (0, O, I, R, S(1)),
                (0, I, I, L, S(1)),
                (1, B, I, L, S(0)),
                (1, O, I, L, S(0)),
                (1, I, I, R, H),
            ],
        },
        Preset {
            name: "Parity Checker",
            description: "Appends 1 if the input has an odd number of ones, 0 otherwise",
            rows: 2,
            initial: S(0),
            input: "1101",
            rules: vec![
                (0, I, I, R, S(1)),
                (0, O, O, R, S(0)),
                (0, B, O, R, H),
                (1, I, I, R, S(0)),
                (1, O, O, R, S(1)),
                (1, B, I, R, H),
            ],
        },
    ];
}

pub struct PresetManager;

impl PresetManager {
    /// Get the number of available presets
    pub fn count() -> usize {
        PRESETS.len()
    }

    /// Get a preset by its index
    pub fn get_preset_by_index(index: usize) -> Result<&'static Preset, MachineError> {
        PRESETS
            .get(index)
            .ok_or(MachineError::PresetOutOfRange(index))
    }

    /// Get the index of a preset by its name, ignoring case
    pub fn find_by_name(name: &str) -> Option<usize> {
        PRESETS
            .iter()
            .position(|preset| preset.name.eq_ignore_ascii_case(name))
    }

    /// List all preset names
    pub fn list_names() -> Vec<&'static str> {
        PRESETS.iter().map(|preset| preset.name).collect()
    }

    /// Get summary information about a preset by its index
    pub fn get_preset_info(index: usize) -> Result<PresetInfo, MachineError> {
        let preset = Self::get_preset_by_index(index)?;

        Ok(PresetInfo {
            index,
            name: preset.name,
            description: preset.description,
            input: preset.input,
            state_count: preset.rows,
            transition_count: preset.rules.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PresetInfo {
    pub index: usize,
    pub name: &'static str,
    pub description: &'static str,
    pub input: &'static str,
    pub state_count: usize,
    pub transition_count: usize,
}
