//! This module provides the `Simulator`, the top-level application context that a front end
//! holds. It owns the one `TuringMachine`, tracks which interactive region the pointer is
//! over, and turns clicks and key presses into machine operations.
//!
//! Hit testing is the front end's job: each frame it reports the region under the pointer
//! through [`Simulator::hover`]. A click then fires the single affordance of that region.

use tracing::debug;

use crate::analyzer::{findings, AnalysisError};
use crate::config::MachineConfig;
use crate::machine::{RunMode, TuringMachine};
use crate::presets::PresetManager;
use crate::types::{Delta, Direction, MachineError, Step, Symbol};

/// The editable field of a defined slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The next-state stepper; its upper half decrements and its lower half increments.
    NextState(Delta),
    Write,
    Direction,
}

/// An interactive region of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    TapeCell(i64),
    /// One field of one output slot of the sheet.
    Slot {
        row: usize,
        symbol: Symbol,
        field: Field,
    },
    /// The state label of a row, which doubles as the delete affordance of the last row.
    RowLabel(usize),
    InitialState(Delta),
    AddRow,
    /// Any other part of the sheet.
    Sheet,
    ExecuteSwitch,
    StopButton,
}

impl Region {
    /// Returns true for regions that belong to the sheet.
    pub fn is_sheet(&self) -> bool {
        matches!(
            self,
            Region::Slot { .. }
                | Region::RowLabel(_)
                | Region::InitialState(_)
                | Region::AddRow
                | Region::Sheet
        )
    }
}

/// A key the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Clears the hovered slot in input mode.
    Delete,
    /// Moves the head while halted.
    Left,
    Right,
    /// Writes into the hovered tape cell.
    Symbol(Symbol),
    /// Takes one phase while executing in manual mode.
    Confirm,
}

/// The application context: one machine plus pointer state.
#[derive(Debug, Clone)]
pub struct Simulator {
    machine: TuringMachine,
    hover: Option<Region>,
    preset: Option<usize>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Simulator {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            machine: TuringMachine::new(config),
            hover: None,
            preset: None,
        }
    }

    /// Creates a simulator with the given preset loaded.
    pub fn with_preset(config: MachineConfig, index: usize) -> Result<Self, MachineError> {
        let mut simulator = Self::new(config);
        simulator.load_preset(index)?;
        Ok(simulator)
    }

    pub fn machine(&self) -> &TuringMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut TuringMachine {
        &mut self.machine
    }

    /// Records the region under the pointer for this frame.
    pub fn hover(&mut self, region: Option<Region>) {
        self.hover = region;
        let cell = match region {
            Some(Region::TapeCell(index)) => Some(index),
            _ => None,
        };
        self.machine.set_tape_hover(cell);
    }

    pub fn hovered(&self) -> Option<Region> {
        self.hover
    }

    /// Returns true if `region` is under the pointer and its affordance is live.
    ///
    /// A row label is only live as a delete affordance on the last row, and never on row 0.
    pub fn is_hovered(&self, region: Region) -> bool {
        if self.hover != Some(region) {
            return false;
        }
        match region {
            Region::RowLabel(row) => row > 0 && row == self.machine.sheet().max_index(),
            _ => true,
        }
    }

    /// Fires the affordance under the pointer.
    ///
    /// In input mode a click outside the sheet leaves input mode. Outside input mode a click
    /// on the sheet enters it, provided nothing is running or animating.
    pub fn click(&mut self) -> Result<Option<Step>, MachineError> {
        if self.machine.is_input_mode() {
            return self.click_sheet();
        }

        match self.hover {
            Some(Region::ExecuteSwitch) if !self.machine.is_executing() => {
                self.machine.start().map(Some)
            }
            Some(Region::StopButton) => {
                self.machine.stop();
                Ok(None)
            }
            Some(region) if region.is_sheet() => {
                self.machine.enter_input_mode()?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn click_sheet(&mut self) -> Result<Option<Step>, MachineError> {
        let hover = self.hover;
        let live = hover.is_some_and(|region| self.is_hovered(region));
        let sheet = self.machine.sheet_mut()?;

        match hover {
            Some(Region::Slot { row, symbol, field }) => {
                let defined = sheet.row(row).and_then(|r| r.slot(symbol)).is_some();
                if !defined {
                    sheet.toggle_definedness(row, symbol)?;
                } else {
                    match field {
                        Field::NextState(delta) => sheet.cycle_next_state(row, symbol, delta)?,
                        Field::Write => sheet.cycle_write_symbol(row, symbol)?,
                        Field::Direction => sheet.cycle_direction(row, symbol)?,
                    };
                }
            }
            Some(Region::RowLabel(_)) if live => {
                sheet.remove_top_row()?;
            }
            Some(Region::InitialState(delta)) => {
                sheet.set_initial_state(delta);
            }
            Some(Region::AddRow) => {
                sheet.add_row();
            }
            Some(region) if region.is_sheet() => {}
            _ => self.machine.leave_input_mode(),
        }
        Ok(None)
    }

    /// Routes a key press.
    pub fn key_pressed(&mut self, key: Key) -> Result<Option<Step>, MachineError> {
        if self.machine.is_input_mode() {
            if let (Key::Delete, Some(Region::Slot { row, symbol, .. })) = (key, self.hover) {
                let sheet = self.machine.sheet_mut()?;
                if sheet.row(row).and_then(|r| r.slot(symbol)).is_some() {
                    sheet.toggle_definedness(row, symbol)?;
                }
            }
            return Ok(None);
        }

        match key {
            Key::Symbol(symbol) => {
                self.machine.init_symbol_under_pointer(symbol);
                Ok(None)
            }
            Key::Confirm if self.machine.is_executing() => Ok(Some(self.machine.step())),
            Key::Left => self.machine.move_head(Direction::Left).map(|_| None),
            Key::Right => self.machine.move_head(Direction::Right).map(|_| None),
            Key::Confirm | Key::Delete => Ok(None),
        }
    }

    /// Called once per frame: advances the animations and, in auto mode, the machine.
    pub fn tick(&mut self) -> Option<Step> {
        self.machine.tick()
    }

    /// Switches between manual and auto stepping and returns the new mode.
    pub fn toggle_run_mode(&mut self) -> RunMode {
        let run_mode = match self.machine.run_mode() {
            RunMode::Manual => RunMode::Auto,
            RunMode::Auto => RunMode::Manual,
        };
        self.machine.set_run_mode(run_mode);
        run_mode
    }

    /// Replaces the sheet and tape with a built-in preset. Refused while executing.
    pub fn load_preset(&mut self, index: usize) -> Result<(), MachineError> {
        let preset = PresetManager::get_preset_by_index(index)?;
        let sheet = preset.sheet(self.machine.config())?;
        self.machine.load(sheet, &preset.tape())?;
        self.preset = Some(index);
        debug!(preset = preset.name, "preset loaded");
        Ok(())
    }

    /// Loads the preset after the current one, wrapping around.
    pub fn next_preset(&mut self) -> Result<usize, MachineError> {
        let index = self.preset.map_or(0, |i| (i + 1) % PresetManager::count());
        self.load_preset(index)?;
        Ok(index)
    }

    /// Loads the preset before the current one, wrapping around.
    pub fn previous_preset(&mut self) -> Result<usize, MachineError> {
        let count = PresetManager::count();
        let index = self.preset.map_or(count - 1, |i| (i + count - 1) % count);
        self.load_preset(index)?;
        Ok(index)
    }

    /// Returns the index of the loaded preset, if the sheet came from one.
    pub fn preset(&self) -> Option<usize> {
        self.preset
    }

    /// Returns the analyzer's findings for the current sheet.
    pub fn findings(&self) -> Vec<AnalysisError> {
        findings(self.machine.sheet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cursor;
    use crate::types::{Halt, Mode, StateRef, Transition};

    fn editing() -> Simulator {
        let mut simulator = Simulator::default();
        simulator.hover(Some(Region::Sheet));
        simulator.click().unwrap();
        assert!(simulator.machine().is_input_mode());
        simulator
    }

    fn click(simulator: &mut Simulator, region: Region) {
        simulator.hover(Some(region));
        simulator.click().unwrap();
    }

    fn slot(simulator: &Simulator, row: usize, symbol: Symbol) -> Option<Transition> {
        simulator.machine().sheet().row(row).and_then(|r| r.slot(symbol))
    }

    #[test]
    fn test_click_sheet_enters_and_outside_leaves_input_mode() {
        let mut simulator = editing();

        simulator.hover(None);
        simulator.click().unwrap();
        assert!(!simulator.machine().is_input_mode());
    }

    #[test]
    fn test_click_undefined_slot_defines_it() {
        let mut simulator = editing();
        let region = Region::Slot {
            row: 0,
            symbol: Symbol::One,
            field: Field::Write,
        };

        click(&mut simulator, region);
        assert_eq!(slot(&simulator, 0, Symbol::One), Some(Transition::default()));

        click(&mut simulator, region);
        assert_eq!(slot(&simulator, 0, Symbol::One).unwrap().write, Symbol::Zero);
    }

    #[test]
    fn test_field_clicks() {
        let mut simulator = editing();
        click(&mut simulator, Region::AddRow);
        let at = |field| Region::Slot {
            row: 1,
            symbol: Symbol::Blank,
            field,
        };

        click(&mut simulator, at(Field::Direction));
        click(&mut simulator, at(Field::Direction));
        click(&mut simulator, at(Field::NextState(Delta::Increment)));

        let transition = slot(&simulator, 1, Symbol::Blank).unwrap();
        assert_eq!(transition.direction, Direction::Right);
        assert_eq!(transition.next, StateRef::State(1));
    }

    #[test]
    fn test_delete_key_clears_hovered_slot() {
        let mut simulator = editing();
        let region = Region::Slot {
            row: 0,
            symbol: Symbol::Zero,
            field: Field::Write,
        };
        click(&mut simulator, region);

        simulator.key_pressed(Key::Delete).unwrap();
        assert_eq!(slot(&simulator, 0, Symbol::Zero), None);

        // Deleting an undefined slot leaves it undefined.
        simulator.key_pressed(Key::Delete).unwrap();
        assert_eq!(slot(&simulator, 0, Symbol::Zero), None);
    }

    #[test]
    fn test_row_label_deletes_only_last_row() {
        let mut simulator = editing();
        click(&mut simulator, Region::AddRow);
        click(&mut simulator, Region::AddRow);

        simulator.hover(Some(Region::RowLabel(1)));
        assert!(!simulator.is_hovered(Region::RowLabel(1)));
        simulator.click().unwrap();
        assert_eq!(simulator.machine().sheet().len(), 3);

        click(&mut simulator, Region::RowLabel(2));
        assert_eq!(simulator.machine().sheet().len(), 2);

        click(&mut simulator, Region::RowLabel(1));
        click(&mut simulator, Region::RowLabel(0));
        assert_eq!(simulator.machine().sheet().len(), 1);
    }

    #[test]
    fn test_initial_state_stepper() {
        let mut simulator = editing();

        click(&mut simulator, Region::InitialState(Delta::Increment));
        assert_eq!(
            simulator.machine().sheet().initial_state(),
            StateRef::State(0)
        );
        click(&mut simulator, Region::InitialState(Delta::Increment));
        assert_eq!(simulator.machine().sheet().initial_state(), StateRef::Halt);
    }

    #[test]
    fn test_execute_and_stop_switches() {
        let mut simulator = Simulator::with_preset(MachineConfig::default(), 0).unwrap();

        click(&mut simulator, Region::ExecuteSwitch);
        assert!(simulator.machine().is_executing());
        assert_eq!(simulator.machine().sheet().cursor(), Cursor::BeforeStart);

        // The sheet is busy, so entering input mode is refused.
        simulator.hover(Some(Region::Sheet));
        assert_eq!(simulator.click(), Err(MachineError::Executing));

        click(&mut simulator, Region::StopButton);
        while simulator.machine().is_animating() {
            simulator.tick();
        }
        assert_eq!(
            simulator.key_pressed(Key::Confirm),
            Ok(Some(Step::Halt(Halt::Requested)))
        );
    }

    #[test]
    fn test_confirm_steps_in_manual_mode() {
        let mut simulator = Simulator::with_preset(MachineConfig::default(), 0).unwrap();
        click(&mut simulator, Region::ExecuteSwitch);
        while simulator.machine().is_animating() {
            simulator.tick();
        }

        assert_eq!(
            simulator.key_pressed(Key::Confirm),
            Ok(Some(Step::Continue(Mode::ReadingSymbol)))
        );
    }

    #[test]
    fn test_keys_edit_tape_while_halted() {
        let mut simulator = Simulator::default();

        simulator.hover(Some(Region::TapeCell(2)));
        simulator.key_pressed(Key::Symbol(Symbol::One)).unwrap();
        assert_eq!(simulator.machine().tape().symbol_at(2), Symbol::One);

        simulator.key_pressed(Key::Right).unwrap();
        assert_eq!(simulator.machine().tape().head(), 1);
    }

    fn settle(simulator: &mut Simulator) {
        let mut frames = 0;
        while simulator.machine().is_animating() {
            simulator.tick();
            frames += 1;
            assert!(frames < 10_000, "animation never finished");
        }
    }

    #[test]
    fn test_symbol_keys_edit_tape_between_steps() {
        let mut simulator = Simulator::with_preset(MachineConfig::default(), 0).unwrap();
        click(&mut simulator, Region::ExecuteSwitch);
        settle(&mut simulator);
        simulator.key_pressed(Key::Confirm).unwrap();
        settle(&mut simulator);

        simulator.hover(Some(Region::TapeCell(-2)));
        assert_eq!(simulator.key_pressed(Key::Symbol(Symbol::One)), Ok(None));
        assert_eq!(simulator.machine().tape().symbol_at(-2), Symbol::One);

        assert_eq!(
            simulator.key_pressed(Key::Confirm),
            Ok(Some(Step::Continue(Mode::WritingSymbol)))
        );
        assert!(simulator.machine().is_executing());
    }

    #[test]
    fn test_symbol_keys_ignored_while_tape_slides() {
        let mut simulator = Simulator::with_preset(MachineConfig::default(), 0).unwrap();
        click(&mut simulator, Region::ExecuteSwitch);

        for _ in 0..10 {
            settle(&mut simulator);
            simulator.key_pressed(Key::Confirm).unwrap();
            if simulator.machine().tape().is_animating() {
                break;
            }
        }
        assert!(simulator.machine().tape().is_animating());

        simulator.hover(Some(Region::TapeCell(-2)));
        assert_eq!(simulator.key_pressed(Key::Symbol(Symbol::One)), Ok(None));
        assert_eq!(simulator.machine().tape().symbol_at(-2), Symbol::Blank);
    }

    #[test]
    fn test_tape_keys_refused_while_executing() {
        let mut simulator = Simulator::with_preset(MachineConfig::default(), 0).unwrap();
        click(&mut simulator, Region::ExecuteSwitch);

        assert_eq!(
            simulator.key_pressed(Key::Left),
            Err(MachineError::Executing)
        );
    }

    #[test]
    fn test_preset_cycling() {
        let mut simulator = Simulator::default();

        assert_eq!(simulator.next_preset(), Ok(0));
        assert_eq!(simulator.next_preset(), Ok(1));
        assert_eq!(simulator.previous_preset(), Ok(0));
        assert_eq!(
            simulator.previous_preset(),
            Ok(PresetManager::count() - 1)
        );
    }

    #[test]
    fn test_toggle_run_mode() {
        let mut simulator = Simulator::default();

        assert_eq!(simulator.toggle_run_mode(), RunMode::Auto);
        assert_eq!(simulator.toggle_run_mode(), RunMode::Manual);
    }

    #[test]
    fn test_findings_for_empty_sheet() {
        let simulator = Simulator::default();

        assert_eq!(simulator.findings(), vec![AnalysisError::HaltInitialState]);
    }
}
