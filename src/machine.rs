//! This module defines the `TuringMachine` struct, the execution engine that drives the
//! tape and the delta sheet through the step cycle: locate the initial state, read the
//! symbol under the head, write, move the head, then move to the next state.
//!
//! Progress is cooperative and frame driven. Every phase waits until both the tape and the
//! sheet have finished animating, so the visible animation always traces the computation
//! in real time.

use tracing::{debug, info, trace};

use crate::config::MachineConfig;
use crate::sheet::{Cursor, Sheet};
use crate::tape::Tape;
use crate::types::{Direction, Halt, MachineError, Mode, StateRef, Step, Symbol, Transition};

/// How execution is advanced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One phase per confirm key.
    #[default]
    Manual,
    /// One phase per frame.
    Auto,
}

/// Which output columns of the sheet are covered.
///
/// Slot 0 covers the state column, slots 1-3 the `1`, `0` and `B` columns. `true` means
/// covered. This is a view value derived from the engine's mode and the symbol it read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shutter([bool; 4]);

impl Shutter {
    /// Derives the shutter from the current mode and the symbol read in this cycle.
    pub fn derive(mode: Mode, read: Option<Symbol>) -> Self {
        match (mode, read) {
            (Mode::Halted, _) => Shutter([true; 4]),
            (
                Mode::WritingSymbol | Mode::MovingTape | Mode::MovingTable | Mode::Stopping,
                Some(symbol),
            ) => {
                let mut covered = [true; 4];
                covered[0] = false;
                covered[symbol.index() + 1] = false;
                Shutter(covered)
            }
            _ => Shutter([false; 4]),
        }
    }

    /// Returns true if the column for `symbol` is covered.
    pub fn covers(&self, symbol: Symbol) -> bool {
        self.0[symbol.index() + 1]
    }

    /// Returns true if the state column is covered.
    pub fn covers_state(&self) -> bool {
        self.0[0]
    }

    pub fn as_array(&self) -> [bool; 4] {
        self.0
    }
}

/// The execution engine: one tape, one delta sheet and the control mode that drives them.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    tape: Tape,
    sheet: Sheet,
    mode: Mode,
    run_mode: RunMode,
    config: MachineConfig,
    stop_requested: bool,
    stopping: Halt,
    read: Option<Symbol>,
    latched: Option<Transition>,
    step_count: usize,
    last_halt: Option<Halt>,
}

impl Default for TuringMachine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl TuringMachine {
    /// Creates a halted machine with a blank tape and a one-row sheet.
    ///
    /// Unusable sizes and speeds in `config` are replaced by their defaults.
    pub fn new(config: MachineConfig) -> Self {
        let config = config.sanitized();
        Self {
            tape: Tape::new(&config),
            sheet: Sheet::new(&config),
            mode: Mode::Halted,
            run_mode: RunMode::default(),
            config,
            stop_requested: false,
            stopping: Halt::Requested,
            read: None,
            latched: None,
            step_count: 0,
            last_halt: None,
        }
    }

    /// Starts execution from the sheet's initial state.
    ///
    /// The first phase is taken immediately unless an animation is still in flight.
    pub fn start(&mut self) -> Result<Step, MachineError> {
        if self.is_executing() {
            return Err(MachineError::Executing);
        }
        if self.sheet.is_input_mode() {
            return Err(MachineError::InputMode);
        }

        info!(initial = %self.sheet.initial_state(), "machine started");
        self.mode = Mode::Running;
        self.step_count = 0;
        self.last_halt = None;
        self.stop_requested = false;
        Ok(self.step())
    }

    /// Requests a stop. Calling it while halted does nothing.
    ///
    /// If an animation is in flight the mode is left as is and the stop is taken by the first
    /// step after the animation finishes.
    pub fn stop(&mut self) {
        if !self.is_executing() {
            return;
        }

        if self.is_animating() {
            debug!(mode = ?self.mode, "stop deferred until animation ends");
            self.stop_requested = true;
        } else if self.mode != Mode::Stopping {
            self.enter_stopping(Halt::Requested);
        }
    }

    /// Takes one phase of the step cycle.
    ///
    /// Returns [`Step::Suspended`] without changing anything while the tape or the sheet is
    /// animating.
    pub fn step(&mut self) -> Step {
        if self.mode == Mode::Halted {
            return Step::Idle;
        }
        if self.is_animating() {
            trace!(mode = ?self.mode, "step suspended");
            return Step::Suspended;
        }
        if std::mem::take(&mut self.stop_requested) && self.mode != Mode::Stopping {
            self.enter_stopping(Halt::Requested);
        }

        match self.mode {
            Mode::Halted => Step::Idle,
            Mode::Running => {
                self.sheet.move_to(Cursor::BeforeStart);
                self.enter(Mode::LocatingInitial)
            }
            Mode::LocatingInitial => {
                let initial = self.sheet.initial_state();
                self.sheet.move_to(initial.into());
                if initial.is_halt() {
                    self.enter_stopping(Halt::Reached);
                    Step::Continue(Mode::Stopping)
                } else {
                    self.enter(Mode::ReadingSymbol)
                }
            }
            Mode::ReadingSymbol => {
                let Some(symbol) = self.tape.read() else {
                    return Step::Suspended;
                };
                self.read = Some(symbol);

                match self.sheet.lookup(symbol) {
                    Some(transition) => {
                        self.latched = Some(transition);
                        self.enter(Mode::WritingSymbol)
                    }
                    None => {
                        let reason = match self.sheet.cursor() {
                            Cursor::Row(state) => Halt::Undefined { state, symbol },
                            Cursor::Halt | Cursor::BeforeStart => Halt::Reached,
                        };
                        self.enter_stopping(reason);
                        Step::Continue(Mode::Stopping)
                    }
                }
            }
            Mode::WritingSymbol => match self.latched {
                Some(transition) => {
                    self.tape.write(transition.write);
                    self.enter(Mode::MovingTape)
                }
                None => self.lost_transition(),
            },
            Mode::MovingTape => match self.latched {
                Some(transition) => {
                    self.tape.move_head(transition.direction);
                    self.enter(Mode::MovingTable)
                }
                None => self.lost_transition(),
            },
            Mode::MovingTable => match self.latched.take() {
                Some(transition) => {
                    self.sheet.move_to(transition.next.into());
                    self.read = None;
                    self.step_count += 1;
                    self.enter(Mode::ReadingSymbol)
                }
                None => self.lost_transition(),
            },
            Mode::Stopping => {
                self.sheet.move_to(Cursor::Row(0));
                self.read = None;
                self.latched = None;
                self.mode = Mode::Halted;
                self.last_halt = Some(self.stopping);
                info!(reason = %self.stopping, steps = self.step_count, "machine halted");
                Step::Halt(self.stopping)
            }
        }
    }

    /// Advances both animations by one frame. In [`RunMode::Auto`] a step is then taken
    /// and its outcome returned.
    pub fn tick(&mut self) -> Option<Step> {
        self.animate();
        match self.run_mode {
            RunMode::Auto if self.is_executing() => Some(self.step()),
            _ => None,
        }
    }

    /// Advances both animations by one frame without stepping.
    pub fn animate(&mut self) {
        self.tape.tick();
        self.sheet.tick();
    }

    /// Moves the head by hand. Only available while halted and outside input mode.
    pub fn move_head(&mut self, direction: Direction) -> Result<bool, MachineError> {
        self.check_idle()?;
        if self.sheet.is_input_mode() {
            return Err(MachineError::InputMode);
        }
        Ok(self.tape.move_head(direction))
    }

    /// Writes into the tape cell under the pointer, also while executing. Returns false while
    /// the tape is sliding or when the pointer is not over a cell.
    pub fn init_symbol_under_pointer(&mut self, symbol: Symbol) -> bool {
        self.tape.init_symbol_under_pointer(symbol)
    }

    /// Records which tape cell the pointer is over.
    pub fn set_tape_hover(&mut self, index: Option<i64>) {
        self.tape.set_hovered(index);
    }

    /// Enters input mode, in which the sheet may be edited.
    pub fn enter_input_mode(&mut self) -> Result<(), MachineError> {
        self.check_idle()?;
        if self.is_animating() {
            return Err(MachineError::Animating);
        }
        self.sheet.set_input_mode(true);
        debug!("input mode entered");
        Ok(())
    }

    pub fn leave_input_mode(&mut self) {
        if self.sheet.is_input_mode() {
            self.sheet.set_input_mode(false);
            debug!("input mode left");
        }
    }

    pub fn is_input_mode(&self) -> bool {
        self.sheet.is_input_mode()
    }

    /// Returns the sheet for editing. Refused while executing.
    pub fn sheet_mut(&mut self) -> Result<&mut Sheet, MachineError> {
        self.check_idle()?;
        Ok(&mut self.sheet)
    }

    /// Returns the tape for editing. Refused while executing.
    pub fn tape_mut(&mut self) -> Result<&mut Tape, MachineError> {
        self.check_idle()?;
        Ok(&mut self.tape)
    }

    /// Replaces the sheet and writes `input` onto a fresh tape. Refused while executing.
    pub fn load(&mut self, sheet: Sheet, input: &[Symbol]) -> Result<(), MachineError> {
        self.check_idle()?;

        let mut tape = Tape::new(&self.config);
        tape.load(input);
        self.tape = tape;
        self.sheet = sheet;
        self.sheet.set_input_mode(false);
        self.step_count = 0;
        self.last_halt = None;
        Ok(())
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn set_run_mode(&mut self, run_mode: RunMode) {
        self.run_mode = run_mode;
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Returns true from `start` until the machine is halted again.
    pub fn is_executing(&self) -> bool {
        self.mode != Mode::Halted
    }

    /// Returns true while the tape or the sheet is animating.
    pub fn is_animating(&self) -> bool {
        self.tape.is_animating() || self.sheet.is_animating()
    }

    /// Returns true if a stop has been requested but not yet taken.
    pub fn is_stop_pending(&self) -> bool {
        self.stop_requested
    }

    /// Returns the number of transitions taken since the last start.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns why the machine last halted, if it has run.
    pub fn last_halt(&self) -> Option<Halt> {
        self.last_halt
    }

    /// Returns the state the sheet cursor is on, if it is on a real row or HALT.
    pub fn state(&self) -> Option<StateRef> {
        match self.sheet.cursor() {
            Cursor::Row(index) => Some(StateRef::State(index)),
            Cursor::Halt => Some(StateRef::Halt),
            Cursor::BeforeStart => None,
        }
    }

    /// Returns the symbol read in the current cycle.
    pub fn read_symbol(&self) -> Option<Symbol> {
        self.read
    }

    /// Returns the transition being applied in the current cycle.
    pub fn transition(&self) -> Option<Transition> {
        self.latched
    }

    pub fn shutter(&self) -> Shutter {
        Shutter::derive(self.mode, self.read)
    }

    fn enter(&mut self, mode: Mode) -> Step {
        debug!(from = ?self.mode, to = ?mode, step = self.step_count, "phase");
        self.mode = mode;
        Step::Continue(mode)
    }

    fn enter_stopping(&mut self, reason: Halt) {
        debug!(from = ?self.mode, %reason, "stopping");
        self.stopping = reason;
        self.mode = Mode::Stopping;
    }

    // The latched transition is set by every path into the write/move phases.
    fn lost_transition(&mut self) -> Step {
        self.enter_stopping(Halt::Requested);
        Step::Continue(Mode::Stopping)
    }

    fn check_idle(&self) -> Result<(), MachineError> {
        if self.is_executing() {
            return Err(MachineError::Executing);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_FRAMES: usize = 100_000;

    fn settle(machine: &mut TuringMachine) {
        let mut frames = 0;
        while machine.is_animating() {
            machine.animate();
            frames += 1;
            assert!(frames < MAX_FRAMES, "animation never finished");
        }
    }

    /// Steps with full animation between phases and records every mode entered.
    fn run_to_halt(machine: &mut TuringMachine) -> (Halt, Vec<Mode>) {
        let mut modes = vec![machine.mode()];
        for _ in 0..MAX_FRAMES {
            settle(machine);
            match machine.step() {
                Step::Continue(mode) => modes.push(mode),
                Step::Halt(reason) => {
                    modes.push(machine.mode());
                    return (reason, modes);
                }
                Step::Suspended => {}
                Step::Idle => panic!("machine idle before halting"),
            }
        }
        panic!("machine did not halt");
    }

    /// Row 0: read 1 -> write 0, move right, stay in 0. Everything else undefined.
    fn eraser(input: &str) -> TuringMachine {
        let mut machine = TuringMachine::default();
        let sheet = machine.sheet_mut().unwrap();
        sheet
            .rule(0, Symbol::One, Symbol::Zero, Direction::Right, StateRef::State(0))
            .unwrap();
        sheet.set_initial(StateRef::State(0)).unwrap();
        machine.tape_mut().unwrap().load(&Symbol::parse_all(input));
        machine
    }

    #[test]
    fn test_new_machine_is_halted() {
        let mut machine = TuringMachine::default();

        assert_eq!(machine.mode(), Mode::Halted);
        assert!(!machine.is_executing());
        assert_eq!(machine.step(), Step::Idle);
        assert_eq!(machine.shutter().as_array(), [true; 4]);
    }

    #[test]
    fn test_start_takes_entry_phase() {
        let mut machine = eraser("1");

        assert_eq!(machine.start(), Ok(Step::Continue(Mode::LocatingInitial)));
        assert!(machine.is_executing());
        assert_eq!(machine.sheet().cursor(), Cursor::BeforeStart);
        assert_eq!(machine.start(), Err(MachineError::Executing));
    }

    #[test]
    fn test_halt_initial_state_skips_reading() {
        let mut machine = TuringMachine::default();
        machine.start().unwrap();

        let (reason, modes) = run_to_halt(&mut machine);

        assert_eq!(reason, Halt::Reached);
        assert_eq!(
            modes,
            vec![
                Mode::LocatingInitial,
                Mode::Stopping,
                Mode::Halted
            ]
        );
        assert!(!modes.contains(&Mode::ReadingSymbol));
    }

    #[test]
    fn test_eraser_halts_at_first_blank() {
        let mut machine = eraser("111");
        let start = machine.tape().head();
        machine.start().unwrap();

        let (reason, _) = run_to_halt(&mut machine);

        assert_eq!(
            reason,
            Halt::Undefined {
                state: 0,
                symbol: Symbol::Blank
            }
        );
        assert_eq!(machine.tape().head(), start + 3);
        assert_eq!(machine.step_count(), 3);
        for i in 0..3 {
            assert_eq!(machine.tape().symbol_at(start + i), Symbol::Zero);
        }
        assert_eq!(machine.last_halt(), Some(reason));
    }

    #[test]
    fn test_blank_loop_is_not_a_halt() {
        let mut machine = TuringMachine::default();
        let sheet = machine.sheet_mut().unwrap();
        sheet
            .rule(0, Symbol::Blank, Symbol::Blank, Direction::Right, StateRef::State(0))
            .unwrap();
        sheet.set_initial(StateRef::State(0)).unwrap();
        machine.start().unwrap();

        for _ in 0..200 {
            settle(&mut machine);
            assert!(!matches!(machine.step(), Step::Halt(_)));
        }
        assert!(machine.is_executing());
        assert!(machine.step_count() > 40);
    }

    #[test]
    fn test_next_state_halt_stops_after_move() {
        let mut machine = TuringMachine::default();
        let sheet = machine.sheet_mut().unwrap();
        sheet
            .rule(0, Symbol::Blank, Symbol::One, Direction::Left, StateRef::Halt)
            .unwrap();
        sheet.set_initial(StateRef::State(0)).unwrap();
        machine.start().unwrap();

        let (reason, modes) = run_to_halt(&mut machine);

        assert_eq!(reason, Halt::Reached);
        assert_eq!(machine.tape().symbol_at(0), Symbol::One);
        assert_eq!(machine.tape().head(), -1);
        assert_eq!(modes.iter().filter(|&&m| m == Mode::ReadingSymbol).count(), 2);
    }

    #[test]
    fn test_stop_waits_for_animation() {
        let mut machine = eraser("11");
        machine.start().unwrap();
        settle(&mut machine);
        assert_eq!(machine.step(), Step::Continue(Mode::ReadingSymbol));
        settle(&mut machine);
        assert_eq!(machine.step(), Step::Continue(Mode::WritingSymbol));
        assert_eq!(machine.step(), Step::Continue(Mode::MovingTape));
        assert_eq!(machine.step(), Step::Continue(Mode::MovingTable));
        assert!(machine.tape().is_animating());

        machine.stop();
        assert_eq!(machine.mode(), Mode::MovingTable);
        assert!(machine.is_stop_pending());
        assert_eq!(machine.step(), Step::Suspended);
        assert_eq!(machine.mode(), Mode::MovingTable);

        settle(&mut machine);
        assert_eq!(machine.step(), Step::Halt(Halt::Requested));
        assert_eq!(machine.mode(), Mode::Halted);
    }

    #[test]
    fn test_stop_without_animation_enters_stopping() {
        let mut machine = eraser("1");
        machine.start().unwrap();
        settle(&mut machine);
        machine.step();
        settle(&mut machine);

        machine.stop();
        assert_eq!(machine.mode(), Mode::Stopping);
        assert_eq!(machine.step(), Step::Halt(Halt::Requested));

        // Idempotent once halted.
        machine.stop();
        assert_eq!(machine.mode(), Mode::Halted);
    }

    #[test]
    fn test_editing_is_refused_while_executing() {
        let mut machine = eraser("1");
        machine.start().unwrap();

        assert_eq!(machine.sheet_mut().err(), Some(MachineError::Executing));
        assert_eq!(machine.enter_input_mode(), Err(MachineError::Executing));
        assert_eq!(
            machine.move_head(Direction::Left),
            Err(MachineError::Executing)
        );
    }

    #[test]
    fn test_start_refused_in_input_mode() {
        let mut machine = TuringMachine::default();
        machine.enter_input_mode().unwrap();

        assert_eq!(machine.start(), Err(MachineError::InputMode));
        machine.leave_input_mode();
        assert!(machine.start().is_ok());
    }

    #[test]
    fn test_input_mode_refused_while_animating() {
        let mut machine = TuringMachine::default();
        machine.move_head(Direction::Right).unwrap();

        assert_eq!(machine.enter_input_mode(), Err(MachineError::Animating));
    }

    #[test]
    fn test_auto_mode_steps_on_tick() {
        let mut machine = eraser("1");
        machine.set_run_mode(RunMode::Auto);
        machine.start().unwrap();

        let mut halted = None;
        for _ in 0..MAX_FRAMES {
            if let Some(Step::Halt(reason)) = machine.tick() {
                halted = Some(reason);
                break;
            }
        }

        assert_eq!(
            halted,
            Some(Halt::Undefined {
                state: 0,
                symbol: Symbol::Blank
            })
        );
        assert_eq!(machine.tape().head(), 1);
    }

    #[test]
    fn test_manual_tick_does_not_step() {
        let mut machine = eraser("1");
        machine.start().unwrap();

        for _ in 0..100 {
            assert_eq!(machine.tick(), None);
        }
        assert_eq!(machine.mode(), Mode::LocatingInitial);
    }

    #[test]
    fn test_shutter_follows_read_symbol() {
        let mut machine = eraser("1");
        machine.start().unwrap();
        settle(&mut machine);
        machine.step();
        assert_eq!(machine.shutter().as_array(), [false; 4]);

        settle(&mut machine);
        machine.step();
        let shutter = machine.shutter();
        assert!(!shutter.covers_state());
        assert!(!shutter.covers(Symbol::One));
        assert!(shutter.covers(Symbol::Zero));
        assert!(shutter.covers(Symbol::Blank));
    }

    #[test]
    fn test_zero_speed_config_still_stops() {
        let config: MachineConfig = serde_json::from_str(r#"{ "sheet_speed": 0.0 }"#).unwrap();
        let mut machine = TuringMachine::new(config);
        machine.start().unwrap();
        machine.stop();

        let mut halted = None;
        for _ in 0..MAX_FRAMES {
            machine.animate();
            if let Step::Halt(reason) = machine.step() {
                halted = Some(reason);
                break;
            }
        }

        assert_eq!(halted, Some(Halt::Requested));
        assert_eq!(machine.mode(), Mode::Halted);
    }

    #[test]
    fn test_tape_edits_allowed_while_executing() {
        let mut machine = eraser("1");
        machine.start().unwrap();
        settle(&mut machine);
        machine.set_tape_hover(Some(3));

        assert!(machine.init_symbol_under_pointer(Symbol::One));
        assert_eq!(machine.tape().symbol_at(3), Symbol::One);
        assert!(machine.is_executing());
    }

    #[test]
    fn test_load_replaces_sheet_and_tape() {
        let mut machine = eraser("111");
        let mut sheet = Sheet::new(machine.config());
        sheet.add_row();

        machine.load(sheet, &Symbol::parse_all("0")).unwrap();

        assert_eq!(machine.sheet().len(), 2);
        assert_eq!(machine.tape().symbol_at(0), Symbol::Zero);
        assert_eq!(machine.tape().symbol_at(1), Symbol::Blank);
    }
}
