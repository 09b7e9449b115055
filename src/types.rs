//! This module defines the core value types shared by the tape, the delta sheet and the
//! execution engine: the tape alphabet, head directions, state references, transitions,
//! the engine's control modes, step outcomes and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The raw value used for the HALT state wherever a state is stored as a plain integer.
pub const HALT_SENTINEL: i64 = -1;

/// A symbol of the tape alphabet.
///
/// The alphabet is fixed to three values. The declaration order matches the column
/// order of the delta sheet (`S = 1`, `S = 0`, `S = B`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    One,
    Zero,
    #[default]
    Blank,
}

impl Symbol {
    /// All symbols in sheet column order.
    pub const ALL: [Symbol; 3] = [Symbol::One, Symbol::Zero, Symbol::Blank];

    /// Returns the sheet column of this symbol.
    pub fn index(self) -> usize {
        match self {
            Symbol::One => 0,
            Symbol::Zero => 1,
            Symbol::Blank => 2,
        }
    }

    /// Returns the symbol that follows this one when cycling a write field: `B -> 0 -> 1 -> B`.
    pub fn cycle(self) -> Self {
        match self {
            Symbol::Blank => Symbol::Zero,
            Symbol::Zero => Symbol::One,
            Symbol::One => Symbol::Blank,
        }
    }

    /// Parses a symbol from its display character. `b` and `_` are accepted for blank.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Symbol::One),
            '0' => Some(Symbol::Zero),
            'B' | 'b' | '_' => Some(Symbol::Blank),
            _ => None,
        }
    }

    /// Returns the character this symbol is displayed as.
    pub fn as_char(self) -> char {
        match self {
            Symbol::One => '1',
            Symbol::Zero => '0',
            Symbol::Blank => 'B',
        }
    }

    /// Parses a whole string of symbol characters, skipping anything that is not a symbol.
    pub fn parse_all(input: &str) -> Vec<Self> {
        input.chars().filter_map(Symbol::from_char).collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[default]
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Returns the change in head index caused by a move in this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "L"),
            Direction::Right => write!(f, "R"),
        }
    }
}

/// Which way a stepper affordance was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delta {
    Decrement,
    Increment,
}

/// A reference to a row of the delta sheet, or the HALT state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateRef {
    /// Stop the machine.
    #[default]
    Halt,
    /// The row with the given index.
    State(usize),
}

impl StateRef {
    /// Converts a raw integer state (`-1` for HALT) into a reference.
    /// Any negative value is treated as HALT.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            StateRef::Halt
        } else {
            StateRef::State(raw as usize)
        }
    }

    /// Returns the raw integer form of this reference, using [`HALT_SENTINEL`] for HALT.
    pub fn raw(self) -> i64 {
        match self {
            StateRef::Halt => HALT_SENTINEL,
            StateRef::State(index) => index as i64,
        }
    }

    /// Steps this reference through the closed range `[HALT, max_index]`, wrapping at both ends.
    ///
    /// Incrementing `max_index` yields HALT and decrementing HALT yields `max_index`.
    pub fn cycle(self, delta: Delta, max_index: usize) -> Self {
        match (delta, self) {
            (Delta::Increment, StateRef::Halt) => StateRef::State(0),
            (Delta::Increment, StateRef::State(i)) if i >= max_index => StateRef::Halt,
            (Delta::Increment, StateRef::State(i)) => StateRef::State(i + 1),
            (Delta::Decrement, StateRef::Halt) => StateRef::State(max_index),
            (Delta::Decrement, StateRef::State(0)) => StateRef::Halt,
            (Delta::Decrement, StateRef::State(i)) => StateRef::State((i - 1).min(max_index)),
        }
    }

    /// Returns true if this reference is HALT.
    pub fn is_halt(self) -> bool {
        self == StateRef::Halt
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateRef::Halt => write!(f, "H"),
            StateRef::State(index) => write!(f, "{index:02}"),
        }
    }
}

/// A defined rule for one symbol of one row: what to write, where to move and which row
/// to continue in.
///
/// An undefined slot is represented as `None` wherever a `Transition` is stored, which keeps
/// it distinct from any default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine continues in.
    pub next: StateRef,
    /// The symbol written under the head.
    pub write: Symbol,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

impl Default for Transition {
    /// The values a slot takes when it is (re)defined: next state `00`, write blank, move left.
    fn default() -> Self {
        Self {
            next: StateRef::State(0),
            write: Symbol::Blank,
            direction: Direction::Left,
        }
    }
}

/// The control mode of the execution engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Idle, nothing running.
    #[default]
    Halted,
    /// A stop was requested or the machine hit a halt condition.
    Stopping,
    /// Entry tag set by `start`, decomposed on the next step.
    Running,
    /// Scrolling the sheet to the initial state.
    LocatingInitial,
    /// Reading the symbol under the head and looking up its transition.
    ReadingSymbol,
    /// Writing the looked-up symbol.
    WritingSymbol,
    /// Moving the head.
    MovingTape,
    /// Scrolling the sheet to the next state.
    MovingTable,
}

impl Mode {
    /// Returns a short upper-case label for status displays.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Halted => "HALT",
            Mode::Stopping => "STOP",
            Mode::Running => "EXEC",
            Mode::LocatingInitial => "INIT",
            Mode::ReadingSymbol => "READ",
            Mode::WritingSymbol => "WRITE",
            Mode::MovingTape => "MOVE TAPE",
            Mode::MovingTable => "MOVE SHEET",
        }
    }
}

/// Represents the outcome of a single call to the engine's step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The engine entered the given mode and keeps executing.
    Continue(Mode),
    /// An animation is still in flight; nothing changed.
    Suspended,
    /// The engine just reached HALTED for the given reason.
    Halt(Halt),
    /// The engine is not executing.
    Idle,
}

/// Why the machine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// The stop control was used.
    Requested,
    /// The machine moved to the HALT state.
    Reached,
    /// The active row has no rule for the symbol under the head.
    Undefined { state: usize, symbol: Symbol },
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Requested => write!(f, "stopped"),
            Halt::Reached => write!(f, "reached halt state"),
            Halt::Undefined { state, symbol } => {
                write!(f, "no rule for state {state:02} reading {symbol}")
            }
        }
    }
}

/// Represents the errors returned when an action is refused by the current mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The action needs the engine to be halted.
    #[error("Machine is executing")]
    Executing,
    /// The action is not available while the sheet is being edited.
    #[error("Sheet is in input mode")]
    InputMode,
    /// The action has to wait for an animation to finish.
    #[error("Animation in progress")]
    Animating,
    /// A row index does not exist in the sheet.
    #[error("No such state: {0:02}")]
    NoSuchState(usize),
    /// Row 0 can never be removed.
    #[error("Row 0 cannot be removed")]
    RowFloor,
    /// A preset index is out of range.
    #[error("Preset index {0} out of range")]
    PresetOutOfRange(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let right: Direction = serde_json::from_str(&right_json).unwrap();
        assert_eq!(right, Direction::Right);
    }

    #[test]
    fn test_transition_serialization_keeps_halt() {
        let transition = Transition {
            next: StateRef::Halt,
            write: Symbol::One,
            direction: Direction::Right,
        };

        let json = serde_json::to_string(&transition).unwrap();
        assert!(json.contains("\"Halt\""));

        let back: Transition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transition);
    }

    #[test]
    fn test_symbol_cycle_order() {
        assert_eq!(Symbol::Blank.cycle(), Symbol::Zero);
        assert_eq!(Symbol::Zero.cycle(), Symbol::One);
        assert_eq!(Symbol::One.cycle(), Symbol::Blank);
    }

    #[test]
    fn test_symbol_parsing() {
        assert_eq!(
            Symbol::parse_all("10 b_B"),
            vec![
                Symbol::One,
                Symbol::Zero,
                Symbol::Blank,
                Symbol::Blank,
                Symbol::Blank
            ]
        );
        assert_eq!(Symbol::from_char('x'), None);
    }

    #[test]
    fn test_state_ref_raw_round() {
        assert_eq!(StateRef::Halt.raw(), HALT_SENTINEL);
        assert_eq!(StateRef::from_raw(-1), StateRef::Halt);
        assert_eq!(StateRef::from_raw(3), StateRef::State(3));
    }

    #[test]
    fn test_state_ref_cycle_wraps_both_ends() {
        assert_eq!(StateRef::Halt.cycle(Delta::Increment, 2), StateRef::State(0));
        assert_eq!(StateRef::State(2).cycle(Delta::Increment, 2), StateRef::Halt);
        assert_eq!(StateRef::Halt.cycle(Delta::Decrement, 2), StateRef::State(2));
        assert_eq!(StateRef::State(0).cycle(Delta::Decrement, 2), StateRef::Halt);
        assert_eq!(StateRef::State(1).cycle(Delta::Decrement, 2), StateRef::State(0));
    }

    #[test]
    fn test_state_ref_display() {
        assert_eq!(StateRef::Halt.to_string(), "H");
        assert_eq!(StateRef::State(7).to_string(), "07");
        assert_eq!(StateRef::State(12).to_string(), "12");
    }

    #[test]
    fn test_transition_defaults() {
        let transition = Transition::default();

        assert_eq!(transition.next, StateRef::State(0));
        assert_eq!(transition.write, Symbol::Blank);
        assert_eq!(transition.direction, Direction::Left);
    }

    #[test]
    fn test_error_display() {
        let error = MachineError::NoSuchState(4);

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("No such state"));
        assert!(error_msg.contains("04"));
    }
}
