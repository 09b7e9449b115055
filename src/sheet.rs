//! This module defines the delta sheet: the transition table the machine executes.
//!
//! The sheet holds one row per state, each row holding one slot per tape symbol. A slot is
//! either a defined [`Transition`] or undefined (`None`), and an undefined slot halts the
//! machine when it is looked up. The sheet also owns the initial-state selector and the
//! active-row cursor, whose moves are shown by a vertical scroll animation.

use tracing::debug;

use crate::animation::Slide;
use crate::config::MachineConfig;
use crate::types::{Delta, Direction, MachineError, StateRef, Symbol, Transition};

/// Display line of the virtual row above the table that execution scrolls to first.
pub const BEFORE_START_LINE: i64 = -3;

/// One state's rules: a slot per tape symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    index: usize,
    slots: [Option<Transition>; 3],
}

impl Row {
    /// Creates a row whose slots are all undefined.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            slots: [None; 3],
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the rule for `symbol`, or `None` if the slot is undefined.
    pub fn slot(&self, symbol: Symbol) -> Option<Transition> {
        self.slots[symbol.index()]
    }

    /// Returns the slots in sheet column order.
    pub fn slots(&self) -> &[Option<Transition>; 3] {
        &self.slots
    }

    fn slot_mut(&mut self, symbol: Symbol) -> &mut Option<Transition> {
        &mut self.slots[symbol.index()]
    }
}

/// Where the active-row cursor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// The virtual row above the table.
    BeforeStart,
    /// A real row.
    Row(usize),
    /// The virtual HALT row, drawn two lines past the last real row.
    Halt,
}

impl From<StateRef> for Cursor {
    fn from(state: StateRef) -> Self {
        match state {
            StateRef::Halt => Cursor::Halt,
            StateRef::State(index) => Cursor::Row(index),
        }
    }
}

/// The transition table with its initial-state selector and animated cursor.
#[derive(Debug, Clone)]
pub struct Sheet {
    rows: Vec<Row>,
    initial: StateRef,
    cursor: Cursor,
    slide: Slide,
    row_height: f32,
    input_mode: bool,
}

impl Sheet {
    /// Creates a sheet with row 0 only, all slots undefined and the initial state set to HALT.
    pub fn new(config: &MachineConfig) -> Self {
        let config = config.sanitized();
        Self {
            rows: vec![Row::new(0)],
            initial: StateRef::Halt,
            cursor: Cursor::Row(0),
            slide: Slide::new(0.0, config.sheet_speed),
            row_height: config.row_height,
            input_mode: false,
        }
    }

    /// Appends a row one past the current maximum index and returns its index.
    pub fn add_row(&mut self) -> usize {
        let index = self.rows.len();
        self.rows.push(Row::new(index));
        debug!(row = index, "row added");
        index
    }

    /// Removes the highest-indexed row and returns its index.
    ///
    /// Row 0 is never removed. Every reference to the removed row, in the initial-state
    /// selector or in any slot, is reset to HALT.
    pub fn remove_top_row(&mut self) -> Result<usize, MachineError> {
        let removed = self.max_index();
        if removed == 0 {
            return Err(MachineError::RowFloor);
        }

        self.rows.pop();

        let dangling = StateRef::State(removed);
        if self.initial == dangling {
            self.initial = StateRef::Halt;
        }
        for row in &mut self.rows {
            for transition in row.slots.iter_mut().flatten() {
                if transition.next == dangling {
                    transition.next = StateRef::Halt;
                }
            }
        }
        if self.cursor == Cursor::Row(removed) {
            self.cursor = Cursor::Row(removed - 1);
        }

        debug!(row = removed, "row removed");
        Ok(removed)
    }

    /// Steps the initial-state selector through `[HALT, max_index]`, wrapping at both ends.
    pub fn set_initial_state(&mut self, delta: Delta) -> StateRef {
        self.initial = self.initial.cycle(delta, self.max_index());
        self.initial
    }

    /// Sets the initial-state selector directly.
    pub fn set_initial(&mut self, state: StateRef) -> Result<(), MachineError> {
        self.check_ref(state)?;
        self.initial = state;
        Ok(())
    }

    pub fn initial_state(&self) -> StateRef {
        self.initial
    }

    /// Returns the rule of the active row for `symbol`.
    ///
    /// Returns `None` for an undefined slot and whenever the cursor is on a virtual row.
    pub fn lookup(&self, symbol: Symbol) -> Option<Transition> {
        match self.cursor {
            Cursor::Row(index) => self.rows.get(index).and_then(|row| row.slot(symbol)),
            Cursor::BeforeStart | Cursor::Halt => None,
        }
    }

    /// Moves the cursor to `target` and starts the scroll that shows it.
    ///
    /// Returns false, changing nothing, in input mode, while a scroll is in flight, or when the
    /// cursor is already on `target`.
    pub fn move_to(&mut self, target: Cursor) -> bool {
        if self.input_mode || self.is_animating() || self.cursor == target {
            return false;
        }

        let lines = self.line(self.cursor) - self.line(target);
        self.slide.start(lines as f32 * self.row_height);
        debug!(from = ?self.cursor, to = ?target, "sheet cursor moving");
        self.cursor = target;
        true
    }

    /// Advances the scroll by one frame. Returns true on the frame it comes to rest.
    pub fn tick(&mut self) -> bool {
        self.slide.tick()
    }

    /// Flips a slot between undefined and defined.
    ///
    /// A slot that becomes defined always takes the default rule (`00`, `B`, `L`); the values
    /// it held before it was cleared are not kept. Returns whether the slot is now defined.
    pub fn toggle_definedness(&mut self, row: usize, symbol: Symbol) -> Result<bool, MachineError> {
        let slot = self.row_mut(row)?.slot_mut(symbol);
        *slot = if slot.is_some() {
            None
        } else {
            Some(Transition::default())
        };
        Ok(slot.is_some())
    }

    /// Cycles the write symbol of a defined slot. Undefined slots are left alone.
    pub fn cycle_write_symbol(
        &mut self,
        row: usize,
        symbol: Symbol,
    ) -> Result<Option<Transition>, MachineError> {
        self.edit(row, symbol, |t, _| t.write = t.write.cycle())
    }

    /// Flips the direction of a defined slot. Undefined slots are left alone.
    pub fn cycle_direction(
        &mut self,
        row: usize,
        symbol: Symbol,
    ) -> Result<Option<Transition>, MachineError> {
        self.edit(row, symbol, |t, _| t.direction = t.direction.flip())
    }

    /// Steps the next state of a defined slot through `[HALT, max_index]`.
    pub fn cycle_next_state(
        &mut self,
        row: usize,
        symbol: Symbol,
        delta: Delta,
    ) -> Result<Option<Transition>, MachineError> {
        self.edit(row, symbol, |t, max| t.next = t.next.cycle(delta, max))
    }

    /// Defines a slot with the given rule.
    pub fn define(
        &mut self,
        row: usize,
        symbol: Symbol,
        transition: Transition,
    ) -> Result<(), MachineError> {
        self.check_ref(transition.next)?;
        *self.row_mut(row)?.slot_mut(symbol) = Some(transition);
        Ok(())
    }

    /// Shorthand for defining a slot from its three fields.
    pub fn rule(
        &mut self,
        row: usize,
        symbol: Symbol,
        write: Symbol,
        direction: Direction,
        next: StateRef,
    ) -> Result<(), MachineError> {
        self.define(
            row,
            symbol,
            Transition {
                next,
                write,
                direction,
            },
        )
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of the last row.
    pub fn max_index(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the display line of a cursor position.
    pub fn line(&self, cursor: Cursor) -> i64 {
        match cursor {
            Cursor::BeforeStart => BEFORE_START_LINE,
            Cursor::Row(index) => index as i64,
            Cursor::Halt => self.rows.len() as i64 + 1,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.slide.is_moving()
    }

    /// Returns the current visual scroll offset.
    pub fn offset(&self) -> f32 {
        self.slide.position()
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn is_input_mode(&self) -> bool {
        self.input_mode
    }

    /// Enters or leaves input mode. The cursor does not scroll while in input mode.
    pub fn set_input_mode(&mut self, input_mode: bool) {
        self.input_mode = input_mode;
    }

    fn edit(
        &mut self,
        row: usize,
        symbol: Symbol,
        f: impl FnOnce(&mut Transition, usize),
    ) -> Result<Option<Transition>, MachineError> {
        let max_index = self.max_index();
        let slot = self.row_mut(row)?.slot_mut(symbol);
        if let Some(transition) = slot.as_mut() {
            f(transition, max_index);
        }
        Ok(*slot)
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut Row, MachineError> {
        self.rows.get_mut(row).ok_or(MachineError::NoSuchState(row))
    }

    fn check_ref(&self, state: StateRef) -> Result<(), MachineError> {
        match state {
            StateRef::State(index) if index > self.max_index() => {
                Err(MachineError::NoSuchState(index))
            }
            _ => Ok(()),
        }
    }
}
