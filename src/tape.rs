//! This module defines the `Tape`: an unbounded, two-sided row of symbol cells with a single
//! read/write head and a lateral slide animation for head movements.
//!
//! Cells are materialized lazily at either frontier and never dropped. While the slide is in
//! flight every read, write and move is refused, so the symbol observed after a move is always
//! the one under the new head position.

use std::collections::VecDeque;

use tracing::debug;

use crate::animation::Slide;
use crate::config::MachineConfig;
use crate::types::{Direction, Symbol};

/// A single-head tape over the three-symbol alphabet.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    leftmost: i64,
    head: i64,
    hovered: Option<i64>,
    slide: Slide,
    cell_size: f32,
    lookahead: i64,
}

impl Tape {
    /// Creates a blank tape with `initial_extent` cells materialized on each side of the head.
    pub fn new(config: &MachineConfig) -> Self {
        let config = config.sanitized();
        let extent = config.initial_extent;
        let cells = VecDeque::from(vec![Symbol::Blank; (2 * extent + 1) as usize]);

        Self {
            cells,
            leftmost: -extent,
            head: 0,
            hovered: None,
            slide: Slide::new(0.0, config.tape_speed),
            cell_size: config.cell_size,
            lookahead: config.lookahead,
        }
    }

    /// Returns the symbol under the head, or `None` while the tape is sliding.
    pub fn read(&self) -> Option<Symbol> {
        if self.is_animating() {
            return None;
        }
        Some(self.symbol_at(self.head))
    }

    /// Writes `symbol` under the head. Returns false, changing nothing, while the tape is sliding.
    pub fn write(&mut self, symbol: Symbol) -> bool {
        if self.is_animating() {
            return false;
        }
        self.set(self.head, symbol);
        true
    }

    /// Moves the head one cell and starts the slide that shows it.
    ///
    /// A new cell is materialized at the frontier whenever the head is within the lookahead of
    /// the last materialized cell, so the slide never reveals an unmaterialized cell. Calls made
    /// while a slide is in flight are ignored and return false.
    pub fn move_head(&mut self, direction: Direction) -> bool {
        if self.is_animating() {
            return false;
        }

        match direction {
            Direction::Left => {
                if self.head <= self.leftmost + self.lookahead {
                    self.cells.push_front(Symbol::Blank);
                    self.leftmost -= 1;
                    debug!(leftmost = self.leftmost, "tape grew left");
                }
            }
            Direction::Right => {
                if self.head >= self.rightmost() - self.lookahead {
                    self.cells.push_back(Symbol::Blank);
                    debug!(rightmost = self.rightmost(), "tape grew right");
                }
            }
        }

        self.head += direction.offset();
        self.materialize(self.head);

        // The tape slides opposite to the head so the head stays put on screen.
        self.slide.start(-(direction.offset() as f32) * self.cell_size);
        true
    }

    /// Advances the slide by one frame. Returns true on the frame it comes to rest.
    pub fn tick(&mut self) -> bool {
        self.slide.tick()
    }

    /// Writes `symbol` into the cell under the pointer, if any. Refused while sliding.
    pub fn init_symbol_under_pointer(&mut self, symbol: Symbol) -> bool {
        if self.is_animating() {
            return false;
        }

        match self.hovered {
            Some(index) if self.contains(index) => {
                self.set(index, symbol);
                true
            }
            _ => false,
        }
    }

    /// Writes `symbols` into consecutive cells starting at the head. Refused while sliding.
    pub fn load(&mut self, symbols: &[Symbol]) -> bool {
        if self.is_animating() {
            return false;
        }

        for (offset, &symbol) in symbols.iter().enumerate() {
            self.set(self.head + offset as i64, symbol);
        }
        // Keep the lookahead buffer past the loaded content.
        self.materialize(self.head + symbols.len() as i64 + self.lookahead);
        true
    }

    /// Returns the symbol at `index`. Cells not yet materialized read as blank.
    pub fn symbol_at(&self, index: i64) -> Symbol {
        self.slot(index)
            .and_then(|slot| self.cells.get(slot).copied())
            .unwrap_or_default()
    }

    /// Returns every materialized cell as `(index, symbol)`, left to right.
    pub fn cells(&self) -> impl Iterator<Item = (i64, Symbol)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(slot, &symbol)| (self.leftmost + slot as i64, symbol))
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn leftmost(&self) -> i64 {
        self.leftmost
    }

    pub fn rightmost(&self) -> i64 {
        self.leftmost + self.cells.len() as i64 - 1
    }

    /// Returns true if a cell has been materialized at `index`.
    pub fn contains(&self, index: i64) -> bool {
        index >= self.leftmost && index <= self.rightmost()
    }

    pub fn is_animating(&self) -> bool {
        self.slide.is_moving()
    }

    /// Returns the current visual offset of the tape.
    pub fn offset(&self) -> f32 {
        self.slide.position()
    }

    /// Returns the offset the current slide is heading to.
    pub fn target_offset(&self) -> f32 {
        self.slide.target()
    }

    /// Returns the size of one cell in the same units as [`Tape::offset`].
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Records which cell the pointer is over. Indices outside the materialized range are dropped.
    pub fn set_hovered(&mut self, index: Option<i64>) {
        self.hovered = index.filter(|&i| self.contains(i));
    }

    pub fn hovered(&self) -> Option<i64> {
        self.hovered
    }

    pub fn is_hovered(&self, index: i64) -> bool {
        self.hovered == Some(index)
    }

    fn slot(&self, index: i64) -> Option<usize> {
        self.contains(index).then(|| (index - self.leftmost) as usize)
    }

    fn set(&mut self, index: i64, symbol: Symbol) {
        self.materialize(index);
        if let Some(slot) = self.slot(index) {
            self.cells[slot] = symbol;
        }
    }

    fn materialize(&mut self, index: i64) {
        while index < self.leftmost {
            self.cells.push_front(Symbol::Blank);
            self.leftmost -= 1;
        }
        while index > self.rightmost() {
            self.cells.push_back(Symbol::Blank);
        }
    }
}
