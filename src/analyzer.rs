//! This module provides static checks over a delta sheet, run before execution to point out
//! rows that can never be used, references to rows that no longer exist, and tables that
//! can never stop on their own.

use std::collections::HashSet;

use thiserror::Error;

use crate::sheet::Sheet;
use crate::types::{StateRef, Symbol};

/// Represents the problems that can be found in a delta sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The initial state is HALT, so the machine stops before reading anything.
    #[error("Initial state is HALT")]
    HaltInitialState,
    /// Slots whose next state points past the last row.
    #[error("Transitions reference missing states: {0:?}")]
    DanglingReferences(Vec<(usize, Symbol)>),
    /// Rows that no defined transition can reach from the initial state.
    #[error("Unreachable states: {0:?}")]
    UnreachableStates(Vec<usize>),
    /// Every reachable slot is defined and none leads to HALT, so only the stop control
    /// can end a run.
    #[error("No reachable transition halts the machine")]
    NeverHalts,
}

/// Analyzes a sheet and returns the first problem found.
///
/// # Returns
///
/// * `Ok(())` if no problems are found.
/// * `Err(AnalysisError)` describing the first problem otherwise.
pub fn analyze(sheet: &Sheet) -> Result<(), AnalysisError> {
    match findings(sheet).into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Runs every check and collects all problems, in check order.
pub fn findings(sheet: &Sheet) -> Vec<AnalysisError> {
    [
        check_initial_state,
        check_dangling_references,
        check_unreachable_states,
        check_halting,
    ]
    .iter()
    .filter_map(|f| f(sheet).err())
    .collect()
}

fn check_initial_state(sheet: &Sheet) -> Result<(), AnalysisError> {
    if sheet.initial_state().is_halt() {
        return Err(AnalysisError::HaltInitialState);
    }
    Ok(())
}

/// Checks that every next state names a row that exists.
fn check_dangling_references(sheet: &Sheet) -> Result<(), AnalysisError> {
    let max_index = sheet.max_index();
    let dangling: Vec<(usize, Symbol)> = sheet
        .rows()
        .iter()
        .flat_map(|row| {
            Symbol::ALL
                .into_iter()
                .filter_map(move |symbol| row.slot(symbol).map(|t| (row.index(), symbol, t.next)))
        })
        .filter(|&(_, _, next)| matches!(next, StateRef::State(i) if i > max_index))
        .map(|(row, symbol, _)| (row, symbol))
        .collect();

    if !dangling.is_empty() {
        return Err(AnalysisError::DanglingReferences(dangling));
    }
    Ok(())
}

/// Checks for rows that cannot be reached from the initial state.
///
/// Undefined slots halt the machine, so they contribute no edges.
fn check_unreachable_states(sheet: &Sheet) -> Result<(), AnalysisError> {
    if sheet.initial_state().is_halt() {
        return Ok(());
    }
    let visited = reachable(sheet);

    let mut unreachable: Vec<usize> = (0..sheet.len()).filter(|i| !visited.contains(i)).collect();

    if !unreachable.is_empty() {
        unreachable.sort();
        return Err(AnalysisError::UnreachableStates(unreachable));
    }
    Ok(())
}

/// Checks that some reachable row either has an undefined slot or leads to HALT.
fn check_halting(sheet: &Sheet) -> Result<(), AnalysisError> {
    let visited = reachable(sheet);
    if visited.is_empty() {
        // The machine halts immediately; reported by `check_initial_state`.
        return Ok(());
    }

    let halts = visited
        .iter()
        .filter_map(|&index| sheet.row(index))
        .flat_map(|row| row.slots().iter())
        .any(|slot| match slot {
            None => true,
            Some(transition) => transition.next.is_halt(),
        });

    if !halts {
        return Err(AnalysisError::NeverHalts);
    }
    Ok(())
}

/// Returns the rows reachable from the initial state through defined transitions.
fn reachable(sheet: &Sheet) -> HashSet<usize> {
    let mut visited = HashSet::new();
    let mut queue: Vec<usize> = match sheet.initial_state() {
        StateRef::State(index) => vec![index],
        StateRef::Halt => Vec::new(),
    };

    while let Some(index) = queue.pop() {
        if !visited.insert(index) {
            continue;
        }

        let Some(row) = sheet.row(index) else {
            continue;
        };
        for transition in row.slots().iter().flatten() {
            if let StateRef::State(next) = transition.next {
                if !visited.contains(&next) {
                    queue.push(next);
                }
            }
        }
    }

    visited.retain(|&index| index < sheet.len());
    visited
}
