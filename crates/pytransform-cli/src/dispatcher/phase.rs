//! Dispatcher state machine.
//!
//! `Idle → AwaitingStart → Ready → InFlight → Idle`. Only one transform may
//! be outside `Idle` at a time; a second one is rejected as busy.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Where the current transform command is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchPhase {
    /// No transform is running.
    #[default]
    Idle,
    /// Input resolved; making sure the service is available.
    AwaitingStart,
    /// Service believed available; request not yet sent.
    Ready,
    /// Request sent; waiting for the response.
    InFlight,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::AwaitingStart => "awaiting start",
            Self::Ready => "ready",
            Self::InFlight => "in flight",
        };
        formatter.write_str(label)
    }
}

#[derive(Debug, Default)]
pub(super) struct PhaseCell(Mutex<DispatchPhase>);

impl PhaseCell {
    pub(super) fn get(&self) -> DispatchPhase {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves from `Idle` to `AwaitingStart`, or returns `None` when another
    /// transform holds the cell.
    pub(super) fn claim(&self) -> Option<PhaseGuard<'_>> {
        let mut phase = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != DispatchPhase::Idle {
            return None;
        }
        *phase = DispatchPhase::AwaitingStart;
        Some(PhaseGuard { cell: self })
    }

    fn set(&self, next: DispatchPhase) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Exclusive hold on the phase cell; returns it to `Idle` on drop.
pub(super) struct PhaseGuard<'a> {
    cell: &'a PhaseCell,
}

impl PhaseGuard<'_> {
    pub(super) fn advance(&self, next: DispatchPhase) {
        self.cell.set(next);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.cell.set(DispatchPhase::Idle);
    }
}
