//! Actuation seam between the scan engine and the driver hardware.

use crate::mapper::DotTarget;

/// Flips single dots on command.
///
/// Implementations own the shared bus and the enable lines, and block until
/// the dot has been pulsed. A returned error means the dot may not have
/// moved; the scanner retries a bounded number of times and then contains
/// the dot as a per-scan fault.
pub trait DotActuator {
    type Error;

    /// Drives the addressed dot to the given logical state.
    fn flip(&mut self, target: &DotTarget, on: bool) -> Result<(), Self::Error>;
}
