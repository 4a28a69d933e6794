#![cfg_attr(not(test), no_std)]

//! FP2800A shared-bus driver primitives for flip-dot tiles.
//!
//! Every tile in a display chain shares one set of address and data lines;
//! each tile contributes its own pair of enable inputs. Raising an enable
//! pair while the shared lines are settled flips exactly one dot on that
//! tile, so enable gating is the only thing standing between one flip and
//! the whole chain flipping at once. [`SharedBus::flip`] performs the flip
//! sequence with the required settle and pulse timing.

pub mod address;

pub use address::{ColumnAddress, RowAddress};

use embedded_hal::{delay::DelayNs, digital::OutputPin};

/// Flip timing in nanoseconds.
///
/// Values below the chip decode and coil minimums flip the wrong dots or
/// none at all; an over-long pulse overheats the coil. Boards tune these
/// against the FP2800A datasheet and the tile's coil rating. Defaults are
/// conservative placeholders, not datasheet values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    /// Hold after the address lines change, before data is asserted.
    pub address_settle_ns: u32,
    /// Hold after the data level changes, before enable rises.
    pub data_settle_ns: u32,
    /// Enable pulse width.
    pub pulse_ns: u32,
    /// Bus idle time after the pulse, before the next flip may start.
    pub recovery_ns: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            address_settle_ns: 20_000,
            data_settle_ns: 10_000,
            pulse_ns: 500_000,
            recovery_ns: 150_000,
        }
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<BusErr, EnableErr> {
    /// A shared address or data line failed to switch.
    Bus(BusErr),
    /// A tile enable line failed to switch.
    Enable(EnableErr),
}

pub type FlipResult<BusErr, EnableErr> = Result<(), Error<BusErr, EnableErr>>;

/// Shared lines of the column chip (U1).
#[derive(Debug)]
pub struct ColumnLines<P> {
    a0: P,
    a1: P,
    a2: P,
    b0: P,
    b1: P,
    data: P,
}

impl<P: OutputPin> ColumnLines<P> {
    pub fn new(a0: P, a1: P, a2: P, b0: P, b1: P, data: P) -> Self {
        Self {
            a0,
            a1,
            a2,
            b0,
            b1,
            data,
        }
    }
}

/// Shared lines of the row chip (U2).
///
/// U2 has no dedicated data pin; its B0 input doubles as the data level,
/// so only B1 takes part in group selection.
#[derive(Debug)]
pub struct RowLines<P> {
    a0: P,
    a1: P,
    a2: P,
    b1: P,
    b0_data: P,
}

impl<P: OutputPin> RowLines<P> {
    pub fn new(a0: P, a1: P, a2: P, b1: P, b0_data: P) -> Self {
        Self {
            a0,
            a1,
            a2,
            b1,
            b0_data,
        }
    }
}

/// One tile's enable inputs, the only non-shared lines in the chain.
#[derive(Debug)]
pub struct EnablePair<P> {
    u1: P,
    u2: P,
}

impl<P: OutputPin> EnablePair<P> {
    pub fn new(u1: P, u2: P) -> Self {
        Self { u1, u2 }
    }

    /// Drives both enable lines low.
    pub fn park(&mut self) -> Result<(), P::Error> {
        self.u1.set_low()?;
        self.u2.set_low()
    }

    /// Releases the owned pins.
    pub fn release(self) -> (P, P) {
        (self.u1, self.u2)
    }
}

/// The address/data bus shared by every tile in the chain.
#[derive(Debug)]
pub struct SharedBus<P> {
    column: ColumnLines<P>,
    row: RowLines<P>,
    timing: Timing,
}

impl<P: OutputPin> SharedBus<P> {
    /// Creates a bus over the eleven shared lines.
    pub fn new(column: ColumnLines<P>, row: RowLines<P>, timing: Timing) -> Self {
        Self {
            column,
            row,
            timing,
        }
    }

    /// Returns the configured timing.
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Releases the owned lines.
    pub fn release(self) -> (ColumnLines<P>, RowLines<P>) {
        (self.column, self.row)
    }

    /// Drives every shared line low, the idle state.
    pub fn park(&mut self) -> Result<(), P::Error> {
        self.column.a0.set_low()?;
        self.column.a1.set_low()?;
        self.column.a2.set_low()?;
        self.column.b0.set_low()?;
        self.column.b1.set_low()?;
        self.column.data.set_low()?;
        self.row.a0.set_low()?;
        self.row.a1.set_low()?;
        self.row.a2.set_low()?;
        self.row.b1.set_low()?;
        self.row.b0_data.set_low()
    }

    fn set_level(pin: &mut P, level: bool) -> Result<(), P::Error> {
        if level { pin.set_high() } else { pin.set_low() }
    }

    fn drive_address(&mut self, column: ColumnAddress, row: RowAddress) -> Result<(), P::Error> {
        Self::set_level(&mut self.column.a0, column.a0())?;
        Self::set_level(&mut self.column.a1, column.a1())?;
        Self::set_level(&mut self.column.a2, column.a2())?;
        Self::set_level(&mut self.column.b0, column.b0())?;
        Self::set_level(&mut self.column.b1, column.b1())?;
        Self::set_level(&mut self.row.a0, row.a0())?;
        Self::set_level(&mut self.row.a1, row.a1())?;
        Self::set_level(&mut self.row.a2, row.a2())?;
        Self::set_level(&mut self.row.b1, row.b1())
    }

    fn drive_data(&mut self, level: bool) -> Result<(), P::Error> {
        Self::set_level(&mut self.column.data, level)?;
        Self::set_level(&mut self.row.b0_data, level)
    }

    /// Flips one dot on the tile owning `enable`.
    ///
    /// The sequence is fixed: address lines settle first, then the data
    /// level, and only then does the enable pair pulse. Raising enable
    /// against an unsettled bus flips the wrong dot or stresses the chip
    /// outputs, so the order must not change. Blocks for the full settle,
    /// pulse, and recovery time.
    pub fn flip<E, D>(
        &mut self,
        enable: &mut EnablePair<E>,
        column: ColumnAddress,
        row: RowAddress,
        level: bool,
        delay: &mut D,
    ) -> FlipResult<P::Error, E::Error>
    where
        E: OutputPin,
        D: DelayNs,
    {
        self.drive_address(column, row).map_err(Error::Bus)?;
        delay.delay_ns(self.timing.address_settle_ns);

        self.drive_data(level).map_err(Error::Bus)?;
        delay.delay_ns(self.timing.data_settle_ns);

        enable.u1.set_high().map_err(Error::Enable)?;
        if let Err(err) = enable.u2.set_high() {
            // Never leave a half-raised pair behind.
            let _ = enable.u1.set_low();
            return Err(Error::Enable(err));
        }

        delay.delay_ns(self.timing.pulse_ns);

        // Both lines must come down even if one write fails.
        let u1_low = enable.u1.set_low();
        let u2_low = enable.u2.set_low();
        u1_low.map_err(Error::Enable)?;
        u2_low.map_err(Error::Enable)?;

        delay.delay_ns(self.timing.recovery_ns);
        Ok(())
    }
}
