//! Board-facing display glue.
//!
//! Binds the refresh engine's actuation seam to the FP2800A shared bus:
//! the scanner decides which dots differ, this module turns each one into
//! an addressed, polarity-corrected, enable-gated pulse.

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use heapless::Vec;
use log::info;

use fp2800a::{ColumnAddress, EnablePair, RowAddress, SharedBus, Timing};
use fp317_core::{
    actuator::DotActuator,
    config::{MAX_TILES, TileConfig},
    frame::Frame,
    mapper::{DotTarget, OutOfBounds},
    render::{Panel, RenderProgress, RenderReport},
    topology::ConfigError,
};

/// Rejected display construction. Nothing has been pulsed when this
/// returns; parking the lines is the only pin activity construction does.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetupError<BusErr, EnableErr> {
    /// The tile table failed topology validation.
    Config(ConfigError),
    /// The enable-pair list is not positional with the tile table.
    EnableCountMismatch { tiles: usize, enables: usize },
    /// A shared line failed to park.
    Bus(BusErr),
    /// An enable line failed to park.
    Enable(EnableErr),
}

/// Actuation failure for one dot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriveError<BusErr, EnableErr> {
    /// The targeted tile is disabled or unknown. A validated grid never
    /// produces such a target; re-checked here anyway.
    TileDisabled { tile: u8 },
    /// The in-tile address is outside the chip's output range. Same
    /// defensive story as `TileDisabled`.
    BadAddress { column: u8, row: u8 },
    /// The driver failed to switch a line.
    Driver(fp2800a::Error<BusErr, EnableErr>),
}

/// A complete flip-dot display.
///
/// Owns the validated panel state, the shared bus, a copy of the tile
/// table, and one enable pair per table row. Exclusive bus access is
/// enforced by ownership; there is no lock because `&mut self` already
/// serializes every flip.
pub struct Display<P, E> {
    panel: Panel,
    bus: SharedBus<P>,
    tiles: Vec<TileConfig, MAX_TILES>,
    enables: Vec<EnablePair<E>, MAX_TILES>,
}

impl<P, E> Display<P, E>
where
    P: OutputPin,
    E: OutputPin,
{
    /// Validates the tile table and takes ownership of the lines.
    ///
    /// `enables` must be positional with `tiles`: row `i` of the table is
    /// driven by pair `i`. Every owned line is parked low before this
    /// returns, establishing the idle state.
    pub fn new(
        tiles: &[TileConfig],
        bus: SharedBus<P>,
        enables: Vec<EnablePair<E>, MAX_TILES>,
    ) -> Result<Self, SetupError<P::Error, E::Error>> {
        if tiles.len() != enables.len() {
            return Err(SetupError::EnableCountMismatch {
                tiles: tiles.len(),
                enables: enables.len(),
            });
        }

        let panel = Panel::new(tiles).map_err(SetupError::Config)?;
        let table = Vec::from_slice(tiles)
            .map_err(|()| SetupError::Config(ConfigError::TableTooLong { rows: tiles.len() }))?;

        let mut display = Self {
            panel,
            bus,
            tiles: table,
            enables,
        };
        display.bus.park().map_err(SetupError::Bus)?;
        for enable in &mut display.enables {
            enable.park().map_err(SetupError::Enable)?;
        }

        info!(
            "display up: {}x{} dots over {} tiles",
            display.panel.width(),
            display.panel.height(),
            display.panel.grid().tile_count()
        );
        Ok(display)
    }

    /// Panel width in dots.
    pub fn width(&self) -> usize {
        self.panel.width()
    }

    /// Panel height in dots.
    pub fn height(&self) -> usize {
        self.panel.height()
    }

    /// Read access to the panel state.
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Configured bus timing.
    pub fn timing(&self) -> Timing {
        self.bus.timing()
    }

    /// Sets one dot in the desired frame.
    pub fn set_dot(&mut self, x: usize, y: usize, on: bool) -> Result<(), OutOfBounds> {
        self.panel.set_dot(x, y, on)
    }

    /// Reads one dot from the desired frame.
    pub fn dot(&self, x: usize, y: usize) -> Option<bool> {
        self.panel.dot(x, y)
    }

    /// Drives the whole desired frame to one state.
    pub fn fill(&mut self, on: bool) {
        self.panel.fill(on);
    }

    /// Direct access to the desired frame, for bitmap upload or drawing.
    pub fn frame_mut(&mut self) -> &mut Frame {
        self.panel.desired_mut()
    }

    /// Number of dots waiting to be flipped.
    pub fn pending(&self) -> usize {
        self.panel.pending()
    }

    /// Flips every dot whose desired state differs from the committed one.
    pub fn render<D: DelayNs>(&mut self, delay: &mut D) -> RenderReport {
        let Self {
            panel,
            bus,
            tiles,
            enables,
        } = self;
        let mut actuator = BusActuator {
            bus,
            tiles,
            enables,
            delay,
        };
        panel.render(&mut actuator)
    }

    /// Rewrites every dot unconditionally.
    ///
    /// Call once after power-up: the physical dots still show whatever the
    /// display held when power dropped, so the committed frame cannot be
    /// trusted until one full rewrite.
    pub fn render_all<D: DelayNs>(&mut self, delay: &mut D) -> RenderReport {
        let Self {
            panel,
            bus,
            tiles,
            enables,
        } = self;
        let mut actuator = BusActuator {
            bus,
            tiles,
            enables,
            delay,
        };
        panel.render_all(&mut actuator)
    }

    /// Flips at most `budget` dots, for hosts that must interleave other
    /// duties. Pausing happens only between dots, never inside a flip.
    pub fn render_step<D: DelayNs>(
        &mut self,
        delay: &mut D,
        budget: usize,
    ) -> (RenderReport, RenderProgress) {
        let Self {
            panel,
            bus,
            tiles,
            enables,
        } = self;
        let mut actuator = BusActuator {
            bus,
            tiles,
            enables,
            delay,
        };
        panel.render_step(&mut actuator, budget)
    }

    /// Releases the owned bus and enable pairs.
    pub fn release(self) -> (SharedBus<P>, Vec<EnablePair<E>, MAX_TILES>) {
        (self.bus, self.enables)
    }
}

struct BusActuator<'a, P, E, D> {
    bus: &'a mut SharedBus<P>,
    tiles: &'a Vec<TileConfig, MAX_TILES>,
    enables: &'a mut Vec<EnablePair<E>, MAX_TILES>,
    delay: &'a mut D,
}

impl<P, E, D> DotActuator for BusActuator<'_, P, E, D>
where
    P: OutputPin,
    E: OutputPin,
    D: DelayNs,
{
    type Error = DriveError<P::Error, E::Error>;

    fn flip(&mut self, target: &DotTarget, on: bool) -> Result<(), Self::Error> {
        let index = target.tile as usize;
        if !self.tiles.get(index).is_some_and(|tile| tile.enabled) {
            return Err(DriveError::TileDisabled { tile: target.tile });
        }
        let Some(enable) = self.enables.get_mut(index) else {
            return Err(DriveError::TileDisabled { tile: target.tile });
        };

        let column = ColumnAddress::new(target.column).ok_or(DriveError::BadAddress {
            column: target.column,
            row: target.row,
        })?;
        let row = RowAddress::new(target.row).ok_or(DriveError::BadAddress {
            column: target.column,
            row: target.row,
        })?;

        self.bus
            .flip(
                enable,
                column,
                row,
                target.polarity.level_for(on),
                self.delay,
            )
            .map_err(DriveError::Driver)
    }
}
