//! Frame differencing and the deterministic refresh scan.

use heapless::Vec;
use log::{debug, warn};

use crate::{
    actuator::DotActuator,
    config::{TILE_HEIGHT, TILE_WIDTH, TileConfig},
    frame::Frame,
    mapper::OutOfBounds,
    topology::{ConfigError, Grid},
};

/// Actuation attempts per dot before it is reported as a fault.
pub const FLIP_RETRY_LIMIT: u8 = 3;
/// Faults kept per report; later faults are counted but not stored.
pub const MAX_FAULTS: usize = 32;

/// A dot that failed every actuation attempt in one scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DotFault {
    pub x: u16,
    pub y: u16,
}

/// Outcome of one refresh pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderReport {
    /// Dots flipped and committed.
    pub flipped: u32,
    /// Dots abandoned after [`FLIP_RETRY_LIMIT`] attempts.
    pub faults: Vec<DotFault, MAX_FAULTS>,
    /// Faults that no longer fit in `faults`.
    pub dropped_faults: u16,
}

impl RenderReport {
    /// True when every attempted dot committed.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.dropped_faults == 0
    }

    fn record_fault(&mut self, x: usize, y: usize) {
        let fault = DotFault {
            x: x as u16,
            y: y as u16,
        };
        if self.faults.push(fault).is_err() {
            self.dropped_faults = self.dropped_faults.saturating_add(1);
        }
    }
}

/// Whether a budgeted scan reached the end of the frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderProgress {
    Finished,
    OutOfBudget,
}

/// Desired and committed frames over a validated grid.
///
/// `desired` is caller-owned state and may change at any time between
/// scans; `committed` tracks what has physically been applied and is
/// updated only after a successful flip. Dots are bistable, so a dot whose
/// two frames agree is never touched again.
pub struct Panel {
    grid: Grid,
    desired: Frame,
    committed: Frame,
}

impl Panel {
    /// Validates the tile table and builds an all-clear panel.
    pub fn new(tiles: &[TileConfig]) -> Result<Self, ConfigError> {
        let grid = Grid::from_tiles(tiles)?;
        let desired = Frame::for_dimensions(grid.width(), grid.height());
        let committed = desired.clone();

        Ok(Self {
            grid,
            desired,
            committed,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Panel width in dots.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Panel height in dots.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Sets one dot in the desired frame.
    pub fn set_dot(&mut self, x: usize, y: usize, on: bool) -> Result<(), OutOfBounds> {
        if self.desired.set_pixel(x, y, on) {
            Ok(())
        } else {
            Err(OutOfBounds { x, y })
        }
    }

    /// Reads one dot from the desired frame.
    pub fn dot(&self, x: usize, y: usize) -> Option<bool> {
        self.desired.pixel(x, y)
    }

    /// Reads one dot from the committed frame.
    pub fn committed_dot(&self, x: usize, y: usize) -> Option<bool> {
        self.committed.pixel(x, y)
    }

    /// Drives the whole desired frame to one state.
    pub fn fill(&mut self, on: bool) {
        self.desired.fill(on);
    }

    /// Direct access to the desired frame, for bitmap upload or drawing.
    pub fn desired_mut(&mut self) -> &mut Frame {
        &mut self.desired
    }

    /// Number of dots whose desired and committed states differ.
    pub fn pending(&self) -> usize {
        let mut count = 0;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.desired.pixel(x, y) != self.committed.pixel(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Drives the panel to match the desired frame.
    ///
    /// Only dots whose committed state differs are actuated; rendering the
    /// same frame twice performs zero flips the second time.
    pub fn render<A: DotActuator>(&mut self, actuator: &mut A) -> RenderReport {
        let (report, _) = self.scan(actuator, usize::MAX, false);
        report
    }

    /// Rewrites every dot regardless of the committed state.
    ///
    /// Dots are bistable, so the physical state at power-up is whatever the
    /// display last showed. One full rewrite establishes a known committed
    /// state; afterwards [`Self::render`] diffs are trustworthy.
    pub fn render_all<A: DotActuator>(&mut self, actuator: &mut A) -> RenderReport {
        let (report, _) = self.scan(actuator, usize::MAX, true);
        report
    }

    /// Renders at most `budget` flips, then yields.
    ///
    /// Cooperative hosts call this repeatedly; the scan may stop between
    /// dots but never inside a flip. A paused scan leaves `committed`
    /// consistent with the dots actually applied, and the next call resumes
    /// from the recomputed difference.
    pub fn render_step<A: DotActuator>(
        &mut self,
        actuator: &mut A,
        budget: usize,
    ) -> (RenderReport, RenderProgress) {
        self.scan(actuator, budget, false)
    }

    /// Scan order is fixed: tiles row-major across the grid, then rows,
    /// then columns within each tile. Worst-case latency is bounded and
    /// traces are reproducible.
    fn scan<A: DotActuator>(
        &mut self,
        actuator: &mut A,
        budget: usize,
        force: bool,
    ) -> (RenderReport, RenderProgress) {
        let mut report = RenderReport::default();
        let mut remaining = budget;

        for cell_y in 0..self.grid.tiles_high() {
            for cell_x in 0..self.grid.tiles_wide() {
                for row in 0..TILE_HEIGHT {
                    for col in 0..TILE_WIDTH {
                        let x = cell_x * TILE_WIDTH + col;
                        let y = cell_y * TILE_HEIGHT + row;

                        let Some(on) = self.desired.pixel(x, y) else {
                            continue;
                        };
                        if !force && self.committed.pixel(x, y) == Some(on) {
                            continue;
                        }

                        if remaining == 0 {
                            debug!(
                                "refresh paused after {} flips, budget spent",
                                report.flipped
                            );
                            return (report, RenderProgress::OutOfBudget);
                        }
                        remaining -= 1;

                        let Ok(target) = self.grid.locate(x, y) else {
                            continue;
                        };

                        let mut applied = false;
                        for _ in 0..FLIP_RETRY_LIMIT {
                            if actuator.flip(&target, on).is_ok() {
                                applied = true;
                                break;
                            }
                        }

                        if applied {
                            let _ = self.committed.set_pixel(x, y, on);
                            report.flipped += 1;
                        } else {
                            warn!("dot ({x}, {y}) dead after {FLIP_RETRY_LIMIT} attempts");
                            report.record_fault(x, y);
                        }
                    }
                }
            }
        }

        debug!(
            "refresh complete: {} flips, {} faults",
            report.flipped,
            report.faults.len()
        );
        (report, RenderProgress::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::DotTarget;

    struct ScriptedActuator {
        flips: std::vec::Vec<(u8, u8, u8, bool)>,
        attempts: usize,
        stuck: Option<(u8, u8)>,
    }

    impl ScriptedActuator {
        fn new() -> Self {
            Self {
                flips: std::vec::Vec::new(),
                attempts: 0,
                stuck: None,
            }
        }

        fn with_stuck_dot(column: u8, row: u8) -> Self {
            let mut actuator = Self::new();
            actuator.stuck = Some((column, row));
            actuator
        }
    }

    impl DotActuator for ScriptedActuator {
        type Error = ();

        fn flip(&mut self, target: &DotTarget, on: bool) -> Result<(), ()> {
            self.attempts += 1;
            if self.stuck == Some((target.column, target.row)) {
                return Err(());
            }

            self.flips.push((target.tile, target.column, target.row, on));
            Ok(())
        }
    }

    fn single_tile_panel() -> Panel {
        Panel::new(&[TileConfig::new(1, 1)]).unwrap()
    }

    #[test]
    fn render_flips_only_differing_dots() {
        let mut panel = single_tile_panel();
        let mut actuator = ScriptedActuator::new();

        panel.set_dot(2, 3, true).unwrap();
        panel.set_dot(10, 0, true).unwrap();

        let report = panel.render(&mut actuator);
        assert_eq!(report.flipped, 2);
        assert!(report.is_clean());
        assert_eq!(panel.committed_dot(2, 3), Some(true));
        assert_eq!(panel.pending(), 0);
    }

    #[test]
    fn rendering_the_same_frame_twice_is_silent() {
        let mut panel = single_tile_panel();
        let mut actuator = ScriptedActuator::new();

        panel.set_dot(4, 4, true).unwrap();
        panel.render(&mut actuator);

        let attempts_after_first = actuator.attempts;
        let report = panel.render(&mut actuator);

        assert_eq!(report.flipped, 0);
        assert_eq!(actuator.attempts, attempts_after_first);
    }

    #[test]
    fn set_then_clear_round_trip_flips_exactly_twice() {
        let mut panel = single_tile_panel();
        let mut actuator = ScriptedActuator::new();

        panel.set_dot(0, 0, true).unwrap();
        panel.render(&mut actuator);
        panel.set_dot(0, 0, false).unwrap();
        panel.render(&mut actuator);

        assert_eq!(panel.committed_dot(0, 0), Some(false));
        assert_eq!(actuator.flips.len(), 2);
        assert_eq!(actuator.flips[0], (0, 0, 0, true));
        assert_eq!(actuator.flips[1], (0, 0, 0, false));
    }

    #[test]
    fn stuck_dot_is_contained_and_reported() {
        let mut panel = single_tile_panel();
        let mut actuator = ScriptedActuator::with_stuck_dot(5, 5);

        panel.set_dot(1, 1, true).unwrap();
        panel.set_dot(5, 5, true).unwrap();

        let report = panel.render(&mut actuator);

        assert_eq!(report.flipped, 1);
        assert_eq!(report.faults.as_slice(), &[DotFault { x: 5, y: 5 }]);
        assert_eq!(report.dropped_faults, 0);
        assert_eq!(panel.committed_dot(1, 1), Some(true));
        assert_eq!(panel.committed_dot(5, 5), Some(false));

        // One good dot plus every retry on the stuck one.
        assert_eq!(actuator.attempts, 1 + FLIP_RETRY_LIMIT as usize);

        // The stuck dot stays pending for the next scan.
        assert_eq!(panel.pending(), 1);
    }

    #[test]
    fn scan_order_is_tile_then_row_then_column() {
        let mut panel = Panel::new(&[TileConfig::new(1, 1), TileConfig::new(2, 1)]).unwrap();
        let mut actuator = ScriptedActuator::new();

        // Reverse of the expected actuation order.
        panel.set_dot(TILE_WIDTH, 0, true).unwrap();
        panel.set_dot(0, 1, true).unwrap();
        panel.set_dot(5, 0, true).unwrap();

        panel.render(&mut actuator);

        let order: std::vec::Vec<(u8, u8, u8)> = actuator
            .flips
            .iter()
            .map(|(tile, column, row, _)| (*tile, *column, *row))
            .collect();
        assert_eq!(order, [(0, 5, 0), (0, 0, 1), (1, 0, 0)]);
    }

    #[test]
    fn budget_pauses_between_dots_and_resumes() {
        let mut panel = single_tile_panel();
        let mut actuator = ScriptedActuator::new();

        for x in 0..5 {
            panel.set_dot(x, 0, true).unwrap();
        }

        let (report, progress) = panel.render_step(&mut actuator, 2);
        assert_eq!(report.flipped, 2);
        assert_eq!(progress, RenderProgress::OutOfBudget);
        assert_eq!(panel.pending(), 3);

        let (report, progress) = panel.render_step(&mut actuator, usize::MAX);
        assert_eq!(report.flipped, 3);
        assert_eq!(progress, RenderProgress::Finished);
        assert_eq!(panel.pending(), 0);
    }

    #[test]
    fn render_all_rewrites_every_dot() {
        let mut panel = single_tile_panel();
        let mut actuator = ScriptedActuator::new();

        let report = panel.render_all(&mut actuator);
        assert_eq!(report.flipped as usize, TILE_WIDTH * TILE_HEIGHT);

        // The full rewrite committed everything; a diff scan is now silent.
        let report = panel.render(&mut actuator);
        assert_eq!(report.flipped, 0);
    }

    #[test]
    fn fault_overflow_is_counted() {
        let mut panel = single_tile_panel();

        struct DeadActuator;
        impl DotActuator for DeadActuator {
            type Error = ();

            fn flip(&mut self, _target: &DotTarget, _on: bool) -> Result<(), ()> {
                Err(())
            }
        }

        panel.fill(true);
        let report = panel.render(&mut DeadActuator);

        assert_eq!(report.flipped, 0);
        assert_eq!(report.faults.len(), MAX_FAULTS);
        assert_eq!(
            report.dropped_faults as usize,
            TILE_WIDTH * TILE_HEIGHT - MAX_FAULTS
        );
    }
}
