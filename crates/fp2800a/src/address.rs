//! Output-select encoding for the FP2800A 28-output decoder/driver.

/// Column outputs available on one chip.
pub const COLUMN_OUTPUTS: u8 = 28;
/// Row outputs used on the row-side chip (two of the four groups).
pub const ROW_OUTPUTS: u8 = 14;
/// Outputs per B-select group.
pub const GROUP_OUTPUTS: u8 = 7;

/// One-of-28 column select for the column chip (U1).
///
/// `A0..A2` carry a 1-based code for the output inside a group; code 0
/// selects no output. `B0,B1` select one of four groups of seven.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnAddress {
    column: u8,
}

impl ColumnAddress {
    /// Builds a select code for a tile column.
    ///
    /// Returns `None` for columns outside `0..=27`.
    #[inline]
    pub const fn new(column: u8) -> Option<Self> {
        if column >= COLUMN_OUTPUTS {
            return None;
        }

        Some(Self { column })
    }

    /// Tile column this address selects.
    #[inline]
    pub const fn column(self) -> u8 {
        self.column
    }

    /// 1-based in-group code driven on `A0..A2`.
    #[inline]
    pub const fn a_code(self) -> u8 {
        self.column % GROUP_OUTPUTS + 1
    }

    /// Group number driven on `B0,B1`.
    #[inline]
    pub const fn b_code(self) -> u8 {
        self.column / GROUP_OUTPUTS
    }

    #[inline]
    pub const fn a0(self) -> bool {
        self.a_code() & 0b001 != 0
    }

    #[inline]
    pub const fn a1(self) -> bool {
        self.a_code() & 0b010 != 0
    }

    #[inline]
    pub const fn a2(self) -> bool {
        self.a_code() & 0b100 != 0
    }

    #[inline]
    pub const fn b0(self) -> bool {
        self.b_code() & 0b01 != 0
    }

    #[inline]
    pub const fn b1(self) -> bool {
        self.b_code() & 0b10 != 0
    }
}

/// One-of-14 row select for the row chip (U2).
///
/// `A0..A2` carry the same 1-based in-group code as columns. Only `B1`
/// takes part in group selection; the chip's B0 input is wired as the data
/// level and is never driven during addressing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowAddress {
    row: u8,
}

impl RowAddress {
    /// Builds a select code for a tile row.
    ///
    /// Returns `None` for rows outside `0..=13`.
    #[inline]
    pub const fn new(row: u8) -> Option<Self> {
        if row >= ROW_OUTPUTS {
            return None;
        }

        Some(Self { row })
    }

    /// Tile row this address selects.
    #[inline]
    pub const fn row(self) -> u8 {
        self.row
    }

    /// 1-based in-group code driven on `A0..A2`.
    #[inline]
    pub const fn a_code(self) -> u8 {
        self.row % GROUP_OUTPUTS + 1
    }

    #[inline]
    pub const fn a0(self) -> bool {
        self.a_code() & 0b001 != 0
    }

    #[inline]
    pub const fn a1(self) -> bool {
        self.a_code() & 0b010 != 0
    }

    #[inline]
    pub const fn a2(self) -> bool {
        self.a_code() & 0b100 != 0
    }

    /// Group select, low for rows `0..=6`, high for rows `7..=13`.
    #[inline]
    pub const fn b1(self) -> bool {
        self.row >= GROUP_OUTPUTS
    }
}
