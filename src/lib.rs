#![cfg_attr(not(test), no_std)]

//! FP317 flip-dot display driver.
//!
//! An FP317 tile is a 28x14 matrix of bistable magnetic dots behind two
//! FP2800A driver chips, one selecting columns and one selecting rows.
//! Tiles chain into a rectangular grid that shares a single address/data
//! bus; each tile keeps its own pair of enable lines, and that pair is the
//! only thing that decides which tile's dot flips.
//!
//! This crate ties the hardware-independent refresh engine
//! ([`fp317_core`]) to the FP2800A bus driver ([`fp2800a`]). Board code
//! supplies a tile table, the eleven shared pins, and one enable pair per
//! table row; [`display::Display`] validates the topology, parks every
//! line, and then refreshes the panel by flipping only dots whose desired
//! state differs from what was last committed.
//!
//! Pin numbering, image content, and scheduling stay outside: any
//! `embedded-hal` `OutputPin`/`DelayNs` provider works, and the desired
//! frame is plain bits (or an `embedded-graphics` draw target behind the
//! `embedded-graphics` feature).

pub mod display;

pub use display::{Display, DriveError, SetupError};
pub use fp2800a::{ColumnLines, EnablePair, RowLines, SharedBus, Timing};
pub use fp317_core::{
    config::{MAX_TILES, Polarity, TILE_HEIGHT, TILE_WIDTH, TileConfig},
    frame::Frame,
    render::{DotFault, Panel, RenderProgress, RenderReport},
    topology::ConfigError,
};
