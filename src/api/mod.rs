//! Purpose: Define the stable public Rust API boundary for plotpipe.
//! Exports: Core types and operations needed by the CLI and embedders.
//! Role: Public, additive-only surface; one import path for the whole
//! binding.
//! Invariants: This module is the only public path callers should need.
//! Invariants: Everything here builds text or drives the engine process;
//! nothing renders.

mod figure;
mod registry;
mod session;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::command::{
    PlotElement, PlotSource, PlotStyle, define_block, plot_command, quote, validate_block_name,
};
pub use crate::core::datablock::{DataInput, Grid, Value, column, render};
pub use crate::core::hist::{BinRule, Histogram1D, Histogram2D, hist1d, hist2d};
pub use crate::core::palette::{linetype_names, linetypes, palette, palette_names};
pub use figure::{Figure, Multiplot};
pub use registry::{Registry, validate_session_name};
pub use session::{PROGRAM_ENV, Session, SessionExit, SessionOptions};
