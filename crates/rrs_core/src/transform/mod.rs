//! Geodetic/temporal transformer for placefile artifacts.
//!
//! Rewrites timestamps and coordinates embedded in line-oriented
//! placefile text. The canonical source file is never mutated; each run
//! fully regenerates a distinctly named derived file.

pub mod geodesy;
pub mod timecodes;

mod shifter;

pub use shifter::{
    shift_line, shift_lines, shift_placefiles, shifted_path, ShiftSpec,
};
