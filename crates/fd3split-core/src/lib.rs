//! Core pipeline for segmented spectral disentangling with the external
//! `fd3` solver: plan overlapping wavelength segments, emit one solver
//! input deck per segment, drive the solver concurrently, and stitch the
//! per-segment outputs back into continuous component spectra.
//!
//! The binary crate (`fd3split-cli`) is a thin wrapper; everything here is
//! testable without a terminal or a real solver.

pub mod domain;
pub mod modules;

pub use domain::{SplitError, SplitResult};
