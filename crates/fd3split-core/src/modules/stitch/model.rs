//! Numeric core of the stitch stage: continuum anchoring, overlap
//! detection on the shared log-wavelength grid, and the linear-ramp
//! weighted blend.

use super::parser::SegmentSpectrum;

/// Sample count over which each segment's continuum level is estimated.
pub const CONTINUUM_ANCHOR_SAMPLES: usize = 20;

/// Absolute tolerance for matching grid points of adjacent segments.
/// Adjacent solver outputs share the same log-wavelength grid in their
/// overlap, but the values pass through text formatting on the way.
pub const DEFAULT_GRID_TOLERANCE: f64 = 1e-9;

/// Shifts every flux column so its mean over the first
/// [`CONTINUUM_ANCHOR_SAMPLES`] samples sits at unity. Absolute flux
/// levels of independently disentangled segments are solver artifacts;
/// anchoring them to a common level keeps the blend from averaging two
/// different continua.
pub fn anchor_continuum(spectrum: &mut SegmentSpectrum) {
    for flux in &mut spectrum.fluxes {
        let count = flux.len().min(CONTINUUM_ANCHOR_SAMPLES);
        if count == 0 {
            continue;
        }
        let mean = flux[..count].iter().sum::<f64>() / count as f64;
        let offset = 1.0 - mean;
        for value in flux.iter_mut() {
            *value += offset;
        }
    }
}

/// Number of grid points shared by the end of `tail` and the start of
/// `head`, matched within `tolerance`. Returns 0 when the grids do not
/// line up over the whole candidate span.
pub fn overlap_length(tail: &[f64], head: &[f64], tolerance: f64) -> usize {
    let (Some(first_head), true) = (head.first(), !tail.is_empty()) else {
        return 0;
    };
    let Some(start) = tail
        .iter()
        .rposition(|w| (w - first_head).abs() <= tolerance)
    else {
        return 0;
    };
    let count = tail.len() - start;
    if count > head.len() {
        return 0;
    }
    let aligned = tail[start..]
        .iter()
        .zip(&head[..count])
        .all(|(a, b)| (a - b).abs() <= tolerance);
    if aligned { count } else { 0 }
}

/// Linear-ramp weighted average over one overlap. With `n` samples, the
/// tail's weight descends `n..1` while the head's ascends `1..n`, so each
/// segment dominates nearest its own interior and the weights always sum
/// to `n + 1`.
pub fn blend_overlap(tail: &[f64], head: &[f64]) -> Vec<f64> {
    debug_assert_eq!(tail.len(), head.len());
    let n = tail.len();
    (0..n)
        .map(|i| {
            let tail_weight = (n - i) as f64;
            let head_weight = (i + 1) as f64;
            (tail[i] * tail_weight + head[i] * head_weight) / (n as f64 + 1.0)
        })
        .collect()
}
