//! Reassembly of per-segment solver outputs into continuous component
//! spectra. Segments are consumed strictly in segment-index order
//! (filename sort), each overlap is blended with a linear ramp, and the
//! result is written back in linear wavelength.

mod model;
mod parser;

pub use model::{
    CONTINUUM_ANCHOR_SAMPLES, DEFAULT_GRID_TOLERANCE, anchor_continuum, blend_overlap,
    overlap_length,
};
pub use parser::{SegmentSpectrum, parse_segment_spectrum, read_segment_spectrum};

use crate::domain::names::{self, MODEL_EXTENSION};
use crate::domain::{SplitError, SplitResult};
use globset::Glob;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchOptions {
    /// Anchor each segment's continuum to unity before blending.
    pub anchor_continuum: bool,
    /// Absolute tolerance for matching adjacent segments' grid points.
    pub grid_tolerance: f64,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            anchor_continuum: true,
            grid_tolerance: DEFAULT_GRID_TOLERANCE,
        }
    }
}

/// One full-domain spectrum per disentangled component, on a strictly
/// increasing linear-wavelength grid with the overlap duplicates blended
/// away.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchedSpectrum {
    pub wavelength: Vec<f64>,
    pub components: Vec<Vec<f64>>,
}

impl StitchedSpectrum {
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }
}

/// Stitches the given model-output files, which must already be in
/// segment order (lexicographic filename order for generated names).
pub fn stitch_files(paths: &[PathBuf], options: &StitchOptions) -> SplitResult<StitchedSpectrum> {
    let mut spectra = Vec::with_capacity(paths.len());
    for path in paths {
        spectra.push(read_segment_spectrum(path)?);
    }
    stitch_segments(spectra, options)
}

pub fn stitch_segments(
    spectra: Vec<SegmentSpectrum>,
    options: &StitchOptions,
) -> SplitResult<StitchedSpectrum> {
    let mut spectra = spectra;
    let Some(first) = spectra.first() else {
        return Err(SplitError::NoSegmentOutputs);
    };
    let components = first.component_count();
    for spectrum in &spectra {
        if spectrum.component_count() != components {
            return Err(SplitError::FileFormat {
                path: spectrum.path.clone(),
                line: 1,
                detail: format!(
                    "has {} flux column(s) but the first segment has {components}",
                    spectrum.component_count()
                ),
            });
        }
    }

    if options.anchor_continuum {
        for spectrum in &mut spectra {
            anchor_continuum(spectrum);
        }
    }

    let mut log_wavelength = Vec::new();
    let mut fluxes: Vec<Vec<f64>> = vec![Vec::new(); components];

    let mut segments = spectra.into_iter();
    let Some(mut tail) = segments.next() else {
        return Err(SplitError::NoSegmentOutputs);
    };
    for mut head in segments {
        let n = overlap_length(
            &tail.log_wavelength,
            &head.log_wavelength,
            options.grid_tolerance,
        );
        if n == 0 {
            return Err(SplitError::OverlapMismatch {
                left: tail.path,
                right: head.path,
            });
        }
        tracing::debug!(
            left = %tail.path.display(),
            right = %head.path.display(),
            overlap = n,
            "blending segment overlap"
        );

        let start = tail.log_wavelength.len() - n;
        for (tail_flux, head_flux) in tail.fluxes.iter_mut().zip(&mut head.fluxes) {
            let blended = blend_overlap(&tail_flux[start..], &head_flux[..n]);
            tail_flux[start..].copy_from_slice(&blended);
            head_flux.drain(..n);
        }
        head.log_wavelength.drain(..n);

        log_wavelength.append(&mut tail.log_wavelength);
        for (out, flux) in fluxes.iter_mut().zip(&mut tail.fluxes) {
            out.append(flux);
        }
        tail = head;
    }
    log_wavelength.append(&mut tail.log_wavelength);
    for (out, flux) in fluxes.iter_mut().zip(&mut tail.fluxes) {
        out.append(flux);
    }

    debug_assert!(log_wavelength.windows(2).all(|pair| pair[0] < pair[1]));

    Ok(StitchedSpectrum {
        wavelength: log_wavelength.iter().map(|w| w.exp()).collect(),
        components: fluxes,
    })
}

/// Writes one two-column (linear wavelength, flux) file per component and
/// returns the paths, lettered in column order.
pub fn write_stitched(
    dir: &Path,
    base: &str,
    stitched: &StitchedSpectrum,
) -> SplitResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(stitched.components.len());
    for (column, flux) in stitched.components.iter().enumerate() {
        let path = dir.join(names::stitched_name(base, &names::component_label(column)));
        let mut text = String::with_capacity(stitched.len() * 32);
        for (wavelength, value) in stitched.wavelength.iter().zip(flux) {
            text.push_str(&format!("{wavelength:.10e}  {value:.10e}\n"));
        }
        fs::write(&path, text)
            .map_err(|source| SplitError::io("write stitched spectrum", &path, source))?;
        tracing::info!(path = %path.display(), samples = stitched.len(), "wrote stitched spectrum");
        written.push(path);
    }
    Ok(written)
}

/// Finds per-segment model outputs for `base` under `dir`, sorted by
/// filename so the result is in segment order.
pub fn discover_model_outputs(dir: &Path, base: &str) -> SplitResult<Vec<PathBuf>> {
    let pattern = format!("{}_*.{MODEL_EXTENSION}", globset::escape(base));
    let matcher = Glob::new(&pattern)
        .map_err(|error| SplitError::Internal(format!("bad model pattern '{pattern}': {error}")))?
        .compile_matcher();

    let entries =
        fs::read_dir(dir).map_err(|source| SplitError::io("list model outputs in", dir, source))?;

    let mut models = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SplitError::io("list model outputs in", dir, source))?;
        let path = entry.path();
        if path.is_file() && matcher.is_match(entry.file_name()) && has_numeric_tag(&path) {
            models.push(path);
        }
    }
    models.sort();
    Ok(models)
}

fn has_numeric_tag(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('_'))
        .is_some_and(|(_, tag)| !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::{
        SegmentSpectrum, StitchOptions, discover_model_outputs, stitch_segments, write_stitched,
    };
    use crate::domain::SplitError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn segment(name: &str, grid: &[f64], fluxes: &[&[f64]]) -> SegmentSpectrum {
        SegmentSpectrum {
            path: PathBuf::from(name),
            log_wavelength: grid.to_vec(),
            fluxes: fluxes.iter().map(|f| f.to_vec()).collect(),
        }
    }

    fn raw_options() -> StitchOptions {
        StitchOptions {
            anchor_continuum: false,
            ..StitchOptions::default()
        }
    }

    #[test]
    fn worked_two_segment_example_blends_with_the_linear_ramp() {
        let stitched = stitch_segments(
            vec![
                segment("s1.mod", &[0.0, 1.0, 2.0, 3.0], &[&[10.0, 10.0, 10.0, 10.0]]),
                segment("s2.mod", &[2.0, 3.0, 4.0], &[&[20.0, 20.0, 20.0]]),
            ],
            &raw_options(),
        )
        .unwrap();

        assert_eq!(stitched.len(), 5);
        let expected_wavelength: Vec<f64> = [0.0, 1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|w: &f64| w.exp())
            .collect();
        for (got, want) in stitched.wavelength.iter().zip(&expected_wavelength) {
            assert!((got - want).abs() < 1e-12);
        }

        let expected_flux = [10.0, 10.0, 40.0 / 3.0, 50.0 / 3.0, 20.0];
        for (got, want) in stitched.components[0].iter().zip(&expected_flux) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn identical_overlaps_stitch_without_distortion() {
        let stitched = stitch_segments(
            vec![
                segment("s1.mod", &[0.0, 1.0, 2.0], &[&[1.0, 2.0, 3.0]]),
                segment("s2.mod", &[1.0, 2.0, 3.0], &[&[2.0, 3.0, 4.0]]),
            ],
            &raw_options(),
        )
        .unwrap();
        assert_eq!(stitched.components[0], vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn both_components_are_blended_independently() {
        let stitched = stitch_segments(
            vec![
                segment(
                    "s1.mod",
                    &[0.0, 1.0],
                    &[&[10.0, 10.0], &[0.0, 0.0]],
                ),
                segment("s2.mod", &[1.0, 2.0], &[&[20.0, 20.0], &[4.0, 4.0]]),
            ],
            &raw_options(),
        )
        .unwrap();
        // n = 1: equal weights at the single shared sample.
        assert_eq!(stitched.components[0], vec![10.0, 15.0, 20.0]);
        assert_eq!(stitched.components[1], vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn disjoint_segments_are_an_overlap_mismatch() {
        let error = stitch_segments(
            vec![
                segment("s1.mod", &[0.0, 1.0], &[&[1.0, 1.0]]),
                segment("s2.mod", &[5.0, 6.0], &[&[1.0, 1.0]]),
            ],
            &raw_options(),
        )
        .unwrap_err();
        assert!(matches!(error, SplitError::OverlapMismatch { .. }));
    }

    #[test]
    fn component_count_mismatch_is_a_format_error() {
        let error = stitch_segments(
            vec![
                segment("s1.mod", &[0.0, 1.0], &[&[1.0, 1.0], &[2.0, 2.0]]),
                segment("s2.mod", &[1.0, 2.0], &[&[1.0, 1.0]]),
            ],
            &raw_options(),
        )
        .unwrap_err();
        assert!(matches!(error, SplitError::FileFormat { .. }));
    }

    #[test]
    fn no_segments_is_its_own_error() {
        assert!(matches!(
            stitch_segments(Vec::new(), &raw_options()),
            Err(SplitError::NoSegmentOutputs)
        ));
    }

    #[test]
    fn stitched_files_are_written_per_component() {
        let temp = TempDir::new().expect("tempdir should be created");
        let stitched = stitch_segments(
            vec![
                segment("s1.mod", &[0.0, 1.0], &[&[1.0, 1.0], &[2.0, 2.0]]),
                segment("s2.mod", &[1.0, 2.0], &[&[1.0, 1.0], &[2.0, 2.0]]),
            ],
            &raw_options(),
        )
        .unwrap();

        let written = write_stitched(temp.path(), "sig_aql", &stitched).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("sig_aql_A_stitched.txt"));
        assert!(written[1].ends_with("sig_aql_B_stitched.txt"));

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(text.lines().count(), 3);
        for line in text.lines() {
            assert_eq!(line.split_whitespace().count(), 2);
        }
    }

    #[test]
    fn discovery_finds_tagged_models_in_order() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in [
            "sig_aql_02.mod",
            "sig_aql_01.mod",
            "sig_aql_10.mod",
            "sig_aql_used_01.obs",
            "other_01.mod",
            "sig_aql_final.mod",
        ] {
            std::fs::write(temp.path().join(name), "8.1  1.0  1.0\n").unwrap();
        }

        let found = discover_model_outputs(temp.path(), "sig_aql").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["sig_aql_01.mod", "sig_aql_02.mod", "sig_aql_10.mod"]);
    }
}
