//! Reading of per-segment solver model outputs: whitespace-delimited
//! columns, natural-log wavelength first, then one flux column per
//! disentangled component (two for the standard fd3 layout).

use crate::domain::{SplitError, SplitResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpectrum {
    pub path: PathBuf,
    /// Natural-log wavelength grid, ascending.
    pub log_wavelength: Vec<f64>,
    /// One vector per component column, each parallel to the grid.
    pub fluxes: Vec<Vec<f64>>,
}

impl SegmentSpectrum {
    pub fn len(&self) -> usize {
        self.log_wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_wavelength.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.fluxes.len()
    }
}

pub fn read_segment_spectrum(path: impl Into<PathBuf>) -> SplitResult<SegmentSpectrum> {
    let path = path.into();
    let content = fs::read_to_string(&path)
        .map_err(|source| SplitError::io("read segment spectrum", &path, source))?;
    parse_segment_spectrum(path, &content)
}

pub fn parse_segment_spectrum(
    path: impl Into<PathBuf>,
    content: &str,
) -> SplitResult<SegmentSpectrum> {
    let path = path.into();
    let mut log_wavelength = Vec::new();
    let mut fluxes: Vec<Vec<f64>> = Vec::new();
    let mut columns = 0usize;

    for (line_number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut values = Vec::with_capacity(columns.max(3));
        for token in trimmed.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| SplitError::FileFormat {
                path: path.clone(),
                line: line_number + 1,
                detail: format!("'{token}' is not a number"),
            })?;
            values.push(value);
        }

        if columns == 0 {
            if values.len() < 2 {
                return Err(SplitError::FileFormat {
                    path,
                    line: line_number + 1,
                    detail: format!(
                        "expected a wavelength and at least one flux column, found {} column(s)",
                        values.len()
                    ),
                });
            }
            columns = values.len();
            fluxes = vec![Vec::new(); columns - 1];
        } else if values.len() != columns {
            return Err(SplitError::FileFormat {
                path,
                line: line_number + 1,
                detail: format!("expected {columns} columns, found {}", values.len()),
            });
        }

        log_wavelength.push(values[0]);
        for (flux, value) in fluxes.iter_mut().zip(&values[1..]) {
            flux.push(*value);
        }
    }

    if log_wavelength.is_empty() {
        return Err(SplitError::FileFormat {
            path,
            line: 1,
            detail: "segment spectrum contains no samples".to_string(),
        });
    }

    Ok(SegmentSpectrum {
        path,
        log_wavelength,
        fluxes,
    })
}
