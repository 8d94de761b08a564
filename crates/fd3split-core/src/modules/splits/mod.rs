//! Boundary (split-point) sources. The interactive point picker lives
//! outside this crate; the pipeline only ever consumes a finalized list of
//! split wavelengths, sorted ascending.

use crate::domain::{SplitError, SplitResult};
use std::fs;
use std::path::{Path, PathBuf};

pub trait BoundarySource {
    /// Produces the split wavelengths in ascending order, in linear
    /// wavelength units. May be empty, in which case the planner emits a
    /// single segment spanning the whole domain.
    fn boundaries(&self) -> SplitResult<Vec<f64>>;
}

/// Plain-text split list: one floating-point wavelength per line. Blank
/// lines are ignored; values are sorted ascending on load.
#[derive(Debug, Clone)]
pub struct BoundaryFile {
    path: PathBuf,
}

impl BoundaryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists a boundary list in the same one-value-per-line layout the
    /// loader reads back.
    pub fn save(&self, boundaries: &[f64]) -> SplitResult<()> {
        let mut sorted = boundaries.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mut text = String::new();
        for value in &sorted {
            text.push_str(&format!("{value}\n"));
        }
        fs::write(&self.path, text)
            .map_err(|source| SplitError::io("write split list", &self.path, source))
    }
}

impl BoundarySource for BoundaryFile {
    fn boundaries(&self) -> SplitResult<Vec<f64>> {
        let content = fs::read_to_string(&self.path)
            .map_err(|source| SplitError::io("read split list", &self.path, source))?;

        let mut values = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: f64 = trimmed.parse().map_err(|_| {
                SplitError::InvalidBoundary(format!(
                    "'{}' line {}: '{}' is not a wavelength",
                    self.path.display(),
                    line_number + 1,
                    trimmed
                ))
            })?;
            values.push(value);
        }

        values.sort_by(|a, b| a.total_cmp(b));
        Ok(values)
    }
}

/// In-memory boundary list, used by the CLI's `--split` flags and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedBoundaries(Vec<f64>);

impl FixedBoundaries {
    pub fn new(mut boundaries: Vec<f64>) -> Self {
        boundaries.sort_by(|a, b| a.total_cmp(b));
        Self(boundaries)
    }
}

impl BoundarySource for FixedBoundaries {
    fn boundaries(&self) -> SplitResult<Vec<f64>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundaryFile, BoundarySource, FixedBoundaries};
    use tempfile::TempDir;

    #[test]
    fn list_file_loads_sorted_and_skips_blank_lines() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("splits.txt");
        std::fs::write(&path, "5200.5\n\n4410.0\n6100.25\n").unwrap();

        let loaded = BoundaryFile::new(&path).boundaries().unwrap();
        assert_eq!(loaded, vec![4410.0, 5200.5, 6100.25]);
    }

    #[test]
    fn list_file_reports_the_offending_line() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("splits.txt");
        std::fs::write(&path, "4410.0\nnot-a-number\n").unwrap();

        let error = BoundaryFile::new(&path).boundaries().unwrap_err();
        assert!(error.to_string().contains("line 2"));
    }

    #[test]
    fn save_round_trips_through_the_loader() {
        let temp = TempDir::new().expect("tempdir should be created");
        let file = BoundaryFile::new(temp.path().join("splits.txt"));
        file.save(&[6100.25, 4410.0]).unwrap();

        assert_eq!(file.boundaries().unwrap(), vec![4410.0, 6100.25]);
    }

    #[test]
    fn fixed_boundaries_are_sorted_on_construction() {
        let source = FixedBoundaries::new(vec![30.0, 10.0, 20.0]);
        assert_eq!(source.boundaries().unwrap(), vec![10.0, 20.0, 30.0]);
    }
}
