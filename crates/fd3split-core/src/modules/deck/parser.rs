//! Parsing of the fd3 template input deck. The deck is line oriented with
//! fixed-width double-space field separators: the header line carries the
//! natural-log wavelength bounds and the observation-data filename, the
//! second-to-last line carries the four output filenames, and everything
//! else is opaque solver configuration copied verbatim.

use crate::domain::{SplitError, SplitResult, WavelengthDomain};
use std::fs;
use std::path::{Path, PathBuf};

pub(super) const FIELD_SEPARATOR: &str = "  ";

pub(super) const HEADER_MIN_BOUND_FIELD: usize = 1;
pub(super) const HEADER_MAX_BOUND_FIELD: usize = 2;
pub(super) const HEADER_OBSERVATION_FIELD: usize = 3;

pub(super) const TRAILER_MODEL_FIELD: usize = 3;
pub(super) const TRAILER_RESIDUAL_FIELD: usize = 4;
pub(super) const TRAILER_RV_FIELD: usize = 5;
pub(super) const TRAILER_LOG_FIELD: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDeck {
    path: PathBuf,
    header: Vec<String>,
    /// Verbatim lines between the header and the trailer.
    middle: Vec<String>,
    trailer: Vec<String>,
    /// Verbatim final line after the trailer.
    footer: String,
}

impl TemplateDeck {
    pub fn parse(path: impl Into<PathBuf>) -> SplitResult<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .map_err(|source| SplitError::io("read template deck", &path, source))?;
        Self::parse_source(path, &content)
    }

    pub fn parse_source(path: impl Into<PathBuf>, content: &str) -> SplitResult<Self> {
        let path = path.into();
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() < 3 {
            return Err(SplitError::MissingTemplateField {
                path,
                detail: format!(
                    "expected at least 3 lines (header, trailer, final line), found {}",
                    lines.len()
                ),
            });
        }

        let header = split_fields(lines[0]);
        if header.len() <= HEADER_OBSERVATION_FIELD {
            return Err(SplitError::MissingTemplateField {
                path,
                detail: format!(
                    "header line has {} double-space fields, expected at least {}",
                    header.len(),
                    HEADER_OBSERVATION_FIELD + 1
                ),
            });
        }

        let trailer_index = lines.len() - 2;
        let trailer = split_fields(lines[trailer_index]);
        if trailer.len() <= TRAILER_LOG_FIELD {
            return Err(SplitError::MissingTemplateField {
                path,
                detail: format!(
                    "trailer line has {} double-space fields, expected at least {}",
                    trailer.len(),
                    TRAILER_LOG_FIELD + 1
                ),
            });
        }

        Ok(Self {
            middle: lines[1..trailer_index]
                .iter()
                .map(|line| (*line).to_string())
                .collect(),
            footer: lines[lines.len() - 1].to_string(),
            path,
            header,
            trailer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename stem the per-segment decks are named after.
    pub fn stem(&self) -> SplitResult<&str> {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| SplitError::MissingTemplateField {
                path: self.path.clone(),
                detail: "cannot derive a filename stem for segment decks".to_string(),
            })
    }

    pub fn log_min_field(&self) -> &str {
        &self.header[HEADER_MIN_BOUND_FIELD]
    }

    pub fn log_max_field(&self) -> &str {
        &self.header[HEADER_MAX_BOUND_FIELD]
    }

    pub fn log_min(&self) -> SplitResult<f64> {
        self.parse_bound(HEADER_MIN_BOUND_FIELD, "minimum")
    }

    pub fn log_max(&self) -> SplitResult<f64> {
        self.parse_bound(HEADER_MAX_BOUND_FIELD, "maximum")
    }

    /// Full spectrum extent in linear wavelength, derived from the deck's
    /// natural-log header bounds.
    pub fn linear_domain(&self) -> SplitResult<WavelengthDomain> {
        WavelengthDomain::from_log(self.log_min()?, self.log_max()?)
    }

    fn parse_bound(&self, field: usize, which: &str) -> SplitResult<f64> {
        let raw = self.header[field].trim();
        raw.parse().map_err(|_| SplitError::MissingTemplateField {
            path: self.path.clone(),
            detail: format!("header {which}-bound field '{raw}' is not a number"),
        })
    }

    pub(super) fn header_fields(&self) -> Vec<String> {
        self.header.clone()
    }

    pub(super) fn trailer_fields(&self) -> Vec<String> {
        self.trailer.clone()
    }

    /// Reassembles a deck from rewritten header/trailer fields; all other
    /// lines come back verbatim.
    pub(super) fn render(&self, header: &[String], trailer: &[String]) -> String {
        let mut out = String::new();
        out.push_str(&header.join(FIELD_SEPARATOR));
        out.push('\n');
        for line in &self.middle {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&trailer.join(FIELD_SEPARATOR));
        out.push('\n');
        out.push_str(&self.footer);
        out.push('\n');
        out
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(FIELD_SEPARATOR).map(str::to_string).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::TemplateDeck;

    pub(crate) const TEMPLATE: &str = "\
master.obs  8.29404964010203  8.824677891314612  master_used.obs  1  1  0
2  0.9  0.1
1.0  0.0
0  1  0  master.mod  master.res  master.rvs  master.log
100  1.0e-5
";

    #[test]
    fn parses_header_and_trailer_fields() {
        let deck = TemplateDeck::parse_source("master.in", TEMPLATE).unwrap();
        assert_eq!(deck.log_min_field(), "8.29404964010203");
        assert_eq!(deck.log_max_field(), "8.824677891314612");
        assert_eq!(deck.stem().unwrap(), "master");

        let domain = deck.linear_domain().unwrap();
        assert!((domain.min - 4000.0).abs() < 1e-6);
        assert!((domain.max - 6800.0).abs() < 1e-6);
    }

    #[test]
    fn short_header_is_a_missing_field_error() {
        let error = TemplateDeck::parse_source("bad.in", "a  b\nx\ny  z\nw\n").unwrap_err();
        assert!(error.to_string().contains("header line has 2"));
    }

    #[test]
    fn short_trailer_is_a_missing_field_error() {
        let source = "a  8.1  8.2  obs.obs\nbody\n0  1  2\nfooter\n";
        let error = TemplateDeck::parse_source("bad.in", source).unwrap_err();
        assert!(error.to_string().contains("trailer line has 3"));
    }

    #[test]
    fn non_numeric_bound_is_a_missing_field_error() {
        let source = "a  low  8.2  obs.obs\nbody\n0  1  2  m  r  v  l\nfooter\n";
        let deck = TemplateDeck::parse_source("bad.in", source).unwrap();
        assert!(deck.log_min().is_err());
    }

    #[test]
    fn too_few_lines_is_a_missing_field_error() {
        assert!(TemplateDeck::parse_source("bad.in", "only  one  line  here\n").is_err());
    }
}
