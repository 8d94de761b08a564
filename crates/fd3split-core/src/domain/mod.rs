pub mod errors;
pub mod names;

pub use errors::{SolverFailure, SplitError, SplitResult};

/// Extent of the full spectrum in linear wavelength units (Å).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthDomain {
    pub min: f64,
    pub max: f64,
}

impl WavelengthDomain {
    pub fn new(min: f64, max: f64) -> SplitResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(SplitError::InvalidBoundary(format!(
                "domain bounds [{min}, {max}] must be finite"
            )));
        }
        if min >= max {
            return Err(SplitError::InvalidBoundary(format!(
                "domain minimum {min} must lie below domain maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Builds the linear domain from natural-log bounds, the units the
    /// solver's input deck carries natively.
    pub fn from_log(log_min: f64, log_max: f64) -> SplitResult<Self> {
        Self::new(log_min.exp(), log_max.exp())
    }
}

/// One side of a segment's wavelength window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentBound {
    /// The unmodified edge of the full domain; emitted verbatim from the
    /// template deck so edge segments reproduce its exact bound text.
    DomainEdge,
    /// A split point shifted outward by the overlap width, in linear
    /// wavelength. Transformed to natural log at emission time.
    Split(f64),
}

/// One wavelength sub-window submitted to the solver independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// 1-based position, left to right in wavelength.
    pub index: usize,
    pub lower: SegmentBound,
    pub upper: SegmentBound,
}

impl Segment {
    pub fn lower_linear(&self, domain: WavelengthDomain) -> f64 {
        match self.lower {
            SegmentBound::DomainEdge => domain.min,
            SegmentBound::Split(w) => w,
        }
    }

    pub fn upper_linear(&self, domain: WavelengthDomain) -> f64 {
        match self.upper {
            SegmentBound::DomainEdge => domain.max,
            SegmentBound::Split(w) => w,
        }
    }
}

/// The ordered segment list covering the full domain without gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub domain: WavelengthDomain,
    pub overlap: f64,
    pub segments: Vec<Segment>,
}

impl SegmentPlan {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Zero-padding width for segment tags, derived from the segment count
    /// so lexicographic filename order equals wavelength order.
    pub fn tag_width(&self) -> usize {
        decimal_width(self.segments.len())
    }

    pub fn tag(&self, index: usize) -> String {
        names::segment_tag(index, self.tag_width())
    }
}

pub(crate) fn decimal_width(value: usize) -> usize {
    value.max(1).to_string().len()
}
