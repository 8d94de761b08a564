//! Segment planning: turns the domain bounds, a validated boundary list
//! and the overlap half-width into the ordered segment sequence. Each
//! internal boundary becomes an overlap region of width `2 * overlap`
//! centred on it; the outermost bounds stay the unmodified domain edges.

use crate::domain::{Segment, SegmentBound, SegmentPlan, SplitError, SplitResult, WavelengthDomain};

pub fn plan_segments(
    domain: WavelengthDomain,
    boundaries: &[f64],
    overlap: f64,
) -> SplitResult<SegmentPlan> {
    if !overlap.is_finite() || overlap < 0.0 {
        return Err(SplitError::InvalidBoundary(format!(
            "overlap width {overlap} must be finite and non-negative"
        )));
    }
    validate_boundaries(domain, boundaries, overlap)?;

    let count = boundaries.len() + 1;
    let segments = (0..count)
        .map(|k| Segment {
            index: k + 1,
            lower: if k == 0 {
                SegmentBound::DomainEdge
            } else {
                SegmentBound::Split(boundaries[k - 1] - overlap)
            },
            upper: if k == count - 1 {
                SegmentBound::DomainEdge
            } else {
                SegmentBound::Split(boundaries[k] + overlap)
            },
        })
        .collect();

    Ok(SegmentPlan {
        domain,
        overlap,
        segments,
    })
}

/// Rejects boundary lists the planner cannot turn into well-formed
/// segments: non-finite or unsorted values, values outside the open
/// domain interval, and boundaries whose overlap regions would collide
/// with each other or with a domain edge.
pub fn validate_boundaries(
    domain: WavelengthDomain,
    boundaries: &[f64],
    overlap: f64,
) -> SplitResult<()> {
    for value in boundaries {
        if !value.is_finite() {
            return Err(SplitError::InvalidBoundary(format!(
                "split point {value} is not finite"
            )));
        }
        if *value <= domain.min || *value >= domain.max {
            return Err(SplitError::InvalidBoundary(format!(
                "split point {value} lies outside the open domain ({}, {})",
                domain.min, domain.max
            )));
        }
        if *value - overlap <= domain.min || *value + overlap >= domain.max {
            return Err(SplitError::InvalidBoundary(format!(
                "split point {value} is closer than the overlap width {overlap} to a domain edge"
            )));
        }
    }

    for pair in boundaries.windows(2) {
        if pair[1] <= pair[0] {
            return Err(SplitError::InvalidBoundary(format!(
                "split points must be strictly increasing, got {} after {}",
                pair[1], pair[0]
            )));
        }
        if pair[1] - pair[0] < 2.0 * overlap {
            return Err(SplitError::InvalidBoundary(format!(
                "split points {} and {} are closer than twice the overlap width {overlap}; \
                 their overlap regions would collide",
                pair[0], pair[1]
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{plan_segments, validate_boundaries};
    use crate::domain::{SegmentBound, WavelengthDomain};

    fn domain(min: f64, max: f64) -> WavelengthDomain {
        WavelengthDomain::new(min, max).unwrap()
    }

    #[test]
    fn two_boundaries_yield_three_overlapping_segments() {
        let plan = plan_segments(domain(0.0, 100.0), &[30.0, 60.0], 5.0).unwrap();
        assert_eq!(plan.len(), 3);

        let bounds: Vec<(f64, f64)> = plan
            .segments
            .iter()
            .map(|s| (s.lower_linear(plan.domain), s.upper_linear(plan.domain)))
            .collect();
        assert_eq!(bounds, vec![(0.0, 35.0), (25.0, 65.0), (55.0, 100.0)]);

        assert_eq!(plan.segments[0].lower, SegmentBound::DomainEdge);
        assert_eq!(plan.segments[2].upper, SegmentBound::DomainEdge);
    }

    #[test]
    fn adjacent_segments_overlap_by_twice_the_width() {
        let plan = plan_segments(domain(4000.0, 6800.0), &[4500.0, 5200.0, 6000.0], 0.5).unwrap();
        assert_eq!(plan.len(), 4);
        for pair in plan.segments.windows(2) {
            let shared =
                pair[0].upper_linear(plan.domain) - pair[1].lower_linear(plan.domain);
            assert!((shared - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_boundary_list_spans_the_whole_domain() {
        let plan = plan_segments(domain(4000.0, 6800.0), &[], 0.5).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.segments[0].lower, SegmentBound::DomainEdge);
        assert_eq!(plan.segments[0].upper, SegmentBound::DomainEdge);
    }

    #[test]
    fn segment_count_tracks_boundary_count() {
        for n in 0..12 {
            let boundaries: Vec<f64> = (0..n).map(|i| 4100.0 + 200.0 * i as f64).collect();
            let plan = plan_segments(domain(4000.0, 6800.0), &boundaries, 0.5).unwrap();
            assert_eq!(plan.len(), n + 1);
        }
    }

    #[test]
    fn out_of_range_boundary_is_rejected() {
        let error = plan_segments(domain(4000.0, 6800.0), &[3999.0], 0.5).unwrap_err();
        assert!(error.to_string().contains("outside the open domain"));
        assert!(plan_segments(domain(4000.0, 6800.0), &[6800.0], 0.5).is_err());
    }

    #[test]
    fn unsorted_boundaries_are_rejected() {
        let error = validate_boundaries(domain(0.0, 100.0), &[60.0, 30.0], 1.0).unwrap_err();
        assert!(error.to_string().contains("strictly increasing"));
    }

    #[test]
    fn colliding_overlap_regions_are_rejected() {
        let error = validate_boundaries(domain(0.0, 100.0), &[50.0, 50.5], 1.0).unwrap_err();
        assert!(error.to_string().contains("overlap regions would collide"));

        let error = validate_boundaries(domain(0.0, 100.0), &[0.5], 1.0).unwrap_err();
        assert!(error.to_string().contains("domain edge"));
    }

    #[test]
    fn negative_overlap_is_rejected() {
        assert!(plan_segments(domain(0.0, 100.0), &[50.0], -1.0).is_err());
    }
}
