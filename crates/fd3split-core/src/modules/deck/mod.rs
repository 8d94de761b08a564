//! Emission of per-segment solver input decks from the template deck.
//! Only the header bounds, the observation filename and the trailer output
//! filenames change between segments; emission is deterministic, so
//! re-emitting from the same template and plan is byte-identical.

mod parser;

pub use parser::TemplateDeck;

use crate::domain::names::{self, DECK_EXTENSION};
use crate::domain::{Segment, SegmentBound, SegmentPlan, SplitError, SplitResult};
use globset::Glob;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DeckEmitter<'a> {
    template: &'a TemplateDeck,
    output_base: String,
}

impl<'a> DeckEmitter<'a> {
    /// `output_base` is the stem used for the segment-specific observation
    /// and output filenames written into each deck.
    pub fn new(template: &'a TemplateDeck, output_base: impl Into<String>) -> Self {
        Self {
            template,
            output_base: output_base.into(),
        }
    }

    pub fn render_segment(&self, plan: &SegmentPlan, segment: &Segment) -> String {
        let tag = plan.tag(segment.index);

        let mut header = self.template.header_fields();
        header[parser::HEADER_MIN_BOUND_FIELD] = match segment.lower {
            // Domain edges re-use the template's field text byte for byte.
            SegmentBound::DomainEdge => self.template.log_min_field().to_string(),
            SegmentBound::Split(w) => w.ln().to_string(),
        };
        header[parser::HEADER_MAX_BOUND_FIELD] = match segment.upper {
            SegmentBound::DomainEdge => self.template.log_max_field().to_string(),
            SegmentBound::Split(w) => w.ln().to_string(),
        };
        header[parser::HEADER_OBSERVATION_FIELD] =
            names::observation_name(&self.output_base, &tag);

        let mut trailer = self.template.trailer_fields();
        trailer[parser::TRAILER_MODEL_FIELD] = names::model_name(&self.output_base, &tag);
        trailer[parser::TRAILER_RESIDUAL_FIELD] = names::residual_name(&self.output_base, &tag);
        trailer[parser::TRAILER_RV_FIELD] = names::rv_name(&self.output_base, &tag);
        trailer[parser::TRAILER_LOG_FIELD] = names::log_name(&self.output_base, &tag);

        self.template.render(&header, &trailer)
    }

    pub fn emit_segment(
        &self,
        dir: &Path,
        plan: &SegmentPlan,
        segment: &Segment,
    ) -> SplitResult<PathBuf> {
        let tag = plan.tag(segment.index);
        let path = dir.join(names::deck_file_name(self.template.stem()?, &tag));
        fs::write(&path, self.render_segment(plan, segment))
            .map_err(|source| SplitError::io("write segment deck", &path, source))?;
        tracing::debug!(deck = %path.display(), segment = segment.index, "emitted segment deck");
        Ok(path)
    }

    /// Emits one deck per planned segment and returns their paths in
    /// segment order.
    pub fn emit_all(&self, dir: &Path, plan: &SegmentPlan) -> SplitResult<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(plan.len());
        for segment in &plan.segments {
            paths.push(self.emit_segment(dir, plan, segment)?);
        }
        tracing::info!(
            count = paths.len(),
            dir = %dir.display(),
            "emitted segment decks"
        );
        Ok(paths)
    }
}

/// Finds previously emitted segment decks under `dir`, sorted by filename
/// so the result is in segment (and therefore wavelength) order.
pub fn discover_segment_decks(dir: &Path, stem: Option<&str>) -> SplitResult<Vec<PathBuf>> {
    let pattern = match stem {
        Some(stem) => format!("{}_split_*.{DECK_EXTENSION}", globset::escape(stem)),
        None => format!("*_split_*.{DECK_EXTENSION}"),
    };
    let matcher = Glob::new(&pattern)
        .map_err(|error| SplitError::Internal(format!("bad deck pattern '{pattern}': {error}")))?
        .compile_matcher();

    let entries = fs::read_dir(dir)
        .map_err(|source| SplitError::io("list segment decks in", dir, source))?;

    let mut decks = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SplitError::io("list segment decks in", dir, source))?;
        let path = entry.path();
        if path.is_file()
            && matcher.is_match(entry.file_name())
            && names::segment_tag_of(&path).is_some()
        {
            decks.push(path);
        }
    }
    decks.sort();
    Ok(decks)
}
