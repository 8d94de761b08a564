//! Naming scheme for generated artifacts. Segment tags are zero-padded so
//! a lexicographic sort of filenames reproduces wavelength order, which the
//! stitch stage depends on.

use std::path::{Path, PathBuf};

pub const DECK_EXTENSION: &str = "in";
pub const SOLVER_OUTPUT_EXTENSION: &str = "out";
pub const MODEL_EXTENSION: &str = "mod";

pub fn segment_tag(index: usize, width: usize) -> String {
    format!("{index:0width$}")
}

/// Per-segment solver input deck, next to the template.
pub fn deck_file_name(template_stem: &str, tag: &str) -> String {
    format!("{template_stem}_split_{tag}.{DECK_EXTENSION}")
}

/// Captured solver stdout for one deck: same stem, `.out` extension.
pub fn solver_output_path(deck: &Path) -> PathBuf {
    deck.with_extension(SOLVER_OUTPUT_EXTENSION)
}

/// Observation-data filename written into a segment deck's header.
pub fn observation_name(base: &str, tag: &str) -> String {
    format!("{base}_used_{tag}.obs")
}

pub fn model_name(base: &str, tag: &str) -> String {
    format!("{base}_{tag}.{MODEL_EXTENSION}")
}

pub fn residual_name(base: &str, tag: &str) -> String {
    format!("{base}_{tag}.res")
}

pub fn rv_name(base: &str, tag: &str) -> String {
    format!("{base}_{tag}.rvs")
}

pub fn log_name(base: &str, tag: &str) -> String {
    format!("{base}_{tag}.log")
}

/// Final stitched spectrum file for one disentangled component.
pub fn stitched_name(base: &str, component: &str) -> String {
    format!("{base}_{component}_stitched.txt")
}

/// Disentangled components are lettered A, B, ... in column order.
pub fn component_label(column: usize) -> String {
    let letter = b'A' + (column % 26) as u8;
    let mut label = String::new();
    for _ in 0..(column / 26 + 1) {
        label.push(letter as char);
    }
    label
}

/// Extracts the segment tag from a generated deck filename, if it follows
/// the `<stem>_split_<tag>.in` pattern.
pub fn segment_tag_of(deck: &Path) -> Option<String> {
    let stem = deck.file_stem()?.to_str()?;
    let (_, tag) = stem.rsplit_once("_split_")?;
    (!tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit())).then(|| tag.to_string())
}
