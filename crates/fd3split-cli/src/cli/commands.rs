use super::CliError;
use anyhow::Context;
use fd3split_core::domain::SegmentPlan;
use fd3split_core::modules::deck::{DeckEmitter, TemplateDeck, discover_segment_decks};
use fd3split_core::modules::plan::plan_segments;
use fd3split_core::modules::solver::{
    CancelToken, RunReport, SolverRunner, TaskOutcome, TaskStatus, clear_previous_outputs,
    tasks_for_decks,
};
use fd3split_core::modules::splits::{BoundaryFile, BoundarySource, FixedBoundaries};
use fd3split_core::modules::stitch::{
    DEFAULT_GRID_TOLERANCE, StitchOptions, discover_model_outputs, stitch_files, write_stitched,
};
use globset::{Glob, GlobSetBuilder};
use std::fs;
use std::path::PathBuf;

/// Split-point selection shared by every planning command.
#[derive(clap::Args)]
pub(super) struct SplitFlags {
    /// Split list file, one wavelength (Å) per line
    #[arg(long, value_name = "FILE", conflicts_with = "split")]
    splits: Option<PathBuf>,

    /// Split wavelength in Å; repeat for several split points
    #[arg(long = "split", value_name = "WAVELENGTH")]
    split: Vec<f64>,

    /// Half-width in Å added to each side of a split point
    #[arg(long, default_value_t = 0.5, value_name = "WIDTH")]
    overlap: f64,
}

impl SplitFlags {
    fn boundaries(&self) -> Result<Vec<f64>, CliError> {
        let boundaries = match &self.splits {
            Some(path) => BoundaryFile::new(path).boundaries()?,
            None => FixedBoundaries::new(self.split.clone()).boundaries()?,
        };
        Ok(boundaries)
    }
}

#[derive(clap::Args)]
pub(super) struct PlanArgs {
    /// Template solver deck
    template: PathBuf,

    #[command(flatten)]
    splits: SplitFlags,

    /// Write the accepted split list to this file
    #[arg(long, value_name = "FILE")]
    save_splits: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct EmitArgs {
    /// Template solver deck
    template: PathBuf,

    #[command(flatten)]
    splits: SplitFlags,

    /// Directory the segment decks are written into
    #[arg(long, default_value = ".", value_name = "DIR")]
    dir: PathBuf,

    /// Stem for per-segment observation and output filenames; defaults to
    /// the template's filename stem
    #[arg(long, value_name = "STEM")]
    base: Option<String>,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Directory holding previously emitted segment decks
    #[arg(long, default_value = ".", value_name = "DIR")]
    dir: PathBuf,

    /// Deck filename stem to select; all tagged decks when omitted
    #[arg(long, value_name = "STEM")]
    stem: Option<String>,

    /// Solver executable
    #[arg(long, default_value = "./fd3", value_name = "PATH")]
    solver: PathBuf,

    /// Concurrent solver processes; defaults to the host parallelism
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct StitchArgs {
    /// Directory holding per-segment model outputs
    #[arg(long, default_value = ".", value_name = "DIR")]
    dir: PathBuf,

    /// Model output filename stem
    #[arg(long, value_name = "STEM")]
    base: String,

    /// Skip the continuum anchoring step
    #[arg(long)]
    no_anchor: bool,

    /// Grid matching tolerance in natural-log wavelength
    #[arg(long, default_value_t = DEFAULT_GRID_TOLERANCE, value_name = "TOL")]
    tolerance: f64,
}

#[derive(clap::Args)]
pub(super) struct PipelineArgs {
    /// Template solver deck
    template: PathBuf,

    #[command(flatten)]
    splits: SplitFlags,

    /// Working directory for decks and solver outputs
    #[arg(long, default_value = ".", value_name = "DIR")]
    dir: PathBuf,

    /// Stem for per-segment observation and output filenames; defaults to
    /// the template's filename stem
    #[arg(long, value_name = "STEM")]
    base: Option<String>,

    /// Solver executable
    #[arg(long, default_value = "./fd3", value_name = "PATH")]
    solver: PathBuf,

    /// Concurrent solver processes; defaults to the host parallelism
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Skip the continuum anchoring step
    #[arg(long)]
    no_anchor: bool,

    /// Grid matching tolerance in natural-log wavelength
    #[arg(long, default_value_t = DEFAULT_GRID_TOLERANCE, value_name = "TOL")]
    tolerance: f64,
}

#[derive(clap::Args)]
pub(super) struct CleanArgs {
    /// Directory to clean
    #[arg(long, default_value = ".", value_name = "DIR")]
    dir: PathBuf,

    /// List matching files without deleting them
    #[arg(long)]
    dry_run: bool,
}

pub(super) fn run_plan_command(args: PlanArgs) -> Result<i32, CliError> {
    let template = TemplateDeck::parse(&args.template)?;
    let domain = template.linear_domain()?;
    let boundaries = args.splits.boundaries()?;
    let plan = plan_segments(domain, &boundaries, args.splits.overlap)?;

    println!(
        "domain [{:.3}, {:.3}] Å, overlap {} Å, {} segment(s)",
        domain.min,
        domain.max,
        plan.overlap,
        plan.len()
    );
    for segment in &plan.segments {
        println!(
            "  {}  [{:>12.3}, {:>12.3}]",
            plan.tag(segment.index),
            segment.lower_linear(domain),
            segment.upper_linear(domain)
        );
    }

    if let Some(path) = &args.save_splits {
        BoundaryFile::new(path).save(&boundaries)?;
        println!("split list saved to {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_emit_command(args: EmitArgs) -> Result<i32, CliError> {
    let template = TemplateDeck::parse(&args.template)?;
    let base = resolve_base(args.base, &template)?;
    let (plan, decks) = emit_decks(&template, &base, &args.splits, &args.dir)?;

    for deck in &decks {
        println!("  {}", deck.display());
    }
    println!("emitted {} segment deck(s) ({} planned)", decks.len(), plan.len());
    Ok(0)
}

pub(super) fn run_run_command(args: RunArgs) -> Result<i32, CliError> {
    let decks = discover_segment_decks(&args.dir, args.stem.as_deref())?;
    if decks.is_empty() {
        return Err(CliError::Usage(format!(
            "no segment decks found under '{}'",
            args.dir.display()
        )));
    }
    let report = run_solver(&decks, &args.solver, args.jobs)?;
    finish_run(&report, args.report.as_deref())?;
    Ok(0)
}

pub(super) fn run_stitch_command(args: StitchArgs) -> Result<i32, CliError> {
    let options = StitchOptions {
        anchor_continuum: !args.no_anchor,
        grid_tolerance: args.tolerance,
    };
    stitch_and_write(&args.dir, &args.base, &options)?;
    Ok(0)
}

pub(super) fn run_pipeline_command(args: PipelineArgs) -> Result<i32, CliError> {
    let template = TemplateDeck::parse(&args.template)?;
    let base = resolve_base(args.base, &template)?;
    let (_, decks) = emit_decks(&template, &base, &args.splits, &args.dir)?;
    println!("emitted {} segment deck(s)", decks.len());

    let report = run_solver(&decks, &args.solver, args.jobs)?;
    finish_run(&report, args.report.as_deref())?;

    let options = StitchOptions {
        anchor_continuum: !args.no_anchor,
        grid_tolerance: args.tolerance,
    };
    stitch_and_write(&args.dir, &base, &options)?;
    Ok(0)
}

/// Filename patterns the emit and run stages generate.
const CLEAN_PATTERNS: &[&str] = &["*_used_*.obs", "*_split_*.in", "*_split_*.out"];

pub(super) fn run_clean_command(args: CleanArgs) -> Result<i32, CliError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in CLEAN_PATTERNS {
        let glob = Glob::new(pattern)
            .with_context(|| format!("bad clean pattern '{pattern}'"))?;
        builder.add(glob);
    }
    let matcher = builder.build().context("compile clean patterns")?;

    let entries = fs::read_dir(&args.dir).map_err(|source| {
        fd3split_core::SplitError::io("list directory", &args.dir, source)
    })?;

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry.map_err(|source| {
            fd3split_core::SplitError::io("list directory", &args.dir, source)
        })?;
        let path = entry.path();
        if !path.is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }
        if args.dry_run {
            println!("would remove {}", path.display());
        } else {
            fs::remove_file(&path).map_err(|source| {
                fd3split_core::SplitError::io("remove generated file", &path, source)
            })?;
            println!("removed {}", path.display());
        }
        removed += 1;
    }
    println!(
        "{} {} file(s)",
        if args.dry_run { "matched" } else { "removed" },
        removed
    );
    Ok(0)
}

fn resolve_base(base: Option<String>, template: &TemplateDeck) -> Result<String, CliError> {
    match base {
        Some(base) => Ok(base),
        None => Ok(template.stem()?.to_string()),
    }
}

fn emit_decks(
    template: &TemplateDeck,
    base: &str,
    splits: &SplitFlags,
    dir: &std::path::Path,
) -> Result<(SegmentPlan, Vec<PathBuf>), CliError> {
    let domain = template.linear_domain()?;
    let boundaries = splits.boundaries()?;
    let plan = plan_segments(domain, &boundaries, splits.overlap)?;
    let decks = DeckEmitter::new(template, base).emit_all(dir, &plan)?;
    Ok((plan, decks))
}

fn run_solver(
    decks: &[PathBuf],
    solver: &std::path::Path,
    jobs: Option<usize>,
) -> Result<RunReport, CliError> {
    let runner = SolverRunner::new(solver).with_jobs(jobs);
    // Probe the executable first; a run that cannot start must not
    // clobber the captures of an earlier successful one.
    runner.resolve_executable()?;

    let tasks = tasks_for_decks(decks);
    clear_previous_outputs(&tasks)?;
    let report = runner
        .run(&tasks, &CancelToken::new(), |outcome, done, total| {
            println!("[{done}/{total}] segment {} {}", outcome.tag, describe(outcome));
        })?;
    Ok(report)
}

fn finish_run(report: &RunReport, report_path: Option<&std::path::Path>) -> Result<(), CliError> {
    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(report).context("serialize run report")?;
        fs::write(path, json)
            .map_err(|source| fd3split_core::SplitError::io("write run report", path, source))?;
        println!("JSON report: {}", path.display());
    }
    println!(
        "completed {} of {} solver invocation(s) ({} failed, {} skipped)",
        report.completed, report.total, report.failed, report.skipped
    );
    report.check()?;
    Ok(())
}

fn stitch_and_write(
    dir: &std::path::Path,
    base: &str,
    options: &StitchOptions,
) -> Result<(), CliError> {
    let models = discover_model_outputs(dir, base)?;
    let stitched = stitch_files(&models, options)?;
    let written = write_stitched(dir, base, &stitched)?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!(
        "stitched {} segment(s) into {} component spectrum(s), {} samples",
        models.len(),
        written.len(),
        stitched.len()
    );
    Ok(())
}

fn describe(outcome: &TaskOutcome) -> String {
    match &outcome.status {
        TaskStatus::Completed => "completed".to_string(),
        TaskStatus::Failed { status, .. } => format!("failed ({status})"),
        TaskStatus::Skipped => "skipped".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::SplitFlags;
    use fd3split_core::domain::WavelengthDomain;
    use fd3split_core::modules::plan::plan_segments;

    fn flags(split: Vec<f64>, overlap: f64) -> SplitFlags {
        SplitFlags {
            splits: None,
            split,
            overlap,
        }
    }

    #[test]
    fn inline_splits_are_sorted_before_planning() {
        let boundaries = flags(vec![6100.0, 4700.0], 0.5).boundaries().unwrap();
        assert_eq!(boundaries, vec![4700.0, 6100.0]);

        let domain = WavelengthDomain::new(4000.0, 6800.0).unwrap();
        let plan = plan_segments(domain, &boundaries, 0.5).unwrap();
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn no_splits_plans_a_single_segment() {
        let boundaries = flags(Vec::new(), 0.5).boundaries().unwrap();
        let domain = WavelengthDomain::new(4000.0, 6800.0).unwrap();
        let plan = plan_segments(domain, &boundaries, 0.5).unwrap();
        assert_eq!(plan.len(), 1);
    }
}
