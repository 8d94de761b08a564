mod commands;

use clap::Parser;
use fd3split_core::SplitError;

pub fn run_from_env() -> i32 {
    init_tracing();
    match run(std::env::args().skip(1)) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("fd3split".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "fd3split",
    about = "Segment-wise driver for the fd3 spectral disentangling solver",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Plan segment windows from a template deck and a split list
    Plan(commands::PlanArgs),
    /// Emit one solver deck per planned segment
    Emit(commands::EmitArgs),
    /// Run the solver over previously emitted segment decks
    Run(commands::RunArgs),
    /// Stitch per-segment model outputs into component spectra
    Stitch(commands::StitchArgs),
    /// Plan, emit, run and stitch in one pass
    Pipeline(commands::PipelineArgs),
    /// Remove generated per-segment files
    Clean(commands::CleanArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Plan(args) => commands::run_plan_command(args),
        CliCommand::Emit(args) => commands::run_emit_command(args),
        CliCommand::Run(args) => commands::run_run_command(args),
        CliCommand::Stitch(args) => commands::run_stitch_command(args),
        CliCommand::Pipeline(args) => commands::run_pipeline_command(args),
        CliCommand::Clean(args) => commands::run_clean_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Split(#[from] SplitError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Split(error) => error.exit_code(),
            Self::Internal(_) => 5,
        }
    }
}
