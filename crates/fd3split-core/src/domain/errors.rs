use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type SplitResult<T> = Result<T, SplitError>;

/// One solver invocation that did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverFailure {
    pub tag: String,
    pub deck: PathBuf,
    pub status: String,
    pub stderr: String,
}

impl Display for SolverFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "segment {}: solver invocation for '{}' failed with {}",
            self.tag,
            self.deck.display(),
            self.status
        )?;
        if !self.stderr.is_empty() {
            write!(f, ": {}", self.stderr)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("invalid boundary list: {0}")]
    InvalidBoundary(String),

    #[error("template deck '{}': {detail}", .path.display())]
    MissingTemplateField { path: PathBuf, detail: String },

    #[error("solver executable '{}' was not found", .0.display())]
    SolverNotFound(PathBuf),

    #[error("{} of {} solver invocations failed", .failures.len(), .total)]
    SolverBatch {
        total: usize,
        failures: Vec<SolverFailure>,
    },

    #[error(
        "segment outputs '{}' and '{}' share no overlapping wavelength samples",
        .left.display(),
        .right.display()
    )]
    OverlapMismatch { left: PathBuf, right: PathBuf },

    #[error("spectrum file '{}' line {line}: {detail}", .path.display())]
    FileFormat {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    #[error("no segment spectra to stitch")]
    NoSegmentOutputs,

    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SplitError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Stable process exit code per error class: input problems 2,
    /// io/system 3, solver or stitch failures 4.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidBoundary(_)
            | Self::MissingTemplateField { .. }
            | Self::FileFormat { .. }
            | Self::NoSegmentOutputs => 2,
            Self::SolverNotFound(_) | Self::Io { .. } => 3,
            Self::SolverBatch { .. } | Self::OverlapMismatch { .. } => 4,
            Self::Internal(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SolverFailure, SplitError};
    use std::path::PathBuf;

    #[test]
    fn exit_codes_are_stable_per_class() {
        assert_eq!(
            SplitError::InvalidBoundary("x".into()).exit_code(),
            2
        );
        assert_eq!(
            SplitError::SolverNotFound(PathBuf::from("./fd3")).exit_code(),
            3
        );
        assert_eq!(
            SplitError::SolverBatch {
                total: 3,
                failures: Vec::new()
            }
            .exit_code(),
            4
        );
    }

    #[test]
    fn solver_failure_rendering_includes_stderr_when_present() {
        let failure = SolverFailure {
            tag: "02".into(),
            deck: PathBuf::from("obs_split_02.in"),
            status: "exit code 3".into(),
            stderr: "singular matrix".into(),
        };
        let text = failure.to_string();
        assert!(text.contains("segment 02"));
        assert!(text.contains("exit code 3"));
        assert!(text.contains("singular matrix"));

        let quiet = SolverFailure {
            stderr: String::new(),
            ..failure
        };
        assert!(!quiet.to_string().ends_with(": "));
    }
}
