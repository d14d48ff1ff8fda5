use std::process::ExitCode;

/// Exit status for CLI commands.
///
/// - `Success` (0): every query compiled and no unsupported tag was found
/// - `Failure` (1): the command ran but reported query problems
/// - `Error` (2): the command could not run (config, schema or I/O error)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl ExitStatus {
    /// `Failure` when any problem was reported, `Success` otherwise.
    pub fn from_problem_count(count: usize) -> Self {
        if count == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
