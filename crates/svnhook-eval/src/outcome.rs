/// Exit code reported when evaluation fails for reasons the rule document
/// did not ask for (bad configuration, failed repository query, ...).
pub const INTERNAL_ERROR_CODE: i32 = 255;

/// Text shown to the Subversion client on an internal error. Details only go
/// to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal hook error. Please notify administrator.";

/// The result of evaluating one rule node.
///
/// Returned by [`Executor::execute`](crate::Executor::execute). An ordinary
/// exit code and an internal failure are kept apart so a configured exit code
/// can never be confused with a broken configuration.
#[derive(Debug)]
pub enum Outcome {
    /// Evaluation finished with this code; `0` means "continue".
    Code(i32),
    /// Evaluation was aborted by an unrecoverable error.
    Internal(anyhow::Error),
}

impl Outcome {
    pub fn ok() -> Self {
        Outcome::Code(0)
    }

    /// Returns `true` if sibling and ancestor evaluation must stop.
    pub fn should_stop(&self) -> bool {
        !matches!(self, Outcome::Code(0))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Outcome::Internal(_))
    }

    /// The process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Code(code) => *code,
            Outcome::Internal(_) => INTERNAL_ERROR_CODE,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Outcome::Internal(err) => Some(err),
            Outcome::Code(_) => None,
        }
    }
}

impl From<anyhow::Error> for Outcome {
    fn from(err: anyhow::Error) -> Self {
        Outcome::Internal(err)
    }
}
