use std::fmt;

/// Failures raised by the repository layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactError {
    /// The fact cannot be supplied for the event's subject
    /// (e.g. the revision log during a pending transaction).
    Unavailable { fact: &'static str },
    /// An external query exited non-zero.
    QueryFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for FactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactError::Unavailable { fact } => {
                write!(f, "{} is not available for this event", fact)
            }
            FactError::QueryFailed { command, code, stderr } => {
                match code {
                    Some(code) => write!(f, "`{}` failed with exit code {}", command, code)?,
                    None => write!(f, "`{}` was terminated by a signal", command)?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for FactError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = FactError::Unavailable { fact: "revision log" };
        assert_eq!(err.to_string(), "revision log is not available for this event");
    }

    #[test]
    fn test_query_failed_message() {
        let err = FactError::QueryFailed {
            command: "svnlook author /repo -r 9".into(),
            code: Some(1),
            stderr: "svnlook: E160006: No such revision 9".into(),
        };
        assert_eq!(
            err.to_string(),
            "`svnlook author /repo -r 9` failed with exit code 1: svnlook: E160006: No such revision 9"
        );
    }
}
