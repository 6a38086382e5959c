use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O failure ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed record {record:?}: {reason}")]
    MalformedRecord { record: String, reason: String },

    #[error("count overflow for key {key:?}")]
    CountOverflow { key: String },

    #[error("task {task} crashed after {attempts} attempt(s): {reason}")]
    WorkerCrashed {
        task: String,
        attempts: u32,
        reason: String,
    },

    #[error("output location {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("{} is not a completed stage output (missing _SUCCESS)", .0.display())]
    IncompleteStageOutput(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("stage {stage:?} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Transient failures worth another attempt on a fresh worker.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::WorkerCrashed { .. } => true,
            Self::Stage { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        let io = Error::io("read", io::Error::from(io::ErrorKind::Interrupted));
        assert!(io.is_retryable());
        assert!(!Error::malformed("A", "expected 2 fields").is_retryable());
        assert!(!Error::CountOverflow { key: "A".into() }.is_retryable());
    }

    #[test]
    fn stage_message_names_stage_and_record() {
        let err = Error::malformed("A", "expected 2 fields, found 1").in_stage("sort");
        assert_eq!(
            err.to_string(),
            "stage \"sort\" failed: malformed record \"A\": expected 2 fields, found 1"
        );
    }
}
