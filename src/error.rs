use thiserror::Error;

use crate::types::ValueKind;

/// Convenience result type for processing operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Boxed error returned by caller-supplied functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by every engine and combinator in this crate.
///
/// Errors raised by caller-supplied functions are carried verbatim in
/// [`ProcessingError::Function`] or [`ProcessingError::Message`].
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Two operands of a binary combinator have different kinds.
    #[error("{op}: incompatible kinds {left} and {right}")]
    IncompatibleKinds {
        op: &'static str,
        left: ValueKind,
        right: ValueKind,
    },

    /// The combinator has no meaning for this kind (e.g. summing booleans).
    #[error("{op}: unsupported kind {kind}")]
    UnsupportedKind { op: &'static str, kind: ValueKind },

    /// Integer arithmetic overflowed.
    #[error("{op}: integer overflow")]
    Overflow { op: &'static str },

    /// A [`crate::types::Value`] could not be converted into the requested native type.
    #[error("cannot convert {found} value into {expected}")]
    Conversion {
        expected: &'static str,
        found: ValueKind,
    },

    /// Error returned by a caller-supplied function.
    #[error(transparent)]
    Function(BoxError),

    /// Plain-text error returned by a caller-supplied function.
    #[error("{0}")]
    Message(String),

    /// The [`crate::context::Context`] was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The [`crate::context::Context`] deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Parallelism must be at least one worker.
    #[error("parallelism must be > 0")]
    InvalidParallelism,

    /// A supplied function panicked while processing the element at `index`.
    #[error("worker panicked at index {index}: {message}")]
    WorkerPanicked { index: usize, message: String },

    /// The engine's worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Execution options could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ProcessingError {
    /// Wrap an arbitrary error raised inside a caller-supplied function.
    pub fn function<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Function(err.into())
    }

    /// Build an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Whether this error was caused by cancellation or an expired deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessingError;
    use crate::types::ValueKind;

    #[test]
    fn function_errors_keep_their_message() {
        let io = std::io::Error::other("disk on fire");
        let err = ProcessingError::function(io);
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn kind_errors_render_operation_and_kinds() {
        let err = ProcessingError::IncompatibleKinds {
            op: "sum",
            left: ValueKind::Int64,
            right: ValueKind::Utf8,
        };
        assert_eq!(err.to_string(), "sum: incompatible kinds int64 and utf8");
    }

    #[test]
    fn cancellation_errors_are_classified() {
        assert!(ProcessingError::Cancelled.is_cancellation());
        assert!(ProcessingError::DeadlineExceeded.is_cancellation());
        assert!(!ProcessingError::msg("nope").is_cancellation());
    }
}
