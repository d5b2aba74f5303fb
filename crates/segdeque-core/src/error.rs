//! Error types for the segdeque container.
//!
//! One enum covers every layer: the memory provider and block store
//! report allocation failures, the container reports range errors, and
//! fallible element constructors report construction failures.

use std::error::Error;
use std::fmt;

/// Errors that can occur during container operations.
///
/// Every operation that returns one of these leaves the container in the
/// state it had before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DequeError {
    /// A checked access or positional mutation used an index past the end.
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The container length at the time of the call.
        len: usize,
    },
    /// The memory provider could not supply a block or the map array.
    AllocationFailed {
        /// Size of the failed request in bytes.
        bytes: usize,
    },
    /// A size or layout computation overflowed.
    CapacityOverflow,
    /// A fallible element constructor refused to produce a value.
    ElementConstruction {
        /// Description of the failure.
        reason: String,
    },
    /// A [`DequeConfig`](crate::DequeConfig) invariant was violated.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for DequeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for deque of length {len}")
            }
            Self::AllocationFailed { bytes } => {
                write!(f, "memory provider failed to allocate {bytes} bytes")
            }
            Self::CapacityOverflow => write!(f, "capacity overflow"),
            Self::ElementConstruction { reason } => {
                write!(f, "element construction failed: {reason}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid deque config: {reason}"),
        }
    }
}

impl Error for DequeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_index_and_len() {
        let err = DequeError::OutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "index 7 out of range for deque of length 3");
    }

    #[test]
    fn allocation_failure_reports_bytes() {
        let err = DequeError::AllocationFailed { bytes: 512 };
        assert!(err.to_string().contains("512"));
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<E: Error + Send + Sync + 'static>() {}
        assert_error::<DequeError>();
    }
}
