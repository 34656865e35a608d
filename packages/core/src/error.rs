//! Errors raised by the allocator and the stateless helpers, plus
//! [`assert_invariant`].

use thiserror::Error;

/// Errors returned by id allocation, tagging, table rendering, assertion,
/// and partial application.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A caller-supplied invariant did not hold. The message is the caller's,
    /// unchanged.
    #[error("{0}")]
    Assertion(String),

    /// [`apply_fixed_arity`](crate::function::apply_fixed_arity) only supports
    /// one, two, or three arguments.
    #[error("unsupported number of arguments: {0} (expected 1, 2, or 3)")]
    UnsupportedArity(usize),

    /// `null` and `undefined` cannot carry an `agentId` property.
    #[error("cannot attach agentId to {kind} at index {index}")]
    UntaggableValue { index: usize, kind: &'static str },

    /// The allocator has issued the largest id a host number holds exactly.
    #[error("agent ids exhausted after {0}")]
    AgentIdsExhausted(u64),

    #[error("table must contain at least one row")]
    EmptyTable,

    /// A row is shorter than the first row.
    #[error("table row {row} has {found} cells, expected at least {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Fail with [`CoreError::Assertion`] carrying `message` when `condition` is
/// false.
///
/// Intended for precondition checks inside the hosting model; the library
/// itself never calls it.
pub fn assert_invariant(condition: bool, message: impl Into<String>) -> Result<(), CoreError> {
    if condition {
        Ok(())
    } else {
        Err(CoreError::Assertion(message.into()))
    }
}
