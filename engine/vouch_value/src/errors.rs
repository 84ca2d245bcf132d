//! Error types for the expectation engine.
//!
//! `EngineErrorKind` carries the structured data for each failure category.
//! Factory functions (e.g., `unknown_matcher()`) are the public construction
//! API; evaluation entry points turn these errors into failing expectation
//! results, while setup operations (clock install, spy creation) return them.

use std::time::Duration;

/// Result of a fallible engine operation.
pub type EngineResult<T> = Result<T, EngineError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineErrorKind {
    /// No built-in or registered matcher has this name.
    #[error("unknown matcher `{name}`")]
    UnknownMatcher { name: String },

    /// A matcher received the wrong number or kind of arguments.
    #[error("{matcher}: {reason}")]
    InvalidMatcherUsage { matcher: String, reason: String },

    /// A spy object was requested with no members and no properties.
    #[error("spy object `{base}` requires a non-empty list or map of member or property names")]
    EmptySpySet { base: String },

    /// An async expectation did not settle in time.
    #[error("timed out after {after_ms}ms waiting for the promise to settle")]
    Timeout { after_ms: u128 },

    /// The virtual clock was installed twice.
    #[error("the virtual clock is already installed")]
    InstallConflict,

    /// An async expectation was given something that is not a promise.
    #[error("expected a promise, but got {got}")]
    MismatchedAsyncType { got: String },

    /// `spy_on` or `spy_on_property` could not install a spy on the
    /// requested member.
    #[error("{reason}")]
    InvalidSpyTarget { reason: String },
}

/// Engine error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct EngineError {
    /// Structured category.
    pub kind: EngineErrorKind,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind) -> Self {
        EngineError { kind }
    }

    /// Stable short code for the error category.
    pub fn code(&self) -> &'static str {
        match self.kind {
            EngineErrorKind::UnknownMatcher { .. } => "V0001",
            EngineErrorKind::InvalidMatcherUsage { .. } => "V0002",
            EngineErrorKind::EmptySpySet { .. } => "V0003",
            EngineErrorKind::Timeout { .. } => "V0004",
            EngineErrorKind::InstallConflict => "V0005",
            EngineErrorKind::MismatchedAsyncType { .. } => "V0006",
            EngineErrorKind::InvalidSpyTarget { .. } => "V0007",
        }
    }
}

impl From<EngineErrorKind> for EngineError {
    fn from(kind: EngineErrorKind) -> Self {
        EngineError::new(kind)
    }
}

#[cold]
pub fn unknown_matcher(name: &str) -> EngineError {
    EngineErrorKind::UnknownMatcher {
        name: name.to_string(),
    }
    .into()
}

#[cold]
pub fn invalid_matcher_usage(matcher: &str, reason: impl Into<String>) -> EngineError {
    EngineErrorKind::InvalidMatcherUsage {
        matcher: matcher.to_string(),
        reason: reason.into(),
    }
    .into()
}

#[cold]
pub fn empty_spy_set(base: &str) -> EngineError {
    EngineErrorKind::EmptySpySet {
        base: base.to_string(),
    }
    .into()
}

#[cold]
pub fn timeout(after: Duration) -> EngineError {
    EngineErrorKind::Timeout {
        after_ms: after.as_millis(),
    }
    .into()
}

#[cold]
pub fn install_conflict() -> EngineError {
    EngineErrorKind::InstallConflict.into()
}

#[cold]
pub fn mismatched_async_type(got: &str) -> EngineError {
    EngineErrorKind::MismatchedAsyncType {
        got: got.to_string(),
    }
    .into()
}

#[cold]
pub fn invalid_spy_target(reason: impl Into<String>) -> EngineError {
    EngineErrorKind::InvalidSpyTarget {
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests;
