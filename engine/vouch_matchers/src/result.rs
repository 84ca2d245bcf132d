//! Matcher and expectation results.

use vouch_value::EngineError;

/// What a matcher reports.
///
/// `message`, when present, describes the failure of whichever polarity the
/// result fails: for `pass == false` the positive failure, for
/// `pass == true` the failure of the negated expectation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatcherResult {
    pub pass: bool,
    pub message: Option<String>,
}

impl MatcherResult {
    /// Result without a message; failures use the polarity template.
    pub fn new(pass: bool) -> Self {
        MatcherResult {
            pass,
            message: None,
        }
    }

    pub fn with_message(pass: bool, message: impl Into<String>) -> Self {
        MatcherResult {
            pass,
            message: Some(message.into()),
        }
    }
}

/// Message of every passing expectation.
pub const PASSED: &str = "Passed.";

/// Outcome of one evaluated expectation, as handed to reporters.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExpectationResult {
    pub matcher_name: String,
    pub pass: bool,
    pub message: String,
    /// Usage error that caused the failure, if any.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub error: Option<EngineError>,
}

impl ExpectationResult {
    pub fn passed(matcher_name: impl Into<String>) -> Self {
        ExpectationResult {
            matcher_name: matcher_name.into(),
            pass: true,
            message: PASSED.to_string(),
            error: None,
        }
    }

    #[cold]
    pub fn failed(matcher_name: impl Into<String>, message: impl Into<String>) -> Self {
        ExpectationResult {
            matcher_name: matcher_name.into(),
            pass: false,
            message: message.into(),
            error: None,
        }
    }

    /// Failure caused by an engine error; never inverted by negation.
    #[cold]
    pub fn errored(matcher_name: impl Into<String>, error: EngineError) -> Self {
        ExpectationResult {
            matcher_name: matcher_name.into(),
            pass: false,
            message: error.to_string(),
            error: Some(error),
        }
    }

    /// Prefix a failure message with `label: `.
    #[must_use]
    pub fn with_context(mut self, label: Option<&str>) -> Self {
        if let (false, Some(label)) = (self.pass, label) {
            self.message = format!("{label}: {}", self.message);
        }
        self
    }
}
