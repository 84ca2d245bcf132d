//! Expectation evaluation.
//!
//! # Polarity
//!
//! ```text
//! positive   compare                       pass as reported
//! negated    negative_compare, if any      pass as reported
//!            otherwise compare             pass inverted
//! ```
//!
//! A failing result keeps the matcher's message when it supplied one and
//! otherwise gets the polarity template from `MatchersUtil`. Engine errors
//! and panics always fail, whatever the polarity.

use std::any::Any;
use std::ops::RangeInclusive;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use vouch_equality::MatchersUtil;
use vouch_value::{invalid_matcher_usage, unknown_matcher, Value};

use crate::expectation::Expectation;
use crate::matcher::Matcher;
use crate::registry::MatcherRegistry;
use crate::result::ExpectationResult;

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// `expected 1 argument, got 0`, `expected 1 to 2 arguments, got 3`.
pub fn arity_message(arity: &RangeInclusive<usize>, got: usize) -> String {
    let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
    let (min, max) = (*arity.start(), *arity.end());
    if min == max {
        format!("expected {min} {}, got {got}", plural(min))
    } else if max == usize::MAX {
        format!("expected at least {min} {}, got {got}", plural(min))
    } else {
        format!("expected {min} to {max} arguments, got {got}")
    }
}

/// Evaluate one matcher against `actual`.
pub fn apply_matcher(
    matcher: &dyn Matcher,
    util: &MatchersUtil,
    actual: &Value,
    expected: &[Value],
    negated: bool,
) -> ExpectationResult {
    let name = matcher.name();
    let arity = matcher.arity();
    if !arity.contains(&expected.len()) {
        return ExpectationResult::errored(
            name,
            invalid_matcher_usage(name, arity_message(&arity, expected.len())),
        );
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let dedicated = if negated {
            matcher.negative_compare(util, actual, expected)
        } else {
            None
        };
        match dedicated {
            Some(result) => result.map(|r| (r, true)),
            None => matcher.compare(util, actual, expected).map(|r| (r, false)),
        }
    }));

    match outcome {
        Err(payload) => ExpectationResult::failed(
            name,
            format!("matcher `{name}` panicked: {}", panic_message(&*payload)),
        ),
        Ok(Err(error)) => ExpectationResult::errored(name, error),
        Ok(Ok((result, dedicated))) => {
            let pass = if negated && !dedicated {
                !result.pass
            } else {
                result.pass
            };
            if pass {
                ExpectationResult::passed(name)
            } else {
                let message = result.message.unwrap_or_else(|| {
                    util.build_failure_message(name, negated, actual, expected)
                });
                ExpectationResult::failed(name, message)
            }
        }
    }
}

/// Resolves matchers by name, evaluates them and keeps the result log.
///
/// Clones share the registry, the equality utility and the log.
#[derive(Clone, Default)]
pub struct Evaluator {
    registry: MatcherRegistry,
    util: MatchersUtil,
    log: Arc<Mutex<Vec<ExpectationResult>>>,
}

impl Evaluator {
    pub fn new(registry: MatcherRegistry, util: MatchersUtil) -> Self {
        Evaluator {
            registry,
            util,
            log: Arc::default(),
        }
    }

    pub fn registry(&self) -> &MatcherRegistry {
        &self.registry
    }

    pub fn util(&self) -> &MatchersUtil {
        &self.util
    }

    /// Start an expectation on `actual`.
    pub fn expect(&self, actual: impl Into<Value>) -> Expectation<'_> {
        Expectation::new(self, actual.into())
    }

    /// Evaluate `matcher_name` without logging the result.
    #[tracing::instrument(level = "debug", skip_all, fields(matcher = matcher_name, negated = negated))]
    pub fn evaluate(
        &self,
        matcher_name: &str,
        actual: &Value,
        expected: &[Value],
        negated: bool,
    ) -> ExpectationResult {
        let Some(matcher) = self.registry.get(matcher_name) else {
            tracing::debug!("unknown matcher");
            return ExpectationResult::errored(matcher_name, unknown_matcher(matcher_name));
        };
        let result = apply_matcher(&*matcher, &self.util, actual, expected, negated);
        tracing::trace!(pass = result.pass, "matcher evaluated");
        result
    }

    /// Append to the result log and hand the result back.
    pub fn record(&self, result: ExpectationResult) -> ExpectationResult {
        self.log.lock().push(result.clone());
        result
    }

    /// Results logged so far.
    pub fn results(&self) -> Vec<ExpectationResult> {
        self.log.lock().clone()
    }

    /// Drain the result log.
    pub fn take_results(&self) -> Vec<ExpectationResult> {
        std::mem::take(&mut *self.log.lock())
    }

    pub fn clear_results(&self) {
        self.log.lock().clear();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
