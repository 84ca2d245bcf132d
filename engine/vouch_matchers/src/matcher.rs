//! The matcher abstraction.

use std::ops::RangeInclusive;
use std::sync::Arc;

use vouch_equality::MatchersUtil;
use vouch_value::{EngineResult, Value};

use crate::result::MatcherResult;

/// A named predicate over an actual value and expected arguments.
///
/// `compare` decides the positive polarity. Negated expectations invert its
/// result unless `negative_compare` gives a dedicated answer (needed when a
/// value can fail both polarities, such as a `NaN` comparison).
pub trait Matcher: Send + Sync {
    fn name(&self) -> &str;

    /// Accepted number of expected arguments.
    fn arity(&self) -> RangeInclusive<usize> {
        0..=usize::MAX
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult>;

    fn negative_compare(
        &self,
        _util: &MatchersUtil,
        _actual: &Value,
        _expected: &[Value],
    ) -> Option<EngineResult<MatcherResult>> {
        None
    }
}

type CompareFn = dyn Fn(&MatchersUtil, &Value, &[Value]) -> EngineResult<MatcherResult> + Send + Sync;

/// Matcher assembled from closures, as returned by custom matcher factories.
///
/// ```text
/// CustomMatcher::new("to_be_even", |_, actual, _| {
///     Ok(MatcherResult::new(actual.as_number().is_some_and(|n| n % 2.0 == 0.0)))
/// })
/// ```
pub struct CustomMatcher {
    name: String,
    compare: Box<CompareFn>,
    negative_compare: Option<Box<CompareFn>>,
}

impl CustomMatcher {
    pub fn new(
        name: impl Into<String>,
        compare: impl Fn(&MatchersUtil, &Value, &[Value]) -> EngineResult<MatcherResult>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        CustomMatcher {
            name: name.into(),
            compare: Box::new(compare),
            negative_compare: None,
        }
    }

    /// Dedicated negated path.
    #[must_use]
    pub fn with_negative_compare(
        mut self,
        negative_compare: impl Fn(&MatchersUtil, &Value, &[Value]) -> EngineResult<MatcherResult>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.negative_compare = Some(Box::new(negative_compare));
        self
    }
}

impl Matcher for CustomMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        (self.compare)(util, actual, expected)
    }

    fn negative_compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> Option<EngineResult<MatcherResult>> {
        self.negative_compare
            .as_ref()
            .map(|negative| negative(util, actual, expected))
    }
}

/// Builds a matcher from the run's shared equality utility.
pub type MatcherFactory = Arc<dyn Fn(&MatchersUtil) -> Arc<dyn Matcher> + Send + Sync>;
