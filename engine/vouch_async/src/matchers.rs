//! Async matchers: predicates over a promise's settlement.

use std::ops::RangeInclusive;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use vouch_equality::MatchersUtil;
use vouch_matchers::builtins::ErrorCheck;
use vouch_matchers::{arity_message, panic_message, ExpectationResult, MatcherResult};
use vouch_value::{invalid_matcher_usage, EngineResult, Settlement, Value};

/// A named predicate over a settlement.
///
/// Polarity works as for synchronous matchers: negation inverts `pass` and,
/// when no message was supplied, the polarity template is used.
pub trait AsyncMatcher: Send + Sync {
    fn name(&self) -> &str;

    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    /// Whether the expectation waits for settlement first. Matchers about
    /// the current state (`to_be_pending`) return `false`.
    fn waits_for_settlement(&self) -> bool {
        true
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        expected: &[Value],
    ) -> EngineResult<MatcherResult>;
}

type SettlementFn =
    dyn Fn(&MatchersUtil, &Settlement, &[Value]) -> EngineResult<MatcherResult> + Send + Sync;

/// Async matcher assembled from a closure.
pub struct CustomAsyncMatcher {
    name: String,
    compare: Box<SettlementFn>,
}

impl CustomAsyncMatcher {
    pub fn new(
        name: impl Into<String>,
        compare: impl Fn(&MatchersUtil, &Settlement, &[Value]) -> EngineResult<MatcherResult>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        CustomAsyncMatcher {
            name: name.into(),
            compare: Box::new(compare),
        }
    }
}

impl AsyncMatcher for CustomAsyncMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=usize::MAX
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        (self.compare)(util, settlement, expected)
    }
}

pub type AsyncMatcherFactory = Arc<dyn Fn(&MatchersUtil) -> Arc<dyn AsyncMatcher> + Send + Sync>;

/// `resolved to 1`, `rejected with Error: boom`, `pending`.
fn settled_as(util: &MatchersUtil, settlement: &Settlement) -> String {
    match settlement {
        Settlement::Pending => "pending".to_string(),
        Settlement::Resolved(value) => format!("resolved to {}", util.pp(value)),
        Settlement::Rejected(reason) => format!("rejected with {}", util.pp(reason)),
    }
}

fn arg(expected: &[Value]) -> Value {
    expected.first().cloned().unwrap_or(Value::Undefined)
}

pub struct ToBeResolved;

impl AsyncMatcher for ToBeResolved {
    fn name(&self) -> &str {
        "to_be_resolved"
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        _expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        Ok(if settlement.is_resolved() {
            MatcherResult::with_message(true, "Expected a promise not to be resolved.")
        } else {
            MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be resolved but it was {}.",
                    settled_as(util, settlement)
                ),
            )
        })
    }
}

pub struct ToBeRejected;

impl AsyncMatcher for ToBeRejected {
    fn name(&self) -> &str {
        "to_be_rejected"
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        _expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        Ok(if settlement.is_rejected() {
            MatcherResult::with_message(true, "Expected a promise not to be rejected.")
        } else {
            MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be rejected but it was {}.",
                    settled_as(util, settlement)
                ),
            )
        })
    }
}

/// `to_be_resolved_to(value)`: deep equality, asymmetric matchers included.
pub struct ToBeResolvedTo;

impl AsyncMatcher for ToBeResolvedTo {
    fn name(&self) -> &str {
        "to_be_resolved_to"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let expected = arg(expected);
        Ok(match settlement {
            Settlement::Resolved(value) if util.equals(value, &expected) => {
                MatcherResult::with_message(
                    true,
                    format!(
                        "Expected a promise not to be resolved to {}.",
                        util.pp(&expected)
                    ),
                )
            }
            Settlement::Rejected(_) => MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be resolved to {} but it was rejected.",
                    util.pp(&expected)
                ),
            ),
            other => MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be resolved to {} but it was {}.",
                    util.pp(&expected),
                    settled_as(util, other)
                ),
            ),
        })
    }
}

/// `to_be_rejected_with(reason)`: deep equality on the rejection reason.
pub struct ToBeRejectedWith;

impl AsyncMatcher for ToBeRejectedWith {
    fn name(&self) -> &str {
        "to_be_rejected_with"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let expected = arg(expected);
        Ok(match settlement {
            Settlement::Rejected(reason) if util.equals(reason, &expected) => {
                MatcherResult::with_message(
                    true,
                    format!(
                        "Expected a promise not to be rejected with {}.",
                        util.pp(&expected)
                    ),
                )
            }
            Settlement::Resolved(_) => MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be rejected with {} but it was resolved.",
                    util.pp(&expected)
                ),
            ),
            other => MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be rejected with {} but it was {}.",
                    util.pp(&expected),
                    settled_as(util, other)
                ),
            ),
        })
    }
}

/// `to_be_rejected_with_error(class?, message?)`: an `Error` reason of the
/// class whose message equals a string or matches a regex.
pub struct ToBeRejectedWithError;

impl AsyncMatcher for ToBeRejectedWithError {
    fn name(&self) -> &str {
        "to_be_rejected_with_error"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=2
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let check = ErrorCheck::parse(self.name(), util, expected)?;
        Ok(match settlement {
            Settlement::Rejected(reason) if check.accepts(reason) => MatcherResult::with_message(
                true,
                format!(
                    "Expected a promise not to be rejected with {}.",
                    check.describe()
                ),
            ),
            Settlement::Resolved(_) => MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be rejected with {} but it was resolved.",
                    check.describe()
                ),
            ),
            other => MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be rejected with {} but it was {}.",
                    check.describe(),
                    settled_as(util, other)
                ),
            ),
        })
    }
}

/// `to_be_pending()`: looks at the current state without waiting.
pub struct ToBePending;

impl AsyncMatcher for ToBePending {
    fn name(&self) -> &str {
        "to_be_pending"
    }

    fn waits_for_settlement(&self) -> bool {
        false
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        settlement: &Settlement,
        _expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        Ok(if settlement.is_pending() {
            MatcherResult::with_message(true, "Expected a promise not to be pending.")
        } else {
            MatcherResult::with_message(
                false,
                format!(
                    "Expected a promise to be pending but it was {}.",
                    settled_as(util, settlement)
                ),
            )
        })
    }
}

static TO_BE_RESOLVED: ToBeResolved = ToBeResolved;
static TO_BE_REJECTED: ToBeRejected = ToBeRejected;
static TO_BE_RESOLVED_TO: ToBeResolvedTo = ToBeResolvedTo;
static TO_BE_REJECTED_WITH: ToBeRejectedWith = ToBeRejectedWith;
static TO_BE_REJECTED_WITH_ERROR: ToBeRejectedWithError = ToBeRejectedWithError;
static TO_BE_PENDING: ToBePending = ToBePending;

static BUILTINS: [&(dyn AsyncMatcher + 'static); 6] = [
    &TO_BE_RESOLVED,
    &TO_BE_REJECTED,
    &TO_BE_RESOLVED_TO,
    &TO_BE_REJECTED_WITH,
    &TO_BE_REJECTED_WITH_ERROR,
    &TO_BE_PENDING,
];

/// An async matcher found by name.
#[derive(Clone)]
pub enum AsyncMatcherRef {
    Builtin(&'static dyn AsyncMatcher),
    Custom(Arc<dyn AsyncMatcher>),
}

impl std::ops::Deref for AsyncMatcherRef {
    type Target = dyn AsyncMatcher;

    fn deref(&self) -> &Self::Target {
        match self {
            AsyncMatcherRef::Builtin(m) => *m,
            AsyncMatcherRef::Custom(m) => &**m,
        }
    }
}

/// Built-in async matchers plus the run's custom ones. Clones share the
/// custom table.
#[derive(Clone, Default)]
pub struct AsyncMatcherRegistry {
    custom: Arc<RwLock<FxHashMap<String, Arc<dyn AsyncMatcher>>>>,
}

impl AsyncMatcherRegistry {
    pub fn new() -> Self {
        AsyncMatcherRegistry::default()
    }

    pub fn add(&self, name: impl Into<String>, factory: &AsyncMatcherFactory, util: &MatchersUtil) {
        let name = name.into();
        tracing::debug!(matcher = %name, "custom async matcher registered");
        self.custom.write().insert(name, factory(util));
    }

    pub fn get(&self, name: &str) -> Option<AsyncMatcherRef> {
        if let Some(custom) = self.custom.read().get(name) {
            return Some(AsyncMatcherRef::Custom(Arc::clone(custom)));
        }
        BUILTINS
            .iter()
            .copied()
            .find(|m| m.name() == name)
            .map(AsyncMatcherRef::Builtin)
    }

    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|m| m.name())
    }

    pub fn custom_count(&self) -> usize {
        self.custom.read().len()
    }

    pub fn reset(&self) {
        self.custom.write().clear();
    }
}

pub(crate) fn check_arity(matcher: &dyn AsyncMatcher, got: usize) -> EngineResult<()> {
    let arity = matcher.arity();
    if arity.contains(&got) {
        Ok(())
    } else {
        Err(invalid_matcher_usage(
            matcher.name(),
            arity_message(&arity, got),
        ))
    }
}

/// Evaluate an async matcher on a known settlement.
pub fn apply_async_matcher(
    matcher: &dyn AsyncMatcher,
    util: &MatchersUtil,
    actual: &Value,
    settlement: &Settlement,
    expected: &[Value],
    negated: bool,
) -> ExpectationResult {
    let name = matcher.name();
    if let Err(error) = check_arity(matcher, expected.len()) {
        return ExpectationResult::errored(name, error);
    }
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        matcher.compare(util, settlement, expected)
    }));
    match outcome {
        Err(payload) => ExpectationResult::failed(
            name,
            format!("matcher `{name}` panicked: {}", panic_message(&*payload)),
        ),
        Ok(Err(error)) => ExpectationResult::errored(name, error),
        Ok(Ok(result)) => {
            if result.pass != negated {
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

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
