//! Async expectations.
//!
//! # Settling
//!
//! ```text
//! expect_async(p).to_be_resolved()           wait until p settles or the timeout fires
//! expect_async(p).already().to_be_resolved() look at p's state now
//! expect_async(p).to_be_pending()            always looks at p's state now
//! ```
//!
//! The timeout runs on the engine's clock, so with the virtual clock
//! installed it only fires on `tick`; if the clock is uninstalled mid-wait,
//! the rest of the timeout runs in real time. A settlement that arrives
//! after the timeout is ignored.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use futures::future::poll_fn;
use parking_lot::Mutex;
use vouch_matchers::{Evaluator, ExpectationResult};
use vouch_value::{
    mismatched_async_type, timeout, unknown_matcher, Class, Promise, Settlement, Value,
};

use crate::clock::{TimerId, VirtualClock};
use crate::matchers::{apply_async_matcher, check_arity, AsyncMatcherRegistry};

/// Default wait before an async expectation gives up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// How an async expectation obtains the settlement it checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settle {
    /// Use the current state; a pending promise fails.
    Already,
    /// Wait, up to the given timeout or the engine default.
    Within(Option<Duration>),
}

/// Set once by a timer; wakes the task that is waiting on it.
#[derive(Default)]
struct Alarm {
    rung: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

impl Alarm {
    fn ring(&self) {
        self.rung.store(true, Ordering::SeqCst);
        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }

    fn poll_rung(&self, cx: &mut Context<'_>) -> bool {
        *self.waker.lock() = Some(cx.waker().clone());
        self.rung.load(Ordering::SeqCst)
    }
}

/// Clears the timeout timer once the wait is over, however it ended.
struct TimerGuard<'c> {
    clock: &'c VirtualClock,
    id: TimerId,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.clock.clear_timeout(self.id);
    }
}

/// Evaluates async matchers against promises and logs through the
/// synchronous evaluator. Clones share every table.
#[derive(Clone)]
pub struct AsyncEvaluator {
    evaluator: Evaluator,
    registry: AsyncMatcherRegistry,
    clock: VirtualClock,
    default_timeout: Duration,
}

impl Default for AsyncEvaluator {
    fn default() -> Self {
        AsyncEvaluator::new(
            Evaluator::default(),
            AsyncMatcherRegistry::default(),
            VirtualClock::default(),
            DEFAULT_TIMEOUT,
        )
    }
}

impl AsyncEvaluator {
    pub fn new(
        evaluator: Evaluator,
        registry: AsyncMatcherRegistry,
        clock: VirtualClock,
        default_timeout: Duration,
    ) -> Self {
        AsyncEvaluator {
            evaluator,
            registry,
            clock,
            default_timeout,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn registry(&self) -> &AsyncMatcherRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Start an async expectation on `actual`, normally a promise.
    pub fn expect_async(&self, actual: impl Into<Value>) -> AsyncExpectation<'_> {
        AsyncExpectation::new(self, actual.into())
    }

    /// Evaluate `matcher_name` against the settlement of `actual` without
    /// logging the result.
    #[tracing::instrument(level = "debug", skip_all, fields(matcher = matcher_name, negated = negated))]
    pub async fn evaluate(
        &self,
        matcher_name: &str,
        actual: &Value,
        expected: &[Value],
        negated: bool,
        settle: Settle,
    ) -> ExpectationResult {
        let Some(matcher) = self.registry.get(matcher_name) else {
            tracing::debug!("unknown async matcher");
            return ExpectationResult::errored(matcher_name, unknown_matcher(matcher_name));
        };
        let Some(promise) = actual.as_promise() else {
            return ExpectationResult::errored(
                matcher_name,
                mismatched_async_type(&actual.type_name()),
            );
        };
        if let Err(error) = check_arity(&*matcher, expected.len()) {
            return ExpectationResult::errored(matcher_name, error);
        }

        let settlement = if !matcher.waits_for_settlement() {
            promise.settlement()
        } else {
            match settle {
                Settle::Already => {
                    let settlement = promise.settlement();
                    if settlement.is_pending() {
                        return ExpectationResult::failed(
                            matcher_name,
                            "Expected a promise to be settled (via already()) but it was pending.",
                        );
                    }
                    settlement
                }
                Settle::Within(limit) => {
                    let limit = limit.unwrap_or(self.default_timeout);
                    match self.settle_within(promise, limit).await {
                        Some(settlement) => settlement,
                        None => {
                            tracing::debug!(ms = limit.as_millis(), "async expectation timed out");
                            return ExpectationResult::errored(matcher_name, timeout(limit));
                        }
                    }
                }
            }
        };

        let result = apply_async_matcher(
            &*matcher,
            self.evaluator.util(),
            actual,
            &settlement,
            expected,
            negated,
        );
        tracing::trace!(pass = result.pass, "async matcher evaluated");
        result
    }

    /// Wait for `promise` to settle; `None` once `limit` has elapsed on the
    /// engine's clock.
    async fn settle_within(&self, promise: &Promise, limit: Duration) -> Option<Settlement> {
        let current = promise.settlement();
        if !current.is_pending() {
            return Some(current);
        }

        let alarm = Arc::new(Alarm::default());
        let id = {
            let alarm = Arc::clone(&alarm);
            self.clock.set_deadline(limit, move || {
                alarm.ring();
                Ok(())
            })
        };
        let _guard = TimerGuard {
            clock: &self.clock,
            id,
        };
        tracing::trace!(ms = limit.as_millis(), "waiting for settlement");

        poll_fn(|cx| {
            if let Poll::Ready(settlement) = promise.poll_settled(cx) {
                return Poll::Ready(Some(settlement));
            }
            if alarm.poll_rung(cx) {
                return Poll::Ready(None);
            }
            Poll::Pending
        })
        .await
    }
}

/// Wait for `actual` to settle, evaluate `matcher_name` on the settlement
/// and log the result.
pub async fn await_expectation(
    engine: &AsyncEvaluator,
    actual: &Value,
    matcher_name: &str,
    expected: &[Value],
    negated: bool,
    limit: Option<Duration>,
) -> ExpectationResult {
    let result = engine
        .evaluate(matcher_name, actual, expected, negated, Settle::Within(limit))
        .await;
    engine.evaluator.record(result)
}

/// Boxed future returned by the typed async matchers.
pub type ExpectationFuture<'a> = Pin<Box<dyn Future<Output = ExpectationResult> + Send + 'a>>;

/// A promise waiting for an async matcher.
///
/// Builders derive a new expectation and leave this one untouched.
#[derive(Clone)]
pub struct AsyncExpectation<'e> {
    engine: &'e AsyncEvaluator,
    actual: Value,
    context: Option<String>,
    negated: bool,
    settle: Settle,
}

impl<'e> AsyncExpectation<'e> {
    pub(crate) fn new(engine: &'e AsyncEvaluator, actual: Value) -> Self {
        AsyncExpectation {
            engine,
            actual,
            context: None,
            negated: false,
            settle: Settle::Within(None),
        }
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    #[allow(
        clippy::should_implement_trait,
        reason = "reads as `expect_async(p).not().to_be_rejected()`"
    )]
    #[must_use]
    pub fn not(&self) -> AsyncExpectation<'e> {
        AsyncExpectation {
            negated: !self.negated,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_context(&self, label: impl Into<String>) -> AsyncExpectation<'e> {
        AsyncExpectation {
            context: Some(label.into()),
            ..self.clone()
        }
    }

    /// Check the current state instead of waiting.
    #[must_use]
    pub fn already(&self) -> AsyncExpectation<'e> {
        AsyncExpectation {
            settle: Settle::Already,
            ..self.clone()
        }
    }

    /// Wait at most `limit` instead of the engine default.
    #[must_use]
    pub fn with_timeout(&self, limit: Duration) -> AsyncExpectation<'e> {
        AsyncExpectation {
            settle: Settle::Within(Some(limit)),
            ..self.clone()
        }
    }

    /// Evaluate any async matcher by name.
    pub async fn to(&self, matcher_name: &str, expected: &[Value]) -> ExpectationResult {
        let result = self
            .engine
            .evaluate(matcher_name, &self.actual, expected, self.negated, self.settle)
            .await
            .with_context(self.context.as_deref());
        self.engine.evaluator.record(result)
    }

    fn evaluate_owned(
        &self,
        matcher_name: &'static str,
        expected: Vec<Value>,
    ) -> ExpectationFuture<'_> {
        Box::pin(async move { self.to(matcher_name, &expected).await })
    }

    pub fn to_be_resolved(&self) -> ExpectationFuture<'_> {
        self.evaluate_owned("to_be_resolved", Vec::new())
    }

    pub fn to_be_rejected(&self) -> ExpectationFuture<'_> {
        self.evaluate_owned("to_be_rejected", Vec::new())
    }

    pub fn to_be_resolved_to(&self, expected: impl Into<Value>) -> ExpectationFuture<'_> {
        self.evaluate_owned("to_be_resolved_to", vec![expected.into()])
    }

    pub fn to_be_rejected_with(&self, expected: impl Into<Value>) -> ExpectationFuture<'_> {
        self.evaluate_owned("to_be_rejected_with", vec![expected.into()])
    }

    /// Rejected with any `Error`.
    pub fn to_be_rejected_with_error(&self) -> ExpectationFuture<'_> {
        self.evaluate_owned("to_be_rejected_with_error", Vec::new())
    }

    pub fn to_be_rejected_with_error_of(&self, class: &Class) -> ExpectationFuture<'_> {
        self.evaluate_owned(
            "to_be_rejected_with_error",
            vec![Value::Class(class.clone())],
        )
    }

    /// Rejected with an `Error` whose message equals a string or matches a
    /// regex value, optionally restricted to `class`.
    pub fn to_be_rejected_with_error_with(
        &self,
        class: Option<&Class>,
        message: impl Into<Value>,
    ) -> ExpectationFuture<'_> {
        let mut args: Vec<Value> = class.map(|c| Value::Class(c.clone())).into_iter().collect();
        args.push(message.into());
        self.evaluate_owned("to_be_rejected_with_error", args)
    }

    pub fn to_be_pending(&self) -> ExpectationFuture<'_> {
        self.evaluate_owned("to_be_pending", Vec::new())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
