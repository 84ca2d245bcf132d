//! Vouch Async - expectations over promise-like values and the virtual clock.
//!
//! - `VirtualClock`: installable fake time with timeouts, intervals and a
//!   mockable wall clock
//! - `AsyncMatcher` and its built-ins (`to_be_resolved`, `to_be_rejected_with`, ...)
//! - `AsyncEvaluator` / `AsyncExpectation`: waiting for settlement with a
//!   timeout, or checking the current state with `already()`

mod clock;
mod expectation;
mod matchers;

pub use clock::{TimerCallback, TimerId, VirtualClock};
pub use expectation::{
    await_expectation, AsyncEvaluator, AsyncExpectation, ExpectationFuture, Settle,
    DEFAULT_TIMEOUT,
};
pub use matchers::{
    apply_async_matcher, AsyncMatcher, AsyncMatcherFactory, AsyncMatcherRef,
    AsyncMatcherRegistry, CustomAsyncMatcher, ToBePending, ToBeRejected, ToBeRejectedWith,
    ToBeRejectedWithError, ToBeResolved, ToBeResolvedTo,
};
