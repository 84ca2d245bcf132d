//! Built-in matcher implementations.

mod collections;
mod equality;
mod numeric;
mod spies;
mod throwing;
mod types;

pub use collections::{ToContain, ToHaveSize, ToMatch};
pub use equality::{ToBe, ToEqual};
pub use numeric::{
    ToBeCloseTo, ToBeGreaterThan, ToBeGreaterThanOrEqual, ToBeLessThan, ToBeLessThanOrEqual,
};
pub use spies::{
    ToHaveBeenCalled, ToHaveBeenCalledBefore, ToHaveBeenCalledOnceWith, ToHaveBeenCalledTimes,
    ToHaveBeenCalledWith, ToHaveSpyInteractions,
};
pub use throwing::{ErrorCheck, ToThrow, ToThrowError, ToThrowMatching};
pub use types::{
    Nothing, ToBeDefined, ToBeFalse, ToBeFalsy, ToBeInstanceOf, ToBeNaN, ToBeNegativeInfinity,
    ToBeNull, ToBePositiveInfinity, ToBeTrue, ToBeTruthy, ToBeUndefined,
};

use vouch_equality::MatchersUtil;
use vouch_value::{invalid_matcher_usage, EngineResult, Value};

use crate::result::MatcherResult;

/// The `i`-th expected argument, `undefined` when absent.
fn arg(expected: &[Value], i: usize) -> Value {
    expected.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Result whose message is built for the polarity that `pass` makes fail.
///
/// `message` receives `""` for a failing result and `" not"` for a passing
/// one (whose message is only shown when negated).
fn outcome(pass: bool, message: impl FnOnce(&str) -> String) -> MatcherResult {
    MatcherResult::with_message(pass, message(if pass { " not" } else { "" }))
}

fn number_arg(matcher: &str, util: &MatchersUtil, value: &Value, role: &str) -> EngineResult<f64> {
    value.as_number().ok_or_else(|| {
        invalid_matcher_usage(
            matcher,
            format!("expected {role} to be a number, but got {}", util.pp(value)),
        )
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
