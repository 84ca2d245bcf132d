//! Matchers over zero-argument callables that may throw.

use std::ops::RangeInclusive;
use std::panic::{catch_unwind, AssertUnwindSafe};

use regex::Regex;
use vouch_equality::MatchersUtil;
use vouch_value::{invalid_matcher_usage, Class, EngineResult, Value};

use super::arg;
use crate::evaluate::panic_message;
use crate::matcher::Matcher;
use crate::result::MatcherResult;

/// Call `actual` with no arguments and capture what it throws.
///
/// Both `Err(Thrown)` returns and panics count as throwing; a panic becomes
/// an `Error` carrying the panic message.
fn trap(matcher: &str, util: &MatchersUtil, actual: &Value) -> EngineResult<Option<Value>> {
    let Some(function) = actual.as_function() else {
        return Err(invalid_matcher_usage(
            matcher,
            format!("expected a function, but got {}", util.pp(actual)),
        ));
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| function.call0()));
    Ok(match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(thrown)) => Some(thrown.into_value()),
        Err(payload) => Some(Value::error(panic_message(&*payload))),
    })
}

/// `to_throw(expected?)`: anything thrown, or a value deep-equal to
/// `expected`.
pub struct ToThrow;

impl Matcher for ToThrow {
    fn name(&self) -> &str {
        "to_throw"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=1
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let Some(thrown) = trap(self.name(), util, actual)? else {
            return Ok(MatcherResult::with_message(
                false,
                "Expected function to throw an exception.",
            ));
        };
        let Some(expected) = expected.first() else {
            return Ok(MatcherResult::with_message(
                true,
                format!("Expected function not to throw, but it threw {}.", util.pp(&thrown)),
            ));
        };
        if util.equals(&thrown, expected) {
            Ok(MatcherResult::with_message(
                true,
                format!("Expected function not to throw {}.", util.pp(expected)),
            ))
        } else {
            Ok(MatcherResult::with_message(
                false,
                format!(
                    "Expected function to throw {}, but it threw {}.",
                    util.pp(expected),
                    util.pp(&thrown)
                ),
            ))
        }
    }
}

/// Expected message of a thrown error.
enum MessageCheck {
    Any,
    Exact(String),
    Pattern(Regex),
}

impl MessageCheck {
    fn accepts(&self, message: &str) -> bool {
        match self {
            MessageCheck::Any => true,
            MessageCheck::Exact(expected) => expected == message,
            MessageCheck::Pattern(re) => re.is_match(message),
        }
    }
}

/// Expected error, parsed from `(class?, message?)` matcher arguments.
pub struct ErrorCheck {
    class: Option<Class>,
    message: MessageCheck,
}

impl ErrorCheck {
    /// Accepts `()`, `(class)`, `(message)`, `(class, message)`; a message is
    /// a string or a regex.
    pub fn parse(matcher: &str, util: &MatchersUtil, expected: &[Value]) -> EngineResult<Self> {
        let (class, message) = match expected {
            [] => (None, None),
            [Value::Class(class)] => (Some(class.clone()), None),
            [message] => (None, Some(message)),
            [Value::Class(class), message] => (Some(class.clone()), Some(message)),
            [other, _] => {
                return Err(invalid_matcher_usage(
                    matcher,
                    format!("expected an error class, but got {}", util.pp(other)),
                ))
            }
            _ => return Err(invalid_matcher_usage(matcher, "too many arguments")),
        };
        let message = match message {
            None | Some(Value::Undefined | Value::Null) => MessageCheck::Any,
            Some(Value::Str(s)) => MessageCheck::Exact((**s).clone()),
            Some(Value::Regex(re)) => MessageCheck::Pattern((**re).clone()),
            Some(other) => {
                return Err(invalid_matcher_usage(
                    matcher,
                    format!(
                        "expected an error message string or regex, but got {}",
                        util.pp(other)
                    ),
                ))
            }
        };
        Ok(ErrorCheck { class, message })
    }

    /// An `Error` value of the class whose message passes the check.
    pub fn accepts(&self, thrown: &Value) -> bool {
        let Some(error) = thrown.as_error() else {
            return false;
        };
        self.class
            .as_ref()
            .map_or(true, |class| error.class().is_subclass_of(class))
            && self.message.accepts(error.message())
    }

    /// `an exception`, `TypeError with message 'm'`, ...
    pub fn describe(&self) -> String {
        let mut out = match &self.class {
            Some(class) => class.name().to_string(),
            None => "an exception".to_string(),
        };
        match &self.message {
            MessageCheck::Any => {}
            MessageCheck::Exact(m) => {
                out.push_str(&format!(" with message '{m}'"));
            }
            MessageCheck::Pattern(re) => {
                out.push_str(&format!(" with a message matching /{}/", re.as_str()));
            }
        }
        out
    }
}

/// `to_throw_error(class?, message?)`: an `Error` value of `class` (or a
/// subclass) whose message equals a string or matches a regex.
pub struct ToThrowError;

impl Matcher for ToThrowError {
    fn name(&self) -> &str {
        "to_throw_error"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=2
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let check = ErrorCheck::parse(self.name(), util, expected)?;
        let Some(thrown) = trap(self.name(), util, actual)? else {
            return Ok(MatcherResult::with_message(
                false,
                format!("Expected function to throw {}.", check.describe()),
            ));
        };
        if thrown.as_error().is_none() {
            return Ok(MatcherResult::with_message(
                false,
                format!(
                    "Expected function to throw an Error, but it threw {}.",
                    util.pp(&thrown)
                ),
            ));
        }
        if check.accepts(&thrown) {
            Ok(MatcherResult::with_message(
                true,
                format!("Expected function not to throw {}.", check.describe()),
            ))
        } else {
            Ok(MatcherResult::with_message(
                false,
                format!(
                    "Expected function to throw {}, but it threw {}.",
                    check.describe(),
                    util.pp(&thrown)
                ),
            ))
        }
    }
}

/// `to_throw_matching(predicate)`: the thrown value satisfies `predicate`.
pub struct ToThrowMatching;

impl Matcher for ToThrowMatching {
    fn name(&self) -> &str {
        "to_throw_matching"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let candidate = arg(expected, 0);
        let Some(predicate) = candidate.as_function() else {
            return Err(invalid_matcher_usage(
                self.name(),
                format!("expected a predicate function, but got {}", util.pp(&candidate)),
            ));
        };
        let Some(thrown) = trap(self.name(), util, actual)? else {
            return Ok(MatcherResult::with_message(
                false,
                "Expected function to throw an exception matching a predicate.",
            ));
        };
        let verdict = predicate
            .call(&Value::Undefined, std::slice::from_ref(&thrown))
            .map_err(|e| {
                invalid_matcher_usage(
                    self.name(),
                    format!("the predicate threw {}", util.pp(e.value())),
                )
            })?;
        if verdict.is_truthy() {
            Ok(MatcherResult::with_message(
                true,
                "Expected function not to throw an exception matching a predicate.",
            ))
        } else {
            Ok(MatcherResult::with_message(
                false,
                format!(
                    "Expected function to throw an exception matching a predicate, but it threw {}.",
                    util.pp(&thrown)
                ),
            ))
        }
    }
}
