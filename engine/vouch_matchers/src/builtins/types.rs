//! Type, instance and value-kind matchers.

use std::ops::RangeInclusive;

use vouch_equality::MatchersUtil;
use vouch_value::{invalid_matcher_usage, EngineResult, Value};

use super::{arg, outcome};
use crate::matcher::Matcher;
use crate::result::MatcherResult;

/// Zero-argument matchers deciding on the actual value alone. Failures use
/// the polarity template (`Expected null to be defined.`).
macro_rules! predicate_matcher {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $predicate:expr) => {
        $(#[$doc])*
        pub struct $ty;

        impl Matcher for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn arity(&self) -> RangeInclusive<usize> {
                0..=0
            }

            fn compare(
                &self,
                _util: &MatchersUtil,
                actual: &Value,
                _expected: &[Value],
            ) -> EngineResult<MatcherResult> {
                let predicate: fn(&Value) -> bool = $predicate;
                Ok(MatcherResult::new(predicate(actual)))
            }
        }
    };
}

predicate_matcher!(
    /// Anything but `undefined`.
    ToBeDefined,
    "to_be_defined",
    |v| !v.is_undefined()
);
predicate_matcher!(ToBeUndefined, "to_be_undefined", Value::is_undefined);
predicate_matcher!(ToBeNull, "to_be_null", Value::is_null);
predicate_matcher!(ToBeNaN, "to_be_nan", |v| v.as_number().is_some_and(f64::is_nan));
predicate_matcher!(
    /// Exactly `true`, not merely truthy.
    ToBeTrue,
    "to_be_true",
    |v| v.as_bool() == Some(true)
);
predicate_matcher!(ToBeFalse, "to_be_false", |v| v.as_bool() == Some(false));
predicate_matcher!(ToBeTruthy, "to_be_truthy", Value::is_truthy);
predicate_matcher!(ToBeFalsy, "to_be_falsy", |v| !v.is_truthy());
predicate_matcher!(
    ToBePositiveInfinity,
    "to_be_positive_infinity",
    |v| v.as_number() == Some(f64::INFINITY)
);
predicate_matcher!(
    ToBeNegativeInfinity,
    "to_be_negative_infinity",
    |v| v.as_number() == Some(f64::NEG_INFINITY)
);

/// `to_be_instance_of(class)`: objects and errors whose class is `class` or
/// one of its subclasses.
pub struct ToBeInstanceOf;

impl Matcher for ToBeInstanceOf {
    fn name(&self) -> &str {
        "to_be_instance_of"
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
        let expected = arg(expected, 0);
        let Some(class) = expected.as_class() else {
            return Err(invalid_matcher_usage(
                self.name(),
                format!("expected a class, but got {}", util.pp(&expected)),
            ));
        };
        let pass = actual.is_instance_of(class);
        Ok(outcome(pass, |not| {
            format!(
                "Expected instance of {}{not} to be an instance of {}.",
                actual.type_name(),
                class.name()
            )
        }))
    }
}

/// Always passes; marks a test as having an expectation.
pub struct Nothing;

impl Matcher for Nothing {
    fn name(&self) -> &str {
        "nothing"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    fn compare(&self, _: &MatchersUtil, _: &Value, _: &[Value]) -> EngineResult<MatcherResult> {
        Ok(MatcherResult::new(true))
    }
}
