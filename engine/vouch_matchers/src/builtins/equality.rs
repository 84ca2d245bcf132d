//! Identity and deep equality.

use std::ops::RangeInclusive;

use vouch_equality::{DiffBuilder, MatchersUtil};
use vouch_value::{EngineResult, Value};

use super::arg;
use crate::matcher::Matcher;
use crate::result::MatcherResult;

const DEEP_EQUALITY_TIP: &str =
    " Tip: To check for deep equality, use .to_equal() instead of .to_be().";

/// `to_be(expected)`: identity as defined by `Value::same_value`.
pub struct ToBe;

impl Matcher for ToBe {
    fn name(&self) -> &str {
        "to_be"
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
        if actual.same_value(&expected) {
            return Ok(MatcherResult::new(true));
        }
        let mut message =
            util.build_failure_message(self.name(), false, actual, std::slice::from_ref(&expected));
        if util.equals(actual, &expected) {
            message.push_str(DEEP_EQUALITY_TIP);
        }
        Ok(MatcherResult::with_message(false, message))
    }
}

/// `to_equal(expected)`: deep equality; the failure message is the diff.
pub struct ToEqual;

impl Matcher for ToEqual {
    fn name(&self) -> &str {
        "to_equal"
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
        let mut diff = DiffBuilder::new(util.printer().clone());
        if util.equals_with_diff(actual, &expected, &mut diff) {
            Ok(MatcherResult::new(true))
        } else {
            Ok(MatcherResult::with_message(false, diff.get_message()))
        }
    }
}
