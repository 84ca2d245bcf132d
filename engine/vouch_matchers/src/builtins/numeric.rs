//! Numeric comparisons.
//!
//! Every matcher here has a dedicated negative path: a `NaN` operand fails
//! both `to_be_less_than(x)` and `not.to_be_less_than(x)`.

use std::ops::RangeInclusive;

use vouch_equality::MatchersUtil;
use vouch_value::{EngineResult, Value};

use super::{arg, number_arg};
use crate::matcher::Matcher;
use crate::result::MatcherResult;

/// Ordered comparison of two numbers, false when either is `NaN`.
macro_rules! ordered_matcher {
    ($ty:ident, $name:literal, $op:tt) => {
        pub struct $ty;

        impl $ty {
            fn operands(
                &self,
                util: &MatchersUtil,
                actual: &Value,
                expected: &[Value],
            ) -> EngineResult<(f64, f64)> {
                Ok((
                    number_arg(self.name(), util, actual, "the actual value")?,
                    number_arg(self.name(), util, &arg(expected, 0), "the expected value")?,
                ))
            }
        }

        impl Matcher for $ty {
            fn name(&self) -> &str {
                $name
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
                let (a, e) = self.operands(util, actual, expected)?;
                Ok(MatcherResult::new(a $op e))
            }

            fn negative_compare(
                &self,
                util: &MatchersUtil,
                actual: &Value,
                expected: &[Value],
            ) -> Option<EngineResult<MatcherResult>> {
                Some(self.operands(util, actual, expected).map(|(a, e)| {
                    MatcherResult::new(!a.is_nan() && !e.is_nan() && !(a $op e))
                }))
            }
        }
    };
}

ordered_matcher!(ToBeGreaterThan, "to_be_greater_than", >);
ordered_matcher!(ToBeGreaterThanOrEqual, "to_be_greater_than_or_equal", >=);
ordered_matcher!(ToBeLessThan, "to_be_less_than", <);
ordered_matcher!(ToBeLessThanOrEqual, "to_be_less_than_or_equal", <=);

const DEFAULT_PRECISION: f64 = 2.0;

/// `to_be_close_to(expected, precision = 2)`.
///
/// Passes when `|actual - expected| < 0.5 * 10^-precision`, or when both are
/// the same infinity.
pub struct ToBeCloseTo;

impl ToBeCloseTo {
    /// `None` when an operand is `NaN`: such values are never close or far.
    fn close(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<Option<bool>> {
        let a = number_arg(self.name(), util, actual, "the actual value")?;
        let e = number_arg(self.name(), util, &arg(expected, 0), "the expected value")?;
        let precision = match expected.get(1) {
            Some(p) => number_arg(self.name(), util, p, "the precision")?,
            None => DEFAULT_PRECISION,
        };
        if a.is_nan() || e.is_nan() {
            return Ok(None);
        }
        if a == e {
            return Ok(Some(true));
        }
        if a.is_infinite() || e.is_infinite() {
            return Ok(Some(false));
        }
        Ok(Some((a - e).abs() < 0.5 * 10f64.powf(-precision)))
    }
}

impl Matcher for ToBeCloseTo {
    fn name(&self) -> &str {
        "to_be_close_to"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=2
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let close = self.close(util, actual, expected)?;
        Ok(MatcherResult::new(close == Some(true)))
    }

    fn negative_compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> Option<EngineResult<MatcherResult>> {
        Some(
            self.close(util, actual, expected)
                .map(|close| MatcherResult::new(close == Some(false))),
        )
    }
}
