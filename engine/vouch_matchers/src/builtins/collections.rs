//! Membership, size and string matching.

use std::borrow::Cow;
use std::ops::RangeInclusive;

use regex::Regex;
use vouch_equality::MatchersUtil;
use vouch_value::{format_number, invalid_matcher_usage, EngineResult, Value};

use super::{arg, number_arg, outcome};
use crate::matcher::Matcher;
use crate::result::MatcherResult;

/// `to_contain(item)`: array and set members by deep equality, substrings
/// of strings.
pub struct ToContain;

impl Matcher for ToContain {
    fn name(&self) -> &str {
        "to_contain"
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
        Ok(MatcherResult::new(util.contains(actual, &arg(expected, 0))))
    }
}

/// `to_have_size(n)` for strings, arrays, maps, sets and objects.
pub struct ToHaveSize;

impl Matcher for ToHaveSize {
    fn name(&self) -> &str {
        "to_have_size"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    #[allow(clippy::cast_precision_loss)]
    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let wanted = number_arg(self.name(), util, &arg(expected, 0), "the size")?;
        let Some(size) = actual.size() else {
            return Err(invalid_matcher_usage(
                self.name(),
                format!("cannot get the size of {}", util.pp(actual)),
            ));
        };
        let pass = size as f64 == wanted;
        Ok(outcome(pass, |not| {
            format!(
                "Expected {} with size {size}{not} to have size {}.",
                util.pp(actual),
                format_number(wanted)
            )
        }))
    }
}

/// `to_match(pattern)`: a string against a regex or a pattern string.
pub struct ToMatch;

impl ToMatch {
    fn pattern<'v>(&self, util: &MatchersUtil, expected: &'v Value) -> EngineResult<Cow<'v, Regex>> {
        if let Some(re) = expected.as_regex() {
            return Ok(Cow::Borrowed(re));
        }
        let Some(source) = expected.as_str() else {
            return Err(invalid_matcher_usage(
                self.name(),
                format!(
                    "expected a string or regex pattern, but got {}",
                    util.pp(expected)
                ),
            ));
        };
        Regex::new(source)
            .map(Cow::Owned)
            .map_err(|e| invalid_matcher_usage(self.name(), format!("invalid pattern: {e}")))
    }
}

impl Matcher for ToMatch {
    fn name(&self) -> &str {
        "to_match"
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
        let re = self.pattern(util, &expected)?;
        let Some(subject) = actual.as_str() else {
            return Err(invalid_matcher_usage(
                self.name(),
                format!("expected a string, but got {}", util.pp(actual)),
            ));
        };
        Ok(MatcherResult::new(re.is_match(subject)))
    }
}
