//! Matchers over spy call records.

use std::ops::RangeInclusive;

use vouch_equality::{DiffBuilder, MatchersUtil};
use vouch_spy::Spy;
use vouch_value::{invalid_matcher_usage, EngineResult, Value};

use super::{arg, number_arg, outcome};
use crate::matcher::Matcher;
use crate::result::MatcherResult;

fn spy_of(matcher: &str, util: &MatchersUtil, value: &Value) -> EngineResult<Spy> {
    Spy::from_value(value).ok_or_else(|| {
        invalid_matcher_usage(
            matcher,
            format!("Expected a spy, but got {}.", util.pp(value)),
        )
    })
}

/// `once`, `twice`, `3 times`.
fn times(n: usize) -> String {
    match n {
        1 => "once".to_string(),
        2 => "twice".to_string(),
        n => format!("{n} times"),
    }
}

/// Argument lists, one indented line each.
fn call_lines(util: &MatchersUtil, calls: &[Vec<Value>]) -> String {
    calls
        .iter()
        .map(|args| format!("  {}", util.pp(&Value::array(args.clone()))))
        .collect::<Vec<_>>()
        .join(",\n")
}

pub struct ToHaveBeenCalled;

impl Matcher for ToHaveBeenCalled {
    fn name(&self) -> &str {
        "to_have_been_called"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        _expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let spy = spy_of(self.name(), util, actual)?;
        let pass = spy.calls().any();
        Ok(outcome(pass, |not| {
            format!("Expected spy {}{not} to have been called.", spy.name())
        }))
    }
}

pub struct ToHaveBeenCalledTimes;

impl Matcher for ToHaveBeenCalledTimes {
    fn name(&self) -> &str {
        "to_have_been_called_times"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let spy = spy_of(self.name(), util, actual)?;
        let wanted = number_arg(self.name(), util, &arg(expected, 0), "the call count")?;
        if wanted < 0.0 || wanted.fract() != 0.0 {
            return Err(invalid_matcher_usage(
                self.name(),
                format!(
                    "expected a non-negative whole number of calls, but got {}",
                    util.pp(&arg(expected, 0))
                ),
            ));
        }
        let wanted = wanted as usize;
        let count = spy.calls().count();
        Ok(outcome(count == wanted, |not| {
            format!(
                "Expected spy {}{not} to have been called {}. It was called {}.",
                spy.name(),
                times(wanted),
                times(count)
            )
        }))
    }
}

/// `to_have_been_called_with(args...)`: some call's arguments deep-equal the
/// expected tuple.
pub struct ToHaveBeenCalledWith;

impl Matcher for ToHaveBeenCalledWith {
    fn name(&self) -> &str {
        "to_have_been_called_with"
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let spy = spy_of(self.name(), util, actual)?;
        let wanted = Value::array(expected.to_vec());
        let all_args = spy.calls().all_args();

        if all_args
            .iter()
            .any(|args| util.equals(&Value::array(args.clone()), &wanted))
        {
            return Ok(MatcherResult::with_message(
                true,
                format!(
                    "Expected spy {} not to have been called with:\n  {}\nbut it was.",
                    spy.name(),
                    util.pp(&wanted)
                ),
            ));
        }

        let mut message = format!(
            "Expected spy {} to have been called with:\n  {}\n",
            spy.name(),
            util.pp(&wanted)
        );
        if all_args.is_empty() {
            message.push_str("but it was never called.");
            return Ok(MatcherResult::with_message(false, message));
        }
        message.push_str(&format!(
            "but actual calls were:\n{}.\n",
            call_lines(util, &all_args)
        ));
        for (i, args) in all_args.iter().enumerate() {
            let mut diff = DiffBuilder::new(util.printer().clone());
            util.equals_with_diff(&Value::array(args.clone()), &wanted, &mut diff);
            message.push_str(&format!(
                "\nCall {i}:\n  {}",
                diff.get_message().replace('\n', "\n  ")
            ));
        }
        Ok(MatcherResult::with_message(false, message))
    }
}

/// `to_have_been_called_once_with(args...)`: exactly one call, with these
/// arguments.
pub struct ToHaveBeenCalledOnceWith;

impl Matcher for ToHaveBeenCalledOnceWith {
    fn name(&self) -> &str {
        "to_have_been_called_once_with"
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let spy = spy_of(self.name(), util, actual)?;
        let wanted = Value::array(expected.to_vec());
        let all_args = spy.calls().all_args();

        if let [only] = all_args.as_slice() {
            if util.equals(&Value::array(only.clone()), &wanted) {
                return Ok(MatcherResult::with_message(
                    true,
                    format!(
                        "Expected spy {} to have been called 0 times, multiple times, or once, \
                         but with arguments different from:\n  {}\nBut the actual call was:\n{}.",
                        spy.name(),
                        util.pp(&wanted),
                        call_lines(util, &all_args)
                    ),
                ));
            }
        }

        let mut message = format!(
            "Expected spy {} to have been called only once, and with given args:\n  {}\n",
            spy.name(),
            util.pp(&wanted)
        );
        if all_args.is_empty() {
            message.push_str("But it was never called.");
        } else {
            message.push_str(&format!(
                "But the actual calls were:\n{}.",
                call_lines(util, &all_args)
            ));
        }
        Ok(MatcherResult::with_message(false, message))
    }
}

/// `to_have_been_called_before(other)`: every call of the actual spy
/// precedes every call of `other`.
pub struct ToHaveBeenCalledBefore;

impl Matcher for ToHaveBeenCalledBefore {
    fn name(&self) -> &str {
        "to_have_been_called_before"
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
        let first = spy_of(self.name(), util, actual)?;
        let latter = spy_of(self.name(), util, &arg(expected, 0))?;

        let (Some(first_call), Some(first_latest)) =
            (first.calls().first(), first.calls().most_recent())
        else {
            return Ok(MatcherResult::with_message(
                false,
                format!("Expected spy {} to have been called.", first.name()),
            ));
        };
        let (Some(latter_first), Some(latter_latest)) =
            (latter.calls().first(), latter.calls().most_recent())
        else {
            return Ok(MatcherResult::with_message(
                false,
                format!("Expected spy {} to have been called.", latter.name()),
            ));
        };

        if first_latest.invocation_order < latter_first.invocation_order {
            return Ok(MatcherResult::with_message(
                true,
                format!(
                    "Expected spy {} to not have been called before spy {}, but it was.",
                    first.name(),
                    latter.name()
                ),
            ));
        }

        let message = if first_call.invocation_order < latter_first.invocation_order {
            format!(
                "Expected latest call to spy {} to have been called before first call to spy {} \
                 (no interleaved calls).",
                first.name(),
                latter.name()
            )
        } else if latter_latest.invocation_order > first_call.invocation_order {
            format!(
                "Expected first call to spy {} to have been called after first call to spy {}.",
                latter.name(),
                first.name()
            )
        } else {
            format!(
                "Expected spy {} to have been called after spy {}.",
                latter.name(),
                first.name()
            )
        };
        Ok(MatcherResult::with_message(false, message))
    }
}

/// `to_have_spy_interactions()`: some spy stored on the actual object has
/// been called.
pub struct ToHaveSpyInteractions;

impl Matcher for ToHaveSpyInteractions {
    fn name(&self) -> &str {
        "to_have_spy_interactions"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    fn compare(
        &self,
        util: &MatchersUtil,
        actual: &Value,
        _expected: &[Value],
    ) -> EngineResult<MatcherResult> {
        let Value::Object(object) = actual else {
            return Err(invalid_matcher_usage(
                self.name(),
                format!("Expected a spy object, but got {}.", util.pp(actual)),
            ));
        };
        let spies: Vec<Spy> = object
            .read()
            .fields
            .values()
            .filter_map(Spy::from_value)
            .collect();
        if spies.is_empty() {
            return Err(invalid_matcher_usage(
                self.name(),
                "Expected a spy object with spies, but the object has no spies.",
            ));
        }

        let called: Vec<&str> = spies
            .iter()
            .filter(|spy| spy.calls().any())
            .map(Spy::name)
            .collect();
        if called.is_empty() {
            Ok(MatcherResult::with_message(
                false,
                "Expected spy object spies to have been called, but no spies were called.",
            ))
        } else {
            Ok(MatcherResult::with_message(
                true,
                format!(
                    "Expected spy object spies not to have been called, \
                     but the following spies were called: {}.",
                    called.join(", ")
                ),
            ))
        }
    }
}
