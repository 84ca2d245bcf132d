//! Fluent expectations.
//!
//! ```text
//! env.expect(3).not().to_be(4);
//! env.expect(&spy).with_context("after save").to_have_been_called_times(1);
//! ```

use vouch_spy::Spy;
use vouch_value::{Class, FunctionValue, NativeFunction, Value};

use crate::evaluate::Evaluator;
use crate::result::ExpectationResult;

/// An actual value waiting for a matcher.
///
/// `not` and `with_context` derive a new expectation and leave this one
/// untouched. Every terminal call is evaluated, logged and returned.
#[derive(Clone)]
pub struct Expectation<'e> {
    evaluator: &'e Evaluator,
    actual: Value,
    context: Option<String>,
    negated: bool,
}

impl<'e> Expectation<'e> {
    pub(crate) fn new(evaluator: &'e Evaluator, actual: Value) -> Self {
        Expectation {
            evaluator,
            actual,
            context: None,
            negated: false,
        }
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    #[allow(
        clippy::should_implement_trait,
        reason = "reads as `expect(x).not().to_be(y)`"
    )]
    #[must_use]
    pub fn not(&self) -> Expectation<'e> {
        Expectation {
            negated: !self.negated,
            ..self.clone()
        }
    }

    /// Prefix failure messages with `label: `.
    #[must_use]
    pub fn with_context(&self, label: impl Into<String>) -> Expectation<'e> {
        Expectation {
            context: Some(label.into()),
            ..self.clone()
        }
    }

    /// Evaluate any matcher, built-in or custom, by name.
    pub fn to(&self, matcher_name: &str, expected: &[Value]) -> ExpectationResult {
        let result = self
            .evaluator
            .evaluate(matcher_name, &self.actual, expected, self.negated)
            .with_context(self.context.as_deref());
        self.evaluator.record(result)
    }

    pub fn to_be(&self, expected: impl Into<Value>) -> ExpectationResult {
        self.to("to_be", &[expected.into()])
    }

    pub fn to_equal(&self, expected: impl Into<Value>) -> ExpectationResult {
        self.to("to_equal", &[expected.into()])
    }

    pub fn to_be_instance_of(&self, class: &Class) -> ExpectationResult {
        self.to("to_be_instance_of", &[Value::Class(class.clone())])
    }

    pub fn to_be_defined(&self) -> ExpectationResult {
        self.to("to_be_defined", &[])
    }

    pub fn to_be_undefined(&self) -> ExpectationResult {
        self.to("to_be_undefined", &[])
    }

    pub fn to_be_null(&self) -> ExpectationResult {
        self.to("to_be_null", &[])
    }

    pub fn to_be_nan(&self) -> ExpectationResult {
        self.to("to_be_nan", &[])
    }

    pub fn to_be_true(&self) -> ExpectationResult {
        self.to("to_be_true", &[])
    }

    pub fn to_be_false(&self) -> ExpectationResult {
        self.to("to_be_false", &[])
    }

    pub fn to_be_truthy(&self) -> ExpectationResult {
        self.to("to_be_truthy", &[])
    }

    pub fn to_be_falsy(&self) -> ExpectationResult {
        self.to("to_be_falsy", &[])
    }

    pub fn to_be_positive_infinity(&self) -> ExpectationResult {
        self.to("to_be_positive_infinity", &[])
    }

    pub fn to_be_negative_infinity(&self) -> ExpectationResult {
        self.to("to_be_negative_infinity", &[])
    }

    pub fn to_be_greater_than(&self, expected: f64) -> ExpectationResult {
        self.to("to_be_greater_than", &[Value::from(expected)])
    }

    pub fn to_be_greater_than_or_equal(&self, expected: f64) -> ExpectationResult {
        self.to("to_be_greater_than_or_equal", &[Value::from(expected)])
    }

    pub fn to_be_less_than(&self, expected: f64) -> ExpectationResult {
        self.to("to_be_less_than", &[Value::from(expected)])
    }

    pub fn to_be_less_than_or_equal(&self, expected: f64) -> ExpectationResult {
        self.to("to_be_less_than_or_equal", &[Value::from(expected)])
    }

    /// Precision defaults to 2 decimal digits.
    pub fn to_be_close_to(&self, expected: f64, precision: Option<u32>) -> ExpectationResult {
        let mut args = vec![Value::from(expected)];
        if let Some(precision) = precision {
            args.push(Value::from(precision));
        }
        self.to("to_be_close_to", &args)
    }

    pub fn to_contain(&self, item: impl Into<Value>) -> ExpectationResult {
        self.to("to_contain", &[item.into()])
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_have_size(&self, size: usize) -> ExpectationResult {
        self.to("to_have_size", &[Value::from(size as f64)])
    }

    /// `pattern` is a regex value or a pattern string.
    pub fn to_match(&self, pattern: impl Into<Value>) -> ExpectationResult {
        self.to("to_match", &[pattern.into()])
    }

    pub fn to_throw(&self) -> ExpectationResult {
        self.to("to_throw", &[])
    }

    /// Thrown value must deep-equal `expected`.
    pub fn to_throw_value(&self, expected: impl Into<Value>) -> ExpectationResult {
        self.to("to_throw", &[expected.into()])
    }

    /// Any `Error` value.
    pub fn to_throw_error(&self) -> ExpectationResult {
        self.to("to_throw_error", &[])
    }

    /// An `Error` of `class` or a subclass.
    pub fn to_throw_error_of(&self, class: &Class) -> ExpectationResult {
        self.to("to_throw_error", &[Value::Class(class.clone())])
    }

    /// An `Error` whose message equals a string or matches a regex value,
    /// optionally restricted to `class`.
    pub fn to_throw_error_with(
        &self,
        class: Option<&Class>,
        message: impl Into<Value>,
    ) -> ExpectationResult {
        let mut args: Vec<Value> = class.map(|c| Value::Class(c.clone())).into_iter().collect();
        args.push(message.into());
        self.to("to_throw_error", &args)
    }

    pub fn to_throw_matching(
        &self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> ExpectationResult {
        let predicate = NativeFunction::new("predicate", move |_, args| {
            Ok(Value::from(predicate(args.first().unwrap_or(&Value::Undefined))))
        });
        self.to(
            "to_throw_matching",
            &[Value::Function(FunctionValue::new(predicate))],
        )
    }

    pub fn to_have_been_called(&self) -> ExpectationResult {
        self.to("to_have_been_called", &[])
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_have_been_called_times(&self, times: usize) -> ExpectationResult {
        self.to("to_have_been_called_times", &[Value::from(times as f64)])
    }

    pub fn to_have_been_called_with(&self, args: Vec<Value>) -> ExpectationResult {
        self.to("to_have_been_called_with", &args)
    }

    pub fn to_have_been_called_once_with(&self, args: Vec<Value>) -> ExpectationResult {
        self.to("to_have_been_called_once_with", &args)
    }

    pub fn to_have_been_called_before(&self, other: &Spy) -> ExpectationResult {
        self.to("to_have_been_called_before", &[other.as_value()])
    }

    pub fn to_have_spy_interactions(&self) -> ExpectationResult {
        self.to("to_have_spy_interactions", &[])
    }

    pub fn nothing(&self) -> ExpectationResult {
        self.to("nothing", &[])
    }
}
