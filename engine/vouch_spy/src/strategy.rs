//! Response strategies and their pipeline.
//!
//! A spy's response is configured as an ordered list of stages:
//!
//! ```text
//! [CallThrough, CallFake(f)]      call the original, then f; return f's result
//! [ReturnValue(1), ReturnValue(2)] return 2
//! []                               stub: record only, return undefined
//! ```
//!
//! Only the last stage produces the return value. Earlier `CallThrough` and
//! `CallFake` stages run first, in order, for their side effects; other
//! earlier stages are superseded.

use vouch_value::{CallResult, FunctionValue, Promise, Thrown, Value};

/// One configured response.
#[derive(Clone, Debug)]
pub enum Strategy {
    /// Invoke the original function (`undefined` when there is none).
    CallThrough,
    ReturnValue(Value),
    /// Successive calls return successive values, then `undefined`.
    ReturnValues(Vec<Value>),
    CallFake(FunctionValue),
    Throw(Value),
    /// Return a promise already resolved with the value.
    ResolveTo(Value),
    /// Return a promise already rejected with the value.
    RejectWith(Value),
}

impl Strategy {
    fn runs_for_side_effects(&self) -> bool {
        matches!(self, Strategy::CallThrough | Strategy::CallFake(_))
    }
}

/// What an invocation will do, decided under the pipeline lock and run
/// after it is released so that callbacks may re-enter the spy.
#[derive(Clone, Debug)]
pub(crate) enum Action {
    CallThrough,
    CallFake(FunctionValue),
    Return(Value),
    Throw(Value),
}

impl Action {
    pub(crate) fn run(
        &self,
        original: Option<&FunctionValue>,
        this: &Value,
        args: &[Value],
    ) -> CallResult {
        match self {
            Action::CallThrough => match original {
                Some(f) => f.call(this, args),
                None => Ok(Value::Undefined),
            },
            Action::CallFake(f) => f.call(this, args),
            Action::Return(v) => Ok(v.clone()),
            Action::Throw(v) => Err(Thrown(v.clone())),
        }
    }
}

#[derive(Clone, Debug)]
struct Stage {
    strategy: Strategy,
    /// Next index into `ReturnValues`.
    cursor: usize,
}

/// Ordered strategy stages of one spy (or one argument scope of a spy).
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn push(&mut self, strategy: Strategy) {
        self.stages.push(Stage {
            strategy,
            cursor: 0,
        });
    }

    /// Back to record-only.
    pub fn clear(&mut self) {
        self.stages.clear();
    }

    pub fn is_configured(&self) -> bool {
        !self.stages.is_empty()
    }

    pub fn strategies(&self) -> Vec<Strategy> {
        self.stages.iter().map(|s| s.strategy.clone()).collect()
    }

    /// Resolve the actions for one invocation, advancing value sequences.
    pub(crate) fn plan(&mut self) -> Vec<Action> {
        let Some((last, earlier)) = self.stages.split_last_mut() else {
            return vec![Action::Return(Value::Undefined)];
        };
        let mut actions: Vec<Action> = earlier
            .iter()
            .filter(|stage| stage.strategy.runs_for_side_effects())
            .map(|stage| match &stage.strategy {
                Strategy::CallFake(f) => Action::CallFake(f.clone()),
                _ => Action::CallThrough,
            })
            .collect();
        actions.push(last.terminal());
        actions
    }
}

impl Stage {
    fn terminal(&mut self) -> Action {
        match &self.strategy {
            Strategy::CallThrough => Action::CallThrough,
            Strategy::ReturnValue(v) => Action::Return(v.clone()),
            Strategy::ReturnValues(values) => {
                let next = values.get(self.cursor).cloned().unwrap_or(Value::Undefined);
                self.cursor += 1;
                Action::Return(next)
            }
            Strategy::CallFake(f) => Action::CallFake(f.clone()),
            Strategy::Throw(v) => Action::Throw(v.clone()),
            Strategy::ResolveTo(v) => Action::Return(Value::Promise(Promise::resolved(v.clone()))),
            Strategy::RejectWith(v) => {
                Action::Return(Value::Promise(Promise::rejected(v.clone())))
            }
        }
    }
}

/// Run planned actions; the last one's outcome is the call's outcome.
///
/// A side-effect stage that throws aborts the call with that throw.
pub(crate) fn execute(
    actions: &[Action],
    original: Option<&FunctionValue>,
    this: &Value,
    args: &[Value],
) -> CallResult {
    let Some((last, earlier)) = actions.split_last() else {
        return Ok(Value::Undefined);
    };
    for action in earlier {
        action.run(original, this, args)?;
    }
    last.run(original, this, args)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
