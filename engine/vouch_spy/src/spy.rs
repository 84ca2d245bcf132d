//! The spy handle.
//!
//! A [`Spy`] is a cheap, cloneable handle. Wrapped in a `Value` (via
//! [`Spy::as_value`]) it is callable like any other function; matchers get
//! the handle back with [`Spy::from_value`].
//!
//! # Invocation
//!
//! ```text
//! 1. take the next run-wide invocation ordinal
//! 2. append a CallRecord (before any strategy runs)
//! 3. pick the pipeline: first configured argument scope whose tuple
//!    equals the arguments, otherwise the default pipeline
//! 4. plan under the pipeline lock, run the plan after releasing it
//! 5. store the return value in the record (unless the call threw)
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use vouch_equality::MatchersUtil;
use vouch_value::{CallResult, Callable, FunctionValue, NativeFunction, Thrown, Value};

use crate::calls::CallTracker;
use crate::strategy::{execute, Pipeline, Strategy};

type SharedPipeline = Arc<Mutex<Pipeline>>;

struct SpyState {
    name: String,
    original: Option<FunctionValue>,
    default: SharedPipeline,
    scoped: Mutex<Vec<(Vec<Value>, SharedPipeline)>>,
    calls: CallTracker,
    equality: MatchersUtil,
    ordinal: Arc<AtomicU64>,
}

/// Instrumented callable.
#[derive(Clone)]
pub struct Spy(Arc<SpyState>);

impl Spy {
    pub(crate) fn new(
        name: impl Into<String>,
        original: Option<FunctionValue>,
        equality: MatchersUtil,
        ordinal: Arc<AtomicU64>,
    ) -> Self {
        Spy(Arc::new(SpyState {
            name: name.into(),
            original,
            default: SharedPipeline::default(),
            scoped: Mutex::new(Vec::new()),
            calls: CallTracker::default(),
            equality,
            ordinal,
        }))
    }

    /// Recover a spy from a function value.
    pub fn from_value(value: &Value) -> Option<Spy> {
        value.as_function()?.downcast::<Spy>().cloned()
    }

    /// Callable value invoking this spy.
    pub fn as_value(&self) -> Value {
        Value::Function(FunctionValue::new(self.clone()))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Function the spy stands in for, if any.
    pub fn original(&self) -> Option<&FunctionValue> {
        self.0.original.as_ref()
    }

    pub fn calls(&self) -> &CallTracker {
        &self.0.calls
    }

    /// Configure the default response.
    pub fn and(&self) -> SpyStrategy {
        SpyStrategy {
            spy: self.clone(),
            pipeline: Arc::clone(&self.0.default),
        }
    }

    /// Configure the response for calls whose arguments equal `args`.
    ///
    /// Arguments are compared with deep equality, so asymmetric matchers
    /// may stand in for concrete values.
    pub fn with_args(&self, args: Vec<Value>) -> SpyStrategy {
        let mut scoped = self.0.scoped.lock();
        let expected = Value::array(args.clone());
        let existing = scoped.iter().position(|(scope, _)| {
            self.0
                .equality
                .equals(&Value::array(scope.clone()), &expected)
        });
        let pipeline = match existing {
            Some(i) => Arc::clone(&scoped[i].1),
            None => {
                let pipeline = SharedPipeline::default();
                scoped.push((args, Arc::clone(&pipeline)));
                pipeline
            }
        };
        SpyStrategy {
            spy: self.clone(),
            pipeline,
        }
    }

    /// Call with no receiver.
    pub fn invoke(&self, args: &[Value]) -> CallResult {
        self.call(&Value::Undefined, args)
    }

    fn pipeline_for(&self, args: &[Value]) -> SharedPipeline {
        let scoped = self.0.scoped.lock().clone();
        if scoped.is_empty() {
            return Arc::clone(&self.0.default);
        }
        let actual = Value::array(args.to_vec());
        scoped
            .into_iter()
            .find(|(scope, pipeline)| {
                pipeline.lock().is_configured()
                    && self
                        .0
                        .equality
                        .equals(&actual, &Value::array(scope.clone()))
            })
            .map_or_else(|| Arc::clone(&self.0.default), |(_, pipeline)| pipeline)
    }

    /// Whether both handles refer to the same spy.
    pub fn same(&self, other: &Spy) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Callable for Spy {
    fn call(&self, this: &Value, args: &[Value]) -> CallResult {
        let order = self.0.ordinal.fetch_add(1, Ordering::Relaxed);
        let index = self.0.calls.track(this, args, order);
        tracing::trace!(spy = %self.0.name, order, args = args.len(), "spy invoked");

        let actions = self.pipeline_for(args).lock().plan();
        let result = execute(&actions, self.0.original.as_ref(), this, args);
        if let Ok(value) = &result {
            self.0.calls.set_return_value(index, value.clone());
        }
        result
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn describe(&self) -> String {
        format!("spy on {}", self.0.name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<&Spy> for Value {
    fn from(spy: &Spy) -> Self {
        spy.as_value()
    }
}

impl From<Spy> for Value {
    fn from(spy: Spy) -> Self {
        spy.as_value()
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("name", &self.0.name)
            .field("calls", &self.0.calls.count())
            .finish_non_exhaustive()
    }
}

/// Configuration handle for one pipeline of a spy (`spy.and()`).
///
/// Every configuring method appends a stage and returns the handle, so
/// stages can be listed in order:
///
/// ```text
/// spy.and().call_through().call_fake(fake);
/// ```
#[derive(Clone)]
pub struct SpyStrategy {
    spy: Spy,
    pipeline: SharedPipeline,
}

impl SpyStrategy {
    fn stage(&self, strategy: Strategy) -> &Self {
        self.pipeline.lock().push(strategy);
        self
    }

    /// Name of the spy being configured.
    pub fn identity(&self) -> &str {
        self.spy.name()
    }

    pub fn call_through(&self) -> &Self {
        self.stage(Strategy::CallThrough)
    }

    pub fn return_value(&self, value: impl Into<Value>) -> &Self {
        self.stage(Strategy::ReturnValue(value.into()))
    }

    pub fn return_values(&self, values: Vec<Value>) -> &Self {
        self.stage(Strategy::ReturnValues(values))
    }

    pub fn call_fake(&self, fake: FunctionValue) -> &Self {
        self.stage(Strategy::CallFake(fake))
    }

    /// `call_fake` with a closure.
    pub fn call_fake_fn(
        &self,
        fake: impl Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    ) -> &Self {
        let name = format!("fake for {}", self.spy.name());
        self.call_fake(FunctionValue::new(NativeFunction::new(name, fake)))
    }

    /// Throw an `Error` with `message`.
    pub fn throw_error(&self, message: impl Into<String>) -> &Self {
        self.stage(Strategy::Throw(Value::error(message)))
    }

    /// Throw an arbitrary value.
    pub fn throw_value(&self, value: Value) -> &Self {
        self.stage(Strategy::Throw(value))
    }

    pub fn resolve_to(&self, value: impl Into<Value>) -> &Self {
        self.stage(Strategy::ResolveTo(value.into()))
    }

    pub fn reject_with(&self, reason: impl Into<Value>) -> &Self {
        self.stage(Strategy::RejectWith(reason.into()))
    }

    /// Drop every stage: record only, return `undefined`.
    pub fn stub(&self) -> &Self {
        self.pipeline.lock().clear();
        self
    }

    /// Run the configured response without recording a call.
    pub fn exec(&self, this: &Value, args: &[Value]) -> Result<Value, Thrown> {
        let actions = self.pipeline.lock().plan();
        execute(&actions, self.spy.original(), this, args)
    }

    pub fn is_configured(&self) -> bool {
        self.pipeline.lock().is_configured()
    }

    /// Configured stages, in order.
    pub fn strategies(&self) -> Vec<Strategy> {
        self.pipeline.lock().strategies()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
