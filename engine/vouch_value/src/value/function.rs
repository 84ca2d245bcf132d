//! Callable values.
//!
//! Anything invocable with a receiver and arguments implements [`Callable`]:
//! plain closures (via [`NativeFunction`]) and spies alike. A call either
//! returns a value or throws one; throwing is modelled as `Err(Thrown)`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::heap::Heap;
use super::Value;

/// Outcome of invoking a callable.
pub type CallResult = Result<Value, Thrown>;

/// A value thrown out of a call.
#[derive(Clone, Debug)]
pub struct Thrown(pub Value);

impl Thrown {
    /// Throw a plain `Error` with `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Thrown(Value::error(message))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that can be invoked.
pub trait Callable: Send + Sync + 'static {
    /// Invoke with receiver `this`.
    fn call(&self, this: &Value, args: &[Value]) -> CallResult;

    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Pretty-printed form.
    fn describe(&self) -> String {
        format!("Function '{}'", self.name())
    }

    fn as_any(&self) -> &dyn Any;
}

type NativeBody = dyn Fn(&Value, &[Value]) -> CallResult + Send + Sync;

/// A callable backed by a Rust closure.
pub struct NativeFunction {
    name: String,
    body: Box<NativeBody>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            body: Box::new(body),
        }
    }
}

impl Callable for NativeFunction {
    fn call(&self, this: &Value, args: &[Value]) -> CallResult {
        (self.body)(this, args)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Function value.
#[derive(Clone)]
pub struct FunctionValue(Heap<dyn Callable>);

impl FunctionValue {
    pub fn new(callable: impl Callable) -> Self {
        let inner: Arc<dyn Callable> = Arc::new(callable);
        FunctionValue(Heap::from_arc(inner))
    }

    /// Invoke with an explicit receiver.
    pub fn call(&self, this: &Value, args: &[Value]) -> CallResult {
        self.0.call(this, args)
    }

    /// Invoke with no receiver and no arguments.
    pub fn call0(&self) -> CallResult {
        self.0.call(&Value::Undefined, &[])
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn callable(&self) -> &dyn Callable {
        &*self.0
    }

    /// Recover the concrete callable type, e.g. a spy.
    pub fn downcast<T: Callable>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Identity comparison.
    #[inline]
    pub fn same(&self, other: &FunctionValue) -> bool {
        Heap::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionValue({})", self.name())
    }
}
