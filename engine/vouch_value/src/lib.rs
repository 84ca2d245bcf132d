//! Vouch Value - runtime values for the vouch expectation engine.
//!
//! This crate provides:
//! - Dynamic value types (`Value`, `Heap`, `Shared`, `FunctionValue`, `Promise`, etc.)
//! - The pretty printer used by every failure message (`PrettyPrinter`)
//! - Engine error types (`EngineError`, `EngineErrorKind`) and their factories
//! - Stack growth for deeply nested comparisons (`ensure_sufficient_stack`)
//!
//! # Value Model
//!
//! Matchers, spies and the equality engine all operate on `Value`:
//! - Primitives are stored inline
//! - Containers (`Array`, `Object`, `Map`, `Set`) are mutable and shared by
//!   reference, so a clone observes later mutation of the original
//! - Every heap allocation goes through `Value::` factory methods

mod errors;
mod pretty;
mod stack;
mod value;

pub use errors::{
    empty_spy_set, install_conflict, invalid_matcher_usage, invalid_spy_target,
    mismatched_async_type, timeout, unknown_matcher, EngineError, EngineErrorKind, EngineResult,
};
pub use pretty::{format_number, ObjectFormatter, PrettyPrinter, PrintLimits};
pub use stack::ensure_sufficient_stack;
pub use value::{
    Accessor, AsymmetricMatcher, AsymmetricValue, CallResult, Callable, Class, ErrorValue, FunctionValue,
    Heap, NativeFunction, ObjectData, Promise, Settlement, Shared, Thrown, Value, ValueEquality,
};
