//! Runtime values for the expectation engine.
//!
//! # Sharing Semantics
//!
//! Primitives are stored inline. Containers are `Shared<T>`: a clone of an
//! `Array`/`Object`/`Map`/`Set` aliases the same storage, so a spy holding a
//! clone of an argument sees later mutation of it. Use [`Value::deep_copy`]
//! to snapshot a structure.
//!
//! ## Correct Usage
//!
//! ```text
//! let s = Value::string("hello");                     // OK
//! let arr = Value::array(vec![Value::from(1)]);        // OK
//! let obj = Value::object([("x", Value::from(1))]);    // OK
//! ```
//!
//! ## Prevented (Won't Compile)
//!
//! ```text
//! let s = Value::Str(Heap::new(...));    // ERROR: Heap::new is pub(crate)
//! ```
//!
//! # Thread Safety
//!
//! Every heap type is `Arc`-backed and every mutable container is guarded by a
//! `parking_lot::RwLock`, so `Value` is `Send + Sync`.

mod asymmetric;
mod class;
mod function;
mod heap;
mod promise;

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use rustc_hash::FxHashMap;

pub use asymmetric::{AsymmetricMatcher, AsymmetricValue, ValueEquality};
pub use class::{Class, ErrorValue};
pub use function::{CallResult, Callable, FunctionValue, NativeFunction, Thrown};
pub use heap::{Heap, Shared};
pub use promise::{Promise, Settlement};

use crate::pretty::{format_number, PrettyPrinter};
use crate::stack::ensure_sufficient_stack;

/// Storage of an object: optional class plus own keys.
#[derive(Clone, Default)]
pub struct ObjectData {
    /// Constructor; `None` for plain objects.
    pub class: Option<Class>,
    /// Own enumerable properties.
    pub fields: BTreeMap<String, Value>,
    /// Accessor properties. They take no part in equality, printing or
    /// size, only in [`Value::get`] and [`Value::set_field`].
    pub accessors: BTreeMap<String, Accessor>,
}

/// Getter/setter pair behind an accessor property.
#[derive(Clone, Default)]
pub struct Accessor {
    /// Called with the object as receiver and no arguments.
    pub get: Option<FunctionValue>,
    /// Called with the object as receiver and the assigned value.
    pub set: Option<FunctionValue>,
}

/// Dynamic value.
#[derive(Clone)]
pub enum Value {
    // Primitives (inline, no heap allocation)
    /// Absent value.
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value (IEEE double, `NaN`/`-0` included).
    Number(f64),
    /// String value.
    Str(Heap<String>),

    // Mutable containers (shared by reference)
    /// Ordered sequence.
    Array(Shared<Vec<Value>>),
    /// Key/value record with optional class.
    Object(Shared<ObjectData>),
    /// Insertion-ordered mapping with arbitrary keys.
    Map(Shared<Vec<(Value, Value)>>),
    /// Insertion-ordered unique values.
    Set(Shared<Vec<Value>>),

    // Opaque references
    /// Callable (plain function or spy).
    Function(FunctionValue),
    /// Constructor, used for instance-of checks.
    Class(Class),
    /// Error with class and message.
    Error(ErrorValue),
    /// Regular expression.
    Regex(Heap<Regex>),
    /// Settlement cell.
    Promise(Promise),
    /// Pattern standing in for an expected value.
    Asymmetric(AsymmetricValue),
}

// Factory Methods (ONLY way to construct heap values)

impl Value {
    /// Create a numeric value.
    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Create an array value.
    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    /// Create a plain object.
    ///
    /// ```text
    /// let point = Value::object([("x", Value::from(1)), ("y", Value::from(2))]);
    /// ```
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Shared::new(ObjectData {
            class: None,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            accessors: BTreeMap::new(),
        }))
    }

    /// Create an instance of `class`.
    pub fn instance<K: Into<String>>(
        class: &Class,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Value::Object(Shared::new(ObjectData {
            class: Some(class.clone()),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            accessors: BTreeMap::new(),
        }))
    }

    /// Create a map; later duplicate keys replace earlier ones.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match out.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }
        Value::Map(Shared::new(out))
    }

    /// Create a set; duplicates are dropped.
    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for value in values {
            if !out.iter().any(|v| v.same_value_zero(&value)) {
                out.push(value);
            }
        }
        Value::Set(Shared::new(out))
    }

    /// Create a function value from a closure.
    ///
    /// ```text
    /// let add = Value::function("add", |_this, args| {
    ///     Ok(Value::from(args[0].as_number().unwrap_or(0.0) + 1.0))
    /// });
    /// ```
    pub fn function(
        name: impl Into<String>,
        body: impl Fn(&Value, &[Value]) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        Value::Function(FunctionValue::new(NativeFunction::new(name, body)))
    }

    /// Create a plain `Error`.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(ErrorValue::new(Class::error(), message.into()))
    }

    /// Create an error of a specific class.
    pub fn error_of(class: &Class, message: impl Into<String>) -> Self {
        Value::Error(ErrorValue::new(class.clone(), message.into()))
    }

    /// Compile a regular expression value.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(|re| Value::Regex(Heap::new(re)))
    }

    /// Wrap an already-compiled regular expression.
    pub fn from_regex(re: Regex) -> Self {
        Value::Regex(Heap::new(re))
    }

    /// Wrap an asymmetric matcher.
    pub fn asymmetric(matcher: impl AsymmetricMatcher) -> Self {
        Value::Asymmetric(AsymmetricValue::new(matcher))
    }
}

// Value Methods

impl Value {
    /// Truthiness: `false`, `0`, `-0`, `NaN`, `""`, `null` and `undefined` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Value::Regex(re) => Some(re),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            Value::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Snapshot of an array's items.
    pub fn array_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items.read().clone()),
            _ => None,
        }
    }

    /// Read an object property. A throwing getter reads as `None`; see
    /// [`Value::try_get`].
    pub fn get(&self, key: &str) -> Option<Value> {
        self.try_get(key).ok().flatten()
    }

    /// Read an object property, running its getter if it is an accessor.
    pub fn try_get(&self, key: &str) -> Result<Option<Value>, Thrown> {
        let Value::Object(obj) = self else {
            return Ok(None);
        };
        let getter = {
            let data = obj.read();
            if let Some(value) = data.fields.get(key) {
                return Ok(Some(value.clone()));
            }
            match data.accessors.get(key) {
                Some(accessor) => accessor.get.clone(),
                None => return Ok(None),
            }
        };
        match getter {
            Some(get) => get.call(self, &[]).map(Some),
            None => Ok(Some(Value::Undefined)),
        }
    }

    /// Write an object property. Returns `false` for non-objects, for
    /// accessors without a setter, and when the setter throws.
    pub fn set_field(&self, key: impl Into<String>, value: Value) -> bool {
        self.try_set(key, value).unwrap_or(false)
    }

    /// Write an object property, running its setter if it is an accessor.
    pub fn try_set(&self, key: impl Into<String>, value: Value) -> Result<bool, Thrown> {
        let Value::Object(obj) = self else {
            return Ok(false);
        };
        let key = key.into();
        let setter = {
            let mut data = obj.write();
            if !data.accessors.contains_key(&key) {
                data.fields.insert(key, value);
                return Ok(true);
            }
            data.accessors.get(&key).and_then(|accessor| accessor.set.clone())
        };
        match setter {
            Some(set) => set.call(self, &[value]).map(|_| true),
            None => Ok(false),
        }
    }

    /// Turn `key` into an accessor property, replacing any plain field of
    /// that name. Returns `false` for non-objects.
    pub fn define_accessor(&self, key: impl Into<String>, accessor: Accessor) -> bool {
        match self {
            Value::Object(obj) => {
                let key = key.into();
                let mut data = obj.write();
                data.fields.remove(&key);
                data.accessors.insert(key, accessor);
                true
            }
            _ => false,
        }
    }

    /// The accessor behind `key`, if it is one.
    pub fn accessor(&self, key: &str) -> Option<Accessor> {
        match self {
            Value::Object(obj) => obj.read().accessors.get(key).cloned(),
            _ => None,
        }
    }

    /// Append to an array. Returns `false` for non-arrays.
    pub fn push(&self, value: Value) -> bool {
        match self {
            Value::Array(items) => {
                items.write().push(value);
                true
            }
            _ => false,
        }
    }

    /// Class of an object or error.
    pub fn class(&self) -> Option<Class> {
        match self {
            Value::Object(obj) => obj.read().class.clone(),
            Value::Error(e) => Some(e.class().clone()),
            _ => None,
        }
    }

    /// Whether this is an instance of `class` (objects and errors).
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class().is_some_and(|c| c.is_subclass_of(class))
    }

    /// Length of strings (in chars), arrays, maps, sets and objects (own keys).
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Array(items) | Value::Set(items) => Some(items.read().len()),
            Value::Map(entries) => Some(entries.read().len()),
            Value::Object(obj) => Some(obj.read().fields.len()),
            _ => None,
        }
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::Object(obj) => obj
                .read()
                .class
                .as_ref()
                .map_or_else(|| "Object".to_string(), |c| c.name().to_string()),
            Value::Map(_) => "Map".to_string(),
            Value::Set(_) => "Set".to_string(),
            Value::Function(_) => "Function".to_string(),
            Value::Class(_) => "Class".to_string(),
            Value::Error(e) => e.class().name().to_string(),
            Value::Regex(_) => "RegExp".to_string(),
            Value::Promise(_) => "Promise".to_string(),
            Value::Asymmetric(_) => "AsymmetricMatcher".to_string(),
        }
    }

    /// Identity comparison (`to_be`): primitives by value, with `NaN` equal
    /// to itself and `0` distinct from `-0`; everything else by reference.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self.same_reference_or_primitive(other),
        }
    }

    /// Key comparison for maps and sets: like `same_value` but `0 == -0`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            _ => self.same_reference_or_primitive(other),
        }
    }

    fn same_reference_or_primitive(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Array(a), Value::Array(b)) | (Value::Set(a), Value::Set(b)) => {
                Shared::ptr_eq(a, b)
            }
            (Value::Object(a), Value::Object(b)) => Shared::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Shared::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Class(a), Value::Class(b)) => a.same(b),
            (Value::Error(a), Value::Error(b)) => a.same(b),
            (Value::Regex(a), Value::Regex(b)) => Heap::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => a.same(b),
            (Value::Asymmetric(a), Value::Asymmetric(b)) => a.same(b),
            _ => false,
        }
    }

    /// Address of the container storage, for cycle tracking.
    pub fn container_addr(&self) -> Option<usize> {
        match self {
            Value::Array(s) | Value::Set(s) => Some(s.addr()),
            Value::Object(s) => Some(s.addr()),
            Value::Map(s) => Some(s.addr()),
            _ => None,
        }
    }

    /// Independent copy of every nested container.
    ///
    /// Shared sub-structures stay shared within the copy and cycles are
    /// preserved; functions, errors, promises and other opaque references
    /// are kept as-is.
    pub fn deep_copy(&self) -> Value {
        let mut copies: FxHashMap<usize, Value> = FxHashMap::default();
        self.deep_copy_with(&mut copies)
    }

    fn deep_copy_with(&self, copies: &mut FxHashMap<usize, Value>) -> Value {
        if let Some(addr) = self.container_addr() {
            if let Some(copy) = copies.get(&addr) {
                return copy.clone();
            }
        }
        ensure_sufficient_stack(|| match self {
            Value::Array(items) => {
                let copy = Shared::new(Vec::new());
                copies.insert(self.container_addr().unwrap_or_default(), Value::Array(copy.clone()));
                let snapshot = items.read().clone();
                let copied: Vec<Value> = snapshot.iter().map(|v| v.deep_copy_with(copies)).collect();
                *copy.write() = copied;
                Value::Array(copy)
            }
            Value::Set(items) => {
                let copy = Shared::new(Vec::new());
                copies.insert(self.container_addr().unwrap_or_default(), Value::Set(copy.clone()));
                let snapshot = items.read().clone();
                let copied: Vec<Value> = snapshot.iter().map(|v| v.deep_copy_with(copies)).collect();
                *copy.write() = copied;
                Value::Set(copy)
            }
            Value::Map(entries) => {
                let copy = Shared::new(Vec::new());
                copies.insert(self.container_addr().unwrap_or_default(), Value::Map(copy.clone()));
                let snapshot = entries.read().clone();
                let copied: Vec<(Value, Value)> = snapshot
                    .iter()
                    .map(|(k, v)| (k.deep_copy_with(copies), v.deep_copy_with(copies)))
                    .collect();
                *copy.write() = copied;
                Value::Map(copy)
            }
            Value::Object(obj) => {
                let snapshot = obj.read().clone();
                let copy = Shared::new(ObjectData {
                    class: snapshot.class.clone(),
                    fields: BTreeMap::new(),
                    accessors: snapshot.accessors.clone(),
                });
                copies.insert(self.container_addr().unwrap_or_default(), Value::Object(copy.clone()));
                let fields: BTreeMap<String, Value> = snapshot
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_with(copies)))
                    .collect();
                copy.write().fields = fields;
                Value::Object(copy)
            }
            other => other.clone(),
        })
    }
}

// Conversions

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<FunctionValue> for Value {
    fn from(f: FunctionValue) -> Self {
        Value::Function(f)
    }
}

impl From<Class> for Value {
    fn from(c: Class) -> Self {
        Value::Class(c)
    }
}

impl From<Promise> for Value {
    fn from(p: Promise) -> Self {
        Value::Promise(p)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Undefined, Into::into)
    }
}

// Trait Implementations

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PrettyPrinter::default().pp(self))
    }
}

/// String conversion (`String(value)` semantics): strings print raw.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if *n == 0.0 => write!(f, "0"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", &**s),
            Value::Array(_) => write!(f, "{}", join_array(self, &mut Vec::new())),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Map(_) => write!(f, "[object Map]"),
            Value::Set(_) => write!(f, "[object Set]"),
            Value::Function(func) => write!(f, "function {}", func.name()),
            Value::Class(c) => write!(f, "class {}", c.name()),
            Value::Error(e) => write!(f, "{e}"),
            Value::Regex(re) => write!(f, "/{}/", re.as_str()),
            Value::Promise(_) => write!(f, "[object Promise]"),
            Value::Asymmetric(m) => write!(f, "{}", m.describe(&PrettyPrinter::default())),
        }
    }
}

/// `Array.prototype.join(",")`; nullish items and cycles print empty.
fn join_array(value: &Value, seen: &mut Vec<usize>) -> String {
    let Value::Array(items) = value else {
        return value.to_string();
    };
    if seen.contains(&items.addr()) {
        return String::new();
    }
    seen.push(items.addr());
    let snapshot = items.read().clone();
    let parts: Vec<String> = snapshot
        .iter()
        .map(|item| match item {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(_) => join_array(item, seen),
            other => other.to_string(),
        })
        .collect();
    seen.pop();
    parts.join(",")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
