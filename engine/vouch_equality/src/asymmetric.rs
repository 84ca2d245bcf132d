//! Built-in asymmetric matchers.
//!
//! Each constructor returns a `Value` that can be placed anywhere in an
//! expected structure:
//!
//! ```text
//! expect(&user).to_equal(Value::object([
//!     ("id", any(TypeTag::Number)),
//!     ("tags", array_containing(vec!["admin".into()])),
//! ]));
//! ```

use std::fmt;

use regex::Regex;
use vouch_value::{AsymmetricMatcher, Class, PrettyPrinter, Value, ValueEquality};

/// Type accepted by [`any`].
#[derive(Clone, Debug)]
pub enum TypeTag {
    Number,
    String,
    Boolean,
    Function,
    /// Any non-null object, arrays and other containers included.
    Object,
    Array,
    Map,
    Set,
    Error,
    Promise,
    RegExp,
    /// Instances of a user class (subclasses included).
    Class(Class),
}

impl TypeTag {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeTag::Number => matches!(value, Value::Number(_)),
            TypeTag::String => matches!(value, Value::Str(_)),
            TypeTag::Boolean => matches!(value, Value::Bool(_)),
            TypeTag::Function => matches!(value, Value::Function(_) | Value::Class(_)),
            TypeTag::Object => matches!(
                value,
                Value::Array(_)
                    | Value::Object(_)
                    | Value::Map(_)
                    | Value::Set(_)
                    | Value::Error(_)
                    | Value::Regex(_)
                    | Value::Promise(_)
            ),
            TypeTag::Array => matches!(value, Value::Array(_)),
            TypeTag::Map => matches!(value, Value::Map(_)),
            TypeTag::Set => matches!(value, Value::Set(_)),
            TypeTag::Error => matches!(value, Value::Error(_)),
            TypeTag::Promise => matches!(value, Value::Promise(_)),
            TypeTag::RegExp => matches!(value, Value::Regex(_)),
            TypeTag::Class(class) => value.is_instance_of(class),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Number => "Number",
            TypeTag::String => "String",
            TypeTag::Boolean => "Boolean",
            TypeTag::Function => "Function",
            TypeTag::Object => "Object",
            TypeTag::Array => "Array",
            TypeTag::Map => "Map",
            TypeTag::Set => "Set",
            TypeTag::Error => "Error",
            TypeTag::Promise => "Promise",
            TypeTag::RegExp => "RegExp",
            TypeTag::Class(class) => class.name(),
        };
        write!(f, "{name}")
    }
}

struct Any(TypeTag);

impl AsymmetricMatcher for Any {
    fn asymmetric_match(&self, candidate: &Value, _: &dyn ValueEquality) -> bool {
        self.0.accepts(candidate)
    }

    fn describe(&self, _: &PrettyPrinter) -> String {
        format!("<any({})>", self.0)
    }
}

/// Matches any value of the given type.
pub fn any(tag: TypeTag) -> Value {
    Value::asymmetric(Any(tag))
}

struct Anything;

impl AsymmetricMatcher for Anything {
    fn asymmetric_match(&self, candidate: &Value, _: &dyn ValueEquality) -> bool {
        !candidate.is_undefined() && !candidate.is_null()
    }

    fn describe(&self, _: &PrettyPrinter) -> String {
        "<anything>".to_string()
    }
}

/// Matches everything except `undefined` and `null`.
pub fn anything() -> Value {
    Value::asymmetric(Anything)
}

/// Matchers that only look at the candidate.
#[derive(Clone, Copy)]
enum Predicate {
    Truthy,
    Falsy,
    Empty,
    NotEmpty,
}

impl AsymmetricMatcher for Predicate {
    fn asymmetric_match(&self, candidate: &Value, _: &dyn ValueEquality) -> bool {
        match self {
            Predicate::Truthy => candidate.is_truthy(),
            Predicate::Falsy => !candidate.is_truthy(),
            Predicate::Empty => candidate.size() == Some(0),
            Predicate::NotEmpty => candidate.size().is_some_and(|n| n > 0),
        }
    }

    fn describe(&self, _: &PrettyPrinter) -> String {
        match self {
            Predicate::Truthy => "<truthy>",
            Predicate::Falsy => "<falsy>",
            Predicate::Empty => "<empty>",
            Predicate::NotEmpty => "<not_empty>",
        }
        .to_string()
    }
}

pub fn truthy() -> Value {
    Value::asymmetric(Predicate::Truthy)
}

pub fn falsy() -> Value {
    Value::asymmetric(Predicate::Falsy)
}

/// Empty string, array, object, map or set.
pub fn empty() -> Value {
    Value::asymmetric(Predicate::Empty)
}

/// Non-empty string, array, object, map or set.
pub fn not_empty() -> Value {
    Value::asymmetric(Predicate::NotEmpty)
}

struct Is(Value);

impl AsymmetricMatcher for Is {
    fn asymmetric_match(&self, candidate: &Value, _: &dyn ValueEquality) -> bool {
        candidate.same_value(&self.0)
    }

    fn describe(&self, printer: &PrettyPrinter) -> String {
        format!("<is({})>", printer.pp(&self.0))
    }
}

/// Identity match inside a deep comparison.
pub fn is(expected: Value) -> Value {
    Value::asymmetric(Is(expected))
}

struct StringMatching(Regex);

impl AsymmetricMatcher for StringMatching {
    fn asymmetric_match(&self, candidate: &Value, _: &dyn ValueEquality) -> bool {
        candidate.as_str().is_some_and(|s| self.0.is_match(s))
    }

    fn describe(&self, _: &PrettyPrinter) -> String {
        format!("<string_matching(/{}/)>", self.0.as_str())
    }
}

/// Strings matching `pattern`.
pub fn string_matching(pattern: &str) -> Result<Value, regex::Error> {
    Regex::new(pattern).map(string_matching_regex)
}

/// Strings matching an already compiled regex.
pub fn string_matching_regex(re: Regex) -> Value {
    Value::asymmetric(StringMatching(re))
}

struct StringContaining(String);

impl AsymmetricMatcher for StringContaining {
    fn asymmetric_match(&self, candidate: &Value, _: &dyn ValueEquality) -> bool {
        candidate.as_str().is_some_and(|s| s.contains(self.0.as_str()))
    }

    fn describe(&self, _: &PrettyPrinter) -> String {
        format!("<string_containing('{}')>", self.0)
    }
}

/// Strings containing `needle`.
pub fn string_containing(needle: impl Into<String>) -> Value {
    Value::asymmetric(StringContaining(needle.into()))
}

struct ObjectContaining(Value);

impl AsymmetricMatcher for ObjectContaining {
    fn asymmetric_match(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool {
        let (Value::Object(sample), Value::Object(_)) = (&self.0, candidate) else {
            return false;
        };
        let sample = sample.read().fields.clone();
        sample.iter().all(|(key, expected)| {
            candidate
                .get(key)
                .is_some_and(|actual| equality.equals(&actual, expected))
        })
    }

    fn describe(&self, printer: &PrettyPrinter) -> String {
        format!("<object_containing({})>", printer.pp(&self.0))
    }
}

/// Objects having at least the properties of `sample`, compared deeply.
pub fn object_containing(sample: Value) -> Value {
    Value::asymmetric(ObjectContaining(sample))
}

struct ArrayContaining(Vec<Value>);

impl AsymmetricMatcher for ArrayContaining {
    fn asymmetric_match(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool {
        matches!(candidate, Value::Array(_))
            && self.0.iter().all(|item| equality.contains(candidate, item))
    }

    fn describe(&self, printer: &PrettyPrinter) -> String {
        format!("<array_containing({})>", printer.pp(&Value::array(self.0.clone())))
    }
}

/// Arrays containing every item of `sample`, in any order.
pub fn array_containing(sample: Vec<Value>) -> Value {
    Value::asymmetric(ArrayContaining(sample))
}

struct ArrayWithExactContents(Vec<Value>);

impl AsymmetricMatcher for ArrayWithExactContents {
    fn asymmetric_match(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool {
        let Some(items) = candidate.array_items() else {
            return false;
        };
        if items.len() != self.0.len() {
            return false;
        }
        let fits: Vec<Vec<usize>> = self
            .0
            .iter()
            .map(|expected| {
                (0..items.len())
                    .filter(|&i| equality.equals(&items[i], expected))
                    .collect()
            })
            .collect();
        // owner[i] is the sample item currently paired with items[i].
        let mut owner = vec![None; items.len()];
        (0..fits.len()).all(|sample| {
            let mut seen = vec![false; items.len()];
            augment(sample, &fits, &mut owner, &mut seen)
        })
    }

    fn describe(&self, printer: &PrettyPrinter) -> String {
        format!(
            "<array_with_exact_contents({})>",
            printer.pp(&Value::array(self.0.clone()))
        )
    }
}

/// Find an actual item for `sample`, moving earlier pairings along an
/// alternating path when the free choices are used up.
fn augment(
    sample: usize,
    fits: &[Vec<usize>],
    owner: &mut [Option<usize>],
    seen: &mut [bool],
) -> bool {
    for &slot in &fits[sample] {
        if seen[slot] {
            continue;
        }
        seen[slot] = true;
        let free = match owner[slot] {
            None => true,
            Some(other) => augment(other, fits, owner, seen),
        };
        if free {
            owner[slot] = Some(sample);
            return true;
        }
    }
    false
}

/// Arrays with exactly these items in any order; duplicates count.
pub fn array_with_exact_contents(sample: Vec<Value>) -> Value {
    Value::asymmetric(ArrayWithExactContents(sample))
}

struct MapContaining(Vec<(Value, Value)>);

impl AsymmetricMatcher for MapContaining {
    fn asymmetric_match(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool {
        let Value::Map(entries) = candidate else {
            return false;
        };
        let entries = entries.read().clone();
        self.0.iter().all(|(key, value)| {
            entries
                .iter()
                .any(|(k, v)| equality.equals(k, key) && equality.equals(v, value))
        })
    }

    fn describe(&self, printer: &PrettyPrinter) -> String {
        format!("<map_containing({})>", printer.pp(&Value::map(self.0.clone())))
    }
}

/// Maps having at least these entries.
pub fn map_containing(sample: Vec<(Value, Value)>) -> Value {
    Value::asymmetric(MapContaining(sample))
}

struct SetContaining(Vec<Value>);

impl AsymmetricMatcher for SetContaining {
    fn asymmetric_match(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool {
        matches!(candidate, Value::Set(_))
            && self.0.iter().all(|item| equality.contains(candidate, item))
    }

    fn describe(&self, printer: &PrettyPrinter) -> String {
        format!("<set_containing({})>", printer.pp(&Value::set(self.0.clone())))
    }
}

/// Sets having at least these members.
pub fn set_containing(sample: Vec<Value>) -> Value {
    Value::asymmetric(SetContaining(sample))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
