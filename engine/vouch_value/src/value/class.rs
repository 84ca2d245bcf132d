//! Classes and error values.
//!
//! A `Class` is a named constructor with an optional parent. Objects and
//! errors carry one so that instance-of checks (`to_be_instance_of`,
//! `any(SomeClass)`, `to_throw_error(TypeError, ..)`) can walk the chain.
//! Class identity is by allocation: two classes with the same name are
//! different classes.

use std::fmt;
use std::sync::OnceLock;

use super::heap::Heap;

struct ClassInfo {
    name: String,
    parent: Option<Class>,
}

/// A named constructor.
#[derive(Clone)]
pub struct Class(Heap<ClassInfo>);

impl Class {
    /// Create a root class.
    pub fn new(name: impl Into<String>) -> Self {
        Class(Heap::new(ClassInfo {
            name: name.into(),
            parent: None,
        }))
    }

    /// Create a class extending `parent`.
    pub fn extending(name: impl Into<String>, parent: &Class) -> Self {
        Class(Heap::new(ClassInfo {
            name: name.into(),
            parent: Some(parent.clone()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    /// Whether this is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.same(other) {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Identity comparison.
    #[inline]
    pub fn same(&self, other: &Class) -> bool {
        Heap::ptr_eq(&self.0, &other.0)
    }

    /// The built-in `Error` class.
    pub fn error() -> Class {
        static ERROR: OnceLock<Class> = OnceLock::new();
        ERROR.get_or_init(|| Class::new("Error")).clone()
    }

    /// The built-in `TypeError` class.
    pub fn type_error() -> Class {
        static TYPE_ERROR: OnceLock<Class> = OnceLock::new();
        TYPE_ERROR
            .get_or_init(|| Class::extending("TypeError", &Class::error()))
            .clone()
    }

    /// The built-in `RangeError` class.
    pub fn range_error() -> Class {
        static RANGE_ERROR: OnceLock<Class> = OnceLock::new();
        RANGE_ERROR
            .get_or_init(|| Class::extending("RangeError", &Class::error()))
            .clone()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name())
    }
}

struct ErrorData {
    class: Class,
    message: String,
}

/// A thrown-or-thrown-able error: a class plus a message.
#[derive(Clone)]
pub struct ErrorValue(Heap<ErrorData>);

impl ErrorValue {
    pub(crate) fn new(class: Class, message: String) -> Self {
        ErrorValue(Heap::new(ErrorData { class, message }))
    }

    pub fn class(&self) -> &Class {
        &self.0.class
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    /// Identity comparison.
    #[inline]
    pub fn same(&self, other: &ErrorValue) -> bool {
        Heap::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.class().name())
        } else {
            write!(f, "{}: {}", self.class().name(), self.message())
        }
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorValue({self})")
    }
}
