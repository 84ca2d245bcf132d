//! Asymmetric matcher capability.
//!
//! An asymmetric matcher stands in for an expected value and decides on its
//! own whether a candidate matches (`any(Number)`, `object_containing(..)`).
//! It is stored in a `Value` so it can appear anywhere inside an expected
//! structure; the equality engine checks for this variant before comparing
//! structurally.

use std::fmt;
use std::sync::Arc;

use super::heap::Heap;
use super::Value;
use crate::pretty::PrettyPrinter;

/// Equality services offered to asymmetric matchers.
///
/// Implemented by the equality engine so that matchers such as
/// `array_containing` can compare nested values with the same custom testers
/// and asymmetric rules as the enclosing comparison.
pub trait ValueEquality {
    fn equals(&self, a: &Value, b: &Value) -> bool;

    /// Membership: arrays and sets by equality, strings by substring.
    fn contains(&self, haystack: &Value, needle: &Value) -> bool;

    fn printer(&self) -> &PrettyPrinter;
}

/// A value pattern that matches candidates contextually.
pub trait AsymmetricMatcher: Send + Sync + 'static {
    fn asymmetric_match(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool;

    /// Description used when pretty printing, e.g. `<any(Number)>`.
    fn describe(&self, printer: &PrettyPrinter) -> String;
}

/// Asymmetric matcher held in a `Value`.
#[derive(Clone)]
pub struct AsymmetricValue(Heap<dyn AsymmetricMatcher>);

impl AsymmetricValue {
    pub fn new(matcher: impl AsymmetricMatcher) -> Self {
        let inner: Arc<dyn AsymmetricMatcher> = Arc::new(matcher);
        AsymmetricValue(Heap::from_arc(inner))
    }

    pub fn matches(&self, candidate: &Value, equality: &dyn ValueEquality) -> bool {
        self.0.asymmetric_match(candidate, equality)
    }

    pub fn describe(&self, printer: &PrettyPrinter) -> String {
        self.0.describe(printer)
    }

    #[inline]
    pub fn same(&self, other: &AsymmetricValue) -> bool {
        Heap::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AsymmetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsymmetricValue({})", self.describe(&PrettyPrinter::default()))
    }
}
