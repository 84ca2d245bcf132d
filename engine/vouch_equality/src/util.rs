//! `MatchersUtil`: the equality services every matcher shares.

use std::sync::Arc;

use parking_lot::RwLock;
use vouch_value::{PrettyPrinter, Value, ValueEquality};

use crate::diff::DiffBuilder;
use crate::eq::Comparer;

/// User equality hook. `Some(answer)` is definitive; `None` defers.
pub type CustomEqualityTester = Arc<dyn Fn(&Value, &Value) -> Option<bool> + Send + Sync>;

/// Equality, membership and message helpers.
///
/// Clones share the tester list and the printer's formatters, so a tester
/// registered through one handle is seen by every matcher holding a clone.
#[derive(Clone, Default)]
pub struct MatchersUtil {
    testers: Arc<RwLock<Vec<CustomEqualityTester>>>,
    printer: PrettyPrinter,
}

impl MatchersUtil {
    pub fn new(printer: PrettyPrinter) -> Self {
        MatchersUtil {
            testers: Arc::default(),
            printer,
        }
    }

    /// Register a tester; testers are consulted in registration order.
    pub fn add_tester(&self, tester: CustomEqualityTester) {
        self.testers.write().push(tester);
    }

    pub fn clear_testers(&self) {
        self.testers.write().clear();
    }

    pub fn tester_count(&self) -> usize {
        self.testers.read().len()
    }

    pub fn printer(&self) -> &PrettyPrinter {
        &self.printer
    }

    pub fn pp(&self, value: &Value) -> String {
        self.printer.pp(value)
    }

    /// Deep equality.
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        let mut diff = DiffBuilder::new(self.printer.clone());
        self.equals_with_diff(a, b, &mut diff)
    }

    /// Deep equality, recording every mismatch into `diff`.
    ///
    /// The roots of `diff` are set to `a` and `b`.
    pub fn equals_with_diff(&self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        diff.set_roots(a.clone(), b.clone());
        let testers = self.testers.read().clone();
        Comparer::new(self, &testers).eq(a, b, diff)
    }

    /// Membership: arrays and sets by equality, strings by substring.
    pub fn contains(&self, haystack: &Value, needle: &Value) -> bool {
        match haystack {
            Value::Array(items) | Value::Set(items) => {
                let snapshot = items.read().clone();
                snapshot.iter().any(|item| self.equals(item, needle))
            }
            Value::Str(s) => needle.as_str().is_some_and(|n| s.contains(n)),
            _ => false,
        }
    }

    /// Polarity template for matchers without a message of their own.
    ///
    /// ```text
    /// Expected <pp actual>[ not] <matcher name with spaces>[ <pp arg>[, <pp arg>]].
    /// ```
    pub fn build_failure_message(
        &self,
        matcher_name: &str,
        is_not: bool,
        actual: &Value,
        expected: &[Value],
    ) -> String {
        let predicate = humanize(matcher_name);
        let mut message = format!(
            "Expected {}{}{predicate}",
            self.pp(actual),
            if is_not { " not " } else { " " }
        );
        for (i, value) in expected.iter().enumerate() {
            if i > 0 {
                message.push(',');
            }
            message.push(' ');
            message.push_str(&self.pp(value));
        }
        message.push('.');
        message
    }
}

/// `to_have_been_called` -> `to have been called`; camelCase is split too.
fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c == '_' {
            out.push(' ');
        } else if c.is_ascii_uppercase() {
            out.push(' ');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl ValueEquality for MatchersUtil {
    fn equals(&self, a: &Value, b: &Value) -> bool {
        MatchersUtil::equals(self, a, b)
    }

    fn contains(&self, haystack: &Value, needle: &Value) -> bool {
        MatchersUtil::contains(self, haystack, needle)
    }

    fn printer(&self) -> &PrettyPrinter {
        &self.printer
    }
}
