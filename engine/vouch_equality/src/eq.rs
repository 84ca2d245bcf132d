//! Recursive deep-equality algorithm.
//!
//! # Order of Checks
//!
//! ```text
//! 1. custom testers      first Some(answer) wins
//! 2. asymmetric values   either side decides
//! 3. same_value          NaN == NaN, 0 != -0, identical references
//! 4. structure           arrays, objects, maps, sets, errors, regexes
//! ```
//!
//! Cycles are handled with parallel stacks of container addresses: when a
//! container on the left reappears, the pair is equal only if the right side
//! is at the same position of its own stack.

use vouch_value::{ensure_sufficient_stack, Value};

use crate::diff::{DiffBuilder, Rendering};
use crate::util::{CustomEqualityTester, MatchersUtil};

pub(crate) struct Comparer<'a> {
    util: &'a MatchersUtil,
    testers: &'a [CustomEqualityTester],
    a_stack: Vec<usize>,
    b_stack: Vec<usize>,
}

impl<'a> Comparer<'a> {
    pub(crate) fn new(util: &'a MatchersUtil, testers: &'a [CustomEqualityTester]) -> Self {
        Comparer {
            util,
            testers,
            a_stack: Vec::new(),
            b_stack: Vec::new(),
        }
    }

    pub(crate) fn eq(&mut self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        ensure_sufficient_stack(|| self.eq_inner(a, b, diff))
    }

    fn eq_inner(&mut self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        for tester in self.testers {
            if let Some(answer) = tester(a, b) {
                if !answer {
                    diff.record(a.clone(), b.clone(), Rendering::Default);
                }
                return answer;
            }
        }

        if let Some(answer) = self.asymmetric(a, b) {
            if !answer {
                diff.record(a.clone(), b.clone(), Rendering::Default);
            }
            return answer;
        }

        if a.same_value(b) {
            return true;
        }

        match (a, b) {
            (Value::Array(_), Value::Array(_)) => self.guarded(a, b, diff, Self::arrays),
            (Value::Object(_), Value::Object(_)) => self.guarded(a, b, diff, Self::objects),
            (Value::Map(_), Value::Map(_)) => self.guarded(a, b, diff, Self::maps),
            (Value::Set(_), Value::Set(_)) => self.guarded(a, b, diff, Self::sets),
            (Value::Error(x), Value::Error(y)) => {
                let equal = x.class().same(y.class()) && x.message() == y.message();
                if !equal {
                    diff.record(a.clone(), b.clone(), Rendering::Default);
                }
                equal
            }
            (Value::Regex(x), Value::Regex(y)) => {
                let equal = x.as_str() == y.as_str();
                if !equal {
                    diff.record(a.clone(), b.clone(), Rendering::Default);
                }
                equal
            }
            _ => {
                diff.record(a.clone(), b.clone(), Rendering::Default);
                false
            }
        }
    }

    fn asymmetric(&self, a: &Value, b: &Value) -> Option<bool> {
        match (a, b) {
            (Value::Asymmetric(x), Value::Asymmetric(y)) => Some(x.same(y)),
            (_, Value::Asymmetric(matcher)) => Some(matcher.matches(a, self.util)),
            (Value::Asymmetric(matcher), _) => Some(matcher.matches(b, self.util)),
            _ => None,
        }
    }

    /// Cycle bookkeeping around a container comparison.
    fn guarded(
        &mut self,
        a: &Value,
        b: &Value,
        diff: &mut DiffBuilder,
        body: impl FnOnce(&mut Self, &Value, &Value, &mut DiffBuilder) -> bool,
    ) -> bool {
        let (Some(addr_a), Some(addr_b)) = (a.container_addr(), b.container_addr()) else {
            return false;
        };
        if let Some(pos) = self.a_stack.iter().rposition(|addr| *addr == addr_a) {
            return self.b_stack.get(pos) == Some(&addr_b);
        }
        self.a_stack.push(addr_a);
        self.b_stack.push(addr_b);
        let equal = body(self, a, b, diff);
        self.a_stack.pop();
        self.b_stack.pop();
        equal
    }

    /// Equality without reporting, used to pair up map and set members.
    fn quiet_eq(&mut self, a: &Value, b: &Value) -> bool {
        let mut scratch = DiffBuilder::new(self.util.printer().clone());
        self.eq(a, b, &mut scratch)
    }

    #[allow(clippy::cast_precision_loss)]
    fn arrays(&mut self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        let a_items = a.array_items().unwrap_or_default();
        let b_items = b.array_items().unwrap_or_default();
        let mut equal = true;

        if a_items.len() != b_items.len() {
            diff.with_path("length", |d| {
                d.record(
                    Value::from(a_items.len() as f64),
                    Value::from(b_items.len() as f64),
                    Rendering::Default,
                );
            });
            equal = false;
        }

        for i in 0..a_items.len().max(b_items.len()) {
            let element_equal = diff.with_path(i, |d| match (a_items.get(i), b_items.get(i)) {
                (Some(actual), None) => {
                    d.record(actual.clone(), Value::Undefined, Rendering::UnexpectedElement);
                    false
                }
                (actual, Some(expected)) => {
                    let actual = actual.cloned().unwrap_or(Value::Undefined);
                    self.eq(&actual, expected, d)
                }
                (None, None) => true,
            });
            equal &= element_equal;
        }
        equal
    }

    fn objects(&mut self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        let (Value::Object(a_obj), Value::Object(b_obj)) = (a, b) else {
            return false;
        };
        let a_data = a_obj.read().clone();
        let b_data = b_obj.read().clone();

        let same_class = match (&a_data.class, &b_data.class) {
            (None, None) => true,
            (Some(x), Some(y)) => x.same(y),
            _ => false,
        };
        if !same_class {
            diff.record(a.clone(), b.clone(), Rendering::ClassDiffers);
            return false;
        }

        let mut equal = true;
        let same_keys = a_data.fields.len() == b_data.fields.len()
            && a_data.fields.keys().all(|k| b_data.fields.contains_key(k));
        if !same_keys {
            diff.record(a.clone(), b.clone(), Rendering::KeysDiffer);
            equal = false;
        }

        for (key, actual) in &a_data.fields {
            let Some(expected) = b_data.fields.get(key) else {
                continue;
            };
            equal &= diff.with_path(key.as_str(), |d| self.eq(actual, expected, d));
        }
        equal
    }

    fn maps(&mut self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        let (Value::Map(a_entries), Value::Map(b_entries)) = (a, b) else {
            return false;
        };
        let a_entries = a_entries.read().clone();
        let b_entries = b_entries.read().clone();

        let equal = a_entries.len() == b_entries.len()
            && self.entries_within(&a_entries, &b_entries, false)
            && self.entries_within(&b_entries, &a_entries, true);
        if !equal {
            diff.record(a.clone(), b.clone(), Rendering::Default);
        }
        equal
    }

    /// Every entry of `from` has an equal entry in `into`.
    ///
    /// `flipped` keeps the actual side on the left when checking the
    /// expected entries against the actual ones.
    fn entries_within(
        &mut self,
        from: &[(Value, Value)],
        into: &[(Value, Value)],
        flipped: bool,
    ) -> bool {
        'outer: for (fk, fv) in from {
            for (ik, iv) in into {
                let found = if flipped {
                    self.quiet_eq(ik, fk) && self.quiet_eq(iv, fv)
                } else {
                    self.quiet_eq(fk, ik) && self.quiet_eq(fv, iv)
                };
                if found {
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }

    fn sets(&mut self, a: &Value, b: &Value, diff: &mut DiffBuilder) -> bool {
        let (Value::Set(a_items), Value::Set(b_items)) = (a, b) else {
            return false;
        };
        let a_items = a_items.read().clone();
        let b_items = b_items.read().clone();

        let equal = a_items.len() == b_items.len()
            && self.members_within(&a_items, &b_items, false)
            && self.members_within(&b_items, &a_items, true);
        if !equal {
            diff.record(a.clone(), b.clone(), Rendering::Default);
        }
        equal
    }

    fn members_within(&mut self, from: &[Value], into: &[Value], flipped: bool) -> bool {
        'outer: for f in from {
            for i in into {
                let found = if flipped {
                    self.quiet_eq(i, f)
                } else {
                    self.quiet_eq(f, i)
                };
                if found {
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
