//! Pretty printer for failure messages.
//!
//! Renders values the way expectation messages show them:
//!
//! ```text
//! 'str'   1   -0   NaN   undefined   null
//! [ 1, 2 ]   Object({ x: 1 })   Point({ x: 1, y: 2 })
//! Map( [ 'a', 1 ] )   Set( 1, 2 )   Function 'name'   spy on name
//! TypeError: bad   /ab+c/   Promise   <any(Number)>
//! ```
//!
//! Custom object formatters run before the built-in rendering of every
//! value, nested ones included; the first one to return `Some` wins.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// User-supplied rendering hook.
pub type ObjectFormatter = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Output limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrintLimits {
    /// Containers nested deeper than this print as their type name.
    pub max_depth: usize,
    /// Arrays (and sets/maps) longer than this are cut with `...`.
    pub max_array_length: usize,
    /// Total output is cut at this many characters with `...`.
    pub max_chars: usize,
}

impl Default for PrintLimits {
    fn default() -> Self {
        PrintLimits {
            max_depth: 8,
            max_array_length: 50,
            max_chars: 1000,
        }
    }
}

/// Renders values; cheap to clone, formatters are shared between clones.
#[derive(Clone, Default)]
pub struct PrettyPrinter {
    limits: PrintLimits,
    formatters: Arc<RwLock<Vec<ObjectFormatter>>>,
}

impl PrettyPrinter {
    pub fn new(limits: PrintLimits) -> Self {
        PrettyPrinter {
            limits,
            formatters: Arc::default(),
        }
    }

    pub fn limits(&self) -> PrintLimits {
        self.limits
    }

    /// Register a custom formatter; later registrations run after earlier ones.
    pub fn add_formatter(&self, formatter: ObjectFormatter) {
        self.formatters.write().push(formatter);
    }

    pub fn clear_formatters(&self) {
        self.formatters.write().clear();
    }

    /// Render `value`.
    pub fn pp(&self, value: &Value) -> String {
        let formatters = self.formatters.read().clone();
        let mut printer = Printer {
            printer: self,
            formatters: &formatters,
            out: String::new(),
            chars: 0,
            truncated: false,
            seen: Vec::new(),
        };
        printer.format(value);
        if printer.truncated {
            printer.out.push_str("...");
        }
        printer.out
    }
}

/// Number formatting for messages: integers without a fraction, `-0` kept.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        if n.is_sign_negative() { "-0" } else { "0" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

struct Printer<'a> {
    printer: &'a PrettyPrinter,
    formatters: &'a [ObjectFormatter],
    out: String,
    chars: usize,
    truncated: bool,
    /// Containers currently being printed (cycle detection).
    seen: Vec<usize>,
}

impl Printer<'_> {
    fn emit(&mut self, text: &str) {
        if self.truncated {
            return;
        }
        let max = self.printer.limits.max_chars;
        let len = text.chars().count();
        if self.chars + len > max {
            let room = max.saturating_sub(self.chars);
            self.out.extend(text.chars().take(room));
            self.chars = max;
            self.truncated = true;
        } else {
            self.out.push_str(text);
            self.chars += len;
        }
    }

    fn format(&mut self, value: &Value) {
        if self.truncated {
            return;
        }
        for formatter in self.formatters {
            if let Some(text) = formatter(value) {
                self.emit(&text);
                return;
            }
        }
        ensure_sufficient_stack(|| self.format_builtin(value));
    }

    fn format_builtin(&mut self, value: &Value) {
        match value {
            Value::Undefined => self.emit("undefined"),
            Value::Null => self.emit("null"),
            Value::Bool(b) => self.emit(if *b { "true" } else { "false" }),
            Value::Number(n) => self.emit(&format_number(*n)),
            Value::Str(s) => {
                self.emit("'");
                self.emit(s);
                self.emit("'");
            }
            Value::Array(items) => {
                let snapshot = items.read().clone();
                self.container(value, "Array", |p| p.sequence("[ ", &snapshot, " ]"));
            }
            Value::Set(items) => {
                let snapshot = items.read().clone();
                self.container(value, "Set", |p| p.sequence("Set( ", &snapshot, " )"));
            }
            Value::Map(entries) => {
                let snapshot = entries.read().clone();
                self.container(value, "Map", |p| p.entries(&snapshot));
            }
            Value::Object(obj) => {
                let snapshot = obj.read().clone();
                let name = snapshot
                    .class
                    .as_ref()
                    .map_or_else(|| "Object".to_string(), |c| c.name().to_string());
                self.container(value, &name.clone(), |p| {
                    p.emit(&name);
                    p.emit("({ ");
                    for (i, (key, field)) in snapshot.fields.iter().enumerate() {
                        if i > 0 {
                            p.emit(", ");
                        }
                        p.emit(key);
                        p.emit(": ");
                        p.format(field);
                    }
                    p.emit(" })");
                });
            }
            Value::Function(f) => self.emit(&f.callable().describe()),
            Value::Class(c) => {
                self.emit("class ");
                self.emit(c.name());
            }
            Value::Error(e) => self.emit(&e.to_string()),
            Value::Regex(re) => {
                self.emit("/");
                self.emit(re.as_str());
                self.emit("/");
            }
            Value::Promise(_) => self.emit("Promise"),
            Value::Asymmetric(m) => self.emit(&m.describe(self.printer)),
        }
    }

    /// Cycle and depth bookkeeping around a container body.
    fn container(&mut self, value: &Value, name: &str, body: impl FnOnce(&mut Self)) {
        let addr = value.container_addr().unwrap_or_default();
        if self.seen.contains(&addr) {
            self.emit("<circular reference: ");
            self.emit(name);
            self.emit(">");
            return;
        }
        if self.seen.len() >= self.printer.limits.max_depth {
            self.emit(name);
            return;
        }
        self.seen.push(addr);
        body(self);
        self.seen.pop();
    }

    fn sequence(&mut self, open: &str, items: &[Value], close: &str) {
        self.emit(open);
        let limit = self.printer.limits.max_array_length;
        for (i, item) in items.iter().take(limit).enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.format(item);
        }
        if items.len() > limit {
            self.emit(", ...");
        }
        self.emit(close);
    }

    fn entries(&mut self, entries: &[(Value, Value)]) {
        self.emit("Map( ");
        let limit = self.printer.limits.max_array_length;
        for (i, (key, value)) in entries.iter().take(limit).enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            self.emit("[ ");
            self.format(key);
            self.emit(", ");
            self.format(value);
            self.emit(" ]");
        }
        if entries.len() > limit {
            self.emit(", ...");
        }
        self.emit(" )");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
