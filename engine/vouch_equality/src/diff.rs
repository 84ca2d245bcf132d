//! Path-tracking mismatch recorder.
//!
//! The equality engine walks both structures in lockstep and reports every
//! leaf mismatch here together with the path it was found at. The final
//! message has one line (or block) per mismatch:
//!
//! ```text
//! Expected $.x = 'actual' to equal 'expected'.
//! Expected $[1] = 2 to equal 3.
//! Unexpected $[3] = 4 in array.
//! Expected $.inner to have properties
//!     y: 1
//! ```
//!
//! A mismatch at the root prints without a path: `Expected 1 to equal 2.`

use std::fmt;
use std::sync::Arc;

use vouch_value::{PrettyPrinter, Value};

/// Custom rendering for one mismatch: `(actual, expected, path, printer)`.
pub type MismatchFormatter =
    Arc<dyn Fn(&Value, &Value, &ObjectPath, &PrettyPrinter) -> String + Send + Sync>;

/// One step of an [`ObjectPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathComponent {
    Property(String),
    Index(usize),
}

impl From<&str> for PathComponent {
    fn from(key: &str) -> Self {
        PathComponent::Property(key.to_string())
    }
}

impl From<String> for PathComponent {
    fn from(key: String) -> Self {
        PathComponent::Property(key)
    }
}

impl From<usize> for PathComponent {
    fn from(index: usize) -> Self {
        PathComponent::Index(index)
    }
}

/// Location inside a compared structure, rendered `$.a[0]['odd key']`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectPath {
    components: Vec<PathComponent>,
}

impl ObjectPath {
    pub fn root() -> Self {
        ObjectPath::default()
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// A new path one step deeper.
    #[must_use]
    pub fn add(&self, component: impl Into<PathComponent>) -> ObjectPath {
        let mut components = self.components.clone();
        components.push(component.into());
        ObjectPath { components }
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '$' || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_')
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for component in &self.components {
            match component {
                PathComponent::Index(i) => write!(f, "[{i}]")?,
                PathComponent::Property(key) if is_identifier(key) => write!(f, ".{key}")?,
                PathComponent::Property(key) => write!(f, "['{key}']")?,
            }
        }
        Ok(())
    }
}

/// How a recorded mismatch is rendered.
#[derive(Clone)]
pub(crate) enum Rendering {
    Default,
    Custom(MismatchFormatter),
    /// Actual array has an element the expected one lacks.
    UnexpectedElement,
    /// Object key sets differ.
    KeysDiffer,
    /// Objects built by different classes.
    ClassDiffers,
}

struct Mismatch {
    path: ObjectPath,
    actual: Value,
    expected: Value,
    rendering: Rendering,
}

/// Collects mismatches during a comparison and renders the failure message.
pub struct DiffBuilder {
    actual_root: Value,
    expected_root: Value,
    path: ObjectPath,
    mismatches: Vec<Mismatch>,
    printer: PrettyPrinter,
}

impl DiffBuilder {
    pub fn new(printer: PrettyPrinter) -> Self {
        DiffBuilder {
            actual_root: Value::Undefined,
            expected_root: Value::Undefined,
            path: ObjectPath::root(),
            mismatches: Vec::new(),
            printer,
        }
    }

    /// Values the paths are resolved against by [`DiffBuilder::record_mismatch`].
    pub fn set_roots(&mut self, actual: Value, expected: Value) {
        self.actual_root = actual;
        self.expected_root = expected;
    }

    /// Current path.
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Run `f` one path component deeper.
    pub fn with_path<R>(
        &mut self,
        component: impl Into<PathComponent>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.path.components.push(component.into());
        let out = f(self);
        self.path.components.pop();
        out
    }

    /// Record a mismatch at the current path.
    ///
    /// The actual and expected values are looked up from the roots by path.
    /// With a formatter, its output replaces the default line.
    pub fn record_mismatch(&mut self, formatter: Option<MismatchFormatter>) {
        let actual = resolve(&self.actual_root, &self.path);
        let expected = resolve(&self.expected_root, &self.path);
        let rendering = formatter.map_or(Rendering::Default, Rendering::Custom);
        self.record(actual, expected, rendering);
    }

    pub(crate) fn record(&mut self, actual: Value, expected: Value, rendering: Rendering) {
        tracing::trace!(path = %self.path, "mismatch recorded");
        self.mismatches.push(Mismatch {
            path: self.path.clone(),
            actual,
            expected,
            rendering,
        });
    }

    pub fn has_mismatches(&self) -> bool {
        !self.mismatches.is_empty()
    }

    /// Render every mismatch, one per line, in recording order.
    pub fn get_message(&self) -> String {
        let lines: Vec<String> = self.mismatches.iter().map(|m| self.render(m)).collect();
        lines.join("\n")
    }

    fn render(&self, m: &Mismatch) -> String {
        let pp = |v: &Value| self.printer.pp(v);
        let located = |v: &Value| {
            if m.path.depth() == 0 {
                pp(v)
            } else {
                format!("{} = {}", m.path, pp(v))
            }
        };
        match &m.rendering {
            Rendering::Default => {
                format!("Expected {} to equal {}.", located(&m.actual), pp(&m.expected))
            }
            Rendering::Custom(formatter) => formatter(&m.actual, &m.expected, &m.path, &self.printer),
            Rendering::UnexpectedElement => format!("Unexpected {} in array.", located(&m.actual)),
            Rendering::ClassDiffers => format!(
                "Expected {} to be a kind of {}, but was {}.",
                m.path,
                m.expected.type_name(),
                pp(&m.actual)
            ),
            Rendering::KeysDiffer => self.render_keys(m),
        }
    }

    fn render_keys(&self, m: &Mismatch) -> String {
        let missing = extra_fields(&m.expected, &m.actual);
        let extra = extra_fields(&m.actual, &m.expected);
        let block = |fields: &[(String, Value)]| -> String {
            fields
                .iter()
                .map(|(k, v)| format!("\n    {k}: {}", self.printer.pp(v)))
                .collect()
        };
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("Expected {} to have properties{}", m.path, block(missing.as_slice())));
        }
        if !extra.is_empty() {
            parts.push(format!("Expected {} not to have properties{}", m.path, block(extra.as_slice())));
        }
        parts.join("\n")
    }
}

impl Default for DiffBuilder {
    fn default() -> Self {
        DiffBuilder::new(PrettyPrinter::default())
    }
}

/// Fields of `a` whose keys are absent from `b`.
fn extra_fields(a: &Value, b: &Value) -> Vec<(String, Value)> {
    let (Value::Object(a), Value::Object(b)) = (a, b) else {
        return Vec::new();
    };
    let b = b.read();
    a.read()
        .fields
        .iter()
        .filter(|(k, _)| !b.fields.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Follow `path` from `root`; missing steps give `undefined`.
fn resolve(root: &Value, path: &ObjectPath) -> Value {
    let mut current = root.clone();
    for component in path.components() {
        current = match (component, &current) {
            (PathComponent::Index(i), Value::Array(items)) => {
                items.read().get(*i).cloned().unwrap_or(Value::Undefined)
            }
            (PathComponent::Property(key), Value::Array(items)) if key == "length" => {
                Value::from(items.read().len() as f64)
            }
            (PathComponent::Property(key), Value::Object(_)) => {
                current.get(key).unwrap_or(Value::Undefined)
            }
            _ => Value::Undefined,
        };
    }
    current
}
