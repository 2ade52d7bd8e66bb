//! Partial document updates.
//!
//! A patch is an ordered list of field-path → value assignments with
//! per-field replace semantics. Paths may address nested fields with
//! slashes (`guest/ready`); assigning `null` removes the field.

use serde_json::{Map, Value};

/// A partial, field-level document update.
#[derive(Clone, Debug, Default)]
pub struct DocPatch {
    fields: Vec<(String, Value)>,
}

impl DocPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value at a slash-separated field path.
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    /// Remove the field at a path.
    #[must_use]
    pub fn remove(self, path: impl Into<String>) -> Self {
        self.set(path, Value::Null)
    }

    /// Whether the patch assigns nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate assignments in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(p, v)| (p.as_str(), v))
    }

    /// Apply the patch to a document root, which must be an object.
    pub fn apply(&self, doc: &mut Value) {
        for (path, value) in &self.fields {
            set_path(doc, path, value.clone());
        }
    }
}

/// Set one slash-separated path, creating intermediate objects. A null
/// value removes the final key instead.
fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('/').peekable();
    let mut node = doc;

    while let Some(segment) = segments.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut().expect("object ensured above");

        if segments.peek().is_none() {
            if value.is_null() {
                map.remove(segment);
            } else {
                map.insert(segment.to_string(), value);
            }
            return;
        }

        node = map.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
    }
}
