//! Checks a state bag against its [`Schema`] and enforces GoCD naming rules.
//!
//! ```
//! use gocd_provider::schema::{Attribute, Presence, Schema};
//! use gocd_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::new()
//!     .attribute("name", Attribute::string(Presence::Required))
//!     .attribute("label_template", Attribute::string(Presence::Optional));
//!
//! assert!(validate(&schema, &json!({"name": "build"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "build", "label_template": 7}));
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("label_template"));
//! ```

use serde_json::Value;

use crate::schema::{Attribute, Block, Diagnostic, Schema, ValueKind};

/// Longest pipeline, stage, job or template name GoCD accepts.
pub const MAX_NAME_LENGTH: usize = 255;

/// Collect every problem with `value`; an empty result means it is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut walk = Walk::default();
    walk.document(schema, value, "");
    walk.diagnostics
}

pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    !validate(schema, value).iter().any(Diagnostic::is_error)
}

/// Check a GoCD entity name stored at `path`.
///
/// Empty names pass; the required-attribute check reports those.
pub fn check_name(name: &str, path: &str) -> Option<Diagnostic> {
    if name.len() > MAX_NAME_LENGTH {
        return Some(
            Diagnostic::error(format!("Name in '{}' is too long", path))
                .detail(format!("Names are limited to {} characters", MAX_NAME_LENGTH))
                .at(path),
        );
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if name.chars().all(allowed) {
        return None;
    }
    Some(
        Diagnostic::error(format!("Invalid name '{}'", name))
            .detail("Only letters, digits, '-', '_' and '.' are allowed")
            .at(path),
    )
}

#[derive(Default)]
struct Walk {
    diagnostics: Vec<Diagnostic>,
}

impl Walk {
    fn document(&mut self, schema: &Schema, value: &Value, path: &str) {
        let fields = match value {
            Value::Object(fields) => fields,
            Value::Null => return,
            other => {
                let diagnostic = Diagnostic::error("Expected object").detail(format!("Got {}", json_type(other)));
                self.diagnostics
                    .push(if path.is_empty() { diagnostic } else { diagnostic.at(path) });
                return;
            },
        };

        for (name, attribute) in &schema.attributes {
            self.attribute(attribute, fields.get(name), &child(path, name));
        }
        for (name, block) in &schema.blocks {
            self.block(block, fields.get(name), &child(path, name));
        }
    }

    fn attribute(&mut self, attribute: &Attribute, value: Option<&Value>, path: &str) {
        if attribute.is_computed() {
            return;
        }
        match value.filter(|v| !v.is_null()) {
            None if attribute.is_required() => self.missing(path, "This attribute is required and must be provided"),
            None => {},
            Some(Value::String(s)) if s.is_empty() && attribute.is_required() => {
                self.missing(path, "This attribute can not be empty")
            },
            Some(v) => self.kind(&attribute.kind, v, path),
        }
    }

    fn kind(&mut self, kind: &ValueKind, value: &Value, path: &str) {
        if !kind.accepts(value) {
            self.diagnostics.push(
                Diagnostic::error(format!("Invalid type for '{}'", path))
                    .detail(format!("Expected {}, got {}", kind.label(), json_type(value)))
                    .at(path),
            );
            return;
        }
        match (kind, value) {
            (ValueKind::ListOf(element), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.kind(element, item, &child(path, i));
                }
            },
            (ValueKind::MapOf(element), Value::Object(entries)) => {
                for (key, item) in entries {
                    self.kind(element, item, &child(path, key));
                }
            },
            _ => {},
        }
    }

    fn block(&mut self, block: &Block, value: Option<&Value>, path: &str) {
        let items = match value {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                self.diagnostics.push(
                    Diagnostic::error(format!("Expected list for block '{}'", path))
                        .detail(format!("Got {}", json_type(other)))
                        .at(path),
                );
                return;
            },
        };

        if items.len() < block.min_items {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "Block '{}' requires at least {} item(s), got {}",
                    path,
                    block.min_items,
                    items.len()
                ))
                .at(path),
            );
        }
        for (i, item) in items.iter().enumerate() {
            self.document(&block.item, item, &child(path, i));
        }
    }

    fn missing(&mut self, path: &str, detail: &str) {
        self.diagnostics.push(
            Diagnostic::error(format!("Missing required attribute '{}'", path))
                .detail(detail)
                .at(path),
        );
    }
}

fn child(path: &str, segment: impl std::fmt::Display) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
