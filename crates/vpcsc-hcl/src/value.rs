//! # HCL Values
//!
//! A small typed value model and its deterministic serializer.
//!
//! ## Rendering rules
//!
//! - Strings are double-quoted. `"`, `\`, newline, carriage return and tab
//!   use backslash escapes; other control characters use `\uNNNN`. Template
//!   openers are doubled (`$${`, `%%{`) so no string ever interpolates.
//! - Booleans render lower-case; null renders `null`.
//! - Empty lists render `[]`, empty maps `{}`.
//! - Lists of scalars render inline: `["a", "b"]`. Lists containing a list
//!   or map render one element per line with a trailing comma.
//! - Maps render one `key = value` per line, in insertion order. A key is
//!   quoted only when it is empty or contains a character outside
//!   `[A-Za-z0-9_]`.
//! - Nested lines are indented two spaces per level. The opening bracket is
//!   never indented; the caller places it.

use std::fmt;

/// A value that can appear on the right-hand side of an HCL attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HclValue {
    Null,
    Bool(bool),
    Number(i64),
    String(String),
    List(Vec<HclValue>),
    /// Ordered key/value pairs.
    Map(Vec<(String, HclValue)>),
    /// A bare expression such as `var.policy`, emitted verbatim.
    Expression(String),
}

impl HclValue {
    /// Build a map from `(key, value)` pairs, keeping their order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, HclValue)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list of strings.
    pub fn strings<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::List(
            items
                .into_iter()
                .map(|s| Self::String(s.as_ref().to_string()))
                .collect(),
        )
    }

    fn is_compound(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Render at nesting level `indent`.
    pub fn render(&self, indent: usize) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => quote(s),
            Self::Expression(e) => e.clone(),
            Self::List(items) if items.is_empty() => "[]".to_string(),
            Self::List(items) if !items.iter().any(HclValue::is_compound) => {
                let inner: Vec<String> = items.iter().map(|v| v.render(indent)).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::List(items) => {
                let mut lines = vec!["[".to_string()];
                for item in items {
                    lines.push(format!("{}{},", pad(indent + 1), item.render(indent + 1)));
                }
                lines.push(format!("{}]", pad(indent)));
                lines.join("\n")
            }
            Self::Map(entries) if entries.is_empty() => "{}".to_string(),
            Self::Map(entries) => {
                let mut lines = vec!["{".to_string()];
                for (key, value) in entries {
                    lines.push(format!(
                        "{}{} = {}",
                        pad(indent + 1),
                        key_repr(key),
                        value.render(indent + 1)
                    ));
                }
                lines.push(format!("{}}}", pad(indent)));
                lines.join("\n")
            }
        }
    }
}

impl fmt::Display for HclValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

impl From<&str> for HclValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for HclValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for HclValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A top-level block such as `module "name" { ... }`.
///
/// Attribute names are padded so the `=` signs line up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub attributes: Vec<(String, HclValue)>,
}

impl Block {
    pub fn render(&self) -> String {
        let mut header = self.kind.clone();
        for label in &self.labels {
            header.push(' ');
            header.push_str(&quote(label));
        }
        let width = self.attributes.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let mut lines = vec![format!("{header} {{")];
        for (key, value) in &self.attributes {
            lines.push(format!("  {key:<width$} = {}", value.render(1)));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// Double-quote `s` as a literal HCL string.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn key_repr(key: &str) -> String {
    let bare = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        key.to_string()
    } else {
        quote(key)
    }
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}
