//! The compiled constraint tree.
//!
//! Nodes live in a flat arena owned by [`super::CompiledSchema`] and refer to
//! each other by index, which lets `$ref` cycles exist without shared
//! ownership.

use fancy_regex::Regex;
use serde_json::Value;
use std::fmt;

pub(crate) type NodeId = usize;

/// JSON value categories as named by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl JsonType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Category of a document value. Numbers always report as `number`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
        }
    }

    /// No coercion: `"5"` is never a number, `1.5` is never an integer.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Integer => is_integral(value),
            other => *other == Self::of(value),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        _ => false,
    }
}

/// Values of the `format` keyword the engine knows how to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    DateTime,
    Date,
    Email,
    Uri,
    /// Accepted in schemas, never checked
    Unchecked(String),
}

impl Format {
    pub fn parse(name: &str) -> Self {
        match name {
            "date-time" => Self::DateTime,
            "date" => Self::Date,
            "email" => Self::Email,
            "uri" => Self::Uri,
            other => Self::Unchecked(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DateTime => "date-time",
            Self::Date => "date",
            Self::Email => "email",
            Self::Uri => "uri",
            Self::Unchecked(name) => name,
        }
    }

    /// Returns true for unchecked formats.
    pub fn accepts(&self, text: &str) -> bool {
        match self {
            Self::DateTime => chrono::DateTime::parse_from_rfc3339(text).is_ok(),
            Self::Date => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
            Self::Email => is_email(text),
            Self::Uri => url::Url::parse(text).is_ok(),
            Self::Unchecked(_) => true,
        }
    }
}

fn is_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !text.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Items {
    /// Every element against one schema
    Each(NodeId),
    /// Positional schemas; extra elements are unconstrained
    Tuple(Vec<NodeId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Additional {
    /// Keyword absent: undeclared properties are allowed but may warn
    #[default]
    Unspecified,
    Allowed,
    Forbidden,
    Schema(NodeId),
}

/// A `pattern` keyword with ECMA-262 semantics: lookaround is supported and
/// `\d`/`\w` match ASCII only.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, fancy_regex::Error> {
        let regex = Regex::new(&ascii_classes(source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Hitting the backtracking limit counts as a mismatch.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text).unwrap_or(false)
    }
}

/// Rewrite `\d`, `\D`, `\w` and `\W` as explicit ASCII classes.
/// Negated shorthands inside a bracket set are left as written.
fn ascii_classes(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();
    let mut in_set = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    out.push(c);
                    break;
                };
                match (escaped, in_set) {
                    ('d', false) => out.push_str("[0-9]"),
                    ('d', true) => out.push_str("0-9"),
                    ('w', false) => out.push_str("[A-Za-z0-9_]"),
                    ('w', true) => out.push_str("A-Za-z0-9_"),
                    ('D', false) => out.push_str("[^0-9]"),
                    ('W', false) => out.push_str("[^A-Za-z0-9_]"),
                    _ => {
                        out.push(c);
                        out.push(escaped);
                    }
                }
            }
            '[' if !in_set => {
                in_set = true;
                out.push(c);
            }
            ']' if in_set => {
                in_set = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Keyword constraints of one object-form schema.
#[derive(Debug, Clone, Default)]
pub(crate) struct Rules {
    pub types: Option<Vec<JsonType>>,
    pub enumeration: Option<Vec<Value>>,
    pub constant: Option<Value>,
    pub pattern: Option<Pattern>,
    pub format: Option<Format>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub items: Option<Items>,
    pub required: Vec<String>,
    /// Declaration order of the schema
    pub properties: Vec<(String, NodeId)>,
    pub additional: Additional,
    pub all_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
}

impl Rules {
    pub fn property(&self, name: &str) -> Option<NodeId> {
        self.properties
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, id)| *id)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// `true` or `{}`-like schema with nothing to check
    Always,
    /// `false` schema
    Never,
    /// `$ref`; sibling keywords are ignored as in draft-07
    Ref(NodeId),
    Rules(Box<Rules>),
}

/// Structural equality used by `enum` and `const`; `1` equals `1.0`.
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map(|y| json_equal(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}
