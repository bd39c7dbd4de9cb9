//! Structural walk of a document value against a compiled schema.
//!
//! Per object node the walk runs in phases: required-property presence, then
//! the type of every declared property present, then value constraints of the
//! properties whose type matched, then nested objects and array elements.
//! Array elements go through the same phases. Every violation is collected.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use super::ValidationWarning;
use crate::schema::constraint::{json_equal, Additional, Items, JsonType, Node, NodeId, Rules};
use crate::schema::compile::escape_pointer;
use crate::schema::CompiledSchema;

/// One step from a parent value to a child value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(&escape_pointer(key)),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Join segments into a JSON pointer; the document root is `""`.
pub fn pointer(path: &[Segment]) -> String {
    path.iter().map(|segment| format!("/{}", segment)).collect()
}

/// Schema keyword that produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Required,
    Type,
    Enum,
    Const,
    Pattern,
    Format,
    MinLength,
    MaxLength,
    Minimum,
    Maximum,
    MinItems,
    MaxItems,
    AdditionalProperties,
    AnyOf,
    OneOf,
    FalseSchema,
}

/// A single constraint mismatch with the sub-violations that explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: Vec<Segment>,
    pub keyword: Keyword,
    pub message: String,
    /// Recorded order is preserved by the normalizer
    pub causes: Vec<Violation>,
}

impl Violation {
    fn new(path: &[Segment], keyword: Keyword, message: String) -> Self {
        Self {
            path: path.to_vec(),
            keyword,
            message,
            causes: Vec::new(),
        }
    }

    /// This violation plus all nested causes.
    pub fn count(&self) -> usize {
        1 + self.causes.iter().map(Violation::count).sum::<usize>()
    }
}

pub(crate) struct Walker<'s> {
    schema: &'s CompiledSchema,
    warn_undeclared: bool,
    /// Objects whose combinator branches are being checked; the owning
    /// schema reports their undeclared properties
    branch_objects: Vec<*const Map<String, Value>>,
    pub warnings: Vec<ValidationWarning>,
}

impl<'s> Walker<'s> {
    pub fn new(schema: &'s CompiledSchema, warn_undeclared: bool) -> Self {
        Self {
            schema,
            warn_undeclared,
            branch_objects: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Validate `value` against the schema root.
    pub fn run(&mut self, value: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.check(value, self.schema.root(), &mut path, &mut out);
        out
    }

    /// Every phase for a single value.
    fn check(
        &mut self,
        value: &Value,
        node: NodeId,
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        if self.check_type(value, node, path, out) {
            self.check_value(value, node, path, out);
            self.check_structure(value, node, path, out);
        }
    }

    /// Returns whether later phases should run for this value.
    fn check_type(
        &self,
        value: &Value,
        node: NodeId,
        path: &[Segment],
        out: &mut Vec<Violation>,
    ) -> bool {
        let rules = match self.schema.node(node) {
            Node::Always => return true,
            Node::Never => {
                out.push(Violation::new(path, Keyword::FalseSchema, "not allowed".to_string()));
                return false;
            }
            Node::Rules(rules) => rules,
            Node::Ref(_) => unreachable!("node() resolves references"),
        };

        let Some(types) = &rules.types else {
            return true;
        };
        if types.iter().any(|t| t.matches(value)) {
            return true;
        }

        let expected: Vec<&str> = types.iter().map(JsonType::as_str).collect();
        out.push(Violation::new(
            path,
            Keyword::Type,
            format!(
                "expected {}, but got {}",
                expected.join(" or "),
                JsonType::of(value)
            ),
        ));
        false
    }

    fn rules(&self, node: NodeId) -> Option<&'s Rules> {
        match self.schema.node(node) {
            Node::Rules(rules) => Some(rules.as_ref()),
            _ => None,
        }
    }

    /// Enum, const, pattern, format, lengths, bounds, cardinality, combinators.
    fn check_value(
        &mut self,
        value: &Value,
        node: NodeId,
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        let Some(rules) = self.rules(node) else {
            return;
        };

        if let Some(allowed) = &rules.enumeration {
            if !allowed.iter().any(|candidate| json_equal(candidate, value)) {
                let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
                out.push(Violation::new(
                    path,
                    Keyword::Enum,
                    format!("value must be one of {}", listed.join(", ")),
                ));
            }
        }

        if let Some(constant) = &rules.constant {
            if !json_equal(constant, value) {
                out.push(Violation::new(
                    path,
                    Keyword::Const,
                    format!("value must be {}", constant),
                ));
            }
        }

        match value {
            Value::String(text) => self.check_string(text, rules, path, out),
            Value::Number(_) => self.check_number(value, rules, path, out),
            Value::Array(items) => self.check_cardinality(items.len() as u64, rules, path, out),
            _ => {}
        }

        let branch_object = match value {
            Value::Object(map) if has_branches(rules) => Some(map as *const Map<String, Value>),
            _ => None,
        };
        if let Some(map) = branch_object {
            self.branch_objects.push(map);
        }

        for branch in &rules.all_of {
            self.check(value, *branch, path, out);
        }
        if !rules.any_of.is_empty() {
            self.check_any_of(value, &rules.any_of, path, out);
        }
        if !rules.one_of.is_empty() {
            self.check_one_of(value, &rules.one_of, path, out);
        }

        if branch_object.is_some() {
            self.branch_objects.pop();
        }
    }

    /// Property names declared for one value by `rules` and by every
    /// combinator branch applied to that same value.
    fn declared_names(&self, rules: &'s Rules, names: &mut HashSet<&'s str>) {
        names.extend(rules.properties.iter().map(|(name, _)| name.as_str()));
        for branch in rules.all_of.iter().chain(&rules.any_of).chain(&rules.one_of) {
            if let Some(branch) = self.rules(*branch) {
                self.declared_names(branch, names);
            }
        }
    }

    fn check_string(&self, text: &str, rules: &Rules, path: &[Segment], out: &mut Vec<Violation>) {
        let length = text.chars().count() as u64;
        if let Some(min) = rules.min_length {
            if length < min {
                out.push(Violation::new(
                    path,
                    Keyword::MinLength,
                    format!("length must be >= {}, but got {}", min, length),
                ));
            }
        }
        if let Some(max) = rules.max_length {
            if length > max {
                out.push(Violation::new(
                    path,
                    Keyword::MaxLength,
                    format!("length must be <= {}, but got {}", max, length),
                ));
            }
        }
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(text) {
                out.push(Violation::new(
                    path,
                    Keyword::Pattern,
                    format!("'{}' does not match pattern '{}'", text, pattern.source),
                ));
            }
        }
        if let Some(format) = &rules.format {
            if !format.accepts(text) {
                out.push(Violation::new(
                    path,
                    Keyword::Format,
                    format!("'{}' is not valid '{}'", text, format.as_str()),
                ));
            }
        }
    }

    fn check_number(
        &self,
        value: &Value,
        rules: &Rules,
        path: &[Segment],
        out: &mut Vec<Violation>,
    ) {
        let Some(n) = value.as_f64() else {
            return;
        };
        let bounds = [
            (rules.minimum, Keyword::Minimum, ">=", n >= rules.minimum.unwrap_or(f64::MIN)),
            (rules.maximum, Keyword::Maximum, "<=", n <= rules.maximum.unwrap_or(f64::MAX)),
            (
                rules.exclusive_minimum,
                Keyword::Minimum,
                ">",
                rules.exclusive_minimum.map(|b| n > b).unwrap_or(true),
            ),
            (
                rules.exclusive_maximum,
                Keyword::Maximum,
                "<",
                rules.exclusive_maximum.map(|b| n < b).unwrap_or(true),
            ),
        ];
        for (bound, keyword, op, ok) in bounds {
            if let (Some(bound), false) = (bound, ok) {
                out.push(Violation::new(
                    path,
                    keyword,
                    format!("must be {} {} but found {}", op, bound, value),
                ));
            }
        }
    }

    fn check_cardinality(
        &self,
        len: u64,
        rules: &Rules,
        path: &[Segment],
        out: &mut Vec<Violation>,
    ) {
        if let Some(min) = rules.min_items {
            if len < min {
                out.push(Violation::new(
                    path,
                    Keyword::MinItems,
                    format!("minimum {} items required, but found {} items", min, len),
                ));
            }
        }
        if let Some(max) = rules.max_items {
            if len > max {
                out.push(Violation::new(
                    path,
                    Keyword::MaxItems,
                    format!("maximum {} items allowed, but found {} items", max, len),
                ));
            }
        }
    }

    /// Run one branch in isolation; warnings from failed branches are dropped.
    fn try_branch(
        &mut self,
        value: &Value,
        branch: NodeId,
        path: &mut Vec<Segment>,
    ) -> Vec<Violation> {
        let warnings = self.warnings.len();
        let mut found = Vec::new();
        self.check(value, branch, path, &mut found);
        if !found.is_empty() {
            self.warnings.truncate(warnings);
        }
        found
    }

    fn check_any_of(
        &mut self,
        value: &Value,
        branches: &[NodeId],
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        let mut causes = Vec::new();
        for branch in branches {
            let found = self.try_branch(value, *branch, path);
            if found.is_empty() {
                return;
            }
            causes.extend(found);
        }
        let mut violation = Violation::new(
            path,
            Keyword::AnyOf,
            format!(
                "value does not match any of the {} alternatives (anyOf)",
                branches.len()
            ),
        );
        violation.causes = causes;
        out.push(violation);
    }

    fn check_one_of(
        &mut self,
        value: &Value,
        branches: &[NodeId],
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        let mut causes = Vec::new();
        let mut matched = Vec::new();
        for (index, branch) in branches.iter().enumerate() {
            let found = self.try_branch(value, *branch, path);
            if found.is_empty() {
                matched.push(index);
            } else {
                causes.extend(found);
            }
        }

        match matched.len() {
            1 => {}
            0 => {
                let mut violation = Violation::new(
                    path,
                    Keyword::OneOf,
                    format!(
                        "value does not match any of the {} alternatives (oneOf)",
                        branches.len()
                    ),
                );
                violation.causes = causes;
                out.push(violation);
            }
            _ => {
                let listed: Vec<String> = matched.iter().map(usize::to_string).collect();
                out.push(Violation::new(
                    path,
                    Keyword::OneOf,
                    format!(
                        "value matches alternatives {}, but exactly one is allowed (oneOf)",
                        listed.join(" and ")
                    ),
                ));
            }
        }
    }

    /// Required properties, children, undeclared properties.
    fn check_structure(
        &mut self,
        value: &Value,
        node: NodeId,
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        let Some(rules) = self.rules(node) else {
            return;
        };

        match value {
            Value::Object(map) => self.check_object(map, rules, path, out),
            Value::Array(elements) => {
                let children: Vec<(Segment, &Value, NodeId)> = match &rules.items {
                    Some(Items::Each(item)) => elements
                        .iter()
                        .enumerate()
                        .map(|(index, element)| (Segment::Index(index), element, *item))
                        .collect(),
                    Some(Items::Tuple(items)) => elements
                        .iter()
                        .zip(items)
                        .enumerate()
                        .map(|(index, (element, item))| (Segment::Index(index), element, *item))
                        .collect(),
                    None => Vec::new(),
                };
                self.check_children(children, path, out);
            }
            _ => {}
        }
    }

    fn check_object(
        &mut self,
        map: &Map<String, Value>,
        rules: &'s Rules,
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        let missing: Vec<String> = rules
            .required
            .iter()
            .filter(|name| !map.contains_key(name.as_str()))
            .map(|name| format!("\"{}\"", name))
            .collect();
        if !missing.is_empty() {
            out.push(Violation::new(
                path,
                Keyword::Required,
                format!("missing properties: {}", missing.join(", ")),
            ));
        }

        let children: Vec<(Segment, &Value, NodeId)> = rules
            .properties
            .iter()
            .filter_map(|(name, id)| {
                map.get(name)
                    .map(|value| (Segment::Key(name.clone()), value, *id))
            })
            .collect();
        self.check_children(children, path, out);

        let undeclared: Vec<(&String, &Value)> = map
            .iter()
            .filter(|(key, _)| rules.property(key).is_none())
            .collect();
        if undeclared.is_empty() {
            return;
        }

        match rules.additional {
            Additional::Allowed => {}
            Additional::Unspecified => {
                let in_branch = self
                    .branch_objects
                    .iter()
                    .any(|owner| std::ptr::eq(*owner, map));
                if !self.warn_undeclared || in_branch {
                    return;
                }
                let mut declared = HashSet::new();
                self.declared_names(rules, &mut declared);
                if !declared.is_empty() {
                    for (key, _) in &undeclared {
                        if declared.contains(key.as_str()) {
                            continue;
                        }
                        path.push(Segment::Key((*key).clone()));
                        self.warnings.push(ValidationWarning {
                            field: pointer(path),
                            message: format!("property \"{}\" is not declared by the schema", key),
                        });
                        path.pop();
                    }
                }
            }
            Additional::Forbidden => {
                let listed: Vec<String> = undeclared
                    .iter()
                    .map(|(key, _)| format!("\"{}\"", key))
                    .collect();
                out.push(Violation::new(
                    path,
                    Keyword::AdditionalProperties,
                    format!("additionalProperties {} not allowed", listed.join(", ")),
                ));
            }
            Additional::Schema(extra) => {
                let children = undeclared
                    .into_iter()
                    .map(|(key, value)| (Segment::Key(key.clone()), value, extra))
                    .collect();
                self.check_children(children, path, out);
            }
        }
    }

    /// Phases (b) to (d) across siblings: all types, then values, then nesting.
    fn check_children(
        &mut self,
        children: Vec<(Segment, &Value, NodeId)>,
        path: &mut Vec<Segment>,
        out: &mut Vec<Violation>,
    ) {
        let mut conforming = Vec::with_capacity(children.len());
        for (segment, value, node) in children {
            path.push(segment);
            let ok = self.check_type(value, node, path, out);
            let segment = path.pop();
            if let (true, Some(segment)) = (ok, segment) {
                conforming.push((segment, value, node));
            }
        }

        for (segment, value, node) in &conforming {
            path.push(segment.clone());
            self.check_value(value, *node, path, out);
            path.pop();
        }

        for (segment, value, node) in conforming {
            path.push(segment);
            self.check_structure(value, node, path, out);
            path.pop();
        }
    }
}

fn has_branches(rules: &Rules) -> bool {
    !(rules.all_of.is_empty() && rules.any_of.is_empty() && rules.one_of.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::compile_bytes;
    use serde_json::json;

    fn violations(schema: &str, document: Value) -> Vec<Violation> {
        let schema = compile_bytes("test", schema.as_bytes()).unwrap();
        Walker::new(&schema, true).run(&document)
    }

    #[test]
    fn test_pointer_escaping() {
        let path = vec![
            Segment::Key("content".into()),
            Segment::Key("a/b".into()),
            Segment::Index(2),
        ];
        assert_eq!(pointer(&path), "/content/a~1b/2");
        assert_eq!(pointer(&[]), "");
    }

    #[test]
    fn test_type_mismatch_skips_value_checks() {
        let found = violations(
            r#"{"properties": {"v": {"type": "string", "pattern": "^x$"}}}"#,
            json!({"v": 5}),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].keyword, Keyword::Type);
        assert_eq!(found[0].message, "expected string, but got number");
    }

    #[test]
    fn test_sibling_types_before_nested_errors() {
        let schema = r#"{
            "properties": {
                "a": {"type": "object", "required": ["x"]},
                "b": {"type": "string"}
            }
        }"#;
        let found = violations(schema, json!({"a": {}, "b": 1}));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].keyword, Keyword::Type);
        assert_eq!(pointer(&found[0].path), "/b");
        assert_eq!(found[1].keyword, Keyword::Required);
        assert_eq!(pointer(&found[1].path), "/a");
    }

    #[test]
    fn test_any_of_records_branch_causes() {
        let schema = r#"{"anyOf": [{"type": "string"}, {"type": "integer", "minimum": 10}]}"#;
        let found = violations(schema, json!(3));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].keyword, Keyword::AnyOf);
        assert_eq!(found[0].causes.len(), 2);
        assert_eq!(found[0].count(), 3);

        assert!(violations(schema, json!("ok")).is_empty());
    }

    #[test]
    fn test_one_of_multiple_matches() {
        let schema = r#"{"oneOf": [{"type": "number"}, {"type": "integer"}]}"#;
        let found = violations(schema, json!(4));
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("exactly one"));
        assert!(violations(schema, json!(4.5)).is_empty());
    }

    #[test]
    fn test_additional_properties_forbidden_and_schema() {
        let found = violations(
            r#"{"properties": {"a": {}}, "additionalProperties": false}"#,
            json!({"a": 1, "b": 2, "c": 3}),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, r#"additionalProperties "b", "c" not allowed"#);

        let found = violations(
            r#"{"additionalProperties": {"type": "string"}}"#,
            json!({"a": "x", "b": 2}),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(pointer(&found[0].path), "/b");
    }

    #[test]
    fn test_false_schema() {
        let found = violations(r#"{"properties": {"gone": false}}"#, json!({"gone": 1}));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].keyword, Keyword::FalseSchema);
    }

    #[test]
    fn test_numeric_bounds() {
        let schema = r#"{"type": "number", "minimum": 1, "exclusiveMaximum": 10}"#;
        assert!(violations(schema, json!(1)).is_empty());
        assert_eq!(violations(schema, json!(0)).len(), 1);
        assert_eq!(violations(schema, json!(10)).len(), 1);
    }

    #[test]
    fn test_tuple_items() {
        let schema = r#"{"items": [{"type": "string"}, {"type": "number"}]}"#;
        assert!(violations(schema, json!(["a", 1, true])).is_empty());
        let found = violations(schema, json!([1, "a"]));
        assert_eq!(found.len(), 2);
        assert_eq!(pointer(&found[0].path), "/0");
        assert_eq!(pointer(&found[1].path), "/1");
    }

    #[test]
    fn test_recursive_schema_walks_unbounded_depth() {
        let schema = r##"{
            "definitions": {
                "node": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"children": {"type": "array", "items": {"$ref": "#/definitions/node"}}}
                }
            },
            "$ref": "#/definitions/node"
        }"##;
        let doc = json!({"name": "a", "children": [{"name": "b", "children": [{"children": []}]}]});
        let found = violations(schema, doc);
        assert_eq!(found.len(), 1);
        assert_eq!(pointer(&found[0].path), "/children/0/children/0");
    }

    #[test]
    fn test_undeclared_property_warns_only_when_unspecified() {
        let schema = compile_bytes("t", br#"{"properties": {"a": {}}}"#).unwrap();
        let mut walker = Walker::new(&schema, true);
        assert!(walker.run(&json!({"a": 1, "extra": 2})).is_empty());
        assert_eq!(walker.warnings.len(), 1);
        assert_eq!(walker.warnings[0].field, "/extra");

        let mut quiet = Walker::new(&schema, false);
        quiet.run(&json!({"a": 1, "extra": 2}));
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_properties_declared_by_sibling_branches_do_not_warn() {
        let schema = compile_bytes(
            "t",
            br#"{
                "allOf": [{"properties": {"a": {}}}, {"properties": {"b": {}}}],
                "properties": {"nested": {"allOf": [{"properties": {"x": {}}}]}}
            }"#,
        )
        .unwrap();
        let mut walker = Walker::new(&schema, true);
        let found = walker.run(&json!({"a": 1, "b": 2, "c": 3, "nested": {"x": 1, "y": 2}}));
        assert!(found.is_empty());

        let fields: Vec<&str> = walker.warnings.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(fields, vec!["/nested/y", "/c"]);
    }
}
