//! Schema compilation: raw bytes to an immutable [`CompiledSchema`].

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, trace};

use super::constraint::{Additional, Format, Items, JsonType, Node, NodeId, Pattern, Rules};
use crate::error::{NldError, Result};
use crate::store::SourceStore;

/// Where schema bytes come from.
#[derive(Debug, Clone, Copy)]
pub enum SchemaSource<'a> {
    /// In-memory schema; `origin` names it in errors
    Bytes { origin: &'a str, bytes: &'a [u8] },
    /// Load through a [`SourceStore`]
    Path(&'a Path),
}

/// An executable, immutable schema. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    origin: String,
    title: Option<String>,
    version: Option<String>,
    nodes: Vec<Node>,
}

impl CompiledSchema {
    /// Where the schema was loaded from (path or caller-supplied label).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The schema's `title`, which doubles as its version label.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Version number embedded in the title, e.g. `1.0.0` from `NLD Document v1.0.0`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub(crate) fn root(&self) -> NodeId {
        0
    }

    /// Follows `$ref` chains. Cycles are rejected at compile time.
    pub(crate) fn node(&self, mut id: NodeId) -> &Node {
        loop {
            match &self.nodes[id] {
                Node::Ref(target) => id = *target,
                node => return node,
            }
        }
    }

    /// Number of nodes in the constraint tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Compile a schema from bytes or from a path read through `store`.
pub fn compile(store: &dyn SourceStore, source: SchemaSource<'_>) -> Result<CompiledSchema> {
    match source {
        SchemaSource::Bytes { origin, bytes } => compile_bytes(origin, bytes),
        SchemaSource::Path(path) => compile_path(store, path),
    }
}

/// Load and compile the schema at `path`.
pub fn compile_path(store: &dyn SourceStore, path: &Path) -> Result<CompiledSchema> {
    if !store.exists(path) {
        return Err(NldError::SchemaNotFound(path.to_path_buf()));
    }

    let bytes = store.read_bytes(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            NldError::SchemaNotFound(path.to_path_buf())
        } else {
            NldError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    compile_bytes(&path.display().to_string(), &bytes)
}

/// Compile schema bytes. `origin` labels the schema in errors and diagnostics.
pub fn compile_bytes(origin: &str, bytes: &[u8]) -> Result<CompiledSchema> {
    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| NldError::MalformedSchema {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

    // Authoring rules (meta-schema conformance, regex syntax) are checked by
    // the draft-7 reference implementation before building our own plan.
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(&document)
        .map_err(|e| NldError::compile(origin, e.to_string()))?;

    let mut builder = Builder {
        origin,
        root: &document,
        nodes: Vec::new(),
        by_pointer: HashMap::new(),
    };
    builder.node_at("")?;
    builder.reject_cycles()?;

    let title = document
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);
    let version = title.as_deref().and_then(version_label);

    debug!(
        origin,
        nodes = builder.nodes.len(),
        "compiled schema"
    );

    Ok(CompiledSchema {
        origin: origin.to_string(),
        title,
        version,
        nodes: builder.nodes,
    })
}

fn version_label(title: &str) -> Option<String> {
    static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
    let re = VERSION
        .get_or_init(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?)").ok())
        .as_ref()?;
    re.captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

struct Builder<'a> {
    origin: &'a str,
    root: &'a Value,
    nodes: Vec<Node>,
    by_pointer: HashMap<String, NodeId>,
}

impl<'a> Builder<'a> {
    /// Compile the subschema at a JSON pointer, once per pointer.
    fn node_at(&mut self, pointer: &str) -> Result<NodeId> {
        if let Some(id) = self.by_pointer.get(pointer) {
            return Ok(*id);
        }

        let root = self.root;
        let value = root.pointer(pointer).ok_or_else(|| {
            NldError::compile(self.origin, format!("unresolvable reference '#{}'", pointer))
        })?;

        // Reserve the slot first so recursive references resolve to it.
        let id = self.nodes.len();
        self.nodes.push(Node::Always);
        self.by_pointer.insert(pointer.to_string(), id);

        trace!(pointer, id, "compiling subschema");
        let node = self.build(value, pointer)?;
        self.nodes[id] = node;
        Ok(id)
    }

    fn build(&mut self, value: &'a Value, pointer: &str) -> Result<Node> {
        let map = match value {
            Value::Bool(true) => return Ok(Node::Always),
            Value::Bool(false) => return Ok(Node::Never),
            Value::Object(map) => map,
            _ => {
                return Err(self.error(pointer, "schema must be an object or a boolean"));
            }
        };

        if let Some(reference) = map.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| self.error(pointer, "$ref must be a string"))?;
            let target = self.local_pointer(reference, pointer)?;
            return Ok(Node::Ref(self.node_at(&target)?));
        }

        let mut rules = Rules::default();

        if let Some(types) = map.get("type") {
            rules.types = Some(self.types(types, pointer)?);
        }
        if let Some(values) = map.get("enum") {
            let values = values
                .as_array()
                .ok_or_else(|| self.error(pointer, "enum must be an array"))?;
            rules.enumeration = Some(values.clone());
        }
        if let Some(constant) = map.get("const") {
            rules.constant = Some(constant.clone());
        }
        if let Some(pattern) = map.get("pattern") {
            let source = pattern
                .as_str()
                .ok_or_else(|| self.error(pointer, "pattern must be a string"))?;
            let compiled = Pattern::new(source).map_err(|e| {
                self.error(pointer, &format!("invalid pattern '{}': {}", source, e))
            })?;
            rules.pattern = Some(compiled);
        }
        if let Some(format) = map.get("format").and_then(Value::as_str) {
            rules.format = Some(Format::parse(format));
        }

        rules.min_length = self.count(map, "minLength", pointer)?;
        rules.max_length = self.count(map, "maxLength", pointer)?;
        rules.min_items = self.count(map, "minItems", pointer)?;
        rules.max_items = self.count(map, "maxItems", pointer)?;
        rules.minimum = self.number(map, "minimum", pointer)?;
        rules.maximum = self.number(map, "maximum", pointer)?;
        rules.exclusive_minimum = self.number(map, "exclusiveMinimum", pointer)?;
        rules.exclusive_maximum = self.number(map, "exclusiveMaximum", pointer)?;

        if let Some(required) = map.get("required") {
            let names = required
                .as_array()
                .ok_or_else(|| self.error(pointer, "required must be an array"))?;
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| self.error(pointer, "required entries must be strings"))?;
                rules.required.push(name.to_string());
            }
        }

        if let Some(properties) = map.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| self.error(pointer, "properties must be an object"))?;
            for name in properties.keys() {
                let child = format!("{}/properties/{}", pointer, escape_pointer(name));
                let id = self.node_at(&child)?;
                rules.properties.push((name.clone(), id));
            }
        }

        if let Some(additional) = map.get("additionalProperties") {
            rules.additional = match additional {
                Value::Bool(true) => Additional::Allowed,
                Value::Bool(false) => Additional::Forbidden,
                _ => Additional::Schema(
                    self.node_at(&format!("{}/additionalProperties", pointer))?,
                ),
            };
        }

        if let Some(items) = map.get("items") {
            rules.items = Some(match items {
                Value::Array(list) => {
                    let mut ids = Vec::with_capacity(list.len());
                    for index in 0..list.len() {
                        ids.push(self.node_at(&format!("{}/items/{}", pointer, index))?);
                    }
                    Items::Tuple(ids)
                }
                _ => Items::Each(self.node_at(&format!("{}/items", pointer))?),
            });
        }

        rules.all_of = self.branches(map, "allOf", pointer)?;
        rules.any_of = self.branches(map, "anyOf", pointer)?;
        rules.one_of = self.branches(map, "oneOf", pointer)?;

        Ok(Node::Rules(Box::new(rules)))
    }

    fn types(&self, value: &Value, pointer: &str) -> Result<Vec<JsonType>> {
        let names: Vec<&Value> = match value {
            Value::Array(list) => list.iter().collect(),
            single => vec![single],
        };
        names
            .into_iter()
            .map(|name| {
                name.as_str()
                    .and_then(JsonType::parse)
                    .ok_or_else(|| self.error(pointer, &format!("unknown type {}", name)))
            })
            .collect()
    }

    fn count(&self, map: &Map<String, Value>, keyword: &str, pointer: &str) -> Result<Option<u64>> {
        match map.get(keyword) {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                self.error(pointer, &format!("{} must be a non-negative integer", keyword))
            }),
        }
    }

    fn number(
        &self,
        map: &Map<String, Value>,
        keyword: &str,
        pointer: &str,
    ) -> Result<Option<f64>> {
        match map.get(keyword) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.error(pointer, &format!("{} must be a number", keyword))),
        }
    }

    fn branches(
        &mut self,
        map: &Map<String, Value>,
        keyword: &str,
        pointer: &str,
    ) -> Result<Vec<NodeId>> {
        let Some(list) = map.get(keyword) else {
            return Ok(Vec::new());
        };
        let len = list
            .as_array()
            .ok_or_else(|| self.error(pointer, &format!("{} must be an array", keyword)))?
            .len();
        (0..len)
            .map(|index| self.node_at(&format!("{}/{}/{}", pointer, keyword, index)))
            .collect()
    }

    /// Only same-document references (`#...`) are supported.
    fn local_pointer(&self, reference: &str, pointer: &str) -> Result<String> {
        match reference.strip_prefix('#') {
            Some(fragment) if fragment.is_empty() || fragment.starts_with('/') => {
                Ok(fragment.to_string())
            }
            _ => Err(self.error(
                pointer,
                &format!("unsupported $ref '{}': only local references are allowed", reference),
            )),
        }
    }

    /// `$ref` and combinator edges apply a schema to the same value, so a
    /// cycle through them never terminates. Property and item edges descend
    /// into the document and may recurse.
    fn reject_cycles(&self) -> Result<()> {
        let mut state = vec![Visit::New; self.nodes.len()];
        for start in 0..self.nodes.len() {
            self.visit(start, &mut state)?;
        }
        Ok(())
    }

    fn visit(&self, id: NodeId, state: &mut [Visit]) -> Result<()> {
        match state[id] {
            Visit::Done => return Ok(()),
            Visit::Active => {
                return Err(NldError::compile(
                    self.origin,
                    "circular reference through $ref or allOf/anyOf/oneOf",
                ))
            }
            Visit::New => {}
        }
        state[id] = Visit::Active;

        let edges: Vec<NodeId> = match &self.nodes[id] {
            Node::Ref(target) => vec![*target],
            Node::Rules(rules) => rules
                .all_of
                .iter()
                .chain(&rules.any_of)
                .chain(&rules.one_of)
                .copied()
                .collect(),
            Node::Always | Node::Never => Vec::new(),
        };
        for next in edges {
            self.visit(next, state)?;
        }

        state[id] = Visit::Done;
        Ok(())
    }

    fn error(&self, pointer: &str, message: &str) -> NldError {
        NldError::compile(self.origin, format!("at '#{}': {}", pointer, message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Escape a property name for use as a JSON pointer segment.
pub(crate) fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
