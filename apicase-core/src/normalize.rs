//! Rewrites raw JSON-Schema-like maps into generator-friendly nodes.
//!
//! Normalization resolves local `$ref`s (detecting cycles), merges `allOf`
//! compositions, and compiles `pattern` strings once per node so both the
//! validation and generation halves are available downstream.

use std::collections::HashSet;
use std::fmt;

use nonempty::NonEmpty;
use regex::Regex;
use regex_syntax::ParserBuilder;
use regex_syntax::hir::{Hir, HirKind};
use serde_json::Value as JsonValue;

use crate::schema::JsonObject;

/// Errors produced while normalizing a raw schema.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaError {
    /// A `$ref` chain came back to a reference that is still being expanded.
    RecursiveReference { reference: String },
    /// The schema uses a construct the generator cannot model.
    UnsupportedConstruct { reason: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::RecursiveReference { reference } => {
                write!(f, "schema contains a recursive reference via '{reference}'")
            }
            SchemaError::UnsupportedConstruct { reason } => {
                write!(f, "unsupported schema construct: {reason}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

fn unsupported(reason: impl Into<String>) -> SchemaError {
    SchemaError::UnsupportedConstruct {
        reason: reason.into(),
    }
}

/// A `pattern` constraint compiled once, with separate validation and
/// generation halves. Either half may fail on its own: the regex dialect may
/// be unsupported by the validator, and boundary escapes are unsupported for
/// generation even when validation works.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    source: String,
    validation: Result<Regex, regex::Error>,
    generation: Result<Hir, PatternError>,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            validation: Regex::new(pattern),
            generation: compile_generation_hir(pattern),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn validation(&self) -> Result<&Regex, &regex::Error> {
        self.validation.as_ref()
    }

    pub fn generation(&self) -> Result<&Hir, &PatternError> {
        self.generation.as_ref()
    }

    /// `None` when the pattern cannot be validated in this regex dialect.
    pub fn matches(&self, text: &str) -> Option<bool> {
        self.validation
            .as_ref()
            .ok()
            .map(|regex| regex.is_match(text))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatternError {
    Unsupported(String),
    Parse(String),
}

impl PatternError {
    pub fn reason(&self) -> String {
        match self {
            PatternError::Unsupported(reason) => reason.clone(),
            PatternError::Parse(error) => format!("pattern must be a valid regex: {error}"),
        }
    }
}

/// Policy for object keys outside the declared properties.
#[derive(Clone, Debug)]
pub enum AdditionalProperties {
    Allow,
    Deny,
    Schema(Box<SchemaNode>),
}

#[derive(Clone, Debug)]
pub struct ObjectNode {
    pub properties: Vec<(String, SchemaNode)>,
    pub required: Vec<String>,
    pub additional: AdditionalProperties,
}

impl ObjectNode {
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|key| key == name)
    }
}

#[derive(Clone, Debug)]
pub struct ArrayNode {
    pub items: Box<SchemaNode>,
    pub min_items: usize,
    pub max_items: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct StringNode {
    pub pattern: Option<CompiledPattern>,
    pub format: Option<String>,
    pub min_length: usize,
    pub max_length: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct NumberNode {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct IntegerNode {
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub multiple_of: Option<i64>,
}

/// Normalized schema node. Closed over every construct the generator can
/// model; `allOf` is merged away during normalization and `const` becomes a
/// single-member enum, so neither survives as a variant. No `$ref` remains.
#[derive(Clone, Debug)]
pub enum SchemaNode {
    Object(ObjectNode),
    Array(ArrayNode),
    String(StringNode),
    Number(NumberNode),
    Integer(IntegerNode),
    Boolean,
    Null,
    Enum(NonEmpty<JsonValue>),
    // NonEmpty keeps its head inline, so the union payload needs the box
    // to keep the enum finite.
    AnyOf(Box<NonEmpty<SchemaNode>>),
    OneOf(Box<NonEmpty<SchemaNode>>),
    Unconstrained,
}

impl SchemaNode {
    /// Structural conformance check against the normalized constraints.
    ///
    /// `format` is treated as an annotation, and patterns whose dialect the
    /// validator cannot compile are treated as matching.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            SchemaNode::Unconstrained => true,
            SchemaNode::Boolean => value.is_boolean(),
            SchemaNode::Null => value.is_null(),
            SchemaNode::Enum(values) => values.iter().any(|member| member == value),
            SchemaNode::String(node) => match value.as_str() {
                Some(text) => node.accepts_text(text),
                None => false,
            },
            SchemaNode::Integer(node) => match value.as_i64() {
                Some(number) => node.accepts_integer(number),
                None => false,
            },
            SchemaNode::Number(node) => match value.as_f64() {
                Some(number) => node.accepts_number(number),
                None => false,
            },
            SchemaNode::Array(node) => match value.as_array() {
                Some(items) => {
                    items.len() >= node.min_items
                        && node.max_items.is_none_or(|max| items.len() <= max)
                        && items.iter().all(|item| node.items.accepts(item))
                }
                None => false,
            },
            SchemaNode::Object(node) => match value.as_object() {
                Some(map) => node.accepts_map(map),
                None => false,
            },
            SchemaNode::AnyOf(branches) => branches.iter().any(|branch| branch.accepts(value)),
            SchemaNode::OneOf(branches) => {
                branches.iter().filter(|branch| branch.accepts(value)).count() == 1
            }
        }
    }
}

impl StringNode {
    pub fn accepts_text(&self, text: &str) -> bool {
        let length = text.chars().count();
        if length < self.min_length {
            return false;
        }
        if self.max_length.is_some_and(|max| length > max) {
            return false;
        }
        match &self.pattern {
            Some(pattern) => pattern.matches(text).unwrap_or(true),
            None => true,
        }
    }
}

impl IntegerNode {
    pub fn accepts_integer(&self, number: i64) -> bool {
        if self.minimum.is_some_and(|min| number < min) {
            return false;
        }
        if self.maximum.is_some_and(|max| number > max) {
            return false;
        }
        match self.multiple_of {
            Some(step) if step != 0 => number % step == 0,
            _ => true,
        }
    }
}

impl NumberNode {
    pub fn accepts_number(&self, number: f64) -> bool {
        if self.minimum.is_some_and(|min| number < min) {
            return false;
        }
        if self.maximum.is_some_and(|max| number > max) {
            return false;
        }
        match self.multiple_of {
            Some(step) if step != 0.0 => {
                let ratio = number / step;
                (ratio - ratio.round()).abs() < 1e-9
            }
            _ => true,
        }
    }
}

impl ObjectNode {
    fn accepts_map(&self, map: &JsonObject) -> bool {
        for key in &self.required {
            if !map.contains_key(key) {
                return false;
            }
        }
        for (key, value) in map {
            match self.property(key) {
                Some(node) => {
                    if !node.accepts(value) {
                        return false;
                    }
                }
                None => match &self.additional {
                    AdditionalProperties::Allow => {}
                    AdditionalProperties::Deny => return false,
                    AdditionalProperties::Schema(node) => {
                        if !node.accepts(value) {
                            return false;
                        }
                    }
                },
            }
        }
        true
    }
}

/// Normalizes a self-contained raw schema. Local `#/` references resolve
/// against the schema itself.
pub fn normalize(schema: &JsonObject) -> Result<SchemaNode, SchemaError> {
    let root = JsonValue::Object(schema.clone());
    normalize_with_root(schema, &root)
}

/// Normalizes a raw schema whose `#/` references resolve against a larger
/// document root.
pub fn normalize_with_root(schema: &JsonObject, root: &JsonValue) -> Result<SchemaNode, SchemaError> {
    let mut visiting = Vec::new();
    normalize_inner(schema, root, &mut visiting)
}

fn normalize_inner(
    schema: &JsonObject,
    root: &JsonValue,
    visiting: &mut Vec<String>,
) -> Result<SchemaNode, SchemaError> {
    if let Some(reference) = schema.get("$ref") {
        let merged = expand_reference(schema, reference, root, visiting)?;
        let reference = reference_string(reference)?.to_string();
        visiting.push(reference);
        let node = normalize_inner(&merged, root, visiting);
        visiting.pop();
        return node;
    }

    if schema.contains_key("not") {
        return Err(unsupported("not schemas cannot be modeled"));
    }

    if schema.get("allOf").is_some() {
        let merged = resolve_composition(schema, root, visiting)?;
        return normalize_inner(&merged, root, visiting);
    }

    if let Some(value) = schema.get("const") {
        return Ok(SchemaNode::Enum(NonEmpty::new(value.clone())));
    }

    if let Some(values) = schema.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| unsupported("enum must be an array"))?;
        return NonEmpty::from_vec(values.clone())
            .map(SchemaNode::Enum)
            .ok_or_else(|| unsupported("enum must include at least one value"));
    }

    if let Some(branches) = union_branches(schema, "oneOf", root, visiting)? {
        return Ok(SchemaNode::OneOf(Box::new(branches)));
    }
    if let Some(branches) = union_branches(schema, "anyOf", root, visiting)? {
        return Ok(SchemaNode::AnyOf(Box::new(branches)));
    }

    match schema.get("type") {
        Some(JsonValue::String(schema_type)) => {
            typed_node(schema, schema_type, root, visiting)
        }
        Some(JsonValue::Array(types)) => {
            if types.is_empty() {
                return Err(unsupported("schema type array must include at least one string"));
            }
            let mut branches = Vec::with_capacity(types.len());
            for (idx, value) in types.iter().enumerate() {
                let schema_type = value.as_str().ok_or_else(|| {
                    unsupported(format!(
                        "schema type array must contain strings; found {value} at {idx}"
                    ))
                })?;
                branches.push(typed_node(schema, schema_type, root, visiting)?);
            }
            NonEmpty::from_vec(branches)
                .map(|branches| SchemaNode::AnyOf(Box::new(branches)))
                .ok_or_else(|| unsupported("schema type array must include at least one string"))
        }
        Some(_) => Err(unsupported("schema type must be a string or array of strings")),
        None => untyped_node(schema, root, visiting),
    }
}

/// Builds the node for a schema without a `type` keyword, inferring the tag
/// from the constraint keywords that are present.
fn untyped_node(
    schema: &JsonObject,
    root: &JsonValue,
    visiting: &mut Vec<String>,
) -> Result<SchemaNode, SchemaError> {
    let keys = ["properties", "required", "additionalProperties"];
    if keys.iter().any(|key| schema.contains_key(*key)) {
        return typed_node(schema, "object", root, visiting);
    }
    let keys = ["items", "minItems", "maxItems"];
    if keys.iter().any(|key| schema.contains_key(*key)) {
        return typed_node(schema, "array", root, visiting);
    }
    let keys = ["pattern", "minLength", "maxLength", "format"];
    if keys.iter().any(|key| schema.contains_key(*key)) {
        return typed_node(schema, "string", root, visiting);
    }
    let keys = ["minimum", "maximum", "multipleOf"];
    if keys.iter().any(|key| schema.contains_key(*key)) {
        return typed_node(schema, "number", root, visiting);
    }
    Ok(SchemaNode::Unconstrained)
}

fn typed_node(
    schema: &JsonObject,
    schema_type: &str,
    root: &JsonValue,
    visiting: &mut Vec<String>,
) -> Result<SchemaNode, SchemaError> {
    match schema_type {
        "string" => {
            let min_length = schema
                .get("minLength")
                .and_then(JsonValue::as_u64)
                .unwrap_or(0) as usize;
            let max_length = schema
                .get("maxLength")
                .and_then(JsonValue::as_u64)
                .map(|max| max as usize);
            if max_length.is_some_and(|max| max < min_length) {
                return Err(unsupported("maxLength must be >= minLength"));
            }
            let pattern = match schema.get("pattern") {
                Some(JsonValue::String(pattern)) => Some(CompiledPattern::new(pattern)),
                Some(_) => return Err(unsupported("pattern must be a string")),
                None => None,
            };
            let format = schema
                .get("format")
                .and_then(JsonValue::as_str)
                .map(str::to_string);
            Ok(SchemaNode::String(StringNode {
                pattern,
                format,
                min_length,
                max_length,
            }))
        }
        "integer" => {
            let minimum = schema
                .get("minimum")
                .and_then(JsonValue::as_f64)
                .map(|min| min.ceil() as i64);
            let maximum = schema
                .get("maximum")
                .and_then(JsonValue::as_f64)
                .map(|max| max.floor() as i64);
            if let (Some(min), Some(max)) = (minimum, maximum) {
                if max < min {
                    return Err(unsupported("maximum must be >= minimum"));
                }
            }
            let multiple_of = schema
                .get("multipleOf")
                .and_then(JsonValue::as_f64)
                .filter(|step| step.fract() == 0.0 && *step != 0.0)
                .map(|step| step as i64);
            Ok(SchemaNode::Integer(IntegerNode {
                minimum,
                maximum,
                multiple_of,
            }))
        }
        "number" => {
            let minimum = schema.get("minimum").and_then(JsonValue::as_f64);
            let maximum = schema.get("maximum").and_then(JsonValue::as_f64);
            if let (Some(min), Some(max)) = (minimum, maximum) {
                if max < min {
                    return Err(unsupported("maximum must be >= minimum"));
                }
            }
            let multiple_of = schema
                .get("multipleOf")
                .and_then(JsonValue::as_f64)
                .filter(|step| *step != 0.0);
            Ok(SchemaNode::Number(NumberNode {
                minimum,
                maximum,
                multiple_of,
            }))
        }
        "boolean" => Ok(SchemaNode::Boolean),
        "null" => Ok(SchemaNode::Null),
        "array" => {
            let min_items = schema
                .get("minItems")
                .and_then(JsonValue::as_u64)
                .unwrap_or(0) as usize;
            let max_items = schema
                .get("maxItems")
                .and_then(JsonValue::as_u64)
                .map(|max| max as usize);
            if max_items.is_some_and(|max| max < min_items) {
                return Err(unsupported("maxItems must be >= minItems"));
            }
            let items = match schema.get("items") {
                Some(JsonValue::Object(item_schema)) => {
                    normalize_inner(item_schema, root, visiting)?
                }
                Some(JsonValue::Bool(true)) | None => SchemaNode::Unconstrained,
                Some(JsonValue::Bool(false)) => {
                    return Err(unsupported("items: false cannot be modeled"));
                }
                Some(_) => return Err(unsupported("items schema must be an object")),
            };
            Ok(SchemaNode::Array(ArrayNode {
                items: Box::new(items),
                min_items,
                max_items,
            }))
        }
        "object" => {
            let mut properties = Vec::new();
            if let Some(declared) = schema.get("properties") {
                let declared = declared
                    .as_object()
                    .ok_or_else(|| unsupported("properties must be an object"))?;
                for (name, value) in declared {
                    let property_schema = value.as_object().ok_or_else(|| {
                        unsupported(format!("property '{name}' schema must be an object"))
                    })?;
                    properties.push((name.clone(), normalize_inner(property_schema, root, visiting)?));
                }
            }

            let mut required = Vec::new();
            if let Some(JsonValue::Array(declared)) = schema.get("required") {
                let mut seen = HashSet::new();
                for value in declared {
                    let key = value
                        .as_str()
                        .ok_or_else(|| unsupported("required entries must be strings"))?;
                    if properties.iter().all(|(name, _)| name != key) {
                        // Required keys without a declared schema still have
                        // to be present; model them as unconstrained.
                        properties.push((key.to_string(), SchemaNode::Unconstrained));
                    }
                    if seen.insert(key.to_string()) {
                        required.push(key.to_string());
                    }
                }
            }

            let additional = match schema.get("additionalProperties") {
                None | Some(JsonValue::Bool(true)) => AdditionalProperties::Allow,
                Some(JsonValue::Bool(false)) => AdditionalProperties::Deny,
                Some(JsonValue::Object(extra)) => AdditionalProperties::Schema(Box::new(
                    normalize_inner(extra, root, visiting)?,
                )),
                Some(_) => {
                    return Err(unsupported(
                        "additionalProperties must be a boolean or schema object",
                    ));
                }
            };

            Ok(SchemaNode::Object(ObjectNode {
                properties,
                required,
                additional,
            }))
        }
        other => Err(unsupported(format!("unsupported schema type '{other}'"))),
    }
}

fn union_branches(
    schema: &JsonObject,
    keyword: &str,
    root: &JsonValue,
    visiting: &mut Vec<String>,
) -> Result<Option<NonEmpty<SchemaNode>>, SchemaError> {
    let Some(value) = schema.get(keyword) else {
        return Ok(None);
    };
    let branches = value
        .as_array()
        .ok_or_else(|| unsupported(format!("{keyword} must be an array")))?;
    if branches.is_empty() {
        return Err(unsupported(format!(
            "{keyword} must include at least one schema object"
        )));
    }

    let mut base = schema.clone();
    base.remove(keyword);

    let mut nodes = Vec::with_capacity(branches.len());
    for (idx, value) in branches.iter().enumerate() {
        let branch = value
            .as_object()
            .ok_or_else(|| unsupported(format!("{keyword}[{idx}] schema must be an object")))?;
        let resolved = resolve_composition(branch, root, visiting)?;
        let merged = merge_schema_objects(&base, &resolved);
        nodes.push(normalize_inner(&merged, root, visiting)?);
    }
    Ok(NonEmpty::from_vec(nodes))
}

/// Flattens top-level `$ref` and `allOf` into a single raw schema object,
/// tracking references on the visiting stack so cycles surface as errors.
fn resolve_composition(
    schema: &JsonObject,
    root: &JsonValue,
    visiting: &mut Vec<String>,
) -> Result<JsonObject, SchemaError> {
    if let Some(reference) = schema.get("$ref") {
        let merged = expand_reference(schema, reference, root, visiting)?;
        let reference = reference_string(reference)?.to_string();
        visiting.push(reference);
        let resolved = resolve_composition(&merged, root, visiting);
        visiting.pop();
        return resolved;
    }

    if let Some(JsonValue::Array(all_of)) = schema.get("allOf") {
        if all_of.is_empty() {
            return Err(unsupported("allOf must include at least one schema object"));
        }
        let mut merged = schema.clone();
        merged.remove("allOf");
        for (idx, value) in all_of.iter().enumerate() {
            let branch = value
                .as_object()
                .ok_or_else(|| unsupported(format!("allOf[{idx}] schema must be an object")))?;
            let resolved = resolve_composition(branch, root, visiting)?;
            merged = merge_schema_objects(&merged, &resolved);
        }
        return Ok(merged);
    }

    Ok(schema.clone())
}

fn reference_string(reference: &JsonValue) -> Result<&str, SchemaError> {
    reference
        .as_str()
        .ok_or_else(|| unsupported("$ref must be a string"))
}

fn expand_reference(
    schema: &JsonObject,
    reference: &JsonValue,
    root: &JsonValue,
    visiting: &[String],
) -> Result<JsonObject, SchemaError> {
    let reference = reference_string(reference)?;
    if !reference.starts_with("#/") && reference != "#" {
        return Err(unsupported(format!(
            "schema $ref must be a local reference, got '{reference}'"
        )));
    }
    if visiting.iter().any(|seen| seen == reference) {
        return Err(SchemaError::RecursiveReference {
            reference: reference.to_string(),
        });
    }
    let target = resolve_pointer_value(root, reference)
        .and_then(JsonValue::as_object)
        .ok_or_else(|| {
            unsupported(format!(
                "schema $ref '{reference}' must point to a schema object"
            ))
        })?;
    // Sibling keys override the reference target.
    let mut merged = target.clone();
    for (key, value) in schema {
        if key != "$ref" {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(merged)
}

fn resolve_pointer_value<'a>(root: &'a JsonValue, pointer: &str) -> Option<&'a JsonValue> {
    if pointer == "#" {
        return Some(root);
    }
    let mut current = root;
    for segment in pointer.split('/').skip(1) {
        let decoded = decode_pointer_segment(segment);
        match current {
            JsonValue::Object(map) => {
                current = map.get(&decoded)?;
            }
            JsonValue::Array(items) => {
                let index = decoded.parse::<usize>().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

fn decode_pointer_segment(segment: &str) -> String {
    let mut decoded = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => decoded.push('~'),
                Some('1') => decoded.push('/'),
                Some(other) => {
                    decoded.push('~');
                    decoded.push(other);
                }
                None => decoded.push('~'),
            }
        } else {
            decoded.push(ch);
        }
    }
    decoded
}

/// Merges two raw schema objects: `properties` union key-wise, `required`
/// deduplicated union, everything else overridden by `branch`.
pub(crate) fn merge_schema_objects(base: &JsonObject, branch: &JsonObject) -> JsonObject {
    let mut merged = base.clone();
    for (key, value) in branch {
        match key.as_str() {
            "properties" => {
                if let (Some(JsonValue::Object(base_props)), JsonValue::Object(branch_props)) =
                    (merged.get_mut("properties"), value)
                {
                    for (prop_key, prop_value) in branch_props {
                        base_props.insert(prop_key.clone(), prop_value.clone());
                    }
                } else {
                    merged.insert(key.clone(), value.clone());
                }
            }
            "required" => {
                if let (Some(JsonValue::Array(base_required)), JsonValue::Array(branch_required)) =
                    (merged.get_mut("required"), value)
                {
                    let mut seen = HashSet::new();
                    let mut combined = Vec::new();
                    for item in base_required.iter().chain(branch_required.iter()) {
                        if let Some(key) = item.as_str() {
                            if seen.insert(key.to_string()) {
                                combined.push(JsonValue::String(key.to_string()));
                            }
                        }
                    }
                    *base_required = combined;
                } else {
                    merged.insert(key.clone(), value.clone());
                }
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

fn compile_generation_hir(pattern: &str) -> Result<Hir, PatternError> {
    let normalized =
        normalize_pattern_for_generation(pattern).map_err(PatternError::Unsupported)?;
    ParserBuilder::new()
        .build()
        .parse(&normalized)
        .map_err(|error| PatternError::Parse(error.to_string()))
}

/// Strips anchors and rejects boundary escapes so the remaining pattern can
/// drive string generation.
fn normalize_pattern_for_generation(pattern: &str) -> Result<String, String> {
    if pattern.is_empty() {
        return Ok(String::new());
    }
    if contains_boundary_escape(pattern) {
        return Err(
            "pattern uses word boundary escapes which are unsupported for string generation"
                .to_string(),
        );
    }
    let bytes = pattern.as_bytes();
    let mut start = 0;
    let mut end = bytes.len();
    if bytes.first() == Some(&b'^') {
        start = 1;
    }
    if end > start && bytes[end - 1] == b'$' && !is_escaped(bytes, end - 1) {
        end -= 1;
    }
    Ok(pattern[start..end].to_string())
}

fn contains_boundary_escape(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'\\' {
            if let Some(next) = bytes.get(idx + 1) {
                match *next {
                    b'b' | b'B' | b'A' | b'Z' | b'z' | b'G' => return true,
                    _ => {
                        idx += 2;
                        continue;
                    }
                }
            } else {
                break;
            }
        }
        idx += 1;
    }
    false
}

fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    if idx == 0 {
        return false;
    }
    let mut count = 0;
    let mut pos = idx;
    while pos > 0 {
        pos -= 1;
        if bytes[pos] == b'\\' {
            count += 1;
        } else {
            break;
        }
    }
    count % 2 == 1
}

/// Folds explicit length bounds into a pattern's quantifier when the pattern
/// is a single repetition of a one-character unit, e.g. `[a-z]+` with
/// `minLength: 460, maxLength: 465` becomes `[a-z]{460,465}`. Returns `None`
/// when the shapes do not line up; callers fall back to rejection sampling.
pub(crate) fn length_bounded_hir(
    hir: &Hir,
    min_length: usize,
    max_length: Option<usize>,
) -> Option<Hir> {
    let HirKind::Repetition(repetition) = hir.kind() else {
        return None;
    };
    if !repetition.greedy || !repeats_single_char(&repetition.sub) {
        return None;
    }
    let requested_min = u32::try_from(min_length).ok()?;
    let requested_max = match max_length {
        Some(max) => Some(u32::try_from(max).ok()?),
        None => None,
    };
    let min = repetition.min.max(requested_min);
    let max = match (repetition.max, requested_max) {
        (None, None) => None,
        (Some(limit), None) => Some(limit),
        (None, Some(limit)) => Some(limit),
        (Some(a), Some(b)) => Some(a.min(b)),
    };
    if max.is_some_and(|max| max < min) {
        return None;
    }
    let mut folded = repetition.clone();
    folded.min = min;
    folded.max = max;
    Some(Hir::repetition(folded))
}

fn repeats_single_char(sub: &Hir) -> bool {
    match sub.kind() {
        HirKind::Class(_) => true,
        HirKind::Literal(literal) => std::str::from_utf8(&literal.0)
            .map(|text| text.chars().count() == 1)
            .unwrap_or(false),
        _ => false,
    }
}
