//! Deterministic boundary enumeration for the coverage phase.
//!
//! Where generated cases sample the schema space, coverage cases walk its
//! edges: values sitting exactly on declared bounds in positive mode, and
//! values one step past them in negative mode. Candidates are always checked
//! against the node before being emitted, so an imprecise candidate list
//! cannot produce a mislabeled case.

use serde_json::Value as JsonValue;

use crate::GenerationMode;
use crate::generator::negative::{non_matching_string, value_not_in_enum};
use crate::generator::{div_ceil, div_floor};
use crate::normalize::{ArrayNode, IntegerNode, NumberNode, ObjectNode, SchemaNode, StringNode};
use crate::schema::JsonObject;

/// Arrays at their maximum size are only enumerated up to this many items.
const MAX_ENUMERATED_ITEMS: usize = 16;

/// Boundary values for a node in the given mode: conforming values in
/// positive mode, violating values in negative mode. Deterministic order,
/// duplicates removed.
pub fn boundary_values(node: &SchemaNode, mode: GenerationMode) -> Vec<JsonValue> {
    let candidates = match mode {
        GenerationMode::Positive => positive_candidates(node),
        GenerationMode::Negative => negative_candidates(node),
    };
    let mut kept = Vec::new();
    for candidate in candidates {
        let keep = match mode {
            GenerationMode::Positive => node.accepts(&candidate),
            GenerationMode::Negative => !node.accepts(&candidate),
        };
        if keep && !kept.contains(&candidate) {
            kept.push(candidate);
        }
    }
    kept
}

/// A fixed representative value for a node, used to hold the remaining
/// parameters steady while one parameter walks its boundaries. `None` when
/// no deterministic conforming value can be named.
pub fn canonical_value(node: &SchemaNode) -> Option<JsonValue> {
    let candidate = match node {
        SchemaNode::Unconstrained => Some(JsonValue::Null),
        SchemaNode::Null => Some(JsonValue::Null),
        SchemaNode::Boolean => Some(JsonValue::Bool(true)),
        SchemaNode::Enum(values) => Some(values.head.clone()),
        SchemaNode::String(string) => canonical_string(string),
        SchemaNode::Integer(integer) => canonical_integer(integer),
        SchemaNode::Number(number) => canonical_number(number),
        SchemaNode::Array(array) => canonical_array(array),
        SchemaNode::Object(object) => canonical_object(object),
        SchemaNode::AnyOf(branches) | SchemaNode::OneOf(branches) => branches
            .iter()
            .filter_map(canonical_value)
            .find(|value| node.accepts(value)),
    };
    candidate.filter(|value| node.accepts(value))
}

fn canonical_string(node: &StringNode) -> Option<JsonValue> {
    if let Some(format) = node.format.as_deref() {
        let fixed = match format {
            "date" => Some("2024-01-01"),
            "date-time" => Some("2024-01-01T00:00:00Z"),
            "uuid" => Some("00000000-0000-4000-8000-000000000000"),
            "byte" => Some("aGVsbG8="),
            _ => None,
        };
        if let Some(text) = fixed {
            return Some(JsonValue::from(text));
        }
    }
    let length = node.min_length.max(1);
    let length = node.max_length.map_or(length, |max| length.min(max));
    Some(JsonValue::from("a".repeat(length)))
}

fn canonical_integer(node: &IntegerNode) -> Option<JsonValue> {
    let mut candidates = vec![0i64];
    candidates.extend(node.minimum);
    candidates.extend(node.maximum);
    if let Some(step) = node.multiple_of.filter(|step| *step != 0) {
        let step = step.abs();
        if let Some(snapped) = node
            .minimum
            .and_then(|min| div_ceil(min, step).checked_mul(step))
        {
            candidates.push(snapped);
        }
        if let Some(snapped) = node
            .maximum
            .and_then(|max| div_floor(max, step).checked_mul(step))
        {
            candidates.push(snapped);
        }
    }
    candidates
        .into_iter()
        .map(JsonValue::from)
        .find(|value| node.accepts_integer(value.as_i64().unwrap_or_default()))
}

fn canonical_number(node: &NumberNode) -> Option<JsonValue> {
    let mut candidates = vec![0.0f64];
    candidates.extend(node.minimum);
    candidates.extend(node.maximum);
    if let Some(step) = node.multiple_of.filter(|step| *step != 0.0) {
        if let Some(min) = node.minimum {
            candidates.push((min / step).ceil() * step);
        }
    }
    candidates
        .into_iter()
        .filter(|value| node.accepts_number(*value))
        .map(JsonValue::from)
        .next()
}

fn canonical_array(node: &ArrayNode) -> Option<JsonValue> {
    if node.min_items == 0 {
        return Some(JsonValue::Array(Vec::new()));
    }
    let item = canonical_value(&node.items)?;
    Some(JsonValue::Array(vec![item; node.min_items]))
}

fn canonical_object(node: &ObjectNode) -> Option<JsonValue> {
    let mut map = JsonObject::new();
    for key in &node.required {
        let property = node.property(key)?;
        map.insert(key.clone(), canonical_value(property)?);
    }
    Some(JsonValue::Object(map))
}

fn positive_candidates(node: &SchemaNode) -> Vec<JsonValue> {
    let mut candidates = Vec::new();
    match node {
        SchemaNode::Unconstrained => candidates.push(JsonValue::Null),
        SchemaNode::Null => candidates.push(JsonValue::Null),
        SchemaNode::Boolean => {
            candidates.push(JsonValue::Bool(true));
            candidates.push(JsonValue::Bool(false));
        }
        SchemaNode::Enum(values) => candidates.extend(values.iter().cloned()),
        SchemaNode::String(string) => {
            candidates.push(JsonValue::from("a".repeat(string.min_length)));
            if let Some(max_length) = string.max_length {
                candidates.push(JsonValue::from("a".repeat(max_length)));
            }
            candidates.extend(canonical_string(string));
        }
        SchemaNode::Integer(integer) => {
            candidates.extend(integer.minimum.map(JsonValue::from));
            candidates.extend(integer.maximum.map(JsonValue::from));
            candidates.extend(canonical_integer(integer));
        }
        SchemaNode::Number(number) => {
            candidates.extend(number.minimum.map(JsonValue::from));
            candidates.extend(number.maximum.map(JsonValue::from));
            candidates.extend(canonical_number(number));
        }
        SchemaNode::Array(array) => {
            if let Some(item) = canonical_value(&array.items) {
                candidates.push(JsonValue::Array(vec![item.clone(); array.min_items]));
                if let Some(max_items) = array
                    .max_items
                    .filter(|max| *max <= MAX_ENUMERATED_ITEMS)
                {
                    candidates.push(JsonValue::Array(vec![item; max_items]));
                }
            } else if array.min_items == 0 {
                candidates.push(JsonValue::Array(Vec::new()));
            }
        }
        SchemaNode::Object(object) => {
            candidates.extend(canonical_object(object));
            candidates.extend(full_object(object));
        }
        SchemaNode::AnyOf(branches) | SchemaNode::OneOf(branches) => {
            for branch in branches.iter() {
                candidates.extend(positive_candidates(branch));
            }
        }
    }
    candidates
}

fn full_object(node: &ObjectNode) -> Option<JsonValue> {
    let mut map = JsonObject::new();
    for (key, property) in &node.properties {
        map.insert(key.clone(), canonical_value(property)?);
    }
    Some(JsonValue::Object(map))
}

fn negative_candidates(node: &SchemaNode) -> Vec<JsonValue> {
    let mut candidates = Vec::new();
    match node {
        SchemaNode::Unconstrained => {}
        SchemaNode::Null | SchemaNode::Boolean => {
            candidates.push(JsonValue::from("not-a-literal"));
            candidates.push(JsonValue::from(42));
        }
        SchemaNode::Enum(values) => {
            let values: Vec<JsonValue> = values.iter().cloned().collect();
            candidates.push(value_not_in_enum(&values));
        }
        SchemaNode::String(string) => {
            if string.min_length > 0 {
                candidates.push(JsonValue::from("a".repeat(string.min_length - 1)));
            }
            if let Some(max_length) = string.max_length {
                candidates.push(JsonValue::from("a".repeat(max_length + 1)));
            }
            if let Some(regex) = string
                .pattern
                .as_ref()
                .and_then(|pattern| pattern.validation().ok())
            {
                candidates.extend(non_matching_string(regex).map(JsonValue::from));
            }
            candidates.push(JsonValue::from(42));
        }
        SchemaNode::Integer(integer) => {
            candidates.extend(
                integer
                    .minimum
                    .and_then(|min| min.checked_sub(1))
                    .map(JsonValue::from),
            );
            candidates.extend(
                integer
                    .maximum
                    .and_then(|max| max.checked_add(1))
                    .map(JsonValue::from),
            );
            candidates.push(JsonValue::from("not-a-number"));
        }
        SchemaNode::Number(number) => {
            candidates.extend(number.minimum.map(|min| JsonValue::from(min - 1.0)));
            candidates.extend(number.maximum.map(|max| JsonValue::from(max + 1.0)));
            candidates.push(JsonValue::from("not-a-number"));
        }
        SchemaNode::Array(array) => {
            if array.min_items > 0 {
                candidates.push(JsonValue::Array(Vec::new()));
            }
            if let Some(max_items) = array
                .max_items
                .filter(|max| *max < MAX_ENUMERATED_ITEMS)
            {
                if let Some(item) = canonical_value(&array.items) {
                    candidates.push(JsonValue::Array(vec![item; max_items + 1]));
                }
            }
            candidates.push(JsonValue::from("not-an-array"));
        }
        SchemaNode::Object(object) => {
            if let Some(JsonValue::Object(full)) = full_object(object) {
                for dropped in &object.required {
                    let mut reduced = full.clone();
                    reduced.remove(dropped);
                    candidates.push(JsonValue::Object(reduced));
                }
                let mut extended = full;
                extended.insert("unexpected".to_string(), JsonValue::Bool(true));
                candidates.push(JsonValue::Object(extended));
            }
            candidates.push(JsonValue::from("not-an-object"));
        }
        SchemaNode::AnyOf(branches) | SchemaNode::OneOf(branches) => {
            // Branch boundaries that a sibling branch also accepts are
            // filtered out for anyOf and kept for oneOf, where overlap is
            // itself a violation.
            for branch in branches.iter() {
                candidates.extend(negative_candidates(branch));
                candidates.extend(positive_candidates(branch));
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::normalize::normalize;

    fn node(value: JsonValue) -> SchemaNode {
        let schema: JsonObject = value.as_object().cloned().expect("schema object");
        normalize(&schema).expect("normalize")
    }

    #[test]
    fn integer_boundaries_sit_on_the_window_edges() {
        let node = node(json!({"type": "integer", "minimum": 1, "maximum": 5}));
        assert_eq!(
            boundary_values(&node, GenerationMode::Positive),
            vec![json!(1), json!(5)]
        );
        assert_eq!(
            boundary_values(&node, GenerationMode::Negative),
            vec![json!(0), json!(6), json!("not-a-number")]
        );
    }

    #[test]
    fn boolean_coverage_emits_both_values() {
        let node = node(json!({"type": "boolean"}));
        assert_eq!(
            boundary_values(&node, GenerationMode::Positive),
            vec![json!(true), json!(false)]
        );
    }

    #[test]
    fn enum_coverage_walks_members_and_excludes_them() {
        let node = node(json!({"enum": ["red", "green"]}));
        assert_eq!(
            boundary_values(&node, GenerationMode::Positive),
            vec![json!("red"), json!("green")]
        );
        assert_eq!(
            boundary_values(&node, GenerationMode::Negative),
            vec![json!("not_in_enum")]
        );
    }

    #[test]
    fn string_boundaries_use_exact_lengths() {
        let node = node(json!({"type": "string", "minLength": 2, "maxLength": 4}));
        let positive = boundary_values(&node, GenerationMode::Positive);
        assert!(positive.contains(&json!("aa")));
        assert!(positive.contains(&json!("aaaa")));

        let negative = boundary_values(&node, GenerationMode::Negative);
        assert!(negative.contains(&json!("a")));
        assert!(negative.contains(&json!("aaaaa")));
    }

    #[test]
    fn object_negatives_drop_each_required_key() {
        let node = node(json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string", "minLength": 1},
            },
            "required": ["id", "name"],
            "additionalProperties": false,
        }));
        let negative = boundary_values(&node, GenerationMode::Negative);
        assert!(negative.contains(&json!({"name": "a"})));
        assert!(negative.contains(&json!({"id": 0})));
        assert!(negative.iter().any(|value| value
            .as_object()
            .is_some_and(|map| map.contains_key("unexpected"))));
    }

    #[test]
    fn one_of_overlap_is_a_negative_boundary() {
        let node = node(json!({
            "oneOf": [
                {"type": "integer", "minimum": 0},
                {"type": "integer", "maximum": 10},
            ],
        }));
        let negative = boundary_values(&node, GenerationMode::Negative);
        // 0 and 10 sit inside both branches, violating exactly-one.
        assert!(negative.contains(&json!(0)) || negative.contains(&json!(10)));
    }

    #[test]
    fn canonical_object_uses_required_properties_only() {
        let node = node(json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer", "minimum": 3},
                "label": {"type": "string"},
            },
            "required": ["id"],
        }));
        assert_eq!(canonical_value(&node), Some(json!({"id": 3})));
    }

    #[test]
    fn canonical_values_respect_formats() {
        let node = node(json!({"type": "string", "format": "date"}));
        assert_eq!(canonical_value(&node), Some(json!("2024-01-01")));
    }

    #[test]
    fn unconstrained_nodes_have_no_negative_boundaries() {
        let node = node(json!({}));
        assert!(boundary_values(&node, GenerationMode::Negative).is_empty());
        assert_eq!(canonical_value(&node), Some(JsonValue::Null));
    }
}
