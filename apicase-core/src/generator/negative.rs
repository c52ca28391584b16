//! Strategies that deliberately violate a schema.
//!
//! Each node kind contributes a set of dual strategies targeting specific
//! constraints: bounds nudged past their limits, lengths outside the window,
//! values absent from an enum, missing required keys. A structural filter on
//! every draw guarantees the emitted value really does violate the node, so
//! an imprecise dual can never leak a conforming value.
//!
//! Nodes that accept every JSON value have no dual at all; callers skip
//! negative generation for them instead of emitting false violations.

use proptest::prelude::*;
use proptest::strategy::Union;
use serde_json::Value as JsonValue;

use crate::GenerationConfig;
use crate::generator::formats::FormatRegistry;
use crate::generator::{GenerationError, object_strategy, value_strategy};
use crate::normalize::{
    AdditionalProperties, ArrayNode, IntegerNode, NumberNode, ObjectNode, SchemaNode, StringNode,
};
use crate::schema::JsonObject;

/// Whether any violating value exists for this node.
///
/// Typed nodes always reject some JSON kind, and enums always exclude some
/// string. Union nodes are probed against a fixed candidate list; a union
/// that accepts every probe is treated as un-negatable.
pub fn is_negatable(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Unconstrained => false,
        SchemaNode::AnyOf(_) | SchemaNode::OneOf(_) => !violating_probes(node).is_empty(),
        _ => true,
    }
}

/// Compiles a strategy drawing values that violate `node`, or `None` when
/// the node cannot be violated.
pub fn negated_value_strategy(
    node: &SchemaNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<Option<BoxedStrategy<JsonValue>>, GenerationError> {
    let duals = dual_strategies(node, registry, config)?;
    if duals.is_empty() {
        return Ok(None);
    }
    let verify = node.clone();
    Ok(Some(
        Union::new(duals)
            .prop_filter("must violate the schema", move |value| {
                !verify.accepts(value)
            })
            .boxed(),
    ))
}

fn dual_strategies(
    node: &SchemaNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<Vec<BoxedStrategy<JsonValue>>, GenerationError> {
    let mut duals: Vec<BoxedStrategy<JsonValue>> = Vec::new();
    match node {
        SchemaNode::Unconstrained => return Ok(duals),
        SchemaNode::Enum(values) => {
            let values: Vec<JsonValue> = values.iter().cloned().collect();
            duals.push(Just(value_not_in_enum(&values)).boxed());
        }
        SchemaNode::Boolean | SchemaNode::Null => {}
        SchemaNode::String(string) => string_duals(string, &mut duals),
        SchemaNode::Integer(integer) => integer_duals(integer, &mut duals),
        SchemaNode::Number(number) => number_duals(number, &mut duals),
        SchemaNode::Array(array) => array_duals(array, registry, config, &mut duals)?,
        SchemaNode::Object(object) => object_duals(object, registry, config, &mut duals)?,
        SchemaNode::AnyOf(branches) | SchemaNode::OneOf(branches) => {
            // Probes establish that a violation exists; branch duals only add
            // variety, since a value violating one branch may satisfy a
            // sibling and be rejected by the outer filter.
            if violating_probes(node).is_empty() {
                return Ok(Vec::new());
            }
            for branch in branches.iter() {
                duals.extend(dual_strategies(branch, registry, config)?);
            }
        }
    }

    let probes = violating_probes(node);
    if !probes.is_empty() {
        duals.push(proptest::sample::select(probes).boxed());
    }
    Ok(duals)
}

fn string_duals(node: &StringNode, duals: &mut Vec<BoxedStrategy<JsonValue>>) {
    if node.min_length > 0 {
        duals.push(Just(JsonValue::from("a".repeat(node.min_length - 1))).boxed());
    }
    if let Some(max_length) = node.max_length {
        duals.push(Just(JsonValue::from("a".repeat(max_length + 1))).boxed());
    }
    if let Some(pattern) = &node.pattern {
        if let Ok(regex) = pattern.validation() {
            if let Some(candidate) = non_matching_string(regex) {
                duals.push(Just(JsonValue::from(candidate)).boxed());
            }
        }
    }
}

fn integer_duals(node: &IntegerNode, duals: &mut Vec<BoxedStrategy<JsonValue>>) {
    if let Some(below) = node.minimum.and_then(|min| min.checked_sub(1)) {
        duals.push(Just(JsonValue::from(below)).boxed());
    }
    if let Some(above) = node.maximum.and_then(|max| max.checked_add(1)) {
        duals.push(Just(JsonValue::from(above)).boxed());
    }
    if let Some(step) = node.multiple_of.filter(|step| step.abs() > 1) {
        // One past a multiple cannot be a multiple when the step exceeds 1.
        let step = step.abs();
        let base = crate::generator::div_ceil(node.minimum.unwrap_or(0), step).checked_mul(step);
        if let Some(off) = base.and_then(|base| base.checked_add(1)) {
            duals.push(Just(JsonValue::from(off)).boxed());
        }
    }
}

fn number_duals(node: &NumberNode, duals: &mut Vec<BoxedStrategy<JsonValue>>) {
    if let Some(min) = node.minimum {
        duals.push(Just(JsonValue::from(min - 1.0)).boxed());
    }
    if let Some(max) = node.maximum {
        duals.push(Just(JsonValue::from(max + 1.0)).boxed());
    }
    if let Some(step) = node.multiple_of.filter(|step| *step != 0.0) {
        // Half a step past a known multiple cannot itself be a multiple.
        let base = node.minimum.map(|min| (min / step).ceil() * step).unwrap_or(0.0);
        duals.push(Just(JsonValue::from(base + step / 2.0)).boxed());
    }
}

fn array_duals(
    node: &ArrayNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
    duals: &mut Vec<BoxedStrategy<JsonValue>>,
) -> Result<(), GenerationError> {
    if node.min_items > 0 {
        duals.push(Just(JsonValue::Array(Vec::new())).boxed());
    }
    if let Some(max_items) = node.max_items {
        let item = value_strategy(&node.items, registry, config)?;
        let too_long = max_items + 1;
        duals.push(
            proptest::collection::vec(item, too_long..=too_long)
                .prop_map(JsonValue::from)
                .boxed(),
        );
    }
    if node.max_items != Some(0) {
        if let Some(bad_item) = negated_value_strategy(&node.items, registry, config)? {
            let item = value_strategy(&node.items, registry, config)?;
            let len = node.min_items.max(1);
            duals.push(
                (proptest::collection::vec(item, len..=len), bad_item)
                    .prop_map(|(mut items, bad)| {
                        items[0] = bad;
                        JsonValue::from(items)
                    })
                    .boxed(),
            );
        }
    }
    Ok(())
}

fn object_duals(
    node: &ObjectNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
    duals: &mut Vec<BoxedStrategy<JsonValue>>,
) -> Result<(), GenerationError> {
    let needs_positive = !node.required.is_empty()
        || matches!(node.additional, AdditionalProperties::Deny)
        || !node.properties.is_empty();
    if !needs_positive {
        return Ok(());
    }
    let positive = object_strategy(node, registry, config)?;

    if !node.required.is_empty() {
        let required = node.required.clone();
        duals.push(
            (positive.clone(), proptest::sample::select(required))
                .prop_map(|(mut map, key)| {
                    map.remove(&key);
                    JsonValue::Object(map)
                })
                .boxed(),
        );
    }

    if matches!(node.additional, AdditionalProperties::Deny) {
        let key = fresh_key(node, "unexpected");
        duals.push(
            positive
                .clone()
                .prop_map(move |mut map| {
                    map.insert(key.clone(), JsonValue::Bool(true));
                    JsonValue::Object(map)
                })
                .boxed(),
        );
    }

    for (name, property) in &node.properties {
        if let Some(bad_value) = negated_value_strategy(property, registry, config)? {
            let name = name.clone();
            duals.push(
                (positive.clone(), bad_value)
                    .prop_map(move |(mut map, bad)| {
                        map.insert(name.clone(), bad);
                        JsonValue::Object(map)
                    })
                    .boxed(),
            );
        }
    }

    if let AdditionalProperties::Schema(extra) = &node.additional {
        if let Some(bad_extra) = negated_value_strategy(extra, registry, config)? {
            let key = fresh_key(node, "extra");
            duals.push(
                (positive.clone(), bad_extra)
                    .prop_map(move |(mut map, bad)| {
                        map.insert(key.clone(), bad);
                        JsonValue::Object(map)
                    })
                    .boxed(),
            );
        }
    }

    Ok(())
}

fn fresh_key(node: &ObjectNode, stem: &str) -> String {
    if node.property(stem).is_none() {
        return stem.to_string();
    }
    let mut suffix = 0;
    loop {
        let candidate = format!("{stem}_{suffix}");
        if node.property(&candidate).is_none() {
            return candidate;
        }
        suffix += 1;
    }
}

fn violating_probes(node: &SchemaNode) -> Vec<JsonValue> {
    probe_candidates()
        .into_iter()
        .filter(|candidate| !node.accepts(candidate))
        .collect()
}

fn probe_candidates() -> Vec<JsonValue> {
    let mut object_probe = JsonObject::new();
    object_probe.insert("unexpected".to_string(), JsonValue::Bool(true));
    vec![
        JsonValue::Null,
        JsonValue::Bool(true),
        JsonValue::Bool(false),
        JsonValue::from(42),
        JsonValue::from(-1),
        JsonValue::from(3.5),
        JsonValue::from(""),
        JsonValue::from("x"),
        JsonValue::from("not_in_enum"),
        JsonValue::Array(Vec::new()),
        JsonValue::Array(vec![JsonValue::Null]),
        JsonValue::Object(JsonObject::new()),
        JsonValue::Object(object_probe),
    ]
}

pub(crate) fn value_not_in_enum(values: &[JsonValue]) -> JsonValue {
    let primary = JsonValue::String("not_in_enum".to_string());
    if !values.contains(&primary) {
        return primary;
    }
    let mut suffix = 0;
    loop {
        let candidate = JsonValue::String(format!("not_in_enum_{suffix}"));
        if !values.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

pub(crate) fn non_matching_string(regex: &regex::Regex) -> Option<String> {
    let candidates = ["", "x", "invalid", "!!!", "123"];
    for candidate in candidates {
        if !regex.is_match(candidate) {
            return Some(candidate.to_string());
        }
    }
    None
}
