//! Proptest strategy compilation from normalized schema nodes.
//!
//! Every node kind maps to a strategy producing conforming JSON values.
//! Pattern-bearing strings prefer folding explicit length bounds into the
//! pattern's quantifier over rejection filtering, so tight windows like
//! `minLength: 460, maxLength: 465` against `^[a-z]+$` stay cheap to draw.

use std::collections::HashSet;
use std::fmt;

use proptest::prelude::*;
use proptest::strategy::Union;
use proptest::test_runner::{RngAlgorithm, TestRng, TestRunner};
use serde_json::Value as JsonValue;

use crate::GenerationConfig;
use crate::normalize::{
    AdditionalProperties, ArrayNode, IntegerNode, NumberNode, ObjectNode, SchemaNode, StringNode,
    length_bounded_hir,
};
use crate::schema::JsonObject;

pub mod formats;
pub mod negative;

pub use formats::{FormatRegistry, FormatStrategy};

/// Errors produced while compiling a node into a strategy.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationError {
    /// The pattern cannot drive string generation.
    UnsupportedRegex { pattern: String },
    /// The constraint combination admits no values.
    Unsatisfiable { reason: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::UnsupportedRegex { pattern } => {
                write!(f, "unsupported regular expression `{pattern}`")
            }
            GenerationError::Unsatisfiable { reason } => {
                write!(f, "constraints cannot be satisfied: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

fn unsupported_regex(pattern: &str) -> GenerationError {
    GenerationError::UnsupportedRegex {
        pattern: pattern.to_string(),
    }
}

/// Compiles a strategy that draws values conforming to `node`.
pub fn value_strategy(
    node: &SchemaNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<JsonValue>, GenerationError> {
    match node {
        SchemaNode::Enum(values) => {
            let values: Vec<JsonValue> = values.iter().cloned().collect();
            Ok(proptest::sample::select(values).boxed())
        }
        SchemaNode::Boolean => Ok(any::<bool>().prop_map(JsonValue::from).boxed()),
        SchemaNode::Null => Ok(Just(JsonValue::Null).boxed()),
        SchemaNode::String(string) => string_strategy(string, registry),
        SchemaNode::Integer(integer) => integer_strategy(integer),
        SchemaNode::Number(number) => number_strategy(number),
        SchemaNode::Array(array) => array_strategy(array, registry, config),
        SchemaNode::Object(object) => Ok(object_strategy(object, registry, config)?
            .prop_map(JsonValue::Object)
            .boxed()),
        SchemaNode::AnyOf(branches) | SchemaNode::OneOf(branches) => {
            let mut strategies = Vec::with_capacity(branches.len());
            for branch in branches.iter() {
                strategies.push(value_strategy(branch, registry, config)?);
            }
            Ok(Union::new(strategies).boxed())
        }
        SchemaNode::Unconstrained => Ok(arbitrary_json()),
    }
}

fn string_strategy(
    node: &StringNode,
    registry: &FormatRegistry,
) -> Result<BoxedStrategy<JsonValue>, GenerationError> {
    if let Some(format) = &node.format {
        if let Some(strategy) = registry.strategy(format) {
            return Ok(strategy);
        }
    }

    let min_length = node.min_length;
    let max_length = node.max_length;

    if let Some(pattern) = &node.pattern {
        let hir = pattern
            .generation()
            .map_err(|_| unsupported_regex(pattern.source()))?;

        if let Some(folded) = length_bounded_hir(hir, min_length, max_length) {
            let strategy = proptest::string::string_regex_parsed(&folded)
                .map_err(|_| unsupported_regex(pattern.source()))?;
            return Ok(strategy.prop_map(JsonValue::String).boxed());
        }

        let strategy = proptest::string::string_regex_parsed(hir)
            .map_err(|_| unsupported_regex(pattern.source()))?;
        if min_length == 0 && max_length.is_none() {
            return Ok(strategy.prop_map(JsonValue::String).boxed());
        }
        return Ok(strategy
            .prop_filter("string length out of bounds", move |value| {
                let length = value.chars().count();
                length >= min_length && max_length.is_none_or(|max| length <= max)
            })
            .prop_map(JsonValue::String)
            .boxed());
    }

    let max_length = max_length.unwrap_or_else(|| min_length.max(16));
    Ok(
        proptest::collection::vec(proptest::char::any(), min_length..=max_length)
            .prop_map(|chars| JsonValue::String(chars.into_iter().collect()))
            .boxed(),
    )
}

fn integer_strategy(node: &IntegerNode) -> Result<BoxedStrategy<JsonValue>, GenerationError> {
    match node.multiple_of {
        Some(step) if step != 0 => {
            let step = step.abs();
            // Bounded factor range keeps factor * step inside the declared
            // window, so the product cannot overflow.
            let min = node.minimum.unwrap_or(-1_000_000_000);
            let max = node.maximum.unwrap_or(1_000_000_000);
            let lowest = div_ceil(min, step);
            let highest = div_floor(max, step);
            if highest < lowest {
                return Err(GenerationError::Unsatisfiable {
                    reason: format!("no multiple of {step} lies between {min} and {max}"),
                });
            }
            Ok((lowest..=highest)
                .prop_map(move |factor| JsonValue::from(factor * step))
                .boxed())
        }
        _ => {
            let min = node.minimum.unwrap_or(i64::MIN);
            let max = node.maximum.unwrap_or(i64::MAX);
            Ok((min..=max).prop_map(JsonValue::from).boxed())
        }
    }
}

fn number_strategy(node: &NumberNode) -> Result<BoxedStrategy<JsonValue>, GenerationError> {
    if let Some(step) = node.multiple_of.filter(|step| *step != 0.0) {
        let step = step.abs();
        let min = node.minimum.unwrap_or(-1.0e9);
        let max = node.maximum.unwrap_or(1.0e9);
        let lowest = (min / step).ceil() as i64;
        let highest = (max / step).floor() as i64;
        if highest < lowest {
            return Err(GenerationError::Unsatisfiable {
                reason: format!("no multiple of {step} lies between {min} and {max}"),
            });
        }
        return Ok((lowest..=highest)
            .prop_map(move |factor| JsonValue::from(factor as f64 * step))
            .boxed());
    }

    let strategy = if node.minimum.is_some() || node.maximum.is_some() {
        let min = node.minimum.unwrap_or(f64::NEG_INFINITY);
        let max = node.maximum.unwrap_or(f64::INFINITY);
        proptest::num::f64::NORMAL
            .prop_map(move |value| JsonValue::from(value.clamp(min, max)))
            .boxed()
    } else {
        proptest::num::f64::NORMAL.prop_map(JsonValue::from).boxed()
    };
    Ok(strategy)
}

fn array_strategy(
    node: &ArrayNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<JsonValue>, GenerationError> {
    let item_strategy = value_strategy(&node.items, registry, config)?;
    let min_items = node.min_items;
    let max_items = node
        .max_items
        .unwrap_or_else(|| config.max_array_length.max(min_items));
    Ok(
        proptest::collection::vec(item_strategy, min_items..=max_items)
            .prop_map(JsonValue::from)
            .boxed(),
    )
}

/// Compiles an object node into a strategy over raw JSON maps. Optional
/// properties appear with the configured probability, and non-`Deny`
/// additional-property policies contribute a handful of extra keys.
pub fn object_strategy(
    node: &ObjectNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<JsonObject>, GenerationError> {
    let mut property_strategies = Vec::with_capacity(node.properties.len());
    for (name, property) in &node.properties {
        let strategy = value_strategy(property, registry, config)?;
        let strategy = if node.is_required(name) {
            strategy.prop_map(Some).boxed()
        } else {
            optional_value(strategy, config.optional_field_probability)
        };
        property_strategies.push((name.clone(), strategy));
    }

    let mut strategy: BoxedStrategy<Vec<(String, Option<JsonValue>)>> = Just(Vec::new()).boxed();
    for (name, value_strategy) in property_strategies {
        strategy = strategy
            .prop_flat_map(move |entries| {
                let name = name.clone();
                let value_strategy = value_strategy.clone();
                value_strategy.prop_map(move |value| {
                    let mut next = entries.clone();
                    next.push((name.clone(), value));
                    next
                })
            })
            .boxed();
    }

    let extras = extra_entries_strategy(node, registry, config)?;
    let declared: HashSet<String> = node
        .properties
        .iter()
        .map(|(name, _)| name.clone())
        .collect();

    Ok((strategy, extras)
        .prop_map(move |(entries, extra_entries)| {
            let mut map = JsonObject::new();
            for (name, value) in entries {
                if let Some(value) = value {
                    map.insert(name, value);
                }
            }
            for (name, value) in extra_entries {
                if !declared.contains(&name) && !map.contains_key(&name) {
                    map.insert(name, value);
                }
            }
            map
        })
        .boxed())
}

pub(crate) fn optional_value(
    strategy: BoxedStrategy<JsonValue>,
    probability: f64,
) -> BoxedStrategy<Option<JsonValue>> {
    if probability <= 0.0 {
        Just(None).boxed()
    } else if probability >= 1.0 {
        strategy.prop_map(Some).boxed()
    } else {
        proptest::option::weighted(probability, strategy).boxed()
    }
}

fn extra_entries_strategy(
    node: &ObjectNode,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<Vec<(String, JsonValue)>>, GenerationError> {
    let value = match &node.additional {
        AdditionalProperties::Deny => return Ok(Just(Vec::new()).boxed()),
        AdditionalProperties::Allow => arbitrary_json(),
        AdditionalProperties::Schema(schema) => value_strategy(schema, registry, config)?,
    };
    let key = proptest::collection::vec(proptest::char::range('a', 'z'), 1..=8)
        .prop_map(|chars| chars.into_iter().collect::<String>());
    Ok(proptest::collection::vec((key, value), 0..=2).boxed())
}

/// Strategy over arbitrary JSON values, used for unconstrained schemas and
/// free-form additional properties.
pub(crate) fn arbitrary_json() -> BoxedStrategy<JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::from),
        any::<i64>().prop_map(JsonValue::from),
        proptest::num::f64::NORMAL.prop_map(JsonValue::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(JsonValue::from),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..=3).prop_map(JsonValue::from),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..=3).prop_map(|entries| {
                let mut map = JsonObject::new();
                for (key, value) in entries {
                    map.insert(key, value);
                }
                JsonValue::Object(map)
            }),
        ]
    })
    .boxed()
}

/// Floor division for signed operands with a positive divisor.
pub(crate) fn div_floor(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Ceiling division for signed operands with a positive divisor.
pub(crate) fn div_ceil(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if a % b != 0 && (a < 0) == (b < 0) {
        quotient + 1
    } else {
        quotient
    }
}

pub(crate) fn seeded_test_runner(seed: u64) -> TestRunner {
    let config = ProptestConfig {
        rng_algorithm: RngAlgorithm::ChaCha,
        ..ProptestConfig::default()
    };
    let seed_bytes = seed_bytes(seed, 32);
    let rng = TestRng::from_seed(config.rng_algorithm, &seed_bytes);
    TestRunner::new_with_rng(config, rng)
}

fn seed_bytes(seed: u64, len: usize) -> Vec<u8> {
    let bytes = seed.to_le_bytes();
    let mut output = Vec::with_capacity(len);
    while output.len() < len {
        output.extend_from_slice(&bytes);
    }
    output.truncate(len);
    output
}

#[cfg(test)]
#[path = "../../tests/internal/generator_unit_tests.rs"]
mod tests;
