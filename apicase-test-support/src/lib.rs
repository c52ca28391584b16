use ctor::ctor;

#[ctor]
fn init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

use std::fmt;

use apicase_core::{
    ApiOperation, BodyVariant, JsonObject, Parameter, ParameterLocation, PayloadAlternatives,
};
use proptest::prelude::*;
use proptest::test_runner::TestRunner;
use serde_json::Value as JsonValue;

/// Panics when `value` is not a JSON object.
pub fn schema_object(value: JsonValue) -> JsonObject {
    value.as_object().cloned().expect("schema object")
}

pub fn required_query(name: &str, schema: JsonValue) -> Parameter {
    Parameter::new(name, ParameterLocation::Query, true, schema_object(schema))
}

pub fn optional_query(name: &str, schema: JsonValue) -> Parameter {
    Parameter::new(name, ParameterLocation::Query, false, schema_object(schema))
}

pub fn path_parameter(name: &str, schema: JsonValue) -> Parameter {
    Parameter::new(name, ParameterLocation::Path, true, schema_object(schema))
}

pub fn header_parameter(name: &str, required: bool, schema: JsonValue) -> Parameter {
    Parameter::new(name, ParameterLocation::Header, required, schema_object(schema))
}

/// A request body with a single `application/json` variant.
pub fn json_body(schema: JsonValue, required: bool) -> PayloadAlternatives {
    PayloadAlternatives::new(
        vec![BodyVariant::new("application/json", schema_object(schema))],
        required,
    )
}

/// A GET operation with one required query parameter.
pub fn query_operation(name: &str, schema: JsonValue) -> ApiOperation {
    ApiOperation::new("GET", "/items").with_parameter(required_query(name, schema))
}

/// Draws one value from a strategy with a deterministic runner.
pub fn sample<T: fmt::Debug>(strategy: &BoxedStrategy<T>) -> T {
    let mut runner = TestRunner::deterministic();
    strategy
        .new_tree(&mut runner)
        .expect("value tree")
        .current()
}

/// Draws `count` values from a strategy, reusing one deterministic runner.
pub fn sample_many<T: fmt::Debug>(strategy: &BoxedStrategy<T>, count: usize) -> Vec<T> {
    let mut runner = TestRunner::deterministic();
    (0..count)
        .map(|_| {
            strategy
                .new_tree(&mut runner)
                .expect("value tree")
                .current()
        })
        .collect()
}
