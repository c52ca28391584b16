use super::*;

use serde_json::json;

use crate::schema::{BodyVariant, Parameter, PayloadAlternatives};

fn schema_object(value: JsonValue) -> JsonObject {
    value.as_object().cloned().expect("schema object")
}

fn sample<T: fmt::Debug>(strategy: &BoxedStrategy<T>) -> T {
    let mut runner = TestRunner::default();
    strategy
        .new_tree(&mut runner)
        .expect("value tree")
        .current()
}

fn query_parameter(name: &str, required: bool, schema: JsonValue) -> Parameter {
    Parameter::new(
        name,
        ParameterLocation::Query,
        required,
        schema_object(schema),
    )
}

#[test]
fn prepare_keeps_parameters_in_location_order() {
    let operation = ApiOperation::new("get", "/items/{id}")
        .with_parameter(query_parameter("limit", false, json!({"type": "integer"})))
        .with_parameter(Parameter::new(
            "x-trace",
            ParameterLocation::Header,
            false,
            schema_object(json!({"type": "string"})),
        ))
        .with_parameter(Parameter::new(
            "id",
            ParameterLocation::Path,
            true,
            schema_object(json!({"type": "integer"})),
        ));

    let prepared = prepare(&operation).expect("prepare");
    let locations: Vec<ParameterLocation> = prepared
        .parameters
        .iter()
        .map(|parameter| parameter.location)
        .collect();
    assert_eq!(
        locations,
        vec![
            ParameterLocation::Path,
            ParameterLocation::Query,
            ParameterLocation::Header,
        ]
    );
}

#[test]
fn prepare_drops_unsupported_media_variants() {
    let operation = ApiOperation::new("post", "/items").with_body(PayloadAlternatives::new(
        vec![
            BodyVariant::new("application/json", schema_object(json!({"type": "object"}))),
            BodyVariant::new("application/xml", schema_object(json!({"type": "object"}))),
        ],
        true,
    ));

    let prepared = prepare(&operation).expect("prepare");
    assert_eq!(prepared.variants.len(), 1);
    assert_eq!(prepared.variants[0].media_type, "application/json");
    assert!(prepared.body_declared);
    assert!(prepared.body_required);
}

#[test]
fn prepare_rejects_recursive_parameter_schemas() {
    let operation = ApiOperation::new("get", "/loop")
        .with_parameter(query_parameter("node", true, json!({"$ref": "#"})));

    let result = prepare(&operation);
    assert!(matches!(result, Err(CaseError::Schema(_))));
}

#[test]
fn base_case_holds_canonical_required_values_only() {
    let operation = ApiOperation::new("get", "/items")
        .with_parameter(query_parameter(
            "limit",
            true,
            json!({"type": "integer", "minimum": 1, "maximum": 10}),
        ))
        .with_parameter(query_parameter("q", false, json!({"type": "string"})));

    let prepared = prepare(&operation).expect("prepare");
    let base = base_case(&prepared, GenerationMode::Positive).expect("base case");
    assert_eq!(base.query.get("limit"), Some(&json!(1)));
    assert!(!base.query.contains_key("q"));
    assert_eq!(base.body, Body::NotSet);
    assert_eq!(base.source, CaseSource::Coverage);
}

#[test]
fn body_from_value_follows_the_media_type() {
    let form = body_from_value(
        "application/x-www-form-urlencoded",
        json!({"name": "ada", "age": 36}),
    );
    assert_eq!(
        form,
        Body::Form(vec![
            ("name".to_string(), FormField::Text("ada".to_string())),
            ("age".to_string(), FormField::Text("36".to_string())),
        ])
    );

    let binary = body_from_value("application/octet-stream", json!("raw bytes"));
    assert_eq!(binary, Body::Binary(Binary::new(b"raw bytes".to_vec())));

    let json_body = body_from_value("application/json", json!({"name": "ada"}));
    assert_eq!(json_body, Body::Json(json!({"name": "ada"})));
}

#[test]
fn examples_error_rewording_only_touches_regex_failures() {
    let reworded = as_examples_error(CaseError::Generation(GenerationError::UnsupportedRegex {
        pattern: "(?<!a)b".to_string(),
    }));
    assert_eq!(
        reworded,
        CaseError::Extraction(ExtractionError::UnsupportedRegex {
            pattern: "(?<!a)b".to_string(),
        })
    );

    let untouched = as_examples_error(CaseError::Generation(GenerationError::Unsatisfiable {
        reason: "empty window".to_string(),
    }));
    assert!(matches!(untouched, CaseError::Generation(_)));
}

#[test]
fn required_body_without_serializable_media_cannot_be_generated() {
    let operation = ApiOperation::new("post", "/upload").with_body(PayloadAlternatives::new(
        vec![BodyVariant::new(
            "application/xml",
            schema_object(json!({"type": "object"})),
        )],
        true,
    ));

    let prepared = prepare(&operation).expect("prepare");
    let result = positive_body_strategy(&prepared, &FormatRegistry::new(), &GenerationConfig::new());
    assert!(matches!(
        result,
        Err(CaseError::Generation(GenerationError::Unsatisfiable { .. }))
    ));
}

#[test]
fn fold_entries_preserves_slot_order() {
    let slots = vec![
        (
            ParameterLocation::Path,
            "id".to_string(),
            Just(Some(json!(1))).boxed(),
        ),
        (
            ParameterLocation::Query,
            "limit".to_string(),
            Just(Some(json!(5))).boxed(),
        ),
        (
            ParameterLocation::Query,
            "offset".to_string(),
            Just(None).boxed(),
        ),
    ];

    let entries = sample(&fold_entries(slots));
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].1, "id");
    assert_eq!(entries[1].1, "limit");
    assert_eq!(entries[2], (ParameterLocation::Query, "offset".to_string(), None));
}

#[test]
fn negation_needs_at_least_one_negatable_atom() {
    let operation =
        ApiOperation::new("get", "/anything").with_parameter(query_parameter("q", true, json!({})));

    let prepared = prepare(&operation).expect("prepare");
    let strategy = negative_case_strategy(&prepared, &FormatRegistry::new(), &GenerationConfig::new())
        .expect("negation probe");
    assert!(strategy.is_none());
}

#[test]
fn example_strategies_replay_values_by_index() {
    let operation = ApiOperation::new("get", "/items").with_parameter(query_parameter(
        "limit",
        true,
        json!({"type": "integer", "examples": [1, 2, 3]}),
    ));

    let prepared = prepare(&operation).expect("prepare");
    let sources = prepared.examples.clone().expect("examples");
    let strategies =
        example_case_strategies(&prepared, &sources, &FormatRegistry::new(), &GenerationConfig::new())
            .expect("example strategies");
    assert_eq!(strategies.len(), 3);

    let second = sample(&strategies[1]);
    assert_eq!(second.query.get("limit"), Some(&json!(2)));
    assert_eq!(second.source, CaseSource::Example);
    assert_eq!(second.mode, GenerationMode::Positive);
}
