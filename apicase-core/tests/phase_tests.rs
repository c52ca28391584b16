use jsonschema::draft202012;
use proptest::prelude::*;
use serde_json::json;

use apicase_core::{
    ApiOperation, Body, BodyVariant, CaseSource, FormatRegistry, GenerationConfig,
    PayloadAlternatives, plan,
};
use apicase_test_support::{json_body, query_operation, required_query, schema_object};

#[test]
fn explicit_cases_come_before_coverage_and_generated_ones() {
    let operation = ApiOperation::new("GET", "/items").with_parameter(required_query(
        "limit",
        json!({"type": "integer", "minimum": 1, "maximum": 9, "examples": [3, 5]}),
    ));

    let case_plan = plan(
        &operation,
        &FormatRegistry::new(),
        &GenerationConfig::new().with_seed(17),
    )
    .expect("plan");
    let cases = case_plan.cases(12).expect("cases");

    assert_eq!(cases.len(), 12);
    assert_eq!(cases[0].source, CaseSource::Example);
    assert_eq!(cases[0].query.get("limit"), Some(&json!(3)));
    assert_eq!(cases[1].source, CaseSource::Example);
    assert_eq!(cases[1].query.get("limit"), Some(&json!(5)));
    assert_eq!(cases[2].source, CaseSource::Coverage);
    assert!(
        cases
            .iter()
            .any(|case| case.source == CaseSource::Generated)
    );
}

#[test]
fn coverage_layers_one_boundary_over_canonical_siblings() {
    let operation = ApiOperation::new("GET", "/search")
        .with_parameter(required_query(
            "limit",
            json!({"type": "integer", "minimum": 1, "maximum": 5}),
        ))
        .with_parameter(required_query(
            "q",
            json!({"type": "string", "minLength": 2, "maxLength": 2}),
        ));

    let case_plan = plan(&operation, &FormatRegistry::new(), &GenerationConfig::new())
        .expect("plan");
    let coverage = case_plan.coverage();

    assert!(!coverage.is_empty());
    for case in coverage {
        assert!(case.query.contains_key("limit"), "missing limit: {case:?}");
        assert!(case.query.contains_key("q"), "missing q: {case:?}");
    }
    assert!(
        coverage
            .iter()
            .any(|case| case.query.get("limit") == Some(&json!(1)))
    );
    assert!(
        coverage
            .iter()
            .any(|case| case.query.get("limit") == Some(&json!(5)))
    );
}

#[test]
fn generated_positive_cases_conform_to_the_schema() {
    let schema = json!({"type": "integer", "minimum": 1, "maximum": 9});
    let operation = query_operation("limit", schema.clone());
    let validator = draft202012::new(&schema).expect("validator");

    let case_plan = plan(
        &operation,
        &FormatRegistry::new(),
        &GenerationConfig::new().with_seed(7),
    )
    .expect("plan");
    for case in case_plan.cases(30).expect("cases") {
        let value = case.query.get("limit").expect("limit present");
        assert!(validator.is_valid(value), "non-conforming draw: {value}");
    }
}

#[test]
fn unusable_pattern_with_examples_reports_the_examples_wording() {
    let operation = ApiOperation::new("GET", "/items")
        .with_parameter(required_query(
            "limit",
            json!({"type": "integer", "examples": [1]}),
        ))
        .with_parameter(required_query(
            "code",
            json!({"type": "string", "pattern": "\\bword\\b"}),
        ));

    let case_plan = plan(&operation, &FormatRegistry::new(), &GenerationConfig::new())
        .expect("plan");
    let error = case_plan.cases(5).expect_err("nothing can be drawn");
    assert_eq!(
        error.to_string(),
        "Failed to generate test cases from examples for this API operation \
         because of unsupported regular expression `\\bword\\b`"
    );
}

#[test]
fn unusable_pattern_without_examples_reports_the_generated_wording() {
    let operation = ApiOperation::new("GET", "/items").with_parameter(required_query(
        "code",
        json!({"type": "string", "pattern": "\\bword\\b"}),
    ));

    let case_plan = plan(&operation, &FormatRegistry::new(), &GenerationConfig::new())
        .expect("plan");
    let error = case_plan.cases(5).expect_err("nothing can be drawn");
    assert_eq!(
        error.to_string(),
        "Failed to generate test cases for this API operation \
         because of unsupported regular expression `\\bword\\b`"
    );
}

#[test]
fn seeded_plans_redraw_identical_cases() {
    let operation = query_operation(
        "limit",
        json!({"type": "integer", "minimum": 0, "maximum": 100}),
    );
    let config = GenerationConfig::new().with_seed(99);

    let first = plan(&operation, &FormatRegistry::new(), &config)
        .expect("plan")
        .cases(20)
        .expect("cases");
    let second = plan(&operation, &FormatRegistry::new(), &config)
        .expect("plan")
        .cases(20)
        .expect("cases");
    assert_eq!(first, second);
}

#[test]
fn optional_bodies_are_sometimes_left_out() {
    let schema = json!({
        "type": "object",
        "properties": {"id": {"type": "integer"}},
        "required": ["id"],
    });
    let operation = ApiOperation::new("POST", "/items").with_body(json_body(schema, false));

    let case_plan = plan(
        &operation,
        &FormatRegistry::new(),
        &GenerationConfig::new().with_seed(3),
    )
    .expect("plan");
    let cases = case_plan.cases(80).expect("cases");
    let with_body = cases.iter().filter(|case| case.body.is_set()).count();
    assert!(with_body > 0, "no case carried a body");
    assert!(with_body < cases.len(), "every case carried a body");
}

#[test]
fn required_bodies_are_always_present() {
    let schema = json!({
        "type": "object",
        "properties": {"id": {"type": "integer"}},
        "required": ["id"],
    });
    let operation = ApiOperation::new("POST", "/items").with_body(json_body(schema, true));

    let case_plan = plan(
        &operation,
        &FormatRegistry::new(),
        &GenerationConfig::new().with_seed(3),
    )
    .expect("plan");
    for case in case_plan.cases(30).expect("cases") {
        assert!(case.body.is_set(), "case without body: {case:?}");
        assert_eq!(case.media_type.as_deref(), Some("application/json"));
    }
}

#[test]
fn binary_bodies_reach_transport_untouched() {
    let operation = ApiOperation::new("POST", "/upload").with_body(PayloadAlternatives::new(
        vec![BodyVariant::new(
            "application/octet-stream",
            schema_object(json!({"type": "string", "format": "binary"})),
        )],
        true,
    ));

    let case_plan = plan(
        &operation,
        &FormatRegistry::new(),
        &GenerationConfig::new().with_seed(5),
    )
    .expect("plan");
    for case in case_plan.cases(10).expect("cases") {
        assert!(
            matches!(case.body, Body::Binary(_)),
            "unexpected body: {:?}",
            case.body
        );
        let transport = case
            .as_transport_arguments("http://api.test")
            .expect("transport");
        assert_eq!(transport.body, case.body);
        assert_eq!(
            transport.media_type.as_deref(),
            Some("application/octet-stream")
        );
    }
}

#[test]
fn registered_formats_drive_generated_draws() {
    let mut registry = FormatRegistry::new();
    registry
        .register("color", Just(json!("red")).boxed())
        .expect("register");
    let operation = query_operation("shade", json!({"type": "string", "format": "color"}));

    let case_plan = plan(
        &operation,
        &registry,
        &GenerationConfig::new().with_seed(1),
    )
    .expect("plan");
    let cases = case_plan.cases(10).expect("cases");
    let generated: Vec<_> = cases
        .iter()
        .filter(|case| case.source == CaseSource::Generated)
        .collect();
    assert!(!generated.is_empty());
    for case in generated {
        assert_eq!(case.query.get("shade"), Some(&json!("red")));
    }
}
