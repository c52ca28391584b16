//! Extraction of schema-declared examples.
//!
//! Examples come from three keyword spellings: `example`, `x-example`, and
//! `examples` in either its array form or the OpenAPI map form where each
//! entry nests the payload under `value`. Values are collected in that
//! keyword order and in declaration order within each keyword.
//!
//! Body examples stay whole-payload values; parameter examples are values
//! destined for the parameter's slot under its own name. The distinction
//! matters downstream: a body example `{"name": "John"}` is the entire
//! payload, while the same map declared on a parameter named `name` would
//! put the map under the `name` key of its container.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::encode::literal_text;
use crate::schema::{ApiOperation, JsonObject, ParameterLocation};

/// Errors that abort the examples phase for an operation.
#[derive(Clone, Debug, PartialEq)]
pub enum ExtractionError {
    /// Filler generation for an example case hit an unusable pattern.
    UnsupportedRegex { pattern: String },
    /// The operation declares payload variants but none can be serialized.
    UnsupportedMediaType,
    /// An example value cannot be carried in its parameter slot.
    UnrepresentableValue {
        location: ParameterLocation,
        name: String,
    },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::UnsupportedRegex { pattern } => write!(
                f,
                "Failed to generate test cases from examples for this API operation \
                 because of unsupported regular expression `{pattern}`"
            ),
            ExtractionError::UnsupportedMediaType => write!(
                f,
                "Failed to generate test cases from examples for this API operation \
                 because of unsupported payload media types"
            ),
            ExtractionError::UnrepresentableValue { location, name } => write!(
                f,
                "Failed to generate test cases from examples for this API operation \
                 because the example for {location} parameter '{name}' cannot be \
                 transmitted"
            ),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Examples declared by one parameter, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterExamples {
    pub location: ParameterLocation,
    pub name: String,
    pub values: Vec<JsonValue>,
}

impl ParameterExamples {
    /// The example for a given case index, reusing the last value once the
    /// list runs out.
    pub fn value_at(&self, index: usize) -> Option<&JsonValue> {
        self.values.get(index).or_else(|| self.values.last())
    }
}

/// Whole-payload examples declared by one body variant.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyExamples {
    pub media_type: String,
    pub values: Vec<JsonValue>,
}

impl BodyExamples {
    pub fn value_at(&self, index: usize) -> Option<&JsonValue> {
        self.values.get(index).or_else(|| self.values.last())
    }
}

/// All example sources an operation declares.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperationExamples {
    pub parameters: Vec<ParameterExamples>,
    pub bodies: Vec<BodyExamples>,
}

impl OperationExamples {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.bodies.is_empty()
    }

    /// Number of example cases these sources support: the longest list wins,
    /// shorter lists repeat their last value.
    pub fn case_count(&self) -> usize {
        self.parameters
            .iter()
            .map(|source| source.values.len())
            .chain(self.bodies.iter().map(|source| source.values.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Collects every example source the operation declares.
///
/// Header examples that cannot be placed on the wire are rejected here, and
/// an operation that declares payload variants but none with a media type
/// the engine can serialize fails with the media-type error, whether or not
/// those variants carry examples.
pub fn extract(operation: &ApiOperation) -> Result<OperationExamples, ExtractionError> {
    let mut parameters = Vec::new();
    for parameter in operation.iter_parameters() {
        let values = schema_examples(parameter.schema());
        if values.is_empty() {
            continue;
        }
        if parameter.location() == ParameterLocation::Header {
            for value in &values {
                if literal_text(value).chars().any(char::is_control) {
                    return Err(ExtractionError::UnrepresentableValue {
                        location: parameter.location(),
                        name: parameter.name().to_string(),
                    });
                }
            }
        }
        parameters.push(ParameterExamples {
            location: parameter.location(),
            name: parameter.name().to_string(),
            values,
        });
    }

    let variants = operation.body().variants();
    if !variants.is_empty()
        && !variants
            .iter()
            .any(|variant| is_supported_media_type(variant.media_type()))
    {
        return Err(ExtractionError::UnsupportedMediaType);
    }
    let mut bodies = Vec::new();
    for variant in variants {
        if !is_supported_media_type(variant.media_type()) {
            continue;
        }
        let mut values = Vec::new();
        if let Some(example) = variant.example() {
            values.push(example.clone());
        }
        values.extend(schema_examples(variant.schema()));
        if values.is_empty() {
            continue;
        }
        bodies.push(BodyExamples {
            media_type: variant.media_type().to_string(),
            values,
        });
    }

    Ok(OperationExamples { parameters, bodies })
}

/// Collects `example`, `x-example`, and `examples` values from a raw schema.
pub(crate) fn schema_examples(schema: &JsonObject) -> Vec<JsonValue> {
    let mut values = Vec::new();
    if let Some(value) = schema.get("example") {
        values.push(value.clone());
    }
    if let Some(value) = schema.get("x-example") {
        values.push(value.clone());
    }
    if let Some(declared) = schema.get("examples") {
        match declared {
            JsonValue::Array(items) => values.extend(items.iter().cloned()),
            JsonValue::Object(entries) => {
                for entry in entries.values() {
                    match entry.get("value") {
                        Some(nested) => values.push(nested.clone()),
                        None => values.push(entry.clone()),
                    }
                }
            }
            other => values.push(other.clone()),
        }
    }
    values
}

/// The media type without its parameters, trimmed and lowercased.
pub(crate) fn media_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase()
}

/// Media types the engine can serialize into a request body.
pub(crate) fn is_supported_media_type(media_type: &str) -> bool {
    let essence = media_essence(media_type);
    matches!(
        essence.as_str(),
        "application/json"
            | "text/plain"
            | "application/x-www-form-urlencoded"
            | "multipart/form-data"
            | "application/octet-stream"
    ) || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::schema::{ApiOperation, BodyVariant, Parameter, PayloadAlternatives};

    fn schema_object(value: JsonValue) -> JsonObject {
        value.as_object().cloned().expect("schema object")
    }

    #[test]
    fn keyword_order_is_example_then_x_example_then_examples() {
        let schema = schema_object(json!({
            "examples": ["third", "fourth"],
            "x-example": "second",
            "example": "first",
        }));
        assert_eq!(
            schema_examples(&schema),
            vec![json!("first"), json!("second"), json!("third"), json!("fourth")]
        );
    }

    #[test]
    fn map_form_examples_unwrap_value_entries() {
        let schema = schema_object(json!({
            "examples": {
                "short": {"value": "a"},
                "long": {"value": "abcdef"},
                "raw": "unwrapped",
            },
        }));
        assert_eq!(
            schema_examples(&schema),
            vec![json!("a"), json!("abcdef"), json!("unwrapped")]
        );
    }

    #[test]
    fn parameter_examples_live_under_their_name() {
        let operation = ApiOperation::new("GET", "/users").with_parameter(Parameter::new(
            "name",
            ParameterLocation::Query,
            false,
            schema_object(json!({"type": "string", "example": "John"})),
        ));

        let extracted = extract(&operation).expect("extract");
        assert_eq!(extracted.parameters.len(), 1);
        assert_eq!(extracted.parameters[0].name, "name");
        assert_eq!(extracted.parameters[0].values, vec![json!("John")]);
        assert!(extracted.bodies.is_empty());
    }

    #[test]
    fn body_examples_stay_whole_payload() {
        let mut payload = PayloadAlternatives::new(Vec::new(), true);
        payload.push(BodyVariant::new(
            "application/json",
            schema_object(json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "example": {"name": "John"},
            })),
        ));
        let operation = ApiOperation::new("POST", "/users").with_body(payload);

        let extracted = extract(&operation).expect("extract");
        assert_eq!(extracted.bodies.len(), 1);
        assert_eq!(extracted.bodies[0].values, vec![json!({"name": "John"})]);
        assert!(extracted.parameters.is_empty());
    }

    #[test]
    fn explicit_variant_example_comes_before_schema_examples() {
        let mut payload = PayloadAlternatives::new(Vec::new(), true);
        payload.push(
            BodyVariant::new(
                "application/json",
                schema_object(json!({"type": "string", "example": "from-schema"})),
            )
            .with_example(json!("from-variant")),
        );
        let operation = ApiOperation::new("POST", "/notes").with_body(payload);

        let extracted = extract(&operation).expect("extract");
        assert_eq!(
            extracted.bodies[0].values,
            vec![json!("from-variant"), json!("from-schema")]
        );
    }

    #[test]
    fn header_examples_with_control_characters_are_rejected() {
        let operation = ApiOperation::new("GET", "/users").with_parameter(Parameter::new(
            "X-Trace",
            ParameterLocation::Header,
            false,
            schema_object(json!({"type": "string", "example": "bad\nvalue"})),
        ));

        let error = extract(&operation).expect_err("control characters");
        assert_eq!(
            error,
            ExtractionError::UnrepresentableValue {
                location: ParameterLocation::Header,
                name: "X-Trace".to_string(),
            }
        );
        assert!(
            error
                .to_string()
                .starts_with("Failed to generate test cases from examples for this API"),
            "wrong wording: {error}"
        );
    }

    #[test]
    fn declared_bodies_without_any_serializable_variant_fail() {
        let mut payload = PayloadAlternatives::new(Vec::new(), false);
        payload.push(BodyVariant::new(
            "image/jpeg",
            schema_object(json!({"type": "string", "format": "base64"})),
        ));
        let operation = ApiOperation::new("POST", "/upload").with_body(payload);

        let error = extract(&operation).expect_err("no serializable variant");
        assert_eq!(error, ExtractionError::UnsupportedMediaType);
    }

    #[test]
    fn only_unsupported_media_types_with_examples_fail() {
        let mut payload = PayloadAlternatives::new(Vec::new(), true);
        payload.push(
            BodyVariant::new("application/xml", schema_object(json!({"type": "string"})))
                .with_example(json!("<xml/>")),
        );
        let operation = ApiOperation::new("POST", "/import").with_body(payload);

        let error = extract(&operation).expect_err("unsupported media");
        assert_eq!(error, ExtractionError::UnsupportedMediaType);
        assert_eq!(
            error.to_string(),
            "Failed to generate test cases from examples for this API operation \
             because of unsupported payload media types"
        );
    }

    #[test]
    fn supported_variant_examples_win_over_unsupported_ones() {
        let mut payload = PayloadAlternatives::new(Vec::new(), true);
        payload.push(
            BodyVariant::new("application/xml", schema_object(json!({"type": "string"})))
                .with_example(json!("<xml/>")),
        );
        payload.push(
            BodyVariant::new("application/json", schema_object(json!({"type": "string"})))
                .with_example(json!("data")),
        );
        let operation = ApiOperation::new("POST", "/import").with_body(payload);

        let extracted = extract(&operation).expect("extract");
        assert_eq!(extracted.bodies.len(), 1);
        assert_eq!(extracted.bodies[0].media_type, "application/json");
    }

    #[test]
    fn case_count_takes_the_longest_list_and_short_lists_repeat() {
        let operation = ApiOperation::new("GET", "/search")
            .with_parameter(Parameter::new(
                "q",
                ParameterLocation::Query,
                true,
                schema_object(json!({"type": "string", "examples": ["a", "b", "c"]})),
            ))
            .with_parameter(Parameter::new(
                "page",
                ParameterLocation::Query,
                false,
                schema_object(json!({"type": "integer", "example": 1})),
            ));

        let extracted = extract(&operation).expect("extract");
        assert_eq!(extracted.case_count(), 3);
        let page = &extracted.parameters[1];
        assert_eq!(page.value_at(0), Some(&json!(1)));
        assert_eq!(page.value_at(2), Some(&json!(1)));
    }

    #[test]
    fn json_suffix_media_types_are_supported() {
        assert!(is_supported_media_type("application/json"));
        assert!(is_supported_media_type("application/problem+json"));
        assert!(is_supported_media_type("application/json; charset=utf-8"));
        assert!(is_supported_media_type("multipart/form-data"));
        assert!(!is_supported_media_type("application/xml"));
        assert!(!is_supported_media_type("image/png"));
    }
}
