//! Parsed operation model: parameters per location and payload alternatives.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Raw JSON-Schema-like definition as delivered by the document loader.
pub type JsonObject = Map<String, JsonValue>;

/// Where a parameter is transmitted in the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// All locations in the order negation trials iterate them.
    pub const ALL: [ParameterLocation; 4] = [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Cookie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter of an operation.
///
/// The schema is kept in its raw form: example keys (`example`, `x-example`,
/// `examples`) live alongside constraint keywords in the same map and are
/// read by the example extractor, not by the generator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    name: String,
    location: ParameterLocation,
    required: bool,
    schema: JsonObject,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        required: bool,
        schema: JsonObject,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            // Path parameters are always required regardless of the document.
            required: required || location == ParameterLocation::Path,
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    pub fn required(&self) -> bool {
        self.required
    }

    /// Raw definition, including vendor example keys.
    pub fn schema(&self) -> &JsonObject {
        &self.schema
    }
}

/// Ordered, name-unique parameters for a single location.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any existing parameter with the same name
    /// in place so insertion order stays stable.
    pub fn insert(&mut self, parameter: Parameter) {
        if let Some(existing) = self
            .parameters
            .iter_mut()
            .find(|existing| existing.name == parameter.name)
        {
            *existing = parameter;
        } else {
            self.parameters.push(parameter);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

/// One media-type-tagged body schema.
///
/// `example` carries a media-type-level example; schema-level example keys
/// stay inside `schema` and are collected separately.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BodyVariant {
    media_type: String,
    schema: JsonObject,
    example: Option<JsonValue>,
}

impl BodyVariant {
    pub fn new(media_type: impl Into<String>, schema: JsonObject) -> Self {
        Self {
            media_type: media_type.into(),
            schema,
            example: None,
        }
    }

    pub fn with_example(mut self, example: JsonValue) -> Self {
        self.example = Some(example);
        self
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn schema(&self) -> &JsonObject {
        &self.schema
    }

    pub fn example(&self) -> Option<&JsonValue> {
        self.example.as_ref()
    }
}

/// Ordered body alternatives; empty means the operation takes no body.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PayloadAlternatives {
    variants: Vec<BodyVariant>,
    required: bool,
}

impl PayloadAlternatives {
    pub fn new(variants: Vec<BodyVariant>, required: bool) -> Self {
        Self { variants, required }
    }

    pub fn push(&mut self, variant: BodyVariant) {
        self.variants.push(variant);
    }

    pub fn variants(&self) -> &[BodyVariant] {
        &self.variants
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// One method+path entry of an API description, with its parameters grouped
/// by location and its payload alternatives. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiOperation {
    method: String,
    path: String,
    path_parameters: ParameterSet,
    query: ParameterSet,
    headers: ParameterSet,
    cookies: ParameterSet,
    body: PayloadAlternatives,
}

impl ApiOperation {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            path_parameters: ParameterSet::new(),
            query: ParameterSet::new(),
            headers: ParameterSet::new(),
            cookies: ParameterSet::new(),
            body: PayloadAlternatives::default(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.add_parameter(parameter);
        self
    }

    pub fn with_body(mut self, body: PayloadAlternatives) -> Self {
        self.body = body;
        self
    }

    /// Routes the parameter to the set matching its location.
    pub fn add_parameter(&mut self, parameter: Parameter) {
        match parameter.location() {
            ParameterLocation::Path => self.path_parameters.insert(parameter),
            ParameterLocation::Query => self.query.insert(parameter),
            ParameterLocation::Header => self.headers.insert(parameter),
            ParameterLocation::Cookie => self.cookies.insert(parameter),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self, location: ParameterLocation) -> &ParameterSet {
        match location {
            ParameterLocation::Path => &self.path_parameters,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.headers,
            ParameterLocation::Cookie => &self.cookies,
        }
    }

    pub fn body(&self) -> &PayloadAlternatives {
        &self.body
    }

    /// All parameters across locations, in the deterministic order used for
    /// negation trials: path, query, header, cookie.
    pub fn iter_parameters(&self) -> impl Iterator<Item = &Parameter> {
        ParameterLocation::ALL
            .iter()
            .flat_map(|location| self.parameters(*location).iter())
    }

    /// Label used in skip and failure reasons, e.g. `GET /users/{user_id}`.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}
