//! Generated test cases and their projection into transport arguments.

use std::fmt;

use serde_json::Value as JsonValue;
use url::Url;

use crate::GenerationMode;
use crate::encode::{Binary, FormField, jsonify_literals, literal_text, render_path_value};
use crate::schema::{JsonObject, ParameterLocation};

/// Request payload representations.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// No payload was drawn for this case.
    NotSet,
    Json(JsonValue),
    Binary(Binary),
    Form(Vec<(String, FormField)>),
}

impl Body {
    pub fn is_set(&self) -> bool {
        !matches!(self, Body::NotSet)
    }
}

/// How a case came to be.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaseSource {
    /// Extracted from schema-declared examples.
    Example,
    /// Drawn from compiled schema strategies.
    Generated,
    /// Produced by deterministic boundary enumeration.
    Coverage,
}

/// One generated request for an API operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub method: String,
    /// Path template with `{name}` placeholders still in place.
    pub path: String,
    pub path_parameters: JsonObject,
    pub query: JsonObject,
    pub headers: JsonObject,
    pub cookies: JsonObject,
    pub body: Body,
    pub media_type: Option<String>,
    pub mode: GenerationMode,
    pub source: CaseSource,
}

impl Case {
    /// The container holding parameters of the given location.
    pub fn container(&self, location: ParameterLocation) -> &JsonObject {
        match location {
            ParameterLocation::Path => &self.path_parameters,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.headers,
            ParameterLocation::Cookie => &self.cookies,
        }
    }

    pub fn container_mut(&mut self, location: ParameterLocation) -> &mut JsonObject {
        match location {
            ParameterLocation::Path => &mut self.path_parameters,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.headers,
            ParameterLocation::Cookie => &mut self.cookies,
        }
    }

    /// The path with placeholders substituted by rendered parameter values.
    /// Placeholders without a drawn value stay in template form.
    pub fn formatted_path(&self) -> String {
        let mut path = self.path.clone();
        for (name, value) in &self.path_parameters {
            let placeholder = format!("{{{name}}}");
            if path.contains(&placeholder) {
                path = path.replace(&placeholder, &render_path_value(value));
            }
        }
        path
    }

    /// Projects the case into transport arguments rooted at `base_url`.
    ///
    /// Header values containing control characters are refused here; they
    /// cannot be placed on the wire.
    pub fn as_transport_arguments(&self, base_url: &str) -> Result<TransportArguments, TransportError> {
        let base = Url::parse(base_url).map_err(|error| TransportError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: error.to_string(),
        })?;

        let mut headers = Vec::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let text = literal_text(value);
            if text.chars().any(char::is_control) {
                return Err(TransportError::UntransmissibleHeader { name: name.clone() });
            }
            headers.push((name.clone(), text));
        }

        let cookies = self
            .cookies
            .iter()
            .map(|(name, value)| (name.clone(), literal_text(value)))
            .collect();

        let query = self
            .query
            .iter()
            .map(|(name, value)| (name.clone(), jsonify_literals(value)))
            .collect();

        Ok(TransportArguments {
            method: self.method.clone(),
            base,
            path: self.formatted_path(),
            query,
            headers,
            cookies,
            body: self.body.clone(),
            media_type: self.media_type.clone(),
        })
    }
}

/// Everything an HTTP client needs to send one case.
///
/// The request path is carried as text next to the parsed base URL: WHATWG
/// URL parsing collapses percent-encoded dot segments, which would undo the
/// `%2E` quoting applied to path parameter values.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportArguments {
    pub method: String,
    /// Parsed base URL; should carry no query or fragment.
    pub base: Url,
    /// Formatted request path with a leading `/` and encoded segments.
    pub path: String,
    /// Query parameters with booleans and nulls in JSON literal text form.
    pub query: JsonObject,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Body,
    pub media_type: Option<String>,
}

impl TransportArguments {
    /// The full request URL as text, before query serialization.
    pub fn url(&self) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Errors from projecting a case into transport arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportError {
    InvalidBaseUrl { base_url: String, reason: String },
    UntransmissibleHeader { name: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidBaseUrl { base_url, reason } => {
                write!(f, "invalid base URL '{base_url}': {reason}")
            }
            TransportError::UntransmissibleHeader { name } => {
                write!(
                    f,
                    "header '{name}' contains characters that cannot be sent over HTTP"
                )
            }
        }
    }
}

impl std::error::Error for TransportError {}
