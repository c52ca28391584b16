//! Case planning for an API operation.
//!
//! A [`CasePlan`] gathers the three case sources in priority order:
//! explicit cases replayed from schema examples, deterministic coverage
//! cases built from constraint boundaries, and randomized cases drawn
//! from proptest strategies. Failures in one source are recorded on the
//! plan and only surface as errors when no source produced anything.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use jsonschema::{Validator, draft202012};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use proptest::strategy::Union;
use proptest::test_runner::TestRunner;
use serde_json::Value as JsonValue;

use crate::case::{Body, Case, CaseSource};
use crate::coverage::{boundary_values, canonical_value};
use crate::encode::{Binary, FormField, literal_text};
use crate::examples::{self, ExtractionError, OperationExamples};
use crate::generator::negative::{is_negatable, negated_value_strategy};
use crate::generator::{
    FormatRegistry, GenerationError, optional_value, seeded_test_runner, value_strategy,
};
use crate::normalize::{self, SchemaNode};
use crate::schema::{ApiOperation, JsonObject, ParameterLocation};
use crate::{GenerationConfig, GenerationMode};

/// Why no negative case can exist for an operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NegationError {
    /// Every parameter and payload schema accepts all values.
    ImpossibleNegation,
}

impl fmt::Display for NegationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegationError::ImpossibleNegation => {
                f.write_str("Impossible to generate negative test cases")
            }
        }
    }
}

impl std::error::Error for NegationError {}

/// Errors raised while planning or drawing cases.
#[derive(Clone, Debug, PartialEq)]
pub enum CaseError {
    /// A parameter or payload schema could not be normalized.
    Schema(normalize::SchemaError),
    /// The example phase failed for this operation.
    Extraction(ExtractionError),
    /// The negative mode was requested but nothing can be violated.
    Negation(NegationError),
    /// A strategy could not be built from the schema.
    Generation(GenerationError),
    /// Rejection sampling ran out of attempts without an accepted draw.
    Exhausted { attempts: usize },
    /// The generation configuration is unusable.
    Config(crate::ConfigError),
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseError::Schema(error) => error.fmt(f),
            CaseError::Extraction(error) => error.fmt(f),
            CaseError::Negation(error) => error.fmt(f),
            CaseError::Generation(GenerationError::UnsupportedRegex { pattern }) => write!(
                f,
                "Failed to generate test cases for this API operation because of \
                 unsupported regular expression `{pattern}`"
            ),
            CaseError::Generation(error) => error.fmt(f),
            CaseError::Exhausted { attempts } => write!(
                f,
                "Gave up on drawing a test case after {attempts} rejected attempts"
            ),
            CaseError::Config(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for CaseError {}

struct PreparedParameter {
    name: String,
    location: ParameterLocation,
    required: bool,
    node: SchemaNode,
    validator: Option<Arc<Validator>>,
}

struct PreparedVariant {
    media_type: String,
    node: SchemaNode,
    validator: Option<Arc<Validator>>,
}

/// An operation with every schema normalized and compiled exactly once.
pub struct PreparedOperation {
    method: String,
    path: String,
    parameters: Vec<PreparedParameter>,
    /// Payload variants the engine can serialize.
    variants: Vec<PreparedVariant>,
    body_declared: bool,
    body_required: bool,
    examples: Result<OperationExamples, ExtractionError>,
}

impl PreparedOperation {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Normalizes every schema of the operation.
///
/// Schema errors are fatal for the whole operation; extraction errors are
/// kept on the result and charged to the example phase later.
pub fn prepare(operation: &ApiOperation) -> Result<PreparedOperation, CaseError> {
    let mut parameters = Vec::new();
    for parameter in operation.iter_parameters() {
        let node = normalize::normalize(parameter.schema()).map_err(CaseError::Schema)?;
        parameters.push(PreparedParameter {
            name: parameter.name().to_string(),
            location: parameter.location(),
            required: parameter.required(),
            node,
            validator: compile_validator(parameter.schema()),
        });
    }

    let mut variants = Vec::new();
    for variant in operation.body().variants() {
        if !examples::is_supported_media_type(variant.media_type()) {
            continue;
        }
        let node = normalize::normalize(variant.schema()).map_err(CaseError::Schema)?;
        variants.push(PreparedVariant {
            media_type: variant.media_type().to_string(),
            node,
            validator: compile_validator(variant.schema()),
        });
    }

    Ok(PreparedOperation {
        method: operation.method().to_string(),
        path: operation.path().to_string(),
        parameters,
        variants,
        body_declared: !operation.body().variants().is_empty(),
        body_required: operation.body().required(),
        examples: examples::extract(operation),
    })
}

// Failures here degrade negative verification to structural checks.
fn compile_validator(schema: &JsonObject) -> Option<Arc<Validator>> {
    draft202012::new(&JsonValue::Object(schema.clone()))
        .ok()
        .map(Arc::new)
}

/// Builds the case plan for one operation.
pub fn plan(
    operation: &ApiOperation,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<CasePlan, CaseError> {
    config.validate().map_err(CaseError::Config)?;
    let prepared = prepare(operation)?;
    Ok(plan_prepared(&prepared, registry, config))
}

/// Builds a plan from an already prepared operation.
pub fn plan_prepared(
    prepared: &PreparedOperation,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> CasePlan {
    let mut modes: Vec<GenerationMode> = Vec::new();
    for mode in &config.modes {
        if !modes.contains(mode) {
            modes.push(*mode);
        }
    }

    let mut errors = Vec::new();

    let explicit = match &prepared.examples {
        Ok(sources) if !sources.is_empty() => {
            match example_case_strategies(prepared, sources, registry, config) {
                Ok(strategies) => strategies,
                Err(error) => {
                    errors.push(error);
                    Vec::new()
                }
            }
        }
        Ok(_) => Vec::new(),
        Err(error) => {
            errors.push(CaseError::Extraction(error.clone()));
            Vec::new()
        }
    };

    let mut coverage = Vec::new();
    for mode in &modes {
        coverage.extend(coverage_cases(prepared, *mode));
    }

    let mut generated = Vec::new();
    for mode in &modes {
        match mode {
            GenerationMode::Positive => {
                match positive_case_strategy(prepared, registry, config) {
                    Ok(strategy) => generated.push(strategy),
                    Err(error) => errors.push(error),
                }
            }
            GenerationMode::Negative => {
                match negative_case_strategy(prepared, registry, config) {
                    Ok(Some(strategy)) => generated.push(strategy),
                    Ok(None) => {
                        errors.push(CaseError::Negation(NegationError::ImpossibleNegation));
                    }
                    Err(error) => errors.push(error),
                }
            }
        }
    }

    log::debug!(
        "planned {} {}: {} explicit, {} coverage, {} generated sources, {} errors",
        prepared.method,
        prepared.path,
        explicit.len(),
        coverage.len(),
        generated.len(),
        errors.len(),
    );

    CasePlan {
        method: prepared.method.clone(),
        path: prepared.path.clone(),
        explicit,
        coverage,
        generated,
        errors,
        seed: config.seed,
        max_rejection_attempts: config.max_rejection_attempts,
    }
}

/// The case sources planned for one operation.
pub struct CasePlan {
    method: String,
    path: String,
    explicit: Vec<BoxedStrategy<Case>>,
    coverage: Vec<Case>,
    generated: Vec<BoxedStrategy<Case>>,
    errors: Vec<CaseError>,
    seed: Option<u64>,
    max_rejection_attempts: usize,
}

impl CasePlan {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether any source can produce cases.
    pub fn has_cases(&self) -> bool {
        !self.explicit.is_empty() || !self.coverage.is_empty() || !self.generated.is_empty()
    }

    /// Failures recorded while planning, in the order the phases ran.
    pub fn errors(&self) -> &[CaseError] {
        &self.errors
    }

    /// The deterministic coverage cases.
    pub fn coverage(&self) -> &[Case] {
        &self.coverage
    }

    /// A single strategy over every case source, for embedding the plan
    /// into a property test.
    pub fn strategy(&self) -> Option<BoxedStrategy<Case>> {
        let mut arms: Vec<BoxedStrategy<Case>> = Vec::new();
        arms.extend(self.explicit.iter().cloned());
        if !self.coverage.is_empty() {
            arms.push(select(self.coverage.clone()).boxed());
        }
        arms.extend(self.generated.iter().cloned());
        if arms.is_empty() {
            None
        } else {
            Some(Union::new(arms).boxed())
        }
    }

    /// Draws up to `count` cases: every explicit case first, then the
    /// coverage cases, then generated draws until the count is reached.
    ///
    /// Returns the first recorded planning error when nothing could be
    /// drawn at all.
    pub fn cases(&self, count: usize) -> Result<Vec<Case>, CaseError> {
        let mut runner = match self.seed {
            Some(seed) => seeded_test_runner(seed),
            None => TestRunner::default(),
        };

        let mut cases = Vec::new();
        for strategy in &self.explicit {
            if cases.len() >= count {
                break;
            }
            cases.push(self.draw(strategy, &mut runner)?);
        }
        for case in &self.coverage {
            if cases.len() >= count {
                break;
            }
            cases.push(case.clone());
        }
        if !self.generated.is_empty() {
            let mut arm = 0usize;
            while cases.len() < count {
                let strategy = &self.generated[arm % self.generated.len()];
                arm += 1;
                cases.push(self.draw(strategy, &mut runner)?);
            }
        }

        if cases.is_empty() {
            if let Some(error) = self.errors.first() {
                return Err(error.clone());
            }
        }
        log::debug!(
            "drew {} cases for {} {}",
            cases.len(),
            self.method,
            self.path,
        );
        Ok(cases)
    }

    fn draw(
        &self,
        strategy: &BoxedStrategy<Case>,
        runner: &mut TestRunner,
    ) -> Result<Case, CaseError> {
        for _ in 0..self.max_rejection_attempts {
            if let Ok(tree) = strategy.new_tree(runner) {
                return Ok(tree.current());
            }
        }
        Err(CaseError::Exhausted {
            attempts: self.max_rejection_attempts,
        })
    }
}

fn example_case_strategies(
    prepared: &PreparedOperation,
    sources: &OperationExamples,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<Vec<BoxedStrategy<Case>>, CaseError> {
    let count = sources.case_count();
    let mut strategies = Vec::with_capacity(count);
    for index in 0..count {
        let mut slots = Vec::with_capacity(prepared.parameters.len());
        for parameter in &prepared.parameters {
            let example = sources
                .parameters
                .iter()
                .find(|source| {
                    source.name == parameter.name && source.location == parameter.location
                })
                .and_then(|source| source.value_at(index));
            let slot: BoxedStrategy<Option<JsonValue>> = match example {
                Some(value) => Just(Some(value.clone())).boxed(),
                // Required parameters without an example get a generated
                // filler; optional ones are left out of the case.
                None if parameter.required => {
                    positive_slot(parameter, registry, config).map_err(as_examples_error)?
                }
                None => Just(None).boxed(),
            };
            slots.push((parameter.location, parameter.name.clone(), slot));
        }

        let body: BoxedStrategy<(Body, Option<String>)> = match sources.bodies.first() {
            Some(source) => {
                let value = source.value_at(index).cloned().unwrap_or(JsonValue::Null);
                let media_type = source.media_type.clone();
                Just((body_from_value(&media_type, value), Some(media_type))).boxed()
            }
            None if prepared.body_required => {
                positive_body_strategy(prepared, registry, config).map_err(as_examples_error)?
            }
            None => Just((Body::NotSet, None)).boxed(),
        };

        strategies.push(assemble(
            prepared,
            fold_entries(slots),
            body,
            GenerationMode::Positive,
            CaseSource::Example,
        ));
    }
    Ok(strategies)
}

// The example phase reports pattern failures under its own wording.
fn as_examples_error(error: CaseError) -> CaseError {
    match error {
        CaseError::Generation(GenerationError::UnsupportedRegex { pattern }) => {
            CaseError::Extraction(ExtractionError::UnsupportedRegex { pattern })
        }
        other => other,
    }
}

fn coverage_cases(prepared: &PreparedOperation, mode: GenerationMode) -> Vec<Case> {
    let mut cases = Vec::new();
    let Some(base) = base_case(prepared, mode) else {
        return cases;
    };

    for parameter in &prepared.parameters {
        for boundary in boundary_values(&parameter.node, mode) {
            if parameter.location == ParameterLocation::Header && untransmissible(&boundary) {
                continue;
            }
            let mut case = base.clone();
            case.container_mut(parameter.location)
                .insert(parameter.name.clone(), boundary);
            cases.push(case);
        }
    }

    for variant in &prepared.variants {
        for boundary in boundary_values(&variant.node, mode) {
            let mut case = base.clone();
            case.body = body_from_value(&variant.media_type, boundary);
            case.media_type = Some(variant.media_type.clone());
            cases.push(case);
        }
    }

    cases
}

/// A case holding the canonical value of every required parameter and of
/// the body when one is required. One boundary at a time is layered on
/// top, so a negative boundary is the case's only violation.
fn base_case(prepared: &PreparedOperation, mode: GenerationMode) -> Option<Case> {
    let mut case = Case {
        method: prepared.method.clone(),
        path: prepared.path.clone(),
        path_parameters: JsonObject::new(),
        query: JsonObject::new(),
        headers: JsonObject::new(),
        cookies: JsonObject::new(),
        body: Body::NotSet,
        media_type: None,
        mode,
        source: CaseSource::Coverage,
    };
    for parameter in &prepared.parameters {
        if !parameter.required {
            continue;
        }
        let value = canonical_value(&parameter.node)?;
        if parameter.location == ParameterLocation::Header && untransmissible(&value) {
            return None;
        }
        case.container_mut(parameter.location)
            .insert(parameter.name.clone(), value);
    }
    if prepared.body_required {
        let variant = prepared.variants.first()?;
        let value = canonical_value(&variant.node)?;
        case.body = body_from_value(&variant.media_type, value);
        case.media_type = Some(variant.media_type.clone());
    }
    Some(case)
}

fn positive_case_strategy(
    prepared: &PreparedOperation,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<Case>, CaseError> {
    let mut slots = Vec::with_capacity(prepared.parameters.len());
    for parameter in &prepared.parameters {
        slots.push((
            parameter.location,
            parameter.name.clone(),
            positive_slot(parameter, registry, config)?,
        ));
    }
    let body = positive_body_strategy(prepared, registry, config)?;
    Ok(assemble(
        prepared,
        fold_entries(slots),
        body,
        GenerationMode::Positive,
        CaseSource::Generated,
    ))
}

/// Builds the partial-negation strategy: a nonempty subset of negatable
/// atoms draws violating values while every other atom stays conforming.
///
/// Returns `Ok(None)` when no atom is negatable.
fn negative_case_strategy(
    prepared: &PreparedOperation,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<Option<BoxedStrategy<Case>>, CaseError> {
    let body_index = prepared.parameters.len();
    let mut negatable = Vec::new();
    for (index, parameter) in prepared.parameters.iter().enumerate() {
        if is_negatable(&parameter.node) {
            negatable.push(index);
        }
    }
    if prepared.variants.iter().any(body_negatable) {
        negatable.push(body_index);
    }
    if negatable.is_empty() {
        return Ok(None);
    }

    let mut positive_slots = Vec::with_capacity(prepared.parameters.len());
    let mut negative_slots = Vec::with_capacity(prepared.parameters.len());
    for parameter in &prepared.parameters {
        positive_slots.push(positive_slot(parameter, registry, config)?);
        negative_slots.push(if is_negatable(&parameter.node) {
            negative_slot(parameter, registry, config)?
        } else {
            None
        });
    }
    let positive_body = positive_body_strategy(prepared, registry, config)?;
    let negative_body = negative_body_strategy(prepared, registry, config)?;

    let locations: Vec<(ParameterLocation, String)> = prepared
        .parameters
        .iter()
        .map(|parameter| (parameter.location, parameter.name.clone()))
        .collect();
    let method = prepared.method.clone();
    let path = prepared.path.clone();
    let count = negatable.len();

    Ok(Some(
        subsequence(negatable, 1..=count)
            .prop_flat_map(move |selected| {
                let mut slots = Vec::with_capacity(locations.len());
                for (index, (location, name)) in locations.iter().enumerate() {
                    let slot = if selected.contains(&index) {
                        negative_slots[index]
                            .clone()
                            .unwrap_or_else(|| positive_slots[index].clone())
                    } else {
                        positive_slots[index].clone()
                    };
                    slots.push((*location, name.clone(), slot));
                }
                let body = if selected.contains(&body_index) {
                    negative_body
                        .clone()
                        .unwrap_or_else(|| positive_body.clone())
                } else {
                    positive_body.clone()
                };
                assemble_parts(
                    method.clone(),
                    path.clone(),
                    fold_entries(slots),
                    body,
                    GenerationMode::Negative,
                    CaseSource::Generated,
                )
            })
            .boxed(),
    ))
}

fn positive_slot(
    parameter: &PreparedParameter,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<Option<JsonValue>>, CaseError> {
    let strategy =
        value_strategy(&parameter.node, registry, config).map_err(CaseError::Generation)?;
    let strategy = reject_untransmissible_headers(parameter.location, strategy);
    Ok(if parameter.required {
        strategy.prop_map(Some).boxed()
    } else {
        optional_value(strategy, config.optional_field_probability)
    })
}

fn negative_slot(
    parameter: &PreparedParameter,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<Option<BoxedStrategy<Option<JsonValue>>>, CaseError> {
    let Some(strategy) =
        negated_value_strategy(&parameter.node, registry, config).map_err(CaseError::Generation)?
    else {
        return Ok(None);
    };
    let strategy = match &parameter.validator {
        Some(validator) => {
            let validator = Arc::clone(validator);
            strategy
                .prop_filter("draw must violate the parameter schema", move |value| {
                    !validator.is_valid(value)
                })
                .boxed()
        }
        None => strategy,
    };
    let strategy = reject_untransmissible_headers(parameter.location, strategy);
    // A selected atom always carries a value, even for optional parameters.
    Ok(Some(strategy.prop_map(Some).boxed()))
}

fn reject_untransmissible_headers(
    location: ParameterLocation,
    strategy: BoxedStrategy<JsonValue>,
) -> BoxedStrategy<JsonValue> {
    if location != ParameterLocation::Header {
        return strategy;
    }
    strategy
        .prop_filter("header values must not contain control characters", |value| {
            !untransmissible(value)
        })
        .boxed()
}

fn untransmissible(value: &JsonValue) -> bool {
    literal_text(value).chars().any(char::is_control)
}

fn positive_body_strategy(
    prepared: &PreparedOperation,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<(Body, Option<String>)>, CaseError> {
    if prepared.variants.is_empty() {
        if prepared.body_declared && prepared.body_required {
            return Err(CaseError::Generation(GenerationError::Unsatisfiable {
                reason: "the required request body has no media type the engine can serialize"
                    .to_string(),
            }));
        }
        return Ok(Just((Body::NotSet, None)).boxed());
    }

    let mut arms = Vec::with_capacity(prepared.variants.len());
    for variant in &prepared.variants {
        arms.push(variant_body_strategy(variant, registry, config)?);
    }
    let drawn = Union::new(arms).boxed();
    Ok(if prepared.body_required {
        drawn
    } else {
        prop_oneof![
            1 => Just((Body::NotSet, None)),
            4 => drawn,
        ]
        .boxed()
    })
}

fn variant_body_strategy(
    variant: &PreparedVariant,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<BoxedStrategy<(Body, Option<String>)>, CaseError> {
    let media_type = variant.media_type.clone();
    match examples::media_essence(&media_type).as_str() {
        "application/octet-stream" => Ok(vec(any::<u8>(), 0..=64)
            .prop_map(move |bytes| (Body::Binary(Binary::new(bytes)), Some(media_type.clone())))
            .boxed()),
        "application/x-www-form-urlencoded" | "multipart/form-data" => {
            let binary_parts = binary_part_names(&variant.node);
            let strategy =
                value_strategy(&variant.node, registry, config).map_err(CaseError::Generation)?;
            Ok(strategy
                .prop_map(move |value| {
                    (form_body(value, &binary_parts), Some(media_type.clone()))
                })
                .boxed())
        }
        _ => {
            let strategy =
                value_strategy(&variant.node, registry, config).map_err(CaseError::Generation)?;
            Ok(strategy
                .prop_map(move |value| (Body::Json(value), Some(media_type.clone())))
                .boxed())
        }
    }
}

fn negative_body_strategy(
    prepared: &PreparedOperation,
    registry: &FormatRegistry,
    config: &GenerationConfig,
) -> Result<Option<BoxedStrategy<(Body, Option<String>)>>, CaseError> {
    let mut arms = Vec::new();
    for variant in prepared.variants.iter().filter(|variant| body_negatable(variant)) {
        let Some(strategy) = negated_value_strategy(&variant.node, registry, config)
            .map_err(CaseError::Generation)?
        else {
            continue;
        };
        let strategy = match &variant.validator {
            Some(validator) => {
                let validator = Arc::clone(validator);
                strategy
                    .prop_filter("draw must violate the payload schema", move |value| {
                        !validator.is_valid(value)
                    })
                    .boxed()
            }
            None => strategy,
        };
        let media_type = variant.media_type.clone();
        let to_form = matches!(
            examples::media_essence(&variant.media_type).as_str(),
            "application/x-www-form-urlencoded" | "multipart/form-data"
        );
        let binary_parts = binary_part_names(&variant.node);
        arms.push(
            strategy
                .prop_map(move |value| {
                    let body = if to_form {
                        form_body(value, &binary_parts)
                    } else {
                        Body::Json(value)
                    };
                    (body, Some(media_type.clone()))
                })
                .boxed(),
        );
    }
    if arms.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Union::new(arms).boxed()))
    }
}

// Raw byte payloads carry no violable structure.
fn body_negatable(variant: &PreparedVariant) -> bool {
    examples::media_essence(&variant.media_type) != "application/octet-stream"
        && is_negatable(&variant.node)
}

/// Property names whose drawn strings travel as raw bytes in multipart
/// bodies.
fn binary_part_names(node: &SchemaNode) -> HashSet<String> {
    match node {
        SchemaNode::Object(object) => object
            .properties
            .iter()
            .filter_map(|(name, property)| match property {
                SchemaNode::String(string) if string.format.as_deref() == Some("binary") => {
                    Some(name.clone())
                }
                _ => None,
            })
            .collect(),
        _ => HashSet::new(),
    }
}

fn form_body(value: JsonValue, binary_parts: &HashSet<String>) -> Body {
    let fields = match value {
        JsonValue::Object(map) => map
            .into_iter()
            .map(|(name, value)| {
                let field = match value {
                    JsonValue::String(text) if binary_parts.contains(&name) => {
                        FormField::Bytes(text.into_bytes())
                    }
                    other => FormField::Text(literal_text(&other)),
                };
                (name, field)
            })
            .collect(),
        // Non-object payloads still need a field to travel under.
        other => vec![("value".to_string(), FormField::Text(literal_text(&other)))],
    };
    Body::Form(fields)
}

fn body_from_value(media_type: &str, value: JsonValue) -> Body {
    match examples::media_essence(media_type).as_str() {
        "application/x-www-form-urlencoded" | "multipart/form-data" => {
            form_body(value, &HashSet::new())
        }
        "application/octet-stream" => {
            let bytes = match value {
                JsonValue::String(text) => text.into_bytes(),
                other => literal_text(&other).into_bytes(),
            };
            Body::Binary(Binary::new(bytes))
        }
        _ => Body::Json(value),
    }
}

type Entries = Vec<(ParameterLocation, String, Option<JsonValue>)>;

fn fold_entries(
    slots: Vec<(ParameterLocation, String, BoxedStrategy<Option<JsonValue>>)>,
) -> BoxedStrategy<Entries> {
    let mut entries: BoxedStrategy<Entries> = Just(Vec::new()).boxed();
    for (location, name, slot) in slots {
        entries = entries
            .prop_flat_map(move |drawn| {
                let name = name.clone();
                slot.clone().prop_map(move |value| {
                    let mut next = drawn.clone();
                    next.push((location, name.clone(), value));
                    next
                })
            })
            .boxed();
    }
    entries
}

fn assemble(
    prepared: &PreparedOperation,
    entries: BoxedStrategy<Entries>,
    body: BoxedStrategy<(Body, Option<String>)>,
    mode: GenerationMode,
    source: CaseSource,
) -> BoxedStrategy<Case> {
    assemble_parts(
        prepared.method.clone(),
        prepared.path.clone(),
        entries,
        body,
        mode,
        source,
    )
}

fn assemble_parts(
    method: String,
    path: String,
    entries: BoxedStrategy<Entries>,
    body: BoxedStrategy<(Body, Option<String>)>,
    mode: GenerationMode,
    source: CaseSource,
) -> BoxedStrategy<Case> {
    (entries, body)
        .prop_map(move |(entries, (body, media_type))| {
            let mut case = Case {
                method: method.clone(),
                path: path.clone(),
                path_parameters: JsonObject::new(),
                query: JsonObject::new(),
                headers: JsonObject::new(),
                cookies: JsonObject::new(),
                body,
                media_type,
                mode,
                source,
            };
            for (location, name, value) in entries {
                if let Some(value) = value {
                    case.container_mut(location).insert(name, value);
                }
            }
            case
        })
        .boxed()
}

#[cfg(test)]
#[path = "../tests/internal/phase_unit_tests.rs"]
mod tests;
