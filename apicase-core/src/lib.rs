//! Schema-driven test case generation for HTTP API operations.
//!
//! An [`ApiOperation`] describes one method-plus-path with its parameters
//! and payload alternatives. From that description the engine produces
//! [`Case`] values through three phases: explicit cases built from
//! schema-declared examples, deterministic boundary cases, and cases drawn
//! from compiled proptest strategies. Positive cases conform to the schema;
//! negative cases violate it in deliberate, verified ways.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod case;
pub mod coverage;
pub mod encode;
pub mod examples;
pub mod generator;
pub mod normalize;
pub mod phase;
pub mod schema;

pub use case::{Body, Case, CaseSource, TransportArguments, TransportError};
pub use encode::{Binary, FormField};
pub use examples::{ExtractionError, OperationExamples};
pub use generator::{FormatRegistry, FormatStrategy, GenerationError};
pub use normalize::{SchemaError, SchemaNode};
pub use phase::{CaseError, CasePlan, NegationError, plan};
pub use schema::{
    ApiOperation, BodyVariant, JsonObject, Parameter, ParameterLocation, ParameterSet,
    PayloadAlternatives,
};

const DEFAULT_OPTIONAL_FIELD_PROBABILITY: f64 = 0.5;
const DEFAULT_MAX_ARRAY_LENGTH: usize = 4;
const DEFAULT_MAX_REJECTION_ATTEMPTS: usize = 8;

/// Whether generated cases conform to or violate the schema.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Cases satisfy every schema constraint.
    #[default]
    Positive,
    /// Cases violate at least one schema constraint on purpose.
    Negative,
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 2] = [GenerationMode::Positive, GenerationMode::Negative];

    pub fn is_negative(self) -> bool {
        matches!(self, GenerationMode::Negative)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Positive => f.write_str("positive"),
            GenerationMode::Negative => f.write_str("negative"),
        }
    }
}

/// Configuration for case generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenerationConfig {
    /// Modes to generate cases in, in order of priority.
    pub modes: Vec<GenerationMode>,
    /// Probability that an optional parameter or property is included.
    pub optional_field_probability: f64,
    /// Length cap for arrays whose schema declares no `maxItems`.
    pub max_array_length: usize,
    /// How many times a rejected draw is retried before giving up.
    pub max_rejection_attempts: usize,
    /// Seed for reproducible draws; unseeded runs vary between executions.
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            modes: vec![GenerationMode::Positive],
            optional_field_probability: DEFAULT_OPTIONAL_FIELD_PROBABILITY,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            max_rejection_attempts: DEFAULT_MAX_REJECTION_ATTEMPTS,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Creates a configuration generating positive cases only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the generation modes.
    pub fn with_modes(mut self, modes: Vec<GenerationMode>) -> Self {
        self.modes = modes;
        self
    }

    /// Sets the probability of including optional parameters and properties.
    pub fn with_optional_field_probability(mut self, probability: f64) -> Self {
        self.optional_field_probability = probability;
        self
    }

    /// Sets the length cap for arrays without a declared `maxItems`.
    pub fn with_max_array_length(mut self, length: usize) -> Self {
        self.max_array_length = length;
        self
    }

    /// Sets the retry budget for rejected draws.
    pub fn with_max_rejection_attempts(mut self, attempts: usize) -> Self {
        self.max_rejection_attempts = attempts;
        self
    }

    /// Sets the seed for reproducible draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        if !(0.0..=1.0).contains(&self.optional_field_probability) {
            return Err(ConfigError::InvalidProbability {
                value: self.optional_field_probability,
            });
        }
        if self.max_rejection_attempts == 0 {
            return Err(ConfigError::ZeroAttemptBudget);
        }
        Ok(())
    }
}

/// Errors from invalid generation configuration input.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A format strategy was registered under an empty name.
    EmptyFormatName,
    /// No generation mode was selected.
    NoModes,
    /// The optional-field probability lies outside `[0.0, 1.0]`.
    InvalidProbability { value: f64 },
    /// The rejection sampling budget is zero.
    ZeroAttemptBudget,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyFormatName => f.write_str("format names must not be empty"),
            ConfigError::NoModes => f.write_str("at least one generation mode must be selected"),
            ConfigError::InvalidProbability { value } => {
                write!(
                    f,
                    "optional field probability must lie in [0.0, 1.0], got {value}"
                )
            }
            ConfigError::ZeroAttemptBudget => {
                f.write_str("rejection sampling needs at least one attempt")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
