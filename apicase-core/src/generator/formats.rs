//! Strategies for `format`-annotated strings, with an injectable registry.
//!
//! The registry decouples format names from generation: built-in entries
//! cover the common OpenAPI string formats, callers may add or replace
//! entries, and unknown formats fall back to plain string generation. The
//! `binary` format is intentionally absent here; it changes the payload
//! representation rather than the string shape and is handled during body
//! assembly.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::Value as JsonValue;

use crate::ConfigError;

/// A strategy producing values for one registered format name.
pub type FormatStrategy = BoxedStrategy<JsonValue>;

/// Maps `format` names to value strategies.
///
/// Registering a name that already exists replaces the previous entry, so
/// the most recent registration wins.
#[derive(Clone, Debug)]
pub struct FormatRegistry {
    strategies: HashMap<String, FormatStrategy>,
}

impl FormatRegistry {
    /// Creates a registry seeded with the built-in formats: `date`,
    /// `date-time`, `uuid`, and `byte`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.strategies.insert("date".to_string(), date_strategy());
        registry
            .strategies
            .insert("date-time".to_string(), date_time_strategy());
        registry.strategies.insert("uuid".to_string(), uuid_strategy());
        registry.strategies.insert("byte".to_string(), byte_strategy());
        registry
    }

    /// Creates a registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registers a strategy for a format name, replacing any previous entry
    /// under the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        strategy: FormatStrategy,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyFormatName);
        }
        self.strategies.insert(name, strategy);
        Ok(())
    }

    /// Looks up the strategy for a format name. Cloning a boxed strategy is
    /// cheap; the underlying tree is shared.
    pub fn strategy(&self, name: &str) -> Option<FormatStrategy> {
        self.strategies.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn date_strategy() -> FormatStrategy {
    (1970i32..=2100, 1u32..=12, 1u32..=28)
        .prop_filter_map("valid calendar date", |(year, month, day)| {
            NaiveDate::from_ymd_opt(year, month, day)
                .map(|date| JsonValue::from(date.format("%Y-%m-%d").to_string()))
        })
        .boxed()
}

fn date_time_strategy() -> FormatStrategy {
    (1970i32..=2100, 1u32..=12, 1u32..=28, 0u32..=23, 0u32..=59, 0u32..=59)
        .prop_filter_map("valid timestamp", |(year, month, day, hour, minute, second)| {
            NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|date| date.and_hms_opt(hour, minute, second))
                .map(|stamp| JsonValue::from(stamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()))
        })
        .boxed()
}

fn uuid_strategy() -> FormatStrategy {
    (any::<u32>(), any::<u16>(), 0u16..0x1000, 0u16..0x4000, any::<u64>())
        .prop_map(|(a, b, c, d, e)| {
            // Random v4 layout: version nibble fixed to 4, variant bits 10.
            let e = e & 0x0000_ffff_ffff_ffff;
            JsonValue::from(format!("{a:08x}-{b:04x}-4{c:03x}-{:04x}-{e:012x}", d | 0x8000))
        })
        .boxed()
}

fn byte_strategy() -> FormatStrategy {
    vec(any::<u8>(), 0..=32)
        .prop_map(|bytes| JsonValue::from(STANDARD.encode(bytes)))
        .boxed()
}
