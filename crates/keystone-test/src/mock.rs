//! Mock sources and parameters.

use std::sync::Arc;

use indexmap::IndexMap;
use keystone_core::{ConfigError, ConfigErrors, ParseError, Parameter, Parameters, Source};
use parking_lot::Mutex;

/// A [`Source`] serving values from an in-memory map.
///
/// Keys without a value are reported through `no_value`. Every resolve call
/// is recorded so tests can assert which keys were requested.
#[derive(Debug)]
pub struct MockSource {
    tag: String,
    values: IndexMap<String, String>,
    failure: Option<String>,
    requested: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl MockSource {
    /// Create a mock source with the given tag key and no values.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            values: IndexMap::new(),
            failure: None,
            requested: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
        }
    }

    /// Add a value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Make every resolve call fail with `message`, leaving parameters untouched.
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Keys requested so far, in the order they were received.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    /// Number of resolve calls received.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl Source for MockSource {
    fn tag_key(&self) -> &str {
        &self.tag
    }

    fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
        *self.calls.lock() += 1;
        self.requested.lock().extend(parameters.keys().cloned());

        if let Some(message) = &self.failure {
            return Err(ConfigError::source_failure(self.tag.as_str(), message.clone()).into());
        }

        let mut errors = ConfigErrors::new();
        for (key, params) in parameters {
            let value = self.values.get(&key);
            for mut parameter in params {
                let result = match value {
                    Some(value) => parameter.set_value(value),
                    None => parameter.no_value(),
                };
                if let Err(e) = result {
                    errors.push(e);
                }
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Default)]
struct MockState {
    values: Vec<String>,
    no_value_calls: usize,
}

/// A [`Parameter`] that records what it receives.
///
/// Clones share their record, so a test can keep one handle and give a boxed
/// clone to a source.
#[derive(Debug, Clone, Default)]
pub struct MockParameter {
    required: bool,
    rejected: Option<String>,
    state: Arc<Mutex<MockState>>,
}

impl MockParameter {
    /// Create an optional parameter that accepts every value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `no_value` with a required-missing error.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Fail `set_value` with a conversion error when given `value`.
    #[must_use]
    pub fn rejecting(mut self, value: impl Into<String>) -> Self {
        self.rejected = Some(value.into());
        self
    }

    /// A boxed clone sharing this parameter's record.
    pub fn boxed(&self) -> Box<dyn Parameter> {
        Box::new(self.clone())
    }

    /// Values received through `set_value`, excluding empty ones.
    pub fn values(&self) -> Vec<String> {
        self.state.lock().values.clone()
    }

    /// Number of times the no-value policy ran.
    pub fn no_value_calls(&self) -> usize {
        self.state.lock().no_value_calls
    }
}

impl Parameter for MockParameter {
    fn set_value(&mut self, raw: &str) -> Result<(), ConfigError> {
        if raw.is_empty() {
            return self.no_value();
        }
        if self.rejected.as_deref() == Some(raw) {
            return Err(ConfigError::conversion(
                "mock",
                ParseError::InvalidNumber {
                    value: raw.to_string(),
                    type_name: "mock",
                },
            ));
        }
        self.state.lock().values.push(raw.to_string());
        Ok(())
    }

    fn no_value(&mut self) -> Result<(), ConfigError> {
        self.state.lock().no_value_calls += 1;
        if self.required {
            return Err(ConfigError::required_missing("mock", "mock", "mock"));
        }
        Ok(())
    }
}
