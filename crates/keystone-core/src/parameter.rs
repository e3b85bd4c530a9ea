//! Per-field resolution units.
//!
//! A [`Parameter`] is what a source sees of a field: it either receives a raw
//! value or is told that none was found. The engine's implementation,
//! [`FieldParameter`], applies the default/required policy and converts the
//! raw string into the field's storage.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{ConfigError, ConfigErrors};
use crate::setter::Setter;

/// Parameters requested from one source, grouped by lookup key.
///
/// Keys keep the order in which fields were declared. Several fields may
/// share a lookup key; each receives the same raw value.
pub type Parameters<'a> = IndexMap<String, Vec<Box<dyn Parameter + 'a>>>;

/// One field awaiting a value from a source.
///
/// Sources must call exactly one of the two methods for every parameter they
/// are handed. A parameter that is never called keeps its field untouched and
/// nothing reports it.
pub trait Parameter {
    /// Apply a raw value found by the source.
    ///
    /// An empty value is treated as "not found" and routed to
    /// [`no_value`](Parameter::no_value).
    fn set_value(&mut self, raw: &str) -> Result<(), ConfigError>;

    /// Apply the no-value policy: use the default, fail if required, or leave
    /// the field alone.
    fn no_value(&mut self) -> Result<(), ConfigError>;
}

/// Feed `raw` to every parameter in `parameters`, collecting failures.
pub fn set_all(parameters: &mut [Box<dyn Parameter + '_>], raw: &str, errors: &mut ConfigErrors) {
    for parameter in parameters {
        if let Err(e) = parameter.set_value(raw) {
            errors.push(e);
        }
    }
}

/// A [`Parameter`] bound to one field of a record.
pub struct FieldParameter<'a> {
    field: String,
    tag: String,
    key: String,
    required: bool,
    default: Option<&'static str>,
    set: Setter<'a>,
}

impl<'a> FieldParameter<'a> {
    /// Create a parameter for `field` (a dotted path), looked up under `key`
    /// in the source tagged `tag`.
    pub fn new(
        field: impl Into<String>,
        tag: impl Into<String>,
        key: impl Into<String>,
        set: Setter<'a>,
    ) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
            key: key.into(),
            required: false,
            default: None,
            set,
        }
    }

    /// Mark the field as required.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the fallback literal used when the source has no value.
    #[must_use]
    pub fn with_default(mut self, default: Option<&'static str>) -> Self {
        self.default = default;
        self
    }

    /// Dotted path of the field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Tag key of the owning source.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Lookup key within the source.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn convert(&mut self, raw: &str) -> Result<(), ConfigError> {
        (self.set)(raw).map_err(|e| ConfigError::conversion(self.field.as_str(), e))
    }
}

impl Parameter for FieldParameter<'_> {
    fn set_value(&mut self, raw: &str) -> Result<(), ConfigError> {
        if raw.is_empty() {
            return self.no_value();
        }
        self.convert(raw)
    }

    fn no_value(&mut self) -> Result<(), ConfigError> {
        match self.default {
            Some(default) => self.convert(default),
            None if self.required => Err(ConfigError::required_missing(
                self.field.as_str(),
                self.key.as_str(),
                self.tag.as_str(),
            )),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FieldParameter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldParameter")
            .field("field", &self.field)
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("required", &self.required)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
