//! Configuration error types.
//!
//! Resolution never stops at the first problem. Every failure is recorded as a
//! [`ConfigError`] and collected into a [`ConfigErrors`] composite, so a single
//! call reports everything that is wrong with a record at once.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by a source's underlying transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The field's declared type has no converter.
    UnsupportedType,
    /// A required field resolved to no value.
    RequiredMissing,
    /// A raw or default string could not be parsed into the field's type.
    ConversionFailure,
    /// Two sources declared the same tag key.
    DuplicateSourceTagKey,
    /// A source failed outright.
    SourceResolutionFailure,
}

/// Errors that can occur while populating a record.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No converter exists for the field's type.
    #[error("field {field} has an unsupported type: {type_name}")]
    UnsupportedType {
        /// Dotted path of the field.
        field: String,
        /// Name of the offending type.
        type_name: &'static str,
    },

    /// A required field was tagged for a source, but the source had no value
    /// and no default was configured.
    #[error("field {field} is required, but was not found via key {key} in source {tag}")]
    RequiredMissing {
        /// Dotted path of the field.
        field: String,
        /// Lookup key used against the source.
        key: String,
        /// Tag key of the source that was asked.
        tag: String,
    },

    /// A required field is not tagged for any configured source.
    #[error(
        "field {field} is required, but does not specify a tag for any of the configured sources: {}",
        .tag_keys.join(", ")
    )]
    RequiredUntagged {
        /// Dotted path of the field.
        field: String,
        /// Tag keys of every configured source.
        tag_keys: Vec<String>,
    },

    /// A value could not be converted into the field's type.
    #[error("failed to set value for field {field}: {source}")]
    Conversion {
        /// Dotted path of the field.
        field: String,
        /// Underlying parse failure.
        #[source]
        source: ParseError,
    },

    /// Two sources share a tag key.
    #[error("multiple sources provided with the tag key {tag}")]
    DuplicateSourceTagKey {
        /// The duplicated tag key.
        tag: String,
    },

    /// A source's batch resolution failed.
    #[error("source {tag} failed: {source}")]
    Source {
        /// Tag key of the failing source.
        tag: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// A dotenv file could not be loaded.
    #[error("failed to load dotenv file {path}: {source}")]
    Dotenv {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    /// Create a new unsupported type error.
    pub fn unsupported_type(field: impl Into<String>, type_name: &'static str) -> Self {
        Self::UnsupportedType {
            field: field.into(),
            type_name,
        }
    }

    /// Create a new required-but-missing error.
    pub fn required_missing(
        field: impl Into<String>,
        key: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self::RequiredMissing {
            field: field.into(),
            key: key.into(),
            tag: tag.into(),
        }
    }

    /// Create a new required-but-untagged error.
    pub fn required_untagged<I, S>(field: impl Into<String>, tag_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequiredUntagged {
            field: field.into(),
            tag_keys: tag_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a new conversion error.
    pub fn conversion(field: impl Into<String>, source: ParseError) -> Self {
        Self::Conversion {
            field: field.into(),
            source,
        }
    }

    /// Create a new duplicate tag key error.
    pub fn duplicate_tag_key(tag: impl Into<String>) -> Self {
        Self::DuplicateSourceTagKey { tag: tag.into() }
    }

    /// Create a new source failure.
    pub fn source_failure(tag: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Source {
            tag: tag.into(),
            source: source.into(),
        }
    }

    /// Returns the classification of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::RequiredMissing { .. } | Self::RequiredUntagged { .. } => {
                ErrorKind::RequiredMissing
            }
            Self::Conversion { .. } => ErrorKind::ConversionFailure,
            Self::DuplicateSourceTagKey { .. } => ErrorKind::DuplicateSourceTagKey,
            Self::Source { .. } | Self::Dotenv { .. } => ErrorKind::SourceResolutionFailure,
        }
    }
}

/// Reasons a raw string could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a recognised boolean literal.
    #[error("invalid boolean literal {value:?}")]
    InvalidBool {
        /// The rejected literal.
        value: String,
    },

    /// Not a valid numeric literal.
    #[error("invalid {type_name} literal {value:?}")]
    InvalidNumber {
        /// The rejected literal.
        value: String,
        /// Target type.
        type_name: &'static str,
    },

    /// A syntactically valid number that does not fit the target type.
    #[error("{value:?} is out of range for {type_name}")]
    OutOfRange {
        /// The rejected literal.
        value: String,
        /// Target type.
        type_name: &'static str,
    },

    /// Not a valid duration literal.
    #[error("invalid duration {value:?}: {reason}")]
    InvalidDuration {
        /// The rejected literal.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// One element of a sequence failed to convert.
    #[error("element {index}: {source}")]
    Element {
        /// Zero-based position of the element.
        index: usize,
        /// Failure for that element.
        #[source]
        source: Box<ParseError>,
    },

    /// A sequence element type has no converter.
    #[error("unsupported element type {type_name}")]
    UnsupportedElement {
        /// Name of the element type.
        type_name: &'static str,
    },
}

/// Returned by the setter registry when a type has no converter.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unsupported type {type_name}")]
pub struct UnsupportedType {
    /// Name of the offending type.
    pub type_name: &'static str,
}

/// An ordered collection of [`ConfigError`]s.
///
/// This is the error type of every operation that can fail for several
/// independent reasons. It is never empty when returned inside `Err`.
#[derive(Debug, Default)]
pub struct ConfigErrors {
    errors: Vec<ConfigError>,
}

impl ConfigErrors {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one error.
    pub fn push(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Append the errors of a failed result, if any.
    pub fn absorb(&mut self, result: Result<(), Self>) {
        if let Err(errors) = result {
            self.extend(errors);
        }
    }

    /// Returns `true` if no error was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the collected errors in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.errors.iter()
    }

    /// Returns `true` if any collected error is of the given kind.
    #[must_use]
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Consume the collection, returning the errors.
    #[must_use]
    pub fn into_vec(self) -> Vec<ConfigError> {
        self.errors
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "1 error occurred:")?,
            n => write!(f, "{n} errors occurred:")?,
        }
        for error in &self.errors {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Extend<ConfigError> for ConfigErrors {
    fn extend<T: IntoIterator<Item = ConfigError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl FromIterator<ConfigError> for ConfigErrors {
    fn from_iter<T: IntoIterator<Item = ConfigError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'e> IntoIterator for &'e ConfigErrors {
    type Item = &'e ConfigError;
    type IntoIter = std::slice::Iter<'e, ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
