//! Builder-style configuration loading.
//!
//! This module provides the [`ConfigLoader`], a convenience over
//! [`process_with`](crate::process_with) that collects sources, optionally
//! loads a `.env` file into the process environment, and populates a record.

use std::fmt;
use std::path::Path;

use crate::env::EnvSource;
use crate::error::{ConfigError, ConfigErrors};
use crate::process::process_with;
use crate::record::Configurable;
use crate::source::{Source, SourceSet};

/// Collects sources and populates records from them.
///
/// Sources are consulted in the order they were added. If no environment
/// source is added, a default one is used.
///
/// # Example
///
/// ```no_run
/// use keystone_core::{ConfigLoader, Configurable};
/// # use keystone_core::{ConfigField, FieldDescriptor, Visitor};
/// # #[derive(Default)]
/// # struct Settings { port: u16 }
/// # impl Configurable for Settings {
/// #     fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
/// #         static PORT: FieldDescriptor = FieldDescriptor::new("port", &[("env", "PORT")]);
/// #         self.port.accept(&PORT, visitor);
/// #     }
/// # }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings: Settings = ConfigLoader::new()
///     .with_dotenv()
///     .with_env_prefix("MY_APP_")
///     .load_default()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigLoader {
    sources: Vec<Box<dyn Source>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a source.
    #[must_use]
    pub fn with_source(mut self, source: impl Source + 'static) -> Self {
        tracing::debug!(source = %source.tag_key(), "source added");
        self.sources.push(Box::new(source));
        self
    }

    /// Add an explicitly configured environment source.
    #[must_use]
    pub fn with_env(self, source: EnvSource) -> Self {
        self.with_source(source)
    }

    /// Add an environment source that prepends `prefix` to every lookup key.
    ///
    /// # Example
    ///
    /// ```
    /// use keystone_core::ConfigLoader;
    ///
    /// let sources = ConfigLoader::new().with_env_prefix("APP_").build().unwrap();
    /// assert_eq!(sources.tag_keys().collect::<Vec<_>>(), vec!["env"]);
    /// ```
    #[must_use]
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        self.with_env(EnvSource::new().with_prefix(prefix))
    }

    /// Load a `.env` file from the current directory or its parents.
    ///
    /// A missing file is not an error. Variables already present in the
    /// environment are not overwritten.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "dotenv file loaded"),
            Err(e) if e.not_found() => tracing::debug!("no dotenv file found"),
            Err(e) => tracing::warn!(error = %e, "dotenv file could not be loaded"),
        }
        self
    }

    /// Load the given dotenv file.
    ///
    /// Variables already present in the environment are not overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file is missing or malformed.
    pub fn with_dotenv_path(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|source| ConfigError::Dotenv {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "dotenv file loaded");
        Ok(self)
    }

    /// Assemble the configured sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateSourceTagKey`] if two sources share a
    /// tag key.
    pub fn build(self) -> Result<SourceSet<'static>, ConfigError> {
        SourceSet::new(self.sources)
    }

    /// Populate `record` from the configured sources.
    ///
    /// # Errors
    ///
    /// Returns every failure collected while populating the record.
    pub fn load<C: Configurable + ?Sized>(self, record: &mut C) -> Result<(), ConfigErrors> {
        let sources = self.build()?;
        process_with(record, &sources)
    }

    /// Populate a default-constructed `T` and return it.
    ///
    /// # Errors
    ///
    /// Returns every failure collected while populating the record.
    pub fn load_default<T: Configurable + Default>(self) -> Result<T, ConfigErrors> {
        let mut record = T::default();
        self.load(&mut record)?;
        Ok(record)
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.tag_key()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
