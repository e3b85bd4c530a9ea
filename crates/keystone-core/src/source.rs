//! Sources and the finalized source set.
//!
//! A [`Source`] supplies raw values for a batch of lookup keys. Before a
//! record is traversed the caller's sources are assembled into a
//! [`SourceSet`], which rejects duplicate tag keys and makes sure an
//! environment source is always present.

use std::fmt;

use indexmap::IndexSet;

use crate::env::EnvSource;
use crate::error::{ConfigError, ConfigErrors};
use crate::parameter::Parameters;

/// A provider of raw values, identified by the annotation key it consumes.
///
/// # Example
///
/// ```
/// use keystone_core::{ConfigErrors, Parameters, Source};
///
/// /// Answers every lookup with the key itself.
/// struct Echo;
///
/// impl Source for Echo {
///     fn tag_key(&self) -> &str {
///         "echo"
///     }
///
///     fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
///         let mut errors = ConfigErrors::new();
///         for (key, mut params) in parameters {
///             keystone_core::set_all(&mut params, &key, &mut errors);
///         }
///         errors.into_result()
///     }
/// }
/// ```
pub trait Source {
    /// Annotation key naming this source on record fields.
    fn tag_key(&self) -> &str;

    /// Resolve every requested key.
    ///
    /// Each parameter must receive either [`set_value`] or [`no_value`].
    /// Failures for individual keys should be collected rather than stopping
    /// the batch.
    ///
    /// [`set_value`]: crate::Parameter::set_value
    /// [`no_value`]: crate::Parameter::no_value
    fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors>;
}

impl<S: Source + ?Sized> Source for &S {
    fn tag_key(&self) -> &str {
        (**self).tag_key()
    }

    fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
        (**self).resolve(parameters)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn tag_key(&self) -> &str {
        (**self).tag_key()
    }

    fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
        (**self).resolve(parameters)
    }
}

/// An ordered list of sources with unique tag keys.
///
/// Sources keep the order they were given in. When none of them uses the
/// `env` tag key, a default [`EnvSource`] is appended last.
pub struct SourceSet<'s> {
    sources: Vec<Box<dyn Source + 's>>,
}

impl<'s> SourceSet<'s> {
    /// Assemble a source set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateSourceTagKey`] if two sources share a
    /// tag key.
    pub fn new(mut sources: Vec<Box<dyn Source + 's>>) -> Result<Self, ConfigError> {
        let mut seen = IndexSet::with_capacity(sources.len() + 1);
        for source in &sources {
            if !seen.insert(source.tag_key().to_owned()) {
                return Err(ConfigError::duplicate_tag_key(source.tag_key()));
            }
        }

        if !seen.contains(EnvSource::TAG_KEY) {
            sources.push(Box::new(EnvSource::default()));
            seen.insert(EnvSource::TAG_KEY.to_owned());
            tracing::debug!("no env source configured, appending the default one");
        }

        tracing::debug!(sources = ?seen, "source set assembled");
        Ok(Self { sources })
    }

    /// Assemble a source set from borrowed sources.
    ///
    /// # Errors
    ///
    /// Same as [`SourceSet::new`].
    pub fn from_refs(sources: &[&'s dyn Source]) -> Result<Self, ConfigError> {
        Self::new(
            sources
                .iter()
                .map(|source| Box::new(*source) as Box<dyn Source + 's>)
                .collect(),
        )
    }

    /// Tag keys in source order.
    pub fn tag_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.sources.iter().map(|source| source.tag_key())
    }

    /// Sources in order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Source> + '_ {
        self.sources.iter().map(|source| &**source as &dyn Source)
    }

    /// Number of sources, including an appended environment source.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always `false`; a set holds at least the environment source.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for SourceSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tag_keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Tagged(&'static str);

    impl Source for Tagged {
        fn tag_key(&self) -> &str {
            self.0
        }

        fn resolve(&self, _parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
            Ok(())
        }
    }

    #[test]
    fn test_env_source_appended() {
        let set = SourceSet::new(vec![Box::new(Tagged("mock"))]).unwrap();
        assert_eq!(set.tag_keys().collect::<Vec<_>>(), vec!["mock", "env"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_explicit_env_source_kept_in_place() {
        let set = SourceSet::new(vec![
            Box::new(EnvSource::default().with_prefix("APP_")),
            Box::new(Tagged("mock")),
        ])
        .unwrap();
        assert_eq!(set.tag_keys().collect::<Vec<_>>(), vec!["env", "mock"]);
    }

    #[test]
    fn test_env_tag_counts_as_env_source() {
        let set = SourceSet::new(vec![Box::new(Tagged("env"))]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_duplicate_tag_keys_rejected() {
        let err = SourceSet::new(vec![Box::new(Tagged("mock")), Box::new(Tagged("mock"))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSourceTagKey);
        assert!(err.to_string().contains("mock"));
    }

    #[test]
    fn test_duplicate_env_rejected() {
        let err = SourceSet::new(vec![
            Box::new(EnvSource::default()),
            Box::new(Tagged("env")),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSourceTagKey);
    }

    #[test]
    fn test_from_refs() {
        let mock = Tagged("mock");
        let other = Tagged("other");
        let set = SourceSet::from_refs(&[&mock, &other]).unwrap();
        assert_eq!(
            set.tag_keys().collect::<Vec<_>>(),
            vec!["mock", "other", "env"]
        );
        assert_eq!(format!("{set:?}"), r#"["mock", "other", "env"]"#);
        assert!(!set.is_empty());
    }
}
