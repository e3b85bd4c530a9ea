//! The `ssm` source.

use std::collections::HashMap;

use keystone_core::{set_all, ConfigError, ConfigErrors, Parameters, Source};

use crate::error::StoreError;
use crate::store::{GetParametersRequest, ParamStore, StoredParameter};
use crate::MAX_BATCH;

/// Resolves fields tagged `ssm` from a parameter store.
///
/// Lookup keys are normalised with [`parameter_name`] before they are
/// fetched. Names are requested in batches of at most [`MAX_BATCH`], always
/// with decryption. If any batch fails, no field is touched and the whole
/// source reports one error.
///
/// # Example
///
/// ```
/// use keystone_ssm::{MemoryStore, SsmSource};
///
/// let store = MemoryStore::new().with_parameter("/svc/timeout", "30s");
/// let source = SsmSource::new("/svc/", store);
/// assert_eq!(source.prefix(), "/svc/");
/// ```
#[derive(Debug, Clone)]
pub struct SsmSource<S> {
    prefix: String,
    store: S,
}

impl<S> SsmSource<S> {
    /// Tag key consumed by this source.
    pub const TAG_KEY: &'static str = "ssm";

    /// Create a source that prepends `prefix` to relative names.
    pub fn new(prefix: impl Into<String>, store: S) -> Self {
        Self {
            prefix: prefix.into(),
            store,
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ParamStore> SsmSource<S> {
    fn fetch(&self, names: &[String]) -> Result<HashMap<String, String>, StoreError> {
        let mut values = HashMap::with_capacity(names.len());

        for (index, batch) in names.chunks(MAX_BATCH).enumerate() {
            tracing::debug!(batch = index, names = batch.len(), "fetching parameters");
            let response = self.store.get_parameters(&GetParametersRequest {
                names: batch.to_vec(),
                with_decryption: true,
            })?;

            if !response.invalid_parameters.is_empty() {
                tracing::debug!(
                    missing = response.invalid_parameters.len(),
                    "parameters not found in store"
                );
            }

            for parameter in response.parameters {
                if let StoredParameter {
                    name: Some(name),
                    value: Some(value),
                } = parameter
                {
                    values.insert(name, value);
                }
            }
        }

        Ok(values)
    }
}

impl<S: ParamStore> Source for SsmSource<S> {
    fn tag_key(&self) -> &str {
        Self::TAG_KEY
    }

    fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
        let mut handlers = Parameters::with_capacity(parameters.len());
        for (tag_value, params) in parameters {
            handlers
                .entry(parameter_name(&tag_value, &self.prefix))
                .or_default()
                .extend(params);
        }

        let names: Vec<String> = handlers.keys().cloned().collect();
        let values = self
            .fetch(&names)
            .map_err(|e| ConfigError::source_failure(Self::TAG_KEY, e))?;

        let mut errors = ConfigErrors::new();
        for (name, mut params) in handlers {
            let value = values.get(&name).map_or("", String::as_str);
            tracing::trace!(parameter = %name, found = !value.is_empty(), "parameter resolved");
            set_all(&mut params, value, &mut errors);
        }
        errors.into_result()
    }
}

/// Normalise a field's `ssm` tag value into a parameter name.
///
/// The value is trimmed and lower-cased. Anything after the first comma is a
/// list of flags; `absolute` keeps the name as written. Otherwise the prefix
/// is prepended unless the name already starts with it.
///
/// # Example
///
/// ```
/// use keystone_ssm::parameter_name;
///
/// assert_eq!(parameter_name("Timeout", "/svc/"), "/svc/timeout");
/// assert_eq!(parameter_name("/svc/timeout", "/svc/"), "/svc/timeout");
/// assert_eq!(parameter_name("/shared/key,absolute", "/svc/"), "/shared/key");
/// ```
pub fn parameter_name(tag_value: &str, prefix: &str) -> String {
    let normalized = tag_value.trim().to_lowercase();
    let mut parts = normalized.split(',');
    let name = parts.next().unwrap_or_default();
    let absolute = parts.any(|flag| flag.trim() == "absolute");

    if absolute || name.starts_with(prefix) {
        name.to_string()
    } else {
        format!("{prefix}{name}")
    }
}
