//! The batch-get contract and an in-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::MAX_BATCH;

/// Body of a `GetParameters` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetParametersRequest {
    /// Fully qualified parameter names.
    pub names: Vec<String>,
    /// Whether secure string values should be decrypted.
    pub with_decryption: bool,
}

/// Result of a `GetParameters` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetParametersResponse {
    /// Parameters that were found.
    #[serde(default)]
    pub parameters: Vec<StoredParameter>,
    /// Requested names that do not exist.
    #[serde(default)]
    pub invalid_parameters: Vec<String>,
}

/// One parameter returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoredParameter {
    /// Fully qualified name.
    #[serde(default)]
    pub name: Option<String>,
    /// Value, decrypted if requested.
    #[serde(default)]
    pub value: Option<String>,
}

impl StoredParameter {
    /// Create a parameter with both name and value set.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }
}

/// A parameter store that can look up several names in one call.
///
/// Callers never send more than [`MAX_BATCH`] names per request.
pub trait ParamStore {
    /// Fetch the requested parameters.
    fn get_parameters(
        &self,
        request: &GetParametersRequest,
    ) -> Result<GetParametersResponse, StoreError>;
}

impl<T: ParamStore + ?Sized> ParamStore for &T {
    fn get_parameters(
        &self,
        request: &GetParametersRequest,
    ) -> Result<GetParametersResponse, StoreError> {
        (**self).get_parameters(request)
    }
}

impl<T: ParamStore + ?Sized> ParamStore for Arc<T> {
    fn get_parameters(
        &self,
        request: &GetParametersRequest,
    ) -> Result<GetParametersResponse, StoreError> {
        (**self).get_parameters(request)
    }
}

/// An in-process [`ParamStore`].
///
/// Records every request it serves. Requests with more than [`MAX_BATCH`]
/// names are rejected like the real service rejects them.
///
/// # Example
///
/// ```
/// use keystone_ssm::{GetParametersRequest, MemoryStore, ParamStore};
///
/// let store = MemoryStore::new().with_parameter("/svc/port", "8080");
/// let response = store
///     .get_parameters(&GetParametersRequest {
///         names: vec!["/svc/port".to_string(), "/svc/missing".to_string()],
///         with_decryption: true,
///     })
///     .unwrap();
///
/// assert_eq!(response.parameters.len(), 1);
/// assert_eq!(response.invalid_parameters, vec!["/svc/missing"]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    parameters: HashMap<String, String>,
    failure: Option<String>,
    requests: Mutex<Vec<GetParametersRequest>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Make every request fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Requests served so far, in order.
    pub fn requests(&self) -> Vec<GetParametersRequest> {
        self.requests.lock().clone()
    }
}

impl ParamStore for MemoryStore {
    fn get_parameters(
        &self,
        request: &GetParametersRequest,
    ) -> Result<GetParametersResponse, StoreError> {
        self.requests.lock().push(request.clone());

        if let Some(message) = &self.failure {
            return Err(StoreError::backend(message.clone()));
        }
        if request.names.len() > MAX_BATCH {
            return Err(StoreError::backend(format!(
                "at most {MAX_BATCH} names may be requested at once, got {}",
                request.names.len()
            )));
        }

        let mut response = GetParametersResponse::default();
        for name in &request.names {
            match self.parameters.get(name) {
                Some(value) => response
                    .parameters
                    .push(StoredParameter::new(name.clone(), value.clone())),
                None => response.invalid_parameters.push(name.clone()),
            }
        }
        Ok(response)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |store, (name, value)| store.with_parameter(name, value))
    }
}
