//! HTTP-backed parameter store.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::error::StoreError;
use crate::store::{GetParametersRequest, GetParametersResponse, ParamStore};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TARGET_HEADER: &str = "x-amz-target";
const TARGET: &str = "AmazonSSM.GetParameters";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// A [`ParamStore`] speaking the Parameter Store JSON protocol over HTTP.
///
/// Requests are not signed. This store is meant for endpoints that handle
/// authentication themselves, such as local emulators or signing proxies;
/// static headers (for example a proxy token) can be attached with
/// [`with_header`](Self::with_header).
///
/// # Example
///
/// ```no_run
/// use keystone_ssm::{HttpParamStore, SsmSource};
///
/// # fn main() -> Result<(), keystone_ssm::StoreError> {
/// let store = HttpParamStore::new("http://localhost:4566")?
///     .with_header("x-proxy-token", "local")?;
/// let source = SsmSource::new("/my-service/", store);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpParamStore {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
}

impl HttpParamStore {
    /// Create a store for `endpoint` with a [`DEFAULT_TIMEOUT`] client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Request`] if the client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(endpoint, client))
    }

    /// Create a store using an existing client.
    pub fn with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a header to every request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidHeader`] if the name or value is invalid.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, StoreError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| StoreError::invalid_header(name, e))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| StoreError::invalid_header(name, e))?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ParamStore for HttpParamStore {
    fn get_parameters(
        &self,
        request: &GetParametersRequest,
    ) -> Result<GetParametersResponse, StoreError> {
        let body = serde_json::to_vec(request)?;

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .header(TARGET_HEADER, TARGET)
            .header(CONTENT_TYPE, AMZ_JSON)
            .body(body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "parameter store request failed");
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_header_validation() {
        let store = HttpParamStore::new("http://localhost:4566").unwrap();
        assert_eq!(store.endpoint(), "http://localhost:4566");

        let store = store.with_header("x-proxy-token", "abc").unwrap();
        assert_eq!(store.headers.get("x-proxy-token").unwrap(), "abc");

        let err = store.clone().with_header("bad header", "abc").unwrap_err();
        assert!(matches!(err, StoreError::InvalidHeader { .. }));

        let err = store.with_header("x-ok", "line\nbreak").unwrap_err();
        assert!(matches!(err, StoreError::InvalidHeader { .. }));
    }
}
