//! Parameter Store source for keystone.
//!
//! [`SsmSource`] resolves fields tagged `ssm` by fetching parameters from a
//! [`ParamStore`] in batches. Two stores are provided:
//!
//! - [`MemoryStore`] - an in-process map, useful in tests
//! - [`HttpParamStore`] - the Parameter Store JSON protocol over HTTP, for
//!   emulators and signing proxies
//!
//! Any other client (an SDK wrapper, for instance) can be used by
//! implementing [`ParamStore`].
//!
//! # Naming
//!
//! A tag value is trimmed and lower-cased, then prefixed with the source's
//! prefix unless it already starts with it or carries the `absolute` flag:
//!
//! | Tag | Prefix | Parameter |
//! |---|---|---|
//! | `timeout` | `/svc/` | `/svc/timeout` |
//! | `/svc/timeout` | `/svc/` | `/svc/timeout` |
//! | `/shared/key,absolute` | `/svc/` | `/shared/key` |
//!
//! # Example
//!
//! ```
//! use keystone_core::{process, ConfigField, Configurable, FieldDescriptor, Visitor};
//! use keystone_ssm::{MemoryStore, SsmSource};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Settings {
//!     timeout: Duration,
//! }
//!
//! impl Configurable for Settings {
//!     fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
//!         static TIMEOUT: FieldDescriptor = FieldDescriptor::new("timeout", &[("ssm", "timeout")]);
//!         self.timeout.accept(&TIMEOUT, visitor);
//!     }
//! }
//!
//! let source = SsmSource::new("/svc/", MemoryStore::new().with_parameter("/svc/timeout", "30s"));
//! let mut settings = Settings::default();
//! process(&mut settings, &[&source]).unwrap();
//! assert_eq!(settings.timeout, Duration::from_secs(30));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod http;
mod source;
mod store;

pub use error::StoreError;
pub use http::{HttpParamStore, DEFAULT_TIMEOUT};
pub use source::{parameter_name, SsmSource};
pub use store::{GetParametersRequest, GetParametersResponse, MemoryStore, ParamStore, StoredParameter};

/// Most names a single `GetParameters` call may request.
pub const MAX_BATCH: usize = 10;
