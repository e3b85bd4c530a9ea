//! # Keystone
//!
//! **Typed configuration records populated from named sources**
//!
//! Keystone fills the fields of a plain struct from the environment, AWS
//! Parameter Store, or any source you plug in. Each field says where its value
//! comes from, what to fall back to, and whether it must be present:
//!
//! - **Derive-driven** – `#[derive(Configurable)]` describes the record at compile time
//! - **Pluggable sources** – anything implementing [`Source`] can supply values in batches
//! - **Environment by default** – an environment source is always active
//! - **Every error at once** – failures are collected into one [`ConfigErrors`] report
//!
//! ## Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use keystone::prelude::*;
//!
//! #[derive(Configurable, Default)]
//! struct Settings {
//!     #[config(env = "KEYSTONE_QUICKSTART_PORT", default = 8080)]
//!     port: u16,
//!     #[config(env = "KEYSTONE_QUICKSTART_TIMEOUT", default = "2s")]
//!     timeout: Duration,
//!     database: Database,
//! }
//!
//! #[derive(Configurable, Default)]
//! struct Database {
//!     #[config(env = "KEYSTONE_QUICKSTART_DB_POOL", default = 4)]
//!     pool: u32,
//! }
//!
//! let mut settings = Settings::default();
//! keystone::process(&mut settings, &[]).unwrap();
//!
//! assert_eq!(settings.port, 8080);
//! assert_eq!(settings.timeout, Duration::from_secs(2));
//! assert_eq!(settings.database.pool, 4);
//! ```
//!
//! ## Resolution
//!
//! ```text
//! record ──► traversal ──► parameters grouped per source ──► Source::resolve
//!                                                              │
//!            field ◄── convert ◄── value / default / required ◄┘
//! ```
//!
//! Sources run in the order given; a default [`EnvSource`] is appended when
//! none of them uses the `env` tag key. When a field is tagged for several
//! sources, the first configured one wins.

#![doc(html_root_url = "https://docs.rs/keystone/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the engine
pub use keystone_core::*;

// Re-export the derive macro
pub use keystone_macros::Configurable;

// Re-export the Parameter Store source
#[cfg(feature = "ssm")]
pub use keystone_ssm as ssm;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use keystone::prelude::*;
/// ```
pub mod prelude {
    pub use keystone_core::{
        process, process_with, ConfigError, ConfigErrors, ConfigLoader, Configurable, EnvSource,
        ErrorKind, Source, SourceSet,
    };

    // Re-export the derive macro
    pub use keystone_macros::Configurable;

    // Re-export Parameter Store types
    #[cfg(feature = "ssm")]
    pub use keystone_ssm::{HttpParamStore, MemoryStore, ParamStore, SsmSource};
}
