//! # Keystone Test
//!
//! Test utilities for keystone: sources and parameters that record what
//! they were asked, and a guard for tests that mutate the process
//! environment.
//!
//! ## Key Features
//!
//! - **Mock Source**: serves values from a map under any tag key and records requested keys
//! - **Mock Parameter**: records the values a source hands it
//! - **Environment Guard**: serialises environment mutation and restores it on drop
//!
//! ## Example
//!
//! ```ignore
//! use keystone::Configurable;
//! use keystone_test::{EnvGuard, MockSource};
//!
//! #[derive(Configurable, Default)]
//! struct Settings {
//!     #[config(mock = "token")]
//!     token: String,
//!     #[config(env = "PORT", default = 8080)]
//!     port: u16,
//! }
//!
//! #[test]
//! fn test_settings() {
//!     let mut env = EnvGuard::new();
//!     env.set("PORT", "9090");
//!
//!     let mock = MockSource::new("mock").with_value("token", "secret");
//!     let mut settings = Settings::default();
//!     keystone::process(&mut settings, &[&mock]).unwrap();
//!
//!     assert_eq!(settings.port, 9090);
//!     assert_eq!(mock.requested(), vec!["token"]);
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod env;
mod mock;

pub use env::EnvGuard;
pub use mock::{MockParameter, MockSource};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// The filter is read from `RUST_LOG`. Calling this more than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
