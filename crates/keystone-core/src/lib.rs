//! Field-resolution engine for keystone.
//!
//! This crate populates typed records from named sources. A record describes
//! its fields through [`Configurable`] (usually derived with
//! `#[derive(Configurable)]` from the `keystone` crate), each field carries an
//! annotation table, and [`process`] resolves every field from the source its
//! annotations select:
//!
//! - [`setter`] converts raw strings into the field's type
//! - [`FieldParameter`] applies the default/required policy to one field
//! - [`Source`] implementations supply raw values for batches of lookup keys
//! - [`EnvSource`] reads the process environment and is always present
//!
//! # Annotations
//!
//! | Key | Effect |
//! |---|---|
//! | `<tag key>` (`env`, `ssm`, ...) | lookup key used by the source with that tag key |
//! | `default` | literal used when the source has no value |
//! | `required` | fail when neither a value nor a default resolves |
//! | `ignore` | skip the field entirely |
//!
//! # Errors
//!
//! Resolution does not stop at the first problem. Every failure is collected
//! into a [`ConfigErrors`]; fields that resolved keep their values.
//!
//! # Example
//!
//! ```
//! use keystone_core::{process, ConfigField, Configurable, EnvSource, FieldDescriptor, Visitor};
//!
//! #[derive(Default)]
//! struct Settings {
//!     workers: usize,
//! }
//!
//! impl Configurable for Settings {
//!     fn visit<'a>(&'a mut self, visitor: &mut dyn Visitor<'a>) {
//!         static WORKERS: FieldDescriptor =
//!             FieldDescriptor::new("workers", &[("env", "WORKERS"), ("default", "4")]);
//!         self.workers.accept(&WORKERS, visitor);
//!     }
//! }
//!
//! let env = EnvSource::new().with_prefix("KEYSTONE_CORE_DOC_");
//! let mut settings = Settings::default();
//! process(&mut settings, &[&env]).unwrap();
//! assert_eq!(settings.workers, 4);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod env;
mod error;
mod loader;
mod parameter;
mod process;
mod record;
mod setter;
mod source;
mod value;

pub use env::EnvSource;
pub use error::{BoxError, ConfigError, ConfigErrors, ErrorKind, ParseError, UnsupportedType};
pub use loader::ConfigLoader;
pub use parameter::{set_all, FieldParameter, Parameter, Parameters};
pub use process::{process, process_with};
pub use record::{
    ConfigField, Configurable, FieldDescriptor, Visitor, DEFAULT_KEY, IGNORE_KEY, REQUIRED_KEY,
};
pub use setter::{parse_bool, parse_duration, parse_int, parse_uint, setter, Setter};
pub use source::{Source, SourceSet};
pub use value::{ConfigValue, FillElement, Kind, Sequence, Slot};

/// Serialises unit tests that write process environment variables.
#[cfg(test)]
pub(crate) static TEST_ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
