//! Procedural macros for keystone.
//!
//! This crate provides `#[derive(Configurable)]`, which writes the field walk
//! that lets a struct be populated by `keystone::process`.
//!
//! # Example
//!
//! ```rust,ignore
//! use keystone::Configurable;
//!
//! #[derive(Configurable, Default)]
//! struct Settings {
//!     #[config(env = "PORT", default = 8080)]
//!     port: u16,
//!     #[config(ssm = "database/url", required)]
//!     database_url: String,
//!     #[config(skip)]
//!     cache: Option<std::sync::Arc<Cache>>,
//! }
//! ```
//!
//! # Macro Expansion
//!
//! For every field that is not skipped the derive:
//!
//! 1. Builds a `static` `FieldDescriptor` holding the field name and its annotation table
//! 2. Calls `ConfigField::accept` on the field with that descriptor
//!
//! The struct also implements `ConfigField` itself, so a derived record can be
//! a field of another derived record.

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives `keystone::Configurable` and `keystone::ConfigField`.
///
/// # Attributes
///
/// Fields are annotated with `#[config(...)]`:
///
/// - `<tag> = "key"`: lookup key for the source whose tag key is `<tag>`
///   (`env`, `ssm`, or any custom source)
/// - `default = "literal"`: value used when the source has none
/// - `required`: fail when neither a value nor a default resolves
/// - `ignore`: leave the field out of resolution
/// - `skip`: leave the field out of the record entirely, so it may have any type
///
/// Values may be string, integer, float or bool literals. Several
/// `#[config]` attributes on one field are merged; repeating a key is an
/// error.
///
/// # Generated Code
///
/// The derive generates approximately:
///
/// ```rust,ignore
/// impl keystone::Configurable for Settings {
///     fn visit<'a>(&'a mut self, visitor: &mut dyn keystone::Visitor<'a>) {
///         {
///             static FIELD: keystone::FieldDescriptor =
///                 keystone::FieldDescriptor::new("port", &[("env", "PORT"), ("default", "8080")]);
///             keystone::ConfigField::accept(&mut self.port, &FIELD, visitor);
///         }
///     }
/// }
/// ```
#[proc_macro_derive(Configurable, attributes(config))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
    derive::expand_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
