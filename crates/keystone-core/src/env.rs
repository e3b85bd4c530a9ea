//! Environment variable source.

use std::env;
use std::ffi::OsString;

use crate::error::ConfigErrors;
use crate::parameter::{self, Parameters};
use crate::source::Source;

/// Resolves fields tagged `env` from the process environment.
///
/// The variable name is the prefix followed by the lookup key, upper-cased
/// unless strict case is enabled. Unset variables count as empty, which sends
/// the field through its no-value policy.
///
/// # Example
///
/// ```
/// use keystone_core::EnvSource;
///
/// let source = EnvSource::new().with_prefix("app_");
/// assert_eq!(source.variable_name("port"), "APP_PORT");
///
/// let strict = EnvSource::new().with_strict_case(true);
/// assert_eq!(strict.variable_name("port"), "port");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSource {
    prefix: String,
    strict_case: bool,
}

impl EnvSource {
    /// Tag key consumed by this source.
    pub const TAG_KEY: &'static str = "env";

    /// Create a source with no prefix and case folding enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefix prepended to every lookup key.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use lookup keys exactly as declared instead of upper-casing them.
    #[must_use]
    pub fn with_strict_case(mut self, strict_case: bool) -> Self {
        self.strict_case = strict_case;
        self
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether strict case is enabled.
    pub fn strict_case(&self) -> bool {
        self.strict_case
    }

    /// Name of the environment variable consulted for `key`.
    pub fn variable_name(&self, key: &str) -> String {
        let name = format!("{}{}", self.prefix, key);
        if self.strict_case {
            name
        } else {
            name.to_uppercase()
        }
    }

    fn lookup(&self, key: &str) -> String {
        let name = self.variable_name(key);
        match env::var_os(&name) {
            Some(value) => {
                tracing::trace!(variable = %name, "environment variable found");
                decode(&name, value)
            }
            None => {
                tracing::trace!(variable = %name, "environment variable not set");
                String::new()
            }
        }
    }
}

// Non-UTF-8 values are still delivered, with invalid sequences replaced.
fn decode(name: &str, value: OsString) -> String {
    value.into_string().unwrap_or_else(|raw| {
        tracing::warn!(
            variable = %name,
            "environment variable is not valid UTF-8, invalid bytes were replaced"
        );
        raw.to_string_lossy().into_owned()
    })
}

impl Source for EnvSource {
    fn tag_key(&self) -> &str {
        Self::TAG_KEY
    }

    fn resolve(&self, parameters: Parameters<'_>) -> Result<(), ConfigErrors> {
        tracing::debug!(keys = parameters.len(), "resolving environment parameters");

        let mut errors = ConfigErrors::new();
        for (key, mut params) in parameters {
            let value = self.lookup(&key);
            parameter::set_all(&mut params, &value, &mut errors);
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parameter::{FieldParameter, Parameter};
    use crate::setter::setter;
    use crate::value::ConfigValue;

    // Variable names are unique per test and writes hold the crate's env lock.
    fn param<'a, T: ConfigValue>(target: &'a mut T, key: &str) -> Box<dyn Parameter + 'a> {
        Box::new(FieldParameter::new(
            key,
            EnvSource::TAG_KEY,
            key,
            setter(target.slot()).expect("supported type"),
        ))
    }

    #[test]
    fn test_variable_name() {
        let source = EnvSource::new();
        assert_eq!(source.variable_name("db_url"), "DB_URL");
        assert_eq!(
            source.with_prefix("Svc_").variable_name("db_url"),
            "SVC_DB_URL"
        );
        assert_eq!(
            EnvSource::new()
                .with_prefix("Svc_")
                .with_strict_case(true)
                .variable_name("db_url"),
            "Svc_db_url"
        );
    }

    #[test]
    fn test_resolves_upper_cased_variable() {
        let _env = crate::TEST_ENV_LOCK.lock();
        env::set_var("KEYSTONE_CORE_ENV_TEST_PORT", "9090");
        let mut port = 0u16;
        let mut parameters = Parameters::new();
        parameters.insert(
            "keystone_core_env_test_port".to_string(),
            vec![param(&mut port, "port")],
        );

        EnvSource::new().resolve(parameters).unwrap();
        env::remove_var("KEYSTONE_CORE_ENV_TEST_PORT");
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_strict_case_misses_other_casing() {
        let _env = crate::TEST_ENV_LOCK.lock();
        env::set_var("KEYSTONE_CORE_ENV_TEST_STRICT", "on");
        let mut value = String::from("unchanged");
        let mut parameters = Parameters::new();
        parameters.insert(
            "keystone_core_env_test_strict".to_string(),
            vec![param(&mut value, "value")],
        );

        EnvSource::new()
            .with_strict_case(true)
            .resolve(parameters)
            .unwrap();
        env::remove_var("KEYSTONE_CORE_ENV_TEST_STRICT");
        assert_eq!(value, "unchanged");
    }

    #[test]
    fn test_shared_key_feeds_every_parameter() {
        let _env = crate::TEST_ENV_LOCK.lock();
        env::set_var("KEYSTONE_CORE_ENV_TEST_SHARED", "5");
        let mut a = 0u8;
        let mut b = 0i64;
        let mut parameters = Parameters::new();
        parameters.insert(
            "SHARED".to_string(),
            vec![param(&mut a, "a"), param(&mut b, "b")],
        );

        EnvSource::new()
            .with_prefix("KEYSTONE_CORE_ENV_TEST_")
            .resolve(parameters)
            .unwrap();
        env::remove_var("KEYSTONE_CORE_ENV_TEST_SHARED");
        assert_eq!((a, b), (5, 5));
    }

    #[test]
    fn test_errors_do_not_stop_other_keys() {
        let _env = crate::TEST_ENV_LOCK.lock();
        env::set_var("KEYSTONE_CORE_ENV_TEST_BAD", "not-a-number");
        env::set_var("KEYSTONE_CORE_ENV_TEST_GOOD", "true");
        let mut bad = 0u32;
        let mut good = false;
        let mut parameters = Parameters::new();
        parameters.insert(
            "KEYSTONE_CORE_ENV_TEST_BAD".to_string(),
            vec![param(&mut bad, "bad")],
        );
        parameters.insert(
            "KEYSTONE_CORE_ENV_TEST_GOOD".to_string(),
            vec![param(&mut good, "good")],
        );

        let errors = EnvSource::new().resolve(parameters).unwrap_err();
        env::remove_var("KEYSTONE_CORE_ENV_TEST_BAD");
        env::remove_var("KEYSTONE_CORE_ENV_TEST_GOOD");
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ErrorKind::ConversionFailure));
        assert!(good);
    }

    #[test]
    fn test_unset_variable_uses_no_value_policy() {
        let mut port = 0u16;
        let mut parameters = Parameters::new();
        parameters.insert(
            "KEYSTONE_CORE_ENV_TEST_UNSET".to_string(),
            vec![Box::new(
                FieldParameter::new(
                    "port",
                    "env",
                    "KEYSTONE_CORE_ENV_TEST_UNSET",
                    setter(port.slot()).unwrap(),
                )
                .with_default(Some("8080")),
            ) as Box<dyn Parameter + '_>],
        );

        EnvSource::new().resolve(parameters).unwrap();
        assert_eq!(port, 8080);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_value_is_replaced() {
        use std::os::unix::ffi::OsStringExt;

        let value = OsString::from_vec(vec![b'o', b'k', 0x80]);
        assert_eq!(decode("RAW", value), "ok\u{fffd}");
        assert_eq!(decode("PLAIN", OsString::from("plain")), "plain");
    }
}
