//! Serialised, self-restoring environment mutation.

use std::env;
use std::ffi::OsString;

use parking_lot::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Exclusive access to the process environment for one test.
///
/// Creating a guard blocks until no other guard is alive. Variables changed
/// through the guard are restored to their previous state when it is
/// dropped. Guards are not reentrant: do not create a second one on the same
/// thread while the first is alive.
///
/// # Example
///
/// ```
/// use keystone_test::EnvGuard;
///
/// {
///     let mut env = EnvGuard::new();
///     env.set("KEYSTONE_TEST_DOC_VAR", "1");
///     assert_eq!(std::env::var("KEYSTONE_TEST_DOC_VAR").unwrap(), "1");
/// }
/// assert!(std::env::var("KEYSTONE_TEST_DOC_VAR").is_err());
/// ```
#[must_use = "the environment is restored when the guard is dropped"]
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Acquire the environment lock.
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock(),
        }
    }

    /// Set a variable for the lifetime of the guard.
    pub fn set(&mut self, key: impl Into<String>, value: impl AsRef<str>) -> &mut Self {
        let key = key.into();
        self.save(&key);
        env::set_var(&key, value.as_ref());
        self
    }

    /// Unset a variable for the lifetime of the guard.
    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.save(&key);
        env::remove_var(&key);
        self
    }

    fn save(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), env::var_os(key)));
        }
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => env::set_var(&key, value),
                None => env::remove_var(&key),
            }
        }
    }
}

impl std::fmt::Debug for EnvGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvGuard")
            .field(
                "variables",
                &self.saved.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_guard_restores_previous_values() {
        {
            let mut env = EnvGuard::new();
            env.set("KEYSTONE_TEST_GUARD_EXISTING", "before");
        }
        assert!(env::var_os("KEYSTONE_TEST_GUARD_EXISTING").is_none());

        // Set outside any guard, then overwritten and removed inside one.
        env::set_var("KEYSTONE_TEST_GUARD_KEPT", "original");
        {
            let mut env = EnvGuard::new();
            env.set("KEYSTONE_TEST_GUARD_KEPT", "changed")
                .set("KEYSTONE_TEST_GUARD_KEPT", "changed again")
                .remove("KEYSTONE_TEST_GUARD_KEPT");
            assert!(env::var_os("KEYSTONE_TEST_GUARD_KEPT").is_none());
        }
        assert_eq!(env::var("KEYSTONE_TEST_GUARD_KEPT").unwrap(), "original");
        env::remove_var("KEYSTONE_TEST_GUARD_KEPT");
    }

    #[test]
    fn test_env_guard_debug_lists_variables() {
        let mut env = EnvGuard::new();
        env.set("KEYSTONE_TEST_GUARD_DEBUG", "1");
        assert!(format!("{env:?}").contains("KEYSTONE_TEST_GUARD_DEBUG"));
    }
}
