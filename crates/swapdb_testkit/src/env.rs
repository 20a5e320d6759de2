//! Serialized access to process environment variables.
//!
//! Backend selection reads the environment, and the test harness runs
//! tests on parallel threads. Every test that sets, clears or depends on
//! `SWAPDB_POSTGRES*` must hold an [`EnvGuard`].

use parking_lot::{Mutex, MutexGuard};
use std::ffi::OsString;
use swapdb_core::{env as vars, BackendConfig, PostgresParams};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive access to the environment; restores it on drop.
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Takes the environment lock without changing anything.
    pub fn lock() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock(),
        }
    }

    /// Takes the lock and removes every `SWAPDB_POSTGRES*` variable, so
    /// the embedded backend is selected.
    pub fn embedded() -> Self {
        let mut guard = Self::lock();
        guard.clear_backend();
        guard
    }

    fn save(&mut self, key: &str) {
        if !self.saved.iter().any(|(k, _)| k == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }

    /// Sets a variable until the guard is dropped.
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.save(key);
        std::env::set_var(key, value);
        self
    }

    /// Removes a variable until the guard is dropped.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.save(key);
        std::env::remove_var(key);
        self
    }

    /// Removes every `SWAPDB_POSTGRES*` variable.
    pub fn clear_backend(&mut self) -> &mut Self {
        for key in vars::ALL {
            self.remove(key);
        }
        self
    }

    /// Sets the variables that select `params`.
    pub fn set_postgres(&mut self, params: &PostgresParams) -> &mut Self {
        self.clear_backend();
        self.set(vars::ENABLE, "1")
            .set(vars::DATABASE, &params.database)
            .set(vars::USER, &params.user)
            .set(vars::HOST, &params.host)
            .set(vars::PORT, &params.port.to_string());
        if let Some(password) = &params.password {
            self.set(vars::PASSWORD, password);
        }
        self
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Returns the PostgreSQL server the environment points at, if any.
///
/// Tests that need a live server call this while holding an [`EnvGuard`]
/// and return early when it yields `None`.
pub fn live_postgres() -> Option<PostgresParams> {
    match BackendConfig::resolve(std::path::Path::new(""), |k| std::env::var(k).ok()) {
        Ok(BackendConfig::Networked(params)) => Some(params),
        _ => None,
    }
}
