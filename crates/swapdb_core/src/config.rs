//! Database configuration.

use std::time::Duration;
use swapdb_engine::SqliteOptions;

/// Configuration for opening a database.
///
/// Which engine to use is decided by [`BackendConfig`](crate::BackendConfig);
/// this holds the knobs that apply once the engine is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Options for the embedded engine.
    pub sqlite: SqliteOptions,

    /// How long to wait for a networked server to accept a connection.
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sqlite: SqliteOptions::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the embedded engine options.
    #[must_use]
    pub const fn sqlite(mut self, options: SqliteOptions) -> Self {
        self.sqlite = options;
        self
    }

    /// Sets whether missing parent directories of the database file are created.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.sqlite = self.sqlite.create_dirs(value);
        self
    }

    /// Sets whether the embedded engine enforces foreign keys.
    #[must_use]
    pub const fn foreign_keys(mut self, value: bool) -> Self {
        self.sqlite = self.sqlite.foreign_keys(value);
        self
    }

    /// Sets the networked connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(!config.sqlite.create_dirs);
        assert!(!config.sqlite.foreign_keys);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_dirs(true)
            .foreign_keys(true)
            .connect_timeout(Duration::from_millis(250));

        assert!(config.sqlite.create_dirs);
        assert!(config.sqlite.foreign_keys);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }
}
