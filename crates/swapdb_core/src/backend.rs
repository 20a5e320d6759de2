//! Backend selection.
//!
//! The environment is read in exactly one place, [`BackendConfig::from_env`].
//! Everything below it takes an explicit [`BackendConfig`], so tests can
//! build configurations directly.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use swapdb_engine::{
    BackendKind, Engine, PostgresEngine, PostgresParams, SqliteEngine, DEFAULT_HOST, DEFAULT_PORT,
};

/// Environment variables that select and configure the networked engine.
///
/// Empty values count as unset.
pub mod env {
    /// Enables the networked engine when set to any non-empty value.
    pub const ENABLE: &str = "SWAPDB_POSTGRES";
    /// Database name. Required when enabled.
    pub const DATABASE: &str = "SWAPDB_POSTGRES_DATABASE";
    /// Role name. Required when enabled.
    pub const USER: &str = "SWAPDB_POSTGRES_USER";
    /// Password. Optional.
    pub const PASSWORD: &str = "SWAPDB_POSTGRES_PASSWORD";
    /// Server port. Defaults to 5432.
    pub const PORT: &str = "SWAPDB_POSTGRES_PORT";
    /// Server host. Defaults to `localhost`.
    pub const HOST: &str = "SWAPDB_POSTGRES_HOST";

    /// Every variable above.
    pub const ALL: [&str; 6] = [ENABLE, DATABASE, USER, PASSWORD, PORT, HOST];
}

/// Which engine to open, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Embedded SQLite file.
    Embedded {
        /// Database file.
        path: PathBuf,
    },
    /// Networked PostgreSQL server.
    Networked(PostgresParams),
}

impl BackendConfig {
    /// Creates an embedded configuration.
    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        Self::Embedded { path: path.into() }
    }

    /// Resolves the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`BackendConfig::resolve`].
    pub fn from_env(path: &Path) -> CoreResult<Self> {
        Self::resolve(path, |name| std::env::var(name).ok())
    }

    /// Resolves the configuration from a variable lookup.
    ///
    /// If [`env::ENABLE`] is unset the result is always
    /// [`BackendConfig::Embedded`] at `path`, whatever else is set.
    /// Otherwise every required networked variable must be present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if a required variable is
    /// missing or the port is not a number in `0..=65535`.
    pub fn resolve<F>(path: &Path, lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if var(env::ENABLE).is_none() {
            return Ok(Self::embedded(path));
        }

        let database = var(env::DATABASE).ok_or_else(|| CoreError::missing_variable(env::DATABASE))?;
        let user = var(env::USER).ok_or_else(|| CoreError::missing_variable(env::USER))?;
        let port = match var(env::PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                CoreError::configuration(format!("{} is not a valid port ({raw:?}): {e}", env::PORT))
            })?,
            None => DEFAULT_PORT,
        };
        let host = var(env::HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let mut params = PostgresParams::new(database, user)
            .with_host(host)
            .with_port(port);
        params.password = var(env::PASSWORD);
        Ok(Self::Networked(params))
    }

    /// Returns the engine this configuration selects.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Embedded { .. } => BackendKind::Sqlite,
            Self::Networked(_) => BackendKind::Postgres,
        }
    }

    /// Returns true for the networked engine.
    #[must_use]
    pub fn is_networked(&self) -> bool {
        matches!(self, Self::Networked(_))
    }

    /// Opens the selected engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Connection`] if the engine cannot be opened.
    pub fn connect(&self, config: &Config) -> CoreResult<Box<dyn Engine>> {
        let engine: Box<dyn Engine> = match self {
            Self::Embedded { path } => Box::new(SqliteEngine::open(path, &config.sqlite)?),
            Self::Networked(params) => {
                Box::new(PostgresEngine::connect(params, config.connect_timeout)?)
            }
        };
        Ok(engine)
    }
}
