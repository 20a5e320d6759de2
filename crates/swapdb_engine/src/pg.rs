//! Networked PostgreSQL engine.

use crate::backend::{BackendKind, Engine};
use crate::error::{EngineError, EngineResult};
use crate::result::ResultSet;
use bytes::BytesMut;
use postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use postgres::{Client, Column, NoTls, Row};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use swapdb_codec::ColumnValue;
use tracing::debug;

/// Default server port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Connection parameters for a PostgreSQL server.
///
/// The password is never printed: `Debug` redacts it and
/// [`Engine::describe`] leaves it out.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresParams {
    /// Database name.
    pub database: String,
    /// Role to connect as.
    pub user: String,
    /// Password, if the server requires one.
    pub password: Option<String>,
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl PostgresParams {
    /// Creates parameters with the default host and port and no password.
    pub fn new(database: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            user: user.into(),
            password: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn client_config(&self, connect_timeout: Duration) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .dbname(&self.database)
            .user(&self.user)
            .host(&self.host)
            .port(self.port)
            .connect_timeout(connect_timeout);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

impl fmt::Debug for PostgresParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresParams")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// A connection to a PostgreSQL server.
///
/// Uses the blocking `postgres` client without TLS.
pub struct PostgresEngine {
    client: Client,
    params: PostgresParams,
}

impl PostgresEngine {
    /// Connects to the server.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connect`] if the server is unreachable or
    /// rejects the credentials.
    pub fn connect(params: &PostgresParams, connect_timeout: Duration) -> EngineResult<Self> {
        let client = params
            .client_config(connect_timeout)
            .connect(NoTls)
            .map_err(|e| EngineError::connect(BackendKind::Postgres, e.to_string()))?;
        debug!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            "connected to postgres"
        );
        Ok(Self {
            client,
            params: params.clone(),
        })
    }

    /// Returns the parameters this engine connected with.
    #[must_use]
    pub fn params(&self) -> &PostgresParams {
        &self.params
    }

    /// Returns the underlying client.
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl fmt::Debug for PostgresEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Engine for PostgresEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    fn describe(&self) -> String {
        format!(
            "postgres {}@{}:{}/{}",
            self.params.user, self.params.host, self.params.port, self.params.database
        )
    }

    fn execute(&mut self, sql: &str, params: &[ColumnValue]) -> EngineResult<ResultSet> {
        let stmt = self.client.prepare(sql)?;
        let bound: Vec<Param<'_>> = params.iter().map(Param).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        if stmt.columns().is_empty() {
            let changed = self.client.execute(&stmt, &refs)?;
            return Ok(ResultSet::affected(changed));
        }

        let columns = stmt.columns();
        if let Some(column) = columns.iter().find(|c| !is_supported(c.type_())) {
            return Err(EngineError::UnsupportedType {
                column: column.name().to_string(),
                type_name: column.type_().name().to_string(),
            });
        }

        let rows = self.client.query(&stmt, &refs)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(row_values(row, columns)?);
        }
        let names = columns.iter().map(|c| c.name().to_string()).collect();
        Ok(ResultSet::new(names, out))
    }

    fn execute_batch(&mut self, sql: &str) -> EngineResult<()> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn table_exists(&mut self, name: &str) -> EngineResult<bool> {
        let row = self.client.query_one(
            "SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_tables \
             WHERE schemaname = current_schema() AND tablename = $1)",
            &[&name],
        )?;
        Ok(row.try_get(0)?)
    }

    fn table_names(&mut self) -> EngineResult<Vec<String>> {
        let rows = self.client.query(
            "SELECT tablename::text FROM pg_catalog.pg_tables \
             WHERE schemaname = current_schema() ORDER BY tablename",
            &[],
        )?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(EngineError::from))
            .collect()
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        self.client.close()?;
        debug!(database = %self.params.database, "closed postgres connection");
        Ok(())
    }
}

/// Borrowed parameter binding for a column value.
///
/// A value binds only to server types that hold it exactly. Integers are
/// narrowed to the width the server inferred for the placeholder and fail
/// if they do not fit; any other mismatch is an error rather than a
/// reinterpretation of the bytes.
#[derive(Debug)]
struct Param<'a>(&'a ColumnValue);

type BindResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

fn mismatch(value: &ColumnValue, ty: &Type) -> BindResult {
    Err(format!("cannot bind {} value to parameter of type {ty}", value.kind()).into())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn bind_integer(n: i64, ty: &Type, out: &mut BytesMut) -> BindResult {
    match *ty {
        Type::INT8 => n.to_sql(ty, out),
        Type::INT4 => i32::try_from(n)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(n)?.to_sql(ty, out),
        Type::BOOL => match n {
            0 | 1 => (n == 1).to_sql(ty, out),
            _ => Err(format!("integer {n} is not a boolean").into()),
        },
        Type::FLOAT8 if (n as f64) as i128 == i128::from(n) => (n as f64).to_sql(ty, out),
        Type::FLOAT4 if (n as f32) as i128 == i128::from(n) => (n as f32).to_sql(ty, out),
        Type::FLOAT4 | Type::FLOAT8 => {
            Err(format!("integer {n} is not exactly representable as {ty}").into())
        }
        _ => mismatch(&ColumnValue::Integer(n), ty),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn bind_real(f: f64, ty: &Type, out: &mut BytesMut) -> BindResult {
    match *ty {
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::FLOAT4 if f64::from(f as f32) == f || f.is_nan() => (f as f32).to_sql(ty, out),
        Type::FLOAT4 => Err(format!("float {f} is not exactly representable as {ty}").into()),
        _ => mismatch(&ColumnValue::Real(f), ty),
    }
}

impl ToSql for Param<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> BindResult {
        match self.0 {
            ColumnValue::Null => Ok(IsNull::Yes),
            ColumnValue::Integer(n) => bind_integer(*n, ty, out),
            ColumnValue::Real(f) => bind_real(*f, ty, out),
            ColumnValue::Text(s) if <&str as ToSql>::accepts(ty) => s.as_str().to_sql(ty, out),
            ColumnValue::Blob(b) if <&[u8] as ToSql>::accepts(ty) => b.as_slice().to_sql(ty, out),
            other => mismatch(other, ty),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn is_supported(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::BOOL
            | Type::INT2
            | Type::INT4
            | Type::INT8
            | Type::FLOAT4
            | Type::FLOAT8
            | Type::TEXT
            | Type::VARCHAR
            | Type::BPCHAR
            | Type::NAME
            | Type::BYTEA
    )
}

fn row_values(row: &Row, columns: &[Column]) -> EngineResult<Vec<ColumnValue>> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value = match *column.type_() {
            Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(ColumnValue::from),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(idx)?
                .map(|v| ColumnValue::Integer(i64::from(v))),
            Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(ColumnValue::from),
            Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(ColumnValue::from),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(idx)?
                .map(|v| ColumnValue::Real(f64::from(v))),
            Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(ColumnValue::from),
            Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(ColumnValue::from),
            _ => row.try_get::<_, Option<String>>(idx)?.map(ColumnValue::from),
        };
        values.push(value.unwrap_or(ColumnValue::Null));
    }
    Ok(values)
}
