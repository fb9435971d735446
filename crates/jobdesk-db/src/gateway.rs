//! Stored-operation invocation over Postgres.
//!
//! Operations are Postgres functions invoked as
//! `SELECT to_jsonb(r) FROM "op"($1..$n) AS r`. Each result row comes back
//! as one JSON object, which keeps the gateway generic over whatever
//! columns an operation returns: declared output parameters are read from
//! the first row, any remaining rows are the tabular result.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;

use crate::params::{OutputSpec, ParamValue};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("invalid operation name: {0}")]
    InvalidOperationName(String),

    #[error("failed to acquire connection: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("operation '{operation}' failed: {source}")]
    Operation {
        operation: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Output parameter values filled by the store.
///
/// Lookup is case-insensitive: Postgres folds unquoted column names to
/// lowercase, while callers declare outputs in the casing the operation
/// contract uses.
#[derive(Debug, Default)]
pub struct OutputValues(HashMap<String, Value>);

impl OutputValues {
    /// Build output values from a result row. Public so gateway
    /// implementations outside this crate can assemble results.
    pub fn from_row(row: &serde_json::Map<String, Value>, specs: &[OutputSpec]) -> Self {
        let mut values = HashMap::new();
        for spec in specs {
            let wanted = spec.name.to_lowercase();
            if let Some((_, value)) = row.iter().find(|(k, _)| k.to_lowercase() == wanted) {
                values.insert(wanted, value.clone());
            }
        }
        OutputValues(values)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.0.get(&name.to_lowercase())? {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.0.get(&name.to_lowercase())? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Result of one stored-operation invocation.
#[derive(Debug, Default)]
pub struct CallResult {
    pub outputs: OutputValues,
    pub rows: Vec<serde_json::Map<String, Value>>,
}

/// Opaque persistence collaborator keyed by operation name.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn invoke(
        &self,
        operation: &str,
        inputs: &[(String, ParamValue)],
        outputs: &[OutputSpec],
    ) -> Result<CallResult, PersistenceError>;
}

/// sqlx-backed gateway. Acquires a pooled connection per call and releases
/// it on every exit path, including errors.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn build_statement(operation: &str, arg_count: usize) -> Result<String, PersistenceError> {
        if operation.is_empty()
            || !operation
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(PersistenceError::InvalidOperationName(
                operation.to_string(),
            ));
        }
        let placeholders = (1..=arg_count)
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "SELECT to_jsonb(__r) FROM \"{}\"({}) AS __r",
            operation, placeholders
        ))
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    #[tracing::instrument(skip(self, inputs, outputs), fields(db.operation = operation))]
    async fn invoke(
        &self,
        operation: &str,
        inputs: &[(String, ParamValue)],
        outputs: &[OutputSpec],
    ) -> Result<CallResult, PersistenceError> {
        let sql = Self::build_statement(operation, inputs.len())?;

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(PersistenceError::Connection)?;

        let mut query = sqlx::query_scalar::<Postgres, Value>(&sql);
        for (_, value) in inputs {
            query = match value {
                ParamValue::Text { value, .. } => query.bind(value.clone()),
                ParamValue::Int(v) => query.bind(*v),
                ParamValue::Float(v) => query.bind(*v),
                ParamValue::Bool(v) => query.bind(*v),
                ParamValue::Raw(raw) => query.bind(raw.clone()),
                ParamValue::Null => query.bind(Option::<String>::None),
            };
        }

        let raw_rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|source| PersistenceError::Operation {
                operation: operation.to_string(),
                source,
            })?;

        let mut rows: Vec<serde_json::Map<String, Value>> = raw_rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();

        let output_values = if outputs.is_empty() {
            OutputValues::default()
        } else if let Some(first) = rows.first() {
            let values = OutputValues::from_row(first, outputs);
            rows.remove(0);
            values
        } else {
            // No row means no output values; callers decide whether an
            // absent output is a failure.
            OutputValues::default()
        };

        tracing::debug!(
            db.operation = operation,
            row_count = rows.len(),
            "stored operation completed"
        );

        Ok(CallResult {
            outputs: output_values,
            rows,
        })
    }
}
