//! Dry-run interception of mutating statements.

use async_trait::async_trait;
use parking_lot::Mutex;
use tabula_query::{CompiledStatement, Connection, Grammar, QueryError, QueryResult, Row, Value};
use tracing::debug;

/// One statement intercepted during a dry run.
#[derive(Debug)]
pub struct SchemaStatement {
    connection_name: String,
    query: String,
    params: Vec<Value>,
    error: Option<QueryError>,
}

impl SchemaStatement {
    /// Name of the connection the statement targeted.
    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    /// The SQL text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Bound parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The validation error, if the connection rejected the statement.
    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }
}

/// Statements intercepted during one migration's dry run, in issue order.
#[derive(Debug, Default)]
pub struct SchemaRecorderBucket {
    statements: Vec<SchemaStatement>,
}

impl SchemaRecorderBucket {
    /// Every captured statement.
    pub fn all(&self) -> &[SchemaStatement] {
        &self.statements
    }

    /// Statements the connection rejected.
    pub fn failed(&self) -> impl Iterator<Item = &SchemaStatement> {
        self.statements.iter().filter(|s| s.error.is_some())
    }

    /// Number of captured statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Wraps a connection so `execute` validates and records instead of running.
///
/// Queries and explicit validation pass straight through: they do not
/// change state and migrations rely on their answers (`has_table`).
pub struct RecordingConnection<'a> {
    inner: &'a dyn Connection,
    captured: Mutex<Vec<SchemaStatement>>,
}

impl<'a> RecordingConnection<'a> {
    /// Intercept statements bound for `inner`.
    pub fn new(inner: &'a dyn Connection) -> Self {
        Self {
            inner,
            captured: Mutex::new(Vec::new()),
        }
    }

    /// Stop recording and hand over what was captured.
    pub fn into_bucket(self) -> SchemaRecorderBucket {
        SchemaRecorderBucket {
            statements: self.captured.into_inner(),
        }
    }
}

#[async_trait]
impl Connection for RecordingConnection<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn grammar(&self) -> &Grammar {
        self.inner.grammar()
    }

    async fn execute(&self, statement: &CompiledStatement) -> QueryResult<u64> {
        let error = self.inner.validate(statement).await.err();
        debug!(
            connection = self.inner.name(),
            sql = statement.sql(),
            valid = error.is_none(),
            "Intercepted statement"
        );
        self.captured.lock().push(SchemaStatement {
            connection_name: self.inner.name().to_string(),
            query: statement.sql().to_string(),
            params: statement.params().to_vec(),
            error,
        });
        Ok(0)
    }

    async fn query(&self, statement: &CompiledStatement) -> QueryResult<Vec<Row>> {
        self.inner.query(statement).await
    }

    async fn validate(&self, statement: &CompiledStatement) -> QueryResult<()> {
        self.inner.validate(statement).await
    }
}
