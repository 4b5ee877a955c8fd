//! The seam between compiled statements and a live database.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::QueryResult;
use crate::grammar::Grammar;
use crate::statement::CompiledStatement;
use crate::value::Value;

/// One result row, columns in server order.
pub type Row = IndexMap<String, Value>;

/// A database connection able to run compiled statements.
///
/// Implementations are driven strictly sequentially: callers await each
/// round trip before issuing the next one.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Connection name used when reporting intercepted statements.
    fn name(&self) -> &str;

    /// Grammar statements for this connection are compiled with.
    fn grammar(&self) -> &Grammar;

    /// Execute a mutating statement, returning the affected row count.
    async fn execute(&self, statement: &CompiledStatement) -> QueryResult<u64>;

    /// Run a statement that returns rows.
    async fn query(&self, statement: &CompiledStatement) -> QueryResult<Vec<Row>>;

    /// Check a statement for errors without changing any state.
    async fn validate(&self, statement: &CompiledStatement) -> QueryResult<()>;
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn grammar(&self) -> &Grammar {
        (**self).grammar()
    }

    async fn execute(&self, statement: &CompiledStatement) -> QueryResult<u64> {
        (**self).execute(statement).await
    }

    async fn query(&self, statement: &CompiledStatement) -> QueryResult<Vec<Row>> {
        (**self).query(statement).await
    }

    async fn validate(&self, statement: &CompiledStatement) -> QueryResult<()> {
        (**self).validate(statement).await
    }
}
