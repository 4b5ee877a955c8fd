//! `DELETE FROM` builder.

use tracing::debug;

use super::{Bindings, CompiledStatement, Predicate, WhereClause};
use crate::connection::Connection;
use crate::error::QueryResult;
use crate::grammar::Grammar;
use crate::value::Value;

/// Builds `DELETE FROM t [WHERE ...];`.
#[derive(Debug, Clone, Default)]
pub struct Delete {
    table: String,
    conditions: WhereClause,
}

impl Delete {
    /// Start a delete from the (unprefixed) table.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: WhereClause::new(),
        }
    }

    /// Add a predicate joined with `AND`.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.conditions.and(predicate);
        self
    }

    /// Add a predicate joined with `OR`.
    pub fn or_where(mut self, predicate: Predicate) -> Self {
        self.conditions.or(predicate);
        self
    }

    /// Shorthand for `and_where(Predicate::eq(column, value))`.
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and_where(Predicate::eq(column, value))
    }

    /// Compile to SQL text and parameters.
    pub fn compile(&self, grammar: &Grammar) -> CompiledStatement {
        let mut b = Bindings::new(grammar);
        let conditions = self.conditions.compile(&mut b);
        let sql = format!("DELETE FROM {}{};", grammar.wrap_table(&self.table), conditions);
        b.finish(sql)
    }

    /// Compile against the connection's grammar and execute.
    pub async fn exec(&self, conn: &dyn Connection) -> QueryResult<u64> {
        let statement = self.compile(conn.grammar());
        debug!(table = %self.table, "Executing delete");
        conn.execute(&statement).await
    }
}
