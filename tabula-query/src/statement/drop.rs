//! `DROP TABLE` / `DROP DATABASE` builder.

use super::CompiledStatement;
use crate::connection::Connection;
use crate::error::QueryResult;
use crate::grammar::Grammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Object {
    Table,
    Database,
}

/// Builds `DROP TABLE|DATABASE [IF EXISTS] name;`.
///
/// Table names receive the grammar's prefix, database names do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStatement {
    object: Object,
    name: String,
    if_exists: bool,
}

impl DropStatement {
    /// Drop a table.
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            object: Object::Table,
            name: name.into(),
            if_exists: false,
        }
    }

    /// Drop a database.
    pub fn database(name: impl Into<String>) -> Self {
        Self {
            object: Object::Database,
            name: name.into(),
            if_exists: false,
        }
    }

    /// Add `IF EXISTS`.
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Compile to SQL text.
    pub fn compile(&self, grammar: &Grammar) -> CompiledStatement {
        let (keyword, name) = match self.object {
            Object::Table => ("TABLE", grammar.wrap_table(&self.name)),
            Object::Database => ("DATABASE", grammar.quote_name(&self.name)),
        };
        let exists = if self.if_exists { " IF EXISTS" } else { "" };
        CompiledStatement::new(format!("DROP {}{} {};", keyword, exists, name))
    }

    /// Compile against the connection's grammar and execute.
    pub async fn exec(&self, conn: &dyn Connection) -> QueryResult<u64> {
        conn.execute(&self.compile(conn.grammar())).await
    }
}
