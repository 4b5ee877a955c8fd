//! Fixed-shape `SHOW` introspection statements.

use super::CompiledStatement;
use crate::connection::{Connection, Row};
use crate::error::QueryResult;
use crate::grammar::Grammar;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Tables,
    TableStatus,
    Columns(String),
    Databases,
    CreateTable(String),
}

/// Builds `SHOW ...;` statements.
///
/// ```rust
/// use tabula_query::{Grammar, statement::Show};
///
/// let g = Grammar::mysql().with_prefix("p_");
/// assert_eq!(Show::tables().compile(&g).sql(), "SHOW TABLES;");
/// assert_eq!(Show::columns("users").compile(&g).sql(), "SHOW COLUMNS FROM `p_users`;");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    target: Target,
    like: Option<String>,
}

impl Show {
    fn new(target: Target) -> Self {
        Self { target, like: None }
    }

    /// `SHOW TABLES`
    pub fn tables() -> Self {
        Self::new(Target::Tables)
    }

    /// `SHOW TABLE STATUS`
    pub fn table_status() -> Self {
        Self::new(Target::TableStatus)
    }

    /// `SHOW COLUMNS FROM <prefixed table>`
    pub fn columns(table: impl Into<String>) -> Self {
        Self::new(Target::Columns(table.into()))
    }

    /// `SHOW DATABASES`
    pub fn databases() -> Self {
        Self::new(Target::Databases)
    }

    /// `SHOW CREATE TABLE <prefixed table>`
    pub fn create_table(table: impl Into<String>) -> Self {
        Self::new(Target::CreateTable(table.into()))
    }

    /// Filter with `LIKE '<pattern>'`.
    ///
    /// MySQL only accepts a string literal here, so the pattern is inlined
    /// as an escaped literal rather than bound. `%` and `_` keep their
    /// wildcard meaning.
    pub fn like(mut self, pattern: impl Into<String>) -> Self {
        self.like = Some(pattern.into());
        self
    }

    /// Compile to SQL text and parameters.
    pub fn compile(&self, grammar: &Grammar) -> CompiledStatement {
        let mut sql = match &self.target {
            Target::Tables => "SHOW TABLES".to_string(),
            Target::TableStatus => "SHOW TABLE STATUS".to_string(),
            Target::Columns(table) => format!("SHOW COLUMNS FROM {}", grammar.wrap_table(table)),
            Target::Databases => "SHOW DATABASES".to_string(),
            Target::CreateTable(table) => {
                format!("SHOW CREATE TABLE {}", grammar.wrap_table(table))
            }
        };

        if let Some(pattern) = &self.like {
            sql.push_str(" LIKE ");
            sql.push_str(&grammar.quote_string(pattern));
        }
        sql.push(';');
        CompiledStatement::new(sql)
    }

    /// Compile against the connection's grammar and fetch the rows.
    pub async fn fetch(&self, conn: &dyn Connection) -> QueryResult<Vec<Row>> {
        conn.query(&self.compile(conn.grammar())).await
    }
}
