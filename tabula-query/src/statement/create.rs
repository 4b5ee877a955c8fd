//! `CREATE TABLE` statement builder.

use tracing::debug;

use super::CompiledStatement;
use crate::connection::Connection;
use crate::error::QueryResult;
use crate::grammar::Grammar;
use crate::schema::Blueprint;

/// A creating-mode [`Blueprint`] exposed as an executable statement.
///
/// ```rust
/// use tabula_query::{Grammar, statement::Create};
///
/// let stmt = Create::table("tags", |t| {
///     t.increments("id");
///     t.var_char("label", 32).charset("utf8mb4");
///     t.primary(["id"]);
/// })
/// .compile(&Grammar::mysql());
///
/// assert_eq!(
///     stmt.sql(),
///     "CREATE TABLE `tags` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, \
///      `label` VARCHAR(32) CHARACTER SET utf8mb4 NOT NULL, PRIMARY KEY (`id`));"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Create {
    blueprint: Blueprint,
}

impl Create {
    /// An empty `CREATE TABLE` for the (unprefixed) table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            blueprint: Blueprint::create(table),
        }
    }

    /// Create and populate in one call.
    pub fn table<F>(table: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut create = Self::new(table);
        build(&mut create.blueprint);
        create
    }

    /// Mutable access to the underlying blueprint.
    pub fn blueprint_mut(&mut self) -> &mut Blueprint {
        &mut self.blueprint
    }

    /// The underlying blueprint.
    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Compile to SQL text. DDL carries no parameters.
    pub fn compile(&self, grammar: &Grammar) -> CompiledStatement {
        CompiledStatement::new(self.blueprint.compile(grammar))
    }

    /// Compile against the connection's grammar and execute.
    pub async fn exec(&self, conn: &dyn Connection) -> QueryResult<u64> {
        let statement = self.compile(conn.grammar());
        debug!(table = self.blueprint.table(), "Executing create table");
        conn.execute(&statement).await
    }
}
