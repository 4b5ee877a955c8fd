//! Table definitions and the schema handle that executes them.
//!
//! A [`Schema`] binds the pure compilers in this module to a [`Connection`]:
//!
//! ```rust,no_run
//! use tabula_query::{Connection, QueryResult, Schema};
//!
//! async fn up(conn: &dyn Connection) -> QueryResult<()> {
//!     let schema = Schema::new(conn);
//!     schema
//!         .create("users", |t| {
//!             t.increments("id");
//!             t.var_char("username", 64);
//!             t.primary(["id"]);
//!         })
//!         .await?;
//!     schema.table("users", |t| {
//!         t.index(["username"]);
//!     })
//!     .await
//! }
//! ```

mod blueprint;
mod column;
mod command;

use tracing::debug;

pub use blueprint::Blueprint;
pub use column::{ColumnDefault, ColumnDefinition};
pub use command::{Command, CommandContext, CommandKind, ForeignCommand};

use crate::connection::Connection;
use crate::error::QueryResult;
use crate::grammar::Grammar;
use crate::statement::{CompiledStatement, DropStatement};
use crate::value::Value;

/// Executes blueprints and single-line DDL against one connection.
#[derive(Clone, Copy)]
pub struct Schema<'a> {
    conn: &'a dyn Connection,
}

impl std::fmt::Debug for Schema<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("connection", &self.conn.name())
            .finish()
    }
}

impl<'a> Schema<'a> {
    /// Bind a schema handle to a connection.
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    /// The bound connection.
    pub fn connection(&self) -> &'a dyn Connection {
        self.conn
    }

    /// The connection's grammar.
    pub fn grammar(&self) -> &'a Grammar {
        self.conn.grammar()
    }

    async fn run(&self, sql: String) -> QueryResult<()> {
        debug!(connection = self.conn.name(), sql = %sql, "Executing schema statement");
        self.conn.execute(&CompiledStatement::new(sql)).await?;
        Ok(())
    }

    /// Build and execute a `CREATE TABLE`.
    pub async fn create<F>(&self, table: &str, build: F) -> QueryResult<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::create(table);
        build(&mut blueprint);
        blueprint.validate()?;
        self.run(blueprint.compile(self.grammar())).await
    }

    /// Build and execute an `ALTER TABLE`. An empty blueprint issues nothing.
    pub async fn table<F>(&self, table: &str, build: F) -> QueryResult<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::alter(table);
        build(&mut blueprint);
        if blueprint.is_empty() {
            return Ok(());
        }
        blueprint.validate()?;
        self.run(blueprint.compile(self.grammar())).await
    }

    /// `RENAME TABLE from TO to;`
    pub async fn rename(&self, from: &str, to: &str) -> QueryResult<()> {
        let g = self.grammar();
        self.run(format!(
            "RENAME TABLE {} TO {};",
            g.wrap_table(from),
            g.wrap_table(to)
        ))
        .await
    }

    /// `DROP TABLE name;`
    pub async fn drop(&self, table: &str) -> QueryResult<()> {
        let sql = DropStatement::table(table).compile(self.grammar());
        self.run(sql.into_parts().0).await
    }

    /// `DROP TABLE IF EXISTS name;`
    pub async fn drop_if_exists(&self, table: &str) -> QueryResult<()> {
        let sql = DropStatement::table(table).if_exists().compile(self.grammar());
        self.run(sql.into_parts().0).await
    }

    /// Whether the (prefixed) table exists in the current database.
    pub async fn has_table(&self, table: &str) -> QueryResult<bool> {
        let g = self.grammar();
        let lookup = information_schema(g, "tables", vec![("table_name", g.prefixed(table))]);
        Ok(!self.conn.query(&lookup).await?.is_empty())
    }

    /// Whether the (prefixed) table has the column.
    pub async fn has_column(&self, table: &str, column: &str) -> QueryResult<bool> {
        let g = self.grammar();
        let lookup = information_schema(
            g,
            "columns",
            vec![
                ("table_name", g.prefixed(table)),
                ("column_name", column.to_string()),
            ],
        );
        Ok(!self.conn.query(&lookup).await?.is_empty())
    }

    /// Execute literal SQL through the same path as every other statement.
    pub async fn raw(&self, sql: impl Into<String>) -> QueryResult<()> {
        self.run(sql.into()).await
    }
}

/// `SELECT 1` from an `information_schema` view of the current database,
/// matching each filter column exactly against a bound value.
fn information_schema(
    grammar: &Grammar,
    view: &str,
    filters: Vec<(&str, String)>,
) -> CompiledStatement {
    let mut sql = format!(
        "SELECT 1 FROM {}.{} WHERE {} = DATABASE()",
        grammar.quote_name("information_schema"),
        grammar.quote_name(view),
        grammar.quote_name("table_schema")
    );
    let mut params = Vec::with_capacity(filters.len());
    for (column, value) in filters {
        params.push(Value::from(value));
        sql.push_str(&format!(
            " AND {} = {}",
            grammar.quote_name(column),
            grammar.dialect().placeholder(params.len())
        ));
    }
    sql.push_str(" LIMIT 1;");
    CompiledStatement::with_params(sql, params)
}
