//! `UPDATE` builder.

use indexmap::IndexMap;
use tracing::debug;

use super::{Bindings, CompiledStatement, Predicate, WhereClause};
use crate::connection::Connection;
use crate::error::{QueryError, QueryResult};
use crate::grammar::Grammar;
use crate::value::Value;

/// Builds `UPDATE t SET a = ?, ... WHERE ...;`.
#[derive(Debug, Clone, Default)]
pub struct Update {
    table: String,
    assignments: IndexMap<String, Value>,
    conditions: WhereClause,
}

impl Update {
    /// Start an update of the (unprefixed) table.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Assign a column. Setting the same column twice keeps the last value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.insert(column.into(), value.into());
        self
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

    /// Compile. Assignment parameters come before predicate parameters.
    pub fn compile(&self, grammar: &Grammar) -> QueryResult<CompiledStatement> {
        if self.assignments.is_empty() {
            return Err(QueryError::invalid_input(
                "assignments",
                "update requires at least one column",
            ));
        }

        let mut b = Bindings::new(grammar);
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", grammar.quote_name(column), b.bind(value)))
            .collect();
        let conditions = self.conditions.compile(&mut b);

        let sql = format!(
            "UPDATE {} SET {}{};",
            grammar.wrap_table(&self.table),
            sets.join(", "),
            conditions
        );
        Ok(b.finish(sql))
    }

    /// Compile against the connection's grammar and execute.
    pub async fn exec(&self, conn: &dyn Connection) -> QueryResult<u64> {
        let statement = self.compile(conn.grammar())?;
        debug!(table = %self.table, "Executing update");
        conn.execute(&statement).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_with_where() {
        let stmt = Update::table("users")
            .set("username", "jane")
            .set("active", true)
            .where_eq("id", 7)
            .compile(&Grammar::mysql().with_prefix("p_"))
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE `p_users` SET `username` = ?, `active` = ? WHERE `id` = ?;"
        );
        assert_eq!(
            stmt.params(),
            &[Value::from("jane"), Value::Bool(true), Value::Int(7)]
        );
    }

    #[test]
    fn test_update_function_value() {
        let stmt = Update::table("users")
            .set("seen_at", Value::function("NOW()", Vec::<Value>::new()))
            .set("visits", 3)
            .compile(&Grammar::mysql())
            .unwrap();
        assert_eq!(stmt.sql(), "UPDATE `users` SET `seen_at` = NOW(), `visits` = ?;");
        assert_eq!(stmt.params(), &[Value::Int(3)]);
    }

    #[test]
    fn test_update_without_assignments_fails() {
        assert!(Update::table("t").compile(&Grammar::mysql()).is_err());
    }
}
