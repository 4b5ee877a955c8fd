//! `SELECT` builder.

use tracing::debug;

use super::{Bindings, CompiledStatement, Order, Predicate, WhereClause};
use crate::connection::{Connection, Row};
use crate::error::QueryResult;
use crate::grammar::Grammar;
use crate::value::Value;

/// Builds `SELECT cols FROM t [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET m];`.
///
/// Limit and offset are rendered as literals.
#[derive(Debug, Clone, Default)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    conditions: WhereClause,
    order_by: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// Start a select from the (unprefixed) table.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Restrict the selected columns. No columns means `*`.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
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

    /// Append an ordering term.
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// `LIMIT n`
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `OFFSET n`
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Compile to SQL text and parameters.
    pub fn compile(&self, grammar: &Grammar) -> CompiledStatement {
        let mut b = Bindings::new(grammar);

        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            grammar.compile_column_list(&self.columns)
        };

        let mut sql = format!("SELECT {} FROM {}", columns, grammar.wrap_table(&self.table));
        sql.push_str(&self.conditions.compile(&mut b));

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{} {}", grammar.quote_name(column), order.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql.push(';');
        b.finish(sql)
    }

    /// Compile against the connection's grammar and fetch the rows.
    pub async fn fetch(&self, conn: &dyn Connection) -> QueryResult<Vec<Row>> {
        let statement = self.compile(conn.grammar());
        debug!(table = %self.table, "Executing select");
        conn.query(&statement).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_all() {
        let stmt = Select::from("users").compile(&Grammar::mysql());
        assert_eq!(stmt.sql(), "SELECT * FROM `users`;");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_select_full() {
        let stmt = Select::from("users")
            .columns(["id", "username"])
            .where_eq("active", true)
            .and_where(Predicate::is_in("role", ["admin", "owner"]))
            .order_by("id", Order::Asc)
            .order_by("username", Order::Desc)
            .limit(10)
            .offset(5)
            .compile(&Grammar::mysql().with_prefix("p_"));
        assert_eq!(
            stmt.sql(),
            "SELECT `id`, `username` FROM `p_users` WHERE `active` = ? AND `role` IN (?, ?) ORDER BY `id` ASC, `username` DESC LIMIT 10 OFFSET 5;"
        );
        assert_eq!(
            stmt.params(),
            &[Value::Bool(true), Value::from("admin"), Value::from("owner")]
        );
    }
}
