//! `INSERT INTO` builder.

use indexmap::IndexMap;
use tracing::debug;

use super::{Bindings, CompiledStatement};
use crate::connection::Connection;
use crate::error::{QueryError, QueryResult};
use crate::grammar::Grammar;
use crate::value::Value;

/// Builds a single- or multi-row insert.
///
/// The column list comes from the first row. Every later row must carry
/// exactly the same columns; they are reordered to match the first row. A
/// column named twice in one row is an error.
#[derive(Debug, Clone, Default)]
pub struct Insert {
    table: String,
    rows: Vec<Vec<(String, Value)>>,
}

impl Insert {
    /// Start an insert into the (unprefixed) table.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rows: Vec::new(),
        }
    }

    /// Append one row of `(column, value)` pairs.
    pub fn row<I, K, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.rows.push(
            row.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Append several rows.
    pub fn rows<R, I, K, V>(self, rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        rows.into_iter().fold(self, |insert, row| insert.row(row))
    }

    /// Number of rows collected so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compile to `INSERT INTO t (cols) VALUES (...), (...);`.
    pub fn compile(&self, grammar: &Grammar) -> QueryResult<CompiledStatement> {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| keyed(index, row))
            .collect::<QueryResult<Vec<_>>>()?;
        let first = rows
            .first()
            .ok_or_else(|| QueryError::invalid_input("rows", "insert requires at least one row"))?;
        let columns: Vec<&str> = first.keys().copied().collect();

        let mut b = Bindings::new(grammar);
        let mut tuples = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(QueryError::invalid_input(
                    "rows",
                    format!(
                        "row {} has {} columns, expected {}",
                        index,
                        row.len(),
                        columns.len()
                    ),
                ));
            }

            let mut placeholders = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = row.get(column).ok_or_else(|| {
                    QueryError::invalid_input(
                        "rows",
                        format!("row {} is missing column '{}'", index, column),
                    )
                })?;
                placeholders.push(b.bind(value));
            }
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {};",
            grammar.wrap_table(&self.table),
            grammar.compile_column_list(&columns),
            tuples.join(", ")
        );
        Ok(b.finish(sql))
    }

    /// Compile against the connection's grammar and execute.
    pub async fn exec(&self, conn: &dyn Connection) -> QueryResult<u64> {
        let statement = self.compile(conn.grammar())?;
        debug!(table = %self.table, rows = self.rows.len(), "Executing insert");
        conn.execute(&statement).await
    }
}

/// Index one row by column name, rejecting repeated columns.
fn keyed(index: usize, row: &[(String, Value)]) -> QueryResult<IndexMap<&str, &Value>> {
    let mut keyed = IndexMap::with_capacity(row.len());
    for (column, value) in row {
        if keyed.insert(column.as_str(), value).is_some() {
            return Err(QueryError::invalid_input(
                "rows",
                format!("row {} names column '{}' more than once", index, column),
            ));
        }
    }
    Ok(keyed)
}
