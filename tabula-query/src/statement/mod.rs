//! Executable statement builders.
//!
//! Each builder accumulates its clauses mutably and compiles against a
//! [`Grammar`] into a [`CompiledStatement`]: the SQL text plus the parameters
//! in the exact left-to-right order their placeholders appear.
//!
//! ```rust
//! use tabula_query::{Grammar, Value};
//! use tabula_query::statement::Insert;
//!
//! let stmt = Insert::into("table")
//!     .row([("id", Value::from(1)), ("username", Value::from("john.doe"))])
//!     .row([("id", Value::from(2)), ("username", Value::from("jane.doe"))])
//!     .compile(&Grammar::mysql())
//!     .unwrap();
//!
//! assert_eq!(stmt.sql(), "INSERT INTO `table` (`id`, `username`) VALUES (?, ?), (?, ?);");
//! assert_eq!(stmt.params().len(), 4);
//! ```

mod create;
mod delete;
mod drop;
mod insert;
mod predicate;
mod select;
mod show;
mod update;

use std::fmt;

use crate::grammar::Grammar;
use crate::value::Value;

pub use create::Create;
pub use delete::Delete;
pub use drop::DropStatement;
pub use insert::Insert;
pub use predicate::{Connector, Order, Predicate, WhereClause};
pub use select::Select;
pub use show::Show;
pub use update::Update;

/// SQL text plus its ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    sql: String,
    params: Vec<Value>,
}

impl CompiledStatement {
    /// A statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Split into text and parameters.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for CompiledStatement {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for CompiledStatement {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

/// Collects parameters while rendering placeholders in textual order.
pub(crate) struct Bindings<'g> {
    grammar: &'g Grammar,
    params: Vec<Value>,
}

impl<'g> Bindings<'g> {
    pub(crate) fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            params: Vec::new(),
        }
    }

    /// Render the placeholder text for `value`, recording its parameters.
    ///
    /// Function values expand in place to `NAME(?, ...)` with their
    /// arguments bound at this position.
    pub(crate) fn bind(&mut self, value: &Value) -> String {
        match value {
            Value::Function(func) => {
                let args: Vec<String> = func.args.iter().map(|a| self.bind(a)).collect();
                format!("{}({})", func.name, args.join(", "))
            }
            other => {
                self.params.push(other.clone());
                self.grammar.dialect().placeholder(self.params.len())
            }
        }
    }

    pub(crate) fn finish(self, sql: String) -> CompiledStatement {
        CompiledStatement::with_params(sql, self.params)
    }
}
