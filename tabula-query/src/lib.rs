//! # tabula-query
//!
//! SQL grammar, schema blueprints and statement builders for Tabula.
//!
//! This crate turns declarative table and statement definitions into literal
//! SQL text plus an ordered parameter list:
//! - [`Grammar`] quoting, prefixing and literal rules
//! - [`ColumnDefinition`] column fragments with canonical modifier order
//! - [`Command`] / [`ForeignCommand`] index, key and drop fragments
//! - [`Blueprint`] full `CREATE TABLE` / `ALTER TABLE` statements
//! - [`statement`] executable create/insert/update/select/delete/show/drop builders
//! - [`Schema`] a handle that runs all of the above against a [`Connection`]
//!
//! ## Columns
//!
//! Modifiers render in a fixed order no matter how they were called:
//!
//! ```rust
//! use tabula_query::{ColumnDefinition, Grammar};
//!
//! let g = Grammar::mysql();
//! let mut col = ColumnDefinition::var_char("test", 8);
//! col.default("hi").auto_increments();
//! assert_eq!(col.compile(&g), "`test` VARCHAR(8) NOT NULL DEFAULT 'hi' AUTO_INCREMENT");
//! ```
//!
//! ## Statements
//!
//! ```rust
//! use tabula_query::{Grammar, Value};
//! use tabula_query::statement::Insert;
//!
//! let stmt = Insert::into("users")
//!     .row([("name", Value::from("ann")), ("created_at", Value::function("NOW()", [5, 10]))])
//!     .compile(&Grammar::mysql())
//!     .unwrap();
//!
//! assert_eq!(stmt.sql(), "INSERT INTO `users` (`name`, `created_at`) VALUES (?, NOW(?, ?));");
//! assert_eq!(stmt.params(), &[Value::from("ann"), Value::Int(5), Value::Int(10)]);
//! ```

pub mod connection;
pub mod error;
pub mod grammar;
pub mod logging;
pub mod schema;
pub mod statement;
pub mod testing;
pub mod value;

pub use connection::{Connection, Row};
pub use error::{ErrorCode, ErrorKind, QueryError, QueryResult};
pub use grammar::{Dialect, Grammar};
pub use schema::{
    Blueprint, ColumnDefault, ColumnDefinition, Command, CommandContext, CommandKind,
    ForeignCommand, Schema,
};
pub use statement::{
    CompiledStatement, Connector, Create, Delete, DropStatement, Insert, Order, Predicate, Select,
    Show, Update, WhereClause,
};
pub use value::{SqlFunction, Value};
