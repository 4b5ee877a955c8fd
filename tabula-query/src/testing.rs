//! In-memory [`Connection`] for tests.
//!
//! `MockConnection` records every statement it receives, keeps a set of
//! table names up to date from `CREATE`/`DROP`/`RENAME TABLE` statements so
//! `information_schema` existence lookups answer correctly, and can be told
//! to fail or to return canned rows for statements containing a given
//! substring.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::connection::{Connection, Row};
use crate::error::{ErrorCode, QueryError, QueryResult};
use crate::grammar::Grammar;
use crate::statement::CompiledStatement;
use crate::value::Value;

#[derive(Debug, Default)]
struct State {
    executed: Vec<CompiledStatement>,
    validated: Vec<CompiledStatement>,
    queried: Vec<CompiledStatement>,
    tables: BTreeSet<String>,
    columns: BTreeMap<String, BTreeSet<String>>,
    failures: Vec<(String, ErrorCode, String)>,
    responses: Vec<(String, Vec<Row>)>,
}

/// A connection that never leaves the process.
#[derive(Debug)]
pub struct MockConnection {
    name: String,
    grammar: Grammar,
    state: Mutex<State>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnection {
    /// A MySQL-grammar connection named `mock`.
    pub fn new() -> Self {
        Self::with_grammar(Grammar::mysql())
    }

    /// A connection with the given grammar.
    pub fn with_grammar(grammar: Grammar) -> Self {
        Self {
            name: "mock".to_string(),
            grammar,
            state: Mutex::new(State::default()),
        }
    }

    /// Rename the connection.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pretend the given (already prefixed) tables exist.
    pub fn with_tables<I, S>(self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .tables
            .extend(tables.into_iter().map(Into::into));
        self
    }

    /// Pretend the given (already prefixed) table exists with `columns`.
    pub fn with_columns<I, S>(self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = table.into();
        {
            let mut state = self.state.lock();
            state.tables.insert(table.clone());
            state
                .columns
                .entry(table)
                .or_default()
                .extend(columns.into_iter().map(Into::into));
        }
        self
    }

    /// Fail any executed or validated statement whose SQL contains `needle`.
    pub fn fail_on(&self, needle: impl Into<String>, code: ErrorCode, message: impl Into<String>) {
        self.state
            .lock()
            .failures
            .push((needle.into(), code, message.into()));
    }

    /// Answer queries whose SQL contains `needle` with `rows`.
    pub fn respond(&self, needle: impl Into<String>, rows: Vec<Row>) {
        self.state.lock().responses.push((needle.into(), rows));
    }

    /// Statements passed to [`Connection::execute`].
    pub fn executed(&self) -> Vec<CompiledStatement> {
        self.state.lock().executed.clone()
    }

    /// SQL text of the executed statements.
    pub fn executed_sql(&self) -> Vec<String> {
        self.state
            .lock()
            .executed
            .iter()
            .map(|s| s.sql().to_string())
            .collect()
    }

    /// Statements passed to [`Connection::validate`].
    pub fn validated(&self) -> Vec<CompiledStatement> {
        self.state.lock().validated.clone()
    }

    /// Statements passed to [`Connection::query`].
    pub fn queried(&self) -> Vec<CompiledStatement> {
        self.state.lock().queried.clone()
    }

    /// Tables currently known to exist.
    pub fn tables(&self) -> Vec<String> {
        self.state.lock().tables.iter().cloned().collect()
    }

    fn check_failure(state: &State, statement: &CompiledStatement) -> QueryResult<()> {
        match state
            .failures
            .iter()
            .find(|(needle, _, _)| statement.sql().contains(needle.as_str()))
        {
            Some((_, code, message)) => {
                Err(QueryError::new(*code, message.clone()).with_sql(statement.sql()))
            }
            None => Ok(()),
        }
    }
}

fn quoted_identifiers(sql: &str) -> Vec<String> {
    sql.split('`')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect()
}

fn apply_ddl(state: &mut State, sql: &str) {
    let names = quoted_identifiers(sql);
    if sql.starts_with("CREATE TABLE") {
        if let Some(name) = names.first() {
            state.tables.insert(name.clone());
        }
    } else if sql.starts_with("DROP TABLE") {
        if let Some(name) = names.first() {
            state.tables.remove(name);
            state.columns.remove(name);
        }
    } else if sql.starts_with("RENAME TABLE") {
        if let [from, to, ..] = names.as_slice() {
            if state.tables.remove(from) {
                state.tables.insert(to.clone());
            }
            if let Some(columns) = state.columns.remove(from) {
                state.columns.insert(to.clone(), columns);
            }
        }
    }
}

/// Answer `information_schema` existence lookups from the tracked tables
/// and columns. Names match exactly.
fn lookup(state: &State, statement: &CompiledStatement) -> Option<Vec<Row>> {
    let sql = statement.sql();
    if !sql.contains("information_schema") {
        return None;
    }

    let names: Vec<&str> = statement.params().iter().filter_map(Value::as_str).collect();
    let found = match names.as_slice() {
        [table] => state.tables.contains(*table),
        [table, column] => state
            .columns
            .get(*table)
            .is_some_and(|columns| columns.contains(*column)),
        _ => false,
    };

    let mut row = Row::new();
    row.insert("1".to_string(), Value::Int(1));
    Some(if found { vec![row] } else { Vec::new() })
}

#[async_trait]
impl Connection for MockConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    async fn execute(&self, statement: &CompiledStatement) -> QueryResult<u64> {
        let mut state = self.state.lock();
        state.executed.push(statement.clone());
        Self::check_failure(&state, statement)?;
        apply_ddl(&mut state, statement.sql());
        Ok(1)
    }

    async fn query(&self, statement: &CompiledStatement) -> QueryResult<Vec<Row>> {
        let mut state = self.state.lock();
        state.queried.push(statement.clone());

        if let Some(rows) = lookup(&state, statement) {
            return Ok(rows);
        }

        Ok(state
            .responses
            .iter()
            .find(|(needle, _)| statement.sql().contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn validate(&self, statement: &CompiledStatement) -> QueryResult<()> {
        let mut state = self.state.lock();
        state.validated.push(statement.clone());
        Self::check_failure(&state, statement)
    }
}
