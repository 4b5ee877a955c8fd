//! A [`Connection`] over one `mysql_async` session.

use std::fmt;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Params};
use tabula_query::{CompiledStatement, Connection, Grammar, QueryError, QueryResult, Row, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::MysqlConfig;
use crate::error::{MysqlError, MysqlResult};
use crate::types::{from_mysql, to_mysql_params};

/// One MySQL session.
///
/// Statements are serialized through a mutex, matching the one-at-a-time
/// way schema changes and migrations are issued.
pub struct MysqlConnection {
    name: String,
    grammar: Grammar,
    conn: Mutex<Conn>,
}

impl fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("name", &self.name)
            .field("prefix", &self.grammar.prefix())
            .finish()
    }
}

impl MysqlConnection {
    /// Wrap an already open session.
    pub fn new(conn: Conn, name: impl Into<String>, grammar: Grammar) -> Self {
        Self {
            name: name.into(),
            grammar,
            conn: Mutex::new(conn),
        }
    }

    /// Open a session, honouring the configured connect timeout.
    pub async fn connect(config: &MysqlConfig) -> MysqlResult<Self> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connecting to MySQL"
        );

        let opening = Conn::new(config.to_opts_builder());
        let conn = match config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, opening)
                .await
                .map_err(|_| MysqlError::Timeout(limit.as_millis() as u64))??,
            None => opening.await?,
        };

        Ok(Self::new(conn, config.name.clone(), config.grammar()))
    }

    /// Parse `url` and open a session.
    pub async fn connect_url(url: &str) -> MysqlResult<Self> {
        Self::connect(&MysqlConfig::from_url(url)?).await
    }

    /// Close the session gracefully.
    pub async fn disconnect(self) -> MysqlResult<()> {
        self.conn.into_inner().disconnect().await?;
        Ok(())
    }
}

fn params(statement: &CompiledStatement) -> QueryResult<Params> {
    let values = to_mysql_params(statement.params())
        .map_err(|e| QueryError::from(e).with_sql(statement.sql()))?;
    Ok(Params::from(values))
}

fn failed(statement: &CompiledStatement) -> impl FnOnce(mysql_async::Error) -> QueryError + '_ {
    move |e| QueryError::from(MysqlError::from(e)).with_sql(statement.sql())
}

#[async_trait]
impl Connection for MysqlConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    async fn execute(&self, statement: &CompiledStatement) -> QueryResult<u64> {
        debug!(sql = statement.sql(), params = statement.params().len(), "Executing statement");
        let params = params(statement)?;
        let mut conn = self.conn.lock().await;
        conn.exec_drop(statement.sql(), params)
            .await
            .map_err(failed(statement))?;
        Ok(conn.affected_rows())
    }

    async fn query(&self, statement: &CompiledStatement) -> QueryResult<Vec<Row>> {
        debug!(sql = statement.sql(), params = statement.params().len(), "Executing query");
        let params = params(statement)?;
        let mut conn = self.conn.lock().await;
        let rows: Vec<mysql_async::Row> = conn
            .exec(statement.sql(), params)
            .await
            .map_err(failed(statement))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                row.columns_ref()
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let value = row.as_ref(i).cloned().map_or(Value::Null, from_mysql);
                        (column.name_str().into_owned(), value)
                    })
                    .collect()
            })
            .collect())
    }

    /// Prepare the statement on the server and release it again, which
    /// checks syntax and referenced objects without running it.
    async fn validate(&self, statement: &CompiledStatement) -> QueryResult<()> {
        debug!(sql = statement.sql(), "Validating statement");
        let mut conn = self.conn.lock().await;
        let prepared = conn.prep(statement.sql()).await.map_err(failed(statement))?;
        conn.close(prepared).await.map_err(failed(statement))?;
        Ok(())
    }
}
