//! Tracking records for finished migrations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tabula_query::{Connection, Delete, Insert, Order, QueryError, Row, Schema, Select, Value};
use tracing::debug;

use crate::error::MigrateResult;

/// Format tracking timestamps are written in.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The persisted row marking a migration as finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Monotonic record id.
    pub id: i64,
    /// Migration name.
    pub name: String,
    /// Batch the migration ran in.
    pub batch: i64,
    /// When the migration ran.
    pub ran_at: DateTime<Utc>,
}

impl MigrationRecord {
    fn from_row(row: &Row) -> MigrateResult<Self> {
        let field = |name: &str| {
            row.get(name).ok_or_else(|| {
                QueryError::invalid_data(format!("tracking row is missing '{}'", name))
            })
        };
        let int = |name: &str| {
            field(name)?.as_i64().ok_or_else(|| {
                QueryError::invalid_data(format!("tracking column '{}' is not an integer", name))
            })
        };

        let name = field("name")?
            .as_str()
            .ok_or_else(|| QueryError::invalid_data("tracking column 'name' is not a string"))?
            .to_string();
        let ran_at = field("ran_at")?
            .as_str()
            .and_then(parse_timestamp)
            .ok_or_else(|| QueryError::invalid_data("tracking column 'ran_at' is not a timestamp"))?;

        Ok(Self {
            id: int("id")?,
            name,
            batch: int("batch")?,
            ran_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

/// Storage for tracking records.
#[async_trait]
pub trait MigrationRepository: Send + Sync {
    /// Make sure the store exists.
    async fn prepare(&self) -> MigrateResult<()>;

    /// Every record, ordered by id ascending.
    async fn records(&self) -> MigrateResult<Vec<MigrationRecord>>;

    /// Highest batch id, or 0 when nothing ran yet.
    async fn max_batch(&self) -> MigrateResult<i64> {
        Ok(self
            .records()
            .await?
            .iter()
            .map(|r| r.batch)
            .max()
            .unwrap_or(0))
    }

    /// Write a record for a migration that just finished.
    async fn log(&self, name: &str, batch: i64) -> MigrateResult<MigrationRecord>;

    /// Delete a record after its migration was reversed.
    async fn remove(&self, record: &MigrationRecord) -> MigrateResult<()>;
}

/// Tracking records kept in a database table `(id, name, batch, ran_at)`.
pub struct TableRepository {
    conn: Arc<dyn Connection>,
    table: String,
}

impl std::fmt::Debug for TableRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRepository")
            .field("connection", &self.conn.name())
            .field("table", &self.table)
            .finish()
    }
}

impl TableRepository {
    /// Track migrations in `table` (prefixed by the connection's grammar).
    pub fn new(conn: Arc<dyn Connection>, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
        }
    }

    /// The unprefixed table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl MigrationRepository for TableRepository {
    async fn prepare(&self) -> MigrateResult<()> {
        let schema = Schema::new(self.conn.as_ref());
        if schema.has_table(&self.table).await? {
            return Ok(());
        }

        debug!(table = %self.table, "Creating migration tracking table");
        schema
            .create(&self.table, |t| {
                t.increments("id");
                t.var_char("name", 255);
                t.integer("batch", 11);
                t.timestamp("ran_at").default_raw("CURRENT_TIMESTAMP");
                t.primary(["id"]);
                t.index(["batch"]);
            })
            .await?;
        Ok(())
    }

    async fn records(&self) -> MigrateResult<Vec<MigrationRecord>> {
        if !Schema::new(self.conn.as_ref()).has_table(&self.table).await? {
            return Ok(Vec::new());
        }

        let rows = Select::from(self.table.as_str())
            .columns(["id", "name", "batch", "ran_at"])
            .order_by("id", Order::Asc)
            .fetch(self.conn.as_ref())
            .await?;
        rows.iter().map(MigrationRecord::from_row).collect()
    }

    async fn log(&self, name: &str, batch: i64) -> MigrateResult<MigrationRecord> {
        let ran_at = Utc::now();
        Insert::into(self.table.as_str())
            .row([
                ("name", Value::from(name)),
                ("batch", Value::from(batch)),
                ("ran_at", Value::from(ran_at.format(TIMESTAMP_FORMAT).to_string())),
            ])
            .exec(self.conn.as_ref())
            .await?;

        let rows = Select::from(self.table.as_str())
            .columns(["id", "name", "batch", "ran_at"])
            .where_eq("name", name)
            .order_by("id", Order::Desc)
            .limit(1)
            .fetch(self.conn.as_ref())
            .await?;

        match rows.first() {
            Some(row) => MigrationRecord::from_row(row),
            None => Err(QueryError::database(format!(
                "tracking record for '{}' was not written",
                name
            ))
            .into()),
        }
    }

    async fn remove(&self, record: &MigrationRecord) -> MigrateResult<()> {
        Delete::from(self.table.as_str())
            .where_eq("id", record.id)
            .exec(self.conn.as_ref())
            .await?;
        Ok(())
    }
}

/// Tracking records held in memory. Useful for tests and dry tooling.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    records: Vec<MigrationRecord>,
}

impl MemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing record, e.g. one written by an earlier invocation.
    pub fn insert(
        &self,
        name: impl Into<String>,
        batch: i64,
        ran_at: DateTime<Utc>,
    ) -> MigrationRecord {
        let mut state = self.state.lock();
        state.last_id += 1;
        let record = MigrationRecord {
            id: state.last_id,
            name: name.into(),
            batch,
            ran_at,
        };
        state.records.push(record.clone());
        record
    }

    /// Snapshot of the stored records.
    pub fn snapshot(&self) -> Vec<MigrationRecord> {
        self.state.lock().records.clone()
    }
}

#[async_trait]
impl MigrationRepository for MemoryRepository {
    async fn prepare(&self) -> MigrateResult<()> {
        Ok(())
    }

    async fn records(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let mut records = self.snapshot();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn log(&self, name: &str, batch: i64) -> MigrateResult<MigrationRecord> {
        Ok(self.insert(name, batch, Utc::now()))
    }

    async fn remove(&self, record: &MigrationRecord) -> MigrateResult<()> {
        self.state.lock().records.retain(|r| r.id != record.id);
        Ok(())
    }
}
