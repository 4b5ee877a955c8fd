//! One migration and its tracking state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tabula_query::{Connection, Schema};
use tracing::warn;

use crate::definition::MigrationDefinition;
use crate::error::MigrateResult;
use crate::history::MigrationRecord;
use crate::recorder::{RecordingConnection, SchemaRecorderBucket};

/// Which half of a definition runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Apply with [`MigrationDefinition::up`].
    #[default]
    Up,
    /// Reverse with [`MigrationDefinition::down`].
    Down,
}

impl Direction {
    /// `"up"` or `"down"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A definition paired with its tracking record, if it has one.
///
/// Pending until a record exists, finished afterwards. After a dry run the
/// statements it would have issued are available from [`bucket`](Self::bucket).
#[derive(Clone)]
pub struct Migration {
    definition: Arc<dyn MigrationDefinition>,
    record: Option<MigrationRecord>,
    bucket: Option<Arc<SchemaRecorderBucket>>,
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.definition.name())
            .field("record", &self.record)
            .field("captured", &self.bucket.as_ref().map(|b| b.len()))
            .finish()
    }
}

impl Migration {
    /// A migration that has not run yet.
    pub fn pending(definition: Arc<dyn MigrationDefinition>) -> Self {
        Self {
            definition,
            record: None,
            bucket: None,
        }
    }

    /// A migration with an existing tracking record.
    pub fn finished(definition: Arc<dyn MigrationDefinition>, record: MigrationRecord) -> Self {
        Self {
            definition,
            record: Some(record),
            bucket: None,
        }
    }

    /// The definition's name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The definition.
    pub fn definition(&self) -> &Arc<dyn MigrationDefinition> {
        &self.definition
    }

    /// The tracking record.
    pub fn record(&self) -> Option<&MigrationRecord> {
        self.record.as_ref()
    }

    /// Tracking record id.
    pub fn record_id(&self) -> Option<i64> {
        self.record.as_ref().map(|r| r.id)
    }

    /// Name stored in the tracking record, falling back to the definition's.
    pub fn record_name(&self) -> &str {
        self.record
            .as_ref()
            .map(|r| r.name.as_str())
            .unwrap_or_else(|| self.definition.name())
    }

    /// Batch the migration ran in.
    pub fn batch_id(&self) -> Option<i64> {
        self.record.as_ref().map(|r| r.batch)
    }

    /// When the migration ran.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.record.as_ref().map(|r| r.ran_at)
    }

    /// No tracking record exists.
    pub fn is_pending(&self) -> bool {
        self.record.is_none()
    }

    /// A tracking record exists.
    pub fn is_finished(&self) -> bool {
        self.record.is_some()
    }

    /// Statements captured by the last dry run.
    pub fn bucket(&self) -> Option<&SchemaRecorderBucket> {
        self.bucket.as_deref()
    }

    pub(crate) fn set_record(&mut self, record: Option<MigrationRecord>) {
        self.record = record;
    }

    /// Run one direction of the definition against `conn`.
    ///
    /// In dry-run mode mutating statements are validated and captured in a
    /// fresh bucket instead of executed. Errors from the definition
    /// propagate unchanged.
    pub async fn run(
        &mut self,
        conn: &dyn Connection,
        direction: Direction,
        dry_run: bool,
    ) -> MigrateResult<bool> {
        if !dry_run {
            self.apply(&Schema::new(conn), direction).await?;
            return Ok(true);
        }

        let recorder = RecordingConnection::new(conn);
        let result = self.apply(&Schema::new(&recorder), direction).await;
        let bucket = recorder.into_bucket();
        if bucket.is_empty() {
            warn!(
                migration = self.name(),
                direction = %direction,
                "No intercepts captured during dry run"
            );
        }
        self.bucket = Some(Arc::new(bucket));
        result?;
        Ok(true)
    }

    async fn apply(&self, schema: &Schema<'_>, direction: Direction) -> MigrateResult<()> {
        match direction {
            Direction::Up => self.definition.up(schema).await?,
            Direction::Down => self.definition.down(schema).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tabula_query::testing::MockConnection;
    use tabula_query::{ErrorCode, QueryResult};

    struct Users;

    #[async_trait]
    impl MigrationDefinition for Users {
        fn name(&self) -> &str {
            "001_users"
        }

        async fn up(&self, schema: &Schema<'_>) -> QueryResult<()> {
            schema
                .create("users", |t| {
                    t.increments("id");
                })
                .await
        }

        async fn down(&self, schema: &Schema<'_>) -> QueryResult<()> {
            schema.drop("users").await
        }
    }

    struct Noop;

    #[async_trait]
    impl MigrationDefinition for Noop {
        fn name(&self) -> &str {
            "002_noop"
        }

        async fn up(&self, _schema: &Schema<'_>) -> QueryResult<()> {
            Ok(())
        }

        async fn down(&self, _schema: &Schema<'_>) -> QueryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_up_and_down() {
        let conn = MockConnection::new();
        let mut migration = Migration::pending(Arc::new(Users));
        assert!(migration.is_pending());
        assert_eq!(migration.record_name(), "001_users");

        assert!(migration.run(&conn, Direction::Up, false).await.unwrap());
        assert!(migration.run(&conn, Direction::Down, false).await.unwrap());
        assert_eq!(
            conn.executed_sql(),
            vec![
                "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT);",
                "DROP TABLE `users`;",
            ]
        );
        assert!(migration.bucket().is_none());
    }

    #[tokio::test]
    async fn test_dry_run_captures_statements() {
        let conn = MockConnection::new();
        let mut migration = Migration::pending(Arc::new(Users));
        migration.run(&conn, Direction::Up, true).await.unwrap();

        assert!(conn.executed().is_empty());
        let bucket = migration.bucket().unwrap();
        assert_eq!(bucket.len(), 1);
        assert!(bucket.all()[0].query().starts_with("CREATE TABLE `users`"));
    }

    #[tokio::test]
    async fn test_dry_run_with_no_statements_leaves_empty_bucket() {
        let conn = MockConnection::new();
        let mut migration = Migration::pending(Arc::new(Noop));
        migration.run(&conn, Direction::Up, true).await.unwrap();
        assert!(migration.bucket().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execution_error_propagates() {
        let conn = MockConnection::new();
        conn.fail_on("CREATE TABLE", ErrorCode::UniqueConstraint, "exists");
        let mut migration = Migration::pending(Arc::new(Users));
        let err = migration.run(&conn, Direction::Up, false).await.unwrap_err();
        assert!(err.query().unwrap().starts_with("CREATE TABLE"));
    }

    #[test]
    fn test_accessors_from_record() {
        let ran_at = Utc::now();
        let migration = Migration::finished(
            Arc::new(Users),
            MigrationRecord {
                id: 9,
                name: "001_users".into(),
                batch: 3,
                ran_at,
            },
        );
        assert!(migration.is_finished());
        assert_eq!(migration.record_id(), Some(9));
        assert_eq!(migration.batch_id(), Some(3));
        assert_eq!(migration.time(), Some(ran_at));
    }
}
