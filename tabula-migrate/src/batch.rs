//! Migrations grouped by the `run` call that applied them.

use chrono::{DateTime, Utc};

use crate::error::MigrateResult;
use crate::migration::{Direction, Migration};
use crate::migrator::Migrator;

/// An ordered group of migrations sharing one batch id.
#[derive(Debug, Clone)]
pub struct MigrationBatch {
    id: i64,
    migrations: Vec<Migration>,
}

impl MigrationBatch {
    /// Group migrations, in execution order, under `id`.
    pub fn new(id: i64, migrations: Vec<Migration>) -> Self {
        Self { id, migrations }
    }

    /// The batch id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Migrations in execution order.
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Number of migrations.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Whether the batch holds no migrations.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Time of the first migration, or now for an empty or unrecorded batch.
    pub fn time(&self) -> DateTime<Utc> {
        self.migrations
            .first()
            .and_then(Migration::time)
            .unwrap_or_else(Utc::now)
    }

    /// Reverse this batch: run its migrations newest-first with direction
    /// `Down`, removing their tracking records.
    ///
    /// The migrator's direction is restored afterwards, also on failure.
    pub async fn rollback(&self, migrator: &mut Migrator) -> MigrateResult<Option<MigrationBatch>> {
        let reversed: Vec<Migration> = self.migrations.iter().rev().cloned().collect();

        let previous = migrator.direction();
        migrator.set_direction(Direction::Down);
        let result = migrator.run(Some(reversed)).await;
        migrator.set_direction(previous);

        result
    }
}
