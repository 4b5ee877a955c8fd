//! The migration state machine.
//!
//! Migrations are **pending** until a tracking record exists and
//! **finished** afterwards. [`Migrator::run`] moves pending migrations to
//! finished under one new batch id; [`MigrationBatch::rollback`] moves a
//! batch back by running it in reverse with direction `Down`.
//!
//! Every round trip is awaited in turn. Nothing runs concurrently and a
//! failure stops the run at once: migrations already applied in the same
//! call stay applied.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tabula_query::Connection;
use tracing::{info, warn};

use crate::batch::MigrationBatch;
use crate::config::MigrationsConfig;
use crate::definition::MigrationSet;
use crate::error::{MigrateResult, MigrationError};
use crate::history::{MigrationRecord, MigrationRepository, TableRepository};
use crate::migration::{Direction, Migration};

/// Progress notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Emitted before a migration runs.
    Start,
    /// Emitted after a migration ran, with its elapsed time.
    Finish,
}

impl EventKind {
    /// `"migration:start"` or `"migration:finish"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "migration:start",
            Self::Finish => "migration:finish",
        }
    }
}

impl FromStr for EventKind {
    type Err = MigrationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "migration:start" => Ok(Self::Start),
            "migration:finish" => Ok(Self::Finish),
            other => Err(MigrationError::policy(format!("unknown event '{}'", other))),
        }
    }
}

/// A progress notification.
#[derive(Debug, Clone, Copy)]
pub struct MigrationEvent<'a> {
    /// Start or finish.
    pub kind: EventKind,
    /// The migration concerned.
    pub migration: &'a Migration,
    /// Direction of the run.
    pub direction: Direction,
    /// Whether statements are being intercepted.
    pub dry_run: bool,
    /// Wall time the migration took. Only set on finish.
    pub elapsed: Option<Duration>,
}

type Handler = Box<dyn Fn(&MigrationEvent<'_>) -> MigrateResult<()> + Send + Sync>;

/// Counts reported by [`Migrator::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Pending migration names in run order.
    pub pending: Vec<String>,
    /// Finished migration names in record order.
    pub finished: Vec<String>,
    /// Number of batches.
    pub batches: usize,
    /// Highest batch id, if any.
    pub last_batch: Option<i64>,
}

/// Runs migrations from a [`MigrationSet`] and tracks them in a repository.
pub struct Migrator {
    connection: Arc<dyn Connection>,
    repository: Arc<dyn MigrationRepository>,
    set: MigrationSet,
    direction: Direction,
    dry_run: bool,
    handlers: Vec<(EventKind, Handler)>,
}

impl fmt::Debug for Migrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("connection", &self.connection.name())
            .field("migrations", &self.set)
            .field("direction", &self.direction)
            .field("dry_run", &self.dry_run)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Migrator {
    /// A migrator in direction `Up`, executing for real.
    pub fn new(
        connection: Arc<dyn Connection>,
        repository: Arc<dyn MigrationRepository>,
        set: MigrationSet,
    ) -> Self {
        Self {
            connection,
            repository,
            set,
            direction: Direction::Up,
            dry_run: false,
            handlers: Vec::new(),
        }
    }

    /// A migrator tracking into the configured table, honouring `dry_run`.
    pub fn from_config(
        connection: Arc<dyn Connection>,
        config: &MigrationsConfig,
        set: MigrationSet,
    ) -> Self {
        let repository = Arc::new(TableRepository::new(connection.clone(), config.table.clone()));
        let mut migrator = Self::new(connection, repository, set);
        migrator.set_dry_run(config.dry_run);
        migrator
    }

    /// Current direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Change direction.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Whether statements are intercepted instead of executed.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Toggle dry-run mode.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// The known migrations.
    pub fn migrations(&self) -> &MigrationSet {
        &self.set
    }

    /// Register a handler called, in registration order, on every event of
    /// `kind`. A handler error aborts the run.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&MigrationEvent<'_>) -> MigrateResult<()> + Send + Sync + 'static,
    {
        self.handlers.push((kind, Box::new(handler)));
        self
    }

    fn emit(&self, event: &MigrationEvent<'_>) -> MigrateResult<()> {
        for (kind, handler) in &self.handlers {
            if *kind == event.kind {
                handler(event)?;
            }
        }
        Ok(())
    }

    /// Definitions without a tracking record, in run order.
    pub async fn pending_migrations(&self) -> MigrateResult<Vec<Migration>> {
        let records = self.repository.records().await?;
        let ran: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();

        Ok(self
            .set
            .iter()
            .filter(|d| !ran.contains(d.name()))
            .map(|d| Migration::pending(d.clone()))
            .collect())
    }

    /// Migrations with a tracking record, in record id order.
    ///
    /// Records whose definition is no longer known are skipped.
    pub async fn finished_migrations(&self) -> MigrateResult<Vec<Migration>> {
        let records = self.repository.records().await?;
        let mut finished = Vec::with_capacity(records.len());

        for record in records {
            match self.set.get(&record.name) {
                Some(definition) => finished.push(Migration::finished(definition.clone(), record)),
                None => warn!(
                    migration = %record.name,
                    batch = record.batch,
                    "Tracking record has no matching migration"
                ),
            }
        }
        Ok(finished)
    }

    /// Finished migrations grouped by batch, oldest batch first.
    pub async fn batches(&self) -> MigrateResult<Vec<MigrationBatch>> {
        let mut groups: BTreeMap<i64, Vec<Migration>> = BTreeMap::new();
        for migration in self.finished_migrations().await? {
            let batch = migration.batch_id().unwrap_or_default();
            groups.entry(batch).or_default().push(migration);
        }

        Ok(groups
            .into_iter()
            .map(|(id, migrations)| MigrationBatch::new(id, migrations))
            .collect())
    }

    /// Run `migrations`, or the default target when `None`.
    ///
    /// The default target is the pending set when the direction is `Up`, and
    /// the newest batch in reverse order when it is `Down`. Returns `None`
    /// when there is nothing to run. In dry-run mode no tracking record is
    /// written or removed and the returned batch is what would have been
    /// recorded.
    ///
    /// Explicit targets are checked against the tracking records before
    /// anything runs: going up they must be pending, going down they must be
    /// finished, and each must belong to this migrator's set.
    pub async fn run(&self, migrations: Option<Vec<Migration>>) -> MigrateResult<Option<MigrationBatch>> {
        let targets = match migrations {
            Some(migrations) => self.check_targets(migrations).await?,
            None => self.default_targets().await?,
        };
        if targets.is_empty() {
            info!(direction = %self.direction, "Nothing to migrate");
            return Ok(None);
        }

        if !self.dry_run {
            self.repository.prepare().await?;
        }

        let batch_id = match self.direction {
            Direction::Up => self.repository.max_batch().await? + 1,
            Direction::Down => targets[0].batch_id().unwrap_or_default(),
        };

        let mut completed = Vec::with_capacity(targets.len());
        for mut migration in targets {
            self.emit(&MigrationEvent {
                kind: EventKind::Start,
                migration: &migration,
                direction: self.direction,
                dry_run: self.dry_run,
                elapsed: None,
            })?;
            info!(
                migration = migration.name(),
                direction = %self.direction,
                dry_run = self.dry_run,
                "Running migration"
            );

            let started = Instant::now();
            migration
                .run(self.connection.as_ref(), self.direction, self.dry_run)
                .await?;
            let elapsed = started.elapsed();

            if !self.dry_run {
                self.track(&mut migration, batch_id).await?;
            }

            info!(
                migration = migration.name(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Finished migration"
            );
            self.emit(&MigrationEvent {
                kind: EventKind::Finish,
                migration: &migration,
                direction: self.direction,
                dry_run: self.dry_run,
                elapsed: Some(elapsed),
            })?;

            completed.push(migration);
        }

        Ok(Some(MigrationBatch::new(batch_id, completed)))
    }

    async fn check_targets(&self, targets: Vec<Migration>) -> MigrateResult<Vec<Migration>> {
        let records: HashMap<String, MigrationRecord> = self
            .repository
            .records()
            .await?
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        let mut seen = HashSet::with_capacity(targets.len());
        let mut checked = Vec::with_capacity(targets.len());
        for mut migration in targets {
            let name = migration.name().to_string();
            if self.set.get(&name).is_none() {
                return Err(MigrationError::NotFound(name));
            }
            if !seen.insert(name.clone()) {
                return Err(MigrationError::policy(format!(
                    "migration '{}' is listed more than once",
                    name
                )));
            }

            match (self.direction, records.get(&name)) {
                (Direction::Up, None) => migration.set_record(None),
                (Direction::Up, Some(record)) => {
                    return Err(MigrationError::policy(format!(
                        "migration '{}' already ran in batch {}",
                        name, record.batch
                    )));
                }
                // The caller's copy may be stale; the stored record decides.
                (Direction::Down, Some(record)) => migration.set_record(Some(record.clone())),
                (Direction::Down, None) => {
                    return Err(MigrationError::policy(format!(
                        "migration '{}' has not run",
                        name
                    )));
                }
            }
            checked.push(migration);
        }
        Ok(checked)
    }

    async fn default_targets(&self) -> MigrateResult<Vec<Migration>> {
        match self.direction {
            Direction::Up => self.pending_migrations().await,
            Direction::Down => Ok(self
                .batches()
                .await?
                .pop()
                .map(|batch| batch.migrations().iter().rev().cloned().collect())
                .unwrap_or_default()),
        }
    }

    async fn track(&self, migration: &mut Migration, batch_id: i64) -> MigrateResult<()> {
        match self.direction {
            Direction::Up => {
                let record = self.repository.log(migration.name(), batch_id).await?;
                migration.set_record(Some(record));
            }
            Direction::Down => {
                if let Some(record) = migration.record().cloned() {
                    self.repository.remove(&record).await?;
                }
                migration.set_record(None);
            }
        }
        Ok(())
    }

    /// Roll back the newest `steps` batches, newest first.
    ///
    /// `steps` must be between 1 and the number of existing batches.
    pub async fn rollback(&mut self, steps: usize) -> MigrateResult<Vec<MigrationBatch>> {
        let batches = self.batches().await?;
        if steps == 0 {
            return Err(MigrationError::policy("rollback steps must be at least 1"));
        }
        if steps > batches.len() {
            return Err(MigrationError::policy(format!(
                "cannot roll back {} batches, only {} exist",
                steps,
                batches.len()
            )));
        }

        self.rollback_batches(batches.into_iter().rev().take(steps)).await
    }

    /// Roll back every batch, newest first.
    pub async fn reset(&mut self) -> MigrateResult<Vec<MigrationBatch>> {
        let batches = self.batches().await?;
        self.rollback_batches(batches.into_iter().rev()).await
    }

    async fn rollback_batches(
        &mut self,
        batches: impl Iterator<Item = MigrationBatch>,
    ) -> MigrateResult<Vec<MigrationBatch>> {
        let mut reversed = Vec::new();
        for batch in batches {
            info!(batch = batch.id(), migrations = batch.len(), "Rolling back batch");
            if let Some(done) = batch.rollback(self).await? {
                reversed.push(done);
            }
        }
        Ok(reversed)
    }

    /// Pending and finished names plus batch counts.
    pub async fn status(&self) -> MigrateResult<MigrationStatus> {
        let pending = self.pending_migrations().await?;
        let batches = self.batches().await?;

        Ok(MigrationStatus {
            pending: pending.iter().map(|m| m.name().to_string()).collect(),
            finished: batches
                .iter()
                .flat_map(|b| b.migrations().iter().map(|m| m.name().to_string()))
                .collect(),
            last_batch: batches.last().map(MigrationBatch::id),
            batches: batches.len(),
        })
    }
}
