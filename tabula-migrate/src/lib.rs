//! # tabula-migrate
//!
//! Batched migration runner for Tabula.
//!
//! This crate provides:
//! - [`MigrationDefinition`], the `up`/`down` pair a migration implements
//! - SQL-file migrations discovered from a directory ([`SqlMigration`])
//! - Tracking records in a database table ([`TableRepository`]) or in memory
//! - Batches: every [`Migrator::run`] records its migrations under one id,
//!   and [`MigrationBatch::rollback`] reverses them newest-first
//! - Dry runs that validate and capture statements instead of executing them
//! - `migration:start` / `migration:finish` progress events
//!
//! ## Lifecycle
//!
//! ```text
//!            run (up)                    rollback (down)
//! ┌─────────┐ ───────▶ ┌──────────────┐ ───────▶ ┌─────────┐
//! │ pending │          │ finished (N) │          │ pending │
//! └─────────┘          └──────────────┘          └─────────┘
//!                       record: batch N
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tabula_migrate::{MemoryRepository, MigrationDefinition, MigrationSet, Migrator};
//! use tabula_query::testing::MockConnection;
//! use tabula_query::{QueryResult, Schema};
//!
//! struct CreateUsers;
//!
//! #[async_trait]
//! impl MigrationDefinition for CreateUsers {
//!     fn name(&self) -> &str {
//!         "001_create_users"
//!     }
//!
//!     async fn up(&self, schema: &Schema<'_>) -> QueryResult<()> {
//!         schema.create("users", |t| {
//!             t.increments("id");
//!             t.var_char("email", 255);
//!             t.unique(["email"]);
//!         }).await
//!     }
//!
//!     async fn down(&self, schema: &Schema<'_>) -> QueryResult<()> {
//!         schema.drop("users").await
//!     }
//! }
//!
//! # tokio_test(async {
//! let set = MigrationSet::new().with(CreateUsers)?;
//! let migrator = Migrator::new(
//!     Arc::new(MockConnection::new()),
//!     Arc::new(MemoryRepository::new()),
//!     set,
//! );
//!
//! let batch = migrator.run(None).await?.expect("one pending migration");
//! assert_eq!(batch.id(), 1);
//! # Ok::<_, tabula_migrate::MigrationError>(())
//! # });
//! # fn tokio_test<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Migration Files
//!
//! SQL migrations live in one directory each, loaded by
//! [`MigrationSet::from_dir`]:
//!
//! ```text
//! migrations/
//! ├── 001_create_users/
//! │   ├── up.sql
//! │   └── down.sql
//! └── 002_add_posts/
//!     ├── up.sql
//!     └── down.sql
//! ```

pub mod batch;
pub mod config;
pub mod definition;
pub mod error;
pub mod file;
pub mod history;
pub mod migration;
pub mod migrator;
pub mod recorder;

// Re-exports
pub use batch::MigrationBatch;
pub use config::{DatabaseConfig, MigrationsConfig, TabulaConfig};
pub use definition::{MigrationDefinition, MigrationSet};
pub use error::{MigrateResult, MigrationError, MigrationErrorKind};
pub use file::SqlMigration;
pub use history::{MemoryRepository, MigrationRecord, MigrationRepository, TableRepository};
pub use migration::{Direction, Migration};
pub use migrator::{EventKind, MigrationEvent, MigrationStatus, Migrator};
pub use recorder::{RecordingConnection, SchemaRecorderBucket, SchemaStatement};
