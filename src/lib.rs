//! # Tabula
//!
//! Schema compiler and batched migration runner for MySQL-flavoured databases.
//!
//! Tabula provides:
//! - Table blueprints that compile to byte-exact `CREATE TABLE` / `ALTER TABLE` statements
//! - Statement builders producing SQL text plus an ordered parameter list
//! - Migrations tracked in batches, with rollback and dry runs
//! - A MySQL connection over `mysql_async` (feature `mysql`)
//!
//! ## Quick Start
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let grammar = Grammar::mysql();
//! let mut users = Blueprint::create("users");
//! users.increments("id");
//! users.var_char("username", 64);
//! users.primary(["id"]);
//!
//! assert_eq!(
//!     users.compile(&grammar),
//!     "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, \
//!      `username` VARCHAR(64) NOT NULL, PRIMARY KEY (`id`));"
//! );
//! ```
//!
//! Running migrations:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabula::prelude::*;
//! use tabula::mysql::MysqlConnection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TabulaConfig::from_file("tabula.toml")?.with_environment("production");
//!     let conn = Arc::new(MysqlConnection::connect(&tabula::mysql::config_from(&config)?).await?);
//!
//!     let set = MigrationSet::from_dir(&config.migrations.directory).await?;
//!     let migrator = Migrator::from_config(conn, &config.migrations, set);
//!
//!     if let Some(batch) = migrator.run(None).await? {
//!         println!("batch {} applied {} migrations", batch.id(), batch.len());
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Grammar, blueprints, statement builders and the connection seam.
pub mod query {
    pub use tabula_query::*;
}

/// Migrations, batches and the migrator.
pub mod migrate {
    pub use tabula_migrate::*;
}

/// MySQL connection over `mysql_async`.
#[cfg(feature = "mysql")]
#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
pub mod mysql {
    pub use tabula_mysql::*;

    /// MySQL settings for a loaded `tabula.toml`.
    ///
    /// `[database] url` supplies the server and credentials. The file's
    /// `prefix` and `connection_name` replace any `prefix`/`name` URL options.
    pub fn config_from(config: &tabula_migrate::TabulaConfig) -> MysqlResult<MysqlConfig> {
        let url = config
            .database_url()
            .ok_or_else(|| MysqlError::config("[database] url is not set"))?;
        Ok(MysqlConfig::from_url(url)?
            .prefix(config.database.prefix.clone())
            .name(config.database.connection_name.clone()))
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tabula_migrate::{
        Direction, EventKind, MemoryRepository, Migration, MigrationBatch, MigrationDefinition,
        MigrationError, MigrationEvent, MigrationRepository, MigrationSet, MigrateResult,
        Migrator, SqlMigration, TableRepository, TabulaConfig,
    };
    pub use tabula_query::{
        Blueprint, CompiledStatement, Connection, Create, Delete, DropStatement, Grammar, Insert,
        Order, QueryError, QueryResult, Schema, Select, Show, Update, Value,
    };
}

// Re-export key types at the crate root
pub use tabula_migrate::{MigrationError, Migrator};
pub use tabula_query::{Grammar, QueryError, Schema};
