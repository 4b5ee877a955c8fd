//! Migration definitions and the set a migrator runs over.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tabula_query::{QueryResult, Schema};

use crate::error::{MigrateResult, MigrationError};
use crate::file::SqlMigration;

/// One versioned unit of schema change.
///
/// `up` applies the change, `down` reverses it. The migrator picks one based
/// on its direction. Names sort chronologically, so prefix them with a
/// timestamp or sequence number.
///
/// ```rust
/// use async_trait::async_trait;
/// use tabula_migrate::MigrationDefinition;
/// use tabula_query::{QueryResult, Schema};
///
/// struct CreateUsers;
///
/// #[async_trait]
/// impl MigrationDefinition for CreateUsers {
///     fn name(&self) -> &str {
///         "20240101000000_create_users"
///     }
///
///     async fn up(&self, schema: &Schema<'_>) -> QueryResult<()> {
///         schema
///             .create("users", |t| {
///                 t.increments("id");
///                 t.var_char("username", 64);
///                 t.primary(["id"]);
///             })
///             .await
///     }
///
///     async fn down(&self, schema: &Schema<'_>) -> QueryResult<()> {
///         schema.drop("users").await
///     }
/// }
/// ```
#[async_trait]
pub trait MigrationDefinition: Send + Sync {
    /// Unique, chronologically sortable name.
    fn name(&self) -> &str;

    /// Apply the change.
    async fn up(&self, schema: &Schema<'_>) -> QueryResult<()>;

    /// Reverse the change.
    async fn down(&self, schema: &Schema<'_>) -> QueryResult<()>;
}

/// Run order of a migration name: the numeric id before the first `_`,
/// then the whole name. Names without a numeric id sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RunOrder {
    id: Option<u128>,
    name: String,
}

impl RunOrder {
    pub(crate) fn of(name: &str) -> Self {
        let digits = name.split('_').next().unwrap_or_default();
        Self {
            id: digits.parse().ok().filter(|_| digits.bytes().all(|b| b.is_ascii_digit())),
            name: name.to_string(),
        }
    }
}

/// The migrations known to one command invocation, ordered by numeric id
/// and then by name, so `2_b` runs before `10_c`.
#[derive(Clone, Default)]
pub struct MigrationSet {
    definitions: BTreeMap<RunOrder, Arc<dyn MigrationDefinition>>,
}

impl std::fmt::Debug for MigrationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl MigrationSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Names must be unique.
    pub fn add<M>(&mut self, definition: M) -> MigrateResult<()>
    where
        M: MigrationDefinition + 'static,
    {
        self.add_shared(Arc::new(definition))
    }

    /// Add an already shared definition. Names must be unique.
    pub fn add_shared(&mut self, definition: Arc<dyn MigrationDefinition>) -> MigrateResult<()> {
        let key = RunOrder::of(definition.name());
        if self.definitions.contains_key(&key) {
            return Err(MigrationError::InvalidMigration(format!(
                "duplicate migration name '{}'",
                key.name
            )));
        }
        self.definitions.insert(key, definition);
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with<M>(mut self, definition: M) -> MigrateResult<Self>
    where
        M: MigrationDefinition + 'static,
    {
        self.add(definition)?;
        Ok(self)
    }

    /// Load every `<id>_<name>/up.sql` directory below `dir`.
    pub async fn from_dir(dir: impl AsRef<Path>) -> MigrateResult<Self> {
        let mut set = Self::new();
        for migration in SqlMigration::discover(dir.as_ref()).await? {
            set.add(migration)?;
        }
        Ok(set)
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn MigrationDefinition>> {
        self.definitions.get(&RunOrder::of(name))
    }

    /// Definitions in run order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MigrationDefinition>> {
        self.definitions.values()
    }

    /// Names in run order.
    pub fn names(&self) -> Vec<&str> {
        self.definitions.keys().map(|key| key.name.as_str()).collect()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl MigrationDefinition for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn up(&self, _schema: &Schema<'_>) -> QueryResult<()> {
            Ok(())
        }

        async fn down(&self, _schema: &Schema<'_>) -> QueryResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sorted_by_name() {
        let set = MigrationSet::new()
            .with(Named("002_b"))
            .and_then(|s| s.with(Named("001_a")))
            .and_then(|s| s.with(Named("010_c")))
            .unwrap();
        assert_eq!(set.names(), vec!["001_a", "002_b", "010_c"]);
        assert!(set.get("002_b").is_some());
    }

    #[test]
    fn test_unpadded_ids_sort_numerically() {
        let set = MigrationSet::new()
            .with(Named("2_b"))
            .and_then(|s| s.with(Named("10_c")))
            .and_then(|s| s.with(Named("1_a")))
            .and_then(|s| s.with(Named("2_a")))
            .unwrap();
        assert_eq!(set.names(), vec!["1_a", "2_a", "2_b", "10_c"]);
        assert!(set.get("10_c").is_some());
    }

    #[test]
    fn test_names_without_id_sort_first() {
        let set = MigrationSet::new()
            .with(Named("1_a"))
            .and_then(|s| s.with(Named("seed")))
            .unwrap();
        assert_eq!(set.names(), vec!["seed", "1_a"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut set = MigrationSet::new();
        set.add(Named("001_a")).unwrap();
        let err = set.add(Named("001_a")).unwrap_err();
        assert!(err.to_string().contains("duplicate migration name '001_a'"));
        assert_eq!(set.len(), 1);
    }
}
