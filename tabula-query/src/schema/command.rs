//! Index, key and drop operations issued against a blueprint.

use crate::error::{QueryError, QueryResult};
use crate::grammar::Grammar;

/// Everything a command needs to know about the blueprint that owns it.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// Formatting rules.
    pub grammar: &'a Grammar,
    /// Unprefixed table name.
    pub table: &'a str,
    /// `true` inside `CREATE TABLE`, `false` inside `ALTER TABLE`.
    pub creating: bool,
}

impl CommandContext<'_> {
    fn add_prefix(&self) -> &'static str {
        if self.creating { "" } else { "ADD " }
    }
}

/// The operation a [`Command`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `PRIMARY KEY (...)`
    Primary,
    /// `UNIQUE name (...)`
    Unique,
    /// `INDEX name (...)`
    Index,
    /// `DROP PRIMARY KEY`
    DropPrimary,
    /// `DROP INDEX name` for a unique index.
    DropUnique,
    /// `DROP INDEX name`
    DropIndex,
    /// `DROP FOREIGN KEY name`
    DropForeign,
    /// `DROP col, DROP col, ...`
    DropColumn,
}

impl CommandKind {
    /// Operation name as used in migration code (`primary`, `dropIndex`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
            Self::DropPrimary => "dropPrimary",
            Self::DropUnique => "dropUnique",
            Self::DropIndex => "dropIndex",
            Self::DropForeign => "dropForeign",
            Self::DropColumn => "dropColumn",
        }
    }
}

/// One blueprint operation other than a column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    index: Option<String>,
    columns: Vec<String>,
}

impl Command {
    /// Create a command over the given columns.
    pub fn new<I, S>(kind: CommandKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            index: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a drop command targeting an explicit index name.
    pub fn drop_named(kind: CommandKind, index: impl Into<String>) -> Self {
        Self {
            kind,
            index: Some(index.into()),
            columns: Vec::new(),
        }
    }

    /// Use an explicit index name instead of the derived one.
    pub fn name(&mut self, index: impl Into<String>) -> &mut Self {
        self.index = Some(index.into());
        self
    }

    /// The operation.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Participating columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Explicit name, or `table_col1_col2...`.
    pub fn index_name(&self, table: &str) -> String {
        match &self.index {
            Some(name) => name.clone(),
            None => derive_index_name(table, &self.columns),
        }
    }

    /// Render the fragment for use inside `CREATE TABLE (...)` or `ALTER TABLE`.
    pub fn compile(&self, ctx: &CommandContext<'_>) -> String {
        let g = ctx.grammar;
        match self.kind {
            CommandKind::Primary => format!(
                "{}PRIMARY KEY ({})",
                ctx.add_prefix(),
                g.compile_column_list(&self.columns)
            ),
            CommandKind::Unique | CommandKind::Index => format!(
                "{}{} {} ({})",
                ctx.add_prefix(),
                if self.kind == CommandKind::Unique { "UNIQUE" } else { "INDEX" },
                g.quote_name(&self.index_name(ctx.table)),
                g.compile_column_list(&self.columns)
            ),
            CommandKind::DropPrimary => "DROP PRIMARY KEY".to_string(),
            CommandKind::DropUnique | CommandKind::DropIndex => {
                format!("DROP INDEX {}", g.quote_name(&self.index_name(ctx.table)))
            }
            CommandKind::DropForeign => {
                format!("DROP FOREIGN KEY {}", g.quote_name(&self.index_name(ctx.table)))
            }
            CommandKind::DropColumn => self
                .columns
                .iter()
                .map(|c| format!("DROP {}", g.quote_name(c)))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// A foreign key: a [`Command`] plus the referenced table and actions.
///
/// ```rust
/// use tabula_query::{CommandContext, ForeignCommand, Grammar};
///
/// let grammar = Grammar::mysql().with_prefix("p_");
/// let ctx = CommandContext { grammar: &grammar, table: "messages", creating: true };
///
/// let mut fk = ForeignCommand::new(["sender_id"]);
/// fk.references("users", ["id"]);
/// assert_eq!(
///     fk.compile(&ctx),
///     "FOREIGN KEY `fk_messages_sender_id_users_id` (`sender_id`) REFERENCES `p_users` (`id`)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignCommand {
    index: Option<String>,
    constraint: Option<String>,
    columns: Vec<String>,
    on: String,
    references: Vec<String>,
    on_delete: Option<String>,
    on_update: Option<String>,
}

impl ForeignCommand {
    /// A foreign key over the given local columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index: None,
            constraint: None,
            columns: columns.into_iter().map(Into::into).collect(),
            on: String::new(),
            references: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Set the referenced (unprefixed) table and its columns.
    pub fn references<I, S>(&mut self, table: impl Into<String>, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on = table.into();
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Use an explicit index name.
    pub fn name(&mut self, index: impl Into<String>) -> &mut Self {
        self.index = Some(index.into());
        self
    }

    /// Emit `CONSTRAINT name` ahead of the key.
    pub fn constraint(&mut self, name: impl Into<String>) -> &mut Self {
        self.constraint = Some(name.into());
        self
    }

    /// `ON DELETE action`
    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_delete = Some(action.into());
        self
    }

    /// `ON UPDATE action`
    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_update = Some(action.into());
        self
    }

    /// The referenced table.
    pub fn referenced_table(&self) -> &str {
        &self.on
    }

    /// Check that the key names local columns and a referenced table with
    /// as many columns.
    pub fn validate(&self) -> QueryResult<()> {
        let field = format!("foreign key ({})", self.columns.join(", "));
        if self.columns.is_empty() {
            return Err(QueryError::invalid_input(field, "no local columns"));
        }
        if self.on.is_empty() || self.references.is_empty() {
            return Err(QueryError::invalid_input(
                field,
                "missing references(table, columns)",
            ));
        }
        if self.references.len() != self.columns.len() {
            return Err(QueryError::invalid_input(
                field,
                format!(
                    "{} local columns but {} referenced",
                    self.columns.len(),
                    self.references.len()
                ),
            ));
        }
        Ok(())
    }

    /// Explicit name, or `fk_table_cols_reftable_refcols`.
    pub fn index_name(&self, table: &str) -> String {
        match &self.index {
            Some(name) => name.clone(),
            None => format!(
                "fk_{}_{}_{}",
                table,
                self.columns.join("_"),
                derive_index_name(&self.on, &self.references)
            ),
        }
    }

    /// Render the fragment.
    pub fn compile(&self, ctx: &CommandContext<'_>) -> String {
        let g = ctx.grammar;
        let mut sql = String::from(ctx.add_prefix());

        if let Some(constraint) = &self.constraint {
            sql.push_str(&format!("CONSTRAINT {} ", g.quote_name(constraint)));
        }

        sql.push_str(&format!(
            "FOREIGN KEY {} ({}) REFERENCES {} ({})",
            g.quote_name(&self.index_name(ctx.table)),
            g.compile_column_list(&self.columns),
            g.wrap_table(&self.on),
            g.compile_column_list(&self.references)
        ));

        if let Some(action) = &self.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = &self.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action));
        }

        sql
    }
}

fn derive_index_name(table: &str, columns: &[String]) -> String {
    let mut name = table.to_string();
    for column in columns {
        name.push('_');
        name.push_str(column);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx<'a>(grammar: &'a Grammar, table: &'a str, creating: bool) -> CommandContext<'a> {
        CommandContext {
            grammar,
            table,
            creating,
        }
    }

    #[test]
    fn test_index_create_and_alter() {
        let g = Grammar::mysql();
        let cmd = Command::new(CommandKind::Index, ["username"]);
        assert_eq!(
            cmd.compile(&ctx(&g, "users", true)),
            "INDEX `users_username` (`username`)"
        );
        assert_eq!(
            cmd.compile(&ctx(&g, "users", false)),
            "ADD INDEX `users_username` (`username`)"
        );
    }

    #[test]
    fn test_multi_column_index_name() {
        let g = Grammar::mysql();
        let cmd = Command::new(CommandKind::Index, ["username", "id"]);
        assert_eq!(
            cmd.compile(&ctx(&g, "users", true)),
            "INDEX `users_username_id` (`username`, `id`)"
        );
    }

    #[test]
    fn test_explicit_name_and_unique() {
        let g = Grammar::mysql();
        let mut cmd = Command::new(CommandKind::Unique, ["email"]);
        cmd.name("uniq_email");
        assert_eq!(
            cmd.compile(&ctx(&g, "users", false)),
            "ADD UNIQUE `uniq_email` (`email`)"
        );
    }

    #[test]
    fn test_primary() {
        let g = Grammar::mysql();
        let cmd = Command::new(CommandKind::Primary, ["id"]);
        assert_eq!(cmd.compile(&ctx(&g, "users", true)), "PRIMARY KEY (`id`)");
        assert_eq!(cmd.compile(&ctx(&g, "users", false)), "ADD PRIMARY KEY (`id`)");
    }

    #[test]
    fn test_drop_family() {
        let g = Grammar::mysql();
        let c = ctx(&g, "users", false);
        assert_eq!(
            Command::new(CommandKind::DropPrimary, Vec::<String>::new()).compile(&c),
            "DROP PRIMARY KEY"
        );
        assert_eq!(
            Command::drop_named(CommandKind::DropIndex, "users_username").compile(&c),
            "DROP INDEX `users_username`"
        );
        assert_eq!(
            Command::new(CommandKind::DropUnique, ["email"]).compile(&c),
            "DROP INDEX `users_email`"
        );
        assert_eq!(
            Command::drop_named(CommandKind::DropForeign, "fk_a").compile(&c),
            "DROP FOREIGN KEY `fk_a`"
        );
    }

    #[test]
    fn test_drop_column() {
        let g = Grammar::mysql();
        let cmd = Command::new(CommandKind::DropColumn, ["a", "b"]);
        assert_eq!(cmd.compile(&ctx(&g, "t", false)), "DROP `a`, DROP `b`");
    }

    #[test]
    fn test_foreign_with_actions() {
        let g = Grammar::mysql().with_prefix("p_");
        let mut fk = ForeignCommand::new(["sender_id"]);
        fk.references("users", ["id"])
            .on_delete("CASCADE")
            .on_update("RESTRICT");
        assert_eq!(
            fk.compile(&ctx(&g, "messages", true)),
            "FOREIGN KEY `fk_messages_sender_id_users_id` (`sender_id`) REFERENCES `p_users` (`id`) ON DELETE CASCADE ON UPDATE RESTRICT"
        );
    }

    #[test]
    fn test_foreign_alter_with_constraint() {
        let g = Grammar::mysql();
        let mut fk = ForeignCommand::new(["a", "b"]);
        fk.references("others", ["x", "y"]).constraint("c_ab");
        assert_eq!(
            fk.compile(&ctx(&g, "t", false)),
            "ADD CONSTRAINT `c_ab` FOREIGN KEY `fk_t_a_b_others_x_y` (`a`, `b`) REFERENCES `others` (`x`, `y`)"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CommandKind::DropForeign.as_str(), "dropForeign");
        assert_eq!(CommandKind::Primary.as_str(), "primary");
    }

    #[test]
    fn test_foreign_key_requires_references() {
        let fk = ForeignCommand::new(["x"]);
        let err = fk.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("missing references"));

        let mut fk = ForeignCommand::new(["a", "b"]);
        fk.references("others", ["x"]);
        assert!(fk.validate().unwrap_err().to_string().contains("2 local columns but 1 referenced"));

        fk.references("others", ["x", "y"]);
        assert!(fk.validate().is_ok());
    }
}
