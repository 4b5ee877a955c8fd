//! Accumulates column and index operations for one table.

use super::column::ColumnDefinition;
use super::command::{Command, CommandContext, CommandKind, ForeignCommand};
use crate::error::QueryResult;
use crate::grammar::Grammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Command(usize),
    Foreign(usize),
}

/// Column definitions and commands for one `CREATE TABLE` or `ALTER TABLE`.
///
/// Compiles to exactly one statement: every column fragment in declaration
/// order, then every command fragment in declaration order.
///
/// ```rust
/// use tabula_query::{Blueprint, Grammar};
///
/// let mut t = Blueprint::create("users");
/// t.increments("id");
/// t.var_char("username", 64);
/// t.primary(["id"]);
///
/// assert_eq!(
///     t.compile(&Grammar::mysql()),
///     "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, \
///      `username` VARCHAR(64) NOT NULL, PRIMARY KEY (`id`));"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    creating: bool,
    columns: Vec<ColumnDefinition>,
    commands: Vec<Command>,
    foreign_keys: Vec<ForeignCommand>,
    order: Vec<Slot>,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
}

impl Blueprint {
    fn new(table: impl Into<String>, creating: bool) -> Self {
        Self {
            table: table.into(),
            creating,
            columns: Vec::new(),
            commands: Vec::new(),
            foreign_keys: Vec::new(),
            order: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
        }
    }

    /// A blueprint for `CREATE TABLE`.
    pub fn create(table: impl Into<String>) -> Self {
        Self::new(table, true)
    }

    /// A blueprint for `ALTER TABLE`.
    pub fn alter(table: impl Into<String>) -> Self {
        Self::new(table, false)
    }

    /// The unprefixed table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether this blueprint creates its table.
    pub fn is_creating(&self) -> bool {
        self.creating
    }

    /// Whether nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.order.is_empty()
    }

    /// Column definitions in declaration order.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    // ============== Table options ==============

    /// `ENGINE = engine`
    pub fn engine(&mut self, engine: impl Into<String>) -> &mut Self {
        self.engine = Some(engine.into());
        self
    }

    /// `CHARACTER SET = charset`
    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// `COLLATE = collation`
    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    // ============== Columns ==============

    /// Add a prepared column definition.
    pub fn add_column(&mut self, column: ColumnDefinition) -> &mut ColumnDefinition {
        let index = self.columns.len();
        self.columns.push(column);
        &mut self.columns[index]
    }

    /// `INT(length)`
    pub fn integer(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::integer(name, length))
    }

    /// `TINYINT(length)`
    pub fn tiny_integer(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::tiny_integer(name, length))
    }

    /// `SMALLINT(length)`
    pub fn small_integer(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::small_integer(name, length))
    }

    /// `MEDIUMINT(length)`
    pub fn medium_integer(
        &mut self,
        name: impl Into<String>,
        length: u32,
    ) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::medium_integer(name, length))
    }

    /// `BIGINT(length)`
    pub fn big_integer(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::big_integer(name, length))
    }

    /// `VARCHAR(length)`
    pub fn var_char(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::var_char(name, length))
    }

    /// `CHAR(length)`
    pub fn char(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::char(name, length))
    }

    /// `TEXT`
    pub fn text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::text(name))
    }

    /// `MEDIUMTEXT`
    pub fn medium_text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::medium_text(name))
    }

    /// `LONGTEXT`
    pub fn long_text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::long_text(name))
    }

    /// `DECIMAL(precision,scale)`
    pub fn decimal(
        &mut self,
        name: impl Into<String>,
        precision: u32,
        scale: u32,
    ) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::decimal(name, precision, scale))
    }

    /// `FLOAT`
    pub fn float(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::float(name))
    }

    /// `DOUBLE`
    pub fn double(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::double(name))
    }

    /// `TINYINT(1)`
    pub fn boolean(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::boolean(name))
    }

    /// `DATE`
    pub fn date(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::date(name))
    }

    /// `DATETIME`
    pub fn date_time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::date_time(name))
    }

    /// `TIMESTAMP`
    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::timestamp(name))
    }

    /// `TIME`
    pub fn time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::time(name))
    }

    /// `JSON`
    pub fn json(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::json(name))
    }

    /// `VARBINARY(length)`
    pub fn binary(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnDefinition::binary(name, length))
    }

    /// `ENUM('a', 'b', ...)`
    pub fn enumeration<I, S>(&mut self, name: impl Into<String>, members: I) -> &mut ColumnDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_column(ColumnDefinition::enumeration(name, members))
    }

    /// `INT(11) UNSIGNED NOT NULL AUTO_INCREMENT`
    pub fn increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        let column = self.integer(name, 11);
        column.unsigned().auto_increments();
        column
    }

    /// `BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT`
    pub fn big_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        let column = self.big_integer(name, 20);
        column.unsigned().auto_increments();
        column
    }

    /// Nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").is_null();
        self.timestamp("updated_at").is_null();
    }

    // ============== Commands ==============

    fn push_command(&mut self, command: Command) -> &mut Command {
        let index = self.commands.len();
        self.order.push(Slot::Command(index));
        self.commands.push(command);
        &mut self.commands[index]
    }

    /// `PRIMARY KEY (columns)`
    pub fn primary<I, S>(&mut self, columns: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_command(Command::new(CommandKind::Primary, columns))
    }

    /// `UNIQUE name (columns)`
    pub fn unique<I, S>(&mut self, columns: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_command(Command::new(CommandKind::Unique, columns))
    }

    /// `INDEX name (columns)`
    pub fn index<I, S>(&mut self, columns: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_command(Command::new(CommandKind::Index, columns))
    }

    /// `FOREIGN KEY name (columns) REFERENCES ...`
    pub fn foreign<I, S>(&mut self, columns: I) -> &mut ForeignCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.foreign_keys.len();
        self.order.push(Slot::Foreign(index));
        self.foreign_keys.push(ForeignCommand::new(columns));
        &mut self.foreign_keys[index]
    }

    /// `DROP PRIMARY KEY`
    pub fn drop_primary(&mut self) -> &mut Command {
        self.push_command(Command::new(CommandKind::DropPrimary, Vec::<String>::new()))
    }

    /// `DROP INDEX name` for a unique index.
    pub fn drop_unique(&mut self, name: impl Into<String>) -> &mut Command {
        self.push_command(Command::drop_named(CommandKind::DropUnique, name))
    }

    /// `DROP INDEX name`
    pub fn drop_index(&mut self, name: impl Into<String>) -> &mut Command {
        self.push_command(Command::drop_named(CommandKind::DropIndex, name))
    }

    /// `DROP FOREIGN KEY name`
    pub fn drop_foreign(&mut self, name: impl Into<String>) -> &mut Command {
        self.push_command(Command::drop_named(CommandKind::DropForeign, name))
    }

    /// `DROP col, DROP col, ...`
    pub fn drop_column<I, S>(&mut self, columns: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_command(Command::new(CommandKind::DropColumn, columns))
    }

    // ============== Compilation ==============

    /// Reject definitions that cannot compile to valid SQL, such as a
    /// foreign key without `references(...)`.
    pub fn validate(&self) -> QueryResult<()> {
        self.foreign_keys.iter().try_for_each(ForeignCommand::validate)
    }

    /// Compile to a single statement terminated by `;`.
    pub fn compile(&self, grammar: &Grammar) -> String {
        let ctx = CommandContext {
            grammar,
            table: &self.table,
            creating: self.creating,
        };

        let mut fragments: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let fragment = column.compile(grammar);
                if self.creating { fragment } else { format!("ADD {}", fragment) }
            })
            .collect();

        fragments.extend(self.order.iter().map(|slot| match *slot {
            Slot::Command(i) => self.commands[i].compile(&ctx),
            Slot::Foreign(i) => self.foreign_keys[i].compile(&ctx),
        }));

        let table = grammar.wrap_table(&self.table);
        if self.creating {
            format!(
                "CREATE TABLE {} ({}){};",
                table,
                fragments.join(", "),
                self.compile_options()
            )
        } else {
            format!("ALTER TABLE {} {};", table, fragments.join(", "))
        }
    }

    fn compile_options(&self) -> String {
        let mut options = Vec::new();
        if let Some(engine) = &self.engine {
            options.push(format!("ENGINE = {}", engine));
        }
        if let Some(charset) = &self.charset {
            options.push(format!("CHARACTER SET = {}", charset));
        }
        if let Some(collation) = &self.collation {
            options.push(format!("COLLATE = {}", collation));
        }
        if options.is_empty() {
            String::new()
        } else {
            format!(" {}", options.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users() -> Blueprint {
        let mut t = Blueprint::create("users");
        t.increments("id");
        t.var_char("username", 64);
        t.primary(["id"]);
        t
    }

    #[test]
    fn test_create_with_primary() {
        assert_eq!(
            users().compile(&Grammar::mysql()),
            "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, `username` VARCHAR(64) NOT NULL, PRIMARY KEY (`id`));"
        );
    }

    #[test]
    fn test_create_with_index() {
        let mut t = users();
        t.index(["username"]);
        assert_eq!(
            t.compile(&Grammar::mysql()),
            "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, `username` VARCHAR(64) NOT NULL, PRIMARY KEY (`id`), INDEX `users_username` (`username`));"
        );
    }

    #[test]
    fn test_create_with_two_column_index() {
        let mut t = users();
        t.index(["username", "id"]);
        assert!(
            t.compile(&Grammar::mysql())
                .ends_with(", INDEX `users_username_id` (`username`, `id`));")
        );
    }

    #[test]
    fn test_columns_precede_commands() {
        let mut t = Blueprint::create("users");
        t.primary(["id"]);
        t.increments("id");
        assert_eq!(
            t.compile(&Grammar::mysql()),
            "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, PRIMARY KEY (`id`));"
        );
    }

    #[test]
    fn test_table_options() {
        let mut t = Blueprint::create("logs");
        t.text("line");
        t.engine("InnoDB").charset("utf8mb4").collation("utf8mb4_unicode_ci");
        assert_eq!(
            t.compile(&Grammar::mysql()),
            "CREATE TABLE `logs` (`line` TEXT NOT NULL) ENGINE = InnoDB CHARACTER SET = utf8mb4 COLLATE = utf8mb4_unicode_ci;"
        );
    }

    #[test]
    fn test_foreign_key_with_prefix() {
        let mut t = Blueprint::create("messages");
        t.integer("sender_id", 11).unsigned();
        t.foreign(["sender_id"]).references("users", ["id"]);
        assert_eq!(
            t.compile(&Grammar::mysql().with_prefix("p_")),
            "CREATE TABLE `p_messages` (`sender_id` INT(11) UNSIGNED NOT NULL, FOREIGN KEY `fk_messages_sender_id_users_id` (`sender_id`) REFERENCES `p_users` (`id`));"
        );
    }

    #[test]
    fn test_commands_keep_declaration_order() {
        let mut t = Blueprint::alter("messages");
        t.foreign(["sender_id"])
            .references("users", ["id"])
            .on_delete("CASCADE")
            .on_update("RESTRICT");
        t.index(["sender_id"]);
        assert_eq!(
            t.compile(&Grammar::mysql()),
            "ALTER TABLE `messages` ADD FOREIGN KEY `fk_messages_sender_id_users_id` (`sender_id`) REFERENCES `users` (`id`) ON DELETE CASCADE ON UPDATE RESTRICT, ADD INDEX `messages_sender_id` (`sender_id`);"
        );
    }

    #[test]
    fn test_alter_adds_columns_and_drops() {
        let mut t = Blueprint::alter("users");
        t.var_char("email", 128).is_null();
        t.unique(["email"]);
        t.drop_index("users_username");
        t.drop_column(["nickname", "bio"]);
        assert_eq!(
            t.compile(&Grammar::mysql()),
            "ALTER TABLE `users` ADD `email` VARCHAR(128) NULL, ADD UNIQUE `users_email` (`email`), DROP INDEX `users_username`, DROP `nickname`, DROP `bio`;"
        );
    }

    #[test]
    fn test_alter_ignores_table_options() {
        let mut t = Blueprint::alter("users");
        t.engine("InnoDB");
        t.drop_primary();
        assert_eq!(t.compile(&Grammar::mysql()), "ALTER TABLE `users` DROP PRIMARY KEY;");
    }

    #[test]
    fn test_timestamps_helper() {
        let mut t = Blueprint::create("posts");
        t.big_increments("id");
        t.timestamps();
        assert_eq!(
            t.compile(&Grammar::mysql()),
            "CREATE TABLE `posts` (`id` BIGINT(20) UNSIGNED NOT NULL AUTO_INCREMENT, `created_at` TIMESTAMP NULL, `updated_at` TIMESTAMP NULL);"
        );
    }
}
