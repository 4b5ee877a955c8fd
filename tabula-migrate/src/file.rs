//! Migrations stored as `up.sql` / `down.sql` files.

use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use async_trait::async_trait;
use tabula_query::{QueryResult, Schema};
use tracing::warn;

use crate::definition::{MigrationDefinition, RunOrder};
use crate::error::{MigrateResult, MigrationError};

/// A migration read from `<id>_<name>/up.sql` and an optional `down.sql`.
///
/// The directory name is the migration name, so the numeric id prefix
/// decides ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    name: String,
    path: PathBuf,
    up: Vec<String>,
    down: Vec<String>,
}

impl SqlMigration {
    /// Build from literal SQL scripts.
    pub fn new(name: impl Into<String>, up: &str, down: &str) -> MigrateResult<Self> {
        let name = name.into();
        parse_migration_name(&name)?;
        Ok(Self {
            name,
            path: PathBuf::new(),
            up: split_statements(up),
            down: split_statements(down),
        })
    }

    /// Read one migration directory.
    pub async fn read(path: &Path) -> MigrateResult<Self> {
        let dir_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MigrationError::InvalidMigration("Invalid path".to_string()))?;

        let up = tokio::fs::read_to_string(path.join("up.sql")).await?;
        let down_path = path.join("down.sql");
        let down = if down_path.exists() {
            tokio::fs::read_to_string(&down_path).await?
        } else {
            String::new()
        };

        let mut migration = Self::new(dir_name, &up, &down)?;
        migration.path = path.to_path_buf();
        Ok(migration)
    }

    /// Every migration directory below `dir`, in run order.
    ///
    /// A missing directory yields no migrations. Directories without an
    /// `up.sql`, or whose names lack a numeric id prefix, are skipped.
    pub async fn discover(dir: &Path) -> MigrateResult<Vec<Self>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() && path.join("up.sql").exists() {
                paths.push(path);
            }
        }
        let mut migrations = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::read(&path).await {
                Ok(migration) => migrations.push(migration),
                Err(MigrationError::InvalidMigration(reason)) => {
                    warn!(path = %path.display(), reason = %reason, "Skipping migration directory");
                }
                Err(err) => return Err(err),
            }
        }
        migrations.sort_by_key(|m| RunOrder::of(&m.name));
        Ok(migrations)
    }

    /// Directory the migration was read from (empty when built in memory).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Statements run by `up`.
    pub fn up_statements(&self) -> &[String] {
        &self.up
    }

    /// Statements run by `down`.
    pub fn down_statements(&self) -> &[String] {
        &self.down
    }
}

#[async_trait]
impl MigrationDefinition for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn up(&self, schema: &Schema<'_>) -> QueryResult<()> {
        for statement in &self.up {
            schema.raw(statement.as_str()).await?;
        }
        Ok(())
    }

    async fn down(&self, schema: &Schema<'_>) -> QueryResult<()> {
        for statement in &self.down {
            schema.raw(statement.as_str()).await?;
        }
        Ok(())
    }
}

/// Split a script into `;`-terminated statements.
///
/// A `;` only ends a statement outside quoted strings, backtick identifiers
/// and comments. `-- `, `#` and `/* */` comments are dropped.
fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                current.push(c);
                while let Some(inner) = chars.next() {
                    current.push(inner);
                    if inner == '\\' && c != '`' {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    } else if inner == c {
                        // A doubled quote is an escaped quote.
                        if chars.peek() == Some(&c) {
                            chars.next();
                            current.push(c);
                        } else {
                            break;
                        }
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') && starts_line_comment(&chars) => {
                skip_line(&mut chars);
                current.push('\n');
            }
            '#' => {
                skip_line(&mut chars);
                current.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for inner in chars.by_ref() {
                    if previous == '*' && inner == '/' {
                        break;
                    }
                    previous = inner;
                }
                current.push(' ');
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);

    statements
}

/// `--` opens a comment only when followed by whitespace or the end of input.
fn starts_line_comment(chars: &Peekable<Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    ahead.next();
    ahead.peek().is_none_or(|c| c.is_whitespace())
}

fn skip_line(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(format!("{};", trimmed));
    }
}

/// Parse `<digits>_<name>` into (id, name).
fn parse_migration_name(name: &str) -> MigrateResult<(&str, &str)> {
    let (id, rest) = name.split_once('_').ok_or_else(|| {
        MigrationError::InvalidMigration(format!("Invalid migration name format: {}", name))
    })?;

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) || rest.is_empty() {
        return Err(MigrationError::InvalidMigration(format!(
            "Invalid migration name (expected <id>_<name>): {}",
            name
        )));
    }

    Ok((id, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_migration_name() {
        assert_eq!(
            parse_migration_name("20231215120000_create_users").unwrap(),
            ("20231215120000", "create_users")
        );
        assert!(parse_migration_name("invalid").is_err());
        assert!(parse_migration_name("abc_test").is_err());
        assert!(parse_migration_name("001_").is_err());
    }

    #[test]
    fn test_split_statements() {
        let script = "-- users\nCREATE TABLE `a` (`id` INT(11) NOT NULL);\n\n  DROP TABLE `b` ;\n";
        assert_eq!(
            split_statements(script),
            vec!["CREATE TABLE `a` (`id` INT(11) NOT NULL);", "DROP TABLE `b`;"]
        );
        assert!(split_statements("  \n-- nothing\n").is_empty());
    }

    #[test]
    fn test_split_keeps_semicolons_inside_literals() {
        assert_eq!(
            split_statements("INSERT INTO `t` (`v`) VALUES ('a;b');"),
            vec!["INSERT INTO `t` (`v`) VALUES ('a;b');"]
        );
        assert_eq!(
            split_statements("INSERT INTO `t` (`v`) VALUES ('it''s;', \"x\\\";y\");\nDELETE FROM `a;b`;"),
            vec![
                "INSERT INTO `t` (`v`) VALUES ('it''s;', \"x\\\";y\");",
                "DELETE FROM `a;b`;",
            ]
        );
    }

    #[test]
    fn test_split_drops_comments() {
        let script = "/* setup; part one */\nCREATE TABLE `a` (`id` INT(11) NOT NULL); -- trailing; note\n\
                      # hash; comment\nUPDATE `a` SET `id` = 5--1;\n";
        assert_eq!(
            split_statements(script),
            vec![
                "CREATE TABLE `a` (`id` INT(11) NOT NULL);",
                "UPDATE `a` SET `id` = 5--1;",
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_sorted_and_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        for (name, up, down) in [
            ("002_posts", "CREATE TABLE `posts` (`id` INT(11) NOT NULL);", Some("DROP TABLE `posts`;")),
            ("001_users", "CREATE TABLE `users` (`id` INT(11) NOT NULL);", None),
            ("notes", "SELECT 1;", None),
        ] {
            let path = dir.path().join(name);
            tokio::fs::create_dir_all(&path).await.unwrap();
            tokio::fs::write(path.join("up.sql"), up).await.unwrap();
            if let Some(down) = down {
                tokio::fs::write(path.join("down.sql"), down).await.unwrap();
            }
        }
        tokio::fs::create_dir_all(dir.path().join("003_empty")).await.unwrap();

        let found = SqlMigration::discover(dir.path()).await.unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["001_users", "002_posts"]);
        assert!(found[0].down_statements().is_empty());
        assert_eq!(found[1].down_statements(), &["DROP TABLE `posts`;".to_string()]);
        assert_eq!(found[1].path(), dir.path().join("002_posts").as_path());
    }

    #[tokio::test]
    async fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = SqlMigration::discover(&dir.path().join("nope")).await.unwrap();
        assert!(found.is_empty());
    }
}
