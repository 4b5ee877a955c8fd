//! Text formatting rules shared by every compiler in the crate.
//!
//! A [`Grammar`] is a pair of dialect constants and a table prefix. All of its
//! methods are pure: identical input always produces identical output, which is
//! what makes every statement in this crate testable by literal comparison.
//!
//! ```rust
//! use tabula_query::Grammar;
//!
//! let grammar = Grammar::mysql().with_prefix("p_");
//! assert_eq!(grammar.quote_name("users"), "`users`");
//! assert_eq!(grammar.wrap_table("users"), "`p_users`");
//! assert_eq!(grammar.quote_string("it's"), "'it\\'s'");
//! assert_eq!(grammar.compile_column_list(&["id", "name"]), "`id`, `name`");
//! ```

use crate::value::Value;

/// Dialect constants. Only quoting and placeholder style differ between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// MySQL / MariaDB: backtick identifiers, `?` placeholders.
    #[default]
    MySql,
    /// PostgreSQL: double-quoted identifiers, `$n` placeholders.
    PostgreSql,
    /// SQLite: double-quoted identifiers, `?` placeholders.
    Sqlite,
}

impl Dialect {
    /// Identifier quote character.
    pub fn quote_char(&self) -> char {
        match self {
            Self::MySql => '`',
            Self::PostgreSql | Self::Sqlite => '"',
        }
    }

    /// Parameter placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSql => format!("${}", index),
            Self::MySql | Self::Sqlite => "?".to_string(),
        }
    }

    /// Whether backslashes are escape characters inside string literals.
    fn backslash_escapes(&self) -> bool {
        matches!(self, Self::MySql)
    }
}

/// Quoting, joining and prefixing rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    dialect: Dialect,
    prefix: String,
}

impl Grammar {
    /// Create a grammar for the given dialect with no table prefix.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            prefix: String::new(),
        }
    }

    /// MySQL grammar with no prefix.
    pub fn mysql() -> Self {
        Self::new(Dialect::MySql)
    }

    /// Set the table prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The dialect in use.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The table prefix (possibly empty).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Wrap an identifier in the dialect's quote character.
    ///
    /// The whole input is one token: `a.b` becomes `` `a.b` ``. Embedded quote
    /// characters are doubled.
    pub fn quote_name(&self, identifier: &str) -> String {
        let q = self.dialect.quote_char();
        let mut out = String::with_capacity(identifier.len() + 2);
        out.push(q);
        for c in identifier.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Prepend the table prefix to a raw table name without quoting.
    pub fn prefixed(&self, table: &str) -> String {
        format!("{}{}", self.prefix, table)
    }

    /// Prefix then quote a table name as a single token.
    pub fn wrap_table(&self, table: &str) -> String {
        self.quote_name(&self.prefixed(table))
    }

    /// Produce a string literal, escaping embedded quotes and backslashes.
    pub fn quote_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\\' if self.dialect.backslash_escapes() => out.push_str("\\\\"),
                '\'' if self.dialect.backslash_escapes() => out.push_str("\\'"),
                '\'' => out.push_str("''"),
                _ => out.push(c),
            }
        }
        out.push('\'');
        out
    }

    /// Quote each name and join with `, `.
    pub fn compile_column_list<S: AsRef<str>>(&self, names: &[S]) -> String {
        names
            .iter()
            .map(|n| self.quote_name(n.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render a value as an inline SQL literal (used for column defaults).
    pub fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match self.dialect {
                Dialect::PostgreSql => if *b { "TRUE" } else { "FALSE" }.to_string(),
                _ => if *b { "1" } else { "0" }.to_string(),
            },
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => self.quote_string(s),
            Value::Json(j) => self.quote_string(&j.to_string()),
            Value::Function(func) => {
                let args: Vec<String> = func.args.iter().map(|a| self.literal(a)).collect();
                format!("{}({})", func.name, args.join(", "))
            }
        }
    }
}
