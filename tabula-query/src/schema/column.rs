//! Column definitions.

use crate::grammar::Grammar;
use crate::value::Value;

/// Default value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// A value rendered as a literal (`'hi'`, `0`, `NULL`).
    Value(Value),
    /// An expression rendered verbatim (`CURRENT_TIMESTAMP`).
    Expression(String),
}

/// One column's DDL fragment.
///
/// Modifiers may be applied in any order; [`compile`](Self::compile) always
/// renders them as
/// `name TYPE(length) [UNSIGNED] [ZEROFILL] [CHARACTER SET x] [COLLATE y]
/// [NULL|NOT NULL] [DEFAULT lit] [AUTO_INCREMENT] [COMMENT lit]`.
///
/// ```rust
/// use tabula_query::{ColumnDefinition, Grammar};
///
/// let g = Grammar::mysql();
/// let mut col = ColumnDefinition::integer("colname", 8);
/// col.zero_fill().unsigned();
/// assert_eq!(col.compile(&g), "`colname` INT(8) UNSIGNED ZEROFILL NOT NULL");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    name: String,
    sql_type: String,
    length: Option<String>,
    members: Vec<String>,
    unsigned: bool,
    zero_fill: bool,
    charset: Option<String>,
    collation: Option<String>,
    nullable: bool,
    default: Option<ColumnDefault>,
    auto_increment: bool,
    comment: Option<String>,
}

impl ColumnDefinition {
    /// A column of an arbitrary type with an optional length/precision string.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>, length: Option<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            length,
            members: Vec::new(),
            unsigned: false,
            zero_fill: false,
            charset: None,
            collation: None,
            nullable: false,
            default: None,
            auto_increment: false,
            comment: None,
        }
    }

    fn sized(name: impl Into<String>, sql_type: &str, length: u32) -> Self {
        Self::new(name, sql_type, Some(length.to_string()))
    }

    fn bare(name: impl Into<String>, sql_type: &str) -> Self {
        Self::new(name, sql_type, None)
    }

    // ============== Factories ==============

    /// `INT(length)`
    pub fn integer(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "INT", length)
    }

    /// `TINYINT(length)`
    pub fn tiny_integer(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "TINYINT", length)
    }

    /// `SMALLINT(length)`
    pub fn small_integer(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "SMALLINT", length)
    }

    /// `MEDIUMINT(length)`
    pub fn medium_integer(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "MEDIUMINT", length)
    }

    /// `BIGINT(length)`
    pub fn big_integer(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "BIGINT", length)
    }

    /// `VARCHAR(length)`
    pub fn var_char(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "VARCHAR", length)
    }

    /// `CHAR(length)`
    pub fn char(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "CHAR", length)
    }

    /// `TEXT`
    pub fn text(name: impl Into<String>) -> Self {
        Self::bare(name, "TEXT")
    }

    /// `MEDIUMTEXT`
    pub fn medium_text(name: impl Into<String>) -> Self {
        Self::bare(name, "MEDIUMTEXT")
    }

    /// `LONGTEXT`
    pub fn long_text(name: impl Into<String>) -> Self {
        Self::bare(name, "LONGTEXT")
    }

    /// `DECIMAL(precision,scale)`
    pub fn decimal(name: impl Into<String>, precision: u32, scale: u32) -> Self {
        Self::new(name, "DECIMAL", Some(format!("{},{}", precision, scale)))
    }

    /// `FLOAT`
    pub fn float(name: impl Into<String>) -> Self {
        Self::bare(name, "FLOAT")
    }

    /// `DOUBLE`
    pub fn double(name: impl Into<String>) -> Self {
        Self::bare(name, "DOUBLE")
    }

    /// `TINYINT(1)`
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::sized(name, "TINYINT", 1)
    }

    /// `DATE`
    pub fn date(name: impl Into<String>) -> Self {
        Self::bare(name, "DATE")
    }

    /// `DATETIME`
    pub fn date_time(name: impl Into<String>) -> Self {
        Self::bare(name, "DATETIME")
    }

    /// `TIMESTAMP`
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::bare(name, "TIMESTAMP")
    }

    /// `TIME`
    pub fn time(name: impl Into<String>) -> Self {
        Self::bare(name, "TIME")
    }

    /// `JSON`
    pub fn json(name: impl Into<String>) -> Self {
        Self::bare(name, "JSON")
    }

    /// `VARBINARY(length)`
    pub fn binary(name: impl Into<String>, length: u32) -> Self {
        Self::sized(name, "VARBINARY", length)
    }

    /// `ENUM('a', 'b', ...)`. Members are stored raw and quoted at compile time.
    pub fn enumeration<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut column = Self::bare(name, "ENUM");
        column.members = members.into_iter().map(Into::into).collect();
        column
    }

    // ============== Modifiers ==============

    /// Add `UNSIGNED`.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Add `ZEROFILL`.
    pub fn zero_fill(&mut self) -> &mut Self {
        self.zero_fill = true;
        self
    }

    /// Add `CHARACTER SET name`.
    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// Add `COLLATE name`.
    pub fn collate(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Allow `NULL`. Ignored when the column auto-increments.
    pub fn is_null(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Add `DEFAULT literal`.
    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    /// Add `DEFAULT expression`, rendered unquoted.
    pub fn default_raw(&mut self, expression: impl Into<String>) -> &mut Self {
        self.default = Some(ColumnDefault::Expression(expression.into()));
        self
    }

    /// Add `AUTO_INCREMENT`. Forces `NOT NULL`.
    pub fn auto_increments(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Add `COMMENT 'text'`.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    // ============== Accessors ==============

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base SQL type.
    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    /// Whether the compiled fragment allows `NULL`.
    pub fn is_nullable(&self) -> bool {
        self.nullable && !self.auto_increment
    }

    /// Render the fragment.
    pub fn compile(&self, grammar: &Grammar) -> String {
        let mut parts = vec![grammar.quote_name(&self.name), self.compile_type(grammar)];

        if self.unsigned {
            parts.push("UNSIGNED".to_string());
        }
        if self.zero_fill {
            parts.push("ZEROFILL".to_string());
        }
        if let Some(charset) = &self.charset {
            parts.push(format!("CHARACTER SET {}", charset));
        }
        if let Some(collation) = &self.collation {
            parts.push(format!("COLLATE {}", collation));
        }

        parts.push(if self.is_nullable() { "NULL" } else { "NOT NULL" }.to_string());

        match &self.default {
            Some(ColumnDefault::Value(value)) => {
                parts.push(format!("DEFAULT {}", grammar.literal(value)));
            }
            Some(ColumnDefault::Expression(expr)) => parts.push(format!("DEFAULT {}", expr)),
            None => {}
        }
        if self.auto_increment {
            parts.push("AUTO_INCREMENT".to_string());
        }
        if let Some(comment) = &self.comment {
            parts.push(format!("COMMENT {}", grammar.quote_string(comment)));
        }

        parts.join(" ")
    }

    fn compile_type(&self, grammar: &Grammar) -> String {
        if !self.members.is_empty() {
            let quoted: Vec<String> = self
                .members
                .iter()
                .map(|m| grammar.quote_string(m))
                .collect();
            return format!("{}({})", self.sql_type, quoted.join(", "));
        }
        match &self.length {
            Some(length) => format!("{}({})", self.sql_type, length),
            None => self.sql_type.clone(),
        }
    }
}
