//! WHERE-clause predicates shared by select, update and delete.

use super::Bindings;
use crate::value::Value;

/// How a predicate joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    /// `AND`
    #[default]
    And,
    /// `OR`
    Or,
}

impl Connector {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl Order {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A single condition on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `col = ?`, or `col IS NULL` for a null value.
    Equals(String, Value),
    /// `col != ?`, or `col IS NOT NULL` for a null value.
    NotEquals(String, Value),
    /// `col < ?`
    Lt(String, Value),
    /// `col <= ?`
    Lte(String, Value),
    /// `col > ?`
    Gt(String, Value),
    /// `col >= ?`
    Gte(String, Value),
    /// `col LIKE ?`
    Like(String, Value),
    /// `col IN (?, ...)`
    In(String, Vec<Value>),
    /// `col NOT IN (?, ...)`
    NotIn(String, Vec<Value>),
    /// `col IS NULL`
    IsNull(String),
    /// `col IS NOT NULL`
    IsNotNull(String),
    /// A parenthesised group.
    Group(WhereClause),
}

impl Predicate {
    /// `col = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals(column.into(), value.into())
    }

    /// `col IN (values)`
    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub(crate) fn compile(&self, b: &mut Bindings<'_>) -> String {
        let g = b.grammar;
        match self {
            Self::Equals(col, val) if val.is_null() => format!("{} IS NULL", g.quote_name(col)),
            Self::NotEquals(col, val) if val.is_null() => {
                format!("{} IS NOT NULL", g.quote_name(col))
            }
            Self::Equals(col, val) => compare(b, col, "=", val),
            Self::NotEquals(col, val) => compare(b, col, "!=", val),
            Self::Lt(col, val) => compare(b, col, "<", val),
            Self::Lte(col, val) => compare(b, col, "<=", val),
            Self::Gt(col, val) => compare(b, col, ">", val),
            Self::Gte(col, val) => compare(b, col, ">=", val),
            Self::Like(col, val) => compare(b, col, "LIKE", val),
            Self::In(_, values) if values.is_empty() => "1 = 0".to_string(),
            Self::NotIn(_, values) if values.is_empty() => "1 = 1".to_string(),
            Self::In(col, values) => list(b, col, "IN", values),
            Self::NotIn(col, values) => list(b, col, "NOT IN", values),
            Self::IsNull(col) => format!("{} IS NULL", g.quote_name(col)),
            Self::IsNotNull(col) => format!("{} IS NOT NULL", g.quote_name(col)),
            Self::Group(clause) => match clause.compile_conditions(b) {
                Some(sql) => format!("({})", sql),
                None => "1 = 1".to_string(),
            },
        }
    }
}

fn compare(b: &mut Bindings<'_>, column: &str, op: &str, value: &Value) -> String {
    let column = b.grammar.quote_name(column);
    format!("{} {} {}", column, op, b.bind(value))
}

fn list(b: &mut Bindings<'_>, column: &str, op: &str, values: &[Value]) -> String {
    let column = b.grammar.quote_name(column);
    let placeholders: Vec<String> = values.iter().map(|v| b.bind(v)).collect();
    format!("{} {} ({})", column, op, placeholders.join(", "))
}

/// An ordered list of predicates joined by AND/OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    predicates: Vec<(Connector, Predicate)>,
}

impl WhereClause {
    /// An empty clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate joined with `AND`.
    pub fn and(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push((Connector::And, predicate));
        self
    }

    /// Append a predicate joined with `OR`.
    pub fn or(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push((Connector::Or, predicate));
        self
    }

    /// Whether no predicates were added.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn compile_conditions(&self, b: &mut Bindings<'_>) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let mut sql = String::new();
        for (i, (connector, predicate)) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(connector.as_sql());
                sql.push(' ');
            }
            sql.push_str(&predicate.compile(b));
        }
        Some(sql)
    }

    /// Render ` WHERE ...`, or nothing for an empty clause.
    pub(crate) fn compile(&self, b: &mut Bindings<'_>) -> String {
        match self.compile_conditions(b) {
            Some(sql) => format!(" WHERE {}", sql),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn render(clause: &WhereClause) -> (String, Vec<Value>) {
        let grammar = Grammar::mysql();
        let mut b = Bindings::new(&grammar);
        let sql = clause.compile(&mut b);
        b.finish(sql).into_parts()
    }

    #[test]
    fn test_empty_clause() {
        assert_eq!(render(&WhereClause::new()).0, "");
    }

    #[test]
    fn test_and_or_order() {
        let mut clause = WhereClause::new();
        clause
            .and(Predicate::eq("name", "bob"))
            .or(Predicate::Gt("age".into(), Value::Int(30)))
            .and(Predicate::IsNull("deleted_at".into()));
        let (sql, params) = render(&clause);
        assert_eq!(
            sql,
            " WHERE `name` = ? OR `age` > ? AND `deleted_at` IS NULL"
        );
        assert_eq!(params, vec![Value::from("bob"), Value::Int(30)]);
    }

    #[test]
    fn test_null_equality_becomes_is_null() {
        let mut clause = WhereClause::new();
        clause
            .and(Predicate::eq("a", Value::Null))
            .and(Predicate::NotEquals("b".into(), Value::Null));
        let (sql, params) = render(&clause);
        assert_eq!(sql, " WHERE `a` IS NULL AND `b` IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_in_and_group() {
        let mut inner = WhereClause::new();
        inner
            .and(Predicate::eq("x", 1))
            .or(Predicate::eq("y", 2));
        let mut clause = WhereClause::new();
        clause
            .and(Predicate::is_in("id", [3, 4]))
            .and(Predicate::Group(inner))
            .and(Predicate::In("z".into(), Vec::new()));
        let (sql, params) = render(&clause);
        assert_eq!(
            sql,
            " WHERE `id` IN (?, ?) AND (`x` = ? OR `y` = ?) AND 1 = 0"
        );
        assert_eq!(
            params,
            vec![Value::Int(3), Value::Int(4), Value::Int(1), Value::Int(2)]
        );
    }
}
