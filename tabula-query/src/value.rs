//! Parameter values bound to statement placeholders.

use serde::{Deserialize, Serialize};

/// A value bound to a `?` placeholder, or rendered as a column default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
    /// A SQL function call whose arguments become placeholders in place.
    ///
    /// `NOW(?, ?)` with its arguments bound at the textual position of the
    /// call, ahead of any parameters that follow it.
    Function(SqlFunction),
}

/// A function call token used as a value, e.g. `NOW()` or `POINT(?, ?)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlFunction {
    /// Function name without parentheses.
    pub name: String,
    /// Arguments, each bound as one placeholder.
    pub args: Vec<Value>,
}

impl SqlFunction {
    /// Create a function call. A trailing `()` on the name is accepted and stripped.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_suffix("()").map(str::to_string).unwrap_or(name);
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

impl Value {
    /// Build a function-call value: `Value::function("NOW()", [5, 10])`.
    pub fn function<I, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut func = SqlFunction::new(name);
        func.args = args.into_iter().map(Into::into).collect();
        Self::Function(func)
    }

    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Read an integer, accepting numeric strings as drivers often return them.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<SqlFunction> for Value {
    fn from(v: SqlFunction) -> Self {
        Self::Function(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
