//! Conversions between [`tabula_query::Value`] and the driver's values.

use mysql_async::Value as MysqlValue;
use tabula_query::Value;

use crate::error::{MysqlError, MysqlResult};

/// Convert a bound parameter for the driver.
///
/// Function values are expanded into placeholders at compile time and never
/// reach a connection, so meeting one here is an error.
pub fn to_mysql(value: &Value) -> MysqlResult<MysqlValue> {
    Ok(match value {
        Value::Null => MysqlValue::NULL,
        Value::Bool(b) => MysqlValue::from(*b),
        Value::Int(i) => MysqlValue::from(*i),
        Value::Float(f) => MysqlValue::from(*f),
        Value::String(s) => MysqlValue::from(s.as_str()),
        Value::Json(j) => MysqlValue::from(j.to_string()),
        Value::Function(func) => {
            return Err(MysqlError::type_conversion(format!(
                "function {}() cannot be bound as a parameter",
                func.name
            )));
        }
    })
}

/// Convert every parameter of a statement.
pub fn to_mysql_params(values: &[Value]) -> MysqlResult<Vec<MysqlValue>> {
    values.iter().map(to_mysql).collect()
}

/// Convert a column value read from the server.
///
/// Dates come back as `YYYY-MM-DD HH:MM:SS` strings, with microseconds only
/// when non-zero. Unsigned integers beyond `i64` become decimal strings.
pub fn from_mysql(value: MysqlValue) -> Value {
    match value {
        MysqlValue::NULL => Value::Null,
        MysqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Value::String(s),
            Err(e) => Value::String(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        },
        MysqlValue::Int(i) => Value::Int(i),
        MysqlValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::String(u.to_string()),
        },
        MysqlValue::Float(f) => Value::Float(f64::from(f)),
        MysqlValue::Double(d) => Value::Float(d),
        MysqlValue::Date(year, month, day, hour, minute, second, micro) => {
            let mut s = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if micro != 0 {
                s.push_str(&format!(".{:06}", micro));
            }
            Value::String(s)
        }
        MysqlValue::Time(is_neg, days, hours, minutes, seconds, micro) => {
            let sign = if is_neg { "-" } else { "" };
            let mut s = format!(
                "{}{:02}:{:02}:{:02}",
                sign,
                days * 24 + u32::from(hours),
                minutes,
                seconds
            );
            if micro != 0 {
                s.push_str(&format!(".{:06}", micro));
            }
            Value::String(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mysql_scalars() {
        assert!(matches!(to_mysql(&Value::Null).unwrap(), MysqlValue::NULL));
        assert!(matches!(to_mysql(&Value::Int(42)).unwrap(), MysqlValue::Int(42)));
        // mysql_async sends bools as integers
        assert!(matches!(to_mysql(&Value::Bool(true)).unwrap(), MysqlValue::Int(1)));
        assert!(matches!(to_mysql(&Value::Float(1.5)).unwrap(), MysqlValue::Double(_)));
        assert_eq!(
            to_mysql(&Value::from("abc")).unwrap(),
            MysqlValue::Bytes(b"abc".to_vec())
        );
    }

    #[test]
    fn test_function_is_rejected() {
        let func = Value::function("NOW()", Vec::<Value>::new());
        assert!(to_mysql(&func).is_err());
        assert!(to_mysql_params(&[Value::Int(1), func]).is_err());
    }

    #[test]
    fn test_from_mysql_dates() {
        assert_eq!(
            from_mysql(MysqlValue::Date(2024, 5, 1, 10, 0, 7, 0)),
            Value::from("2024-05-01 10:00:07")
        );
        assert_eq!(
            from_mysql(MysqlValue::Date(2024, 5, 1, 10, 0, 7, 250)),
            Value::from("2024-05-01 10:00:07.000250")
        );
        assert_eq!(
            from_mysql(MysqlValue::Time(true, 1, 2, 3, 4, 0)),
            Value::from("-26:03:04")
        );
    }

    #[test]
    fn test_from_mysql_numbers_and_text() {
        assert_eq!(from_mysql(MysqlValue::Int(-3)), Value::Int(-3));
        assert_eq!(from_mysql(MysqlValue::UInt(7)), Value::Int(7));
        assert_eq!(
            from_mysql(MysqlValue::UInt(u64::MAX)),
            Value::from(u64::MAX.to_string())
        );
        assert_eq!(
            from_mysql(MysqlValue::Bytes(b"users".to_vec())),
            Value::from("users")
        );
        assert_eq!(from_mysql(MysqlValue::NULL), Value::Null);
    }
}
