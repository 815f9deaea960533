/// Positional Parameter Module
///
/// Typed values bound, in order, to the `?` placeholders of a prepared
/// statement.
use crate::core::{Result, SuperQueryError};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// A single positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Text(String),
    Integer(i64),
    Double(f64),
    Float(f32),
    Boolean(bool),
    /// Bound as `YYYY-MM-DD` text
    Date(NaiveDate),
    /// Bound as `HH:MM:SS` text
    Time(NaiveTime),
}

impl Param {
    /// Parses a literal typed on the command line or in the shell.
    ///
    /// Recognized, in order: quoted strings, `null`, `true`/`false`,
    /// integers, decimals, `YYYY-MM-DD` dates and `HH:MM:SS` times. Anything
    /// else is bound as bare text.
    pub fn parse_literal(text: &str) -> Param {
        let text = text.trim();
        if let Some(inner) = strip_quotes(text) {
            return Param::Text(inner.to_string());
        }

        match text.to_ascii_lowercase().as_str() {
            "null" => return Param::Null,
            "true" => return Param::Boolean(true),
            "false" => return Param::Boolean(false),
            _ => {}
        }

        if let Ok(i) = text.parse::<i64>() {
            return Param::Integer(i);
        }
        // f64 also accepts "inf" and "NaN"; only numbers with digits count
        if text.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = text.parse::<f64>() {
                return Param::Double(f);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
            return Param::Date(date);
        }
        if let Ok(time) = NaiveTime::parse_from_str(text, TIME_FORMAT) {
            return Param::Time(time);
        }

        Param::Text(text.to_string())
    }

    /// Splits a whitespace separated list of literals and parses each one.
    ///
    /// Quoted literals may contain whitespace: `7369 'Jane Doe' 2024-01-15`
    /// yields three parameters. A quote only opens a literal at the start of
    /// a token, so `O'Brien` is bare text.
    pub fn parse_list(text: &str) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        let mut current = String::new();
        let mut quote: Option<char> = None;

        for c in text.chars() {
            match quote {
                Some(q) => {
                    current.push(c);
                    if c == q {
                        quote = None;
                    }
                }
                None if current.is_empty() && (c == '\'' || c == '"') => {
                    quote = Some(c);
                    current.push(c);
                }
                None if c.is_whitespace() => {
                    if !current.is_empty() {
                        params.push(Param::parse_literal(&current));
                        current.clear();
                    }
                }
                None => current.push(c),
            }
        }

        if let Some(q) = quote {
            return Err(SuperQueryError::Parameter(format!(
                "unterminated {} quote in '{}'",
                q, text
            )));
        }
        if !current.is_empty() {
            params.push(Param::parse_literal(&current));
        }

        Ok(params)
    }
}

fn strip_quotes(text: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|&q| {
        if text.len() >= 2 && text.starts_with(q) && text.ends_with(q) {
            Some(&text[1..text.len() - 1])
        } else {
            None
        }
    })
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Null => ToSqlOutput::Owned(Value::Null),
            Param::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Param::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Param::Double(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Param::Float(f) => ToSqlOutput::Owned(Value::Real(f64::from(*f))),
            Param::Boolean(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            Param::Date(d) => ToSqlOutput::Owned(Value::Text(d.format(DATE_FORMAT).to_string())),
            Param::Time(t) => ToSqlOutput::Owned(Value::Text(t.format(TIME_FORMAT).to_string())),
        })
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Null => f.write_str("NULL"),
            Param::Text(s) => write!(f, "'{}'", s),
            Param::Integer(i) => write!(f, "{}", i),
            Param::Double(d) => write!(f, "{}", d),
            Param::Float(d) => write!(f, "{}", d),
            Param::Boolean(b) => write!(f, "{}", b),
            Param::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Param::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Integer(i64::from(value))
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Integer(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Double(value)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::Float(value)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Boolean(value)
    }
}

impl From<NaiveDate> for Param {
    fn from(value: NaiveDate) -> Self {
        Param::Date(value)
    }
}

impl From<NaiveTime> for Param {
    fn from(value: NaiveTime) -> Self {
        Param::Time(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}
