//! Backend-neutral values and name-addressable rows

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::DbError;

/// A single column value, decoded from either backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Decimal(Decimal),
}

impl SqlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Decimal(_) => "decimal",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Date(v) => serializer.serialize_str(&v.format("%Y-%m-%d").to_string()),
            // Strings keep NUMERIC precision intact in JSON
            Self::Decimal(v) => serializer.serialize_str(&v.to_string()),
        }
    }
}

/// Result row with columns addressable by name, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style append, mostly for fixtures.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Value for `name`, if the column exists. First match wins.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    fn require(&self, name: &str) -> Result<&SqlValue, DbError> {
        self.get(name).ok_or_else(|| DbError::MissingColumn {
            column: name.to_string(),
        })
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, DbError> {
        match self.require(name)? {
            SqlValue::Int(v) => Ok(*v),
            other => Err(mismatch(name, "integer", other)),
        }
    }

    pub fn get_text(&self, name: &str) -> Result<String, DbError> {
        match self.require(name)? {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(name, "text", other)),
        }
    }

    pub fn get_opt_text(&self, name: &str) -> Result<Option<String>, DbError> {
        match self.require(name)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(mismatch(name, "text", other)),
        }
    }

    pub fn get_date(&self, name: &str) -> Result<NaiveDate, DbError> {
        match self.require(name)? {
            SqlValue::Date(v) => Ok(*v),
            other => Err(mismatch(name, "date", other)),
        }
    }

    pub fn get_decimal(&self, name: &str) -> Result<Decimal, DbError> {
        match self.require(name)? {
            SqlValue::Decimal(v) => Ok(*v),
            other => Err(mismatch(name, "decimal", other)),
        }
    }
}

fn mismatch(column: &str, expected: &str, found: &SqlValue) -> DbError {
    DbError::decode(
        column,
        format!("expected {expected}, found {}", found.type_name()),
    )
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new()
            .with("client_id", 1i64)
            .with("full_name", "Ana García")
            .with("email", None::<String>)
            .with("created_at", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
    }

    #[test]
    fn columns_are_addressable_by_name() {
        let row = sample();
        assert_eq!(row.get_i64("client_id").unwrap(), 1);
        assert_eq!(row.get_text("full_name").unwrap(), "Ana García");
        assert_eq!(row.get_opt_text("email").unwrap(), None);
        assert_eq!(
            row.get_date("created_at").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let err = sample().get_i64("nope").unwrap_err();
        assert!(matches!(err, DbError::MissingColumn { column } if column == "nope"));
    }

    #[test]
    fn type_mismatch_is_a_decode_error() {
        let err = sample().get_i64("full_name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot decode column 'full_name': expected integer, found text"
        );
    }

    #[test]
    fn serializes_in_column_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"client_id":1,"full_name":"Ana García","email":null,"created_at":"2024-01-31"}"#
        );
    }

    #[test]
    fn decimal_serializes_as_string() {
        let row = Row::new().with("unit_price", Decimal::new(89900, 2));
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"unit_price":"899.00"}"#
        );
    }
}
