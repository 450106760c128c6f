//! MySQL row decoding.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the column's MySQL type name
//! 2. a per-category decoder extracts the value as JSON
//!
//! Decoding never fails a whole query: a value that cannot be decoded is
//! logged and returned as `null`.

use crate::config::MysqlOptions;
use crate::models::{Field, Row};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row as _, Type, TypeInfo, ValueRef};
use tracing::error;

/// Largest integer a JSON consumer can hold exactly in an IEEE-754 double.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    UnsignedInteger,
    Boolean,
    Float,
    Decimal,
    Date,
    DateTime,
    Time,
    Json,
    Binary,
    Null,
    Text,
}

/// Classify a MySQL type name (as reported by the driver) into a category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_ascii_uppercase();
    let (base, unsigned) = match upper.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (upper.as_str(), false),
    };

    match base {
        "BOOLEAN" | "BOOL" => TypeCategory::Boolean,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            if unsigned {
                TypeCategory::UnsignedInteger
            } else {
                TypeCategory::Integer
            }
        }
        "FLOAT" | "DOUBLE" | "REAL" => TypeCategory::Float,
        "DECIMAL" | "NUMERIC" => TypeCategory::Decimal,
        "DATE" => TypeCategory::Date,
        "DATETIME" | "TIMESTAMP" => TypeCategory::DateTime,
        "TIME" => TypeCategory::Time,
        "JSON" => TypeCategory::Json,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => TypeCategory::Binary,
        "NULL" => TypeCategory::Null,
        _ => TypeCategory::Text,
    }
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact server representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_ascii_uppercase();
        name.starts_with("DECIMAL") || name.starts_with("NUMERIC")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Encode binary column data as base64.
pub fn encode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

// =============================================================================
// Decode Options
// =============================================================================

/// Number handling flags, taken from [`MysqlOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Keep integers exact; when off, values beyond 2^53 - 1 come back as
    /// strings rather than lossy numbers.
    pub support_big_numbers: bool,
    pub decimal_numbers: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            support_big_numbers: true,
            decimal_numbers: true,
        }
    }
}

impl From<&MysqlOptions> for DecodeOptions {
    fn from(options: &MysqlOptions) -> Self {
        Self {
            support_big_numbers: options.support_big_numbers,
            decimal_numbers: options.decimal_numbers,
        }
    }
}

/// Integer to JSON, stringifying values beyond the safe range unless big
/// numbers are supported.
pub fn integer_value(v: i128, options: DecodeOptions) -> JsonValue {
    let unsafe_range = v > MAX_SAFE_INTEGER as i128 || v < -(MAX_SAFE_INTEGER as i128);
    if unsafe_range && !options.support_big_numbers {
        return JsonValue::String(v.to_string());
    }
    if let Ok(i) = i64::try_from(v) {
        JsonValue::Number(i.into())
    } else if let Ok(u) = u64::try_from(v) {
        JsonValue::Number(u.into())
    } else {
        JsonValue::String(v.to_string())
    }
}

/// DECIMAL text to JSON according to `decimal_numbers`.
pub fn decimal_value(text: String, options: DecodeOptions) -> JsonValue {
    if options.decimal_numbers {
        if let Some(number) = text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return JsonValue::Number(number);
        }
    }
    JsonValue::String(text)
}

// =============================================================================
// Row to JSON
// =============================================================================

/// Convert a MySQL row to a JSON map keyed by column name.
pub fn row_to_json(row: &MySqlRow, options: DecodeOptions) -> Row {
    row.columns()
        .iter()
        .map(|col| {
            let type_name = col.type_info().name();
            let value = decode_column(row, col.ordinal(), categorize_type(type_name), options);
            (col.name().to_string(), value)
        })
        .collect()
}

/// Field descriptors for a row's columns.
pub fn row_fields(row: &MySqlRow) -> Vec<Field> {
    row.columns()
        .iter()
        .map(|col| Field {
            name: col.name().to_string(),
            type_name: col.type_info().name().to_string(),
        })
        .collect()
}

fn decode_column(
    row: &MySqlRow,
    idx: usize,
    category: TypeCategory,
    options: DecodeOptions,
) -> JsonValue {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return JsonValue::Null,
        Ok(_) => {}
        Err(e) => {
            error!(column = idx, error = %e, "Failed to read column");
            return JsonValue::Null;
        }
    }

    let decoded = match category {
        TypeCategory::Integer => {
            decode_signed(row, idx, options).or_else(|| decode_unsigned(row, idx, options))
        }
        TypeCategory::UnsignedInteger => {
            decode_unsigned(row, idx, options).or_else(|| decode_signed(row, idx, options))
        }
        TypeCategory::Boolean => decode_boolean(row, idx, options),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Decimal => row
            .try_get::<RawDecimal, _>(idx)
            .ok()
            .map(|v| decimal_value(v.0, options)),
        TypeCategory::Date => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format("%Y-%m-%d").to_string())),
        TypeCategory::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        TypeCategory::Time => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .map(|v| JsonValue::String(v.format("%H:%M:%S%.f").to_string())),
        TypeCategory::Json => row.try_get::<JsonValue, _>(idx).ok(),
        TypeCategory::Binary => row
            .try_get::<Vec<u8>, _>(idx)
            .ok()
            .map(|v| encode_binary_value(&v)),
        TypeCategory::Null => Some(JsonValue::Null),
        TypeCategory::Text => None,
    };

    decoded.unwrap_or_else(|| decode_text(row, idx))
}

fn decode_signed(row: &MySqlRow, idx: usize, options: DecodeOptions) -> Option<JsonValue> {
    row.try_get::<i64, _>(idx)
        .map(|v| integer_value(v as i128, options))
        .ok()
}

fn decode_unsigned(row: &MySqlRow, idx: usize, options: DecodeOptions) -> Option<JsonValue> {
    row.try_get::<u64, _>(idx)
        .map(|v| integer_value(v as i128, options))
        .ok()
}

fn decode_boolean(row: &MySqlRow, idx: usize, options: DecodeOptions) -> Option<JsonValue> {
    // TINYINT(1) holds more than 0/1; keep the number so values round-trip
    decode_signed(row, idx, options)
        .or_else(|| row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool))
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    let v = row
        .try_get::<f64, _>(idx)
        .ok()
        .or_else(|| row.try_get::<f32, _>(idx).ok().map(f64::from))?;
    Some(
        serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string())),
    )
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return JsonValue::String(v);
    }
    if let Ok(v) = row.try_get_unchecked::<Vec<u8>, _>(idx) {
        return match String::from_utf8(v) {
            Ok(s) => JsonValue::String(s),
            Err(e) => encode_binary_value(e.as_bytes()),
        };
    }
    error!(column = idx, "Failed to decode column value");
    JsonValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integers() {
        assert_eq!(categorize_type("INT"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("TINYINT"), TypeCategory::Integer);
        assert_eq!(
            categorize_type("INT UNSIGNED"),
            TypeCategory::UnsignedInteger
        );
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Boolean);
    }

    #[test]
    fn test_categorize_text_is_not_integer() {
        assert_eq!(categorize_type("TINYTEXT"), TypeCategory::Text);
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("ENUM"), TypeCategory::Text);
        assert_eq!(categorize_type("POINT"), TypeCategory::Text);
    }

    #[test]
    fn test_categorize_other_types() {
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("DOUBLE"), TypeCategory::Float);
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
        assert_eq!(categorize_type("json"), TypeCategory::Json);
        assert_eq!(categorize_type("LONGBLOB"), TypeCategory::Binary);
        assert_eq!(categorize_type("NULL"), TypeCategory::Null);
    }

    #[test]
    fn test_integer_value_big_numbers() {
        let exact = DecodeOptions::default();
        let lossy = DecodeOptions {
            support_big_numbers: false,
            ..exact
        };
        let big = 9_007_199_254_740_993i128;

        assert_eq!(integer_value(42, lossy), JsonValue::from(42));
        assert_eq!(integer_value(big, exact), JsonValue::from(9_007_199_254_740_993i64));
        assert_eq!(
            integer_value(big, lossy),
            JsonValue::String("9007199254740993".to_string())
        );
        assert_eq!(
            integer_value(u64::MAX as i128, exact),
            JsonValue::from(u64::MAX)
        );
    }

    #[test]
    fn test_decimal_value() {
        let numbers = DecodeOptions::default();
        let strings = DecodeOptions {
            decimal_numbers: false,
            ..numbers
        };
        assert_eq!(decimal_value("12.50".to_string(), numbers), JsonValue::from(12.5));
        assert_eq!(
            decimal_value("12.50".to_string(), strings),
            JsonValue::String("12.50".to_string())
        );
    }

    #[test]
    fn test_encode_binary_value() {
        assert_eq!(
            encode_binary_value(b"hello world"),
            JsonValue::String("aGVsbG8gd29ybGQ=".to_string())
        );
        assert_eq!(
            encode_binary_value(&[0xFF, 0xFE, 0x00, 0x01]),
            JsonValue::String("//4AAQ==".to_string())
        );
    }

    #[test]
    fn test_decode_options_from_mysql_options() {
        let options = MysqlOptions {
            decimal_numbers: false,
            ..MysqlOptions::default()
        };
        let decode = DecodeOptions::from(&options);
        assert!(!decode.decimal_numbers);
        assert!(decode.support_big_numbers);
    }
}
