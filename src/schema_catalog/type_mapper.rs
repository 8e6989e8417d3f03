//! Column-type to GraphQL-scalar mapping and default-value literal encoding.
//!
//! `scalar_name` and `encode_default` are total over the closed
//! [`ColumnType`]/[`DefaultValue`] enums; the only fallible boundary is
//! [`parse_clickhouse_type`], which turns external type strings into the
//! closed set and rejects anything it does not know.

use async_graphql::Value;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Number;

use super::errors::SchemaBuildError;
use super::metadata::{ColumnType, DefaultValue};

/// GraphQL scalar name for a column type. Pure and deterministic; the same
/// input always yields the same name.
pub fn scalar_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::TinyInt => "Byte",
        ColumnType::SmallInt => "Short",
        ColumnType::Int => "Int",
        ColumnType::BigInt => "Long",
        ColumnType::Single => "Single",
        ColumnType::Double => "Float",
        ColumnType::Decimal => "Decimal",
        ColumnType::Text => "String",
        ColumnType::Boolean => "Boolean",
        ColumnType::DateTime => "DateTime",
        ColumnType::Bytes => "ByteArray",
        ColumnType::Uuid => "UUID",
    }
}

/// Encode a typed default as the GraphQL literal matching its scalar.
///
/// Decimals keep their full precision by encoding as text; `serde_json`
/// numbers cannot carry arbitrary precision. Byte arrays become base64 text.
pub fn encode_default(column: &str, value: &DefaultValue) -> Result<Value, SchemaBuildError> {
    let literal = match value {
        DefaultValue::TinyInt(v) => Value::Number(Number::from(i64::from(*v))),
        DefaultValue::SmallInt(v) => Value::Number(Number::from(i64::from(*v))),
        DefaultValue::Int(v) => Value::Number(Number::from(i64::from(*v))),
        DefaultValue::BigInt(v) => Value::Number(Number::from(*v)),
        DefaultValue::Single(v) => float_literal(column, f64::from(*v))?,
        DefaultValue::Double(v) => float_literal(column, *v)?,
        DefaultValue::Decimal(v) => Value::String(v.to_string()),
        DefaultValue::Text(v) => Value::String(v.clone()),
        DefaultValue::Boolean(v) => Value::Boolean(*v),
        DefaultValue::DateTime(v) => Value::String(v.to_rfc3339()),
        DefaultValue::Bytes(v) => Value::String(BASE64.encode(v)),
        DefaultValue::Uuid(v) => Value::String(v.to_string()),
    };
    Ok(literal)
}

fn float_literal(column: &str, value: f64) -> Result<Value, SchemaBuildError> {
    Number::from_f64(value).map(Value::Number).ok_or_else(|| {
        SchemaBuildError::UnsupportedDefaultValueMapping {
            column: column.to_string(),
            reason: format!("non-finite float `{value}` has no literal form"),
        }
    })
}

/// A parsed external column type: the closed primitive plus whether the
/// backend wrapped it in `Nullable(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedColumnType {
    pub column_type: ColumnType,
    pub nullable: bool,
}

/// Map a ClickHouse type string onto the closed column-type set.
///
/// `Nullable(T)` and `LowCardinality(T)` wrappers are unwrapped; parameterized
/// types (`Decimal(18, 4)`, `DateTime64(3)`, `FixedString(16)`) match on their
/// base name. Unknown types are a hard error naming the offending type.
pub fn parse_clickhouse_type(column: &str, raw: &str) -> Result<ParsedColumnType, SchemaBuildError> {
    let trimmed = raw.trim();

    if let Some(inner) = unwrap_modifier(trimmed, "Nullable") {
        let parsed = parse_clickhouse_type(column, inner)?;
        return Ok(ParsedColumnType {
            nullable: true,
            ..parsed
        });
    }
    if let Some(inner) = unwrap_modifier(trimmed, "LowCardinality") {
        return parse_clickhouse_type(column, inner);
    }

    let base = trimmed.split('(').next().unwrap_or(trimmed);
    let column_type = match base {
        "Int8" | "UInt8" => ColumnType::TinyInt,
        "Int16" | "UInt16" => ColumnType::SmallInt,
        "Int32" | "UInt32" => ColumnType::Int,
        "Int64" | "UInt64" => ColumnType::BigInt,
        "Float32" => ColumnType::Single,
        "Float64" => ColumnType::Double,
        "Decimal" | "Decimal32" | "Decimal64" | "Decimal128" => ColumnType::Decimal,
        "String" | "FixedString" => ColumnType::Text,
        "Bool" => ColumnType::Boolean,
        "Date" | "Date32" | "DateTime" | "DateTime64" => ColumnType::DateTime,
        "UUID" => ColumnType::Uuid,
        _ => {
            return Err(SchemaBuildError::UnsupportedTypeMapping {
                column: column.to_string(),
                column_type: raw.to_string(),
            })
        }
    };

    Ok(ParsedColumnType {
        column_type,
        nullable: false,
    })
}

fn unwrap_modifier<'a>(raw: &'a str, modifier: &str) -> Option<&'a str> {
    raw.strip_prefix(modifier)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use test_case::test_case;

    #[test_case(ColumnType::TinyInt, "Byte")]
    #[test_case(ColumnType::SmallInt, "Short")]
    #[test_case(ColumnType::Int, "Int")]
    #[test_case(ColumnType::BigInt, "Long")]
    #[test_case(ColumnType::Single, "Single")]
    #[test_case(ColumnType::Double, "Float")]
    #[test_case(ColumnType::Decimal, "Decimal")]
    #[test_case(ColumnType::Text, "String")]
    #[test_case(ColumnType::Boolean, "Boolean")]
    #[test_case(ColumnType::DateTime, "DateTime")]
    #[test_case(ColumnType::Bytes, "ByteArray")]
    #[test_case(ColumnType::Uuid, "UUID")]
    fn every_column_type_has_a_scalar(column_type: ColumnType, expected: &str) {
        assert_eq!(scalar_name(column_type), expected);
        // Pure: repeated calls agree.
        assert_eq!(scalar_name(column_type), scalar_name(column_type));
    }

    #[test_case("Int32", ColumnType::Int, false)]
    #[test_case("UInt64", ColumnType::BigInt, false)]
    #[test_case("Nullable(String)", ColumnType::Text, true)]
    #[test_case("Nullable(DateTime64(3))", ColumnType::DateTime, true)]
    #[test_case("LowCardinality(String)", ColumnType::Text, false)]
    #[test_case("LowCardinality(Nullable(String))", ColumnType::Text, true)]
    #[test_case("Decimal(18, 4)", ColumnType::Decimal, false)]
    #[test_case("FixedString(16)", ColumnType::Text, false)]
    #[test_case("Bool", ColumnType::Boolean, false)]
    #[test_case("UUID", ColumnType::Uuid, false)]
    fn clickhouse_type_strings_parse(raw: &str, expected: ColumnType, nullable: bool) {
        let parsed = parse_clickhouse_type("c", raw).expect("supported type");
        assert_eq!(parsed.column_type, expected);
        assert_eq!(parsed.nullable, nullable);
    }

    #[test_case("Array(String)")]
    #[test_case("Map(String, UInt64)")]
    #[test_case("IPv4")]
    #[test_case("Tuple(UInt8, String)")]
    fn unknown_types_are_rejected(raw: &str) {
        let err = parse_clickhouse_type("payload", raw).unwrap_err();
        assert_eq!(
            err,
            SchemaBuildError::UnsupportedTypeMapping {
                column: "payload".to_string(),
                column_type: raw.to_string(),
            }
        );
    }

    #[test]
    fn integer_defaults_encode_as_numbers() {
        let literal = encode_default("n", &DefaultValue::Int(42)).unwrap();
        assert_eq!(literal, Value::Number(Number::from(42)));

        let literal = encode_default("n", &DefaultValue::BigInt(-7)).unwrap();
        assert_eq!(literal, Value::Number(Number::from(-7)));
    }

    #[test]
    fn decimal_default_keeps_full_precision_as_text() {
        let value = DefaultValue::Decimal(Decimal::new(123456789012345678, 9));
        let literal = encode_default("price", &value).unwrap();
        assert_eq!(literal, Value::String("123456789.012345678".to_string()));
    }

    #[test]
    fn bytes_default_is_base64() {
        let literal = encode_default("blob", &DefaultValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]))
            .unwrap();
        assert_eq!(literal, Value::String("3q2+7w==".to_string()));
    }

    #[test]
    fn datetime_default_is_rfc3339() {
        let when = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let literal = encode_default("created", &DefaultValue::DateTime(when)).unwrap();
        assert_eq!(literal, Value::String("2024-03-01T12:30:00+00:00".to_string()));
    }

    #[test]
    fn non_finite_float_default_is_rejected() {
        let err = encode_default("ratio", &DefaultValue::Double(f64::NAN)).unwrap_err();
        assert!(matches!(
            err,
            SchemaBuildError::UnsupportedDefaultValueMapping { .. }
        ));
    }
}
