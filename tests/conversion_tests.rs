// tests/conversion_tests.rs

use std::fmt;

use chrono::{TimeDelta, TimeZone, Utc};
use hyperlambda::types::{format_date, parse_date, time_from_ticks, time_to_ticks};
use hyperlambda::{HyperlambdaError, Lambda, TypeRegistry, Value};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use uuid::Uuid;

fn to_object(raw: &str, tag: &str) -> hyperlambda::Result<Value> {
    let registry = TypeRegistry::new();
    let mut lambda = Lambda::new();
    registry.to_object(raw, tag, &mut lambda)
}

fn to_string(value: &Value) -> (String, String) {
    let registry = TypeRegistry::new();
    registry.to_string(value, &Lambda::new()).unwrap()
}

fn pair(tag: &str, text: &str) -> (String, String) {
    (tag.to_string(), text.to_string())
}

// ============================================================================
// Built-in scalars
// ============================================================================

#[test]
fn test_integers() {
    assert_eq!(to_object("-5", "short").unwrap(), Value::Short(-5));
    assert_eq!(to_object("5", "ushort").unwrap(), Value::UShort(5));
    assert_eq!(to_object("5", "int").unwrap(), Value::Int(5));
    assert_eq!(to_object("5", "uint").unwrap(), Value::UInt(5));
    assert_eq!(to_object("-5", "long").unwrap(), Value::Long(-5));
    assert_eq!(to_object("5", "ulong").unwrap(), Value::ULong(5));
    assert_eq!(to_object("255", "byte").unwrap(), Value::Byte(255));

    assert_eq!(to_string(&Value::Int(5)), pair("int", "5"));
    assert_eq!(to_string(&Value::ULong(5)), pair("ulong", "5"));
    assert_eq!(to_string(&Value::Byte(7)), pair("byte", "7"));
}

#[test]
fn test_integer_out_of_range() {
    assert!(matches!(
        to_object("256", "byte"),
        Err(HyperlambdaError::InvalidValue { .. })
    ));
    assert!(matches!(
        to_object("-1", "uint"),
        Err(HyperlambdaError::InvalidValue { .. })
    ));
}

#[test]
fn test_bool() {
    assert_eq!(to_object("true", "bool").unwrap(), Value::Bool(true));
    assert_eq!(to_object("false", "bool").unwrap(), Value::Bool(false));
    assert_eq!(to_object("yes", "bool").unwrap(), Value::Bool(false));
    assert_eq!(to_string(&Value::Bool(true)), pair("bool", "true"));
}

#[test]
fn test_decimal_keeps_scale() {
    assert_eq!(to_object("7", "decimal").unwrap(), Value::Decimal(Decimal::from(7)));
    assert_eq!(to_string(&Value::Decimal(Decimal::new(750, 2))), pair("decimal", "7.50"));
}

#[test]
fn test_floating_point() {
    assert_eq!(to_object("3.5", "double").unwrap(), Value::Double(3.5));
    assert_eq!(to_object("3.5", "float").unwrap(), Value::Float(3.5));
    assert_eq!(to_string(&Value::Double(0.1)), pair("double", "0.1"));
}

#[test]
fn test_single_is_float() {
    let value = to_object("3.5", "single").unwrap();
    assert_eq!(value, Value::Float(3.5));
    assert_eq!(to_string(&value), pair("float", "3.5"));
}

#[test]
fn test_char() {
    assert_eq!(to_object("x", "char").unwrap(), Value::Char('x'));
    assert!(to_object("xy", "char").is_err());
    assert!(to_object("", "char").is_err());
    assert_eq!(to_string(&Value::Char('x')), pair("char", "x"));
}

#[test]
fn test_string() {
    assert_eq!(to_object("howdy", "string").unwrap(), Value::from("howdy"));
    assert_eq!(to_string(&Value::from("howdy")), pair("string", "howdy"));
}

#[test]
fn test_bytes_are_base64() {
    assert_eq!(to_object("aGVsbG8=", "bytes").unwrap(), Value::Bytes(b"hello".to_vec()));
    assert_eq!(to_string(&Value::Bytes(b"hello".to_vec())), pair("bytes", "aGVsbG8="));
    assert!(matches!(
        to_object("not base64!", "bytes"),
        Err(HyperlambdaError::InvalidValue { .. })
    ));
}

// ============================================================================
// Dates, times and guids
// ============================================================================

#[test]
fn test_date_canonical_form() {
    let value = to_object("2020-12-23T23:59:11.000Z", "date").unwrap();
    let expected = Utc.with_ymd_and_hms(2020, 12, 23, 23, 59, 11).unwrap();
    assert_eq!(value, Value::Date(expected));
    assert_eq!(to_string(&value), pair("date", "2020-12-23T23:59:11.000Z"));
}

#[test]
fn test_date_short_forms() {
    let check = |raw: &str, expected: &str| {
        assert_eq!(format_date(&parse_date(raw).unwrap()), expected, "parsing {raw}");
    };
    check("2020-12-23", "2020-12-23T00:00:00.000Z");
    check("2020-12-23T23:59", "2020-12-23T23:59:00.000Z");
    check("2020-12-23T23:59:11", "2020-12-23T23:59:11.000Z");
    check("2020-12-23T23:59:11.123Z", "2020-12-23T23:59:11.123Z");
    check("2020-12-23T23:59:11+02:00", "2020-12-23T21:59:11.000Z");
}

#[test]
fn test_date_invalid() {
    assert!(matches!(
        to_object("yesterday", "date"),
        Err(HyperlambdaError::InvalidValue { .. })
    ));
}

#[test]
fn test_time_is_ticks() {
    let value = to_object("2000", "time").unwrap();
    assert_eq!(value, Value::Time(TimeDelta::microseconds(200)));
    assert_eq!(to_string(&value), pair("time", "2000"));
}

#[test]
fn test_ticks_conversion() {
    let delta = TimeDelta::seconds(90) + TimeDelta::nanoseconds(500);
    let ticks = time_to_ticks(&delta);
    assert_eq!(ticks, 900_000_005);
    assert_eq!(time_from_ticks(ticks), Some(delta));
}

#[test]
fn test_ticks_saturate_out_of_range() {
    assert_eq!(time_to_ticks(&TimeDelta::MAX), i64::MAX);
    assert_eq!(time_to_ticks(&TimeDelta::MIN), i64::MIN);
    assert_eq!(to_string(&Value::Time(TimeDelta::MAX)), pair("time", &i64::MAX.to_string()));

    let registry = TypeRegistry::new();
    let mut lambda = Lambda::new();
    let foo = lambda.create("foo", Some(Value::Time(TimeDelta::MIN)));
    lambda.add(lambda.root(), foo);
    let output = hyperlambda::HyperlambdaPrinter::new(&lambda, &registry).print();
    assert_eq!(output, format!("foo:time:{}\r\n", i64::MIN));
}

#[test]
fn test_guid() {
    let value = to_object("00000000-0000-0000-0000-000000000000", "guid").unwrap();
    assert_eq!(value, Value::Guid(Uuid::nil()));
    assert_eq!(to_string(&value), pair("guid", "00000000-0000-0000-0000-000000000000"));
    assert!(to_object("not-a-guid", "guid").is_err());
}

// ============================================================================
// Expressions and nodes
// ============================================================================

#[test]
fn test_expression() {
    let value = to_object("foo/bar", "x").unwrap();
    assert!(value.as_expression().is_some());
    assert_eq!(to_string(&value), pair("x", "foo/bar"));
    assert!(matches!(
        to_object("foo/{x}", "x"),
        Err(HyperlambdaError::InvalidIterator(_))
    ));
}

#[test]
fn test_node_value_prints_its_children() {
    let registry = TypeRegistry::new();
    let mut lambda = Lambda::new();
    let howdy1 = lambda.create("howdy1", Some(Value::Int(5)));
    let howdy2 = lambda.create("howdy2", Some(Value::Decimal(Decimal::from(7))));
    let foo = lambda.create_with_children("foo", None, [howdy1, howdy2]);
    let container = lambda.create_with_children("", None, [foo]);

    assert_eq!(
        registry.to_string(&Value::Node(container), &lambda).unwrap(),
        pair("node", "foo\r\n   howdy1:int:5\r\n   howdy2:decimal:7\r\n")
    );
}

#[test]
fn test_node_literal_parses_into_arena() {
    let registry = TypeRegistry::new();
    let mut lambda = Lambda::new();
    let value = registry.to_object("foo\n   bar:int:2", "node", &mut lambda).unwrap();
    let container = value.as_node().unwrap();
    let foo = lambda.children(container)[0];
    assert_eq!(lambda.name(foo), "foo");
    assert_eq!(lambda.get::<i32>(lambda.children(foo)[0]).unwrap(), 2);
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_unknown_tag() {
    assert_eq!(
        to_object("5", "integer").unwrap_err(),
        HyperlambdaError::UnknownType("integer".to_string())
    );
}

#[test]
fn test_malformed_literal_reports_tag() {
    match to_object("five", "int") {
        Err(HyperlambdaError::InvalidValue { tag, value, .. }) => {
            assert_eq!(tag, "int");
            assert_eq!(value, "five");
        }
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[test]
fn test_types_listing() {
    let registry = TypeRegistry::new();
    let types = registry.types();
    for tag in ["bool", "date", "int", "node", "single", "string", "x"] {
        assert!(types.contains(&tag.to_string()), "missing {tag}");
    }
    let mut sorted = types.clone();
    sorted.sort();
    assert_eq!(types, sorted);
    assert!(registry.has_tag("guid"));
    assert!(!registry.has_tag("integer"));
}

#[derive(Debug, Clone, PartialEq)]
struct Foo {
    value1: i32,
    value2: String,
}

impl fmt::Display for Foo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.value1, self.value2)
    }
}

fn parse_foo(raw: &str) -> Result<Foo, String> {
    let (value1, value2) = raw.split_once(',').ok_or("expected two fields")?;
    Ok(Foo {
        value1: value1.parse().map_err(|e| format!("{e}"))?,
        value2: value2.to_string(),
    })
}

#[test]
fn test_custom_type() {
    let registry = TypeRegistry::new();
    registry.register_type::<Foo>("foo", |foo| foo.to_string(), parse_foo);
    let mut lambda = Lambda::new();

    let value = registry.to_object("5,Howdy World", "foo", &mut lambda).unwrap();
    assert_eq!(
        value.downcast_ref::<Foo>(),
        Some(&Foo {
            value1: 5,
            value2: "Howdy World".to_string()
        })
    );
    assert_eq!(registry.to_string(&value, &lambda).unwrap(), pair("foo", "5,Howdy World"));
    assert!(matches!(
        registry.to_object("Howdy", "foo", &mut lambda),
        Err(HyperlambdaError::InvalidValue { .. })
    ));
}

#[test]
fn test_custom_type_in_document() {
    let registry = TypeRegistry::new();
    registry.register_type::<Foo>("foo", |foo| foo.to_string(), parse_foo);
    let lambda = hyperlambda::Parser::new(&registry)
        .parse("bar:foo:\"5,Howdy World\"")
        .unwrap();
    let output = hyperlambda::HyperlambdaPrinter::new(&lambda, &registry).print();
    assert_eq!(output, "bar:foo:5,Howdy World\r\n");
}

#[derive(Debug)]
struct Unregistered(u8);

impl fmt::Display for Unregistered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

#[test]
fn test_unregistered_type_falls_back() {
    let (tag, text) = to_string(&Value::custom(Unregistered(3)));
    assert!(tag.starts_with('['), "tag was {tag}");
    assert!(tag.ends_with("Unregistered]"), "tag was {tag}");
    assert_eq!(text, "u3");
}

#[test]
fn test_strict_registry_refuses_unregistered_type() {
    let registry = TypeRegistry::strict();
    assert!(registry.is_strict());
    let result = registry.to_string(&Value::custom(Unregistered(3)), &Lambda::new());
    assert!(matches!(result, Err(HyperlambdaError::UnknownType(_))));

    // Registered types are unaffected
    assert_eq!(
        registry.to_string(&Value::Int(1), &Lambda::new()).unwrap(),
        pair("int", "1")
    );
}

#[test]
fn test_registration_is_per_registry() {
    let first = TypeRegistry::new();
    let second = TypeRegistry::new();
    first.register_type::<Foo>("foo", |foo| foo.to_string(), parse_foo);
    assert!(first.has_tag("foo"));
    assert!(!second.has_tag("foo"));
}

#[test]
fn test_value_accessors() {
    assert_eq!(Value::from("howdy").as_str(), Some("howdy"));
    assert_eq!(Value::Int(5).as_str(), None);
    assert_eq!(Value::Int(5).tag_hint(), "int");
    assert_eq!(Value::Decimal(Decimal::new(15, 1)).builtin_string(), Some("1.5".to_string()));
    assert_eq!(Value::Node(Lambda::new().root()).builtin_string(), None);
}
