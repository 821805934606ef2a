//! Conversions between type tagged strings and native values.
//!
//! Reading Hyperlambda goes through the `to_object` table (tag to value),
//! writing it goes through the `to_string` table (runtime type to tag and
//! string). Both tables start out with the built-in types and accept new
//! entries at runtime.
//!
//! # Built-in tags
//!
//! | Tag | Value |
//! |---|---|
//! | `string` | [`Value::String`] |
//! | `bool` | [`Value::Bool`], `"true"` is true and anything else false |
//! | `short`, `ushort`, `int`, `uint`, `long`, `ulong`, `byte` | integers |
//! | `decimal`, `double`, `float` (`single` on read) | numbers |
//! | `char` | [`Value::Char`] |
//! | `bytes` | [`Value::Bytes`], base64 |
//! | `date` | [`Value::Date`], `yyyy-MM-ddTHH:mm:ss.fffZ` |
//! | `time` | [`Value::Time`], 100 nanosecond ticks |
//! | `guid` | [`Value::Guid`] |
//! | `x` | [`Value::Expression`] |
//! | `node` | [`Value::Node`], nested Hyperlambda |

use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    ast::Expression,
    error::{HyperlambdaError, Result},
    node::{Lambda, NodeId},
    output::HyperlambdaPrinter,
    parser,
    sync::Synchronizer,
    value::{CustomValue, Value},
};

/// Builds a value from the string form found after a type tag.
///
/// Gets the arena so `node` literals can put their nodes somewhere, and the
/// registry so nested literals convert their own typed values.
pub type ToObjectFn = Arc<dyn Fn(&str, &mut Lambda, &TypeRegistry) -> Result<Value> + Send + Sync>;

/// Renders a value as the string written after its type tag.
pub type ToStringFn = Arc<dyn Fn(&Value, &Lambda, &TypeRegistry) -> String + Send + Sync>;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const TICKS_PER_SECOND: i64 = 10_000_000;

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

#[derive(Default)]
struct Tables {
    to_object: HashMap<String, ToObjectFn>,
    to_string: HashMap<TypeId, (String, ToStringFn)>,
}

/// The two conversion tables, behind a reader/writer lock.
///
/// Converter functions are cloned out of the lock before they run, so a
/// converter may itself use the registry (nested `node` literals do).
pub struct TypeRegistry {
    tables: Synchronizer<Tables>,
    strict: bool,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types())
            .field("strict", &self.strict)
            .finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry with every built-in type.
    pub fn new() -> Self {
        let registry = TypeRegistry {
            tables: Synchronizer::new(Tables::default()),
            strict: false,
        };
        registry.register_builtins();
        registry
    }

    /// Like [`TypeRegistry::new`], but [`TypeRegistry::to_string`] refuses
    /// values of unregistered types instead of falling back to a bracketed tag.
    pub fn strict() -> Self {
        TypeRegistry {
            strict: true,
            ..Self::new()
        }
    }

    /// Process wide registry, for callers that do not want to pass one around.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Register a conversion pair for the runtime type `type_id` under `tag`.
    ///
    /// Replaces whatever was registered before for either key.
    pub fn register(&self, type_id: TypeId, tag: impl Into<String>, to_string: ToStringFn, to_object: ToObjectFn) {
        let tag = tag.into();
        debug!(tag = %tag, "registering type");
        self.tables.write(|tables| {
            tables.to_object.insert(tag.clone(), to_object);
            tables.to_string.insert(type_id, (tag, to_string));
        });
    }

    /// Register a custom type `T`, stored as [`Value::Custom`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hyperlambda::{Lambda, TypeRegistry, Value};
    ///
    /// #[derive(Debug, Clone, PartialEq)]
    /// struct Celsius(i32);
    ///
    /// impl std::fmt::Display for Celsius {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         write!(f, "{}C", self.0)
    ///     }
    /// }
    ///
    /// let registry = TypeRegistry::new();
    /// registry.register_type::<Celsius>(
    ///     "celsius",
    ///     |c| c.0.to_string(),
    ///     |raw| raw.parse().map(Celsius).map_err(|e| e.to_string()),
    /// );
    ///
    /// let mut lambda = Lambda::new();
    /// let value = registry.to_object("21", "celsius", &mut lambda).unwrap();
    /// assert_eq!(value.downcast_ref::<Celsius>(), Some(&Celsius(21)));
    /// assert_eq!(
    ///     registry.to_string(&value, &lambda).unwrap(),
    ///     ("celsius".to_string(), "21".to_string())
    /// );
    /// ```
    pub fn register_type<T: CustomValue>(
        &self,
        tag: &str,
        to_string: impl Fn(&T) -> String + Send + Sync + 'static,
        to_object: impl Fn(&str) -> std::result::Result<T, String> + Send + Sync + 'static,
    ) {
        let owned_tag = tag.to_string();
        self.register(
            TypeId::of::<T>(),
            tag,
            Arc::new(move |value: &Value, _: &Lambda, _: &TypeRegistry| match value.downcast_ref::<T>() {
                Some(native) => to_string(native),
                None => value.to_string_lossy(),
            }),
            Arc::new(move |raw: &str, _: &mut Lambda, _: &TypeRegistry| {
                to_object(raw)
                    .map(Value::custom)
                    .map_err(|reason| HyperlambdaError::invalid_value(&owned_tag, raw, reason))
            }),
        );
    }

    /// All registered tags, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tables.read(|tables| tables.to_object.keys().cloned().collect());
        tags.sort();
        tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tables.read(|tables| tables.to_object.contains_key(tag))
    }

    /// Convert the string form `raw` of a `tag` typed literal into a value.
    pub fn to_object(&self, raw: &str, tag: &str, lambda: &mut Lambda) -> Result<Value> {
        let converter = self.tables.read(|tables| tables.to_object.get(tag).cloned());
        match converter {
            Some(convert) => convert(raw, lambda, self),
            None => Err(HyperlambdaError::UnknownType(tag.to_string())),
        }
    }

    /// Tag and string form of `value`.
    ///
    /// Values of unregistered types come back as `[type::Name]` and their
    /// `Display` form, unless the registry is strict.
    pub fn to_string(&self, value: &Value, lambda: &Lambda) -> Result<(String, String)> {
        if let Some(found) = self.lookup(value, lambda) {
            return Ok(found);
        }
        if self.strict {
            return Err(HyperlambdaError::UnknownType(value.type_name().to_string()));
        }
        Ok(self.fallback(value))
    }

    /// Tag and string form of `value`, never failing.
    ///
    /// Used by the generator, which writes unregistered types with a
    /// bracketed tag regardless of strictness.
    pub fn describe(&self, value: &Value, lambda: &Lambda) -> (String, String) {
        self.lookup(value, lambda).unwrap_or_else(|| self.fallback(value))
    }

    fn lookup(&self, value: &Value, lambda: &Lambda) -> Option<(String, String)> {
        let entry = self.tables.read(|tables| tables.to_string.get(&value.type_id()).cloned());
        entry.map(|(tag, convert)| (tag, convert(value, lambda, self)))
    }

    fn fallback(&self, value: &Value) -> (String, String) {
        let type_name = value.type_name();
        warn!(type_name, "no converter registered, writing bracketed type");
        (format!("[{type_name}]"), value.to_string_lossy())
    }

    fn register_builtins(&self) {
        fn scalar<T: 'static>(registry: &TypeRegistry, tag: &str, to_object: fn(&str) -> Result<Value>) {
            registry.register(
                TypeId::of::<T>(),
                tag,
                Arc::new(|value: &Value, _: &Lambda, _: &TypeRegistry| value.to_string_lossy()),
                Arc::new(move |raw: &str, _: &mut Lambda, _: &TypeRegistry| to_object(raw)),
            );
        }

        scalar::<String>(self, "string", |raw| Ok(Value::String(raw.to_string())));
        scalar::<bool>(self, "bool", |raw| Ok(Value::Bool(raw == "true")));
        scalar::<i16>(self, "short", |raw| parse_number(raw, "short").map(Value::Short));
        scalar::<u16>(self, "ushort", |raw| parse_number(raw, "ushort").map(Value::UShort));
        scalar::<i32>(self, "int", |raw| parse_number(raw, "int").map(Value::Int));
        scalar::<u32>(self, "uint", |raw| parse_number(raw, "uint").map(Value::UInt));
        scalar::<i64>(self, "long", |raw| parse_number(raw, "long").map(Value::Long));
        scalar::<u64>(self, "ulong", |raw| parse_number(raw, "ulong").map(Value::ULong));
        scalar::<Decimal>(self, "decimal", |raw| parse_number(raw, "decimal").map(Value::Decimal));
        scalar::<f64>(self, "double", |raw| parse_number(raw, "double").map(Value::Double));
        scalar::<f32>(self, "float", |raw| parse_number(raw, "float").map(Value::Float));
        scalar::<u8>(self, "byte", |raw| parse_number(raw, "byte").map(Value::Byte));
        scalar::<char>(self, "char", parse_char);
        scalar::<Vec<u8>>(self, "bytes", |raw| {
            STANDARD
                .decode(raw)
                .map(Value::Bytes)
                .map_err(|e| HyperlambdaError::invalid_value("bytes", raw, e))
        });
        scalar::<DateTime<Utc>>(self, "date", |raw| parse_date(raw).map(Value::Date));
        scalar::<TimeDelta>(self, "time", |raw| {
            let ticks = parse_number::<i64>(raw, "time")?;
            time_from_ticks(ticks)
                .map(Value::Time)
                .ok_or_else(|| HyperlambdaError::invalid_value("time", raw, "out of range"))
        });
        scalar::<Uuid>(self, "guid", |raw| {
            Uuid::parse_str(raw)
                .map(Value::Guid)
                .map_err(|e| HyperlambdaError::invalid_value("guid", raw, e))
        });
        scalar::<Expression>(self, "x", |raw| raw.parse::<Expression>().map(Value::Expression));

        // `single` reads into the same native type as `float`; writing uses `float`
        self.tables.write(|tables| {
            if let Some(float) = tables.to_object.get("float").cloned() {
                tables.to_object.insert("single".to_string(), float);
            }
        });

        self.register(
            TypeId::of::<NodeId>(),
            "node",
            Arc::new(|value: &Value, lambda: &Lambda, registry: &TypeRegistry| match value {
                Value::Node(id) => HyperlambdaPrinter::new(lambda, registry).print_nodes(lambda.children(*id)),
                other => other.to_string_lossy(),
            }),
            Arc::new(|raw: &str, lambda: &mut Lambda, registry: &TypeRegistry| {
                parser::parse_detached(raw, lambda, registry).map(Value::Node)
            }),
        );
    }
}

fn parse_number<T>(raw: &str, tag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| HyperlambdaError::invalid_value(tag, raw, e))
}

fn parse_char(raw: &str) -> Result<Value> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Char(c)),
        _ => Err(HyperlambdaError::invalid_value("char", raw, "expected exactly one character")),
    }
}

/// Date in the canonical `yyyy-MM-ddTHH:mm:ss.fffZ` form.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date literal, normalising to UTC.
///
/// Accepts `yyyy-MM-dd`, `yyyy-MM-ddTHH:mm`, `yyyy-MM-ddTHH:mm:ss`,
/// `yyyy-MM-ddTHH:mm:ss.fffZ` (all read as UTC) and RFC 3339 with an offset.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let naive = match raw.len() {
        10 => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN)),
        16 => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok(),
        19 => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok(),
        24 => NaiveDateTime::parse_from_str(raw, DATE_FORMAT).ok(),
        _ => None,
    };
    if let Some(naive) = naive {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| HyperlambdaError::invalid_value("date", raw, e))
}

/// Length of `delta` in 100 nanosecond ticks.
///
/// Durations beyond the `i64` tick range saturate at `i64::MIN` or `i64::MAX`.
pub fn time_to_ticks(delta: &TimeDelta) -> i64 {
    delta
        .num_seconds()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|ticks| ticks.checked_add(i64::from(delta.subsec_nanos()) / 100))
        .unwrap_or(if *delta < TimeDelta::zero() { i64::MIN } else { i64::MAX })
}

pub fn time_from_ticks(ticks: i64) -> Option<TimeDelta> {
    let seconds = TimeDelta::try_seconds(ticks / TICKS_PER_SECOND)?;
    let rest = TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * 100);
    seconds.checked_add(&rest)
}
