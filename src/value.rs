use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use uuid::Uuid;

use crate::{
    ast::Expression,
    error::{HyperlambdaError, Result},
    node::NodeId,
    types,
};

/// A value of a type the built-in tables know nothing about.
///
/// Anything `Debug + Display + Send + Sync + 'static` qualifies through the
/// blanket impl. The `Display` form is what gets written when no converter has
/// been registered for the type.
pub trait CustomValue: Any + Send + Sync + fmt::Debug + fmt::Display {
    fn as_any(&self) -> &dyn Any;

    /// Fully qualified Rust type name, used for the bracketed fallback tag
    fn type_name(&self) -> &'static str;

    fn value_type_id(&self) -> TypeId;
}

impl<T: Any + Send + Sync + fmt::Debug + fmt::Display> CustomValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }
}

/// The value a node may carry.
///
/// A node without a value stores `None` rather than a `Value`, so there is no
/// null variant here. Every variant except `Custom` has a built-in type tag
/// (see [`crate::types`]).
///
/// # Examples
///
/// ```
/// use hyperlambda::Value;
///
/// let five = Value::Int(5);
/// let text = Value::from("howdy");
/// assert_eq!(five.tag_hint(), "int");
/// assert_eq!(text, Value::String("howdy".to_string()));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bool(bool),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Decimal(Decimal),
    Double(f64),
    Float(f32),
    Char(char),
    Byte(u8),
    Bytes(Vec<u8>),
    /// Always UTC
    Date(DateTime<Utc>),
    /// Serialized as 100 nanosecond ticks
    Time(TimeDelta),
    Guid(Uuid),
    /// Compiled expression, tag `x`
    Expression(Expression),
    /// Nested tree living in the same arena, tag `node`
    Node(NodeId),
    Custom(Arc<dyn CustomValue>),
}

impl Value {
    pub fn custom<T: CustomValue>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// `TypeId` of the native payload; the key of the registry's to-string table.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::String(_) => TypeId::of::<String>(),
            Value::Bool(_) => TypeId::of::<bool>(),
            Value::Short(_) => TypeId::of::<i16>(),
            Value::UShort(_) => TypeId::of::<u16>(),
            Value::Int(_) => TypeId::of::<i32>(),
            Value::UInt(_) => TypeId::of::<u32>(),
            Value::Long(_) => TypeId::of::<i64>(),
            Value::ULong(_) => TypeId::of::<u64>(),
            Value::Decimal(_) => TypeId::of::<Decimal>(),
            Value::Double(_) => TypeId::of::<f64>(),
            Value::Float(_) => TypeId::of::<f32>(),
            Value::Char(_) => TypeId::of::<char>(),
            Value::Byte(_) => TypeId::of::<u8>(),
            Value::Bytes(_) => TypeId::of::<Vec<u8>>(),
            Value::Date(_) => TypeId::of::<DateTime<Utc>>(),
            Value::Time(_) => TypeId::of::<TimeDelta>(),
            Value::Guid(_) => TypeId::of::<Uuid>(),
            Value::Expression(_) => TypeId::of::<Expression>(),
            Value::Node(_) => TypeId::of::<NodeId>(),
            Value::Custom(custom) => (**custom).value_type_id(),
        }
    }

    /// Fully qualified name of the native payload type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => std::any::type_name::<String>(),
            Value::Bool(_) => std::any::type_name::<bool>(),
            Value::Short(_) => std::any::type_name::<i16>(),
            Value::UShort(_) => std::any::type_name::<u16>(),
            Value::Int(_) => std::any::type_name::<i32>(),
            Value::UInt(_) => std::any::type_name::<u32>(),
            Value::Long(_) => std::any::type_name::<i64>(),
            Value::ULong(_) => std::any::type_name::<u64>(),
            Value::Decimal(_) => std::any::type_name::<Decimal>(),
            Value::Double(_) => std::any::type_name::<f64>(),
            Value::Float(_) => std::any::type_name::<f32>(),
            Value::Char(_) => std::any::type_name::<char>(),
            Value::Byte(_) => std::any::type_name::<u8>(),
            Value::Bytes(_) => std::any::type_name::<Vec<u8>>(),
            Value::Date(_) => std::any::type_name::<DateTime<Utc>>(),
            Value::Time(_) => std::any::type_name::<TimeDelta>(),
            Value::Guid(_) => std::any::type_name::<Uuid>(),
            Value::Expression(_) => std::any::type_name::<Expression>(),
            Value::Node(_) => std::any::type_name::<NodeId>(),
            Value::Custom(custom) => (**custom).type_name(),
        }
    }

    /// The built-in tag for this kind of value, used in error messages.
    ///
    /// Custom values report `"custom"`; their real tag lives in the registry.
    pub fn tag_hint(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Short(_) => "short",
            Value::UShort(_) => "ushort",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Long(_) => "long",
            Value::ULong(_) => "ulong",
            Value::Decimal(_) => "decimal",
            Value::Double(_) => "double",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Byte(_) => "byte",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Guid(_) => "guid",
            Value::Expression(_) => "x",
            Value::Node(_) => "node",
            Value::Custom(_) => "custom",
        }
    }

    /// String form of a scalar, without consulting any registry.
    ///
    /// Returns `None` for nested trees, which need their arena to print.
    pub fn builtin_string(&self) -> Option<String> {
        let result = match self {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Short(n) => n.to_string(),
            Value::UShort(n) => n.to_string(),
            Value::Int(n) => n.to_string(),
            Value::UInt(n) => n.to_string(),
            Value::Long(n) => n.to_string(),
            Value::ULong(n) => n.to_string(),
            Value::Decimal(n) => n.to_string(),
            Value::Double(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Byte(n) => n.to_string(),
            Value::Bytes(bytes) => STANDARD.encode(bytes),
            Value::Date(date) => types::format_date(date),
            Value::Time(delta) => types::time_to_ticks(delta).to_string(),
            Value::Guid(guid) => guid.hyphenated().to_string(),
            Value::Expression(expr) => expr.to_string(),
            Value::Custom(custom) => custom.to_string(),
            Value::Node(_) => return None,
        };
        Some(result)
    }

    /// Like [`Value::builtin_string`], with the debug form for nested trees.
    pub(crate) fn to_string_lossy(&self) -> String {
        self.builtin_string().unwrap_or_else(|| format!("{self:?}"))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Value::Expression(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    /// Borrow the payload of a custom value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(custom) => (**custom).as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Numeric payload widened to `i128`, for range checked integer reads
    fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Short(n) => Some(*n as i128),
            Value::UShort(n) => Some(*n as i128),
            Value::Int(n) => Some(*n as i128),
            Value::UInt(n) => Some(*n as i128),
            Value::Long(n) => Some(*n as i128),
            Value::ULong(n) => Some(*n as i128),
            Value::Byte(n) => Some(*n as i128),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i128(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            Value::Float(n) => Some(*n as f64),
            Value::Decimal(d) => d.to_f64(),
            other => other.as_i128().map(|n| n as f64),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (UShort(a), UShort(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (ULong(a), ULong(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Guid(a), Guid(b)) => a == b,
            (Expression(a), Expression(b)) => a == b,
            (Node(a), Node(b)) => a == b,
            (Custom(a), Custom(b)) => {
                (**a).value_type_id() == (**b).value_type_id() && a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    String => String,
    bool => Bool,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    u64 => ULong,
    Decimal => Decimal,
    f64 => Double,
    f32 => Float,
    char => Char,
    u8 => Byte,
    Vec<u8> => Bytes,
    DateTime<Utc> => Date,
    TimeDelta => Time,
    Uuid => Guid,
    Expression => Expression,
    NodeId => Node,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Coercion from a node's value into a native Rust type.
///
/// This is the `get::<T>()` side of a node: it never evaluates expressions.
/// Reading a missing value fails unless `T` is an `Option`.
pub trait FromValue: Sized {
    const NAME: &'static str;

    fn from_value(value: &Value) -> Result<Self>;

    fn from_null() -> Result<Self> {
        Err(HyperlambdaError::TypeMismatch {
            expected: Self::NAME,
            found: "null".to_string(),
        })
    }
}

fn mismatch<T: FromValue>(value: &Value) -> HyperlambdaError {
    HyperlambdaError::TypeMismatch {
        expected: T::NAME,
        found: value.tag_hint().to_string(),
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const NAME: &'static str = T::NAME;

    fn from_value(value: &Value) -> Result<Self> {
        T::from_value(value).map(Some)
    }

    fn from_null() -> Result<Self> {
        Ok(None)
    }
}

impl FromValue for Value {
    const NAME: &'static str = "value";

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    const NAME: &'static str = "string";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => {
                std::string::String::from_utf8(bytes.clone()).map_err(|_| mismatch::<Self>(value))
            }
            other => other.builtin_string().ok_or_else(|| mismatch::<Self>(value)),
        }
    }
}

impl FromValue for bool {
    const NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

macro_rules! integer_from_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const NAME: &'static str = $name;

                fn from_value(value: &Value) -> Result<Self> {
                    if let Value::String(s) = value {
                        return s.trim().parse::<$ty>().map_err(|_| mismatch::<Self>(value));
                    }
                    value
                        .as_i128()
                        .and_then(|n| <$ty>::try_from(n).ok())
                        .ok_or_else(|| mismatch::<Self>(value))
                }
            }
        )*
    };
}

integer_from_value! {
    i16 => "short",
    u16 => "ushort",
    i32 => "int",
    u32 => "uint",
    i64 => "long",
    u64 => "ulong",
    u8 => "byte",
    usize => "usize",
}

impl FromValue for f64 {
    const NAME: &'static str = "double";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => s.trim().parse().map_err(|_| mismatch::<Self>(value)),
            other => other.as_f64().ok_or_else(|| mismatch::<Self>(value)),
        }
    }
}

impl FromValue for f32 {
    const NAME: &'static str = "float";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(n) => Ok(*n),
            other => f64::from_value(other).map(|n| n as f32).map_err(|_| mismatch::<Self>(value)),
        }
    }
}

impl FromValue for Decimal {
    const NAME: &'static str = "decimal";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Decimal(d) => Ok(*d),
            Value::String(s) => s.trim().parse().map_err(|_| mismatch::<Self>(value)),
            Value::Double(n) => Decimal::from_f64(*n).ok_or_else(|| mismatch::<Self>(value)),
            Value::Float(n) => Decimal::from_f32(*n).ok_or_else(|| mismatch::<Self>(value)),
            other => other
                .as_i128()
                .and_then(Decimal::from_i128)
                .ok_or_else(|| mismatch::<Self>(value)),
        }
    }
}

impl FromValue for char {
    const NAME: &'static str = "char";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Char(c) => Ok(*c),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(mismatch::<Self>(value)),
                }
            }
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromValue for Vec<u8> {
    const NAME: &'static str = "bytes";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const NAME: &'static str = "date";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Date(date) => Ok(*date),
            Value::String(s) => types::parse_date(s),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromValue for TimeDelta {
    const NAME: &'static str = "time";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Time(delta) => Ok(*delta),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromValue for Uuid {
    const NAME: &'static str = "guid";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Guid(guid) => Ok(*guid),
            Value::String(s) => Uuid::parse_str(s.trim()).map_err(|_| mismatch::<Self>(value)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromValue for Expression {
    const NAME: &'static str = "x";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Expression(expr) => Ok(expr.clone()),
            Value::String(s) => s.parse(),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromValue for NodeId {
    const NAME: &'static str = "node";

    fn from_value(value: &Value) -> Result<Self> {
        value.as_node().ok_or_else(|| mismatch::<Self>(value))
    }
}
