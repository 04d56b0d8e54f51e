use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DalError;

/// Application-level type of a parameter, independent of any engine.
///
/// `Interval`, `List` and `Other` exist so callers can describe values the
/// layer cannot bind; looking them up yields no [`DbType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
    Bool,
    String,
    Char,
    Bytes,
    Guid,
    DateTime,
    DateTimeOffset,
    Xml,
    /// Nullable wrapper around another type.
    Nullable(Box<SemanticType>),
    Interval,
    List(Box<SemanticType>),
    Other(String),
}

impl SemanticType {
    #[must_use]
    pub fn nullable(inner: SemanticType) -> Self {
        SemanticType::Nullable(Box::new(inner))
    }

    /// Strip every `Nullable` layer.
    #[must_use]
    pub fn underlying(&self) -> &SemanticType {
        let mut current = self;
        while let SemanticType::Nullable(inner) = current {
            current = inner;
        }
        current
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::U8 => f.write_str("u8"),
            SemanticType::I8 => f.write_str("i8"),
            SemanticType::I16 => f.write_str("i16"),
            SemanticType::U16 => f.write_str("u16"),
            SemanticType::I32 => f.write_str("i32"),
            SemanticType::U32 => f.write_str("u32"),
            SemanticType::I64 => f.write_str("i64"),
            SemanticType::U64 => f.write_str("u64"),
            SemanticType::F32 => f.write_str("f32"),
            SemanticType::F64 => f.write_str("f64"),
            SemanticType::Decimal => f.write_str("decimal"),
            SemanticType::Bool => f.write_str("bool"),
            SemanticType::String => f.write_str("string"),
            SemanticType::Char => f.write_str("char"),
            SemanticType::Bytes => f.write_str("bytes"),
            SemanticType::Guid => f.write_str("guid"),
            SemanticType::DateTime => f.write_str("datetime"),
            SemanticType::DateTimeOffset => f.write_str("datetimeoffset"),
            SemanticType::Xml => f.write_str("xml"),
            SemanticType::Nullable(inner) => write!(f, "nullable<{inner}>"),
            SemanticType::Interval => f.write_str("interval"),
            SemanticType::List(inner) => write!(f, "list<{inner}>"),
            SemanticType::Other(name) => f.write_str(name),
        }
    }
}

/// Provider-neutral database type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    Boolean,
    String,
    StringFixedLength,
    Binary,
    Guid,
    DateTime,
    DateTimeOffset,
    Xml,
}

/// Fixed-point decimal stored as an unscaled integer plus a scale.
///
/// `Decimal::new(12345, 2)` is `123.45`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    #[must_use]
    pub fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }
    }

    #[must_use]
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = usize::from(self.scale);
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl FromStr for Decimal {
    type Err = DalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DalError::ParameterError(format!("invalid decimal literal: {s:?}"));
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let scale = u8::try_from(frac_part.len()).map_err(|_| invalid())?;
        let magnitude: i128 = format!("{int_part}{frac_part}")
            .parse()
            .map_err(|_| invalid())?;
        let mantissa = if negative { -magnitude } else { magnitude };
        Ok(Decimal::new(mantissa, scale))
    }
}

/// Values that can be bound as parameters or read back from a scalar query.
///
/// ```rust
/// use sql_dal::prelude::*;
///
/// let values = vec![
///     DalValue::from(5_i32),
///     DalValue::from("alice"),
///     DalValue::Null,
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DalValue {
    Null,
    U8(u8),
    I8(i8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Bool(bool),
    Text(String),
    Char(char),
    Bytes(Vec<u8>),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Xml(String),
}

impl DalValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The semantic type this value naturally carries; `None` for `Null`.
    #[must_use]
    pub fn semantic_type(&self) -> Option<SemanticType> {
        let ty = match self {
            DalValue::Null => return None,
            DalValue::U8(_) => SemanticType::U8,
            DalValue::I8(_) => SemanticType::I8,
            DalValue::I16(_) => SemanticType::I16,
            DalValue::U16(_) => SemanticType::U16,
            DalValue::I32(_) => SemanticType::I32,
            DalValue::U32(_) => SemanticType::U32,
            DalValue::I64(_) => SemanticType::I64,
            DalValue::U64(_) => SemanticType::U64,
            DalValue::F32(_) => SemanticType::F32,
            DalValue::F64(_) => SemanticType::F64,
            DalValue::Decimal(_) => SemanticType::Decimal,
            DalValue::Bool(_) => SemanticType::Bool,
            DalValue::Text(_) => SemanticType::String,
            DalValue::Char(_) => SemanticType::Char,
            DalValue::Bytes(_) => SemanticType::Bytes,
            DalValue::Guid(_) => SemanticType::Guid,
            DalValue::DateTime(_) => SemanticType::DateTime,
            DalValue::DateTimeOffset(_) => SemanticType::DateTimeOffset,
            DalValue::Xml(_) => SemanticType::Xml,
        };
        Some(ty)
    }

    /// Integer view of any integral variant that fits in an `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DalValue::U8(v) => Some(i64::from(*v)),
            DalValue::I8(v) => Some(i64::from(*v)),
            DalValue::I16(v) => Some(i64::from(*v)),
            DalValue::U16(v) => Some(i64::from(*v)),
            DalValue::I32(v) => Some(i64::from(*v)),
            DalValue::U32(v) => Some(i64::from(*v)),
            DalValue::I64(v) => Some(*v),
            DalValue::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DalValue::F32(v) => Some(f64::from(*v)),
            DalValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DalValue::Text(value) | DalValue::Xml(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let DalValue::Bool(value) = self {
            return Some(*value);
        }
        match self.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DalValue::DateTime(value) => Some(*value),
            DalValue::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let DalValue::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl fmt::Display for DalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DalValue::Null => f.write_str("NULL"),
            DalValue::U8(v) => write!(f, "{v}"),
            DalValue::I8(v) => write!(f, "{v}"),
            DalValue::I16(v) => write!(f, "{v}"),
            DalValue::U16(v) => write!(f, "{v}"),
            DalValue::I32(v) => write!(f, "{v}"),
            DalValue::U32(v) => write!(f, "{v}"),
            DalValue::I64(v) => write!(f, "{v}"),
            DalValue::U64(v) => write!(f, "{v}"),
            DalValue::F32(v) => write!(f, "{v}"),
            DalValue::F64(v) => write!(f, "{v}"),
            DalValue::Decimal(v) => write!(f, "{v}"),
            DalValue::Bool(v) => write!(f, "{v}"),
            DalValue::Text(v) | DalValue::Xml(v) => f.write_str(v),
            DalValue::Char(v) => write!(f, "{v}"),
            DalValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            DalValue::Guid(v) => write!(f, "{v}"),
            DalValue::DateTime(v) => write!(f, "{v}"),
            DalValue::DateTimeOffset(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_for_dal_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DalValue {
                fn from(value: $ty) -> Self {
                    DalValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_dal_value!(
    u8 => U8,
    i8 => I8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    bool => Bool,
    String => Text,
    char => Char,
    Vec<u8> => Bytes,
    Uuid => Guid,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
);

impl From<&str> for DalValue {
    fn from(value: &str) -> Self {
        DalValue::Text(value.to_owned())
    }
}

impl<T: Into<DalValue>> From<Option<T>> for DalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DalValue::Null, Into::into)
    }
}

/// The database providers supported by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum DatabaseType {
    /// Microsoft SQL Server
    SqlServer,
    /// `SQLite`
    Sqlite,
}

impl DatabaseType {
    /// Stable provider tag, e.g. `"SqlServer"`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "SqlServer",
            DatabaseType::Sqlite => "Sqlite",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DatabaseType {
    type Err = DalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [DatabaseType::SqlServer, DatabaseType::Sqlite]
            .into_iter()
            .find(|db_type| db_type.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DalError::ConfigError(format!("unknown database type: {s}")))
    }
}
