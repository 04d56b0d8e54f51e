//! Semantic type to [`DbType`] lookup.
//!
//! The table is fixed. Nullable wrappers are stripped before the lookup and a
//! miss is reported as `None` so callers decide how to fail.

use crate::types::{DbType, SemanticType};

/// Look up the database type for a semantic type.
///
/// ```rust
/// use sql_dal::prelude::*;
///
/// assert_eq!(try_map_type(&SemanticType::nullable(SemanticType::I32)), Some(DbType::Int32));
/// assert_eq!(try_map_type(&SemanticType::Interval), None);
/// ```
#[must_use]
pub fn try_map_type(semantic_type: &SemanticType) -> Option<DbType> {
    let db_type = match semantic_type.underlying() {
        SemanticType::U8 => DbType::Byte,
        SemanticType::I8 => DbType::SByte,
        SemanticType::I16 => DbType::Int16,
        SemanticType::U16 => DbType::UInt16,
        SemanticType::I32 => DbType::Int32,
        SemanticType::U32 => DbType::UInt32,
        SemanticType::I64 => DbType::Int64,
        SemanticType::U64 => DbType::UInt64,
        SemanticType::F32 => DbType::Single,
        SemanticType::F64 => DbType::Double,
        SemanticType::Decimal => DbType::Decimal,
        SemanticType::Bool => DbType::Boolean,
        SemanticType::String => DbType::String,
        SemanticType::Char => DbType::StringFixedLength,
        SemanticType::Guid => DbType::Guid,
        SemanticType::DateTime => DbType::DateTime,
        SemanticType::DateTimeOffset => DbType::DateTimeOffset,
        SemanticType::Bytes => DbType::Binary,
        SemanticType::Xml => DbType::Xml,
        SemanticType::Nullable(_)
        | SemanticType::Interval
        | SemanticType::List(_)
        | SemanticType::Other(_) => return None,
    };
    Some(db_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<(SemanticType, DbType)> {
        vec![
            (SemanticType::U8, DbType::Byte),
            (SemanticType::I8, DbType::SByte),
            (SemanticType::I16, DbType::Int16),
            (SemanticType::U16, DbType::UInt16),
            (SemanticType::I32, DbType::Int32),
            (SemanticType::U32, DbType::UInt32),
            (SemanticType::I64, DbType::Int64),
            (SemanticType::U64, DbType::UInt64),
            (SemanticType::F32, DbType::Single),
            (SemanticType::F64, DbType::Double),
            (SemanticType::Decimal, DbType::Decimal),
            (SemanticType::Bool, DbType::Boolean),
            (SemanticType::String, DbType::String),
            (SemanticType::Char, DbType::StringFixedLength),
            (SemanticType::Guid, DbType::Guid),
            (SemanticType::DateTime, DbType::DateTime),
            (SemanticType::DateTimeOffset, DbType::DateTimeOffset),
            (SemanticType::Bytes, DbType::Binary),
            (SemanticType::Xml, DbType::Xml),
        ]
    }

    #[test]
    fn maps_every_supported_type_and_its_nullable_form() {
        for (semantic_type, expected) in table() {
            assert_eq!(try_map_type(&semantic_type), Some(expected), "{semantic_type}");
            let nullable = SemanticType::nullable(semantic_type);
            assert_eq!(try_map_type(&nullable), Some(expected), "{nullable}");
        }
    }

    #[test]
    fn unsupported_types_miss() {
        assert_eq!(try_map_type(&SemanticType::Interval), None);
        assert_eq!(try_map_type(&SemanticType::List(Box::new(SemanticType::I32))), None);
        assert_eq!(try_map_type(&SemanticType::Other("point".into())), None);
        assert_eq!(try_map_type(&SemanticType::nullable(SemanticType::Interval)), None);
    }
}
