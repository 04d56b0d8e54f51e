use std::collections::HashMap;
use std::fmt;

use crate::error::DalError;
use crate::types::{DalValue, SemanticType};

/// Strip one leading placeholder sigil (`@`, `:` or `$`) from a parameter name.
#[must_use]
pub fn bare_name(name: &str) -> &str {
    name.strip_prefix(['@', ':', '$']).unwrap_or(name)
}

/// A named parameter: value plus the semantic type it should be bound as.
#[derive(Debug, Clone, PartialEq)]
pub struct DalParameter {
    name: String,
    value: Option<DalValue>,
    semantic_type: SemanticType,
}

impl DalParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<DalValue>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            value,
            semantic_type,
        }
    }

    /// An absent value declared as `semantic_type`.
    #[must_use]
    pub fn null(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self::new(name, None, semantic_type)
    }

    /// Infer the semantic type from the value.
    ///
    /// `DalValue::Null` carries no type, so it is stored as an absent
    /// nullable string; use [`DalParameter::null`] to declare another type.
    #[must_use]
    pub fn with_value(name: impl Into<String>, value: impl Into<DalValue>) -> Self {
        let value = value.into();
        match value.semantic_type() {
            Some(semantic_type) => Self::new(name, Some(value), semantic_type),
            None => Self::null(name, SemanticType::nullable(SemanticType::String)),
        }
    }

    /// Name as supplied, sigil included.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bare_name(&self) -> &str {
        bare_name(&self.name)
    }

    #[must_use]
    pub fn value(&self) -> Option<&DalValue> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn semantic_type(&self) -> &SemanticType {
        &self.semantic_type
    }
}

impl fmt::Display for DalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{value} ({})", self.semantic_type),
            None => write!(f, "NULL ({})", self.semantic_type),
        }
    }
}

/// Named parameters for one call, unique by bare name, kept in insertion order.
///
/// ```rust
/// use sql_dal::prelude::*;
///
/// let mut params = ParameterList::new();
/// params.add_value("x", 5_i32)?;
/// assert!(params.add_value("@x", 6_i32).is_err());
/// assert_eq!(params.len(), 1);
/// # Ok::<(), DalError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    params: Vec<DalParameter>,
    index: HashMap<String, usize>,
}

impl ParameterList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    ///
    /// # Errors
    /// Returns `DalError::DuplicateParameter` if the bare name is already present (the
    /// existing entry is kept) or `DalError::ParameterError` if the bare name is empty.
    pub fn add(&mut self, parameter: DalParameter) -> Result<(), DalError> {
        let key = parameter.bare_name();
        if key.is_empty() {
            return Err(DalError::ParameterError(format!(
                "parameter name must not be empty (got {:?})",
                parameter.name()
            )));
        }
        if self.index.contains_key(key) {
            return Err(DalError::DuplicateParameter {
                name: parameter.name().to_string(),
            });
        }
        self.index.insert(key.to_string(), self.params.len());
        self.params.push(parameter);
        Ok(())
    }

    /// Add a parameter whose semantic type is inferred from `value`.
    ///
    /// # Errors
    /// Same as [`ParameterList::add`].
    pub fn add_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<DalValue>,
    ) -> Result<(), DalError> {
        self.add(DalParameter::with_value(name, value))
    }

    /// Look up a parameter by name, with or without its sigil.
    #[must_use]
    pub fn try_get(&self, name: &str) -> Option<&DalParameter> {
        self.index
            .get(bare_name(name))
            .and_then(|&idx| self.params.get(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DalParameter> {
        self.params.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a DalParameter;
    type IntoIter = std::slice::Iter<'a, DalParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
