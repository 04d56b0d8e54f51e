//! Conversion of a [`ParameterList`] into provider-native parameters.
//!
//! Providers plug in through [`ParameterHooks`]: a factory for their native
//! parameter type plus two overridable hooks, one converting the value and one
//! adjusting the finished parameter. The binder itself knows no provider.

use crate::error::DalError;
use crate::mapping::try_map_type;
use crate::params::{DalParameter, ParameterList};
use crate::types::{DalValue, DbType};

/// A provider's bound parameter.
pub trait NativeParameter {
    fn set_db_type(&mut self, db_type: DbType);
    fn set_name(&mut self, name: &str);
    fn set_value(&mut self, value: DalValue);
}

/// Provider capability hooks used while binding.
pub trait ParameterHooks: Send + Sync {
    type Parameter: NativeParameter;

    /// Create an empty native parameter.
    fn new_parameter(&self) -> Self::Parameter;

    /// Convert a semantic value into the value stored on the native parameter.
    ///
    /// The default passes values through and turns an absent value into
    /// `DalValue::Null`.
    ///
    /// # Errors
    /// Returns `DalError::ParameterError` when the provider cannot represent the value.
    fn map_value(&self, db_type: DbType, value: Option<&DalValue>) -> Result<DalValue, DalError> {
        let _ = db_type;
        Ok(value.cloned().unwrap_or(DalValue::Null))
    }

    /// Adjust a native parameter after type, name and value are set.
    fn customize_parameter(
        &self,
        parameter: &mut Self::Parameter,
        db_type: DbType,
        value: Option<&DalValue>,
    ) {
        let _ = (parameter, db_type, value);
    }
}

/// Bind every parameter of `list`, in insertion order.
///
/// All or nothing: the first parameter whose type has no mapping, whose value
/// is of a different type than declared, or whose value the provider rejects,
/// fails the whole call.
///
/// # Errors
/// Returns `DalError::TypeMapping` naming the offending parameter and type,
/// `DalError::ParameterError` when a value contradicts its declared type, or the
/// error raised by [`ParameterHooks::map_value`].
pub fn bind_parameters<H: ParameterHooks + ?Sized>(
    hooks: &H,
    list: &ParameterList,
) -> Result<Vec<H::Parameter>, DalError> {
    let mut bound = Vec::with_capacity(list.len());
    for param in list {
        let db_type =
            try_map_type(param.semantic_type()).ok_or_else(|| DalError::TypeMapping {
                name: param.name().to_string(),
                semantic_type: param.semantic_type().to_string(),
            })?;
        check_value_type(param)?;
        let value = hooks.map_value(db_type, param.value())?;

        let mut native = hooks.new_parameter();
        native.set_db_type(db_type);
        native.set_name(param.bare_name());
        native.set_value(value);
        hooks.customize_parameter(&mut native, db_type, param.value());
        bound.push(native);
    }
    Ok(bound)
}

/// A non-null value must have the declared type, ignoring `Nullable`.
fn check_value_type(param: &DalParameter) -> Result<(), DalError> {
    let Some(actual) = param.value().and_then(DalValue::semantic_type) else {
        return Ok(());
    };
    if &actual == param.semantic_type().underlying() {
        Ok(())
    } else {
        Err(DalError::ParameterError(format!(
            "parameter {} is declared {} but holds a {actual} value",
            param.name(),
            param.semantic_type()
        )))
    }
}

/// Bind an optional list; `None` binds nothing.
///
/// # Errors
/// Same as [`bind_parameters`].
pub fn bind_optional<H: ParameterHooks + ?Sized>(
    hooks: &H,
    list: Option<&ParameterList>,
) -> Result<Vec<H::Parameter>, DalError> {
    match list {
        Some(list) => bind_parameters(hooks, list),
        None => Ok(Vec::new()),
    }
}
