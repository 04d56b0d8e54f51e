//! Blocking forms of the four [`DataAccessLayer`] operations.
//!
//! [`BlockingDal`] owns a current-thread runtime and drives the async provider
//! to completion on the calling thread. Calling it from inside an async runtime
//! panics, as `Runtime::block_on` does.

use tokio::runtime::{Builder, Runtime};

use crate::dal::{DalSpecificProperties, DataAccessLayer};
use crate::error::DalError;
use crate::params::ParameterList;
use crate::settings::ExecutionSettings;
use crate::types::{DalValue, DatabaseType};

pub struct BlockingDal {
    inner: Box<dyn DataAccessLayer>,
    runtime: Runtime,
}

impl std::fmt::Debug for BlockingDal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingDal")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl BlockingDal {
    /// Wrap an async provider.
    ///
    /// # Errors
    /// Returns `DalError::Other` if the runtime cannot be built.
    pub fn new(inner: Box<dyn DataAccessLayer>) -> Result<Self, DalError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DalError::Other(format!("failed to build blocking runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    #[must_use]
    pub fn inner(&self) -> &dyn DataAccessLayer {
        self.inner.as_ref()
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.inner.database_type()
    }

    #[must_use]
    pub fn specific_properties(&self) -> &DalSpecificProperties {
        self.inner.specific_properties()
    }

    /// # Errors
    /// Same as [`DataAccessLayer::execute_non_query`].
    pub fn execute_non_query(
        &self,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<(), DalError> {
        self.runtime
            .block_on(self.inner.execute_non_query(sql, settings, params))
    }

    /// # Errors
    /// Same as [`DataAccessLayer::execute_scalar`].
    pub fn execute_scalar(
        &self,
        sql: &str,
        settings: &ExecutionSettings,
        params: Option<&ParameterList>,
    ) -> Result<Option<DalValue>, DalError> {
        self.runtime
            .block_on(self.inner.execute_scalar(sql, settings, params))
    }

    #[must_use]
    pub fn is_connection_valid(&self, connection_string: &str, settings: &ExecutionSettings) -> bool {
        self.runtime
            .block_on(self.inner.is_connection_valid(connection_string, settings))
    }

    /// # Errors
    /// Same as [`DataAccessLayer::check_connection_or_validate`].
    pub fn check_connection_or_validate(&self, validate: bool) -> Result<(), DalError> {
        self.runtime
            .block_on(self.inner.check_connection_or_validate(validate))
    }
}
