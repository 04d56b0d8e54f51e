use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-call execution settings.
///
/// `command_timeout_seconds == 0` disables the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub use_transaction: bool,
    pub command_timeout_seconds: u32,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            use_transaction: true,
            command_timeout_seconds: 30,
        }
    }
}

impl ExecutionSettings {
    #[must_use]
    pub fn new(use_transaction: bool, command_timeout_seconds: u32) -> Self {
        Self {
            use_transaction,
            command_timeout_seconds,
        }
    }

    #[must_use]
    pub fn with_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, command_timeout_seconds: u32) -> Self {
        self.command_timeout_seconds = command_timeout_seconds;
        self
    }

    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_seconds > 0)
            .then(|| Duration::from_secs(u64::from(self.command_timeout_seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_unbounded() {
        assert_eq!(ExecutionSettings::new(false, 0).command_timeout(), None);
        assert_eq!(
            ExecutionSettings::default().command_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: ExecutionSettings =
            serde_json::from_str(r#"{"use_transaction": false}"#).unwrap();
        assert_eq!(settings, ExecutionSettings::new(false, 30));
    }
}
