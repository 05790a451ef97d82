//! Response envelope for mutation endpoints.

use serde::{Deserialize, Serialize};

/// Outcome of a server action.
///
/// Serializes as `{ "success": bool, "message"?: string, "data"?: T }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResult<T> {
    /// Success carrying a payload.
    #[must_use]
    pub const fn ok_with(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Failure with a user-facing message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Attach a user-facing message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ActionResult<()> {
    /// Success without a payload.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }
}
