//! Request ledger rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Pending,
    Success,
    Error,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStatus::Pending => f.write_str("pending"),
            LogStatus::Success => f.write_str("success"),
            LogStatus::Error => f.write_str("error"),
        }
    }
}

/// One request attempt as shown in the API log panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiLogEntry {
    /// New entry in the `pending` state, stamped with the current time
    pub fn pending(id: impl Into<String>, endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            endpoint: endpoint.into(),
            method: method.into(),
            status: LogStatus::Pending,
            message: None,
            error: None,
        }
    }

    /// Shallow merge: every field set in `update` replaces the current one
    pub fn apply(&mut self, update: LogUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(message) = update.message {
            self.message = Some(message);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
    }
}

/// Partial update for an [`ApiLogEntry`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogUpdate {
    pub status: Option<LogStatus>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl LogUpdate {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Some(LogStatus::Success),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            status: Some(LogStatus::Error),
            message: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_provided_fields() {
        let mut entry = ApiLogEntry::pending("id-1", "/load-scenes", "GET");
        entry.message = Some("queued".to_string());

        entry.apply(LogUpdate::error("HTTP error! status: 500"));

        assert_eq!(entry.status, LogStatus::Error);
        assert_eq!(entry.message.as_deref(), Some("queued"));
        assert_eq!(entry.error.as_deref(), Some("HTTP error! status: 500"));
        assert_eq!(entry.endpoint, "/load-scenes");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(LogStatus::Success.to_string(), "success");
    }
}
