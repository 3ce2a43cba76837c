//! Response state handed back by every controller operation.

use serde::Serialize;
use serde_json::Value;

use dsrows_core::id::RowId;

use crate::error::ControllerError;

/// `{httpStatus, message, id?, data?, recordsTotal?}`, plus `template` on
/// page and form renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseState {
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_total: Option<u64>,
}

impl ResponseState {
    pub fn with_status(http_status: u16) -> Self {
        Self {
            http_status,
            template: None,
            message: None,
            id: None,
            data: None,
            records_total: None,
        }
    }

    /// 200 render of `template` with `data`.
    pub fn render(template: &str, data: Value) -> Self {
        Self {
            template: Some(template.to_string()),
            data: Some(data),
            ..Self::with_status(200)
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn id(mut self, id: RowId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn records_total(mut self, total: u64) -> Self {
        self.records_total = Some(total);
        self
    }
}

impl From<&ControllerError> for ResponseState {
    fn from(e: &ControllerError) -> Self {
        Self::with_status(e.http_status()).message(e.to_string())
    }
}
