use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(RequestStatus::Pending),
            "Approved" => Ok(RequestStatus::Approved),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status: {}", other)),
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    #[serde(rename = "_id")]
    #[sqlx(rename = "request_id")]
    pub id: String,
    pub task_id: String,
    pub assigned_to_user_id: String,
    pub assigned_by_admin_id: String,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Terminal outcome written by the request store's compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Approved,
    Rejected { reason: String },
}

impl Resolution {
    pub fn status(&self) -> RequestStatus {
        match self {
            Resolution::Approved => RequestStatus::Approved,
            Resolution::Rejected { .. } => RequestStatus::Rejected,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Resolution::Approved => None,
            Resolution::Rejected { reason } => Some(reason),
        }
    }
}

/// Which requests a store listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub assigned_to: Option<String>,
    pub status: Option<RequestStatus>,
}
