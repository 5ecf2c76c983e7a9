use serde::{Deserialize, Serialize};

use crate::engine::workflow::RequestView;

#[derive(Serialize)]
pub struct RequestListResponse {
    pub success: bool,
    pub message: String,
    pub requests: Vec<RequestView>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestRequest {
    pub task_id: String,
    pub assigned_to_user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestResponse {
    pub success: bool,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub action: String,
    pub rejection_reason: Option<String>,
}
