use actix_web::{http::StatusCode, HttpRequest};
use log::{error, info};
use serde::Serialize;

use crate::error::CoreError;
use crate::models::session::CallerIdentity;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Serialize)]
pub struct DefaultResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl DefaultResponse {
    pub fn ok<M: Into<String>>(message: M) -> Self {
        Self { success: true, message: message.into(), code: None }
    }

    pub fn failed(err: &CoreError) -> Self {
        Self { success: false, message: err.to_string(), code: Some(err.code()) }
    }
}

pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        CoreError::FetchFailed(_) | CoreError::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Get the caller from the session ID in the cookie
pub async fn caller_from_request(req: &HttpRequest, state: &AppState) -> Result<CallerIdentity, CoreError> {
    let session_id = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            info!("Session ID not found in cookies for {}", req.path());
            return Err(CoreError::Unauthorized("Session ID not found".into()));
        }
    };

    match state.sessions.resolve_session(&session_id).await {
        Ok(Some(caller)) => Ok(caller),
        Ok(None) => {
            info!("Invalid or expired session ID: {}", session_id);
            Err(CoreError::Unauthorized("Invalid or expired session ID".into()))
        }
        Err(e) => {
            error!("Failed to validate session ID {}: {}", session_id, e);
            Err(e.into())
        }
    }
}

pub fn require_admin(caller: &CallerIdentity, action: &str) -> Result<(), CoreError> {
    if caller.is_admin() {
        Ok(())
    } else {
        info!("User {} is not allowed to {}", caller.id, action);
        Err(CoreError::Forbidden(action.to_string()))
    }
}
