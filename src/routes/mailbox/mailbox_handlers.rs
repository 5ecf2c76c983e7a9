use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};

use super::mailbox_models::{CreateRequestRequest, CreateRequestResponse, RequestListResponse, RespondRequest};
use crate::engine::workflow::{RequestScope, ResponseAction};
use crate::error::CoreError;
use crate::routes::common::{caller_from_request, status_for, DefaultResponse};
use crate::state::AppState;

async fn list_for(state: &AppState, req: &HttpRequest, scope: RequestScope) -> HttpResponse {
    let result = async {
        let caller = caller_from_request(req, state).await?;
        state.workflow().list_requests(&caller, scope).await
    }
    .await;

    match result {
        Ok(requests) => HttpResponse::Ok().json(RequestListResponse {
            success: true,
            message: "Assignment requests loaded".into(),
            requests,
        }),
        Err(e) => {
            error!("Failed to load assignment requests ({:?}): {}", scope, e);
            HttpResponse::build(status_for(&e)).json(RequestListResponse {
                success: false,
                message: e.to_string(),
                requests: Vec::new(),
            })
        }
    }
}

// Handler for the caller's own inbox
pub async fn get_my_requests(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    list_for(&state, &req, RequestScope::Own).await
}

// Handler for the admin mailbox
pub async fn get_all_requests(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    list_for(&state, &req, RequestScope::All).await
}

// Handler to open a new assignment request
pub async fn create_request(
    state: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<CreateRequestRequest>,
) -> impl Responder {
    let result = async {
        let caller = caller_from_request(&req, &state).await?;
        state
            .workflow()
            .create_request(&caller, &request.task_id, &request.assigned_to_user_id)
            .await
    }
    .await;

    match result {
        Ok(created) => HttpResponse::Ok().json(CreateRequestResponse {
            success: true,
            message: "Assignment request created".into(),
            request_id: Some(created.id),
        }),
        Err(e) => {
            info!("Failed to create assignment request for task {}: {}", request.task_id, e);
            HttpResponse::build(status_for(&e)).json(CreateRequestResponse {
                success: false,
                message: e.to_string(),
                request_id: None,
            })
        }
    }
}

// Handler to approve or reject a request
pub async fn respond_to_request(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<RespondRequest>,
) -> impl Responder {
    let request_id = path.into_inner();

    let result = async {
        let caller = caller_from_request(&req, &state).await?;
        let action: ResponseAction = request.action.parse()?;
        state
            .workflow()
            .respond(&caller, &request_id, action, request.rejection_reason.as_deref())
            .await?;
        Ok::<ResponseAction, CoreError>(action)
    }
    .await;

    match result {
        Ok(action) => {
            let message = match action {
                ResponseAction::Approve => "Request approved successfully",
                ResponseAction::Reject => "Request rejected successfully",
            };
            HttpResponse::Ok().json(DefaultResponse::ok(message))
        }
        Err(e) => {
            if matches!(e, CoreError::InvalidStateTransition { .. }) {
                warn!("Refused response to request {}: {}", request_id, e);
            } else {
                info!("Failed to respond to request {}: {}", request_id, e);
            }
            HttpResponse::build(status_for(&e)).json(DefaultResponse::failed(&e))
        }
    }
}
