use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};

use super::user_admin_models::{UpdateUserRequest, UpdateUserResponse};
use crate::engine::grouping::{group_tasks_by_user, merge_task_counts, UserWorkload};
use crate::engine::query::TaskQuery;
use crate::error::CoreError;
use crate::models::user::{User, UserUpdate};
use crate::routes::common::{caller_from_request, require_admin, status_for, DefaultResponse};
use crate::state::AppState;

// Handler to get the user roster
pub async fn get_users(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let result = async {
        let caller = caller_from_request(&req, &state).await?;
        require_admin(&caller, "list users")?;
        Ok::<Vec<User>, CoreError>(state.users.list_users().await?)
    }
    .await;

    match result {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => {
            error!("Failed to list users: {}", e);
            HttpResponse::build(status_for(&e)).json(Vec::<User>::new())
        }
    }
}

// Handler for the team members page: roster merged with task counts
pub async fn get_user_workload(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let result = async {
        let caller = caller_from_request(&req, &state).await?;
        require_admin(&caller, "view team workload")?;

        let users = state.users.list_users().await?;
        let listing = state.tasks.list_tasks(&TaskQuery::everything()).await?;
        let grouped = group_tasks_by_user(&listing.tasks, &users);
        Ok::<Vec<UserWorkload>, CoreError>(merge_task_counts(users, &grouped))
    }
    .await;

    match result {
        Ok(workload) => HttpResponse::Ok().json(workload),
        Err(e) => {
            error!("Failed to load team workload: {}", e);
            HttpResponse::build(status_for(&e)).json(Vec::<UserWorkload>::new())
        }
    }
}

// Handler to update position, profile photo and role. Only changed fields are written.
pub async fn update_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    let update: UserUpdate = request.into_inner().into();

    let result = async {
        let caller = caller_from_request(&req, &state).await?;
        require_admin(&caller, "update users")?;

        let current = state
            .users
            .get_user(&user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user {}", user_id)))?;

        let changes = update.changes_from(&current);
        if !changes.is_empty() {
            state.users.update_user(&user_id, &changes).await?;
        }
        Ok::<UserUpdate, CoreError>(changes)
    }
    .await;

    match result {
        Ok(changes) if changes.is_empty() => {
            info!("No changes for user {}", user_id);
            HttpResponse::Ok().json(UpdateUserResponse {
                success: true,
                message: "No changes".into(),
                updated_fields: Vec::new(),
            })
        }
        Ok(changes) => {
            info!("User {} updated: {:?}", user_id, changes.field_names());
            HttpResponse::Ok().json(UpdateUserResponse {
                success: true,
                message: "User updated successfully".into(),
                updated_fields: changes.field_names(),
            })
        }
        Err(e) => {
            error!("Failed to update user {}: {}", user_id, e);
            HttpResponse::build(status_for(&e)).json(DefaultResponse::failed(&e))
        }
    }
}
