use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};

use super::task_view_models::{GroupedUsersResponse, TaskListParams, TaskListResponse};
use crate::engine::grouping::{group_tasks_by_user, users_with_tasks};
use crate::engine::query::{load_board, TaskBoard, TaskQuery};
use crate::error::CoreError;
use crate::routes::common::{caller_from_request, require_admin, status_for};
use crate::state::AppState;

// Handler to list tasks with the status tabs
pub async fn get_tasks(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<TaskListParams>,
) -> impl Responder {
    let caller = match caller_from_request(&req, &state).await {
        Ok(caller) => caller,
        Err(e) => {
            return HttpResponse::build(status_for(&e))
                .json(TaskListResponse::from_board(TaskBoard::empty(), false, e.to_string()));
        }
    };

    let selection = match params.selection() {
        Ok(selection) => selection,
        Err(e) => {
            info!("Rejected task filter from {}: {}", caller.id, e);
            return HttpResponse::BadRequest()
                .json(TaskListResponse::from_board(TaskBoard::empty(), false, e.to_string()));
        }
    };

    let (board, failure) = load_board(state.tasks.as_ref(), &caller, &selection).await;
    match failure {
        None => HttpResponse::Ok().json(TaskListResponse::from_board(board, true, "Tasks loaded".into())),
        Some(e) => HttpResponse::build(status_for(&e))
            .json(TaskListResponse::from_board(board, false, "Failed to load tasks".into())),
    }
}

// Handler for the admin sidebar: every user with task ids per status
pub async fn get_users_grouped(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let result = async {
        let caller = caller_from_request(&req, &state).await?;
        require_admin(&caller, "view grouped user tasks")?;

        let users = state.users.list_users().await?;
        let listing = state.tasks.list_tasks(&TaskQuery::everything()).await?;
        let grouped = group_tasks_by_user(&listing.tasks, &users);
        Ok::<_, CoreError>(users_with_tasks(&users, &grouped))
    }
    .await;

    match result {
        Ok(users) => {
            info!("Grouped tasks for {} users", users.len());
            HttpResponse::Ok().json(GroupedUsersResponse { users })
        }
        Err(e) => {
            error!("Failed to group user tasks: {}", e);
            HttpResponse::build(status_for(&e)).json(GroupedUsersResponse { users: Vec::new() })
        }
    }
}
