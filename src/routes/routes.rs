use actix_web::web;

use super::task_view::task_view_handlers;

pub fn task_view_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-tasks")
            .route("", web::get().to(task_view_handlers::get_tasks))
            .route("/", web::get().to(task_view_handlers::get_tasks))
            .route("/users-grouped", web::get().to(task_view_handlers::get_users_grouped))
    );
}

use super::user_admin::user_admin_handlers;

pub fn user_admin_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-users")
            .route("", web::get().to(user_admin_handlers::get_users))
            .route("/", web::get().to(user_admin_handlers::get_users))
            .route("/workload", web::get().to(user_admin_handlers::get_user_workload))
            .route("/{user_id}", web::put().to(user_admin_handlers::update_user))
    );
}

use super::mailbox::mailbox_handlers;

pub fn mailbox_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-requests")
            .route("", web::get().to(mailbox_handlers::get_all_requests))
            .route("", web::post().to(mailbox_handlers::create_request))
            .route("/mine", web::get().to(mailbox_handlers::get_my_requests))
            .route("/{request_id}", web::put().to(mailbox_handlers::respond_to_request))
    );
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(task_view_configure)
        .configure(user_admin_configure)
        .configure(mailbox_configure);
}
