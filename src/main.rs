use std::path::Path;
use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use taskboard_backend::config::{AppConfig, StoreBackend};
use taskboard_backend::routes;
use taskboard_backend::state::AppState;
use taskboard_backend::store::memory::{MemoryStore, Seed};
use taskboard_backend::store::mysql::MySqlStore;

async fn build_state(backend: &StoreBackend) -> std::io::Result<AppState> {
    match backend {
        StoreBackend::MySql { database_url, max_connections } => {
            let store = MySqlStore::connect(database_url, *max_connections).await.map_err(|e| {
                error!("Failed to create pool: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            info!("Connected to MySQL with up to {} connections", max_connections);
            Ok(AppState::from_store(Arc::new(store)))
        }
        StoreBackend::Memory { seed_file } => {
            let seed = match seed_file {
                Some(path) => Seed::from_file(Path::new(path)).map_err(|e| {
                    error!("{}", e);
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
                })?,
                None => Seed::default(),
            };
            info!(
                "Using in-memory store ({} users, {} tasks, {} requests)",
                seed.users.len(),
                seed.tasks.len(),
                seed.requests.len()
            );
            Ok(AppState::from_store(Arc::new(MemoryStore::from_seed(seed))))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let state = build_state(&config.backend).await?;

    info!("Server running at http://{}", config.server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/", web::get().to(|| async { HttpResponse::Ok().body("Hello, this is the Taskboard API.") }))
            .configure(routes::routes::configure)
    })
    .bind(&config.server_address)?
    .run()
    .await
}
