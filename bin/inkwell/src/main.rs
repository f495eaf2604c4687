//! # Inkwell Binary
//!
//! The entry point that assembles the application based on compile-time
//! features: a repo, a media store, and an auth provider behind the
//! iw-core ports, wired into an actix-web server.

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use iw_api::handlers::AppState;
use iw_api::{configure_routes, middleware};
use iw_core::traits::BlogRepo;

#[cfg(feature = "db-sqlite")]
use iw_db_sqlite::SqliteBlogRepo;

#[cfg(feature = "storage-local")]
use iw_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use iw_auth_simple::SimpleAuthProvider;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:inkwell.db".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".to_string());
    let session_secret = match std::env::var("SESSION_SECRET") {
        Ok(secret) => secret,
        Err(_) => {
            log::warn!("SESSION_SECRET not set, using an insecure development secret");
            "insecure-dev-secret".to_string()
        }
    };

    #[cfg(feature = "db-sqlite")]
    let repo: Arc<dyn BlogRepo> = Arc::new(SqliteBlogRepo::new(&database_url).await?);

    #[cfg(feature = "storage-local")]
    let store = Arc::new(LocalMediaStore::new(
        PathBuf::from(&upload_dir),
        "/static/uploads".to_string(),
    ));

    #[cfg(feature = "auth-simple")]
    let auth = Arc::new(SimpleAuthProvider::new(&session_secret, repo.clone()));

    let state = web::Data::new(AppState { repo, store, auth });

    log::info!("Inkwell listening on http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .service(actix_files::Files::new("/static/uploads", upload_dir.clone()))
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
