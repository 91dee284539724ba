use std::time::Duration;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use redis::Client;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::configuration::{Settings, StorageBackend};
use crate::routes::{api, card::card_page, dashboard::dashboard_handler, health::health_check};
use crate::routes::scan::{save_post, scan_page, scan_post};
use crate::routes::students::{create_student, delete_student, edit_page, update_student};
use crate::services::StudentService;
use crate::store::{CacheRepository, StudentRepository};

#[derive(Clone, Debug)]
pub struct AppState {
    pub student_service: StudentService,
}

impl AppState {
    pub fn new(student_service: StudentService) -> Self {
        Self { student_service }
    }
}

/// Connects storage and the optional cache described by `cfg`.
pub async fn build_state(cfg: &Settings) -> anyhow::Result<AppState> {
    let repo = match cfg.application.storage {
        StorageBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .acquire_timeout(Duration::from_secs(2))
                .connect_lazy_with(cfg.database.with_db());
            if cfg.database.run_migrations {
                sqlx::migrate!("./migrations").run(&pg_pool).await?;
                tracing::info!("Database migrations applied");
            }
            StudentRepository::new(pg_pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; records are lost on restart");
            StudentRepository::in_memory()
        }
    };

    let cache = match &cfg.cache.redis_url {
        Some(redis_url) => {
            let client = Client::open(redis_url.as_str())?;
            let redis_pool = bb8::Pool::builder().build(client).await?;
            let cache = CacheRepository::new(redis_pool, cfg.cache.ttl_secs);
            cache.ping().await?;
            Some(cache)
        }
        None if cfg.cache.in_memory => Some(CacheRepository::in_memory(cfg.cache.ttl_secs)),
        None => None,
    };

    let student_service = StudentService::new(repo, cache, cfg.application.origin());
    Ok(AppState::new(student_service))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/health_check", get(health_check))
        .route("/dashboard", get(dashboard_handler))
        .route("/scan", get(scan_page).post(scan_post))
        .route("/scan/save", post(save_post))
        .route("/students", post(create_student))
        .route("/students/{id}/edit", get(edit_page).post(update_student))
        .route("/students/{id}/delete", post(delete_student))
        .route("/card/{school_id}", get(card_page))
        .route("/api/parse", post(api::parse))
        .route("/api/scan", post(api::scan))
        .route("/api/students", get(api::list))
        .route(
            "/api/students/{key}",
            get(api::get_by_school_id).delete(api::delete),
        )
        .nest_service("/assets", ServeDir::new("public"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(cfg: Settings) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = router(state);

    let address = format!("{}:{}", cfg.application.host, cfg.application.port);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
