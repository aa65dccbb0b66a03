use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod ledger;
mod models;
mod store;

use auth::rate_limit::RateLimitState;
use config::Config;
use ledger::Ledger;
use store::PgStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub store: PgStore,
    pub ledger: Arc<Ledger<PgStore>>,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    fn new(db: PgPool, config: Arc<Config>) -> Self {
        let store = PgStore::new(db.clone());
        Self {
            db,
            config,
            store: store.clone(),
            ledger: Arc::new(Ledger::new(store)),
            rate_limiter: RateLimitState::new(),
        }
    }
}

fn build_router(state: AppState) -> Router {
    // Credential endpoints sit behind the per-IP limiter.
    let auth_routes = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/auth/resend-confirmation",
            post(handlers::auth::resend_confirmation),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/auth/confirm", get(handlers::auth::confirm_email))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Daily entries
        .route("/api/entries/today", get(handlers::entries::get_today))
        .route("/api/entries/today", put(handlers::entries::update_today))
        .route(
            "/api/entries/today/weight",
            put(handlers::entries::record_weight),
        )
        .route("/api/entries", get(handlers::entries::list_entries))
        .route(
            "/api/entries/:id/activities",
            get(handlers::activities::list_activities),
        )
        // Activities & goals
        .route(
            "/api/activities",
            post(handlers::activities::record_activity),
        )
        .route("/api/goals/today", get(handlers::activities::goals_today))
        // Stats
        .route("/api/stats/summary", get(handlers::stats::summary))
        .route("/api/stats/streak", get(handlers::stats::streak))
        .route("/api/stats/weights", get(handlers::stats::weight_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .frontend_url
                .parse::<axum::http::HeaderValue>()
                .expect("FRONTEND_URL must be a valid origin"),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trimpath_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState::new(db, config.clone());
    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    // Connect info provides the client IP for the auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}
