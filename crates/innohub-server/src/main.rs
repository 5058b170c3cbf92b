use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use innohub_api::auth::{self, AppState, AppStateInner};
use innohub_api::ideas;
use innohub_api::messages;
use innohub_api::middleware::require_auth;
use innohub_api::users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innohub=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("INNOHUB_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("INNOHUB_DB_PATH").unwrap_or_else(|_| "innohub.db".into());
    let host = std::env::var("INNOHUB_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("INNOHUB_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;

    // Init database
    let db = innohub_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/ideas", post(ideas::create_idea).get(ideas::get_all_ideas))
        .route("/ideas/user/{user_id}", get(ideas::get_ideas_by_user))
        .route("/ideas/dashboard/{user_id}", get(ideas::get_dashboard))
        .route(
            "/ideas/{id}",
            get(ideas::get_idea)
                .put(ideas::update_idea)
                .delete(ideas::delete_idea),
        )
        .route("/messages", post(messages::send_message))
        .route("/messages/inbox/{user_id}", get(messages::get_inbox))
        .route("/messages/sent/{user_id}", get(messages::get_sent))
        .route("/messages/idea/{idea_id}", get(messages::get_idea_thread))
        .route("/users/details/{user_id}", get(users::get_public_user))
        .route(
            "/users/{user_id}",
            get(users::get_profile).put(users::update_profile),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("InnoHub API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "message": "InnoHub API is running",
    }))
}
