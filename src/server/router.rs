use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{auth, chat, health, pages};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/", get(pages::index))
        .route("/chat_page", get(pages::chat_page))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/verify_email", get(auth::verify_email))
        .route("/resend_verification", post(auth::resend_verification))
        .route(
            "/reset_password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/logout", get(auth::logout))
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let mut origins = vec![state.config.public_base_url.clone()];
    origins.extend(default_local_origins());

    let allow_origin = AllowOrigin::list(
        origins
            .into_iter()
            .filter_map(|origin| HeaderValue::from_str(&origin).ok())
            .collect::<Vec<_>>(),
    );

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost:8000".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}
