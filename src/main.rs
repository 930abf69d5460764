use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use hr_assistant_backend::core::logging;
use hr_assistant_backend::server::router::router;
use hr_assistant_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    logging::init(&state.config.log_dir);

    let listener = TcpListener::bind(&state.config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", state.config.bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
