//! PM-AJAY Broadcast Web Server
//!
//! Axum server exposing the broadcast publisher over REST and the per-role
//! banner over WebSocket.

pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/broadcasts", post(routes::broadcasts::publish))
        .route(
            "/broadcasts/active",
            get(routes::broadcasts::get_active).delete(routes::broadcasts::stop),
        )
        .route("/broadcasts/history", get(routes::broadcasts::history))
        .with_state(state.clone());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Broadcast server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
