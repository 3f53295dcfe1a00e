use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::Cms;
use crate::ui::Icons;

pub mod routes;

/// Server state
///
/// One lock guards the whole CMS: a rebuild holds it until commit, so
/// readers never see a half-synchronized store. The lock is shared so a
/// rebuild can carry its guard onto the blocking pool.
pub struct AppState {
    pub cms: Arc<Mutex<Cms>>,
}

impl AppState {
    pub fn new(cms: Cms) -> Arc<Self> {
        Arc::new(Self {
            cms: Arc::new(Mutex::new(cms)),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/content/{*path}", get(routes::get_content))
        .route("/data/{*path}", get(routes::get_data))
        .route("/list", get(routes::list_content))
        .route("/stats", get(routes::get_stats))
        .route("/rebuild", post(routes::rebuild))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, cms: Cms) -> anyhow::Result<()> {
    let state = AppState::new(cms);
    let app = router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(state).ok().and_then(|state| Arc::try_unwrap(state.cms).ok()) {
        Some(cms) => cms.into_inner().teardown(),
        None => tracing::warn!("Content store still shared at shutdown, skipping teardown"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down server");
}
