//! Axum web server setup

use axum::{
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::input::PanelEvent;

use super::handlers::{self, WebState};
use super::static_files::serve_static;

/// Build the panel router around the interactive loop's channel
pub fn router(events: UnboundedSender<PanelEvent>) -> Router {
    let state = Arc::new(WebState { events });

    let api_routes = Router::new()
        .route("/panel", get(handlers::get_panel))
        .route("/slots/{number}", put(handlers::update_slot))
        .route("/slots/{number}/click", post(handlers::click_slot))
        .route("/slots/{number}/image", get(handlers::slot_image))
        .route("/page/next", post(handlers::next_page))
        .route("/page/previous", post(handlers::previous_page))
        .route("/page/description", put(handlers::update_page_description))
        .route("/window/restore", post(handlers::restore_window))
        .route("/window/maximize", post(handlers::maximize_window))
        .route("/colors/{name}", put(handlers::set_color))
        .route("/close", post(handlers::close))
        .with_state(state);

    // Static file fallback handler
    let static_handler = |req: Request| async move {
        let path = req.uri().path();
        serve_static(path).await
    };

    Router::new()
        .nest("/api", api_routes)
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
}

/// Serve the panel on the loopback interface until the task is dropped
pub async fn start_server(port: u16, events: UnboundedSender<PanelEvent>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let app = router(events);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Panel available at http://localhost:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
