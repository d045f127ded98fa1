pub mod handlers;
mod types;

pub use handlers::AppState;
pub use types::{ImageEnvelope, ServiceResponse, TextEnvelope};

use crate::{
    Result,
    config::Config,
    generator,
    service::{ImageService, TextService},
};
use axum::{Router, routing::post};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/text", post(handlers::text))
        .route("/v1/images", post(handlers::image))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    // Initialize backends and their dispatchers
    let text_model = generator::text_model(&config.text)?;
    let image_model = generator::image_model(&config.image)?;

    let app_state = AppState {
        text: Arc::new(TextService::new(text_model, config.text.flavor)),
        image: Arc::new(ImageService::new(image_model, &config.image)?),
    };

    let app = router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
