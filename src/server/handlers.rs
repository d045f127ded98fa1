use super::types::{ImageEnvelope, ServiceResponse, TextEnvelope};
use crate::{
    Error, Result,
    service::{ImageService, Response, TextService},
};
use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub text: Arc<TextService>,
    pub image: Arc<ImageService>,
}

pub async fn text(
    State(state): State<AppState>,
    Json(envelope): Json<TextEnvelope>,
) -> (StatusCode, Json<ServiceResponse>) {
    // Generate user ID if not provided
    let user_id = envelope
        .user_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!("Received text request for user: {}", user_id);

    let result = state.text.process(&user_id, envelope.request).await;
    reply(user_id, result)
}

pub async fn image(
    State(state): State<AppState>,
    Json(envelope): Json<ImageEnvelope>,
) -> (StatusCode, Json<ServiceResponse>) {
    let user_id = envelope
        .user_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!("Received image request for user: {}", user_id);

    let result = state.image.process(&user_id, envelope.request).await;
    reply(user_id, result)
}

fn reply(user_id: String, result: Result<Response>) -> (StatusCode, Json<ServiceResponse>) {
    let status = match &result {
        Ok(_) => {
            info!("Successfully processed request for user: {}", user_id);
            StatusCode::OK
        }
        Err(Error::Validation(msg)) => {
            warn!("Rejected request for user {}: {}", user_id, msg);
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            error!("Failed to process request for user {}: {}", user_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ServiceResponse {
            user_id,
            response: result.into(),
        }),
    )
}
