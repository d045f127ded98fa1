use crate::service::{ImageRequest, Response, TextRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TextEnvelope {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub request: TextRequest,
}

#[derive(Debug, Deserialize)]
pub struct ImageEnvelope {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub request: ImageRequest,
}

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub response: Response,
}
