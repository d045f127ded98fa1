//! Request dispatchers.
//!
//! A service validates the envelope, merges it with the caller's stored
//! session, invokes its generator and shapes the response envelope.

mod image;
mod naming;
mod text;
mod types;

pub use self::image::ImageService;
pub use naming::{file_component, unique_path};
pub use text::TextService;
pub use types::*;

use crate::Error;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A dispatcher over one backend kind, chosen at construction.
pub enum Service {
    Text(TextService),
    Image(ImageService),
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }

    /// Handles a JSON envelope for `user_id`.
    ///
    /// Envelopes whose fields have the wrong types are answered with an error
    /// envelope, like any other rejected request.
    pub async fn process_request(&self, user_id: &str, envelope: Value) -> Response {
        match self {
            Self::Text(service) => match parse_envelope(envelope) {
                Ok(request) => service.process_request(user_id, request).await,
                Err(e) => e.into(),
            },
            Self::Image(service) => match parse_envelope(envelope) {
                Ok(request) => service.process_request(user_id, request).await,
                Err(e) => e.into(),
            },
        }
    }
}

fn parse_envelope<T: DeserializeOwned>(envelope: Value) -> Result<T, Error> {
    serde_json::from_value(envelope).map_err(|e| Error::validation(format!("Invalid request: {e}")))
}
