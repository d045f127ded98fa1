//! Generator adapters: the boundary to the model runtimes.
//!
//! Text and image backends expose one `generate` capability each. The
//! dispatchers in [`crate::service`] never see which runtime sits behind it.

mod echo;
mod image_model;
mod openai;
mod text_model;
mod types;

pub use echo::{EchoImageModel, EchoTextModel};
pub use image_model::{ImageModel, resize};
pub use openai::{OpenAiImageModel, OpenAiTextModel};
pub use text_model::TextModel;
pub use types::*;

use crate::{
    Error, Result,
    config::{BackendKind, ImageConfig, OpenAiConfig, TextConfig},
};
use std::sync::Arc;
use tracing::info;

/// Builds the text backend selected by `config`.
pub fn text_model(config: &TextConfig) -> Result<Arc<dyn TextModel>> {
    info!("Initializing {:?} text backend", config.backend);
    match config.backend {
        BackendKind::Echo => Ok(Arc::new(EchoTextModel::new())),
        BackendKind::Openai => {
            let openai = require_openai(config.openai.as_ref(), "text")?;
            Ok(Arc::new(OpenAiTextModel::new(openai)?))
        }
    }
}

/// Builds the image backend selected by `config`.
pub fn image_model(config: &ImageConfig) -> Result<Arc<dyn ImageModel>> {
    info!("Initializing {:?} image backend", config.backend);
    match config.backend {
        BackendKind::Echo => Ok(Arc::new(EchoImageModel::new())),
        BackendKind::Openai => {
            let openai = require_openai(config.openai.as_ref(), "image")?;
            Ok(Arc::new(OpenAiImageModel::new(openai)))
        }
    }
}

fn require_openai<'a>(config: Option<&'a OpenAiConfig>, section: &str) -> Result<&'a OpenAiConfig> {
    config.ok_or_else(|| {
        Error::config(format!(
            "{section}.backend is 'openai' but no {section}.openai section is configured"
        ))
    })
}
