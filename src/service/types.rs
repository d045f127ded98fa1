use crate::{
    Error,
    generator::{ImageParams, TextParams},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Envelope accepted by text services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// `0` disables the n-gram check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_repeat_ngram_size: Option<usize>,
}

impl TextRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Caller-supplied values win; everything else comes from `defaults`.
    pub fn resolve(&self, defaults: &TextParams) -> TextParams {
        TextParams {
            max_new_tokens: self.max_new_tokens.unwrap_or(defaults.max_new_tokens),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            no_repeat_ngram_size: match self.no_repeat_ngram_size {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.no_repeat_ngram_size,
            },
            do_sample: defaults.do_sample,
        }
    }
}

/// Envelope accepted by the image service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_inference_steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn resolve(&self) -> ImageParams {
        let defaults = ImageParams::default();
        ImageParams {
            num_inference_steps: self
                .num_inference_steps
                .unwrap_or(defaults.num_inference_steps),
            guidance_scale: self.guidance_scale.unwrap_or(defaults.guidance_scale),
        }
    }
}

/// An explicit `null` primary field counts as missing.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope returned by every service: exactly one payload or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Text { response: String },
    Image { image_file_path: PathBuf },
    Error { error: String },
}

impl Response {
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { error: msg.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        Self::error(err.detail())
    }
}

impl From<crate::Result<Response>> for Response {
    fn from(result: crate::Result<Response>) -> Self {
        result.unwrap_or_else(Response::from)
    }
}
