use crate::config::TextFlavor;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_NEW_TOKENS: usize = 50;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_NUM_INFERENCE_STEPS: u32 = 50;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;

/// Sampling controls handed to a [`super::TextModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    /// Budget of tokens appended beyond the input.
    pub max_new_tokens: usize,
    pub top_k: usize,
    pub top_p: f32,
    pub temperature: f32,
    /// Forbid repeating any n-gram of this size; `None` disables the check.
    pub no_repeat_ngram_size: Option<usize>,
    pub do_sample: bool,
}

impl TextParams {
    pub fn defaults_for(flavor: TextFlavor) -> Self {
        match flavor {
            TextFlavor::Transcript => Self {
                max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
                top_k: 50,
                top_p: 0.95,
                temperature: DEFAULT_TEMPERATURE,
                no_repeat_ngram_size: Some(2),
                do_sample: true,
            },
            TextFlavor::Dialogue => Self {
                max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
                top_k: 100,
                top_p: 0.7,
                temperature: DEFAULT_TEMPERATURE,
                no_repeat_ngram_size: None,
                do_sample: true,
            },
        }
    }
}

/// Diffusion controls handed to an [`super::ImageModel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageParams {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            num_inference_steps: DEFAULT_NUM_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
        }
    }
}
