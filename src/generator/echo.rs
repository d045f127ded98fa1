//! Offline backends that need no model weights.
//!
//! `EchoTextModel` tokenizes bytes and answers every turn with `[echo] <turn>`;
//! `EchoImageModel` paints a canvas whose colour depends on the prompt. Both
//! are deterministic, which makes them useful for wiring checks and demos.

use super::{ImageModel, ImageParams, TextModel, TextParams};
use crate::Result;
use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

const EOS_TOKEN: &str = "<|endoftext|>";
const EOS_ID: u32 = 256;
const NATIVE_SIDE: u32 = 64;

#[derive(Debug, Clone, Default)]
pub struct EchoTextModel;

impl EchoTextModel {
    pub fn new() -> Self {
        Self
    }

    /// Text of the most recent turn: everything after the last marker that is
    /// not itself the final token.
    fn last_turn(input_ids: &[u32]) -> &[u32] {
        let body = input_ids.strip_suffix(&[EOS_ID]).unwrap_or(input_ids);
        match body.iter().rposition(|&id| id == EOS_ID) {
            Some(pos) => &body[pos + 1..],
            None => body,
        }
    }
}

#[async_trait]
impl TextModel for EchoTextModel {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len());
        for (i, part) in text.split(EOS_TOKEN).enumerate() {
            if i > 0 {
                ids.push(EOS_ID);
            }
            ids.extend(part.bytes().map(u32::from));
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        let bytes: Vec<u8> = ids
            .iter()
            .filter_map(|&id| u8::try_from(id).ok())
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn eos_token(&self) -> &str {
        EOS_TOKEN
    }

    async fn generate(&self, input_ids: &[u32], params: &TextParams) -> Result<Vec<u32>> {
        let turn = self.decode(Self::last_turn(input_ids))?;
        let mut reply = format!("[echo] {}", turn.trim());

        // Leave room for the closing marker and never split a character.
        let budget = params.max_new_tokens.saturating_sub(1);
        if reply.len() > budget {
            let mut cut = budget;
            while !reply.is_char_boundary(cut) {
                cut -= 1;
            }
            reply.truncate(cut);
        }

        let mut output = input_ids.to_vec();
        output.extend(reply.bytes().map(u32::from));
        if params.max_new_tokens > 0 {
            output.push(EOS_ID);
        }

        debug!(
            "Echo model appended {} tokens to {}",
            output.len() - input_ids.len(),
            input_ids.len()
        );
        Ok(output)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EchoImageModel;

impl EchoImageModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageModel for EchoImageModel {
    async fn generate(&self, prompt: &str, params: &ImageParams) -> Result<DynamicImage> {
        let mut hasher = DefaultHasher::new();
        prompt.hash(&mut hasher);
        let [r, g, b, ..] = hasher.finish().to_le_bytes();

        debug!(
            "Echo image model painting {}x{} canvas ({} steps, guidance {})",
            NATIVE_SIDE, NATIVE_SIDE, params.num_inference_steps, params.guidance_scale
        );
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            NATIVE_SIDE,
            NATIVE_SIDE,
            Rgb([r, g, b]),
        )))
    }
}
