use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use modelgate::{
    Error, Result,
    generator::{EchoTextModel, ImageModel, ImageParams, TextModel, TextParams},
};
use std::sync::{Arc, Mutex};

/// A text model call as seen by the mock.
#[derive(Debug, Clone)]
pub struct TextCall {
    pub input_ids: Vec<u32>,
    pub params: TextParams,
}

/// Mock text model: byte-level tokenizer, scripted replies, recorded calls.
#[derive(Debug, Clone)]
pub struct MockTextModel {
    tokenizer: EchoTextModel,
    pub replies: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<Mutex<Vec<TextCall>>>,
    pub error: Option<String>,
    pub rejection: Option<String>,
}

impl MockTextModel {
    pub fn new() -> Self {
        Self {
            tokenizer: EchoTextModel::new(),
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            error: None,
            rejection: None,
        }
    }

    /// Fail every call with a validation error, as a backend does for
    /// parameters it cannot represent.
    pub fn with_rejection(mut self, reason: impl Into<String>) -> Self {
        self.rejection = Some(reason.into());
        self
    }

    pub fn with_replies<S: Into<String>>(self, replies: impl IntoIterator<Item = S>) -> Self {
        *self.replies.lock().unwrap() = replies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn get_calls(&self) -> Vec<TextCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn encode_text(&self, text: &str) -> Vec<u32> {
        self.tokenizer.encode(text).unwrap()
    }

    pub fn decode_tokens(&self, ids: &[u32]) -> String {
        self.tokenizer.decode(ids).unwrap()
    }

    /// Decoded context of every recorded call.
    pub fn get_contexts(&self) -> Vec<String> {
        self.get_calls()
            .iter()
            .map(|call| self.tokenizer.decode(&call.input_ids).unwrap())
            .collect()
    }
}

impl Default for MockTextModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.tokenizer.encode(text)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer.decode(ids)
    }

    fn eos_token(&self) -> &str {
        self.tokenizer.eos_token()
    }

    async fn generate(&self, input_ids: &[u32], params: &TextParams) -> Result<Vec<u32>> {
        self.calls.lock().unwrap().push(TextCall {
            input_ids: input_ids.to_vec(),
            params: params.clone(),
        });

        if let Some(ref reason) = self.rejection {
            return Err(Error::validation(reason.clone()));
        }
        if let Some(ref error) = self.error {
            return Err(Error::generation(error.clone()));
        }

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                "ok".to_string()
            } else {
                replies.remove(0)
            }
        };

        let mut output = input_ids.to_vec();
        output.extend(self.tokenizer.encode(&reply)?);
        Ok(output)
    }
}

/// An image model call as seen by the mock.
#[derive(Debug, Clone)]
pub struct ImageCall {
    pub prompt: String,
    pub params: ImageParams,
}

/// Mock image model returning a solid picture at a fixed native size.
#[derive(Debug, Clone)]
pub struct MockImageModel {
    pub native_width: u32,
    pub native_height: u32,
    pub calls: Arc<Mutex<Vec<ImageCall>>>,
    pub error: Option<String>,
}

impl MockImageModel {
    pub fn new() -> Self {
        Self {
            native_width: 96,
            native_height: 48,
            calls: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn get_calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageModel for MockImageModel {
    async fn generate(&self, prompt: &str, params: &ImageParams) -> Result<DynamicImage> {
        self.calls.lock().unwrap().push(ImageCall {
            prompt: prompt.to_string(),
            params: *params,
        });

        if let Some(ref error) = self.error {
            return Err(Error::generation(error.clone()));
        }

        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            self.native_width,
            self.native_height,
            Rgb([200, 100, 50]),
        )))
    }
}
