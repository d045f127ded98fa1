use super::{ImageModel, ImageParams, TextModel, TextParams};
use crate::{Error, Result, config::OpenAiConfig};
use async_openai::{Client, config::OpenAIConfig, types as openai_types};
use async_trait::async_trait;
use base64::prelude::*;
use image::DynamicImage;
use tokenizers::Tokenizer;
use tracing::debug;

const EOS_CANDIDATES: [&str; 3] = ["<|endoftext|>", "</s>", "<eos>"];

fn openai_client(config: &OpenAiConfig) -> Client<OpenAIConfig> {
    let api_key = if config.api_key.is_empty() {
        std::env::var("OPENAI_API_KEY").unwrap_or_default()
    } else {
        config.api_key.clone()
    };

    let mut openai_config = OpenAIConfig::new().with_api_key(api_key);

    if !config.base_url.is_empty() {
        openai_config = openai_config.with_api_base(config.base_url.clone());
    }

    Client::with_config(openai_config)
}

/// Text backend on an OpenAI-compatible completions endpoint.
///
/// Tokenization runs locally with the model's HuggingFace tokenizer so that
/// dialogue histories can be kept as token ids.
pub struct OpenAiTextModel {
    client: Client<OpenAIConfig>,
    model: String,
    tokenizer: Tokenizer,
    eos_token: String,
}

impl OpenAiTextModel {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let tokenizer_path = config.tokenizer_path.as_ref().ok_or_else(|| {
            Error::config("text.openai.tokenizer_path is required for the openai text backend")
        })?;
        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            Error::config(format!(
                "failed to load tokenizer {}: {}",
                tokenizer_path.display(),
                e
            ))
        })?;
        Ok(Self::with_tokenizer(config, tokenizer))
    }

    pub fn with_tokenizer(config: &OpenAiConfig, tokenizer: Tokenizer) -> Self {
        let eos_token = EOS_CANDIDATES
            .iter()
            .find(|token| tokenizer.token_to_id(token).is_some())
            .unwrap_or(&EOS_CANDIDATES[0])
            .to_string();

        Self {
            client: openai_client(config),
            model: config.model.clone(),
            tokenizer,
            eos_token,
        }
    }

    fn decode_raw(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, false)
            .map_err(|e| Error::tokenizer(e.to_string()))
    }
}

#[async_trait]
impl TextModel for OpenAiTextModel {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| Error::tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| Error::tokenizer(e.to_string()))
    }

    fn eos_token(&self) -> &str {
        &self.eos_token
    }

    async fn generate(&self, input_ids: &[u32], params: &TextParams) -> Result<Vec<u32>> {
        let max_tokens = u32::try_from(params.max_new_tokens).map_err(|_| {
            Error::validation(format!(
                "max_new_tokens must be at most {}, got {}",
                u32::MAX,
                params.max_new_tokens
            ))
        })?;
        let prompt = self.decode_raw(input_ids)?;

        debug!(
            "Requesting completion for {} input tokens (top_k={} and no_repeat_ngram_size={:?} are not sent)",
            input_ids.len(),
            params.top_k,
            params.no_repeat_ngram_size
        );

        let temperature = if params.do_sample {
            params.temperature
        } else {
            0.0
        };

        let request = openai_types::CreateCompletionRequestArgs::default()
            .model(&self.model)
            .prompt(prompt)
            .max_tokens(max_tokens)
            .temperature(temperature)
            .top_p(params.top_p)
            .build()?;

        let response = self.client.completions().create(request).await?;

        let continuation = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| Error::generation("completion response contained no choices"))?;

        let mut new_ids = self.encode(&continuation)?;
        new_ids.truncate(params.max_new_tokens);

        debug!("Received {} new tokens", new_ids.len());

        let mut output = input_ids.to_vec();
        output.extend(new_ids);
        Ok(output)
    }
}

/// Image backend on an OpenAI-compatible image generation endpoint.
pub struct OpenAiImageModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiImageModel {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            client: openai_client(config),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ImageModel for OpenAiImageModel {
    async fn generate(&self, prompt: &str, params: &ImageParams) -> Result<DynamicImage> {
        debug!(
            "Requesting image (num_inference_steps={} and guidance_scale={} are server-side)",
            params.num_inference_steps, params.guidance_scale
        );

        let request = openai_types::CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(openai_types::ImageModel::Other(self.model.clone()))
            .n(1)
            .response_format(openai_types::ImageResponseFormat::B64Json)
            .build()?;

        let response = self.client.images().create(request).await?;

        let generated = response
            .data
            .first()
            .ok_or_else(|| Error::generation("image response contained no images"))?;

        let bytes = match generated.as_ref() {
            openai_types::Image::B64Json { b64_json, .. } => BASE64_STANDARD
                .decode(b64_json.as_bytes())
                .map_err(|e| Error::generation(format!("invalid base64 image payload: {e}")))?,
            openai_types::Image::Url { url, .. } => {
                debug!("Fetching generated image from {}", url);
                reqwest::get(url)
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?
                    .to_vec()
            }
        };

        Ok(image::load_from_memory(&bytes)?)
    }
}
