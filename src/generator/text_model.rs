use super::TextParams;
use crate::Result;
use async_trait::async_trait;

/// A causal language model together with its tokenizer.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Decodes token ids, dropping special tokens such as the end-of-turn marker.
    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Marker appended after each user turn so the model sees turn boundaries.
    fn eos_token(&self) -> &str;

    /// Continues `input_ids` by sampling with `params`.
    ///
    /// Returns the input followed by at most `params.max_new_tokens` new tokens.
    async fn generate(&self, input_ids: &[u32], params: &TextParams) -> Result<Vec<u32>>;
}
