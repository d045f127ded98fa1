use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conversation state kept for one user of a text service.
///
/// Always the complete transcript so far, replaced wholesale after every
/// successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSession {
    Transcript(String),
    Dialogue(Vec<u32>),
}

/// Metadata of a user's latest image request. Informational only, never fed
/// back into generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub prompt: String,
    pub image_file_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(prompt: String, image_file_path: PathBuf) -> Self {
        Self {
            prompt,
            image_file_path,
            created_at: Utc::now(),
        }
    }
}
