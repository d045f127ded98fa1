use super::{MockImageModel, MockTextModel};
use modelgate::{
    config::{Config, ImageConfig, TextFlavor},
    service::{ImageService, Response, TextService},
    session::TextSession,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn create_text_service(model: &MockTextModel, flavor: TextFlavor) -> TextService {
    TextService::new(Arc::new(model.clone()), flavor)
}

/// Image service writing into `<dir>/images`
pub fn create_image_service(model: &MockImageModel, dir: &TempDir) -> ImageService {
    let config = ImageConfig {
        output_dir: dir.path().join("images"),
        ..ImageConfig::default()
    };
    ImageService::new(Arc::new(model.clone()), &config).expect("Failed to create image service")
}

/// Create a test configuration with sensible defaults
pub fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.logs.level = "debug".to_string();
    config.image.output_dir = dir.path().join("images");
    config
}

pub fn expect_text(response: Response) -> String {
    match response {
        Response::Text { response } => response,
        other => panic!("expected a text response, got {other:?}"),
    }
}

pub fn transcript_of(service: &TextService, user_id: &str) -> String {
    match service.sessions().get(user_id) {
        Some(TextSession::Transcript(text)) => text,
        other => panic!("expected a transcript session, got {other:?}"),
    }
}

pub fn dialogue_of(service: &TextService, user_id: &str) -> Vec<u32> {
    match service.sessions().get(user_id) {
        Some(TextSession::Dialogue(ids)) => ids,
        other => panic!("expected a dialogue session, got {other:?}"),
    }
}

/// Generate unique user ID for tests
pub fn generate_test_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9090
  logs:
    level: "debug"

text:
  flavor: transcript
  backend: echo

image:
  output_dir: "/tmp/modelgate-test"
  width: 256
  height: 128
  format: JPG
  backend: echo
"#;

/// Sample configuration with OpenAI-compatible backends
pub const SAMPLE_CONFIG_WITH_OPENAI: &str = r#"
text:
  flavor: dialogue
  backend: openai
  openai:
    base_url: "http://localhost:8000/v1"
    model: "gpt2"
    tokenizer_path: "/models/gpt2/tokenizer.json"

image:
  backend: openai
  openai:
    base_url: "http://localhost:8000/v1"
    api_key: "test-api-key"
    model: "stable-diffusion-v1-4"
"#;

/// Invalid image settings must be rejected while loading
pub const INVALID_FORMAT_YAML: &str = r#"
image:
  format: "gif"
"#;

pub const INVALID_SIZE_YAML: &str = r#"
image:
  width: 0
  height: 512
"#;
