use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// How a text backend threads conversation history into the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TextFlavor {
    /// Raw text continuation: history and input are concatenated as strings.
    Transcript,
    /// Turn-based chat: token histories joined with an end-of-turn marker.
    #[default]
    Dialogue,
}

impl fmt::Display for TextFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transcript => f.write_str("transcript"),
            Self::Dialogue => f.write_str("dialogue"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Deterministic offline backend, no model required.
    #[default]
    Echo,
    /// Any OpenAI-compatible inference server.
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    /// HuggingFace `tokenizer.json` matching the model; text backends only.
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default)]
    pub flavor: TextFlavor,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
}

/// Image service settings. Size and format are validated while the
/// configuration is deserialized and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawImageConfig", into = "RawImageConfig")]
pub struct ImageConfig {
    pub output_dir: PathBuf,
    pub size: PictureSize,
    pub format: ImageFormat,
    pub backend: BackendKind,
    pub openai: Option<OpenAiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawImageConfig {
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default = "default_picture_side")]
    width: u32,
    #[serde(default = "default_picture_side")]
    height: u32,
    #[serde(default = "default_image_format")]
    format: String,
    #[serde(default)]
    backend: BackendKind,
    #[serde(default)]
    openai: Option<OpenAiConfig>,
}

impl TryFrom<RawImageConfig> for ImageConfig {
    type Error = Error;

    fn try_from(raw: RawImageConfig) -> Result<Self> {
        Ok(Self {
            output_dir: raw.output_dir,
            size: PictureSize::new(raw.width, raw.height)?,
            format: raw.format.parse()?,
            backend: raw.backend,
            openai: raw.openai,
        })
    }
}

impl From<ImageConfig> for RawImageConfig {
    fn from(config: ImageConfig) -> Self {
        Self {
            output_dir: config.output_dir,
            width: config.size.width(),
            height: config.size.height(),
            format: config.format.to_string(),
            backend: config.backend,
            openai: config.openai,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            size: PictureSize::default(),
            format: ImageFormat::default(),
            backend: BackendKind::default(),
            openai: None,
        }
    }
}

/// Target dimensions generated images are resized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureSize {
    width: u32,
    height: u32,
}

impl PictureSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::config(format!(
                "picture size must have non-zero width and height, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for PictureSize {
    fn default() -> Self {
        Self {
            width: default_picture_side(),
            height: default_picture_side(),
        }
    }
}

impl fmt::Display for PictureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for PictureSize {
    type Err = Error;

    /// Parses `WIDTHxHEIGHT`, e.g. `768x512`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed =
            || Error::config(format!("malformed picture size '{s}', expected WIDTHxHEIGHT"));
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(malformed)?;
        let width = width.trim().parse().map_err(|_| malformed())?;
        let height = height.trim().parse().map_err(|_| malformed())?;
        Self::new(width, height)
    }
}

/// Raster encodings the image service can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpg => image::ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            other => Err(Error::config(format!(
                "image format must be either 'jpg' or 'png', got '{other}'"
            ))),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./generated_images")
}

fn default_picture_side() -> u32 {
    512
}

fn default_image_format() -> String {
    "png".to_string()
}
