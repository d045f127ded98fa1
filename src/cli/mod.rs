//! Command line surface: an HTTP host plus two interactive front ends.

pub mod chat;
pub mod image;

use crate::{
    Result,
    config::{self, BackendKind, Config, ImageFormat, PictureSize, TextFlavor},
    generator::{DEFAULT_GUIDANCE_SCALE, DEFAULT_NUM_INFERENCE_STEPS},
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Per-user session dispatch for text and image generation")]
pub struct Cli {
    /// Configuration file; defaults to $CONFIG_PATH or ./config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub async fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => config::load_from(path).await,
            None => config::load().await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve both dispatchers over HTTP
    Serve(ServeArgs),
    /// Chat with a text model in the terminal
    Chat(ChatArgs),
    /// Generate one image and save it
    Image(ImageArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// How history is threaded into the next turn
    #[arg(long, value_enum)]
    pub flavor: Option<TextFlavor>,
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Description of the image to generate
    #[arg(long)]
    pub prompt: String,
    #[arg(long, alias = "num_inference_steps", default_value_t = DEFAULT_NUM_INFERENCE_STEPS)]
    pub num_inference_steps: u32,
    #[arg(long, alias = "guidance_scale", default_value_t = DEFAULT_GUIDANCE_SCALE)]
    pub guidance_scale: f32,
    /// File name inside the output directory; its extension follows the format
    #[arg(long, default_value = "generated_image.png")]
    pub filename: String,
    /// Target size as WIDTHxHEIGHT, e.g. 768x512
    #[arg(long, value_parser = parse_picture_size, conflicts_with_all = ["width", "height"])]
    pub size: Option<PictureSize>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long, value_parser = parse_image_format)]
    pub imgformat: Option<ImageFormat>,
    #[arg(long, default_value = "./_data/_generated")]
    pub output_dir: PathBuf,
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

fn parse_picture_size(s: &str) -> std::result::Result<PictureSize, String> {
    s.parse::<PictureSize>().map_err(|e| e.detail())
}

fn parse_image_format(s: &str) -> std::result::Result<ImageFormat, String> {
    s.parse::<ImageFormat>().map_err(|e| e.detail())
}
