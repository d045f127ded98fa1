use super::ImageArgs;
use crate::{
    Result,
    config::{Config, ImageConfig, PictureSize},
    generator,
    service::{ImageRequest, ImageService, Response, unique_path},
};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

pub async fn run(config: &Config, args: ImageArgs) -> Result<()> {
    let image_config = apply_overrides(&config.image, &args)?;
    let model = generator::image_model(&image_config)?;
    let service = ImageService::new(model, &image_config)?;

    match generate(&service, &args).await? {
        Response::Image { image_file_path } => {
            println!("Image generated and saved to {}", image_file_path.display());
        }
        Response::Error { error } => println!("Error: {error}"),
        Response::Text { .. } => println!("Error: Unknown error occurred"),
    }

    Ok(())
}

/// Folds command line flags into the configured image settings. Invalid
/// sizes are rejected here, before any model is loaded.
pub fn apply_overrides(base: &ImageConfig, args: &ImageArgs) -> Result<ImageConfig> {
    let mut image_config = base.clone();
    image_config.size = match args.size {
        Some(size) => size,
        None => PictureSize::new(
            args.width.unwrap_or(base.size.width()),
            args.height.unwrap_or(base.size.height()),
        )?,
    };
    if let Some(format) = args.imgformat {
        image_config.format = format;
    }
    if let Some(backend) = args.backend {
        image_config.backend = backend;
    }
    Ok(image_config)
}

/// Generates one image and moves it to the first free name for
/// `args.filename` inside `args.output_dir`.
///
/// The returned envelope carries the final path on success.
pub async fn generate(service: &ImageService, args: &ImageArgs) -> Result<Response> {
    tokio::fs::create_dir_all(&args.output_dir).await?;

    let filename = Path::new(&args.filename).with_extension(service.format().as_str());
    let target = unique_path(&args.output_dir, &filename.to_string_lossy());
    debug!("Reserved output path {}", target.display());

    // A fresh user per invocation: nothing is carried between runs.
    let user_id = Uuid::new_v4().to_string();
    let request = ImageRequest {
        num_inference_steps: Some(args.num_inference_steps),
        guidance_scale: Some(args.guidance_scale),
        ..ImageRequest::new(args.prompt.clone())
    };

    match service.process_request(&user_id, request).await {
        Response::Image { image_file_path } => {
            move_file(&image_file_path, &target).await?;
            info!("Moved {} to {}", image_file_path.display(), target.display());
            Ok(Response::Image {
                image_file_path: target,
            })
        }
        other => Ok(other),
    }
}

async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if tokio::fs::rename(from, to).await.is_err() {
        // Different filesystems: fall back to copy and delete.
        tokio::fs::copy(from, to).await?;
        tokio::fs::remove_file(from).await?;
    }
    Ok(())
}
