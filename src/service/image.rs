use super::{
    ImageRequest, Response,
    naming::{create_unique, file_component},
};
use crate::{
    Error, Result,
    config::{ImageConfig, ImageFormat, PictureSize},
    generator::{ImageModel, ImageParams, resize},
    session::{ImageRecord, SessionStore},
};
use image::DynamicImage;
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, error, info, warn};

/// Stateless image dispatcher. Each request yields one file; the latest
/// request per user is remembered for inspection only.
pub struct ImageService {
    model: Arc<dyn ImageModel>,
    output_dir: PathBuf,
    size: PictureSize,
    format: ImageFormat,
    user_requests: SessionStore<ImageRecord>,
}

impl ImageService {
    /// Creates the service and its output directory.
    pub fn new(model: Arc<dyn ImageModel>, config: &ImageConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir)?;
        info!(
            "Image service writing {} {} files to {}",
            config.size,
            config.format,
            config.output_dir.display()
        );

        Ok(Self {
            model,
            output_dir: config.output_dir.clone(),
            size: config.size,
            format: config.format,
            user_requests: SessionStore::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn size(&self) -> PictureSize {
        self.size
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn user_requests(&self) -> &SessionStore<ImageRecord> {
        &self.user_requests
    }

    pub async fn process_request(&self, user_id: &str, request: ImageRequest) -> Response {
        self.process(user_id, request).await.into()
    }

    /// Generates, resizes and saves one image.
    ///
    /// Nothing is written and no record is kept unless every step succeeds.
    pub async fn process(&self, user_id: &str, request: ImageRequest) -> Result<Response> {
        if request.prompt.is_empty() {
            return Err(Error::validation("No prompt provided"));
        }

        let params = request.resolve();
        let (size, format) = self.output_settings(&request)?;

        info!(
            "Processing image request for user {} ({} steps, guidance {}, {} {})",
            user_id, params.num_inference_steps, params.guidance_scale, size, format
        );

        let _guard = self.user_requests.lock_user(user_id).await;

        let image_file_path = self
            .render(user_id, &request.prompt, &params, size, format)
            .await
            .map_err(|e| {
                error!("Image generation failed for user {}: {}", user_id, e);
                Error::generation(format!("Image generation failed: {}", e.detail()))
            })?;

        self.user_requests.put(
            user_id,
            ImageRecord::new(request.prompt, image_file_path.clone()),
        );

        Ok(Response::Image { image_file_path })
    }

    /// Per-request overrides, validated with the configuration rules.
    fn output_settings(&self, request: &ImageRequest) -> Result<(PictureSize, ImageFormat)> {
        let size = match (request.width, request.height) {
            (None, None) => self.size,
            (width, height) => PictureSize::new(
                width.unwrap_or(self.size.width()),
                height.unwrap_or(self.size.height()),
            )
            .map_err(|e| Error::validation(e.detail()))?,
        };
        let format = match &request.format {
            Some(format) => format
                .parse::<ImageFormat>()
                .map_err(|e| Error::validation(e.detail()))?,
            None => self.format,
        };
        Ok((size, format))
    }

    async fn render(
        &self,
        user_id: &str,
        prompt: &str,
        params: &ImageParams,
        size: PictureSize,
        format: ImageFormat,
    ) -> Result<PathBuf> {
        let native = self.model.generate(prompt, params).await?;
        debug!(
            "Model produced {}x{} image, resizing to {}",
            native.width(),
            native.height(),
            size
        );
        let resized = resize(&native, size);

        // Sanitized ids can collide; the name is claimed by creating the file.
        let filename = format!("{}_generated_image.{}", file_component(user_id), format);
        save_image(resized, self.output_dir.clone(), filename, format).await
    }
}

/// Encodes `image` into a newly created file named after `filename` in `dir`,
/// removing the file again on failure.
async fn save_image(
    image: DynamicImage,
    dir: PathBuf,
    filename: String,
    format: ImageFormat,
) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        std::fs::create_dir_all(&dir)?;
        let (path, file) = create_unique(&dir, &filename)?;

        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut writer = BufWriter::new(file);
        let written = rgb
            .write_to(&mut writer, format.to_image_format())
            .map_err(Error::from)
            .and_then(|()| writer.flush().map_err(Error::from));

        if let Err(e) = written {
            drop(writer);
            if let Err(remove_err) = std::fs::remove_file(&path) {
                warn!(
                    "Failed to remove partial image {}: {}",
                    path.display(),
                    remove_err
                );
            }
            return Err(e);
        }

        debug!("Saved image to {}", path.display());
        Ok(path)
    })
    .await
    .map_err(|e| Error::internal(format!("image encoder task failed: {e}")))?
}
