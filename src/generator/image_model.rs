use super::ImageParams;
use crate::{Result, config::PictureSize};
use async_trait::async_trait;
use image::{DynamicImage, imageops::FilterType};

/// A text-to-image model producing one picture at its native resolution.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(&self, prompt: &str, params: &ImageParams) -> Result<DynamicImage>;
}

/// Resizes a generated picture to the configured size, ignoring aspect ratio.
pub fn resize(image: &DynamicImage, size: PictureSize) -> DynamicImage {
    if image.width() == size.width() && image.height() == size.height() {
        return image.clone();
    }
    image.resize_exact(size.width(), size.height(), FilterType::CatmullRom)
}
