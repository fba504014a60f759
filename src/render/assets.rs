//! Letterhead images: loaded from disk, flattened to RGB, cached per path.

use image::RgbaImage;
use moka::future::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to read image asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image asset {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// 8-bit RGB pixels, ready to embed as a PDF image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterImage {
    /// Composite over white, dropping the alpha channel.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let mut rgb = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = u16::from(a);
            for channel in [r, g, b] {
                let blended = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }
        Self {
            width: image.width(),
            height: image.height(),
            rgb,
        }
    }

    pub fn decode(path: &Path, bytes: &[u8]) -> Result<Self, AssetLoadError> {
        let image = image::load_from_memory(bytes).map_err(|source| AssetLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_rgba(&image.to_rgba8()))
    }
}

/// Logo and footer for one render.
#[derive(Debug, Clone)]
pub struct Letterhead {
    pub logo: Arc<RasterImage>,
    pub footer: Arc<RasterImage>,
}

#[derive(Clone)]
pub struct AssetStore {
    logo_path: PathBuf,
    footer_path: PathBuf,
    cache: Cache<PathBuf, Arc<RasterImage>>,
}

impl AssetStore {
    pub fn new(logo_path: PathBuf, footer_path: PathBuf) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(10 * 60))
            .max_capacity(8)
            .build();
        Self {
            logo_path,
            footer_path,
            cache,
        }
    }

    pub async fn letterhead(&self) -> Result<Letterhead, AssetLoadError> {
        Ok(Letterhead {
            logo: self.load(&self.logo_path).await?,
            footer: self.load(&self.footer_path).await?,
        })
    }

    async fn load(&self, path: &Path) -> Result<Arc<RasterImage>, AssetLoadError> {
        if let Some(image) = self.cache.get(path).await {
            return Ok(image);
        }

        let bytes = tokio::fs::read(path).await.map_err(|source| AssetLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Arc::new(RasterImage::decode(path, &bytes)?);
        log::debug!(
            "Loaded image asset {} ({}x{})",
            path.display(),
            image.width,
            image.height
        );
        self.cache.insert(path.to_path_buf(), image.clone()).await;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn transparent_pixels_become_white() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let raster = RasterImage::from_rgba(&image);
        assert_eq!(raster.rgb, vec![255, 255, 255, 10, 20, 30]);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("logo.png"), dir.path().join("footer.png"));
        let err = store.letterhead().await.unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }

    #[tokio::test]
    async fn garbage_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        std::fs::write(&logo, b"not an image").unwrap();
        let store = AssetStore::new(logo.clone(), logo);
        let err = store.letterhead().await.unwrap_err();
        assert!(matches!(err, AssetLoadError::Decode { .. }));
    }

    #[tokio::test]
    async fn decoded_images_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        RgbaImage::from_pixel(4, 2, Rgba([0, 51, 102, 255])).save(&logo).unwrap();
        let store = AssetStore::new(logo.clone(), logo.clone());

        let first = store.letterhead().await.unwrap();
        std::fs::remove_file(&logo).unwrap();
        let second = store.letterhead().await.unwrap();
        assert!(Arc::ptr_eq(&first.logo, &second.logo));
        assert_eq!(second.footer.width, 4);
    }
}
