/// Issue photo loading
///
/// Fetches the bytes behind a photo URL (remote or local file),
/// decodes them off the UI thread and hands back an iced image handle.
/// Any failure along the way is the card's "image failed" signal.

use iced::widget::image::Handle;
use image::imageops::FilterType;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task;
use tracing::debug;

use crate::error::{AppError, Result};

/// Where the bytes of a photo URL come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    Remote(String),
    File(PathBuf),
}

impl PhotoSource {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            PhotoSource::Remote(url.to_string())
        } else if let Some(path) = url.strip_prefix("file://") {
            PhotoSource::File(PathBuf::from(path))
        } else {
            PhotoSource::File(PathBuf::from(url))
        }
    }
}

/// Decoded RGBA pixels ready for upload
#[derive(Debug, Clone)]
pub struct DecodedPhoto {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedPhoto {
    pub fn into_handle(self) -> Handle {
        Handle::from_rgba(self.width, self.height, self.pixels)
    }
}

/// Load the photo at `url` and return a handle for the image widget
pub async fn load_photo(url: String, max_dimension: u32, timeout: Duration) -> Result<Handle> {
    let bytes = fetch_bytes(&PhotoSource::from_url(&url), timeout).await?;

    // Decoding is CPU-bound
    let photo = task::spawn_blocking(move || decode_photo(&bytes, max_dimension)).await??;

    debug!("📸 Loaded photo {}x{} from {}", photo.width, photo.height, url);
    Ok(photo.into_handle())
}

async fn fetch_bytes(source: &PhotoSource, timeout: Duration) -> Result<Vec<u8>> {
    match source {
        PhotoSource::Remote(url) => {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            let response = client.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::HttpStatus {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }

            Ok(response.bytes().await?.to_vec())
        }
        PhotoSource::File(path) => Ok(tokio::fs::read(path).await?),
    }
}

/// Decode image bytes, downscaling anything larger than `max_dimension`
pub fn decode_photo(bytes: &[u8], max_dimension: u32) -> Result<DecodedPhoto> {
    let mut img = image::load_from_memory(bytes)?;

    if img.width() > max_dimension || img.height() > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Triangle);
    }

    let rgba = img.to_rgba8();
    Ok(DecodedPhoto {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_source_from_url() {
        assert_eq!(
            PhotoSource::from_url("https://cdn.example.org/p.jpg"),
            PhotoSource::Remote("https://cdn.example.org/p.jpg".to_string())
        );
        assert_eq!(
            PhotoSource::from_url("file:///tmp/p.png"),
            PhotoSource::File(PathBuf::from("/tmp/p.png"))
        );
        assert_eq!(
            PhotoSource::from_url("photos/p.png"),
            PhotoSource::File(PathBuf::from("photos/p.png"))
        );
    }

    #[test]
    fn test_decode_keeps_small_images() {
        let photo = decode_photo(&png_bytes(8, 4), 640).unwrap();
        assert_eq!((photo.width, photo.height), (8, 4));
        assert_eq!(photo.pixels.len(), 8 * 4 * 4);
    }

    #[test]
    fn test_decode_downscales_large_images() {
        let photo = decode_photo(&png_bytes(100, 50), 20).unwrap();
        assert_eq!((photo.width, photo.height), (20, 10));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_photo(b"not an image", 640), Err(AppError::Decode(_))));
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let path = std::env::temp_dir().join("civic-issues-photo-test.png");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();

        let url = format!("file://{}", path.display());
        let result = load_photo(url, 640, Duration::from_secs(1)).await;
        assert!(result.is_ok());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let result = load_photo(
            "/nonexistent/civic-issues/photo.jpg".to_string(),
            640,
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
