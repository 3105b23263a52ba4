use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

use crate::errors::{AppError, AppResult};

/// Renders a redemption URL as a scannable payload.
#[cfg_attr(test, mockall::automock)]
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, url: &str) -> AppResult<String>;
}

/// PNG QR code delivered as a `data:` URL, ready to drop into an `<img>` tag.
pub struct QrImageEncoder {
    size: u32,
}

impl QrImageEncoder {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    fn render_png(&self, url: &str) -> AppResult<Vec<u8>> {
        let code = QrCode::new(url.as_bytes())
            .map_err(|e| AppError::EncodingFailed(format!("QR encoding failed: {}", e)))?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .build();

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| AppError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

        Ok(buffer.into_inner())
    }
}

impl ImageEncoder for QrImageEncoder {
    fn encode(&self, url: &str) -> AppResult<String> {
        let png = self.render_png(url)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}
