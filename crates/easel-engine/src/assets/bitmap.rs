use crate::error::EngineError;

/// A fully decoded, GPU-uploadable image: tightly packed RGBA8 rows.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Decodes an encoded image (PNG, JPEG) into RGBA8 pixels.
    ///
    /// `uri` is only used for error reporting.
    pub fn decode(uri: &str, bytes: &[u8]) -> Result<Self, EngineError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| EngineError::fetch(uri, format!("image decode failed: {e}")))?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Byte stride of one pixel row (RGBA8, no padding).
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(pixel));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("png encode");
        out.into_inner()
    }

    #[test]
    fn decode_round_trips_dimensions_and_pixels() {
        let png = encode_png(2, 2, [10, 20, 30, 255]);
        let bmp = Bitmap::decode("test.png", &png).expect("decode");

        assert_eq!(bmp.width(), 2);
        assert_eq!(bmp.height(), 2);
        assert_eq!(bmp.bytes_per_row(), 8);
        assert_eq!(bmp.pixels().len(), 16);
        assert_eq!(&bmp.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Bitmap::decode("bad.png", b"not an image").unwrap_err();
        assert!(matches!(err, EngineError::ResourceFetch { .. }));
    }
}
