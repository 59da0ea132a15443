//! Image placements and the image data that backs them.
//!
//! Supports ingesting:
//! - raw 8-bit RGB pixels (stored Flate-compressed)
//! - JPEG (stored as-is with `DCTDecode`)
//! - PNG (decoded to RGB and stored like raw pixels)

use super::format_matrix;
use crate::compression;
use crate::error::{PdfError, Result};
use crate::geometry::Matrix;
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use crate::writer::escape_name;
use base64::Engine;

/// An image XObject drawn with `Do`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) xobject: ObjectId,
    pub(crate) matrix: Matrix,
    pub(crate) order: usize,
    pixel_width: u32,
    pixel_height: u32,
    data: Vec<u8>,
    filter: Option<String>,
}

impl ImageElement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        name: String,
        xobject: ObjectId,
        matrix: Matrix,
        order: usize,
        pixel_width: u32,
        pixel_height: u32,
        data: Vec<u8>,
        filter: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            xobject,
            matrix,
            order,
            pixel_width,
            pixel_height,
            data,
            filter,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// XObject resource name, e.g. `Im1`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn xobject(&self) -> ObjectId {
        self.xobject
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Displayed width in user space units.
    pub fn width(&self) -> f64 {
        self.matrix.a().abs()
    }

    /// Displayed height in user space units.
    pub fn height(&self) -> f64 {
        self.matrix.d().abs()
    }

    pub fn set_width(&mut self, width: f64) {
        self.matrix.set_a(width);
    }

    pub fn set_height(&mut self, height: f64) {
        self.matrix.set_d(height);
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Encoded stream bytes exactly as stored in the XObject.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub(crate) fn operator_chunks(&self) -> Vec<Vec<u8>> {
        let mut draw = b"/".to_vec();
        draw.extend(escape_name(&self.name));
        draw.extend_from_slice(b" Do");

        vec![
            b"q".to_vec(),
            format!("{} cm", format_matrix(&self.matrix)).into_bytes(),
            draw,
            b"Q".to_vec(),
        ]
    }

    /// Converts the stored bytes into something a browser can display.
    /// Never fails: anything unrecognised is handed back as an opaque blob.
    pub fn presentation(&self) -> ImagePresentation {
        match self.filter() {
            Some("FlateDecode") => match self.flate_to_png() {
                Ok(png) => ImagePresentation::new("image/png", png),
                Err(err) => {
                    tracing::warn!(element = %self.id, error = %err, "image presentation fell back to raw bytes");
                    ImagePresentation::opaque(self.data.clone())
                }
            },
            Some("DCTDecode") => ImagePresentation::new("image/jpeg", self.data.clone()),
            Some("JPXDecode") => ImagePresentation::new("image/jp2", self.data.clone()),
            _ => ImagePresentation::opaque(self.data.clone()),
        }
    }

    pub fn data_url(&self) -> String {
        self.presentation().data_url()
    }

    fn flate_to_png(&self) -> Result<Vec<u8>> {
        use image::codecs::png::PngEncoder;
        use image::{ExtendedColorType, ImageEncoder};

        let raw = compression::decompress(&self.data)?;
        let expected = self.pixel_width as usize * self.pixel_height as usize * 3;
        if raw.len() != expected || expected == 0 {
            return Err(PdfError::InvalidImage(format!(
                "expected {expected} RGB bytes, found {}",
                raw.len()
            )));
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                &raw,
                self.pixel_width,
                self.pixel_height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| PdfError::InvalidImage(e.to_string()))?;
        Ok(png)
    }
}

/// Displayable image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePresentation {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl ImagePresentation {
    fn new(mime_type: &'static str, data: Vec<u8>) -> Self {
        Self { mime_type, data }
    }

    fn opaque(data: Vec<u8>) -> Self {
        Self::new("application/octet-stream", data)
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// How [`ImageData`] bytes are stored in the XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Uncompressed 8-bit RGB triples, Flate-compressed on insert
    RawRgb,
    /// JPEG file bytes, stored with `DCTDecode`
    Jpeg,
}

/// Image ready to be added to a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    width: u32,
    height: u32,
    encoding: ImageEncoding,
    color_space: &'static str,
    bytes: Vec<u8>,
}

impl ImageData {
    /// Raw RGB pixels; `bytes` must hold exactly `width * height * 3` bytes.
    pub fn raw_rgb(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                PdfError::InvalidImage(format!("invalid image dimensions {width}x{height}"))
            })?;
        if bytes.len() != expected {
            return Err(PdfError::InvalidImage(format!(
                "raw RGB data for {width}x{height} needs {expected} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            encoding: ImageEncoding::RawRgb,
            color_space: "DeviceRGB",
            bytes,
        })
    }

    /// JPEG bytes; dimensions come from the frame header.
    pub fn jpeg(bytes: Vec<u8>) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(&bytes)?;
        Ok(Self {
            width,
            height,
            encoding: ImageEncoding::Jpeg,
            color_space,
            bytes,
        })
    }

    /// PNG bytes, decoded to 8-bit RGB (alpha is dropped).
    pub fn png(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| PdfError::InvalidImage(format!("PNG decode failed: {e}")))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Self::raw_rgb(width, height, decoded.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Builds the image XObject stream.
    pub(crate) fn into_stream(self) -> Result<Stream> {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("XObject"));
        dict.set("Subtype", Object::name("Image"));
        dict.set("Width", self.width);
        dict.set("Height", self.height);
        dict.set("ColorSpace", Object::name(self.color_space));
        dict.set("BitsPerComponent", 8);

        let (filter, data) = match self.encoding {
            ImageEncoding::RawRgb => ("FlateDecode", compression::compress(&self.bytes)?),
            ImageEncoding::Jpeg => ("DCTDecode", self.bytes),
        };
        dict.set("Filter", Object::name(filter));

        Ok(Stream::with_dictionary(dict, data))
    }
}

/// Reads width, height and color space from a JPEG's SOF segment.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, &'static str)> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(PdfError::InvalidImage("Not a valid JPEG file".to_string()));
    }

    let mut pos = 2;
    let mut width = 0;
    let mut height = 0;
    let mut components = 0;

    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return Err(PdfError::InvalidImage("Invalid JPEG marker".to_string()));
        }

        let marker = data[pos + 1];
        pos += 2;

        // Fill bytes
        if marker == 0xFF {
            pos -= 1;
            continue;
        }

        if (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC {
            if pos + 7 >= data.len() {
                return Err(PdfError::InvalidImage("Truncated JPEG file".to_string()));
            }

            // Skip length and precision
            pos += 3;

            height = ((data[pos] as u32) << 8) | (data[pos + 1] as u32);
            pos += 2;
            width = ((data[pos] as u32) << 8) | (data[pos + 1] as u32);
            pos += 2;

            components = data[pos];
            break;
        } else if marker == 0xD9 {
            break;
        } else if marker == 0xD8 || (0xD0..=0xD7).contains(&marker) {
            continue;
        } else {
            if pos + 1 >= data.len() {
                return Err(PdfError::InvalidImage("Truncated JPEG file".to_string()));
            }
            let length = ((data[pos] as usize) << 8) | (data[pos + 1] as usize);
            pos += length;
        }
    }

    if width == 0 || height == 0 {
        return Err(PdfError::InvalidImage(
            "Could not find image dimensions".to_string(),
        ));
    }

    let color_space = match components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        _ => {
            return Err(PdfError::InvalidImage(format!(
                "Unsupported number of components: {components}"
            )))
        }
    };

    Ok((width, height, color_space))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_jpeg() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0 with 2 payload bytes
            0xFF, 0xC0, // SOF0
            0x00, 0x11, // Length
            0x08, // Precision
            0x00, 0x64, // Height (100)
            0x00, 0xC8, // Width (200)
            0x03, // Components
            0x00, 0x00,
        ]
    }

    fn placed(filter: Option<&str>, data: Vec<u8>, w: u32, h: u32) -> ImageElement {
        ImageElement::new(
            "p0_el1".to_string(),
            "Im1".to_string(),
            ObjectId::new(5, 0),
            Matrix::scale_translate(90.0, 90.0, 0.0, 0.0),
            0,
            w,
            h,
            data,
            filter.map(str::to_string),
        )
    }

    #[test]
    fn test_xobject_name_is_escaped() {
        let mut el = placed(None, vec![], 1, 1);
        el.name = "Im 1".to_string();
        assert_eq!(el.operator_chunks()[2], b"/Im#201 Do".to_vec());
    }

    #[test]
    fn test_parse_jpeg_header() {
        let (width, height, color_space) = parse_jpeg_header(&minimal_jpeg()).unwrap();
        assert_eq!(width, 200);
        assert_eq!(height, 100);
        assert_eq!(color_space, "DeviceRGB");
    }

    #[test]
    fn test_invalid_jpeg() {
        assert!(matches!(
            ImageData::jpeg(vec![0x00, 0x00]),
            Err(PdfError::InvalidImage(_))
        ));
        assert!(ImageData::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]).is_err());
    }

    #[test]
    fn test_raw_rgb_length_checked() {
        assert!(ImageData::raw_rgb(3, 3, vec![0; 27]).is_ok());
        assert!(matches!(
            ImageData::raw_rgb(3, 3, vec![0; 26]),
            Err(PdfError::InvalidImage(_))
        ));
        assert!(ImageData::raw_rgb(0, 3, vec![]).is_err());
    }

    #[test]
    fn test_raw_rgb_stream() {
        let pixels: Vec<u8> = (0..27).collect();
        let stream = ImageData::raw_rgb(3, 3, pixels.clone())
            .unwrap()
            .into_stream()
            .unwrap();
        let dict = stream.dictionary();

        let keys: Vec<&str> = dict.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Type",
                "Subtype",
                "Width",
                "Height",
                "ColorSpace",
                "BitsPerComponent",
                "Filter",
                "Length"
            ]
        );
        assert_eq!(stream.filter(), Some("FlateDecode"));
        assert_eq!(compression::decompress(stream.data()).unwrap(), pixels);
    }

    #[test]
    fn test_jpeg_stream_is_passthrough() {
        let jpeg = minimal_jpeg();
        let stream = ImageData::jpeg(jpeg.clone()).unwrap().into_stream().unwrap();
        assert_eq!(stream.filter(), Some("DCTDecode"));
        assert_eq!(stream.data(), jpeg.as_slice());
        assert_eq!(stream.dictionary().get("Width"), Some(&Object::Integer(200)));
    }

    #[test]
    fn test_png_ingestion() {
        use image::codecs::png::PngEncoder;
        use image::{ExtendedColorType, ImageEncoder};

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&[255, 0, 0, 0, 255, 0], 2, 1, ExtendedColorType::Rgb8)
            .unwrap();

        let data = ImageData::png(&png).unwrap();
        assert_eq!((data.width(), data.height()), (2, 1));
        assert_eq!(data.encoding(), ImageEncoding::RawRgb);
        assert!(ImageData::png(b"not a png").is_err());
    }

    #[test]
    fn test_flate_presentation_is_png() {
        let raw: Vec<u8> = vec![200; 27];
        let el = placed(Some("FlateDecode"), compression::compress(&raw).unwrap(), 3, 3);
        let shown = el.presentation();
        assert_eq!(shown.mime_type, "image/png");
        assert_eq!(&shown.data[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_flate_with_wrong_length_falls_back() {
        let compressed = compression::compress(&[1, 2, 3]).unwrap();
        let el = placed(Some("FlateDecode"), compressed.clone(), 3, 3);
        let shown = el.presentation();
        assert_eq!(shown.mime_type, "application/octet-stream");
        assert_eq!(shown.data, compressed);
    }

    #[test]
    fn test_corrupt_flate_falls_back() {
        let el = placed(Some("FlateDecode"), b"garbage".to_vec(), 3, 3);
        assert_eq!(el.presentation().mime_type, "application/octet-stream");
    }

    #[test]
    fn test_passthrough_mime_types() {
        assert_eq!(
            placed(Some("DCTDecode"), vec![1], 1, 1).presentation().mime_type,
            "image/jpeg"
        );
        assert_eq!(
            placed(Some("JPXDecode"), vec![1], 1, 1).presentation().mime_type,
            "image/jp2"
        );
        assert_eq!(
            placed(None, vec![1], 1, 1).presentation().mime_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_data_url() {
        let el = placed(Some("DCTDecode"), b"abc".to_vec(), 1, 1);
        assert_eq!(el.data_url(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_display_size_independent_of_pixels() {
        let mut el = placed(None, vec![], 3, 3);
        el.set_width(120.0);
        el.set_height(45.0);
        assert_eq!((el.width(), el.height()), (120.0, 45.0));
        assert_eq!((el.pixel_width(), el.pixel_height()), (3, 3));
    }
}
