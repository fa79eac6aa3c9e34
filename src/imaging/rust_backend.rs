//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (TIFF) | `image::codecs::tiff::TiffDecoder`, selected by `.tif`/`.tiff` |
//! | Decode (everything else) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened onto white) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` with compression level |
//! | Encode → TIFF | `tiff::encoder::TiffEncoder` with compression |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → GIF, BMP, WebP | `DynamicImage::write_to` |

use super::backend::{CodecError, ImageBackend};
use super::format::FormatOption;
use super::params::{PngCompression, Quality, TiffCompression};
use image::codecs::tiff::TiffDecoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

/// Extensions routed to the dedicated TIFF decoder.
const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Pure Rust backend using the `image` and `tiff` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TIFF_EXTENSIONS.iter().any(|t| e.eq_ignore_ascii_case(t)))
}

fn decode_tiff(path: &Path) -> Result<DynamicImage, CodecError> {
    let file = File::open(path).map_err(|source| CodecError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |source| CodecError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let decoder = TiffDecoder::new(BufReader::new(file)).map_err(decode_err)?;
    DynamicImage::from_decoder(decoder).map_err(decode_err)
}

fn decode_generic(path: &Path) -> Result<DynamicImage, CodecError> {
    let reader = ImageReader::open(path).map_err(|source| CodecError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // Content sniffing wins over the extension; the extension stays as fallback.
    let reader = reader
        .with_guessed_format()
        .map_err(|source| CodecError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    reader.decode().map_err(|source| CodecError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Drop exotic pixel layouts down to 8-bit RGB or RGBA.
fn to_8bit(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img.clone(),
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_err(path: &Path) -> impl Fn(image::ImageError) -> CodecError + '_ {
    move |source| CodecError::Encode {
        path: path.to_path_buf(),
        source,
    }
}

/// Composite `img` onto an opaque white background.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over(p[0]), over(p[1]), over(p[2])])
    })
}

/// JPEG has no alpha channel: translucent pixels are composited onto white.
fn save_jpeg<W: Write>(
    img: &DynamicImage,
    writer: W,
    quality: Quality,
    path: &Path,
) -> Result<(), CodecError> {
    let rgb = DynamicImage::ImageRgb8(flatten_onto_white(img));
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.value());
    rgb.write_with_encoder(encoder).map_err(encode_err(path))
}

fn save_png<W: Write>(
    img: &DynamicImage,
    writer: W,
    compression: PngCompression,
    path: &Path,
) -> Result<(), CodecError> {
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        writer,
        compression.to_image(),
        image::codecs::png::FilterType::Adaptive,
    );
    to_8bit(img)
        .write_with_encoder(encoder)
        .map_err(encode_err(path))
}

fn save_avif<W: Write>(
    img: &DynamicImage,
    writer: W,
    quality: Quality,
    path: &Path,
) -> Result<(), CodecError> {
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality.value());
    to_8bit(img)
        .write_with_encoder(encoder)
        .map_err(encode_err(path))
}

fn save_tiff<W: Write + Seek>(
    img: &DynamicImage,
    writer: W,
    compression: TiffCompression,
    path: &Path,
) -> Result<(), CodecError> {
    use tiff::encoder::{TiffEncoder, colortype};

    let tiff_err = |source| CodecError::TiffEncode {
        path: path.to_path_buf(),
        source,
    };
    let mut encoder = TiffEncoder::new(writer)
        .map_err(tiff_err)?
        .with_compression(compression.to_tiff());

    let (width, height) = (img.width(), img.height());
    if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        encoder
            .write_image::<colortype::RGBA8>(width, height, rgba.as_raw())
            .map_err(tiff_err)
    } else {
        let rgb = img.to_rgb8();
        encoder
            .write_image::<colortype::RGB8>(width, height, rgb.as_raw())
            .map_err(tiff_err)
    }
}

fn save_generic<W: Write + Seek>(
    img: &DynamicImage,
    mut writer: W,
    format: ImageFormat,
    path: &Path,
) -> Result<(), CodecError> {
    to_8bit(img)
        .write_to(&mut writer, format)
        .map_err(encode_err(path))
}

fn write_image<W: Write + Seek>(
    img: &DynamicImage,
    writer: &mut W,
    format: &FormatOption,
    path: &Path,
) -> Result<(), CodecError> {
    match *format {
        FormatOption::Jpeg { quality } => save_jpeg(img, writer, quality, path),
        FormatOption::Png { compression } => save_png(img, writer, compression, path),
        FormatOption::Tiff { compression } => save_tiff(img, writer, compression, path),
        FormatOption::Avif { quality } => save_avif(img, writer, quality, path),
        FormatOption::Gif => save_generic(img, writer, ImageFormat::Gif, path),
        FormatOption::Bmp => save_generic(img, writer, ImageFormat::Bmp, path),
        FormatOption::WebP => save_generic(img, writer, ImageFormat::WebP, path),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        if is_tiff(path) {
            tracing::debug!(path = %path.display(), "decoding with TIFF decoder");
            return decode_tiff(path);
        }
        decode_generic(path)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: &FormatOption,
    ) -> Result<(), CodecError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| CodecError::Create {
                path: path.to_path_buf(),
                source,
            })?;
        let mut writer = BufWriter::new(file);
        write_image(image, &mut writer, format, path)?;
        writer.flush().map_err(|source| CodecError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn create_test_rgba(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 64, ((x + y) % 256) as u8])
        }))
    }

    /// Deterministic high-entropy content, so lossy quality shows in the size.
    fn create_noise_image(width: u32, height: u32) -> DynamicImage {
        let mut state = 0x2545_f491_u32;
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        }))
    }

    fn roundtrip(img: &DynamicImage, name: &str, format: FormatOption) -> DynamicImage {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(name);
        let backend = RustBackend::new();
        backend.encode(img, &path, &format).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        backend.decode(&path).unwrap()
    }

    #[test]
    fn is_tiff_matches_extensions_case_insensitive() {
        assert!(is_tiff(Path::new("a.tif")));
        assert!(is_tiff(Path::new("a.TIFF")));
        assert!(!is_tiff(Path::new("a.png")));
        assert!(!is_tiff(Path::new("tiff")));
    }

    #[test]
    fn jpeg_roundtrip_dimensions() {
        let img = create_test_image(100, 50);
        let out = roundtrip(&img, "a.jpg", FormatOption::default());
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn jpeg_flattens_alpha() {
        let img = create_test_rgba(20, 10);
        let out = roundtrip(&img, "a.jpg", FormatOption::default());
        assert_eq!(out.dimensions(), (20, 10));
        assert!(!out.color().has_alpha());
    }

    #[test]
    fn jpeg_transparent_areas_become_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0])));
        let out = roundtrip(&img, "a.jpg", FormatOption::default()).to_rgb8();
        assert!(out.pixels().all(|p| p.0.iter().all(|&c| c >= 250)));
    }

    #[test]
    fn flatten_blends_partial_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128])));
        assert_eq!(flatten_onto_white(&img).get_pixel(0, 0), &Rgb([127, 127, 127]));

        let opaque = create_test_image(4, 4);
        assert_eq!(flatten_onto_white(&opaque), opaque.to_rgb8());
    }

    #[test]
    fn jpeg_quality_reaches_encoder() {
        let tmp = tempfile::TempDir::new().unwrap();
        let img = create_noise_image(64, 64);
        let backend = RustBackend::new();
        let size_at = |q: u8| {
            let path = tmp.path().join(format!("q{q}.jpg"));
            let format = FormatOption::Jpeg {
                quality: Quality::new(q),
            };
            backend.encode(&img, &path, &format).unwrap();
            std::fs::metadata(&path).unwrap().len()
        };

        assert!(size_at(10) < size_at(95));
    }

    #[test]
    fn tiff_compression_reaches_encoder() {
        use tiff::decoder::Decoder;
        use tiff::tags::{CompressionMethod, Tag};

        let tmp = tempfile::TempDir::new().unwrap();
        let img = create_test_image(128, 64);
        let backend = RustBackend::new();
        let write = |name: &str, compression: TiffCompression| {
            let path = tmp.path().join(name);
            backend
                .encode(&img, &path, &FormatOption::Tiff { compression })
                .unwrap();
            path
        };
        let compression_tag = |path: &Path| {
            let mut decoder = Decoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
            decoder.get_tag_u32(Tag::Compression).unwrap()
        };

        let raw = write("raw.tif", TiffCompression::None);
        let deflated = write("deflated.tif", TiffCompression::DeflateBest);
        let lzw = write("lzw.tif", TiffCompression::Lzw);

        let len = |p: &Path| std::fs::metadata(p).unwrap().len();
        assert!(len(&deflated) < len(&raw));
        assert_eq!(
            compression_tag(&raw),
            CompressionMethod::None.to_u16() as u32
        );
        assert_eq!(
            compression_tag(&deflated),
            CompressionMethod::Deflate.to_u16() as u32
        );
        assert_eq!(
            compression_tag(&lzw),
            CompressionMethod::LZW.to_u16() as u32
        );
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let img = create_test_rgba(16, 16);
        let format = FormatOption::Png {
            compression: PngCompression::Best,
        };
        let out = roundtrip(&img, "a.png", format);
        assert_eq!(out.to_rgba8().as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn tiff_roundtrip_through_dedicated_decoder() {
        let img = create_test_image(33, 17);
        for compression in [
            TiffCompression::None,
            TiffCompression::Lzw,
            TiffCompression::DeflateBalanced,
        ] {
            let out = roundtrip(&img, "a.tif", FormatOption::Tiff { compression });
            assert_eq!(out.to_rgb8().as_raw(), img.to_rgb8().as_raw());
        }
    }

    #[test]
    fn tiff_keeps_alpha() {
        let img = create_test_rgba(8, 8);
        let format = FormatOption::Tiff {
            compression: TiffCompression::default(),
        };
        let out = roundtrip(&img, "a.tiff", format);
        assert_eq!(out.to_rgba8().as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn gif_bmp_webp_roundtrip_dimensions() {
        let img = create_test_image(12, 9);
        for (name, format) in [
            ("a.gif", FormatOption::Gif),
            ("a.bmp", FormatOption::Bmp),
            ("a.webp", FormatOption::WebP),
        ] {
            let out = roundtrip(&img, name, format);
            assert_eq!(out.dimensions(), (12, 9), "{name}");
        }
    }

    #[test]
    fn avif_encode_writes_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.avif");
        let format = FormatOption::Avif {
            quality: Quality::new(60),
        };
        RustBackend::new()
            .encode(&create_test_image(32, 24), &path, &format)
            .unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn generic_decode_sniffs_content_over_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let png = tmp.path().join("a.png");
        let backend = RustBackend::new();
        backend
            .encode(
                &create_test_image(10, 10),
                &png,
                &FormatOption::Png {
                    compression: PngCompression::Fast,
                },
            )
            .unwrap();
        let misnamed = tmp.path().join("a.jpg");
        std::fs::rename(&png, &misnamed).unwrap();

        let out = backend.decode(&misnamed).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
    }

    #[test]
    fn encode_refuses_to_overwrite() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.jpg");
        std::fs::write(&path, b"keep me").unwrap();

        let result =
            RustBackend::new().encode(&create_test_image(4, 4), &path, &FormatOption::default());
        match result {
            Err(CodecError::Create { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
            }
            other => panic!("expected Create error, got {other:?}"),
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.decode(Path::new("/nonexistent/image.png")),
            Err(CodecError::Open { .. })
        ));
        assert!(matches!(
            backend.decode(Path::new("/nonexistent/image.tif")),
            Err(CodecError::Open { .. })
        ));
    }

    #[test]
    fn decode_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        for name in ["bad.png", "bad.tiff"] {
            let path = tmp.path().join(name);
            std::fs::write(&path, b"definitely not an image").unwrap();
            let result = RustBackend::new().decode(&path);
            assert!(
                matches!(result, Err(CodecError::Decode { .. })),
                "{name}: {result:?}"
            );
        }
    }
}
