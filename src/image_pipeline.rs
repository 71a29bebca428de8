//! Image decoding, circular badge normalization, and icon encoding helpers.

use std::fs;
use std::path::Path;

use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::{imageops::FilterType, DynamicImage, ExtendedColorType, Rgba, RgbaImage};
use log::debug;
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

pub const RING_COLOR: Rgba<u8> = Rgba([255, 215, 0, 180]);

pub fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    fs::create_dir_all(parent)
        .map_err(|err| format!("Failed to create directory {}: {}", parent.display(), err))
}

/// Writes `bytes` to a temporary sibling, then renames it over `target_path`.
pub fn write_file_atomic(target_path: &Path, bytes: &[u8]) -> Result<(), String> {
    ensure_parent_dir(target_path)?;
    let mut temp_name = target_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = target_path.with_file_name(temp_name);
    if temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    fs::write(&temp_path, bytes)
        .map_err(|err| format!("Failed to write {}: {}", temp_path.display(), err))?;
    fs::rename(&temp_path, target_path).map_err(|err| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to move {} into place: {}", target_path.display(), err)
    })
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
    if !looks_like_jpeg(bytes) {
        return None;
    }

    let options = DecoderOptions::new_cmd()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    let pixels = decoder.decode().ok()?;
    let (width, height) = decoder.dimensions()?;
    let image = RgbaImage::from_raw(width as u32, height as u32, pixels)?;
    Some(DynamicImage::ImageRgba8(image))
}

pub fn decode_image_from_memory_with_fallback(bytes: &[u8]) -> Result<DynamicImage, String> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => Ok(decoded),
        // Truncated or slightly malformed JPEGs are common on CDNs.
        Err(err) => decode_jpeg_non_strict(bytes).ok_or_else(|| err.to_string()),
    }
}

/// Crops the centered `min(w, h)` square out of `image` as RGBA.
pub fn center_square_crop(image: &DynamicImage) -> RgbaImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let side = width.min(height);
    let left = (width - side) / 2;
    let top = (height - side) / 2;
    image::imageops::crop_imm(&rgba, left, top, side, side).to_image()
}

fn distance_from_center(x: u32, y: u32, center: f32) -> f32 {
    let dx = x as f32 - center;
    let dy = y as f32 - center;
    (dx * dx + dy * dy).sqrt()
}

/// Zeroes alpha for pixels outside the circle inscribed in the square.
pub fn apply_circular_mask(square: &mut RgbaImage) {
    let side = square.width().min(square.height());
    let center = (side as f32 - 1.0) / 2.0;
    let radius = side as f32 / 2.0;
    for (x, y, pixel) in square.enumerate_pixels_mut() {
        if distance_from_center(x, y, center) > radius {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

fn blend_source_over(destination: Rgba<u8>, source: Rgba<u8>) -> Rgba<u8> {
    let source_alpha = f32::from(source[3]) / 255.0;
    let destination_alpha = f32::from(destination[3]) / 255.0;
    let out_alpha = source_alpha + destination_alpha * (1.0 - source_alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for channel in 0..3 {
        let blended = (f32::from(source[channel]) * source_alpha
            + f32::from(destination[channel]) * destination_alpha * (1.0 - source_alpha))
            / out_alpha;
        out[channel] = blended.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

pub fn ring_width_px(side: u32) -> u32 {
    (side / 32).max(1)
}

/// Composites a circular outline, inset one pixel from the edge, over the square.
pub fn draw_ring(square: &mut RgbaImage, color: Rgba<u8>) {
    let side = square.width().min(square.height());
    if side < 3 {
        return;
    }
    let center = (side as f32 - 1.0) / 2.0;
    let outer_radius = (side as f32 - 2.0) / 2.0;
    let inner_radius = outer_radius - ring_width_px(side) as f32;
    for (x, y, pixel) in square.enumerate_pixels_mut() {
        let distance = distance_from_center(x, y, center);
        if distance <= outer_radius && distance > inner_radius {
            *pixel = blend_source_over(*pixel, color);
        }
    }
}

/// Center-crops, masks to a circle, and rings the decoded badge image.
pub fn to_square_rgba(image: &DynamicImage) -> RgbaImage {
    let mut square = center_square_crop(image);
    apply_circular_mask(&mut square);
    draw_ring(&mut square, RING_COLOR);
    square
}

/// Upsamples once to the largest requested size so every frame shares one base.
pub fn icon_base(square: RgbaImage, largest_size: u32) -> RgbaImage {
    if square.width() >= largest_size {
        return square;
    }
    debug!(
        "Upsampling {}px square to {}px icon base",
        square.width(),
        largest_size
    );
    image::imageops::resize(&square, largest_size, largest_size, FilterType::Lanczos3)
}

pub fn icon_frames(base: &RgbaImage, sizes: &[u32]) -> Vec<RgbaImage> {
    sizes
        .iter()
        .map(|&size| {
            if base.width() == size && base.height() == size {
                base.clone()
            } else {
                image::imageops::resize(base, size, size, FilterType::Lanczos3)
            }
        })
        .collect()
}

/// Encodes PNG-compressed frames into an ICO container.
pub fn encode_icon(frames: &[RgbaImage]) -> Result<Vec<u8>, String> {
    let mut ico_frames = Vec::with_capacity(frames.len());
    for frame in frames {
        let (width, height) = frame.dimensions();
        let ico_frame = IcoFrame::as_png(frame.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|err| format!("Failed to encode {width}x{height} icon frame: {err}"))?;
        ico_frames.push(ico_frame);
    }
    let mut encoded = Vec::new();
    IcoEncoder::new(&mut encoded)
        .encode_images(&ico_frames)
        .map_err(|err| format!("Failed to encode icon: {err}"))?;
    Ok(encoded)
}

/// Builds the shared base from `square` and writes every size into one icon file.
pub fn write_icon_file(square: RgbaImage, sizes: &[u32], icon_path: &Path) -> Result<(), String> {
    let largest_size = sizes.iter().copied().max().unwrap_or(1);
    let base = icon_base(square, largest_size);
    let frames = icon_frames(&base, sizes);
    let encoded = encode_icon(&frames)?;
    write_file_atomic(icon_path, &encoded)
}

#[cfg(test)]
mod tests {
    use super::{
        apply_circular_mask, center_square_crop, decode_image_from_memory_with_fallback,
        encode_icon, icon_base, icon_frames, ring_width_px, to_square_rgba, write_file_atomic,
        RING_COLOR,
    };
    use image::{
        codecs::jpeg::JpegEncoder, DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb,
        RgbImage, Rgba, RgbaImage,
    };
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn opaque_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 40])
        }))
    }

    fn unique_temp_path(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock should be after UNIX_EPOCH")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("badge_favicon_{}_{}_{}", test_name, std::process::id(), nanos))
            .join("favicon.ico")
    }

    fn ico_directory_sizes(bytes: &[u8]) -> Vec<u32> {
        assert_eq!(&bytes[0..4], &[0, 0, 1, 0], "ico header should declare an icon");
        let count = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;
        (0..count)
            .map(|index| {
                let entry = 6 + index * 16;
                let width = u32::from(bytes[entry]);
                let height = u32::from(bytes[entry + 1]);
                assert_eq!(width, height, "icon frames should be square");
                if width == 0 {
                    256
                } else {
                    width
                }
            })
            .collect()
    }

    #[test]
    fn test_center_square_crop_uses_shorter_edge() {
        let source = opaque_image(120, 80);
        let square = center_square_crop(&source);
        assert_eq!(square.dimensions(), (80, 80));
        // Left offset is (120 - 80) / 2 = 20.
        assert_eq!(square.get_pixel(0, 0)[0], 20);
        assert_eq!(square.get_pixel(0, 5)[1], 5);
    }

    #[test]
    fn test_to_square_rgba_masks_outside_inscribed_circle() {
        let square = to_square_rgba(&opaque_image(90, 64));
        assert_eq!(square.dimensions(), (64, 64));
        let center = 31.5f32;
        let radius = 32.0f32;
        for (x, y, pixel) in square.enumerate_pixels() {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if (dx * dx + dy * dy).sqrt() > radius {
                assert_eq!(pixel[3], 0, "pixel ({x}, {y}) should be transparent");
            }
        }
        assert_eq!(square.get_pixel(0, 0)[3], 0);
        assert_eq!(square.get_pixel(63, 63)[3], 0);
        assert!(square.get_pixel(32, 32)[3] > 0);
    }

    #[test]
    fn test_to_square_rgba_keeps_center_opaque_for_odd_sides() {
        let square = to_square_rgba(&opaque_image(33, 47));
        assert_eq!(square.dimensions(), (33, 33));
        assert_eq!(square.get_pixel(16, 16)[3], 255);
    }

    #[test]
    fn test_ring_is_gold_over_opaque_pixels() {
        let square = to_square_rgba(&opaque_image(64, 64));
        // Row 31 near the left edge sits inside the ring band.
        let ring_pixel = square.get_pixel(2, 31);
        assert_eq!(ring_pixel[3], 255);
        assert!(ring_pixel[0] > 150, "ring should tint toward gold: {ring_pixel:?}");
        assert!(ring_pixel[1] > 120);
        assert_eq!(ring_width_px(64), 2);
        assert_eq!(ring_width_px(20), 1);
        assert_eq!(RING_COLOR, Rgba([255, 215, 0, 180]));
    }

    #[test]
    fn test_ring_is_translucent_over_transparent_pixels() {
        let mut transparent = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
        apply_circular_mask(&mut transparent);
        super::draw_ring(&mut transparent, RING_COLOR);
        assert_eq!(*transparent.get_pixel(2, 31), RING_COLOR);
        assert_eq!(transparent.get_pixel(32, 32)[3], 0);
    }

    #[test]
    fn test_icon_base_upsamples_small_squares_only() {
        let small = RgbaImage::from_pixel(40, 40, Rgba([1, 2, 3, 255]));
        assert_eq!(icon_base(small, 256).dimensions(), (256, 256));
        let large = RgbaImage::from_pixel(300, 300, Rgba([1, 2, 3, 255]));
        assert_eq!(icon_base(large, 256).dimensions(), (300, 300));
    }

    #[test]
    fn test_icon_frames_match_requested_sizes() {
        let base = RgbaImage::from_pixel(256, 256, Rgba([9, 9, 9, 255]));
        let frames = icon_frames(&base, &[16, 48, 256]);
        let dims: Vec<(u32, u32)> = frames.iter().map(|frame| frame.dimensions()).collect();
        assert_eq!(dims, vec![(16, 16), (48, 48), (256, 256)]);
    }

    #[test]
    fn test_encode_icon_contains_every_size() {
        let square = to_square_rgba(&opaque_image(50, 50));
        let sizes = [16, 32, 48, 64, 96, 128, 256];
        let base = icon_base(square, 256);
        let encoded = encode_icon(&icon_frames(&base, &sizes)).expect("icon should encode");
        assert_eq!(ico_directory_sizes(&encoded), sizes.to_vec());

        let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Ico)
            .expect("encoded icon should decode");
        assert_eq!(decoded.dimensions(), (256, 256));
    }

    #[test]
    fn test_write_icon_file_creates_parent_dirs() {
        let path = unique_temp_path("write_icon");
        let square = to_square_rgba(&opaque_image(20, 30));
        super::write_icon_file(square, &[16, 32], &path).expect("icon should be written");
        let bytes = std::fs::read(&path).expect("icon should exist");
        assert_eq!(ico_directory_sizes(&bytes), vec![16, 32]);
        let _ = std::fs::remove_dir_all(path.parent().expect("icon should have a parent"));
    }

    #[test]
    fn test_write_file_atomic_replaces_existing_file() {
        let path = unique_temp_path("atomic");
        write_file_atomic(&path, b"first").expect("first write should succeed");
        write_file_atomic(&path, b"second").expect("second write should succeed");
        assert_eq!(std::fs::read(&path).expect("file should exist"), b"second");
        let _ = std::fs::remove_dir_all(path.parent().expect("file should have a parent"));
    }

    #[test]
    fn test_decode_image_from_memory_with_fallback_decodes_jpeg_bytes() {
        let rgb = RgbImage::from_pixel(12, 9, Rgb([90, 140, 210]));
        let mut encoded = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut encoded, 85);
            encoder
                .encode_image(&DynamicImage::ImageRgb8(rgb))
                .expect("jpeg encoding should succeed");
        }
        encoded.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let decoded = decode_image_from_memory_with_fallback(&encoded)
            .expect("fallback decoder should decode jpeg bytes");
        assert_eq!(decoded.dimensions(), (12, 9));
    }

    #[test]
    fn test_decode_image_from_memory_with_fallback_rejects_svg_markup() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"></svg>"#;
        assert!(decode_image_from_memory_with_fallback(svg).is_err());
    }

    #[test]
    fn test_decode_image_from_memory_with_fallback_decodes_png_bytes() {
        let source =
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(7, 5, Rgba([8, 16, 24, 255])));
        let mut cursor = Cursor::new(Vec::<u8>::new());
        source
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("png encoding should succeed");
        let encoded = cursor.into_inner();

        let decoded = decode_image_from_memory_with_fallback(&encoded)
            .expect("primary decoder should decode png bytes");
        assert_eq!(decoded.dimensions(), (7, 5));
    }
}
