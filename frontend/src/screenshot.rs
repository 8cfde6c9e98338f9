//! PNG screenshots in the cabinet's upright orientation.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Rotate a native ARGB raster 90° counter-clockwise into packed RGB8.
/// The result is `height` pixels wide and `width` pixels tall.
pub fn rotate_upright(native: &[u32], width: usize, height: usize) -> Vec<u8> {
    let mut rgb = vec![0u8; width * height * 3];
    for oy in 0..width {
        for ox in 0..height {
            let px = native[ox * width + (width - 1 - oy)];
            let dst = (oy * height + ox) * 3;
            rgb[dst] = (px >> 16) as u8;
            rgb[dst + 1] = (px >> 8) as u8;
            rgb[dst + 2] = px as u8;
        }
    }
    rgb
}

pub fn save_png(
    path: &Path,
    native: &[u32],
    width: usize,
    height: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let rgb = rotate_upright(native, width, height);

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), height as u32, width as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 0xFFFF_FFFF;
    const B: u32 = 0xFF00_0000;

    #[test]
    fn first_native_pixel_lands_bottom_left() {
        // 4 wide, 2 tall native raster
        let mut native = [B; 8];
        native[0] = W;
        let rgb = rotate_upright(&native, 4, 2);

        // Upright image is 2 wide, 4 tall
        assert_eq!(rgb.len(), 2 * 4 * 3);
        let bottom_left = (3 * 2) * 3;
        assert_eq!(&rgb[bottom_left..bottom_left + 3], &[255, 255, 255]);
        assert_eq!(rgb.iter().filter(|&&c| c == 255).count(), 3);
    }

    #[test]
    fn end_of_first_row_lands_top_left() {
        let mut native = [B; 8];
        native[3] = W;
        let rgb = rotate_upright(&native, 4, 2);
        assert_eq!(&rgb[0..3], &[255, 255, 255]);
    }

    #[test]
    fn writes_png_file() {
        let path = std::env::temp_dir().join(format!("invaders_shot_{}.png", std::process::id()));
        let native = vec![B; 256 * 224];
        save_png(&path, &native, 256, 224).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        std::fs::remove_file(&path).unwrap();
    }
}
