//! PNG sample loading and output export

use crate::io::error::{GenerationError, Result, invalid_parameter};
use image::{ImageBuffer, Rgba};
use ndarray::Array2;
use std::path::Path;

/// Load a PNG sample as rows of RGBA tile tokens
///
/// Every distinct pixel value becomes a distinct tile; the grid is row-major,
/// matching the sample orientation.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded as an image.
pub fn load_sample_png(path: &Path) -> Result<Vec<Vec<[u8; 4]>>> {
    let img = image::open(path)
        .map_err(|e| GenerationError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgba8();

    let (width, height) = img.dimensions();
    let mut rows = Vec::with_capacity(height as usize);
    for y in 0..height {
        let mut row = Vec::with_capacity(width as usize);
        for x in 0..width {
            row.push(img.get_pixel(x, y).0);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Export a decided output grid as a PNG image
///
/// # Errors
///
/// Returns an error if:
/// - A cell's palette index is out of bounds for the palette
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_grid_png(grid: &Array2<usize>, palette: &[[u8; 4]], output_path: &Path) -> Result<()> {
    let (height, width) = grid.dim();
    let mut img = ImageBuffer::new(width as u32, height as u32);

    for y in 0..height {
        for x in 0..width {
            let tile = grid.get((y, x)).copied().unwrap_or(0);
            let rgba = palette.get(tile).copied().ok_or_else(|| {
                GenerationError::InvalidSample {
                    reason: format!("palette index {tile} exceeds palette of {}", palette.len()),
                }
            })?;
            img.put_pixel(x as u32, y as u32, Rgba(rgba));
        }
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GenerationError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    img.save(output_path).map_err(|e| GenerationError::ImageExport {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Parse an `RRGGBB` or `RRGGBBAA` hex string into an RGBA tile token
///
/// Used to name constraint tiles on the command line; alpha defaults to 255.
///
/// # Errors
///
/// Returns an error if the string has the wrong length or non-hex digits.
pub fn parse_hex_color(text: &str) -> Result<[u8; 4]> {
    let digits = text.strip_prefix('#').unwrap_or(text);
    if digits.len() != 6 && digits.len() != 8 {
        return Err(invalid_parameter(
            "color",
            &text,
            &"expected RRGGBB or RRGGBBAA hex digits",
        ));
    }
    let mut channels = [0u8; 4];
    channels[3] = 255;
    for (index, chunk) in digits.as_bytes().chunks(2).enumerate().take(4) {
        let pair = std::str::from_utf8(chunk)
            .ok()
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| invalid_parameter("color", &text, &"contains non-hex digits"))?;
        if let Some(channel) = channels.get_mut(index) {
            *channel = pair;
        }
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_rgb() {
        assert_eq!(parse_hex_color("ff0080").ok(), Some([255, 0, 128, 255]));
    }

    #[test]
    fn test_parse_hex_color_rgba_and_hash_prefix() {
        assert_eq!(parse_hex_color("#00ff0080").ok(), Some([0, 255, 0, 128]));
    }

    #[test]
    fn test_parse_hex_color_rejects_garbage() {
        assert!(parse_hex_color("xyz").is_err());
        assert!(parse_hex_color("ff00").is_err());
        assert!(parse_hex_color("gg0000").is_err());
    }
}
