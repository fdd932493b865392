//! Synthetic raster generators.
//!
//! These create predictable, verifiable RGBA images so tests can check
//! that a pixel came from the expected source location.

/// Bytes per pixel of every generated raster.
pub const RGBA_BYTES: usize = 4;

/// Creates an RGBA raster whose pixels encode their own position.
///
/// Pixel (col, row) is `[col % 256, row % 256, (col / 256 + row / 256) % 256, 255]`.
///
/// # Example
///
/// ```
/// use test_utils::create_position_raster;
///
/// let raster = create_position_raster(4, 3);
/// assert_eq!(raster.len(), 4 * 3 * 4);
/// assert_eq!(&raster[4..8], &[1, 0, 0, 255]); // col=1, row=0
/// ```
pub fn create_position_raster(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * RGBA_BYTES);
    for row in 0..height {
        for col in 0..width {
            data.push((col % 256) as u8);
            data.push((row % 256) as u8);
            data.push(((col / 256 + row / 256) % 256) as u8);
            data.push(255);
        }
    }
    data
}

/// Creates a single-colour opaque RGBA raster.
pub fn create_solid_raster(width: usize, height: usize, rgb: [u8; 3]) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * RGBA_BYTES);
    for _ in 0..width * height {
        data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    data
}

/// Creates an RGBA raster with a north-to-south gradient in the red channel.
///
/// Row 0 (north) is 255, the last row approaches 0. Useful for checking
/// that north-up ordering survives reprojection.
pub fn create_latitude_gradient(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * RGBA_BYTES);
    for row in 0..height {
        let red = 255 - (row * 255 / height.max(1)) as u8;
        for _ in 0..width {
            data.extend_from_slice(&[red, 0, 0, 255]);
        }
    }
    data
}
