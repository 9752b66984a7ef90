//! Windows Shell32/GDI icon extraction for process executables.
//!
//! Resolves the first embedded icon of an executable with `ExtractIconW`,
//! reads its color bitmap out as a top-down 32-bit DIB at the system icon
//! resolution, and converts it in place to straight-alpha RGBA.

use base64::Engine as _;

use crate::error::ProbeError;

/// Bytes per pixel in every buffer this module produces (RGBA).
pub const BYTES_PER_PIXEL: usize = 4;

/// Decoded icon pixels together with their dimensions.
///
/// `pixels` is always exactly `width * height * 4` bytes, top-to-bottom,
/// left-to-right, in (red, green, blue, alpha) order with non-premultiplied
/// alpha. Construction is all-or-nothing; a partially-filled value cannot
/// exist.
#[derive(Debug, Clone)]
pub struct IconImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl IconImage {
    pub(crate) fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * BYTES_PER_PIXEL,
            "pixel buffer does not match dimensions"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Borrow the RGBA pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the image, yielding `(width, height, pixels)`.
    pub fn into_parts(self) -> (u32, u32, Vec<u8>) {
        (self.width, self.height, self.pixels)
    }

    /// Re-encode as a `data:image/bmp;base64,...` URI for direct UI display.
    ///
    /// BMP stores 32-bit pixels as BGRA in bottom-up row order, so the RGBA
    /// buffer is reordered while building the file.
    pub fn to_bmp_data_uri(&self) -> String {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        let pixel_data_size = row_bytes * self.height as usize;
        let file_size = 14 + 40 + pixel_data_size;
        let mut bmp = Vec::with_capacity(file_size);

        // BMP File Header (14 bytes)
        bmp.extend_from_slice(b"BM");
        bmp.extend_from_slice(&(file_size as u32).to_le_bytes());
        bmp.extend_from_slice(&0u16.to_le_bytes());
        bmp.extend_from_slice(&0u16.to_le_bytes());
        bmp.extend_from_slice(&54u32.to_le_bytes());

        // DIB Header (BITMAPINFOHEADER, 40 bytes)
        bmp.extend_from_slice(&40u32.to_le_bytes());
        bmp.extend_from_slice(&(self.width as i32).to_le_bytes());
        bmp.extend_from_slice(&(self.height as i32).to_le_bytes()); // positive = bottom-up
        bmp.extend_from_slice(&1u16.to_le_bytes());
        bmp.extend_from_slice(&32u16.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        bmp.extend_from_slice(&(pixel_data_size as u32).to_le_bytes());
        bmp.extend_from_slice(&0i32.to_le_bytes());
        bmp.extend_from_slice(&0i32.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());
        bmp.extend_from_slice(&0u32.to_le_bytes());

        // Pixel data (bottom-up row order, RGBA reordered to BGRA)
        for y in (0..self.height as usize).rev() {
            let row = &self.pixels[y * row_bytes..(y + 1) * row_bytes];
            for px in row.chunks_exact(BYTES_PER_PIXEL) {
                bmp.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bmp);
        format!("data:image/bmp;base64,{encoded}")
    }
}

/// Reorder every pixel's first three bytes from BGRA to RGBA in place.
/// Alpha bytes are untouched.
#[cfg(any(target_os = "windows", test))]
fn bgra_to_rgba(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        px.swap(0, 2);
    }
}

/// NUL-terminated UTF-16 form of a path for wide-character OS calls.
///
/// An interior NUL would silently truncate the path inside the OS call, so
/// it is rejected as a caller error before any handle is acquired.
#[cfg(any(target_os = "windows", test))]
fn to_wide(path: &str) -> Result<Vec<u16>, ProbeError> {
    if path.bytes().any(|b| b == 0) {
        return Err(ProbeError::InputEncoding(format!(
            "path contains interior NUL: {path:?}"
        )));
    }
    Ok(path.encode_utf16().chain(std::iter::once(0)).collect())
}

/// Extract the first embedded icon of `path` as an RGBA image at the system
/// icon resolution.
///
/// Every OS handle acquired along the way (icon, mask/color bitmaps, device
/// contexts) is scoped to this call and released on every exit path.
#[cfg(target_os = "windows")]
pub fn extract_icon(path: &str) -> Result<IconImage, ProbeError> {
    use crate::core::win_api::*;

    let wide = to_wide(path)?;

    // ExtractIconW returns 1 for files that are not executables or icons.
    let raw_icon = unsafe { ExtractIconW(0, wide.as_ptr(), 0) };
    if raw_icon == 0 || raw_icon == 1 {
        tracing::trace!("No icon found for {path}");
        return Err(ProbeError::IconNotFound(path.to_string()));
    }
    let icon = IconGuard(raw_icon);

    let mut info: IconInfo = unsafe { std::mem::zeroed() };
    if unsafe { GetIconInfo(icon.raw(), &mut info) } == 0 {
        return Err(ProbeError::IconInfoUnavailable { code: last_error() });
    }
    let _mask = GdiObjectGuard(info.hbm_mask);
    let color = GdiObjectGuard(info.hbm_color);
    if color.raw() == 0 {
        // Mask-only (monochrome) icon: there is no color bitmap to read.
        return Err(ProbeError::IconInfoUnavailable { code: 0 });
    }

    // Dimensions come from the system icon size settings, not the bitmap:
    // every extracted icon is normalized to one fixed resolution.
    let width = unsafe { GetSystemMetrics(SM_CXICON) };
    let height = unsafe { GetSystemMetrics(SM_CYICON) };
    if width <= 0 || height <= 0 || width > 256 || height > 256 {
        return Err(ProbeError::ResourceAcquisition {
            what: "system icon metrics",
            code: 0,
        });
    }

    let screen_dc = unsafe { GetDC(0) };
    if screen_dc == 0 {
        return Err(ProbeError::ResourceAcquisition {
            what: "screen device context",
            code: last_error(),
        });
    }
    let screen_dc = ScreenDcGuard(screen_dc);

    let mem_dc = unsafe { CreateCompatibleDC(screen_dc.raw()) };
    if mem_dc == 0 {
        return Err(ProbeError::ResourceAcquisition {
            what: "memory device context",
            code: last_error(),
        });
    }
    let mem_dc = MemDcGuard(mem_dc);

    let mut bmi = BitmapInfo {
        bmi_header: BitmapInfoHeader {
            bi_size: std::mem::size_of::<BitmapInfoHeader>() as u32,
            bi_width: width,
            bi_height: -height, // negative = top-down
            bi_planes: 1,
            bi_bit_count: 32,
            bi_compression: BI_RGB,
            bi_size_image: 0,
            bi_x_pels_per_meter: 0,
            bi_y_pels_per_meter: 0,
            bi_clr_used: 0,
            bi_clr_important: 0,
        },
        bmi_colors: [0],
    };

    let buf_len = width as usize * height as usize * BYTES_PER_PIXEL;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(buf_len)
        .map_err(|_| ProbeError::AllocationFailure(buf_len))?;
    pixels.resize(buf_len, 0);

    let scan_ret = unsafe {
        GetDIBits(
            mem_dc.raw(),
            color.raw(),
            0,
            height as u32,
            pixels.as_mut_ptr(),
            &mut bmi,
            DIB_RGB_COLORS,
        )
    };
    if scan_ret == 0 {
        return Err(ProbeError::BitmapRead { code: last_error() });
    }

    // The DIB is BGRA with straight alpha; callers always receive RGBA.
    bgra_to_rgba(&mut pixels);

    Ok(IconImage::new(width as u32, height as u32, pixels))
}

#[cfg(not(target_os = "windows"))]
pub fn extract_icon(_path: &str) -> Result<IconImage, ProbeError> {
    Err(ProbeError::Unsupported("icon extraction"))
}
