//! Colorspace conversions and u8 boundary conversions.
//!
//! Float YCrCb uses the OpenCV convention: chroma planes are offset by
//! 0.5 so all planes stay in [0,1] for in-range input.

use super::ImageF32;
use crate::capture::Frame;
use ndarray::Array2;

// ITU-R BT.601 luma weights and the matching chroma scale factors.
const W_R: f32 = 0.299;
const W_G: f32 = 0.587;
const W_B: f32 = 0.114;
const CR_SCALE: f32 = 0.713;
const CB_SCALE: f32 = 0.564;
const CHROMA_OFFSET: f32 = 0.5;

/// Converts a u8 frame into planar f32 in [0,1], keeping channel order.
pub fn frame_to_f32(frame: &Frame) -> ImageF32 {
    let (w, h, c) = (
        frame.width() as usize,
        frame.height() as usize,
        frame.channels() as usize,
    );
    let data = frame.pixels();
    let mut planes = vec![Array2::zeros((h, w)); c];
    for y in 0..h {
        for x in 0..w {
            let base = (y * w + x) * c;
            for (ch, plane) in planes.iter_mut().enumerate() {
                plane[[y, x]] = data[base + ch] as f32 / 255.0;
            }
        }
    }
    ImageF32::from_planes(planes)
}

/// Converts an f32 image back to u8 by scaling with 255 and clamping.
pub fn image_to_frame_clamped(img: &ImageF32, sequence: u64) -> Frame {
    let (w, h, c) = (img.width(), img.height(), img.channels());
    let mut pixels = Vec::with_capacity(w * h * c);
    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                let v = img.plane(ch)[[y, x]] * 255.0;
                pixels.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    Frame::new(pixels, w as u32, h as u32, c as u8, sequence)
}

/// Converts an f32 image to u8 by rescaling the observed [min, max]
/// range onto [0, 255].
///
/// An image whose range sits below the u8 quantization step maps to
/// mid-gray rather than blowing numerical residue up to full scale.
pub fn image_to_frame_rescaled(img: &ImageF32, sequence: u64) -> Frame {
    let (min, max) = img.min_max();
    let range = max - min;
    let (w, h, c) = (img.width(), img.height(), img.channels());
    if range <= 1e-3 {
        return Frame::filled(128, w as u32, h as u32, c as u8, sequence);
    }
    let scale = 255.0 / range;
    let mut pixels = Vec::with_capacity(w * h * c);
    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                let v = (img.plane(ch)[[y, x]] - min) * scale;
                pixels.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    Frame::new(pixels, w as u32, h as u32, c as u8, sequence)
}

/// Converts a three-plane BGR image to YCrCb.
pub fn bgr_to_ycrcb(img: &ImageF32) -> ImageF32 {
    debug_assert_eq!(img.channels(), 3);
    let (w, h) = (img.width(), img.height());
    let mut out = ImageF32::zeros(w, h, 3);
    for row in 0..h {
        for col in 0..w {
            let b = img.plane(0)[[row, col]];
            let g = img.plane(1)[[row, col]];
            let r = img.plane(2)[[row, col]];
            let y = W_R * r + W_G * g + W_B * b;
            out.plane_mut(0)[[row, col]] = y;
            out.plane_mut(1)[[row, col]] = (r - y) * CR_SCALE + CHROMA_OFFSET;
            out.plane_mut(2)[[row, col]] = (b - y) * CB_SCALE + CHROMA_OFFSET;
        }
    }
    out
}

/// Converts a three-plane YCrCb image back to BGR.
pub fn ycrcb_to_bgr(img: &ImageF32) -> ImageF32 {
    debug_assert_eq!(img.channels(), 3);
    let (w, h) = (img.width(), img.height());
    let mut out = ImageF32::zeros(w, h, 3);
    for row in 0..h {
        for col in 0..w {
            let y = img.plane(0)[[row, col]];
            let cr = img.plane(1)[[row, col]] - CHROMA_OFFSET;
            let cb = img.plane(2)[[row, col]] - CHROMA_OFFSET;
            let r = y + cr / CR_SCALE;
            let b = y + cb / CB_SCALE;
            let g = (y - W_R * r - W_B * b) / W_G;
            out.plane_mut(0)[[row, col]] = b;
            out.plane_mut(1)[[row, col]] = g;
            out.plane_mut(2)[[row, col]] = r;
        }
    }
    out
}

/// Collapses a BGR image to a single luma plane.
///
/// Single-plane images are returned as-is.
pub fn bgr_to_gray(img: &ImageF32) -> Array2<f32> {
    if img.channels() == 1 {
        return img.plane(0).clone();
    }
    let (w, h) = (img.width(), img.height());
    let mut out = Array2::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            let b = img.plane(0)[[row, col]];
            let g = img.plane(1)[[row, col]];
            let r = img.plane(2)[[row, col]];
            out[[row, col]] = W_R * r + W_G * g + W_B * b;
        }
    }
    out
}
