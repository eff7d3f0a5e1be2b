// Pixel filters behind a narrow trait so any capable library can be swapped in.
// Every function is pure: it reads one frame and returns a new one, so rows are
// processed on the rayon pool and the result is only handed back once complete.

use rayon::prelude::*;

use crate::types::FrameBuffer;

/// The filter seam the edit session depends on.
///
/// Implementations must be total on any valid frame and must not share
/// mutable state between calls.
pub trait FilterLibrary: Send + Sync {
    /// Gray round trip; the output keeps the input's channel count.
    fn to_grayscale(&self, buf: &FrameBuffer) -> FrameBuffer;

    /// Even kernel sizes are silently bumped to the next odd value (see [`odd_kernel_size`]).
    fn gaussian_blur(&self, buf: &FrameBuffer, kernel_size: u32) -> FrameBuffer;

    /// `low` is meant to be <= `high`; the order is not enforced.
    fn edge_detect(&self, buf: &FrameBuffer, low: u8, high: u8) -> FrameBuffer;

    /// 3x3 kernel: center 9, the eight neighbours -1.
    fn sharpen(&self, buf: &FrameBuffer) -> FrameBuffer;

    /// Rotates the 8-bit hue channel: `(h + degrees) mod 180`.
    fn hue_shift(&self, buf: &FrameBuffer, degrees: i32) -> FrameBuffer;

    /// `clamp(in * (1 + contrast/100) + brightness, 0, 255)` per channel.
    fn brightness_contrast(&self, buf: &FrameBuffer, brightness: i32, contrast: i32) -> FrameBuffer;
}

/// Software implementation of [`FilterLibrary`] for interleaved RGB frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuFilters;

/// Nearest odd kernel size >= 1; even values are incremented.
pub fn odd_kernel_size(k: u32) -> u32 {
    if k % 2 == 0 { k + 1 } else { k }
}

impl FilterLibrary for CpuFilters {
    fn to_grayscale(&self, buf: &FrameBuffer) -> FrameBuffer {
        let src = buf.as_bytes();
        let mut out = vec![0u8; src.len()];
        out.par_chunks_exact_mut(3)
            .zip(src.par_chunks_exact(3))
            .for_each(|(o, p)| o.fill(luma(p[0], p[1], p[2])));
        buf.with_data(out)
    }

    fn gaussian_blur(&self, buf: &FrameBuffer, kernel_size: u32) -> FrameBuffer {
        let ksize = odd_kernel_size(kernel_size);
        if ksize == 1 {
            return buf.clone();
        }
        let kernel = gaussian_kernel_q16(ksize);
        let (w, h) = (buf.width() as usize, buf.height() as usize);
        let mut tmp = vec![0u8; buf.as_bytes().len()];
        let mut out = vec![0u8; tmp.len()];
        horizontal_pass(buf.as_bytes(), &mut tmp, w, h, &kernel);
        vertical_pass(&tmp, &mut out, w, h, &kernel);
        buf.with_data(out)
    }

    fn edge_detect(&self, buf: &FrameBuffer, low: u8, high: u8) -> FrameBuffer {
        let (w, h) = (buf.width() as usize, buf.height() as usize);
        let gray: Vec<u8> = buf
            .as_bytes()
            .par_chunks_exact(3)
            .map(|p| luma(p[0], p[1], p[2]))
            .collect();
        let edges = canny(&gray, w, h, low, high);

        let mut out = vec![0u8; buf.as_bytes().len()];
        out.par_chunks_exact_mut(3)
            .zip(edges.par_iter())
            .for_each(|(o, &e)| o.fill(e));
        buf.with_data(out)
    }

    fn sharpen(&self, buf: &FrameBuffer) -> FrameBuffer {
        let (w, h) = (buf.width() as usize, buf.height() as usize);
        let src = buf.as_bytes();
        let stride = w * 3;
        let mut out = vec![0u8; src.len()];
        out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            let ys = [reflect101(y as i64 - 1, h), y, reflect101(y as i64 + 1, h)];
            for x in 0..w {
                let xs = [reflect101(x as i64 - 1, w), x, reflect101(x as i64 + 1, w)];
                for c in 0..3 {
                    let mut acc: i32 = 0;
                    for (j, &sy) in ys.iter().enumerate() {
                        for (i, &sx) in xs.iter().enumerate() {
                            let v = src[sy * stride + sx * 3 + c] as i32;
                            acc += if i == 1 && j == 1 { 9 * v } else { -v };
                        }
                    }
                    row[x * 3 + c] = acc.clamp(0, 255) as u8;
                }
            }
        });
        buf.with_data(out)
    }

    fn hue_shift(&self, buf: &FrameBuffer, degrees: i32) -> FrameBuffer {
        let src = buf.as_bytes();
        let mut out = vec![0u8; src.len()];
        out.par_chunks_exact_mut(3)
            .zip(src.par_chunks_exact(3))
            .for_each(|(o, p)| {
                let (h, s, v) = rgb_to_hsv8(p[0], p[1], p[2]);
                let h = (h as i32 + degrees).rem_euclid(HUE_RANGE) as u8;
                o.copy_from_slice(&hsv8_to_rgb(h, s, v));
            });
        buf.with_data(out)
    }

    fn brightness_contrast(&self, buf: &FrameBuffer, brightness: i32, contrast: i32) -> FrameBuffer {
        // Output depends only on the input value, so a 256-entry table covers every pixel.
        let gain = 1.0 + f64::from(contrast) / 100.0;
        let bias = f64::from(brightness);
        let mut lut = [0u8; 256];
        for (v, slot) in lut.iter_mut().enumerate() {
            // `as u8` truncates, matching an integer cast of the clipped value.
            *slot = (v as f64 * gain + bias).clamp(0.0, 255.0) as u8;
        }

        let src = buf.as_bytes();
        let mut out = vec![0u8; src.len()];
        out.par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(o, &v)| *o = lut[v as usize]);
        buf.with_data(out)
    }
}

// ----------------------------- shared helpers ------------------------------------------

/// 8-bit hue wraps at 180 (two degrees per step).
const HUE_RANGE: i32 = 180;

/// Fixed-point BT.601 luma (Q14 weights, rounded).
#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14) as u8
}

/// Mirror an out-of-range index without repeating the edge sample (`gfedcb|abcdefgh|gfedcba`).
#[inline]
fn reflect101(i: i64, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as i64;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

// ----------------------------- gaussian blur -------------------------------------------

/// Binomial kernels used when sigma is derived from a small size.
const SMALL_GAUSSIAN: [&[f64]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

fn gaussian_kernel_q16(ksize: u32) -> Vec<u32> {
    let weights: Vec<f64> = if ksize <= 7 {
        SMALL_GAUSSIAN[(ksize / 2) as usize].to_vec()
    } else {
        let sigma = 0.3 * ((f64::from(ksize) - 1.0) * 0.5 - 1.0) + 0.8;
        let denom = 2.0 * sigma * sigma;
        let r = i64::from(ksize / 2);
        (-r..=r).map(|i| (-((i * i) as f64) / denom).exp()).collect()
    };
    let sum: f64 = weights.iter().sum();

    let mut q: Vec<u32> = Vec::with_capacity(weights.len());
    let mut acc: i64 = 0;
    for w in &weights {
        let v = ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as i64;
        q.push(v as u32);
        acc += v;
    }
    // Push the rounding residue into the center tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = q.len() / 2;
        q[mid] = (i64::from(q[mid]) + delta).clamp(0, 65536) as u32;
    }
    q
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let stride = w * 3;
    debug_assert_eq!(dst.len(), stride * h);
    dst.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let line = &src[y * stride..(y + 1) * stride];
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = reflect101(x as i64 + ki as i64 - radius, w);
                for c in 0..3 {
                    acc[c] += u64::from(kw) * u64::from(line[sx * 3 + c]);
                }
            }
            for c in 0..3 {
                row[x * 3 + c] = q16_to_u8(acc[c]);
            }
        }
    });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let stride = w * 3;
    dst.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = reflect101(y as i64 + ki as i64 - radius, h);
                let idx = sy * stride + x * 3;
                for c in 0..3 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            for c in 0..3 {
                row[x * 3 + c] = q16_to_u8(acc[c]);
            }
        }
    });
}

#[inline]
fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

// ----------------------------- edge detection ------------------------------------------

const TAN_22_5: f64 = 0.414_213_562_373_095_05;
const TAN_67_5: f64 = 2.414_213_562_373_095;

const NOT_EDGE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Sobel gradients, non-maximum suppression and hysteresis on a gray plane.
/// Returns 255 for edge pixels and 0 elsewhere.
fn canny(gray: &[u8], w: usize, h: usize, low: u8, high: u8) -> Vec<u8> {
    // The detector swaps thresholds given in the wrong order.
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let (low, high) = (i32::from(low), i32::from(high));

    let at = |x: i64, y: i64| -> i32 {
        let sx = x.clamp(0, w as i64 - 1) as usize;
        let sy = y.clamp(0, h as i64 - 1) as usize;
        i32::from(gray[sy * w + sx])
    };

    // (gx, gy, |gx| + |gy|) per pixel
    let mut grad = vec![(0i32, 0i32, 0i32); w * h];
    grad.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let y = y as i64;
        for (x, g) in row.iter_mut().enumerate() {
            let x = x as i64;
            let gx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
            *g = (gx, gy, gx.abs() + gy.abs());
        }
    });

    let mag = |x: i64, y: i64| -> i32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0
        } else {
            grad[y as usize * w + x as usize].2
        }
    };

    let mut class = vec![NOT_EDGE; w * h];
    class.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let y = y as i64;
        for (x, slot) in row.iter_mut().enumerate() {
            let (gx, gy, m) = grad[y as usize * w + x];
            if m <= low {
                continue;
            }
            let x = x as i64;
            let ax = f64::from(gx.abs());
            let ay = f64::from(gy.abs());
            let is_max = if ay < ax * TAN_22_5 {
                m > mag(x - 1, y) && m >= mag(x + 1, y)
            } else if ay > ax * TAN_67_5 {
                m > mag(x, y - 1) && m >= mag(x, y + 1)
            } else {
                let s = if (gx ^ gy) < 0 { -1 } else { 1 };
                m > mag(x - s, y - 1) && m > mag(x + s, y + 1)
            };
            if is_max {
                *slot = if m > high { STRONG } else { WEAK };
            }
        }
    });

    // Hysteresis: weak pixels survive only when 8-connected to a strong one.
    let mut stack: Vec<usize> = class
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == STRONG)
        .map(|(i, _)| i)
        .collect();
    while let Some(idx) = stack.pop() {
        let (x, y) = ((idx % w) as i64, (idx / w) as i64);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if class[n] == WEAK {
                    class[n] = STRONG;
                    stack.push(n);
                }
            }
        }
    }

    class
        .into_iter()
        .map(|c| if c == STRONG { 255 } else { 0 })
        .collect()
}

// ----------------------------- hue -----------------------------------------------------

/// RGB -> HSV with hue in 0..180, saturation and value in 0..=255.
fn rgb_to_hsv8(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v == 0.0 { 0.0 } else { (255.0 * diff / v).round() };
    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    let h = ((h / 2.0).round() as i32).rem_euclid(HUE_RANGE);
    (h as u8, s as u8, v as u8)
}

fn hsv8_to_rgb(h: u8, s: u8, v: u8) -> [u8; 3] {
    if s == 0 {
        return [v, v, v];
    }
    let hf = f32::from(h) / 30.0;
    let sector = hf.floor();
    let f = hf - sector;
    let sf = f32::from(s) / 255.0;
    let vf = f32::from(v);

    let p = vf * (1.0 - sf);
    let q = vf * (1.0 - sf * f);
    let t = vf * (1.0 - sf * (1.0 - f));
    let (r, g, b) = match sector as i32 % 6 {
        0 => (vf, t, p),
        1 => (q, vf, p),
        2 => (p, vf, t),
        3 => (p, q, vf),
        4 => (t, p, vf),
        _ => (vf, p, q),
    };
    let to_u8 = |c: f32| c.round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}
