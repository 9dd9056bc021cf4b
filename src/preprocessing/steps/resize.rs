use image::RgbImage;

/// Largest width or height handed to the enhancement stages
pub const MAX_DIMENSION: u32 = 2000;

/// Shrink oversized images so neither side exceeds `MAX_DIMENSION`
/// Images already within bounds are returned untouched
pub fn apply(image: RgbImage) -> RgbImage {
    match target_dimensions(image.width(), image.height()) {
        Some((width, height)) => resize_area(&image, width, height),
        None => image,
    }
}

/// Output size for an oversized image, or `None` when no resize is needed
///
/// Both sides are scaled by the same factor `min(MAX/W, MAX/H)` and rounded.
pub fn target_dimensions(width: u32, height: u32) -> Option<(u32, u32)> {
    if width <= MAX_DIMENSION && height <= MAX_DIMENSION {
        return None;
    }

    let max = MAX_DIMENSION as f64;
    let scale = (max / width as f64).min(max / height as f64);
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, MAX_DIMENSION);

    Some((scaled(width), scaled(height)))
}

/// Area-averaging resize for downscaling
///
/// Every destination pixel is the coverage-weighted mean of the source pixels
/// lying under its footprint, which avoids the aliasing point samplers produce
/// when shrinking text.
fn resize_area(src: &RgbImage, dst_width: u32, dst_height: u32) -> RgbImage {
    let (src_width, src_height) = src.dimensions();
    let x_taps = area_weights(src_width, dst_width);
    let y_taps = area_weights(src_height, dst_height);

    let raw = src.as_raw();
    let src_stride = src_width as usize * 3;
    let dst_stride = dst_width as usize * 3;

    // Horizontal pass: src_height rows of dst_width pixels
    let mut rows = vec![0f32; src_height as usize * dst_stride];
    for (src_row, out_row) in raw
        .chunks_exact(src_stride)
        .zip(rows.chunks_exact_mut(dst_stride))
    {
        for (x, taps) in x_taps.iter().enumerate() {
            let out_px = &mut out_row[x * 3..x * 3 + 3];
            for &(s, weight) in taps {
                let src_px = &src_row[s * 3..s * 3 + 3];
                for c in 0..3 {
                    out_px[c] += src_px[c] as f32 * weight;
                }
            }
        }
    }

    // Vertical pass
    let mut out = RgbImage::new(dst_width, dst_height);
    for (taps, out_row) in y_taps.iter().zip(out.chunks_exact_mut(dst_stride)) {
        for (i, value) in out_row.iter_mut().enumerate() {
            let sum: f32 = taps
                .iter()
                .map(|&(s, weight)| rows[s * dst_stride + i] * weight)
                .sum();
            *value = sum.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Source indices and normalized weights for each destination index on one axis
fn area_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;

    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (start + scale).min(src_len as f64);

            let mut taps = Vec::new();
            let mut s = start.floor() as usize;
            while (s as f64) < end && s < src_len as usize {
                let coverage = end.min(s as f64 + 1.0) - start.max(s as f64);
                if coverage > 1e-9 {
                    taps.push((s, coverage));
                }
                s += 1;
            }

            let total: f64 = taps.iter().map(|&(_, w)| w).sum();
            taps.into_iter()
                .map(|(s, w)| (s, (w / total) as f32))
                .collect()
        })
        .collect()
}
