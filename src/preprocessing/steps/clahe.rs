use crate::preprocessing::border::PaddedPlane;
use image::GrayImage;

/// Histogram clip limit, relative to a flat histogram of the tile
pub const CLIP_LIMIT: f32 = 3.0;
/// Tiles across and down
pub const TILE_GRID: (usize, usize) = (8, 8);

/// Contrast Limited Adaptive Histogram Equalization on the lightness plane
pub fn apply(lightness: &GrayImage) -> GrayImage {
    clahe(lightness, CLIP_LIMIT, TILE_GRID)
}

/// Equalize each tile of a `tiles_x` x `tiles_y` grid with a clipped
/// histogram, then blend the four nearest tile mappings bilinearly so tile
/// seams do not show
fn clahe(src: &GrayImage, clip_limit: f32, (tiles_x, tiles_y): (usize, usize)) -> GrayImage {
    let width = src.width() as usize;
    let height = src.height() as usize;

    // Grow to a multiple of the grid so every tile has the same size
    let pad_right = (tiles_x - width % tiles_x) % tiles_x;
    let pad_bottom = (tiles_y - height % tiles_y) % tiles_y;
    let padded = PaddedPlane::new(src, 0, 0, pad_right, pad_bottom);

    let tile_width = padded.width() / tiles_x;
    let tile_height = padded.height() / tiles_y;
    let tile_area = tile_width * tile_height;

    let clip = ((clip_limit * tile_area as f32 / 256.0) as u32).max(1);
    let lut_scale = 255.0 / tile_area as f32;

    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut histogram = [0u32; 256];
            for y in ty * tile_height..(ty + 1) * tile_height {
                for &v in padded.row(tx * tile_width, y, tile_width) {
                    histogram[v as usize] += 1;
                }
            }

            clip_histogram(&mut histogram, clip);

            let lut = &mut luts[ty * tiles_x + tx];
            let mut cumulative = 0u32;
            for (entry, &count) in lut.iter_mut().zip(histogram.iter()) {
                cumulative += count;
                *entry = (cumulative as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let inv_tile_width = 1.0 / tile_width as f32;
    let inv_tile_height = 1.0 / tile_height as f32;
    let x_blend: Vec<(usize, usize, f32)> = (0..width)
        .map(|x| blend_position(x, inv_tile_width, tiles_x))
        .collect();

    let mut out = GrayImage::new(width as u32, height as u32);
    for (y, (src_row, out_row)) in src
        .as_raw()
        .chunks_exact(width)
        .zip(out.chunks_exact_mut(width))
        .enumerate()
    {
        let (ty1, ty2, ya) = blend_position(y, inv_tile_height, tiles_y);
        let top = &luts[ty1 * tiles_x..(ty1 + 1) * tiles_x];
        let bottom = &luts[ty2 * tiles_x..(ty2 + 1) * tiles_x];

        for ((&v, value), &(tx1, tx2, xa)) in src_row.iter().zip(out_row.iter_mut()).zip(&x_blend) {
            let v = v as usize;
            let upper = top[tx1][v] as f32 * (1.0 - xa) + top[tx2][v] as f32 * xa;
            let lower = bottom[tx1][v] as f32 * (1.0 - xa) + bottom[tx2][v] as f32 * xa;
            let blended = upper * (1.0 - ya) + lower * ya;
            *value = blended.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Neighboring tile indices along one axis and the weight of the second one
/// Positions are measured from tile centers; pixels outside the outermost
/// centers use the edge tile alone
fn blend_position(pos: usize, inv_tile: f32, tiles: usize) -> (usize, usize, f32) {
    let f = pos as f32 * inv_tile - 0.5;
    let first = f.floor();
    let weight = f - first;
    let first = first as isize;

    let lo = first.max(0) as usize;
    let hi = ((first + 1) as usize).min(tiles - 1);
    (lo, hi, weight)
}

/// Cap every bin at `clip` and spread the excess evenly over all bins
/// Leftover counts go to every `256 / leftover`-th bin
fn clip_histogram(histogram: &mut [u32; 256], clip: u32) {
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let per_bin = excess / 256;
    let mut residual = (excess % 256) as usize;
    for count in histogram.iter_mut() {
        *count += per_bin;
    }

    if residual > 0 {
        let step = (256 / residual).max(1);
        let mut i = 0;
        while i < 256 && residual > 0 {
            histogram[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}
