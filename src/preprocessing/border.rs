//! Border extrapolation shared by the neighborhood filters

use image::GrayImage;

/// Mirror an out-of-range index back into `0..len` without repeating the edge
/// sample (`gfedcb|abcdefgh|gfedcba`)
pub fn reflect_101(index: isize, len: usize) -> usize {
    debug_assert!(len > 0, "reflect_101 on an empty axis");
    if len == 1 {
        return 0;
    }

    let last = len as isize - 1;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

/// A copy of a plane grown by mirrored margins
pub struct PaddedPlane {
    data: Vec<u8>,
    stride: usize,
}

impl PaddedPlane {
    /// Pad `src` by `left`/`right` columns and `top`/`bottom` rows
    pub fn new(src: &GrayImage, left: usize, top: usize, right: usize, bottom: usize) -> Self {
        let width = src.width() as usize;
        let height = src.height() as usize;
        let stride = width + left + right;
        let rows = height + top + bottom;
        let raw = src.as_raw();

        let columns: Vec<usize> = (0..stride)
            .map(|px| reflect_101(px as isize - left as isize, width))
            .collect();

        let mut data = Vec::with_capacity(stride * rows);
        for py in 0..rows {
            let sy = reflect_101(py as isize - top as isize, height);
            let row = &raw[sy * width..(sy + 1) * width];
            data.extend(columns.iter().map(|&sx| row[sx]));
        }

        Self { data, stride }
    }

    /// Pad by the same margin on every side
    pub fn uniform(src: &GrayImage, border: usize) -> Self {
        Self::new(src, border, border, border, border)
    }

    /// `len` samples starting at padded coordinates (`x`, `y`)
    #[inline]
    pub fn row(&self, x: usize, y: usize, len: usize) -> &[u8] {
        let start = y * self.stride + x;
        &self.data[start..start + len]
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    pub fn width(&self) -> usize {
        self.stride
    }

    pub fn height(&self) -> usize {
        self.data.len() / self.stride
    }
}
