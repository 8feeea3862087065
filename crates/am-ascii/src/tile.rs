use am_core::frame::{LUMA_SCALE, SourceImage};

/// Moyenne exacte `sum / den` d'échantillons dans `[0, 255]`.
///
/// Kept as a fraction so inversion (`255 - mean`) and bucket lookups are
/// exact: inverting the mean equals the mean of the inverted samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mean {
    pub sum: u64,
    pub den: u64,
}

impl Mean {
    /// `255 - mean`.
    #[inline]
    #[must_use]
    pub fn inverted(self) -> Self {
        Self {
            sum: 255 * self.den - self.sum,
            den: self.den,
        }
    }

    /// Integral part of the mean.
    #[inline]
    #[must_use]
    pub fn floor_u8(self) -> u8 {
        if self.den == 0 {
            return 0;
        }
        (self.sum / self.den).min(255) as u8
    }
}

/// Per-channel and luminance means over one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileStats {
    pub r: Mean,
    pub g: Mean,
    pub b: Mean,
    pub luma: Mean,
}

impl TileStats {
    #[must_use]
    pub fn inverted(self) -> Self {
        Self {
            r: self.r.inverted(),
            g: self.g.inverted(),
            b: self.b.inverted(),
            luma: self.luma.inverted(),
        }
    }
}

/// Découpage d'une image en tuiles `tile_width × 1.75·tile_width`.
///
/// Row `r` covers `[floor(7·tw·r/4), floor(7·tw·(r+1)/4))`, so the tile
/// height is exact on average and the row count is `ceil(h / (1.75·tw))`.
/// The last column and row are clipped by the image edge.
///
/// # Example
/// ```
/// use am_ascii::tile::TileGeometry;
/// let g = TileGeometry::new(800, 600, 10);
/// assert_eq!(g.columns(), 80);
/// assert_eq!(g.rows(), 35); // ceil(600 / 17.5) = ceil(34.28..)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGeometry {
    width: u32,
    height: u32,
    tile_width: u32,
}

impl TileGeometry {
    #[must_use]
    pub fn new(width: u32, height: u32, tile_width: u32) -> Self {
        debug_assert!(tile_width > 0, "tile_width must be positive");
        Self {
            width,
            height,
            tile_width: tile_width.max(1),
        }
    }

    /// Tiles per row.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.width.div_ceil(self.tile_width)
    }

    /// Number of tile rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        let num = 4 * u64::from(self.height);
        let den = 7 * u64::from(self.tile_width);
        num.div_ceil(den) as u32
    }

    /// Horizontal pixel span `[x0, x1)` of column `col`.
    #[must_use]
    pub fn column_span(&self, col: u32) -> (u32, u32) {
        let x0 = col.saturating_mul(self.tile_width).min(self.width);
        let x1 = x0.saturating_add(self.tile_width).min(self.width);
        (x0, x1)
    }

    /// Vertical pixel span `[y0, y1)` of row `row`.
    #[must_use]
    pub fn row_span(&self, row: u32) -> (u32, u32) {
        let edge = |r: u32| -> u32 {
            let y = 7 * u64::from(self.tile_width) * u64::from(r) / 4;
            y.min(u64::from(self.height)) as u32
        };
        (edge(row), edge(row + 1))
    }
}

/// Average the pixels of `[x0, x1) × [y0, y1)`.
#[must_use]
pub fn tile_stats(img: &SourceImage, (x0, x1): (u32, u32), (y0, y1): (u32, u32)) -> TileStats {
    let frame = img.frame();
    let (mut r, mut g, mut b, mut l) = (0u64, 0u64, 0u64, 0u64);
    for y in y0..y1 {
        for x in x0..x1 {
            let (pr, pg, pb) = frame.pixel(x, y);
            r += u64::from(pr);
            g += u64::from(pg);
            b += u64::from(pb);
            l += u64::from(img.luma(x, y));
        }
    }
    let count = u64::from(x1 - x0) * u64::from(y1 - y0);
    TileStats {
        r: Mean { sum: r, den: count },
        g: Mean { sum: g, den: count },
        b: Mean { sum: b, den: count },
        luma: Mean {
            sum: l,
            den: count * u64::from(LUMA_SCALE),
        },
    }
}

/// Luminance moyenne de l'image entière.
#[must_use]
pub fn image_luma(img: &SourceImage) -> Mean {
    let sum = img.luma_grid().iter().map(|&v| u64::from(v)).sum();
    let count = img.luma_grid().len() as u64;
    Mean {
        sum,
        den: count * u64::from(LUMA_SCALE),
    }
}
