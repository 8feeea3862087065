use crate::color::Rgb;
use crate::error::ConvertError;

/// Facteur d'échelle de la luminance entière (poids BT.601 en pour-mille).
pub const LUMA_SCALE: u32 = 1000;

/// Buffer de pixels RGB, row-major, 3 bytes par pixel.
///
/// # Example
/// ```
/// use am_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 300);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGB, row-major, 3 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    /// Wrap an existing RGB buffer.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] if `data` does not hold exactly
    /// `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ConvertError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(ConvertError::image_load(
                "buffer RGB",
                format!("{} octets pour {width}×{height} (attendu {expected})", data.len()),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer filled with a single color.
    ///
    /// # Example
    /// ```
    /// use am_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (1, 2, 3));
    /// assert_eq!(fb.pixel(1, 1), (1, 2, 3));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, (r, g, b): (u8, u8, u8)) -> Self {
        let data = [r, g, b].repeat(width as usize * height as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// True when either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Accès au pixel (x, y) → (r, g, b).
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Écrit le pixel (x, y).
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, (r, g, b): (u8, u8, u8)) {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx] = r;
        self.data[idx + 1] = g;
        self.data[idx + 2] = b;
    }
}

/// Luminance BT.601 multipliée par [`LUMA_SCALE`], sans arrondi.
///
/// # Example
/// ```
/// use am_core::frame::{luma_scaled, LUMA_SCALE};
/// assert_eq!(luma_scaled(255, 255, 255), 255 * LUMA_SCALE);
/// assert_eq!(luma_scaled(0, 0, 0), 0);
/// ```
#[inline]
#[must_use]
pub fn luma_scaled(r: u8, g: u8, b: u8) -> u32 {
    u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114
}

/// A decoded, already-resized image plus its luminance grid.
///
/// Replaced as a whole for each new frame, never mutated.
#[derive(Clone, Debug)]
pub struct SourceImage {
    frame: FrameBuffer,
    luma: Vec<u32>,
}

impl SourceImage {
    /// Derive the luminance grid of `frame`.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] for a zero-dimension frame.
    pub fn new(frame: FrameBuffer) -> Result<Self, ConvertError> {
        if frame.is_empty() {
            return Err(ConvertError::image_load(
                "image",
                format!("dimensions nulles {}×{}", frame.width, frame.height),
            ));
        }
        let luma = frame
            .data
            .chunks_exact(3)
            .map(|px| luma_scaled(px[0], px[1], px[2]))
            .collect();
        Ok(Self { frame, luma })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.frame.height
    }

    #[must_use]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Scaled luminance at (x, y); divide by [`LUMA_SCALE`] for `[0, 255]`.
    #[inline]
    #[must_use]
    pub fn luma(&self, x: u32, y: u32) -> u32 {
        self.luma[y as usize * self.frame.width as usize + x as usize]
    }

    /// Whole scaled luminance grid, row-major.
    #[must_use]
    pub fn luma_grid(&self) -> &[u32] {
        &self.luma
    }
}

/// One styled character of the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    /// Caractère à afficher.
    pub ch: char,
    /// Couleur foreground.
    pub fg: Rgb,
    /// Couleur background. `None` = transparent.
    pub bg: Option<Rgb>,
}

/// Tile-by-tile rendering of one image, row-major.
///
/// # Example
/// ```
/// use am_core::color::Rgb;
/// use am_core::frame::{Document, Fragment};
/// let mut doc = Document::new(2, 1);
/// doc.push(Fragment { ch: '#', fg: Rgb::BLACK, bg: None });
/// doc.push(Fragment { ch: '.', fg: Rgb::BLACK, bg: None });
/// assert_eq!(doc.get(1, 0).ch, '.');
/// assert_eq!(doc.iter_rows().count(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Width in tiles.
    pub columns: u32,
    /// Height in tiles.
    pub rows: u32,
    cells: Vec<Fragment>,
}

impl Document {
    /// Empty document sized for `columns × rows` fragments.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            cells: Vec::with_capacity(columns as usize * rows as usize),
        }
    }

    /// Append the next fragment in row-major order.
    pub fn push(&mut self, fragment: Fragment) {
        debug_assert!(self.cells.len() < self.columns as usize * self.rows as usize);
        self.cells.push(fragment);
    }

    /// Fragment at tile (x, y).
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> &Fragment {
        &self.cells[y as usize * self.columns as usize + x as usize]
    }

    /// All fragments, row-major.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.cells
    }

    /// Iterate over complete rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Fragment]> {
        self.cells.chunks(self.columns.max(1) as usize)
    }
}

/// Per-frame documents shown one at a time, cycling every `frame_interval_ms`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimatedDocument {
    /// Documents dans l'ordre de décodage.
    pub frames: Vec<Document>,
    /// Délai entre deux frames, en millisecondes.
    pub frame_interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_checks_length() {
        assert!(FrameBuffer::from_raw(2, 2, vec![0; 12]).is_ok());
        assert!(FrameBuffer::from_raw(2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn source_image_rejects_empty() {
        let err = SourceImage::new(FrameBuffer::new(0, 4)).unwrap_err();
        assert!(matches!(err, ConvertError::ImageLoad { .. }));
    }

    #[test]
    fn luminance_grid_matches_pixels() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.set_pixel(1, 0, (255, 0, 0));
        let img = SourceImage::new(fb).unwrap();
        assert_eq!(img.luma(0, 0), 0);
        assert_eq!(img.luma(1, 0), 255 * 299);
        assert_eq!(img.luma_grid().len(), 2);
    }

    #[test]
    fn luminance_of_inverted_pixel_is_complement() {
        for (r, g, b) in [(0, 0, 0), (12, 200, 99), (255, 1, 128)] {
            assert_eq!(
                luma_scaled(255 - r, 255 - g, 255 - b),
                255 * LUMA_SCALE - luma_scaled(r, g, b)
            );
        }
    }

    #[test]
    fn document_rows_are_chunked_by_columns() {
        let mut doc = Document::new(3, 2);
        for i in 0..6u8 {
            doc.push(Fragment {
                ch: char::from(b'a' + i),
                fg: Rgb::gray(i),
                bg: None,
            });
        }
        let rows: Vec<String> = doc.iter_rows().map(|r| r.iter().map(|f| f.ch).collect()).collect();
        assert_eq!(rows, vec!["abc".to_string(), "def".to_string()]);
    }
}
