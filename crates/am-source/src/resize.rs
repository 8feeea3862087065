use am_core::error::ConvertError;
use am_core::frame::FrameBuffer;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};

/// Hauteur après mise à l'échelle à `target_width`, ratio conservé.
///
/// `floor(target_width * height / width)`, jamais moins de 1.
///
/// # Example
/// ```
/// use am_source::resize::scaled_height;
/// assert_eq!(scaled_height(400, 300, 800), 600);
/// assert_eq!(scaled_height(1000, 1, 10), 1);
/// ```
#[must_use]
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let h = u64::from(target_width) * u64::from(height) / u64::from(width);
    h.clamp(1, u64::from(u32::MAX)) as u32
}

/// Resizer réutilisable wrappant fast_image_resize (bilinéaire, RGB).
///
/// Réutilisé d'une frame à l'autre pendant un rendu animé.
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Copie de la source, réutilisée entre les frames.
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            src_buf: Vec::new(),
        }
    }

    /// Scale `src` so its width equals `target_width`, preserving aspect ratio.
    ///
    /// Returns `src` untouched when the width already matches.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] for a zero-dimension source or a
    /// failed resize.
    ///
    /// # Example
    /// ```
    /// use am_source::resize::Resizer;
    /// use am_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let dst = r.resize_to_width(FrameBuffer::new(100, 50), 40).unwrap();
    /// assert_eq!((dst.width, dst.height), (40, 20));
    /// ```
    pub fn resize_to_width(
        &mut self,
        src: FrameBuffer,
        target_width: u32,
    ) -> Result<FrameBuffer, ConvertError> {
        if src.is_empty() {
            return Err(ConvertError::image_load(
                "image",
                format!("dimensions nulles {}×{}", src.width, src.height),
            ));
        }
        if src.width == target_width {
            return Ok(src);
        }
        let target_height = scaled_height(src.width, src.height, target_width);
        let mut dst = FrameBuffer::new(target_width, target_height);

        // fast_image_resize demande &mut sur la source : copie dans le scratch
        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x3)
                .map_err(|e| ConvertError::image_load("resize source", e))?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x3)
                .map_err(|e| ConvertError::image_load("resize destination", e))?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .map_err(|e| ConvertError::image_load("resize", e))?;

        log::debug!(
            "Resize {}x{} -> {}x{}",
            src.width,
            src.height,
            target_width,
            target_height
        );
        Ok(dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for one-shot usage.
///
/// # Errors
/// Same as [`Resizer::resize_to_width`].
pub fn resize_to_width(src: FrameBuffer, target_width: u32) -> Result<FrameBuffer, ConvertError> {
    Resizer::new().resize_to_width(src, target_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_width_is_untouched() {
        let mut src = FrameBuffer::new(8, 3);
        src.set_pixel(7, 2, (9, 8, 7));
        let out = resize_to_width(src.clone(), 8).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        let out = resize_to_width(FrameBuffer::new(200, 100), 50).unwrap();
        assert_eq!((out.width, out.height), (50, 25));
        assert_eq!(out.data.len(), 50 * 25 * 3);

        let up = resize_to_width(FrameBuffer::new(3, 7), 30).unwrap();
        assert_eq!((up.width, up.height), (30, 70));
    }

    #[test]
    fn height_never_collapses_to_zero() {
        let out = resize_to_width(FrameBuffer::new(500, 1), 10).unwrap();
        assert_eq!((out.width, out.height), (10, 1));
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(matches!(
            resize_to_width(FrameBuffer::new(0, 0), 10),
            Err(ConvertError::ImageLoad { .. })
        ));
    }

    #[test]
    fn resizer_is_reusable() {
        let mut r = Resizer::new();
        for w in [10, 64, 33] {
            let out = r.resize_to_width(FrameBuffer::new(128, 96), w).unwrap();
            assert_eq!(out.width, w);
        }
    }
}
