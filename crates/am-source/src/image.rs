use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use am_core::error::ConvertError;
use am_core::frame::FrameBuffer;
use am_core::traits::Source;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frames, ImageDecoder, RgbaImage};

/// Décode une image fixe en RGB (l'alpha est ignoré).
///
/// # Errors
/// Returns [`ConvertError::ImageLoad`] if the file is missing, undecodable,
/// or has a zero dimension.
///
/// # Example
/// ```no_run
/// use am_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("photo.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer, ConvertError> {
    let img =
        image::open(path).map_err(|e| ConvertError::image_load(path.display().to_string(), e))?;
    let frame = rgb_frame(img);
    if frame.is_empty() {
        return Err(ConvertError::image_load(
            path.display().to_string(),
            "image vide",
        ));
    }
    log::debug!(
        "Image chargée : {} ({}x{})",
        path.display(),
        frame.width,
        frame.height
    );
    Ok(frame)
}

fn rgb_frame(img: DynamicImage) -> FrameBuffer {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    FrameBuffer {
        data: rgb.into_raw(),
        width,
        height,
    }
}

/// Source d'image fixe : une seule frame, puis fin de flux.
///
/// # Example
/// ```
/// use am_core::frame::FrameBuffer;
/// use am_core::traits::Source;
/// use am_source::image::ImageSource;
/// let mut source = ImageSource::from_frame(FrameBuffer::new(4, 4));
/// assert!(source.next_frame().unwrap().is_some());
/// assert!(source.next_frame().unwrap().is_none());
/// ```
pub struct ImageSource {
    frame: Option<FrameBuffer>,
    size: (u32, u32),
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded.
    pub fn new(path: &Path) -> Result<Self, ConvertError> {
        load_image(path).map(Self::from_frame)
    }

    /// Wrap an already-decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        let size = (frame.width, frame.height);
        Self {
            frame: Some(frame),
            size,
        }
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, ConvertError> {
        Ok(self.frame.take())
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }
}

/// GIF animé décodé paresseusement, frame par frame.
///
/// Les deux premières frames sont lues à la construction pour distinguer
/// un GIF animé d'une image fixe.
pub struct GifSource {
    origin: String,
    frames: Frames<'static>,
    pending: VecDeque<FrameBuffer>,
    size: (u32, u32),
    first_delay_ms: Option<u64>,
}

impl GifSource {
    /// Open `path` as an animated GIF.
    ///
    /// Returns `Ok(None)` when the file holds a single frame, so the caller
    /// can fall back to the still-image path.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] if the file cannot be opened or
    /// its first frames cannot be decoded.
    pub fn try_new(path: &Path) -> Result<Option<Self>, ConvertError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|e| ConvertError::image_load(origin.clone(), e))?;
        let decoder = GifDecoder::new(BufReader::new(file))
            .map_err(|e| ConvertError::image_load(origin.clone(), e))?;
        let size = decoder.dimensions();
        if size.0 == 0 || size.1 == 0 {
            return Err(ConvertError::image_load(origin, "GIF vide"));
        }

        let mut source = Self {
            origin,
            frames: decoder.into_frames(),
            pending: VecDeque::with_capacity(2),
            size,
            first_delay_ms: None,
        };
        for _ in 0..2 {
            match source.decode_next()? {
                Some(frame) => source.pending.push_back(frame),
                None => break,
            }
        }
        if source.pending.len() < 2 {
            log::debug!("GifSource: {} n'a qu'une frame", source.origin);
            return Ok(None);
        }
        log::info!(
            "GifSource: {} ({}x{}, délai {:?} ms)",
            source.origin,
            size.0,
            size.1,
            source.first_delay_ms
        );
        Ok(Some(source))
    }

    fn decode_next(&mut self) -> Result<Option<FrameBuffer>, ConvertError> {
        let Some(frame) = self.frames.next() else {
            return Ok(None);
        };
        let frame = frame.map_err(|e| ConvertError::image_load(self.origin.clone(), e))?;
        if self.first_delay_ms.is_none() {
            let (numer, denom) = frame.delay().numer_denom_ms();
            if denom > 0 && numer > 0 {
                self.first_delay_ms = Some(u64::from(numer.div_ceil(denom)));
            }
        }
        let rgba: RgbaImage = frame.into_buffer();
        Ok(Some(rgb_frame(DynamicImage::ImageRgba8(rgba))))
    }
}

impl Source for GifSource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, ConvertError> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(Some(frame));
        }
        self.decode_next()
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn frame_interval_hint(&self) -> Option<u64> {
        self.first_delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgb, RgbImage, Rgba};

    fn write_gif(path: &Path, colors: &[[u8; 4]]) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = colors.iter().map(|c| {
            Frame::from_parts(
                RgbaImage::from_pixel(6, 4, Rgba(*c)),
                0,
                0,
                Delay::from_numer_denom_ms(80, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }

    #[test]
    fn load_png_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(3, 2, Rgb([200, 10, 20])).save(&path).unwrap();
        let fb = load_image(&path).unwrap();
        assert_eq!((fb.width, fb.height), (3, 2));
        assert_eq!(fb.pixel(2, 1), (200, 10, 20));
    }

    #[test]
    fn missing_file_is_image_load_error() {
        let err = load_image(Path::new("/nonexistent/nope.png")).unwrap_err();
        assert!(matches!(err, ConvertError::ImageLoad { .. }));
    }

    #[test]
    fn garbage_file_is_image_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(
            load_image(&path),
            Err(ConvertError::ImageLoad { .. })
        ));
    }

    #[test]
    fn gif_frames_are_streamed_until_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        write_gif(
            &path,
            &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]],
        );

        let mut source = GifSource::try_new(&path).unwrap().unwrap();
        assert_eq!(source.native_size(), (6, 4));
        assert_eq!(source.frame_interval_hint(), Some(80));
        let mut count = 0;
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!((frame.width, frame.height), (6, 4));
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn single_frame_gif_is_not_animated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.gif");
        write_gif(&path, &[[10, 20, 30, 255]]);
        assert!(GifSource::try_new(&path).unwrap().is_none());
    }
}
