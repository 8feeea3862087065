use std::path::{Path, PathBuf};

use am_core::charset::CharRamp;
use am_core::color::Rgb;
use am_core::config::RenderConfig;
use am_core::error::ConvertError;
use am_core::frame::{AnimatedDocument, Document, Fragment, FrameBuffer, SourceImage};
use am_core::traits::Source;
use am_source::image::load_image;
use am_source::resize::Resizer;

use crate::tile::{TileGeometry, TileStats, image_luma, tile_stats};

/// Entrée du renderer : un chemin à décoder ou une frame déjà décodée.
#[derive(Clone, Debug)]
pub enum ImageInput {
    Path(PathBuf),
    Frame(FrameBuffer),
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<FrameBuffer> for ImageInput {
    fn from(frame: FrameBuffer) -> Self {
        Self::Frame(frame)
    }
}

/// Converts images into tile documents.
///
/// The configuration is validated once at construction and stays read-only;
/// every call to [`TileRenderer::load`] / [`TileRenderer::render`] is
/// independent of the previous ones.
///
/// # Example
/// ```
/// use am_ascii::renderer::TileRenderer;
/// use am_core::config::RenderConfig;
/// use am_core::frame::FrameBuffer;
///
/// let config = RenderConfig { target_width: 20, ..RenderConfig::default() };
/// let renderer = TileRenderer::new(config).unwrap();
/// let image = renderer.load(FrameBuffer::filled(40, 35, (0, 0, 0))).unwrap();
/// let doc = renderer.render(&image);
/// assert_eq!((doc.columns, doc.rows), (2, 1));
/// ```
pub struct TileRenderer {
    config: RenderConfig,
    ramp: CharRamp,
}

impl TileRenderer {
    /// Validate `config` and build a renderer.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] for an empty ramp or a zero tile/target width.
    pub fn new(config: RenderConfig) -> Result<Self, ConvertError> {
        config.validate()?;
        let ramp = CharRamp::new(&config.ramp)?;
        Ok(Self { config, ramp })
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Decode (if needed) and resize to the configured target width.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] when the source cannot be decoded
    /// or has a zero dimension.
    pub fn load(&self, input: impl Into<ImageInput>) -> Result<SourceImage, ConvertError> {
        self.load_with(&mut Resizer::new(), input.into())
    }

    fn load_with(
        &self,
        resizer: &mut Resizer,
        input: ImageInput,
    ) -> Result<SourceImage, ConvertError> {
        let frame = match input {
            ImageInput::Path(path) => load_image(&path)?,
            ImageInput::Frame(frame) => frame,
        };
        let resized = resizer.resize_to_width(frame, self.config.target_width)?;
        SourceImage::new(resized)
    }

    /// Tile loop over one image: row-major, one fragment per tile.
    #[must_use]
    pub fn render(&self, source: &SourceImage) -> Document {
        let geometry = TileGeometry::new(source.width(), source.height(), self.config.tile_width);
        let background = self.background(source);
        let (columns, rows) = (geometry.columns(), geometry.rows());
        log::debug!(
            "render: {}x{} px -> {columns}x{rows} tuiles",
            source.width(),
            source.height()
        );

        let mut doc = Document::new(columns, rows);
        for row in 0..rows {
            let y_span = geometry.row_span(row);
            for col in 0..columns {
                let mut stats = tile_stats(source, geometry.column_span(col), y_span);
                if self.config.invert {
                    stats = stats.inverted();
                }
                doc.push(self.fragment(&stats, background));
            }
        }
        doc
    }

    /// Decode and render a single file.
    ///
    /// # Errors
    /// Same as [`TileRenderer::load`].
    pub fn render_path(&self, path: &Path) -> Result<Document, ConvertError> {
        let image = self.load(path)?;
        Ok(self.render(&image))
    }

    /// Render every frame of `source`, in order, until end of stream.
    ///
    /// Frames are pulled one at a time; all documents are kept until the call
    /// returns.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] for a zero interval and
    /// [`ConvertError::ImageLoad`] if a frame fails to decode or the source
    /// yields no frame at all.
    pub fn render_animated<S: Source + ?Sized>(
        &self,
        source: &mut S,
        frame_interval_ms: u64,
    ) -> Result<AnimatedDocument, ConvertError> {
        if frame_interval_ms == 0 {
            return Err(ConvertError::Config(
                "frame_interval_ms doit être strictement positif".into(),
            ));
        }
        let mut resizer = Resizer::new();
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame()? {
            let image = self.load_with(&mut resizer, ImageInput::Frame(frame))?;
            frames.push(self.render(&image));
            log::debug!("render_animated: frame {} rendue", frames.len());
        }
        if frames.is_empty() {
            return Err(ConvertError::image_load(
                "animation",
                "aucune frame décodée",
            ));
        }
        log::info!(
            "render_animated: {} frames, {} ms par frame",
            frames.len(),
            frame_interval_ms
        );
        Ok(AnimatedDocument {
            frames,
            frame_interval_ms,
        })
    }

    fn background(&self, source: &SourceImage) -> Option<Rgb> {
        if self.config.background {
            let mut mean = image_luma(source);
            if self.config.invert {
                mean = mean.inverted();
            }
            Some(Rgb::gray(mean.floor_u8()))
        } else if self.config.invert {
            Some(Rgb::BLACK)
        } else {
            None
        }
    }

    fn fragment(&self, stats: &TileStats, bg: Option<Rgb>) -> Fragment {
        let ch = self.ramp.select(stats.luma.sum, stats.luma.den);
        let fg = if self.config.color {
            Rgb(stats.r.floor_u8(), stats.g.floor_u8(), stats.b.floor_u8())
        } else {
            Rgb::gray(stats.luma.floor_u8())
        };
        Fragment { ch, fg, bg }
    }
}
