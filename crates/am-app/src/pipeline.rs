use std::path::Path;

use am_ascii::TileRenderer;
use am_core::config::AnimationConfig;
use am_core::traits::Source;
use am_export::{PageStyle, render_animated, render_document, validate_output_target, write_markup};
use am_source::{GifSource, ImageSource};
use anyhow::{Context, Result};

/// Délai par défaut quand ni la configuration ni la source n'en donnent.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 100;

/// Media types recognised by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Image fixe, décodée par le crate `image`.
    Still,
    /// GIF, animé ou non.
    Gif,
    /// Vidéo décodée via ffmpeg.
    Video,
}

/// Classify a path by its extension. Unknown extensions are tried as stills.
#[must_use]
pub fn classify_media(path: &Path) -> MediaKind {
    let Some(ext) = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return MediaKind::Still;
    };
    match ext.as_str() {
        "gif" => MediaKind::Gif,
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "ts" | "mpg" | "mpeg" => {
            MediaKind::Video
        }
        _ => MediaKind::Still,
    }
}

/// Configured interval first, then the source's own timing, then the default.
#[must_use]
pub fn resolve_interval(animation: &AnimationConfig, hint: Option<u64>) -> u64 {
    animation
        .frame_interval_ms
        .or(hint.filter(|&ms| ms > 0))
        .unwrap_or(DEFAULT_FRAME_INTERVAL_MS)
}

/// Résumé d'une conversion réussie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conversion {
    /// Frames rendues ; 1 pour une image fixe.
    pub frames: usize,
    pub animated: bool,
}

/// Convert `input` into an HTML page written to `output`.
///
/// The output target is checked before any decoding so a bad destination
/// fails fast.
///
/// # Errors
/// Returns the underlying [`am_core::error::ConvertError`] (wrapped with the
/// input path) when the target is invalid, decoding fails, or the write fails.
pub fn convert_file(
    renderer: &TileRenderer,
    animation: &AnimationConfig,
    input: &Path,
    output: &Path,
    force_animated: bool,
) -> Result<Conversion> {
    validate_output_target(output)?;
    let style = PageStyle::from_config(renderer.config());

    let mut source: Box<dyn Source> = match classify_media(input) {
        MediaKind::Gif => match GifSource::try_new(input)? {
            Some(gif) => Box::new(gif),
            None if force_animated => Box::new(ImageSource::new(input)?),
            None => return convert_still(renderer, &style, input, output),
        },
        MediaKind::Video => open_video(renderer, input)?,
        MediaKind::Still if force_animated => Box::new(ImageSource::new(input)?),
        MediaKind::Still => return convert_still(renderer, &style, input, output),
    };

    let interval = resolve_interval(animation, source.frame_interval_hint());
    let anim = renderer
        .render_animated(source.as_mut(), interval)
        .with_context(|| format!("rendu animé de {}", input.display()))?;
    write_markup(output, &render_animated(&style, &anim))?;
    log::info!(
        "{} -> {} ({} frames, {interval} ms)",
        input.display(),
        output.display(),
        anim.frames.len()
    );
    Ok(Conversion {
        frames: anim.frames.len(),
        animated: true,
    })
}

fn convert_still(
    renderer: &TileRenderer,
    style: &PageStyle,
    input: &Path,
    output: &Path,
) -> Result<Conversion> {
    let doc = renderer.render_path(input)?;
    write_markup(output, &render_document(style, &doc))?;
    log::info!(
        "{} -> {} ({}x{} tuiles)",
        input.display(),
        output.display(),
        doc.columns,
        doc.rows
    );
    Ok(Conversion {
        frames: 1,
        animated: false,
    })
}

#[cfg(feature = "video")]
fn open_video(renderer: &TileRenderer, input: &Path) -> Result<Box<dyn Source>> {
    let source =
        am_source::video::VideoSource::new(input, Some(renderer.config().target_width))?;
    let info = source.info();
    log::info!(
        "Vidéo {} : {}x{} @ {:.2} fps",
        input.display(),
        info.width,
        info.height,
        info.fps
    );
    Ok(Box::new(source))
}

#[cfg(not(feature = "video"))]
fn open_video(_renderer: &TileRenderer, input: &Path) -> Result<Box<dyn Source>> {
    anyhow::bail!(
        "{} : la lecture vidéo requiert la feature 'video' (ffmpeg).",
        input.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::config::RenderConfig;
    use am_core::error::ConvertError;
    use am_core::frame::FrameBuffer;
    use am_source::MemorySource;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs::File;

    fn renderer() -> TileRenderer {
        TileRenderer::new(RenderConfig {
            target_width: 20,
            tile_width: 5,
            ..RenderConfig::default()
        })
        .unwrap()
    }

    fn write_gif(path: &Path, frames: usize) {
        let mut encoder = GifEncoder::new(File::create(path).unwrap());
        let frames = (0..frames).map(|i| {
            let v = (i * 100) as u8;
            Frame::from_parts(
                RgbaImage::from_pixel(20, 10, Rgba([v, v, v, 255])),
                0,
                0,
                Delay::from_numer_denom_ms(60, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }

    #[test]
    fn classify_by_extension() {
        assert_eq!(classify_media(Path::new("a.PNG")), MediaKind::Still);
        assert_eq!(classify_media(Path::new("a.jpeg")), MediaKind::Still);
        assert_eq!(classify_media(Path::new("a.Gif")), MediaKind::Gif);
        assert_eq!(classify_media(Path::new("clip.mp4")), MediaKind::Video);
        assert_eq!(classify_media(Path::new("noext")), MediaKind::Still);
    }

    #[test]
    fn interval_precedence() {
        let unset = AnimationConfig::default();
        let set = AnimationConfig {
            frame_interval_ms: Some(40),
        };
        assert_eq!(resolve_interval(&set, Some(80)), 40);
        assert_eq!(resolve_interval(&unset, Some(80)), 80);
        assert_eq!(resolve_interval(&unset, Some(0)), DEFAULT_FRAME_INTERVAL_MS);
        assert_eq!(resolve_interval(&unset, None), DEFAULT_FRAME_INTERVAL_MS);
    }

    #[test]
    fn source_hint_used_when_unconfigured() {
        let source = MemorySource::new(vec![FrameBuffer::new(4, 4)]).with_interval(33);
        let unset = AnimationConfig::default();
        assert_eq!(resolve_interval(&unset, source.frame_interval_hint()), 33);
        let set = AnimationConfig {
            frame_interval_ms: Some(50),
        };
        assert_eq!(resolve_interval(&set, source.frame_interval_hint()), 50);
    }

    #[cfg(all(unix, feature = "video"))]
    #[test]
    fn video_failing_mid_stream_renders_nothing() {
        use am_source::video::{Tool, VideoSource, VideoTools};

        let dir = tempfile::tempdir().unwrap();
        let ffprobe_script = dir.path().join("ffprobe.sh");
        std::fs::write(&ffprobe_script, "printf 'width=2\\nheight=2\\nr_frame_rate=10/1\\n'\n").unwrap();
        let ffmpeg = dir.path().join("ffmpeg.sh");
        std::fs::write(&ffmpeg, "head -c 12 /dev/zero\nexit 1\n").unwrap();
        let tools = VideoTools {
            ffprobe: Tool::with_leading_args("sh", [ffprobe_script]),
            ffmpeg: Tool::with_leading_args("sh", [ffmpeg]),
        };

        let mut source =
            VideoSource::with_tools(&dir.path().join("clip.mp4"), Some(2), &tools).unwrap();
        let renderer = TileRenderer::new(RenderConfig {
            target_width: 2,
            tile_width: 1,
            ..RenderConfig::default()
        })
        .unwrap();
        let res = renderer.render_animated(&mut source, 100);
        assert!(matches!(res, Err(ConvertError::ImageLoad { .. })));
    }

    #[test]
    fn still_png_to_html() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("gris.png");
        RgbImage::from_pixel(20, 10, Rgb([128, 128, 128]))
            .save(&input)
            .unwrap();
        let output = dir.path().join("gris.html");

        let done = convert_file(&renderer(), &AnimationConfig::default(), &input, &output, false)
            .unwrap();
        assert_eq!(done, Conversion { frames: 1, animated: false });
        let html = std::fs::read_to_string(&output).unwrap();
        // 20 px / 5 = 4 colonnes, ceil(10 / 8.75) = 2 lignes
        assert_eq!(html.matches("<span ").count(), 8);
        assert_eq!(html.matches("<br/>").count(), 2);
        assert!(html.contains("background-color:#808080"));
        assert!(!html.contains("class=\"frame\""));
    }

    #[test]
    fn animated_gif_uses_gif_delay() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("anim.gif");
        write_gif(&input, 3);
        let output = dir.path().join("anim.html");

        let done = convert_file(&renderer(), &AnimationConfig::default(), &input, &output, false)
            .unwrap();
        assert_eq!(done, Conversion { frames: 3, animated: true });
        let html = std::fs::read_to_string(&output).unwrap();
        assert_eq!(html.matches("class=\"frame\"").count(), 3);
        assert!(html.contains("}, 60);"));
    }

    #[test]
    fn single_frame_gif_falls_back_to_still() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("one.gif");
        write_gif(&input, 1);
        let output = dir.path().join("one.html");
        let done = convert_file(&renderer(), &AnimationConfig::default(), &input, &output, false)
            .unwrap();
        assert!(!done.animated);
    }

    #[test]
    fn forced_animation_of_still_has_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("fixe.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])).save(&input).unwrap();
        let output = dir.path().join("fixe.html");
        let animation = AnimationConfig {
            frame_interval_ms: Some(250),
        };
        convert_file(&renderer(), &animation, &input, &output, true).unwrap();
        let html = std::fs::read_to_string(&output).unwrap();
        assert_eq!(html.matches("class=\"frame\"").count(), 1);
        assert!(html.contains("}, 250);"));
    }

    #[test]
    fn invalid_target_checked_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file(
            &renderer(),
            &AnimationConfig::default(),
            Path::new("/nonexistent/input.png"),
            dir.path(),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::InvalidOutputTarget { .. })
        ));
    }

    #[test]
    fn missing_input_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.html");
        let err = convert_file(
            &renderer(),
            &AnimationConfig::default(),
            Path::new("/nonexistent/input.png"),
            &output,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::ImageLoad { .. })
        ));
        assert!(!output.exists());
    }
}
