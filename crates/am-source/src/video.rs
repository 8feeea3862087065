// Ce module pilote ffmpeg via subprocess (std::process::Command), pas de binding C.
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGB24 sur stdout
//   - `VideoSource`       : lit une frame à la fois depuis le pipe jusqu'à EOF

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use am_core::error::ConvertError;
use am_core::frame::FrameBuffer;
use am_core::traits::Source;

use crate::resize::scaled_height;

/// Programme externe, éventuellement précédé d'arguments fixes.
///
/// # Example
/// ```
/// use am_source::video::Tool;
/// let system = Tool::new("ffprobe");
/// let wrapped = Tool::with_leading_args("sh", ["./ffprobe-local.sh"]);
/// assert_ne!(system, wrapped);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tool {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl Tool {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// `program` invoked with `args` before the regular arguments.
    #[must_use]
    pub fn with_leading_args<I, A>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd
    }
}

/// Binaires ffprobe/ffmpeg utilisés par [`VideoSource`]. Défaut : ceux du PATH.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoTools {
    pub ffprobe: Tool,
    pub ffmpeg: Tool,
}

impl Default for VideoTools {
    fn default() -> Self {
        Self {
            ffprobe: Tool::new("ffprobe"),
            ffmpeg: Tool::new("ffmpeg"),
        }
    }
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

impl VideoInfo {
    /// Délai entre deux frames en millisecondes, arrondi, au moins 1.
    #[must_use]
    pub fn frame_interval_ms(&self) -> u64 {
        (1000.0 / self.fps.max(0.001)).round().max(1.0) as u64
    }
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// # Errors
/// Returns [`ConvertError::ImageLoad`] when no usable width/height is present.
///
/// # Example
/// ```
/// use am_source::video::parse_probe_output;
/// let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo, ConvertError> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    if width == 0 || height == 0 {
        return Err(ConvertError::image_load(
            "ffprobe",
            "aucun flux vidéo décodable",
        ));
    }
    Ok(VideoInfo { width, height, fps })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(ffprobe: &Tool, path: &Path) -> Result<VideoInfo, ConvertError> {
    let origin = path.display().to_string();
    let path_str = path
        .to_str()
        .ok_or_else(|| ConvertError::image_load(origin.clone(), "chemin non-UTF8"))?;

    let output = ffprobe
        .command()
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            ConvertError::image_load(origin.clone(), format!("impossible de lancer ffprobe : {e}"))
        })?;

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text).map_err(|_| {
        ConvertError::image_load(origin.clone(), "ffprobe n'a trouvé aucun flux vidéo")
    })?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({origin})",
        info.width,
        info.height,
        info.fps
    );
    Ok(info)
}

/// Lance un processus `ffmpeg` qui écrit des frames RGB24 brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes (row-major, sans padding).
/// `-an` supprime l'audio.
///
/// # Errors
/// Returns [`ConvertError::ImageLoad`] if ffmpeg cannot be spawned.
pub fn spawn_ffmpeg_pipe(
    ffmpeg: &Tool,
    path: &Path,
    w: u32,
    h: u32,
) -> Result<Child, ConvertError> {
    let origin = path.display().to_string();
    let path_str = path
        .to_str()
        .ok_or_else(|| ConvertError::image_load(origin.clone(), "chemin non-UTF8"))?;

    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let child = ffmpeg
        .command()
        .args([
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            ConvertError::image_load(origin, format!("impossible de lancer ffmpeg : {e}"))
        })?;
    log::debug!("ffmpeg spawné: {w}x{h}");
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur un EOF propre
/// (aucun byte lu).
///
/// # Errors
/// Propagates fatal I/O errors, and returns [`std::io::ErrorKind::UnexpectedEof`]
/// when the stream ends in the middle of `buf`.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) if total == 0 => return Ok(false),
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("frame tronquée : {total} octets sur {}", buf.len()),
                ));
            }
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Vidéo décodée par ffmpeg, une frame par appel à `next_frame`.
///
/// Aucune frame n'est pré-chargée ; le nombre total n'est connu qu'à EOF.
pub struct VideoSource {
    path: PathBuf,
    info: VideoInfo,
    decode_size: (u32, u32),
    child: Option<Child>,
    decoded: u64,
}

impl VideoSource {
    /// Read the stream metadata of `path` and start decoding with the `ffprobe`/`ffmpeg` found in PATH.
    ///
    /// With `decode_width`, ffmpeg scales frames to that width (aspect ratio
    /// kept) so the pipe carries no more pixels than the renderer needs.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] if ffprobe/ffmpeg are unavailable
    /// or the file has no video stream.
    pub fn new(path: &Path, decode_width: Option<u32>) -> Result<Self, ConvertError> {
        Self::with_tools(path, decode_width, &VideoTools::default())
    }

    /// Same as [`VideoSource::new`] with explicit binaries.
    ///
    /// # Errors
    /// See [`VideoSource::new`].
    pub fn with_tools(
        path: &Path,
        decode_width: Option<u32>,
        tools: &VideoTools,
    ) -> Result<Self, ConvertError> {
        let info = probe_video(&tools.ffprobe, path)?;
        let decode_size = match decode_width {
            Some(w) if w > 0 => (w, scaled_height(info.width, info.height, w)),
            _ => (info.width, info.height),
        };
        let child = spawn_ffmpeg_pipe(&tools.ffmpeg, path, decode_size.0, decode_size.1)?;
        Ok(Self {
            path: path.to_path_buf(),
            info,
            decode_size,
            child: Some(child),
            decoded: 0,
        })
    }

    /// Métadonnées du flux.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Fin de flux : un code de sortie non nul de ffmpeg est une erreur,
    /// même après des frames valides.
    fn finish(&mut self) -> Result<(), ConvertError> {
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(ConvertError::image_load(
                    self.path.display().to_string(),
                    format!("ffmpeg a échoué après {} frames ({status})", self.decoded),
                ));
            }
        }
        log::info!(
            "VideoSource: EOF après {} frames ({})",
            self.decoded,
            self.path.display()
        );
        Ok(())
    }
}

impl Source for VideoSource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, ConvertError> {
        let Some(stdout) = self.child.as_mut().and_then(|c| c.stdout.as_mut()) else {
            return Ok(None);
        };
        let (w, h) = self.decode_size;
        let mut frame = FrameBuffer::new(w, h);
        match read_exact_or_eof(stdout, &mut frame.data) {
            Ok(true) => {
                self.decoded += 1;
                log::debug!("VideoSource: frame {} décodée", self.decoded);
                Ok(Some(frame))
            }
            Ok(false) => {
                self.finish()?;
                Ok(None)
            }
            Err(e) => {
                if let Some(mut c) = self.child.take() {
                    let _ = c.kill();
                    let _ = c.wait();
                }
                Err(ConvertError::image_load(
                    self.path.display().to_string(),
                    format!("erreur lecture pipe ffmpeg : {e}"),
                ))
            }
        }
    }

    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn frame_interval_hint(&self) -> Option<u64> {
        Some(self.info.frame_interval_ms())
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn probe_output_integer_rate() {
        let info = parse_probe_output("width=1920\nheight=1080\nr_frame_rate=25/1\n").unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.frame_interval_ms(), 40);
    }

    #[test]
    fn probe_output_without_rate_defaults_to_30() {
        let info = parse_probe_output("width=10\nheight=10\n").unwrap();
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_interval_ms(), 33);
    }

    #[test]
    fn probe_output_without_stream_fails() {
        assert!(parse_probe_output("").is_err());
        assert!(parse_probe_output("width=0\nheight=0\n").is_err());
        assert!(parse_probe_output("width=abc\nheight=4\n").is_err());
    }

    #[test]
    fn zero_rate_is_ignored() {
        let info = parse_probe_output("width=2\nheight=2\nr_frame_rate=0/0\n").unwrap();
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn read_exact_reports_clean_eof() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
        let mut buf = [0u8; 3];
        assert!(read_exact_or_eof(&mut cursor, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3]);
        assert!(read_exact_or_eof(&mut cursor, &mut buf).unwrap());
        assert!(!read_exact_or_eof(&mut cursor, &mut buf).unwrap());
    }

    #[test]
    fn read_exact_rejects_truncated_frame() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut buf = [0u8; 3];
        assert!(read_exact_or_eof(&mut cursor, &mut buf).unwrap());
        let err = read_exact_or_eof(&mut cursor, &mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    /// Faux ffprobe/ffmpeg : scripts `sh` qui ignorent leurs arguments.
    /// ffprobe annonce du 2×2 à 10 fps, ffmpeg écrit `bytes` octets puis
    /// sort avec `exit_code`.
    #[cfg(unix)]
    fn fake_tools(dir: &Path, bytes: usize, exit_code: i32) -> VideoTools {
        let ffprobe_script = dir.join("ffprobe.sh");
        std::fs::write(
            &ffprobe_script,
            "printf 'width=2\\nheight=2\\nr_frame_rate=10/1\\n'\n",
        )
        .unwrap();
        let ffmpeg = dir.join("ffmpeg.sh");
        std::fs::write(
            &ffmpeg,
            format!("head -c {bytes} /dev/zero\nexit {exit_code}\n"),
        )
        .unwrap();
        VideoTools {
            ffprobe: Tool::with_leading_args("sh", [ffprobe_script]),
            ffmpeg: Tool::with_leading_args("sh", [ffmpeg]),
        }
    }

    #[cfg(unix)]
    fn drain(source: &mut VideoSource) -> (usize, Result<(), ConvertError>) {
        let mut frames = 0;
        loop {
            match source.next_frame() {
                Ok(Some(frame)) => {
                    assert_eq!((frame.width, frame.height), (2, 2));
                    frames += 1;
                }
                Ok(None) => return (frames, Ok(())),
                Err(e) => return (frames, Err(e)),
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn frames_stream_until_clean_exit() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 2 * 12, 0);
        let mut source =
            VideoSource::with_tools(&dir.path().join("clip.mp4"), Some(2), &tools).unwrap();
        assert_eq!(source.native_size(), (2, 2));
        assert_eq!(source.frame_interval_hint(), Some(100));
        assert!((source.info().fps - 10.0).abs() < f64::EPSILON);
        let (frames, end) = drain(&mut source);
        assert_eq!(frames, 2);
        assert!(end.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn ffmpeg_failure_after_frames_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 12, 1);
        let mut source =
            VideoSource::with_tools(&dir.path().join("clip.mp4"), Some(2), &tools).unwrap();
        let (frames, end) = drain(&mut source);
        assert_eq!(frames, 1);
        assert!(matches!(end, Err(ConvertError::ImageLoad { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn truncated_last_frame_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tools = fake_tools(dir.path(), 18, 0);
        let mut source =
            VideoSource::with_tools(&dir.path().join("clip.mp4"), Some(2), &tools).unwrap();
        let (frames, end) = drain(&mut source);
        assert_eq!(frames, 1);
        assert!(matches!(end, Err(ConvertError::ImageLoad { .. })));
    }

    #[test]
    fn missing_file_fails_to_open() {
        // Sans ffprobe comme avec, un fichier absent ne donne aucun flux.
        let res = VideoSource::new(Path::new("/nonexistent/clip.mp4"), None);
        assert!(matches!(res, Err(ConvertError::ImageLoad { .. })));
    }
}
