use crate::error::ConvertError;
use crate::frame::FrameBuffer;

/// Fournit des frames décodées au renderer, une à la fois.
///
/// Implémenté par : `ImageSource`, `GifSource`, `VideoSource`, `MemorySource`.
///
/// # Example
/// ```
/// use am_core::traits::Source;
/// use am_core::frame::FrameBuffer;
/// use am_core::error::ConvertError;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn next_frame(&mut self) -> Result<Option<FrameBuffer>, ConvertError> { Ok(None) }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
/// }
/// assert_eq!(DummySource.frame_interval_hint(), None);
/// ```
pub trait Source {
    /// Décode la frame suivante.
    ///
    /// Retourne `Ok(None)` en fin de flux. Le nombre de frames n'est pas
    /// connu à l'avance.
    ///
    /// # Errors
    /// Returns [`ConvertError::ImageLoad`] when a frame cannot be decoded.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, ConvertError>;

    /// Dimensions natives de la source (avant resize).
    fn native_size(&self) -> (u32, u32);

    /// Délai natif entre deux frames en millisecondes, si la source en a un.
    fn frame_interval_hint(&self) -> Option<u64> {
        None
    }
}
