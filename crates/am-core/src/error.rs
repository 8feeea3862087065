use thiserror::Error;

/// Errors shared by every conversion stage.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Source could not be decoded, was empty, or had a zero dimension.
    #[error("Impossible de charger {origin} : {reason}")]
    ImageLoad {
        /// Path or description of the failing source.
        origin: String,
        /// Underlying cause.
        reason: String,
    },

    /// Output destination is not a writable file path.
    #[error("Destination invalide {path} : {reason}")]
    InvalidOutputTarget {
        /// Offending path, lossily rendered.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// I/O failure while writing an already-validated output.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Shorthand for [`ConvertError::ImageLoad`].
    pub fn image_load(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::ImageLoad {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for [`ConvertError::InvalidOutputTarget`].
    pub fn invalid_output(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOutputTarget {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_load_message_names_source() {
        let err = ConvertError::image_load("photo.png", "format inconnu");
        let msg = err.to_string();
        assert!(msg.contains("photo.png"));
        assert!(msg.contains("format inconnu"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConvertError = io.into();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
