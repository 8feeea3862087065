use std::io::Write;
use std::path::Path;

use am_core::error::ConvertError;
use tempfile::NamedTempFile;

/// Vérifie qu'un chemin peut recevoir un fichier HTML.
///
/// Rejected: empty path, non-UTF8 path, no file name (`/`, `..`), an existing
/// directory, or a parent directory that does not exist.
///
/// # Errors
/// Returns [`ConvertError::InvalidOutputTarget`] describing the first
/// failed check.
pub fn validate_output_target(path: &Path) -> Result<(), ConvertError> {
    if path.as_os_str().is_empty() {
        return Err(reject(path, "chemin vide"));
    }
    if path.to_str().is_none() {
        return Err(reject(path, "chemin non-UTF8"));
    }
    if path.is_dir() {
        return Err(reject(path, "c'est un dossier"));
    }
    if path.file_name().is_none() {
        return Err(reject(path, "aucun nom de fichier"));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && !parent.is_dir()
    {
        return Err(reject(
            path,
            format!("dossier parent introuvable : {}", parent.display()),
        ));
    }
    Ok(())
}

fn reject(path: &Path, reason: impl Into<String>) -> ConvertError {
    ConvertError::invalid_output(path.display().to_string(), reason)
}

/// Écrit `markup` dans `path` de façon atomique.
///
/// The content goes to a temporary file next to the target, then replaces
/// it in one rename: readers never see a half-written page.
///
/// # Errors
/// [`ConvertError::InvalidOutputTarget`] if the target fails
/// [`validate_output_target`], [`ConvertError::Io`] on write failure.
pub fn write_markup(path: &Path, markup: &str) -> Result<(), ConvertError> {
    validate_output_target(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(markup.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ConvertError::Io(e.error))?;
    log::info!("HTML écrit : {} ({} octets)", path.display(), markup.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("page.html");
        write_markup(&out, "<p>un</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<p>un</p>");
        write_markup(&out, "<p>deux</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<p>deux</p>");
        // Aucun fichier temporaire ne doit traîner.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = validate_output_target(Path::new("")).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidOutputTarget { .. }));
    }

    #[test]
    fn directory_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_markup(dir.path(), "x").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidOutputTarget { .. }));
    }

    #[test]
    fn missing_parent_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("absent").join("page.html");
        let err = write_markup(&out, "x").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidOutputTarget { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn bare_file_name_is_valid() {
        assert!(validate_output_target(Path::new("page.html")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let path = Path::new(OsStr::from_bytes(b"page\xff.html"));
        let err = validate_output_target(path).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidOutputTarget { .. }));
    }
}
