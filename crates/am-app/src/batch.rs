use std::collections::HashSet;
use std::path::{Path, PathBuf};

use am_ascii::TileRenderer;
use am_core::config::AnimationConfig;
use anyhow::{Context, Result};

use crate::pipeline::convert_file;

/// Extensions d'images fixes traitées par le mode batch.
pub const BATCH_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Bilan d'un traitement par lots.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: usize,
    /// Input path and error message for every failed file.
    pub failed: Vec<(PathBuf, String)>,
}

fn is_batch_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| BATCH_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Liste récursivement les images de `folder`, triées par chemin.
///
/// # Errors
/// Returns an error if `folder` or one of its subfolders cannot be read.
pub fn collect_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![folder.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Lecture du dossier {}", dir.display()))?;
        for path in entries.filter_map(std::result::Result::ok).map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_batch_image(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Output path for `input`: `<stem>.html` next to it, or mirrored under
/// `out_dir` relative to `folder`.
#[must_use]
pub fn output_path(folder: &Path, input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let html = input.with_extension("html");
    match out_dir {
        None => html,
        Some(out) => {
            let rel = html.strip_prefix(folder).unwrap_or(&html);
            match rel.file_name() {
                Some(name) if rel.is_absolute() => out.join(name),
                _ => out.join(rel),
            }
        }
    }
}

/// Remove the empty directories from `dir` up to, but excluding, `stop`.
fn prune_empty_dirs(dir: &Path, stop: &Path) {
    let mut current = Some(dir);
    while let Some(d) = current.filter(|d| d.starts_with(stop) && *d != stop) {
        if std::fs::remove_dir(d).is_err() {
            break;
        }
        current = d.parent();
    }
}

/// Point d'entrée du traitement par lots.
///
/// Failures are logged and collected; the run continues with the next file.
/// Two inputs mapping to the same `<stem>.html` (`a.png` and `a.jpg`) are a
/// failure for the second one: the first page is kept.
///
/// # Errors
/// Returns an error only if the folder scan or the output directory setup
/// fails.
pub fn run_batch(
    folder: &Path,
    out_dir: Option<&Path>,
    renderer: &TileRenderer,
    animation: &AnimationConfig,
    force_animated: bool,
) -> Result<BatchReport> {
    let inputs = collect_images(folder)?;
    if inputs.is_empty() {
        log::warn!("Aucune image trouvée dans {}", folder.display());
    }
    log::info!("Batch : {} images dans {}", inputs.len(), folder.display());

    let mut report = BatchReport::default();
    let mut written: HashSet<PathBuf> = HashSet::new();
    for input in inputs {
        let output = output_path(folder, &input, out_dir);
        if written.contains(&output) {
            let reason = format!("{} déjà produit par une autre image", output.display());
            log::error!("Échec de {} : {reason}", input.display());
            report.failed.push((input, reason));
            continue;
        }

        // Dossier miroir créé à la demande, supprimé si la conversion échoue.
        let mut created_dir = None;
        if let (Some(out), Some(parent)) = (out_dir, output.parent())
            && !parent.is_dir()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Création du dossier {}", parent.display()))?;
            created_dir = Some((parent.to_path_buf(), out));
        }

        match convert_file(renderer, animation, &input, &output, force_animated) {
            Ok(_) => {
                report.converted += 1;
                written.insert(output);
            }
            Err(e) => {
                if let Some((dir, out)) = created_dir {
                    prune_empty_dirs(&dir, out);
                }
                log::error!("Échec de {} : {e:#}", input.display());
                report.failed.push((input, format!("{e:#}")));
            }
        }
    }
    log::info!(
        "Batch terminé : {} converties, {} échecs",
        report.converted,
        report.failed.len()
    );
    Ok(report)
}
