use std::path::{Path, PathBuf};

use am_core::charset::CharRamp;
use am_core::config::{AnimationConfig, RenderConfig, load_config};
use clap::Parser;

/// Fichier de configuration lu s'il existe et qu'aucun `--config` n'est donné.
pub const DEFAULT_CONFIG: &str = "asciimaker.toml";

/// asciimaker: convert images, GIFs and videos into colored ASCII-art HTML.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier source (PNG, JPEG, BMP, GIF, ou vidéo avec la feature `video`).
    pub input: Option<PathBuf>,

    /// Fichier HTML de sortie.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : ./asciimaker.toml s'il existe.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Largeur cible en pixels avant découpage en tuiles.
    #[arg(long)]
    pub width: Option<u32>,

    /// Largeur d'une tuile en pixels (hauteur = 1.75 × largeur).
    #[arg(long)]
    pub tile_width: Option<u32>,

    /// Couleur de police en niveaux de gris.
    #[arg(long, default_value_t = false)]
    pub no_color: bool,

    /// Pas de couleur de fond.
    #[arg(long, default_value_t = false)]
    pub no_background: bool,

    /// Inverser les intensités.
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Rampe de caractères explicite, du plus clair au plus dense.
    #[arg(long)]
    pub ramp: Option<String>,

    /// Rampe prédéfinie : default, compact, standard, blocks.
    #[arg(long)]
    pub ramp_preset: Option<String>,

    /// Police web (Google Fonts).
    #[arg(long)]
    pub font: Option<String>,

    /// Multiplicateur de taille de police.
    #[arg(long)]
    pub font_scale: Option<f32>,

    /// Délai entre deux frames animées, en millisecondes.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Forcer le rendu frame par frame, même pour une image fixe (aussi en mode batch).
    #[arg(long, default_value_t = false)]
    pub animated: bool,

    /// Convertir toutes les images d'un dossier (récursif).
    #[arg(long = "batch")]
    pub batch_folder: Option<PathBuf>,

    /// Dossier de sortie du mode batch. Défaut : à côté de chaque image.
    #[arg(long)]
    pub batch_out: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one input mode is provided.
    ///
    /// # Errors
    /// Returns an error if neither or both of `<INPUT>` and `--batch` are
    /// given, or if single-file mode lacks `--output`.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (&self.input, &self.batch_folder) {
            (None, None) => anyhow::bail!(
                "Aucune source spécifiée. Donnez un fichier <INPUT> ou --batch <DOSSIER>."
            ),
            (Some(_), Some(_)) => anyhow::bail!(
                "Une seule source à la fois : <INPUT> OU --batch, pas les deux."
            ),
            (Some(_), None) if self.output.is_none() => {
                anyhow::bail!("--output est requis pour convertir un fichier.")
            }
            (None, Some(_)) if self.output.is_some() => {
                anyhow::bail!("--output ne s'applique pas au mode batch, utilisez --batch-out.")
            }
            _ => Ok(()),
        }
    }

    /// Load the TOML layer then apply command-line overrides.
    ///
    /// # Errors
    /// Returns an error if the config file is unreadable or invalid, or if
    /// an override produces an invalid configuration.
    pub fn resolve_config(&self) -> anyhow::Result<(RenderConfig, AnimationConfig)> {
        let (mut config, mut animation) = match self.config.as_deref() {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG).is_file() => load_config(Path::new(DEFAULT_CONFIG))?,
            None => {
                log::debug!("Pas de fichier de configuration, valeurs par défaut.");
                (RenderConfig::default(), AnimationConfig::default())
            }
        };
        self.apply_overrides(&mut config, &mut animation)?;
        config.validate()?;
        Ok((config, animation))
    }

    /// Applique les flags CLI par-dessus la configuration chargée.
    ///
    /// # Errors
    /// Returns an error for an unknown `--ramp-preset` or a zero `--interval-ms`.
    pub fn apply_overrides(
        &self,
        config: &mut RenderConfig,
        animation: &mut AnimationConfig,
    ) -> anyhow::Result<()> {
        if let Some(w) = self.width {
            config.target_width = w;
        }
        if let Some(tw) = self.tile_width {
            config.tile_width = tw;
        }
        if self.no_color {
            config.color = false;
        }
        if self.no_background {
            config.background = false;
        }
        if self.invert {
            config.invert = true;
        }
        if let Some(ref name) = self.ramp_preset {
            let Some(chars) = CharRamp::preset(name) else {
                anyhow::bail!(
                    "Preset de rampe inconnu : {name}. Choix : default, compact, standard, blocks."
                );
            };
            config.ramp = chars.to_string();
        }
        if let Some(ref ramp) = self.ramp {
            config.ramp.clone_from(ramp);
        }
        if let Some(ref font) = self.font {
            config.font.clone_from(font);
        }
        if let Some(scale) = self.font_scale {
            config.font_scale = scale;
        }
        if let Some(ms) = self.interval_ms {
            if ms == 0 {
                anyhow::bail!("--interval-ms doit être strictement positif.");
            }
            animation.frame_interval_ms = Some(ms);
        }
        Ok(())
    }
}
