use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::charset::{CHARSET_DEFAULT, CharRamp};
use crate::error::ConvertError;

/// Réglages de rendu, figés à la construction du renderer.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use am_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.target_width, 800);
/// assert_eq!(config.tile_width, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RenderConfig {
    /// Largeur cible de l'image redimensionnée, en pixels.
    pub target_width: u32,
    /// Largeur d'une tuile en pixels. La hauteur vaut 1.75× cette valeur.
    pub tile_width: u32,
    /// Couleur par tuile (sinon niveaux de gris).
    pub color: bool,
    /// Fond coloré avec la luminance moyenne de l'image entière.
    pub background: bool,
    /// Inverser toutes les valeurs (255 - v).
    pub invert: bool,
    /// Rampe de caractères, de la plus faible à la plus forte intensité.
    pub ramp: String,
    /// Nom de la police web (catalogue Google Fonts).
    pub font: String,
    /// Multiplicateur de la taille de police.
    pub font_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_width: 800,
            tile_width: 10,
            color: true,
            background: true,
            invert: false,
            ramp: CHARSET_DEFAULT.to_string(),
            font: "Cousine".to_string(),
            font_scale: 1.0,
        }
    }
}

impl RenderConfig {
    /// Check the constructor-time invariants.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] for an empty ramp, a zero tile or
    /// target width, an empty font name, or a non-positive font multiplier.
    pub fn validate(&self) -> Result<(), ConvertError> {
        CharRamp::new(&self.ramp)?;
        if self.tile_width == 0 {
            return Err(ConvertError::Config(
                "tile_width doit être strictement positif".into(),
            ));
        }
        if self.target_width == 0 {
            return Err(ConvertError::Config(
                "target_width doit être strictement positif".into(),
            ));
        }
        if self.font.trim().is_empty() {
            return Err(ConvertError::Config("font ne peut pas être vide".into()));
        }
        if !self.font_scale.is_finite() || self.font_scale <= 0.0 {
            return Err(ConvertError::Config(format!(
                "font_scale doit être fini et > 0, reçu {}",
                self.font_scale
            )));
        }
        Ok(())
    }

    /// Font size in CSS pixels: `22 * tile_width / 15 * font_scale`, at least 1.
    ///
    /// # Example
    /// ```
    /// use am_core::config::RenderConfig;
    /// assert_eq!(RenderConfig::default().font_px(), 14);
    /// ```
    #[must_use]
    pub fn font_px(&self) -> u32 {
        let px = 22.0 * self.tile_width as f32 / 15.0 * self.font_scale;
        (px as u32).max(1)
    }
}

/// Réglages du rendu animé.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Délai entre deux frames. `None` = indication de la source, sinon 100 ms.
    pub frame_interval_ms: Option<u64>,
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    animation: Option<AnimationSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    target_width: Option<u32>,
    tile_width: Option<u32>,
    color: Option<bool>,
    background: Option<bool>,
    invert: Option<bool>,
    ramp: Option<String>,
    ramp_preset: Option<String>,
    font: Option<String>,
    font_scale: Option<f32>,
}

/// Animation section of the TOML config.
#[derive(Deserialize)]
struct AnimationSection {
    frame_interval_ms: Option<u64>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns [`ConvertError::Config`] on malformed TOML, unknown ramp presets,
/// or values failing [`RenderConfig::validate`].
///
/// # Example
/// ```
/// use am_core::config::parse_config;
/// let (render, anim) = parse_config("[render]\ntile_width = 4\n[animation]\nframe_interval_ms = 40\n").unwrap();
/// assert_eq!(render.tile_width, 4);
/// assert_eq!(anim.frame_interval_ms, Some(40));
/// ```
pub fn parse_config(content: &str) -> Result<(RenderConfig, AnimationConfig), ConvertError> {
    let file: ConfigFile = toml::from_str(content)
        .map_err(|e| ConvertError::Config(format!("erreur de parsing TOML : {e}")))?;

    let mut config = RenderConfig::default();
    if let Some(r) = file.render {
        if let Some(v) = r.target_width {
            config.target_width = v;
        }
        if let Some(v) = r.tile_width {
            config.tile_width = v;
        }
        if let Some(v) = r.color {
            config.color = v;
        }
        if let Some(v) = r.background {
            config.background = v;
        }
        if let Some(v) = r.invert {
            config.invert = v;
        }
        if let Some(name) = r.ramp_preset {
            config.ramp = CharRamp::preset(&name)
                .ok_or_else(|| ConvertError::Config(format!("preset de rampe inconnu : {name}")))?
                .to_string();
        }
        // An explicit ramp wins over a preset.
        if let Some(v) = r.ramp {
            config.ramp = v;
        }
        if let Some(v) = r.font {
            config.font = v;
        }
        if let Some(v) = r.font_scale {
            config.font_scale = v;
        }
    }

    let mut animation = AnimationConfig::default();
    if let Some(a) = file.animation {
        animation.frame_interval_ms = a.frame_interval_ms;
    }

    config.validate()?;
    if animation.frame_interval_ms == Some(0) {
        return Err(ConvertError::Config(
            "frame_interval_ms doit être strictement positif".into(),
        ));
    }
    Ok((config, animation))
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use am_core::config::load_config;
/// use std::path::Path;
/// let (render, animation) = load_config(Path::new("asciimaker.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<(RenderConfig, AnimationConfig), ConvertError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConvertError::Config(format!("impossible de lire {} : {e}", path.display()))
    })?;
    let parsed = parse_config(&content)?;
    log::info!("Configuration chargée depuis {}", path.display());
    Ok(parsed)
}
