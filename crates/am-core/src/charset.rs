use crate::error::ConvertError;

/// Rampe par défaut, de la plus faible à la plus forte intensité.
pub const CHARSET_DEFAULT: &str = ".,:-=+>coO08&%@#";

/// 10 caractères: compact, bon contraste.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères: Paul Bourke extended, bon équilibre.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode: pseudo-pixels.
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Ordered character ramp, lowest intensity first.
///
/// The luminance range `[0, 255]` is split into `len()` buckets of equal
/// width; a luminance picks the first bucket whose upper bound is greater
/// than or equal to it. Which end looks "dark" is up to the ramp order.
///
/// # Example
/// ```
/// use am_core::charset::CharRamp;
/// let ramp = CharRamp::new(".#").unwrap();
/// assert_eq!(ramp.select_u8(100), '.');
/// assert_eq!(ramp.select_u8(200), '#');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharRamp {
    chars: Vec<char>,
}

impl CharRamp {
    /// Build a ramp from a string, one entry per `char`.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] if the ramp is empty.
    pub fn new(ramp: &str) -> Result<Self, ConvertError> {
        let chars: Vec<char> = ramp.chars().collect();
        if chars.is_empty() {
            return Err(ConvertError::Config(
                "la rampe de caractères doit contenir au moins un caractère".into(),
            ));
        }
        Ok(Self { chars })
    }

    /// Look up a built-in ramp by name: `default`, `compact`, `standard`, `blocks`.
    ///
    /// # Example
    /// ```
    /// use am_core::charset::{CharRamp, CHARSET_COMPACT};
    /// assert_eq!(CharRamp::preset("compact"), Some(CHARSET_COMPACT));
    /// assert_eq!(CharRamp::preset("nope"), None);
    /// ```
    #[must_use]
    pub fn preset(name: &str) -> Option<&'static str> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(CHARSET_DEFAULT),
            "compact" => Some(CHARSET_COMPACT),
            "standard" => Some(CHARSET_STANDARD),
            "blocks" => Some(CHARSET_BLOCKS),
            _ => None,
        }
    }

    /// Number of characters in the ramp (always ≥ 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when the ramp holds no character.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Ramp index for the luminance `num / den`, with `num / den` in `[0, 255]`.
    ///
    /// Smallest `i` such that `num / den <= (i + 1) * 255 / len`, evaluated
    /// in integers so bucket edges never depend on float rounding.
    #[must_use]
    pub fn index_for(&self, num: u64, den: u64) -> usize {
        if den == 0 {
            return 0;
        }
        let n = self.chars.len() as u128;
        let scaled = u128::from(num) * n;
        let unit = 255 * u128::from(den);
        let upper = scaled.div_ceil(unit);
        let idx = upper.saturating_sub(1).min(n - 1);
        idx as usize
    }

    /// Character for the luminance `num / den`.
    #[inline]
    #[must_use]
    pub fn select(&self, num: u64, den: u64) -> char {
        self.chars[self.index_for(num, den)]
    }

    /// Character for an integral luminance.
    #[inline]
    #[must_use]
    pub fn select_u8(&self, luminance: u8) -> char {
        self.select(u64::from(luminance), 1)
    }
}
