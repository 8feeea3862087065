use std::fmt;

/// Couleur 24 bits, canaux dans l'ordre R, G, B.
///
/// `Display` produit la forme hexadécimale CSS `#rrggbb`.
///
/// # Example
/// ```
/// use am_core::color::Rgb;
/// assert_eq!(Rgb(255, 16, 0).to_string(), "#ff1000");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Pure black, used as the forced background of inverted renders.
    pub const BLACK: Self = Self(0, 0, 0);

    /// Same value replicated on the three channels.
    ///
    /// # Example
    /// ```
    /// use am_core::color::Rgb;
    /// assert_eq!(Rgb::gray(7), Rgb(7, 7, 7));
    /// ```
    #[inline]
    #[must_use]
    pub fn gray(v: u8) -> Self {
        Self(v, v, v)
    }

    /// True when all three channels are equal.
    #[inline]
    #[must_use]
    pub fn is_gray(self) -> bool {
        self.0 == self.1 && self.1 == self.2
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_zero_padded_lowercase() {
        assert_eq!(Rgb(0, 0, 0).to_string(), "#000000");
        assert_eq!(Rgb(10, 171, 255).to_string(), "#0aabff");
    }

    #[test]
    fn gray_detection() {
        assert!(Rgb::gray(128).is_gray());
        assert!(!Rgb(1, 2, 3).is_gray());
    }
}
