use std::fmt::{self, Display, Write};

use am_core::config::RenderConfig;
use am_core::frame::{AnimatedDocument, Document, Fragment};

const FONT_SERVICE: &str = "https://fonts.googleapis.com/css?family=";

/// Police et taille communes à toutes les pages générées.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageStyle {
    /// Nom de police, limité aux caractères sûrs en CSS et dans une URL.
    pub font: String,
    /// Taille de police en pixels CSS.
    pub font_px: u32,
}

impl PageStyle {
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        let font: String = config
            .font
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
            .collect();
        Self {
            font,
            font_px: config.font_px(),
        }
    }

    /// Family name as the font service expects it: spaces become `+`.
    ///
    /// # Example
    /// ```
    /// use am_export::html::PageStyle;
    /// let style = PageStyle { font: "Fira Code".into(), font_px: 14 };
    /// assert_eq!(style.font_query(), "Fira+Code");
    /// ```
    #[must_use]
    pub fn font_query(&self) -> String {
        self.font.replace(' ', "+")
    }

    fn write_head(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
             <link href='{FONT_SERVICE}{query}' rel='stylesheet'>\
             <style>body {{ font-family: '{font}', monospace; font-size: {px}px; }}</style>\
             </head><body>\n",
            query = self.font_query(),
            font = self.font,
            px = self.font_px,
        )
    }
}

/// Serialize a still document into a complete HTML page.
///
/// # Example
/// ```
/// use am_core::color::Rgb;
/// use am_core::frame::{Document, Fragment};
/// use am_export::html::{PageStyle, render_document};
///
/// let mut doc = Document::new(1, 1);
/// doc.push(Fragment { ch: '.', fg: Rgb::BLACK, bg: None });
/// let style = PageStyle { font: "Cousine".into(), font_px: 14 };
/// let html = render_document(&style, &doc);
/// assert!(html.contains("color:#000000"));
/// assert!(!html.contains("background-color"));
/// ```
#[must_use]
pub fn render_document(style: &PageStyle, doc: &Document) -> String {
    Page {
        style,
        body: Body::Still(doc),
    }
    .to_string()
}

/// Serialize an animated document: one hidden container per frame plus the
/// rotation script.
#[must_use]
pub fn render_animated(style: &PageStyle, anim: &AnimatedDocument) -> String {
    Page {
        style,
        body: Body::Animated(anim),
    }
    .to_string()
}

enum Body<'a> {
    Still(&'a Document),
    Animated(&'a AnimatedDocument),
}

struct Page<'a> {
    style: &'a PageStyle,
    body: Body<'a>,
}

impl Display for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.style.write_head(f)?;
        match self.body {
            Body::Still(doc) => write_rows(f, doc)?,
            Body::Animated(anim) => {
                for (i, doc) in anim.frames.iter().enumerate() {
                    let display = if i == 0 { "block" } else { "none" };
                    write!(
                        f,
                        "<div class=\"frame\" id=\"frame-{i}\" style=\"display:{display}\">\n"
                    )?;
                    write_rows(f, doc)?;
                    f.write_str("</div>\n")?;
                }
                write_rotation_script(f, anim.frame_interval_ms)?;
            }
        }
        f.write_str("</body></html>\n")
    }
}

fn write_rows(f: &mut fmt::Formatter<'_>, doc: &Document) -> fmt::Result {
    for row in doc.iter_rows() {
        for fragment in row {
            write_fragment(f, fragment)?;
        }
        f.write_str("<br/>\n")?;
    }
    Ok(())
}

fn write_fragment(f: &mut fmt::Formatter<'_>, fragment: &Fragment) -> fmt::Result {
    write!(f, "<span style=\"color:{}", fragment.fg)?;
    if let Some(bg) = fragment.bg {
        write!(f, "; background-color:{bg}")?;
    }
    f.write_str("\"><strong>")?;
    write_escaped(f, fragment.ch)?;
    f.write_str("</strong></span>")
}

/// Echappe un caractère pour le contenu HTML.
fn write_escaped<W: Write>(out: &mut W, ch: char) -> fmt::Result {
    match ch {
        '&' => out.write_str("&amp;"),
        '<' => out.write_str("&lt;"),
        '>' => out.write_str("&gt;"),
        '"' => out.write_str("&quot;"),
        '\'' => out.write_str("&#39;"),
        ' ' => out.write_str("&nbsp;"),
        c => out.write_char(c),
    }
}

fn write_rotation_script(f: &mut fmt::Formatter<'_>, interval_ms: u64) -> fmt::Result {
    write!(
        f,
        "<script>\n\
         document.addEventListener('DOMContentLoaded', function () {{\n\
         \x20 var frames = document.getElementsByClassName('frame');\n\
         \x20 var current = 0;\n\
         \x20 setInterval(function () {{\n\
         \x20   frames[current].style.display = 'none';\n\
         \x20   current = (current + 1) % frames.length;\n\
         \x20   frames[current].style.display = 'block';\n\
         \x20 }}, {interval_ms});\n\
         }});\n\
         </script>\n"
    )
}
