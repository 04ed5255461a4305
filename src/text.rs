// academy-export/src/text.rs

//! Vietnamese text handling: normalization, drawing with font fallback,
//! file-name transliteration and display formatting.

use tracing::warn;
use unicode_normalization::UnicodeNormalization;

use crate::fallback::Chain;
use crate::fonts::{BuiltinFont, FontSource, FALLBACK_FONT};
use crate::surface::{Align, Color, Surface};

/// Used when a file-name subject transliterates to nothing.
pub const FILENAME_PLACEHOLDER: &str = "khong-ten";
pub const FILENAME_MAX_LEN: usize = 50;

/// Display value for a missing field.
pub const NO_DATA: &str = "Chưa có";

const ELLIPSIS: char = '…';

/// Vietnamese letters and the ASCII letter each folds to. Only precomposed
/// (NFC) forms are listed; input is normalized before lookup.
const VIETNAMESE_FOLDS: &[(&str, char)] = &[
    ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
    ("ÀÁẠẢÃÂẦẤẬẨẪĂẰẮẶẲẴ", 'A'),
    ("èéẹẻẽêềếệểễ", 'e'),
    ("ÈÉẸẺẼÊỀẾỆỂỄ", 'E'),
    ("ìíịỉĩ", 'i'),
    ("ÌÍỊỈĨ", 'I'),
    ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
    ("ÒÓỌỎÕÔỒỐỘỔỖƠỜỚỢỞỠ", 'O'),
    ("ùúụủũưừứựửữ", 'u'),
    ("ÙÚỤỦŨƯỪỨỰỬỮ", 'U'),
    ("ỳýỵỷỹ", 'y'),
    ("ỲÝỴỶỸ", 'Y'),
    ("đ", 'd'),
    ("Đ", 'D'),
];

/// Canonical composition (NFC). Decomposed diacritic sequences become single
/// precomposed code points.
pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

/// The ASCII base letter of a precomposed Vietnamese letter.
pub fn fold_vietnamese(ch: char) -> Option<char> {
    if ch.is_ascii() {
        return None;
    }
    VIETNAMESE_FOLDS
        .iter()
        .find(|(letters, _)| letters.contains(ch))
        .map(|(_, base)| *base)
}

/// ASCII-only, hyphen-separated rendition of `text` for use in file names.
///
/// Vietnamese letters fold to their base letter, every other run of
/// characters outside `[A-Za-z0-9]` becomes a single hyphen, and the result
/// is capped at [`FILENAME_MAX_LEN`] characters.
pub fn to_filename_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in normalize(text).chars() {
        let ch = fold_vietnamese(ch).unwrap_or(ch);
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    // ASCII only at this point, so byte truncation is char truncation.
    out.truncate(FILENAME_MAX_LEN);
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        FILENAME_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalized, trimmed value or `placeholder` when it is missing or blank.
pub fn display_field(value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => normalize(v),
        _ => placeholder.to_string(),
    }
}

/// `1500000.0` -> `1.500.000 đ`.
pub fn format_vnd(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} đ")
}

pub fn format_score(score: Option<f64>, placeholder: &str) -> String {
    match score {
        Some(s) if s.is_finite() => format!("{s}"),
        _ => placeholder.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    pub size: f64,
    pub color: Color,
    pub align: Align,
}

impl TextOptions {
    pub fn new(size: f64) -> Self {
        Self {
            size,
            color: Color::BLACK,
            align: Align::Left,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Draws text with the active document font, falling back to a built-in
/// font when drawing fails.
#[derive(Debug, Clone, Copy)]
pub struct TextShaper {
    fallback: BuiltinFont,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new(BuiltinFont::Helvetica)
    }
}

impl TextShaper {
    pub fn new(fallback: BuiltinFont) -> Self {
        Self { fallback }
    }

    /// Returns `false` only when both the active font and the fallback font
    /// failed. The failure is logged; the document carries on.
    pub fn render<S: Surface>(
        &self,
        ctx: &mut S,
        text: &str,
        x: f64,
        y: f64,
        options: &TextOptions,
    ) -> bool {
        let text = normalize(text);
        let fallback = FontSource::Builtin(self.fallback);
        let previous = ctx.active_font().map(str::to_string);

        let drawn = Chain::new("text")
            .attempt("active font", |ctx: &mut S| {
                draw_aligned(ctx, &text, x, y, options)
            })
            .attempt("builtin fallback", |ctx: &mut S| {
                ctx.register_font(FALLBACK_FONT, &fallback)?;
                ctx.set_font(FALLBACK_FONT)?;
                draw_aligned(ctx, &text, x, y, options)
            })
            .run(ctx);

        if let Some(key) = previous.filter(|key| ctx.active_font() != Some(key.as_str())) {
            if let Err(e) = ctx.set_font(&key) {
                warn!(font = %key, error = %e, "Font could not be restored after fallback");
            }
        }

        match drawn {
            Ok(_) => true,
            Err(failures) => {
                warn!(
                    text = %text,
                    attempts = failures.len(),
                    "Text could not be drawn"
                );
                false
            }
        }
    }

    /// Shortens `text` with an ellipsis until it fits `max_width`.
    pub fn fit<S: Surface>(&self, ctx: &S, text: &str, max_width: f64, size: f64) -> String {
        if ctx.text_width(text, size) <= max_width {
            return text.to_string();
        }
        let mut fitted = String::new();
        let mut candidate = String::new();
        for ch in text.chars() {
            candidate.clear();
            candidate.push_str(&fitted);
            candidate.push(ch);
            candidate.push(ELLIPSIS);
            if ctx.text_width(&candidate, size) > max_width {
                break;
            }
            fitted.push(ch);
        }
        let fitted = fitted.trim_end();
        format!("{fitted}{ELLIPSIS}")
    }
}

fn draw_aligned<S: Surface>(
    ctx: &mut S,
    text: &str,
    x: f64,
    y: f64,
    options: &TextOptions,
) -> crate::error::Result<()> {
    let left = match options.align {
        Align::Left => x,
        Align::Center => x - ctx.text_width(text, options.size) / 2.0,
        Align::Right => x - ctx.text_width(text, options.size),
    };
    ctx.draw_text(text, left, y, options.size, options.color)
}
