// academy-export/src/fonts.rs

//! Font registration with ordered fallback.
//!
//! Every component draws with the logical font [`DOCUMENT_FONT`]; which
//! physical font sits behind it is decided once per document context by
//! [`FontRegistry::setup`]. Backends drop the active font on page breaks, so
//! callers re-run `setup` at each boundary. Repeat calls only re-activate
//! the font that is already registered.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AssetConfig;
use crate::fallback::Chain;
use crate::surface::Surface;
use crate::text::fold_vietnamese;

/// Logical key of the document font.
pub const DOCUMENT_FONT: &str = "document";
/// Logical key of the font used when drawing with the document font fails.
pub const FALLBACK_FONT: &str = "fallback";

/// Standard 14 fonts every PDF reader provides without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinFont {
    Helvetica,
    TimesRoman,
    Courier,
}

impl BuiltinFont {
    pub fn base_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::TimesRoman => "Times-Roman",
            BuiltinFont::Courier => "Courier",
        }
    }

    /// Approximate advance width in 1/1000 em.
    pub fn advance(&self, ch: char) -> f64 {
        match self {
            BuiltinFont::Courier => 600.0,
            BuiltinFont::Helvetica => helvetica_advance(ch),
            BuiltinFont::TimesRoman => helvetica_advance(ch) * 0.9,
        }
    }

    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().map(|ch| self.advance(ch)).sum::<f64>() * size / 1000.0
    }

    /// WinAnsi bytes for `text`. Vietnamese letters outside WinAnsi are
    /// folded to their base letter; anything else becomes `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| {
                winansi_byte(ch)
                    .or_else(|| fold_vietnamese(ch).and_then(winansi_byte))
                    .unwrap_or(b'?')
            })
            .collect()
    }
}

fn helvetica_advance(ch: char) -> f64 {
    let ch = fold_vietnamese(ch).unwrap_or(ch);
    match ch {
        ' ' => 278.0,
        'I' | 'J' | 'f' | 'i' | 'j' | 'l' | 't' => 278.0,
        'M' | 'W' | 'm' | 'w' => 833.0,
        'A'..='Z' => 667.0,
        'a'..='z' => 556.0,
        '0'..='9' => 556.0,
        '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 278.0,
        '-' | '(' | ')' | '/' => 333.0,
        '…' => 1000.0,
        _ => 556.0,
    }
}

fn winansi_byte(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u32 as u8),
        0x20AC => Some(0x80),
        0x2026 => Some(0x85),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    File(PathBuf),
    Builtin(BuiltinFont),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontCandidate {
    pub label: String,
    pub source: FontSource,
}

impl FontCandidate {
    pub fn new(label: impl Into<String>, source: FontSource) -> Self {
        Self {
            label: label.into(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontRegistry {
    candidates: Vec<FontCandidate>,
    last_resort: BuiltinFont,
}

impl FontRegistry {
    pub fn new(candidates: Vec<FontCandidate>, last_resort: BuiltinFont) -> Self {
        Self {
            candidates,
            last_resort,
        }
    }

    /// Primary font, secondary font, then Helvetica; Times-Roman if even
    /// Helvetica cannot be registered.
    pub fn from_assets(assets: &AssetConfig) -> Self {
        let mut candidates = Vec::new();
        if let Some(path) = &assets.primary_font {
            candidates.push(FontCandidate::new("primary", FontSource::File(path.clone())));
        }
        if let Some(path) = &assets.secondary_font {
            candidates.push(FontCandidate::new("secondary", FontSource::File(path.clone())));
        }
        candidates.push(FontCandidate::new(
            "builtin",
            FontSource::Builtin(BuiltinFont::Helvetica),
        ));
        Self::new(candidates, BuiltinFont::TimesRoman)
    }

    pub fn candidates(&self) -> &[FontCandidate] {
        &self.candidates
    }

    /// Makes [`DOCUMENT_FONT`] the active font of `ctx`. Returns `false` only
    /// when not even the last-resort built-in font could be activated.
    pub fn setup<S: Surface>(&self, ctx: &mut S) -> bool {
        if ctx.has_font(DOCUMENT_FONT) {
            match ctx.set_font(DOCUMENT_FONT) {
                Ok(()) => {
                    debug!(page = ctx.page_count(), "Document font re-activated");
                    return true;
                }
                Err(e) => warn!(error = %e, "Registered document font could not be activated"),
            }
        }

        let mut chain: Chain<'_, S, ()> = Chain::new("font");
        for candidate in &self.candidates {
            let source = &candidate.source;
            chain = chain.attempt(candidate.label.clone(), move |ctx: &mut S| {
                ctx.register_font(DOCUMENT_FONT, source)?;
                ctx.set_font(DOCUMENT_FONT)
            });
        }

        let last_resort = FontSource::Builtin(self.last_resort);
        let resolved = chain.or_default(ctx, "last resort", |ctx| {
            if let Err(e) = ctx
                .register_font(DOCUMENT_FONT, &last_resort)
                .and_then(|_| ctx.set_font(DOCUMENT_FONT))
            {
                warn!(error = %e, "Last-resort font unavailable");
            }
        });

        if resolved.degraded() {
            warn!(
                strategy = %resolved.strategy,
                skipped = resolved.failures.len(),
                "Document font degraded"
            );
        } else {
            debug!(strategy = %resolved.strategy, "Document font registered");
        }

        ctx.active_font() == Some(DOCUMENT_FONT)
    }
}
