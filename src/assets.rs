// academy-export/src/assets.rs

//! Read-only loading of static font and image assets.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;
use ttf_parser::{name_id, Face, FaceParsingError};

use crate::error::{ExportError, Result};

/// Glyph id and horizontal advance in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    pub advance: u16,
}

/// A TrueType font parsed once at registration: the raw program for
/// embedding plus the character map and metrics drawing needs.
#[derive(Debug, Clone)]
pub struct FontFile {
    pub data: Vec<u8>,
    pub family: Option<String>,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    /// `x_min, y_min, x_max, y_max` in font units.
    pub bbox: [i16; 4],
    glyphs: HashMap<char, Glyph>,
}

impl FontFile {
    pub fn parse(data: Vec<u8>) -> std::result::Result<Self, FaceParsingError> {
        let face = Face::parse(&data, 0)?;

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|code| {
                    let (Some(ch), Some(id)) = (char::from_u32(code), subtable.glyph_index(code))
                    else {
                        return;
                    };
                    // glyph 0 is .notdef
                    if id.0 != 0 {
                        let advance = face.glyph_hor_advance(id).unwrap_or(0);
                        glyphs.entry(ch).or_insert(Glyph { id: id.0, advance });
                    }
                });
            }
        }

        let family = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::FAMILY)
            .find_map(|name| name.to_string());
        let bbox = face.global_bounding_box();
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);

        Ok(Self {
            family,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            glyphs,
            data,
        })
    }

    pub fn glyph(&self, ch: char) -> Option<Glyph> {
        self.glyphs.get(&ch).copied()
    }

    /// First character of `text` the font has no glyph for.
    pub fn missing_glyph(&self, text: &str) -> Option<char> {
        text.chars().find(|ch| !self.glyphs.contains_key(ch))
    }

    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let em = f64::from(self.units_per_em);
        let units: f64 = text
            .chars()
            .map(|ch| self.glyph(ch).map_or(em / 2.0, |g| f64::from(g.advance)))
            .sum();
        units * size / em
    }
}

/// Reads a TTF/OTF file and parses its character map.
pub fn load_font_file(path: &Path) -> Result<FontFile> {
    if !path.exists() {
        return Err(ExportError::AssetUnavailable(format!(
            "font file not found: {}",
            path.display()
        )));
    }

    let data = std::fs::read(path)?;
    let size_bytes = data.len();
    let font = FontFile::parse(data).map_err(|e| {
        ExportError::FontError(format!("invalid font file {}: {}", path.display(), e))
    })?;

    debug!(
        path = %path.display(),
        size_bytes,
        glyphs = font.glyphs.len(),
        "Font file loaded"
    );
    Ok(font)
}

/// Decoded image as 8-bit RGB samples, alpha already composited on white.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

pub fn load_raster(path: &Path) -> Result<RasterImage> {
    if !path.exists() {
        return Err(ExportError::AssetUnavailable(format!(
            "image file not found: {}",
            path.display()
        )));
    }

    let decoded = image::open(path).map_err(|e| {
        ExportError::ImageError(format!("failed to decode {}: {}", path.display(), e))
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    if width == 0 || height == 0 {
        return Err(ExportError::ImageError(format!(
            "image {} has no pixels",
            path.display()
        )));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        for channel in &pixel.0[..3] {
            let blended = *channel as f32 * alpha + 255.0 * (1.0 - alpha);
            rgb.push(blended.round() as u8);
        }
    }

    debug!(path = %path.display(), width, height, "Image loaded");
    Ok(RasterImage { width, height, rgb })
}
