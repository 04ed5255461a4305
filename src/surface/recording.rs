// academy-export/src/surface/recording.rs

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use super::{Color, PageSize, Rect, Surface};
use crate::assets::{load_font_file, load_raster, FontFile};
use crate::error::{ExportError, Result};
use crate::fonts::{BuiltinFont, FontSource};

/// One drawing call, tagged with the 1-based page it landed on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    NewPage {
        page: usize,
    },
    Text {
        page: usize,
        font: String,
        text: String,
        x: f64,
        y: f64,
        size: f64,
    },
    FillRect {
        page: usize,
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        page: usize,
        rect: Rect,
    },
    Image {
        page: usize,
        key: String,
        rect: Rect,
    },
}

impl DrawOp {
    pub fn page(&self) -> usize {
        match self {
            DrawOp::NewPage { page }
            | DrawOp::Text { page, .. }
            | DrawOp::FillRect { page, .. }
            | DrawOp::StrokeRect { page, .. }
            | DrawOp::Image { page, .. } => *page,
        }
    }
}

/// A surface that records draw calls instead of producing a PDF.
///
/// Font and image registration go through the same asset loaders as
/// [`super::PdfSurface`], and page breaks drop the active font the same
/// way, so layouts composed here paginate exactly like the real document.
/// `finish` returns the operation log as JSON.
#[derive(Debug)]
pub struct RecordingSurface {
    size: PageSize,
    pages: usize,
    ops: Vec<DrawOp>,
    fonts: HashMap<String, FontSource>,
    files: HashMap<String, FontFile>,
    registrations: usize,
    active: Option<String>,
    images: HashMap<String, (u32, u32)>,
    reject_text: bool,
}

impl RecordingSurface {
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            pages: 0,
            ops: Vec::new(),
            fonts: HashMap::new(),
            files: HashMap::new(),
            registrations: 0,
            active: None,
            images: HashMap::new(),
            reject_text: false,
        }
    }

    /// Makes every text draw fail, to exercise fallback paths.
    pub fn reject_text(&mut self, reject: bool) {
        self.reject_text = reject;
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn ops_on(&self, page: usize) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(move |op| op.page() == page)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn texts_on(&self, page: usize) -> Vec<&str> {
        self.ops_on(page)
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn filled_rects_on(&self, page: usize, color: Color) -> Vec<Rect> {
        self.ops_on(page)
            .filter_map(|op| match op {
                DrawOp::FillRect { rect, color: c, .. } if *c == color => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<(usize, Rect)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { page, rect, .. } => Some((*page, *rect)),
                _ => None,
            })
            .collect()
    }

    pub fn font_source(&self, key: &str) -> Option<&FontSource> {
        self.fonts.get(key)
    }

    /// Number of fonts actually loaded (memoized registrations excluded).
    pub fn registration_count(&self) -> usize {
        self.registrations
    }

    fn current_page(&self) -> Result<usize> {
        if self.pages == 0 {
            return Err(ExportError::DrawError("no page has been added".into()));
        }
        Ok(self.pages)
    }

    fn active_file(&self) -> Option<&FontFile> {
        self.active.as_deref().and_then(|key| self.files.get(key))
    }

    fn active_builtin(&self) -> BuiltinFont {
        match self.active.as_deref().and_then(|key| self.fonts.get(key)) {
            Some(FontSource::Builtin(font)) => *font,
            _ => BuiltinFont::Helvetica,
        }
    }
}

impl Surface for RecordingSurface {
    fn page_size(&self) -> PageSize {
        self.size
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn add_page(&mut self) -> Result<()> {
        self.pages += 1;
        self.active = None;
        self.ops.push(DrawOp::NewPage { page: self.pages });
        Ok(())
    }

    fn has_font(&self, key: &str) -> bool {
        self.fonts.contains_key(key)
    }

    fn register_font(&mut self, key: &str, source: &FontSource) -> Result<()> {
        if self.fonts.contains_key(key) {
            return Ok(());
        }
        if let FontSource::File(path) = source {
            self.files.insert(key.to_string(), load_font_file(path)?);
        }
        self.fonts.insert(key.to_string(), source.clone());
        self.registrations += 1;
        Ok(())
    }

    fn set_font(&mut self, key: &str) -> Result<()> {
        if !self.fonts.contains_key(key) {
            return Err(ExportError::FontError(format!(
                "font '{key}' is not registered"
            )));
        }
        self.active = Some(key.to_string());
        Ok(())
    }

    fn active_font(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        match self.active_file() {
            Some(file) => file.text_width(text, size),
            None => self.active_builtin().text_width(text, size),
        }
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        baseline: f64,
        size: f64,
        _color: Color,
    ) -> Result<()> {
        let page = self.current_page()?;
        if self.reject_text {
            return Err(ExportError::DrawError("text rejected".into()));
        }
        let font = self
            .active
            .clone()
            .ok_or(ExportError::FontNotSelected(page))?;
        if let Some(ch) = self.active_file().and_then(|file| file.missing_glyph(text)) {
            return Err(ExportError::FontError(format!(
                "font '{font}' has no glyph for {ch:?}"
            )));
        }
        self.ops.push(DrawOp::Text {
            page,
            font,
            text: text.to_string(),
            x,
            y: baseline,
            size,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        let page = self.current_page()?;
        self.ops.push(DrawOp::FillRect { page, rect, color });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, _color: Color, _line_width: f64) -> Result<()> {
        let page = self.current_page()?;
        self.ops.push(DrawOp::StrokeRect { page, rect });
        Ok(())
    }

    fn register_image(&mut self, key: &str, path: &Path) -> Result<(u32, u32)> {
        if let Some(dims) = self.images.get(key) {
            return Ok(*dims);
        }
        let raster = load_raster(path)?;
        let dims = (raster.width, raster.height);
        self.images.insert(key.to_string(), dims);
        Ok(dims)
    }

    fn draw_image(&mut self, key: &str, rect: Rect) -> Result<()> {
        let page = self.current_page()?;
        if !self.images.contains_key(key) {
            return Err(ExportError::ImageError(format!(
                "image '{key}' is not registered"
            )));
        }
        self.ops.push(DrawOp::Image {
            page,
            key: key.to_string(),
            rect,
        });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        if self.pages == 0 {
            return Err(ExportError::AssemblyFailed("document has no pages".into()));
        }
        Ok(serde_json::to_vec(&self.ops)?)
    }
}
