// academy-export/src/surface/mod.rs

//! The document context every composer draws on.
//!
//! Coordinates are PDF points with the origin at the top-left corner of the
//! page and y growing downwards. Text is positioned by its baseline.

mod pdf;
mod recording;

pub use pdf::PdfSurface;
pub use recording::{DrawOp, RecordingSurface};

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::fonts::FontSource;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components in the 0..=1 range pdf-writer expects.
    pub fn components(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A drawing backend owned by exactly one document.
///
/// Fonts and images are registered under logical keys. Registering a key
/// twice is a no-op. The active font is dropped whenever a page is added,
/// so text drawn on a new page before [`Surface::set_font`] fails with
/// `FontNotSelected`.
pub trait Surface {
    fn page_size(&self) -> PageSize;

    /// Number of pages so far; the last one is the page being drawn on.
    fn page_count(&self) -> usize;

    fn add_page(&mut self) -> Result<()>;

    fn has_font(&self, key: &str) -> bool;

    fn register_font(&mut self, key: &str, source: &FontSource) -> Result<()>;

    fn set_font(&mut self, key: &str) -> Result<()>;

    fn active_font(&self) -> Option<&str>;

    /// Width of `text` in the active font, or in Helvetica when none is active.
    fn text_width(&self, text: &str, size: f64) -> f64;

    fn draw_text(&mut self, text: &str, x: f64, baseline: f64, size: f64, color: Color)
        -> Result<()>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64) -> Result<()>;

    /// Loads the image once and returns its pixel dimensions.
    fn register_image(&mut self, key: &str, path: &Path) -> Result<(u32, u32)>;

    fn draw_image(&mut self, key: &str, rect: Rect) -> Result<()>;

    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}
