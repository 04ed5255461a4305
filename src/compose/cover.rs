// academy-export/src/compose/cover.rs

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::fonts::FontRegistry;
use crate::surface::{Align, Color, Rect, Surface};
use crate::text::{TextOptions, TextShaper};

const HEADLINE_SIZE: f64 = 26.0;
const SUBTITLE_SIZE: f64 = 16.0;
const SUMMARY_SIZE: f64 = 12.0;
const NOTE_SIZE: f64 = 9.0;

// Vertical placement as fractions of the page height.
const HEADLINE_AT: f64 = 0.36;
const ACCENT_AT: f64 = 0.39;
const SUBTITLE_AT: f64 = 0.44;
const SUMMARY_AT: f64 = 0.53;
const SUMMARY_STEP: f64 = 0.04;
const NOTE_AT: f64 = 0.80;

const ACCENT: Color = Color::rgb(31, 78, 121);
const MUTED: Color = Color::rgb(96, 96, 96);

/// Text of a cover page, or of the compact heading above a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverContent {
    pub headline: String,
    pub subtitle: String,
    pub summary: Vec<String>,
    pub note: Option<String>,
}

pub struct PageComposer {
    shaper: TextShaper,
    margin_top: f64,
}

impl PageComposer {
    pub fn new(layout: &LayoutConfig) -> Self {
        Self {
            shaper: TextShaper::default(),
            margin_top: layout.margin_top,
        }
    }

    /// Fills the current page with a centered cover. Positions scale with
    /// the page height so portrait and landscape covers look alike.
    pub fn draw_cover<S: Surface>(
        &self,
        ctx: &mut S,
        fonts: &FontRegistry,
        content: &CoverContent,
    ) -> Result<()> {
        if !fonts.setup(ctx) {
            warn!("Cover drawn without the document font");
        }
        let size = ctx.page_size();
        let center = size.width / 2.0;
        let at = |fraction: f64| size.height * fraction;

        let headline = TextOptions::new(HEADLINE_SIZE).color(ACCENT);
        self.centered(ctx, &content.headline, center, at(HEADLINE_AT), headline);

        let accent_width = size.width * 0.3;
        ctx.fill_rect(
            Rect::new(center - accent_width / 2.0, at(ACCENT_AT), accent_width, 2.0),
            ACCENT,
        )?;

        let subtitle = TextOptions::new(SUBTITLE_SIZE);
        self.centered(ctx, &content.subtitle, center, at(SUBTITLE_AT), subtitle);

        for (i, line) in content.summary.iter().enumerate() {
            let y = at(SUMMARY_AT + SUMMARY_STEP * i as f64);
            self.centered(ctx, line, center, y, TextOptions::new(SUMMARY_SIZE));
        }

        if let Some(note) = &content.note {
            self.centered(ctx, note, center, at(NOTE_AT), TextOptions::new(NOTE_SIZE).color(MUTED));
        }

        debug!(headline = %content.headline, lines = content.summary.len(), "Cover drawn");
        Ok(())
    }

    /// Draws the cover text compactly at the top of the current page and
    /// returns the y coordinate where following content may start.
    pub fn draw_heading<S: Surface>(
        &self,
        ctx: &mut S,
        fonts: &FontRegistry,
        content: &CoverContent,
    ) -> Result<f64> {
        if !fonts.setup(ctx) {
            warn!("Heading drawn without the document font");
        }
        let center = ctx.page_size().width / 2.0;
        let mut y = self.margin_top + HEADLINE_SIZE;

        let headline = TextOptions::new(HEADLINE_SIZE * 0.75).color(ACCENT);
        self.centered(ctx, &content.headline, center, y, headline);
        y += 12.0;
        let accent_width = ctx.page_size().width * 0.2;
        ctx.fill_rect(Rect::new(center - accent_width / 2.0, y, accent_width, 1.5), ACCENT)?;

        y += SUBTITLE_SIZE + 6.0;
        self.centered(ctx, &content.subtitle, center, y, TextOptions::new(SUMMARY_SIZE));

        for line in &content.summary {
            y += SUMMARY_SIZE + 8.0;
            self.centered(ctx, line, center, y, TextOptions::new(SUMMARY_SIZE - 1.0));
        }

        if let Some(note) = &content.note {
            y += NOTE_SIZE + 10.0;
            self.centered(ctx, note, center, y, TextOptions::new(NOTE_SIZE).color(MUTED));
        }

        Ok(y + 24.0)
    }

    fn centered<S: Surface>(&self, ctx: &mut S, text: &str, x: f64, y: f64, options: TextOptions) {
        self.shaper.render(ctx, text, x, y, &options.align(Align::Center));
    }
}
