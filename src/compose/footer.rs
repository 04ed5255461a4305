// academy-export/src/compose/footer.rs

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::{AssetConfig, BrandingConfig, LayoutConfig};
use crate::error::{ExportError, Result};
use crate::fallback::Chain;
use crate::fonts::FontRegistry;
use crate::surface::{Align, Color, PageSize, Rect, Surface};
use crate::text::{TextOptions, TextShaper};

/// Image key the closing banner is registered under.
pub const BANNER_KEY: &str = "closing-banner";

/// Distance of the footer baseline from the bottom edge.
const FOOTER_OFFSET: f64 = 16.0;
const BANNER_GAP: f64 = 6.0;
const BANNER_WIDTH_RATIO: f64 = 0.85;

const FOOTER_COLOR: Color = Color::rgb(80, 80, 80);

pub struct FooterComposer {
    organization: String,
    page_label: String,
    banner: Option<PathBuf>,
    font_size: f64,
    margin_bottom: f64,
    shaper: TextShaper,
}

impl FooterComposer {
    pub fn new(branding: &BrandingConfig, assets: &AssetConfig, layout: &LayoutConfig) -> Self {
        Self {
            organization: branding.organization.clone(),
            page_label: branding.page_label.clone(),
            banner: assets.banner_image.clone(),
            font_size: layout.footer_font_size,
            margin_bottom: layout.margin_bottom,
            shaper: TextShaper::default(),
        }
    }

    pub fn footer_text(&self, page_number: usize) -> String {
        format!("{} - {} {}", self.organization, self.page_label, page_number)
    }

    fn baseline(&self, size: PageSize) -> f64 {
        size.height - FOOTER_OFFSET
    }

    /// Band between the bottom margin line and the footer text.
    pub fn banner_area(&self, size: PageSize) -> Rect {
        let top = size.height - self.margin_bottom + BANNER_GAP;
        let bottom = self.baseline(size) - self.font_size - BANNER_GAP;
        let width = size.width * BANNER_WIDTH_RATIO;
        Rect::new(
            (size.width - width) / 2.0,
            top,
            width,
            (bottom - top).max(0.0),
        )
    }

    /// Draws the footer line for `page_number`, plus the closing banner on
    /// the last page. Returns whether the banner was drawn.
    pub fn draw_page_footer<S: Surface>(
        &self,
        ctx: &mut S,
        page_number: usize,
        is_last: bool,
    ) -> bool {
        let size = ctx.page_size();
        let options = TextOptions::new(self.font_size)
            .color(FOOTER_COLOR)
            .align(Align::Center);
        let text = self.footer_text(page_number);
        if !self
            .shaper
            .render(ctx, &text, size.width / 2.0, self.baseline(size), &options)
        {
            warn!(page = page_number, "Footer text could not be drawn");
        }

        if !is_last {
            return false;
        }

        let area = self.banner_area(size);
        let drawn = Chain::new("banner")
            .attempt("closing banner", |ctx: &mut S| self.draw_banner(ctx, area))
            .run(ctx);
        match drawn {
            Ok(resolved) => {
                debug!(page = page_number, width = resolved.value.width, "Closing banner drawn");
                true
            }
            Err(failures) => {
                warn!(
                    page = page_number,
                    attempts = failures.len(),
                    "Closing banner omitted"
                );
                false
            }
        }
    }

    fn draw_banner<S: Surface>(&self, ctx: &mut S, area: Rect) -> Result<Rect> {
        let path = self
            .banner
            .as_deref()
            .ok_or_else(|| ExportError::AssetUnavailable("no banner image configured".into()))?;
        if area.height <= 0.0 {
            return Err(ExportError::LayoutFailure(
                "no room for the banner above the footer".into(),
            ));
        }
        let (width, height) = ctx.register_image(BANNER_KEY, path)?;
        let rect = fit_within(area, width as f64, height as f64);
        ctx.draw_image(BANNER_KEY, rect)?;
        Ok(rect)
    }
}

/// Largest rect with the image's aspect ratio inside `area`, centered.
fn fit_within(area: Rect, width: f64, height: f64) -> Rect {
    let scale = (area.width / width).min(area.height / height);
    let (w, h) = (width * scale, height * scale);
    Rect::new(
        area.x + (area.width - w) / 2.0,
        area.y + (area.height - h) / 2.0,
        w,
        h,
    )
}

/// Page boundaries of one document: every page that is left gets its
/// footer, and the document font is re-asserted on every new page.
pub struct PageFlow<'a> {
    fonts: &'a FontRegistry,
    footer: &'a FooterComposer,
}

impl<'a> PageFlow<'a> {
    pub fn new(fonts: &'a FontRegistry, footer: &'a FooterComposer) -> Self {
        Self { fonts, footer }
    }

    pub fn fonts(&self) -> &FontRegistry {
        self.fonts
    }

    pub fn start_page<S: Surface>(&self, ctx: &mut S) -> Result<()> {
        ctx.add_page()?;
        self.fonts.setup(ctx);
        Ok(())
    }

    /// Footer for the current page, then a fresh page with the document
    /// font active.
    pub fn break_page<S: Surface>(&self, ctx: &mut S) -> Result<()> {
        let leaving = ctx.page_count();
        self.footer.draw_page_footer(ctx, leaving, false);
        ctx.add_page()?;
        self.fonts.setup(ctx);
        debug!(page = ctx.page_count(), "Page break");
        Ok(())
    }

    /// Footer and closing banner for the last page. Returns whether the
    /// banner was drawn.
    pub fn close<S: Surface>(&self, ctx: &mut S) -> bool {
        self.fonts.setup(ctx);
        let last = ctx.page_count();
        self.footer.draw_page_footer(ctx, last, true)
    }
}
