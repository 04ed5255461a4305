// academy-export/src/compose/table.rs

//! Fixed-row-height tables paginated across pages.
//!
//! Pagination is planned up front by [`plan_pages`], a pure function of the
//! row count and page geometry, and only then drawn. A row never straddles
//! the bottom margin: when it does not fit it moves whole to the next page,
//! where the header row is repeated.

use std::ops::Range;

use tracing::{debug, info, warn};

use super::footer::PageFlow;
use crate::config::LayoutConfig;
use crate::error::{ExportError, Result};
use crate::surface::{Align, Color, PageSize, Rect, Surface};
use crate::text::{TextOptions, TextShaper};

/// Drawn in place of a table that could not be laid out.
pub const TABLE_FALLBACK_TEXT: &str = "Không thể tạo bảng dữ liệu";

const EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub width: f64,
    pub align: Align,
}

impl Column {
    pub fn new(header: impl Into<String>, width: f64) -> Self {
        Self {
            header: header.into(),
            width,
            align: Align::Left,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub margins: Margins,
    pub row_height: f64,
    pub header_height: f64,
    pub font_size: f64,
    pub header_font_size: f64,
    pub cell_padding: f64,
    pub header_fill: Color,
    pub header_text: Color,
    pub body_text: Color,
    pub body_fill: Color,
    pub stripe_fill: Color,
    pub grid: Color,
}

impl TableOptions {
    pub fn from_layout(layout: &LayoutConfig) -> Self {
        Self {
            margins: Margins {
                top: layout.margin_top,
                bottom: layout.margin_bottom,
                left: layout.margin_left,
                right: layout.margin_right,
            },
            row_height: layout.row_height,
            header_height: layout.header_height,
            font_size: layout.body_font_size,
            header_font_size: layout.header_font_size,
            cell_padding: layout.cell_padding,
            header_fill: Color::rgb(44, 62, 80),
            header_text: Color::WHITE,
            body_text: Color::rgb(33, 33, 33),
            body_fill: Color::WHITE,
            stripe_fill: Color::rgb(242, 245, 248),
            grid: Color::rgb(200, 200, 200),
        }
    }

    pub fn printable_width(&self, page: PageSize) -> f64 {
        page.width - self.margins.left - self.margins.right
    }
}

/// The rows that land on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice {
    /// Pages after the one the table starts on.
    pub page_offset: usize,
    /// Top of the header row.
    pub top: f64,
    pub rows: Range<usize>,
}

fn rows_that_fit(top: f64, limit: f64, options: &TableOptions) -> usize {
    let room = limit - top - options.header_height;
    if room < -EPS {
        return 0;
    }
    ((room + EPS) / options.row_height).floor().max(0.0) as usize
}

/// Splits `row_count` rows into per-page slices. The first slice starts at
/// `start_y` on the current page; later slices start at the top margin.
pub fn plan_pages(
    row_count: usize,
    start_y: f64,
    page: PageSize,
    options: &TableOptions,
) -> Result<Vec<PageSlice>> {
    if !(options.row_height > 0.0) || !(options.header_height >= 0.0) {
        return Err(ExportError::LayoutFailure(format!(
            "invalid row height {} / header height {}",
            options.row_height, options.header_height
        )));
    }
    let limit = page.height - options.margins.bottom;
    let fresh_top = options.margins.top;
    let fresh_capacity = rows_that_fit(fresh_top, limit, options);
    if fresh_capacity == 0 {
        return Err(ExportError::LayoutFailure(format!(
            "a row of height {} does not fit on an empty page",
            options.row_height
        )));
    }

    let first_capacity = rows_that_fit(start_y, limit, options);
    let header_fits = start_y + options.header_height <= limit + EPS;
    let mut slices = Vec::new();
    let mut next = 0;
    if first_capacity > 0 || (row_count == 0 && header_fits) {
        next = first_capacity.min(row_count);
        slices.push(PageSlice {
            page_offset: 0,
            top: start_y,
            rows: 0..next,
        });
    }

    let mut offset = 1;
    while next < row_count || slices.is_empty() {
        let end = (next + fresh_capacity).min(row_count);
        slices.push(PageSlice {
            page_offset: offset,
            top: fresh_top,
            rows: next..end,
        });
        offset += 1;
        next = end;
    }
    Ok(slices)
}

fn validate(columns: &[Column], rows: &[Vec<String>], printable: f64) -> Result<()> {
    if columns.is_empty() {
        return Err(ExportError::LayoutFailure("table has no columns".into()));
    }
    if let Some(column) = columns
        .iter()
        .find(|c| !c.width.is_finite() || c.width <= 0.0)
    {
        return Err(ExportError::LayoutFailure(format!(
            "column '{}' has invalid width {}",
            column.header, column.width
        )));
    }
    let total: f64 = columns.iter().map(|c| c.width).sum();
    if total > printable + EPS {
        return Err(ExportError::LayoutFailure(format!(
            "columns are {total:.1}pt wide, printable width is {printable:.1}pt"
        )));
    }
    if let Some((i, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != columns.len())
    {
        return Err(ExportError::LayoutFailure(format!(
            "row {} has {} cells, expected {}",
            i + 1,
            row.len(),
            columns.len()
        )));
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TableLayoutEngine {
    shaper: TextShaper,
}

impl TableLayoutEngine {
    pub fn new(shaper: TextShaper) -> Self {
        Self { shaper }
    }

    /// Draws the table starting at `start_y` on the current page and returns
    /// the number of pages it occupies, counting the starting page.
    ///
    /// Never fails: a malformed table or a drawing error is logged and
    /// replaced by [`TABLE_FALLBACK_TEXT`].
    pub fn layout_table<S: Surface>(
        &self,
        ctx: &mut S,
        flow: &PageFlow<'_>,
        columns: &[Column],
        rows: &[Vec<String>],
        start_y: f64,
        options: &TableOptions,
    ) -> usize {
        let first_page = ctx.page_count();
        match self.try_layout(ctx, flow, columns, rows, start_y, options) {
            Ok(pages) => {
                info!(rows = rows.len(), pages, "Table laid out");
                pages
            }
            Err(e) => {
                warn!(error = %e, rows = rows.len(), "Table layout failed, drawing fallback line");
                flow.fonts().setup(ctx);
                let text = TextOptions::new(options.font_size).color(options.body_text);
                self.shaper.render(
                    ctx,
                    TABLE_FALLBACK_TEXT,
                    options.margins.left,
                    start_y + options.font_size,
                    &text,
                );
                (ctx.page_count() + 1).saturating_sub(first_page).max(1)
            }
        }
    }

    fn try_layout<S: Surface>(
        &self,
        ctx: &mut S,
        flow: &PageFlow<'_>,
        columns: &[Column],
        rows: &[Vec<String>],
        start_y: f64,
        options: &TableOptions,
    ) -> Result<usize> {
        let page = ctx.page_size();
        validate(columns, rows, options.printable_width(page))?;
        let slices = plan_pages(rows.len(), start_y, page, options)?;

        flow.fonts().setup(ctx);
        let mut on_page = 0;
        for slice in &slices {
            while on_page < slice.page_offset {
                flow.break_page(ctx)?;
                on_page += 1;
            }
            self.draw_header(ctx, columns, slice.top, options)?;
            let mut y = slice.top + options.header_height;
            for index in slice.rows.clone() {
                self.draw_row(ctx, columns, &rows[index], index, y, options)?;
                y += options.row_height;
            }
            debug!(
                page = ctx.page_count(),
                rows = slice.rows.len(),
                "Table page drawn"
            );
        }
        Ok(on_page + 1)
    }

    fn draw_header<S: Surface>(
        &self,
        ctx: &mut S,
        columns: &[Column],
        top: f64,
        options: &TableOptions,
    ) -> Result<()> {
        let width: f64 = columns.iter().map(|c| c.width).sum();
        let band = Rect::new(options.margins.left, top, width, options.header_height);
        ctx.fill_rect(band, options.header_fill)?;
        let text = TextOptions::new(options.header_font_size).color(options.header_text);
        let cells = columns.iter().map(|c| c.header.as_str());
        self.draw_cells(ctx, columns, cells, band, text, options);
        Ok(())
    }

    fn draw_row<S: Surface>(
        &self,
        ctx: &mut S,
        columns: &[Column],
        row: &[String],
        index: usize,
        top: f64,
        options: &TableOptions,
    ) -> Result<()> {
        let width: f64 = columns.iter().map(|c| c.width).sum();
        let band = Rect::new(options.margins.left, top, width, options.row_height);
        let fill = if index % 2 == 0 {
            options.body_fill
        } else {
            options.stripe_fill
        };
        ctx.fill_rect(band, fill)?;

        let mut x = band.x;
        for column in columns {
            ctx.stroke_rect(Rect::new(x, top, column.width, band.height), options.grid, 0.5)?;
            x += column.width;
        }

        let text = TextOptions::new(options.font_size).color(options.body_text);
        self.draw_cells(ctx, columns, row.iter().map(String::as_str), band, text, options);
        Ok(())
    }

    fn draw_cells<'c, S: Surface>(
        &self,
        ctx: &mut S,
        columns: &[Column],
        cells: impl Iterator<Item = &'c str>,
        band: Rect,
        text: TextOptions,
        options: &TableOptions,
    ) {
        let baseline = band.y + (band.height + text.size * 0.7) / 2.0;
        let mut x = band.x;
        for (column, cell) in columns.iter().zip(cells) {
            let room = column.width - 2.0 * options.cell_padding;
            let fitted = self.shaper.fit(ctx, cell, room.max(0.0), text.size);
            let anchor = match column.align {
                Align::Left => x + options.cell_padding,
                Align::Center => x + column.width / 2.0,
                Align::Right => x + column.width - options.cell_padding,
            };
            self.shaper
                .render(ctx, &fitted, anchor, baseline, &text.align(column.align));
            x += column.width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::FooterComposer;
    use crate::config::{AssetConfig, ExportConfig};
    use crate::fonts::FontRegistry;
    use crate::surface::RecordingSurface;
    use proptest::prelude::*;

    fn options(top: f64, bottom: f64, header: f64, row: f64) -> TableOptions {
        let mut options = TableOptions::from_layout(&LayoutConfig::default());
        options.margins.top = top;
        options.margins.bottom = bottom;
        options.header_height = header;
        options.row_height = row;
        options
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("STT", 40.0).align(Align::Center),
            Column::new("Họ tên", 200.0),
            Column::new("Số tiền", 120.0).align(Align::Right),
        ]
    }

    fn rows(n: usize) -> Vec<Vec<String>> {
        (1..=n)
            .map(|i| vec![i.to_string(), format!("Học viên {i}"), "500.000 đ".into()])
            .collect()
    }

    fn body_rows_on(ctx: &RecordingSurface, page: usize, options: &TableOptions) -> usize {
        ctx.filled_rects_on(page, options.body_fill).len()
            + ctx.filled_rects_on(page, options.stripe_fill).len()
    }

    struct Fixture {
        fonts: FontRegistry,
        footer: FooterComposer,
    }

    impl Fixture {
        fn new() -> Self {
            let config = ExportConfig::default();
            Self {
                fonts: FontRegistry::from_assets(&AssetConfig::default()),
                footer: FooterComposer::new(&config.branding, &config.assets, &config.layout),
            }
        }
    }

    #[test]
    fn forty_rows_per_page_splits_fifty_into_two_pages() {
        let page = PageSize {
            width: 600.0,
            height: 800.0,
        };
        let opts = options(40.0, 60.0, 20.0, 17.0);
        let slices = plan_pages(50, 40.0, page, &opts).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].rows, 0..40);
        assert_eq!(slices[1].rows, 40..50);
        assert_eq!(slices[1].page_offset, 1);

        let fixture = Fixture::new();
        let flow = PageFlow::new(&fixture.fonts, &fixture.footer);
        let mut ctx = RecordingSurface::new(page);
        flow.start_page(&mut ctx).unwrap();
        let used = TableLayoutEngine::default()
            .layout_table(&mut ctx, &flow, &columns(), &rows(50), 40.0, &opts);
        assert_eq!(used, 2);
        assert_eq!(ctx.page_count(), 2);
        assert_eq!(body_rows_on(&ctx, 1, &opts), 40);
        assert_eq!(body_rows_on(&ctx, 2, &opts), 10);
        for page in 1..=2 {
            assert_eq!(ctx.filled_rects_on(page, opts.header_fill).len(), 1);
            assert!(ctx.texts_on(page).contains(&"Họ tên"));
        }
        // the page that was left got its footer, the last one is the caller's
        assert!(ctx.texts_on(1).contains(&"Học viện Ngoại ngữ - Trang 1"));
    }

    #[test]
    fn row_that_would_cross_the_margin_moves_whole() {
        let page = PageSize {
            width: 600.0,
            height: 800.0,
        };
        let opts = options(40.0, 60.0, 20.0, 17.0);
        // 700 + 20 header leaves 20pt: one row of 17 fits, a second would not
        let slices = plan_pages(3, 700.0, page, &opts).unwrap();
        assert_eq!(slices[0].rows, 0..1);
        assert_eq!(slices[1].rows, 1..3);
        assert_eq!(slices[1].top, 40.0);
    }

    #[test]
    fn table_starting_below_the_margin_begins_on_next_page() {
        let page = PageSize::A4;
        let opts = options(40.0, 80.0, 24.0, 20.0);
        let slices = plan_pages(5, page.height - 90.0, page, &opts).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].page_offset, 1);
        assert_eq!(slices[0].rows, 0..5);
    }

    #[test]
    fn row_taller_than_a_page_is_a_layout_failure() {
        let opts = options(40.0, 60.0, 20.0, 2000.0);
        assert!(matches!(
            plan_pages(1, 40.0, PageSize::A4, &opts),
            Err(ExportError::LayoutFailure(_))
        ));
    }

    #[test]
    fn empty_table_draws_only_the_header() {
        let fixture = Fixture::new();
        let flow = PageFlow::new(&fixture.fonts, &fixture.footer);
        let opts = TableOptions::from_layout(&LayoutConfig::default());
        let mut ctx = RecordingSurface::new(PageSize::A4);
        flow.start_page(&mut ctx).unwrap();

        let used = TableLayoutEngine::default()
            .layout_table(&mut ctx, &flow, &columns(), &[], 40.0, &opts);
        assert_eq!(used, 1);
        assert_eq!(ctx.filled_rects_on(1, opts.header_fill).len(), 1);
        assert_eq!(body_rows_on(&ctx, 1, &opts), 0);
        assert_eq!(ctx.texts(), vec!["STT", "Họ tên", "Số tiền"]);
    }

    #[test]
    fn malformed_columns_degrade_to_fallback_line() {
        let fixture = Fixture::new();
        let flow = PageFlow::new(&fixture.fonts, &fixture.footer);
        let opts = TableOptions::from_layout(&LayoutConfig::default());
        let engine = TableLayoutEngine::default();

        let cases: Vec<(Vec<Column>, Vec<Vec<String>>)> = vec![
            (vec![], rows(2)),
            (vec![Column::new("A", f64::NAN)], vec![vec!["x".into()]]),
            (vec![Column::new("A", -5.0)], vec![vec!["x".into()]]),
            (vec![Column::new("A", 5_000.0)], vec![vec!["x".into()]]),
            (columns(), vec![vec!["only one cell".into()]]),
        ];
        for (columns, rows) in cases {
            let mut ctx = RecordingSurface::new(PageSize::A4);
            flow.start_page(&mut ctx).unwrap();
            let used = engine.layout_table(&mut ctx, &flow, &columns, &rows, 120.0, &opts);
            assert!(used >= 1);
            assert_eq!(ctx.texts(), vec![TABLE_FALLBACK_TEXT]);
            assert_eq!(ctx.page_count(), 1);
        }
    }

    #[test]
    fn long_cells_are_truncated_to_their_column() {
        let fixture = Fixture::new();
        let flow = PageFlow::new(&fixture.fonts, &fixture.footer);
        let opts = TableOptions::from_layout(&LayoutConfig::default());
        let mut ctx = RecordingSurface::new(PageSize::A4);
        flow.start_page(&mut ctx).unwrap();

        let long = "Nguyễn Thị Phương Thảo Nguyễn Thị Phương Thảo Nguyễn Thị Phương Thảo";
        let rows = vec![vec!["1".to_string(), long.to_string(), "0 đ".to_string()]];
        TableLayoutEngine::default().layout_table(&mut ctx, &flow, &columns(), &rows, 40.0, &opts);
        let drawn = ctx.texts().into_iter().find(|t| t.starts_with("Nguyễn")).unwrap();
        assert!(drawn.ends_with('…'));
        assert!(ctx.text_width(drawn, opts.font_size) <= 200.0 - 2.0 * opts.cell_padding);
    }

    proptest! {
        #[test]
        fn rows_are_conserved_and_never_split(
            row_count in 0usize..400,
            start_y in 40.0f64..780.0,
            row_height in 8.0f64..60.0,
            header_height in 10.0f64..40.0,
        ) {
            let page = PageSize::A4;
            let opts = options(40.0, 60.0, header_height, row_height);
            let limit = page.height - opts.margins.bottom;
            let slices = plan_pages(row_count, start_y, page, &opts).unwrap();

            let mut expected_next = 0;
            let mut last_offset = None;
            for slice in &slices {
                prop_assert_eq!(slice.rows.start, expected_next);
                expected_next = slice.rows.end;
                if let Some(prev) = last_offset {
                    prop_assert!(slice.page_offset > prev);
                }
                last_offset = Some(slice.page_offset);

                let first_row_top = slice.top + opts.header_height;
                for i in 0..slice.rows.len() {
                    let bottom = first_row_top + (i + 1) as f64 * row_height;
                    prop_assert!(bottom <= limit + 1e-5);
                }
            }
            prop_assert_eq!(expected_next, row_count);
            prop_assert!(!slices.is_empty());
        }
    }
}
