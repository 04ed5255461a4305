// academy-export/tests/export_scenarios.rs

use std::path::PathBuf;

use academy_export::compose::{Column, CoverContent, TableOptions, TABLE_FALLBACK_TEXT};
use academy_export::generators::{
    ClassRosterGenerator, DocumentPlan, Intro, PaymentLedgerGenerator, PaymentReceiptGenerator,
    StudentListGenerator,
};
use academy_export::surface::{PageSize, RecordingSurface, Surface};
use academy_export::{
    ClassRecord, ClassStudentRow, DocumentAssembler, DocumentKind, ExportConfig, Orientation,
    PaymentRecord, RenderOptions, Stage, StudentRecord,
};
use chrono::NaiveDate;
use proptest::prelude::*;
use tempfile::TempDir;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
}

fn options() -> RenderOptions {
    RenderOptions::default().with_date(date())
}

fn banner(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("closing-banner.png");
    image::RgbaImage::from_pixel(600, 90, image::Rgba([31, 78, 121, 255]))
        .save(&path)
        .unwrap();
    path
}

/// 600x800pt pages where exactly 40 rows of 17pt fit under a 20pt header.
fn compact_config(banner_image: Option<PathBuf>) -> ExportConfig {
    let mut config = ExportConfig::default();
    config.layout.margin_top = 40.0;
    config.layout.margin_bottom = 60.0;
    config.layout.header_height = 20.0;
    config.layout.row_height = 17.0;
    config.assets.banner_image = banner_image;
    config
}

const COMPACT_PAGE: PageSize = PageSize {
    width: 600.0,
    height: 800.0,
};

fn footers_on(ctx: &RecordingSurface, page: usize) -> Vec<String> {
    ctx.texts_on(page)
        .into_iter()
        .filter(|t| t.contains(" - Trang "))
        .map(str::to_string)
        .collect()
}

fn body_rows_on(ctx: &RecordingSurface, page: usize, table: &TableOptions) -> usize {
    ctx.filled_rects_on(page, table.body_fill).len()
        + ctx.filled_rects_on(page, table.stripe_fill).len()
}

fn payments(n: usize) -> Vec<PaymentRecord> {
    (1..=n)
        .map(|i| PaymentRecord {
            student_name: format!("Học viên {i}"),
            class_name: Some("Lớp Tiếng Anh A1".into()),
            amount: 1_200_000.0,
            payment_method: Some("Tiền mặt".into()),
            staff_name: Some("Lê Thu".into()),
            is_paid: i % 3 != 0,
            payment_date: Some("15/08/2024".into()),
        })
        .collect()
}

#[test]
fn student_list_of_three() {
    let assembler = DocumentAssembler::new(ExportConfig::default());
    let students: Vec<StudentRecord> = ["Nguyễn Văn An", "Trần Thị Bình", "Lê Văn Cường"]
        .iter()
        .map(|name| StudentRecord {
            name: name.to_string(),
            exam_score: Some(6.5),
            ..StudentRecord::default()
        })
        .collect();

    let document = assembler.student_list(&students, &options()).unwrap();
    assert_eq!(document.kind, DocumentKind::StudentList);
    assert_eq!(document.filename, "danh-sach-hoc-vien-2024-08-20.pdf");
    assert!(document.bytes.starts_with(b"%PDF-"));

    let plan = assembler
        .plan(&StudentListGenerator::new(&students), &options())
        .unwrap();
    assert_eq!(plan.orientation, Orientation::Landscape);
    let mut ctx = RecordingSurface::new(plan.orientation.page_size());
    assembler.compose(&mut ctx, &plan).unwrap();
    assert!(ctx.texts_on(1).contains(&"Tổng số: 3 học viên"));
    assert!(ctx.texts_on(2).contains(&"Trần Thị Bình"));
}

#[test]
fn class_roster_without_students_draws_header_only() {
    let assembler = DocumentAssembler::new(ExportConfig::default());
    let class = ClassRecord {
        name: "Lớp Tiếng Anh A1".into(),
        level: Some("A1".into()),
        max_students: 15,
        tuition: 2_000_000.0,
        teacher: None,
        students: vec![],
    };

    let document = assembler.class_roster(&class, &options()).unwrap();
    assert_eq!(document.filename, "thong-tin-lop-Lop-Tieng-Anh-A1-2024-08-20.pdf");

    let plan = assembler
        .plan(&ClassRosterGenerator::new(&class), &options())
        .unwrap();
    let mut ctx = RecordingSurface::new(plan.orientation.page_size());
    let composition = assembler.compose(&mut ctx, &plan).unwrap();
    let table = TableOptions::from_layout(&assembler.config().layout);

    assert_eq!(composition.stage, Stage::Finalized);
    assert_eq!(composition.pages, 2);
    assert_eq!(ctx.filled_rects_on(2, table.header_fill).len(), 1);
    assert_eq!(body_rows_on(&ctx, 2, &table), 0);
    assert!(ctx.texts_on(1).contains(&"Trình độ: A1 - Sĩ số: 0/15"));
}

#[test]
fn unpaid_receipt_is_a_reminder() {
    let assembler = DocumentAssembler::new(ExportConfig::default());
    let payment = PaymentRecord {
        student_name: "Nguyễn Văn An".into(),
        class_name: Some("Lớp Tiếng Anh A1".into()),
        amount: 1_500_000.0,
        is_paid: false,
        ..PaymentRecord::default()
    };

    let document = assembler.payment_receipt(&payment, &options()).unwrap();
    assert!(document.filename.starts_with("loi-nhac-thanh-toan-"));
    assert_eq!(document.filename, "loi-nhac-thanh-toan-Nguyen-Van-An-2024-08-20.pdf");
    assert_eq!(document.page_count, 1);

    let plan = assembler
        .plan(&PaymentReceiptGenerator::new(&payment), &options())
        .unwrap();
    let mut ctx = RecordingSurface::new(plan.orientation.page_size());
    assembler.compose(&mut ctx, &plan).unwrap();
    let texts = ctx.texts();
    assert!(texts.contains(&"LỜI NHẮC THANH TOÁN"));
    let reminder = "Học viên Nguyễn Văn An còn khoản học phí 1.500.000 đ chưa thanh toán.";
    assert!(texts.contains(&reminder));
    assert!(texts.contains(&"Chưa thanh toán"));
}

#[test]
fn ledger_of_fifty_rows_spills_onto_a_second_table_page() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = DocumentAssembler::new(compact_config(Some(banner(&dir))));
    let records = payments(50);
    let portrait = RenderOptions {
        orientation: Some(Orientation::Portrait),
        ..options()
    };

    let plan = assembler
        .plan(&PaymentLedgerGenerator::new(&records), &portrait)
        .unwrap();
    let mut ctx = RecordingSurface::new(COMPACT_PAGE);
    let composition = assembler.compose(&mut ctx, &plan).unwrap();
    let table = TableOptions::from_layout(&assembler.config().layout);

    // cover, then two table pages
    assert_eq!(composition.pages, 3);
    assert_eq!(composition.table_pages, 2);
    assert!(composition.banner_drawn);

    assert_eq!(body_rows_on(&ctx, 2, &table), 40);
    assert_eq!(body_rows_on(&ctx, 3, &table), 10);
    for page in 2..=3 {
        assert_eq!(ctx.filled_rects_on(page, table.header_fill).len(), 1);
        assert_eq!(footers_on(&ctx, page).len(), 1);
    }
    assert!(ctx.texts_on(3).contains(&"Học viên 41"));
    assert!(!ctx.texts_on(2).contains(&"Học viên 41"));

    let banners = ctx.images();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].0, 3);
}

#[test]
fn every_page_gets_one_footer_and_only_the_last_a_banner() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = DocumentAssembler::new(compact_config(Some(banner(&dir))));
    let records = payments(95);
    let portrait = RenderOptions {
        orientation: Some(Orientation::Portrait),
        ..options()
    };
    let plan = assembler
        .plan(&PaymentLedgerGenerator::new(&records), &portrait)
        .unwrap();
    let mut ctx = RecordingSurface::new(COMPACT_PAGE);
    let composition = assembler.compose(&mut ctx, &plan).unwrap();

    assert_eq!(composition.pages, 4);
    for page in 1..=composition.pages {
        assert_eq!(
            footers_on(&ctx, page),
            vec![format!("Học viện Ngoại ngữ - Trang {page}")]
        );
    }
    let banner_pages: Vec<usize> = ctx.images().iter().map(|(page, _)| *page).collect();
    assert_eq!(banner_pages, vec![composition.pages]);
}

#[test]
fn configured_font_is_embedded_in_the_export() {
    let mut config = ExportConfig::default();
    config.assets.primary_font =
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf"));
    let assembler = DocumentAssembler::new(config);
    let class = ClassRecord {
        name: "Lớp Tiếng Việt nâng cao".into(),
        max_students: 20,
        tuition: 2_500_000.0,
        students: (1..=60)
            .map(|i| ClassStudentRow {
                name: format!("Nguyễn Thị Huệ {i}"),
                ..ClassStudentRow::default()
            })
            .collect(),
        ..ClassRecord::default()
    };

    let document = assembler.class_roster(&class, &options()).unwrap();
    assert!(document.page_count >= 3);
    let text = String::from_utf8_lossy(&document.bytes);
    assert!(text.contains("/Identity-H"));
    assert!(text.contains("/FontFile2"));
    assert!(text.contains("/ToUnicode"));
    assert!(!text.contains("/WinAnsiEncoding"));
}

#[test]
fn missing_assets_still_produce_a_document() {
    let mut config = ExportConfig::default();
    config.assets.primary_font = Some("/nonexistent/BeVietnamPro-Regular.ttf".into());
    config.assets.secondary_font = Some("/nonexistent/Roboto-Vietnamese.ttf".into());
    config.assets.banner_image = Some("/nonexistent/banner.png".into());
    let assembler = DocumentAssembler::new(config);

    let document = assembler.payment_ledger(&payments(5), &options()).unwrap();
    assert_eq!(document.filename, "danh-sach-thanh-toan-2024-08-20.pdf");
    assert!(document.bytes.starts_with(b"%PDF-"));
}

#[test]
fn malformed_columns_degrade_without_failing_the_document() {
    let assembler = DocumentAssembler::new(ExportConfig::default());
    let plan = DocumentPlan {
        kind: DocumentKind::ClassRoster,
        orientation: Orientation::Portrait,
        title: "Lớp lỗi".into(),
        intro: Intro::Cover(CoverContent {
            headline: "THÔNG TIN LỚP HỌC".into(),
            subtitle: "Học viện Ngoại ngữ".into(),
            summary: vec![],
            note: None,
        }),
        columns: vec![Column::new("Họ tên", 10_000.0), Column::new("Điểm", -1.0)],
        rows: vec![vec!["Nguyễn Văn An".into()]],
        filename: "thong-tin-lop-loi-2024-08-20.pdf".into(),
    };
    let mut ctx = RecordingSurface::new(PageSize::A4);
    let composition = assembler.compose(&mut ctx, &plan).unwrap();

    assert_eq!(composition.stage, Stage::Finalized);
    assert!(composition.table_pages >= 1);
    assert!(ctx.texts_on(2).contains(&TABLE_FALLBACK_TEXT));
    assert_eq!(footers_on(&ctx, 2).len(), 1);
    assert!(ctx.finish().is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rows_are_conserved_and_footers_cover_every_page(row_count in 0usize..140) {
        let assembler = DocumentAssembler::new(compact_config(None));
        let records = payments(row_count);
        let portrait = RenderOptions {
            orientation: Some(Orientation::Portrait),
            ..options()
        };
        let plan = assembler
            .plan(&PaymentLedgerGenerator::new(&records), &portrait)
            .unwrap();
        let mut ctx = RecordingSurface::new(COMPACT_PAGE);
        let composition = assembler.compose(&mut ctx, &plan).unwrap();
        let table = TableOptions::from_layout(&assembler.config().layout);
        let limit = COMPACT_PAGE.height - table.margins.bottom;

        let drawn: usize = (1..=composition.pages)
            .map(|page| body_rows_on(&ctx, page, &table))
            .sum();
        prop_assert_eq!(drawn, row_count);
        prop_assert_eq!(composition.pages, 1 + composition.table_pages);

        for page in 1..=composition.pages {
            prop_assert_eq!(footers_on(&ctx, page).len(), 1);
            let mut rows = ctx.filled_rects_on(page, table.body_fill);
            rows.extend(ctx.filled_rects_on(page, table.stripe_fill));
            for rect in rows {
                prop_assert!(rect.bottom() <= limit + 1e-6);
            }
        }
    }
}
