// academy-export/src/generators/mod.rs

//! Per-kind document plans: what goes on the cover, which columns the table
//! has and how every record becomes a row of display strings.
//!
//! Generators do no drawing. Missing fields are mapped to placeholders here,
//! once, so the table engine never sees an absent value.

mod class_roster;
mod payment;
mod student_list;

use chrono::NaiveDate;
use serde::Serialize;

use crate::compose::{Column, CoverContent};
use crate::config::BrandingConfig;
use crate::error::Result;
use crate::models::{DocumentKind, ExportPayload, Orientation, RenderOptions};
use crate::surface::Align;
use crate::text::{normalize, to_filename_safe};

pub use class_roster::ClassRosterGenerator;
pub use payment::{PaymentLedgerGenerator, PaymentReceiptGenerator};
pub use student_list::StudentListGenerator;

/// Shown in score cells of students without an exam result.
pub const NOT_EXAMINED: &str = "Chưa thi";
pub const STATUS_PAID: &str = "Đã thanh toán";
pub const STATUS_UNPAID: &str = "Chưa thanh toán";

/// Inputs every generator plans against.
#[derive(Debug, Clone)]
pub struct PlanContext<'a> {
    pub branding: &'a BrandingConfig,
    pub orientation: Orientation,
    /// Table width available between the side margins.
    pub printable_width: f64,
    pub date: NaiveDate,
}

impl PlanContext<'_> {
    /// `dd/mm/yyyy`, as printed on covers.
    pub fn display_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Intro {
    /// A full cover page; the table starts on the next page.
    Cover(CoverContent),
    /// A compact heading sharing the first page with the table.
    Heading(CoverContent),
}

#[derive(Debug, Clone)]
pub struct DocumentPlan {
    pub kind: DocumentKind,
    pub orientation: Orientation,
    pub title: String,
    pub intro: Intro,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub filename: String,
}

pub trait Generator {
    fn kind(&self) -> DocumentKind;

    fn plan(&self, ctx: &PlanContext<'_>, options: &RenderOptions) -> Result<DocumentPlan>;
}

pub fn create_generator(payload: &ExportPayload) -> Box<dyn Generator + '_> {
    match payload {
        ExportPayload::StudentList(students) => Box::new(StudentListGenerator::new(students)),
        ExportPayload::ClassRoster(class) => Box::new(ClassRosterGenerator::new(class)),
        ExportPayload::PaymentReceipt(payment) => Box::new(PaymentReceiptGenerator::new(payment)),
        ExportPayload::PaymentLedger(payments) => Box::new(PaymentLedgerGenerator::new(payments)),
    }
}

/// `<prefix>[-<safe subject>]-<YYYY-MM-DD>.pdf`
pub fn export_filename(prefix: &str, subject: Option<&str>, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    match subject {
        Some(subject) => format!("{prefix}-{}-{date}.pdf", to_filename_safe(subject)),
        None => format!("{prefix}-{date}.pdf"),
    }
}

/// Columns sized as shares of the printable width.
fn share_columns(columns: &[(&str, f64, Align)], printable_width: f64) -> Vec<Column> {
    columns
        .iter()
        .map(|(header, share, align)| Column::new(*header, printable_width * share).align(*align))
        .collect()
}

/// Cover summary line for the caller's filter description, if any.
fn subtitle_line(options: &RenderOptions) -> Option<String> {
    options
        .subtitle
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize)
}
