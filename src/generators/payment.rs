// academy-export/src/generators/payment.rs

use super::{
    export_filename, share_columns, subtitle_line, DocumentPlan, Generator, Intro, PlanContext,
    STATUS_PAID, STATUS_UNPAID,
};
use crate::compose::CoverContent;
use crate::error::Result;
use crate::models::{DocumentKind, PaymentRecord, ReceiptFraming, RenderOptions};
use crate::surface::Align;
use crate::text::{display_field, format_vnd, NO_DATA};

const DETAIL_COLUMNS: &[(&str, f64, Align)] = &[
    ("Thông tin", 0.35, Align::Left),
    ("Chi tiết", 0.65, Align::Left),
];

const LEDGER_COLUMNS: &[(&str, f64, Align)] = &[
    ("STT", 0.05, Align::Center),
    ("Học viên", 0.18, Align::Left),
    ("Lớp", 0.16, Align::Left),
    ("Số tiền", 0.12, Align::Right),
    ("Phương thức", 0.11, Align::Left),
    ("Nhân viên thu", 0.13, Align::Left),
    ("Trạng thái", 0.12, Align::Left),
    ("Ngày thanh toán", 0.13, Align::Center),
];

fn status_label(payment: &PaymentRecord) -> &'static str {
    if payment.is_paid {
        STATUS_PAID
    } else {
        STATUS_UNPAID
    }
}

/// A single payment: a paid receipt, or a reminder when it is still open.
pub struct PaymentReceiptGenerator<'a> {
    payment: &'a PaymentRecord,
}

impl<'a> PaymentReceiptGenerator<'a> {
    pub fn new(payment: &'a PaymentRecord) -> Self {
        Self { payment }
    }

    /// Explicit framing wins; otherwise unpaid payments become reminders.
    pub fn framing(&self, options: &RenderOptions) -> ReceiptFraming {
        options.framing.unwrap_or(if self.payment.is_paid {
            ReceiptFraming::Receipt
        } else {
            ReceiptFraming::Reminder
        })
    }
}

impl Generator for PaymentReceiptGenerator<'_> {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PaymentReceipt
    }

    fn plan(&self, ctx: &PlanContext<'_>, options: &RenderOptions) -> Result<DocumentPlan> {
        let payment = self.payment;
        let student = display_field(Some(&payment.student_name), NO_DATA);
        let framing = self.framing(options);

        let (headline, prefix, mut summary) = match framing {
            ReceiptFraming::Receipt => (
                "HÓA ĐƠN THANH TOÁN",
                "hoa-don",
                vec![format!("Xác nhận học viên {student} đã thanh toán học phí.")],
            ),
            ReceiptFraming::Reminder => {
                let mut lines = vec![format!(
                    "Học viên {student} còn khoản học phí {} chưa thanh toán.",
                    format_vnd(payment.amount)
                )];
                if let Some(due) = payment_due(options) {
                    lines.push(format!("Vui lòng hoàn tất thanh toán trước ngày {due}."));
                }
                ("LỜI NHẮC THANH TOÁN", "loi-nhac-thanh-toan", lines)
            }
        };
        summary.extend(subtitle_line(options));
        summary.push(format!("Ngày xuất: {}", ctx.display_date()));

        let details = [
            ("Học viên", student.clone()),
            ("Lớp", display_field(payment.class_name.as_deref(), NO_DATA)),
            ("Số tiền", format_vnd(payment.amount)),
            ("Phương thức", display_field(payment.payment_method.as_deref(), NO_DATA)),
            ("Nhân viên thu", display_field(payment.staff_name.as_deref(), NO_DATA)),
            ("Trạng thái", status_label(payment).to_string()),
            ("Ngày thanh toán", display_field(payment.payment_date.as_deref(), NO_DATA)),
        ];
        let rows = details
            .into_iter()
            .map(|(label, value)| vec![label.to_string(), value])
            .collect();

        Ok(DocumentPlan {
            kind: self.kind(),
            orientation: ctx.orientation,
            title: format!("{headline} - {student}"),
            intro: Intro::Heading(CoverContent {
                headline: headline.to_string(),
                subtitle: ctx.branding.organization.clone(),
                summary,
                note: None,
            }),
            columns: share_columns(DETAIL_COLUMNS, ctx.printable_width),
            rows,
            filename: export_filename(prefix, Some(&payment.student_name), ctx.date),
        })
    }
}

fn payment_due(options: &RenderOptions) -> Option<String> {
    options
        .due_date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Many payments in one table, with collected and outstanding totals.
pub struct PaymentLedgerGenerator<'a> {
    payments: &'a [PaymentRecord],
}

impl<'a> PaymentLedgerGenerator<'a> {
    pub fn new(payments: &'a [PaymentRecord]) -> Self {
        Self { payments }
    }
}

impl Generator for PaymentLedgerGenerator<'_> {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PaymentLedger
    }

    fn plan(&self, ctx: &PlanContext<'_>, options: &RenderOptions) -> Result<DocumentPlan> {
        let (paid, unpaid): (Vec<_>, Vec<_>) = self.payments.iter().partition(|p| p.is_paid);
        let collected: f64 = paid.iter().map(|p| p.amount).sum();
        let outstanding: f64 = unpaid.iter().map(|p| p.amount).sum();

        let mut summary = vec![
            format!("Tổng số: {} giao dịch", self.payments.len()),
            format!(
                "Đã thu: {} - Chưa thu: {}",
                format_vnd(collected),
                format_vnd(outstanding)
            ),
        ];
        summary.extend(subtitle_line(options));
        summary.push(format!("Ngày xuất: {}", ctx.display_date()));

        let rows = self
            .payments
            .iter()
            .enumerate()
            .map(|(i, p)| {
                vec![
                    (i + 1).to_string(),
                    display_field(Some(&p.student_name), NO_DATA),
                    display_field(p.class_name.as_deref(), NO_DATA),
                    format_vnd(p.amount),
                    display_field(p.payment_method.as_deref(), NO_DATA),
                    display_field(p.staff_name.as_deref(), NO_DATA),
                    status_label(p).to_string(),
                    display_field(p.payment_date.as_deref(), NO_DATA),
                ]
            })
            .collect();

        Ok(DocumentPlan {
            kind: self.kind(),
            orientation: ctx.orientation,
            title: "Danh sách thanh toán".to_string(),
            intro: Intro::Cover(CoverContent {
                headline: "DANH SÁCH THANH TOÁN".to_string(),
                subtitle: ctx.branding.organization.clone(),
                summary,
                note: Some(ctx.branding.footer_note.clone()),
            }),
            columns: share_columns(LEDGER_COLUMNS, ctx.printable_width),
            rows,
            filename: export_filename("danh-sach-thanh-toan", None, ctx.date),
        })
    }
}
