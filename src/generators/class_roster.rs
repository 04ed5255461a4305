// academy-export/src/generators/class_roster.rs

use super::{
    export_filename, share_columns, subtitle_line, DocumentPlan, Generator, Intro, PlanContext,
    NOT_EXAMINED,
};
use crate::compose::CoverContent;
use crate::error::Result;
use crate::models::{ClassRecord, DocumentKind, RenderOptions};
use crate::surface::Align;
use crate::text::{display_field, format_score, format_vnd, NO_DATA};

const COLUMNS: &[(&str, f64, Align)] = &[
    ("STT", 0.08, Align::Center),
    ("Họ tên", 0.47, Align::Left),
    ("Điểm thi", 0.15, Align::Center),
    ("Trạng thái thanh toán", 0.30, Align::Left),
];

pub struct ClassRosterGenerator<'a> {
    class: &'a ClassRecord,
}

impl<'a> ClassRosterGenerator<'a> {
    pub fn new(class: &'a ClassRecord) -> Self {
        Self { class }
    }
}

impl Generator for ClassRosterGenerator<'_> {
    fn kind(&self) -> DocumentKind {
        DocumentKind::ClassRoster
    }

    fn plan(&self, ctx: &PlanContext<'_>, options: &RenderOptions) -> Result<DocumentPlan> {
        let class = self.class;
        let name = display_field(Some(&class.name), NO_DATA);

        // occupancy is informational; an over-full class is printed as is
        let mut summary = vec![
            format!("Lớp: {name}"),
            format!(
                "Trình độ: {} - Sĩ số: {}/{}",
                display_field(class.level.as_deref(), NO_DATA),
                class.students.len(),
                class.max_students
            ),
            format!(
                "Giáo viên: {} - Học phí: {}",
                display_field(class.teacher.as_deref(), NO_DATA),
                format_vnd(class.tuition)
            ),
        ];
        summary.extend(subtitle_line(options));
        summary.push(format!("Ngày xuất: {}", ctx.display_date()));

        let rows = class
            .students
            .iter()
            .enumerate()
            .map(|(i, student)| {
                vec![
                    (i + 1).to_string(),
                    display_field(Some(&student.name), NO_DATA),
                    format_score(student.exam_score, NOT_EXAMINED),
                    display_field(student.payment_status.as_deref(), NO_DATA),
                ]
            })
            .collect();

        Ok(DocumentPlan {
            kind: self.kind(),
            orientation: ctx.orientation,
            title: format!("Thông tin lớp {name}"),
            intro: Intro::Cover(CoverContent {
                headline: "THÔNG TIN LỚP HỌC".to_string(),
                subtitle: ctx.branding.organization.clone(),
                summary,
                note: Some(ctx.branding.footer_note.clone()),
            }),
            columns: share_columns(COLUMNS, ctx.printable_width),
            rows,
            filename: export_filename("thong-tin-lop", Some(&class.name), ctx.date),
        })
    }
}
