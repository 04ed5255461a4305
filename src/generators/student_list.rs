// academy-export/src/generators/student_list.rs

use tracing::debug;

use super::{
    export_filename, share_columns, subtitle_line, DocumentPlan, Generator, Intro, PlanContext,
    NOT_EXAMINED,
};
use crate::compose::CoverContent;
use crate::error::Result;
use crate::models::{DocumentKind, RenderOptions, StudentRecord};
use crate::surface::Align;
use crate::text::{display_field, format_score, NO_DATA};

const COLUMNS: &[(&str, f64, Align)] = &[
    ("STT", 0.04, Align::Center),
    ("Họ tên", 0.13, Align::Left),
    ("Email", 0.14, Align::Left),
    ("SĐT", 0.08, Align::Left),
    ("Trường", 0.11, Align::Left),
    ("Nguồn", 0.07, Align::Left),
    ("Lớp", 0.11, Align::Left),
    ("Điểm", 0.05, Align::Center),
    ("Ngày thi", 0.07, Align::Center),
    ("Trình độ", 0.07, Align::Left),
    ("Ghi chú", 0.13, Align::Left),
];

pub struct StudentListGenerator<'a> {
    students: &'a [StudentRecord],
}

impl<'a> StudentListGenerator<'a> {
    pub fn new(students: &'a [StudentRecord]) -> Self {
        Self { students }
    }

    fn row(index: usize, student: &StudentRecord) -> Vec<String> {
        vec![
            (index + 1).to_string(),
            display_field(Some(&student.name), NO_DATA),
            display_field(student.email.as_deref(), NO_DATA),
            display_field(student.phone.as_deref(), NO_DATA),
            display_field(student.school.as_deref(), NO_DATA),
            display_field(student.platform.as_deref(), NO_DATA),
            display_field(student.classes.as_deref(), NO_DATA),
            format_score(student.exam_score, NOT_EXAMINED),
            display_field(student.exam_date.as_deref(), NO_DATA),
            display_field(student.level.as_deref(), NO_DATA),
            display_field(student.note.as_deref(), ""),
        ]
    }
}

impl Generator for StudentListGenerator<'_> {
    fn kind(&self) -> DocumentKind {
        DocumentKind::StudentList
    }

    fn plan(&self, ctx: &PlanContext<'_>, options: &RenderOptions) -> Result<DocumentPlan> {
        let mut summary = vec![format!("Tổng số: {} học viên", self.students.len())];
        summary.extend(subtitle_line(options));
        summary.push(format!("Ngày xuất: {}", ctx.display_date()));

        let rows: Vec<Vec<String>> = self
            .students
            .iter()
            .enumerate()
            .map(|(i, student)| Self::row(i, student))
            .collect();
        debug!(rows = rows.len(), "Student list planned");

        Ok(DocumentPlan {
            kind: self.kind(),
            orientation: ctx.orientation,
            title: "Danh sách học viên".to_string(),
            intro: Intro::Cover(CoverContent {
                headline: "DANH SÁCH HỌC VIÊN".to_string(),
                subtitle: ctx.branding.organization.clone(),
                summary,
                note: Some(ctx.branding.footer_note.clone()),
            }),
            columns: share_columns(COLUMNS, ctx.printable_width),
            rows,
            filename: export_filename("danh-sach-hoc-vien", None, ctx.date),
        })
    }
}
