// academy-export/src/models.rs

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorResponse, ExportError};
use crate::surface::PageSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    StudentList,
    ClassRoster,
    PaymentReceipt,
    PaymentLedger,
}

impl DocumentKind {
    pub fn default_orientation(&self) -> Orientation {
        match self {
            DocumentKind::StudentList | DocumentKind::PaymentLedger => Orientation::Landscape,
            DocumentKind::ClassRoster | DocumentKind::PaymentReceipt => Orientation::Portrait,
        }
    }

    /// Whether the document opens with a full cover page. The receipt puts a
    /// compact heading above its details table instead.
    pub fn has_cover(&self) -> bool {
        !matches!(self, DocumentKind::PaymentReceipt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn page_size(&self) -> PageSize {
        match self {
            Orientation::Portrait => PageSize::A4,
            Orientation::Landscape => PageSize::A4.rotated(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptFraming {
    Receipt,
    Reminder,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub school: Option<String>,
    #[serde(alias = "acquisitionPlatform")]
    pub platform: Option<String>,
    pub note: Option<String>,
    /// Comma-joined class names.
    pub classes: Option<String>,
    pub exam_score: Option<f64>,
    pub exam_date: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudentRow {
    pub name: String,
    pub exam_score: Option<f64>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub name: String,
    pub level: Option<String>,
    pub max_students: u32,
    #[serde(alias = "tuitionFee")]
    pub tuition: f64,
    #[serde(alias = "teacherName")]
    pub teacher: Option<String>,
    #[serde(default)]
    pub students: Vec<ClassStudentRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub student_name: String,
    pub class_name: Option<String>,
    /// Amount in VND, already resolved by the caller.
    pub amount: f64,
    pub payment_method: Option<String>,
    pub staff_name: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    /// Already formatted by the caller, or empty.
    pub payment_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub orientation: Option<Orientation>,
    /// Filter or annotation line shown on the cover.
    pub subtitle: Option<String>,
    pub generated_on: Option<NaiveDate>,
    pub framing: Option<ReceiptFraming>,
    pub due_date: Option<String>,
}

impl RenderOptions {
    pub fn date(&self) -> NaiveDate {
        self.generated_on
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExportPayload {
    StudentList(Vec<StudentRecord>),
    ClassRoster(ClassRecord),
    PaymentReceipt(PaymentRecord),
    PaymentLedger(Vec<PaymentRecord>),
}

impl ExportPayload {
    pub fn kind(&self) -> DocumentKind {
        match self {
            ExportPayload::StudentList(_) => DocumentKind::StudentList,
            ExportPayload::ClassRoster(_) => DocumentKind::ClassRoster,
            ExportPayload::PaymentReceipt(_) => DocumentKind::PaymentReceipt,
            ExportPayload::PaymentLedger(_) => DocumentKind::PaymentLedger,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub document: ExportPayload,
    #[serde(default)]
    pub options: RenderOptions,
}

/// A finished document, handed back to the web layer as-is.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub kind: DocumentKind,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub filename: String,
    pub mime_type: String,
    pub content_base64: String,
    pub size_bytes: usize,
    pub sha256_checksum: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub request_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<GeneratedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ExportResponse {
    pub fn success(request_id: String, document: GeneratedDocument) -> Self {
        Self {
            request_id,
            status: "success".to_string(),
            document: Some(document),
            error: None,
            error_type: None,
            generated_at: Utc::now(),
        }
    }

    pub fn error(request_id: String, error: &ExportError) -> Self {
        let ErrorResponse { error, error_type } = error.to_error_response();
        Self {
            request_id,
            status: "error".to_string(),
            document: None,
            error: Some(error),
            error_type: Some(error_type),
            generated_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_kind_and_data_tags() {
        let json = r#"{
            "document": {
                "kind": "payment_receipt",
                "data": { "studentName": "Nguyễn Văn An", "amount": 1500000, "isPaid": false }
            },
            "options": { "generatedOn": "2024-08-20", "dueDate": "30/08/2024" }
        }"#;
        let request: ExportRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.document.kind(), DocumentKind::PaymentReceipt);
        assert_eq!(
            request.options.date(),
            NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
        );
        match request.document {
            ExportPayload::PaymentReceipt(payment) => {
                assert_eq!(payment.student_name, "Nguyễn Văn An");
                assert!(!payment.is_paid);
                assert!(payment.class_name.is_none());
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn class_record_accepts_web_field_names() {
        let json = r#"{
            "name": "Lớp Tiếng Anh A1",
            "maxStudents": 12,
            "tuitionFee": 2500000,
            "teacherName": "Cô Lan"
        }"#;
        let class: ClassRecord = serde_json::from_str(json).unwrap();
        assert_eq!(class.max_students, 12);
        assert_eq!(class.teacher.as_deref(), Some("Cô Lan"));
        assert!(class.students.is_empty());
    }

    #[test]
    fn error_response_carries_error_type() {
        let failed = ExportError::AssemblyFailed("no pages".into());
        let response = ExportResponse::error("req-1".to_string(), &failed);
        assert!(!response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Assembly failed: no pages");
        assert_eq!(json["error_type"], "assembly_failed");
        assert!(json.get("document").is_none());
    }

    #[test]
    fn orientation_defaults_follow_kind() {
        assert_eq!(
            DocumentKind::StudentList.default_orientation(),
            Orientation::Landscape
        );
        assert_eq!(
            DocumentKind::ClassRoster.default_orientation(),
            Orientation::Portrait
        );
        let landscape = Orientation::Landscape.page_size();
        assert!(landscape.width > landscape.height);
    }
}
