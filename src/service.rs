// academy-export/src/service.rs

//! In-process request adapter for the web layer: JSON in, JSON-ready
//! response out.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::error::ExportError;
use crate::models::{ExportRequest, ExportResponse, ExportedDocument, GeneratedDocument};
use crate::pipeline::DocumentAssembler;

#[derive(Clone)]
pub struct ExportHandler {
    assembler: Arc<DocumentAssembler>,
}

impl ExportHandler {
    pub fn new(assembler: DocumentAssembler) -> Self {
        Self {
            assembler: Arc::new(assembler),
        }
    }

    pub fn handle_message(&self, data: &[u8]) -> ExportResponse {
        let request: ExportRequest = match serde_json::from_slice(data) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let invalid = ExportError::InvalidRequest(format!("invalid request format: {}", e));
                return ExportResponse::error("unknown".to_string(), &invalid);
            }
        };

        let request_id = uuid::Uuid::new_v4().to_string();
        info!(
            request_id = %request_id,
            kind = ?request.document.kind(),
            "Processing export request"
        );

        match self.assembler.export(&request.document, &request.options) {
            Ok(document) => {
                let generated = encode(document);
                info!(
                    request_id = %request_id,
                    filename = %generated.filename,
                    size_bytes = generated.size_bytes,
                    "Export request completed"
                );
                ExportResponse::success(request_id, generated)
            }
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Export request failed");
                ExportResponse::error(request_id, &e)
            }
        }
    }

    /// Runs the export on the blocking pool so a long composition does not
    /// hold up the async workers serving other requests.
    pub async fn handle_message_async(&self, data: Vec<u8>) -> ExportResponse {
        let handler = self.clone();
        match tokio::task::spawn_blocking(move || handler.handle_message(&data)).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Export task did not complete");
                let failed = ExportError::AssemblyFailed(format!("export task failed: {}", e));
                ExportResponse::error("unknown".to_string(), &failed)
            }
        }
    }
}

fn encode(document: ExportedDocument) -> GeneratedDocument {
    let mut hasher = Sha256::new();
    hasher.update(&document.bytes);
    let sha256_checksum = hex::encode(hasher.finalize());
    GeneratedDocument {
        kind: document.kind,
        filename: document.filename,
        mime_type: document.mime_type.to_string(),
        content_base64: general_purpose::STANDARD.encode(&document.bytes),
        size_bytes: document.bytes.len(),
        sha256_checksum,
        page_count: document.page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::models::DocumentKind;

    fn handler() -> ExportHandler {
        ExportHandler::new(DocumentAssembler::new(ExportConfig::default()))
    }

    #[test]
    fn malformed_json_is_an_error_response() {
        let response = handler().handle_message(b"{ not json");
        assert!(!response.is_success());
        assert_eq!(response.request_id, "unknown");
        assert_eq!(response.error_type.as_deref(), Some("invalid_request"));
        assert!(response
            .error
            .unwrap()
            .starts_with("Invalid request: invalid request format"));
    }

    #[test]
    fn roster_request_returns_encoded_pdf() {
        let body = serde_json::json!({
            "document": {
                "kind": "class_roster",
                "data": {
                    "name": "Lớp Tiếng Anh A1",
                    "maxStudents": 10,
                    "tuition": 1500000,
                    "students": []
                }
            },
            "options": { "generatedOn": "2024-08-20" }
        });
        let response = handler().handle_message(body.to_string().as_bytes());
        assert!(response.is_success(), "{:?}", response.error);

        let document = response.document.unwrap();
        assert_eq!(document.kind, DocumentKind::ClassRoster);
        assert_eq!(document.filename, "thong-tin-lop-Lop-Tieng-Anh-A1-2024-08-20.pdf");
        let bytes = general_purpose::STANDARD
            .decode(&document.content_base64)
            .unwrap();
        assert_eq!(bytes.len(), document.size_bytes);
        assert_eq!(document.sha256_checksum, hex::encode(Sha256::digest(&bytes)));
        assert_eq!(document.sha256_checksum.len(), 64);
    }

    #[tokio::test]
    async fn async_handler_runs_on_blocking_pool() {
        let body = serde_json::json!({
            "document": {
                "kind": "payment_receipt",
                "data": { "studentName": "Nguyễn Văn An", "amount": 1500000, "isPaid": false }
            },
            "options": { "generatedOn": "2024-08-20" }
        });
        let response = handler()
            .handle_message_async(body.to_string().into_bytes())
            .await;
        let document = response.document.unwrap();
        assert_eq!(document.filename, "loi-nhac-thanh-toan-Nguyen-Van-An-2024-08-20.pdf");
        assert_eq!(document.page_count, 1);
    }
}
