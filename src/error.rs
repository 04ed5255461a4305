// academy-export/src/error.rs

use crate::pipeline::Stage;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("No font selected on page {0}")]
    FontNotSelected(usize),

    #[error("Drawing error: {0}")]
    DrawError(String),

    #[error("Layout failure: {0}")]
    LayoutFailure(String),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),
}

impl ExportError {
    /// Errors that a component recovers from locally (font fallback, banner
    /// omission, fallback table line). Anything else fails the document.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExportError::AssetUnavailable(_)
                | ExportError::FontError(_)
                | ExportError::ImageError(_)
                | ExportError::FontNotSelected(_)
                | ExportError::LayoutFailure(_)
        )
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            error_type: match self {
                ExportError::AssetUnavailable(_) => "asset_unavailable",
                ExportError::FontError(_) => "font_error",
                ExportError::ImageError(_) => "image_error",
                ExportError::FontNotSelected(_) => "font_not_selected",
                ExportError::DrawError(_) => "draw_error",
                ExportError::LayoutFailure(_) => "layout_failure",
                ExportError::InvalidTransition { .. } => "invalid_transition",
                ExportError::IoError(_) => "io_error",
                ExportError::SerializationError(_) => "serialization_error",
                ExportError::InvalidRequest(_) => "invalid_request",
                ExportError::AssemblyFailed(_) => "assembly_failed",
            }
            .to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_failures_are_recoverable() {
        assert!(ExportError::AssetUnavailable("banner.png".into()).is_recoverable());
        assert!(ExportError::LayoutFailure("no columns".into()).is_recoverable());
        assert!(!ExportError::AssemblyFailed("boom".into()).is_recoverable());
        assert!(!ExportError::DrawError("no page".into()).is_recoverable());
    }

    #[test]
    fn error_response_carries_type_tag() {
        let response = ExportError::InvalidTransition {
            from: Stage::Created,
            to: Stage::Finalized,
        }
        .to_error_response();
        assert_eq!(response.error_type, "invalid_transition");
        assert_eq!(response.error, "Invalid stage transition: created -> finalized");
    }
}
