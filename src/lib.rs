// academy-export/src/lib.rs

//! Printable PDF exports for academy administration: student lists, class
//! rosters, payment receipts and payment ledgers, with Vietnamese text,
//! paginated tables and per-page footers.

pub mod assets;
pub mod compose;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fonts;
pub mod generators;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod service;
pub mod surface;
pub mod text;

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use models::{
    ClassRecord, ClassStudentRow, DocumentKind, ExportPayload, ExportRequest, ExportResponse,
    ExportedDocument, Orientation, PaymentRecord, ReceiptFraming, RenderOptions, StudentRecord,
};
pub use pipeline::{Composition, DocumentAssembler, Stage};
pub use service::ExportHandler;
