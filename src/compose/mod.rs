// academy-export/src/compose/mod.rs

//! Page-level composition: cover pages, paginated tables and footers.

mod cover;
mod footer;
mod table;

pub use cover::{CoverContent, PageComposer};
pub use footer::{FooterComposer, PageFlow, BANNER_KEY};
pub use table::{
    plan_pages, Column, Margins, PageSlice, TableLayoutEngine, TableOptions, TABLE_FALLBACK_TEXT,
};
