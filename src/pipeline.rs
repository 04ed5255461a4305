// academy-export/src/pipeline.rs

use std::fmt;

use anyhow::Context;
use tracing::{debug, error, info, instrument};

use crate::compose::{FooterComposer, PageComposer, PageFlow, TableLayoutEngine, TableOptions};
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::fonts::FontRegistry;
use crate::generators::{
    create_generator, ClassRosterGenerator, DocumentPlan, Generator, Intro,
    PaymentLedgerGenerator, PaymentReceiptGenerator, PlanContext, StudentListGenerator,
};
use crate::models::{
    ClassRecord, DocumentKind, ExportPayload, ExportedDocument, PaymentRecord, RenderOptions,
    StudentRecord,
};
use crate::surface::{PdfSurface, Surface};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Lifecycle of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    ContextReady,
    CoverDrawn,
    TableLaidOut,
    Finalized,
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Created => "created",
            Stage::ContextReady => "context_ready",
            Stage::CoverDrawn => "cover_drawn",
            Stage::TableLaidOut => "table_laid_out",
            Stage::Finalized => "finalized",
        }
    }

    /// Whether a document of `kind` may move from `self` to `next`. Only
    /// kinds without a cover page skip `CoverDrawn`.
    pub fn can_advance(&self, next: Stage, kind: DocumentKind) -> bool {
        match (self, next) {
            (Stage::Created, Stage::ContextReady) => true,
            (Stage::ContextReady, Stage::CoverDrawn) => kind.has_cover(),
            (Stage::ContextReady, Stage::TableLaidOut) => !kind.has_cover(),
            (Stage::CoverDrawn, Stage::TableLaidOut) => true,
            (Stage::TableLaidOut, Stage::Finalized) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct StageTracker {
    kind: DocumentKind,
    current: Stage,
}

impl StageTracker {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            current: Stage::Created,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn advance(&mut self, next: Stage) -> Result<()> {
        if !self.current.can_advance(next, self.kind) {
            return Err(ExportError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        debug!(kind = ?self.kind, from = %self.current, to = %next, "Stage advanced");
        self.current = next;
        Ok(())
    }
}

/// What composing a plan produced, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub pages: usize,
    /// Pages the table occupies, counting the page it starts on.
    pub table_pages: usize,
    pub banner_drawn: bool,
    pub stage: Stage,
}

/// Turns records into finished PDF documents, one fresh context per call.
pub struct DocumentAssembler {
    config: ExportConfig,
    fonts: FontRegistry,
    composer: PageComposer,
    footer: FooterComposer,
    table: TableLayoutEngine,
}

impl DocumentAssembler {
    pub fn new(config: ExportConfig) -> Self {
        let fonts = FontRegistry::from_assets(&config.assets);
        let composer = PageComposer::new(&config.layout);
        let footer = FooterComposer::new(&config.branding, &config.assets, &config.layout);
        Self {
            config,
            fonts,
            composer,
            footer,
            table: TableLayoutEngine::default(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn student_list(
        &self,
        students: &[StudentRecord],
        options: &RenderOptions,
    ) -> Result<ExportedDocument> {
        self.assemble(&StudentListGenerator::new(students), options)
    }

    pub fn class_roster(
        &self,
        class: &ClassRecord,
        options: &RenderOptions,
    ) -> Result<ExportedDocument> {
        self.assemble(&ClassRosterGenerator::new(class), options)
    }

    pub fn payment_receipt(
        &self,
        payment: &PaymentRecord,
        options: &RenderOptions,
    ) -> Result<ExportedDocument> {
        self.assemble(&PaymentReceiptGenerator::new(payment), options)
    }

    pub fn payment_ledger(
        &self,
        payments: &[PaymentRecord],
        options: &RenderOptions,
    ) -> Result<ExportedDocument> {
        self.assemble(&PaymentLedgerGenerator::new(payments), options)
    }

    pub fn export(
        &self,
        payload: &ExportPayload,
        options: &RenderOptions,
    ) -> Result<ExportedDocument> {
        let generator = create_generator(payload);
        self.assemble(generator.as_ref(), options)
    }

    /// The only place a document fails as a whole: any error is logged and
    /// reported as a single `AssemblyFailed`, and no bytes are returned.
    #[instrument(skip(self, generator, options), fields(kind = ?generator.kind()))]
    pub fn assemble(
        &self,
        generator: &dyn Generator,
        options: &RenderOptions,
    ) -> Result<ExportedDocument> {
        match self.try_assemble(generator, options) {
            Ok(document) => {
                info!(
                    filename = %document.filename,
                    pages = document.page_count,
                    size_bytes = document.bytes.len(),
                    "Document exported"
                );
                Ok(document)
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!(error = %message, "Export failed");
                Err(ExportError::AssemblyFailed(message))
            }
        }
    }

    fn try_assemble(
        &self,
        generator: &dyn Generator,
        options: &RenderOptions,
    ) -> anyhow::Result<ExportedDocument> {
        let plan = self
            .plan(generator, options)
            .context("Failed to plan document")?;

        let mut ctx = PdfSurface::new(
            plan.orientation.page_size(),
            &plan.title,
            &self.config.branding.producer,
        );
        let composition = self
            .compose(&mut ctx, &plan)
            .with_context(|| format!("Failed to compose {}", plan.filename))?;
        let bytes = ctx.finish().context("Failed to serialize PDF")?;

        Ok(ExportedDocument {
            kind: plan.kind,
            filename: plan.filename,
            bytes,
            page_count: composition.pages,
            mime_type: PDF_MIME_TYPE,
        })
    }

    /// Resolves orientation and date, then lets the generator build the plan.
    pub fn plan(&self, generator: &dyn Generator, options: &RenderOptions) -> Result<DocumentPlan> {
        let orientation = options
            .orientation
            .unwrap_or_else(|| generator.kind().default_orientation());
        let ctx = PlanContext {
            branding: &self.config.branding,
            orientation,
            printable_width: self
                .config
                .layout
                .printable_width(orientation.page_size().width),
            date: options.date(),
        };
        generator.plan(&ctx, options)
    }

    /// Runs the document template against any surface: first page and
    /// fonts, cover (or heading), table, last-page footer with banner.
    pub fn compose<S: Surface>(&self, ctx: &mut S, plan: &DocumentPlan) -> Result<Composition> {
        let mut stage = StageTracker::new(plan.kind);
        let flow = PageFlow::new(&self.fonts, &self.footer);
        let options = TableOptions::from_layout(&self.config.layout);

        flow.start_page(ctx)?;
        stage.advance(Stage::ContextReady)?;

        let start_y = match &plan.intro {
            Intro::Cover(content) => {
                self.composer.draw_cover(ctx, &self.fonts, content)?;
                stage.advance(Stage::CoverDrawn)?;
                flow.break_page(ctx)?;
                options.margins.top
            }
            Intro::Heading(content) => self.composer.draw_heading(ctx, &self.fonts, content)?,
        };

        let table_pages = self.table.layout_table(
            ctx,
            &flow,
            &plan.columns,
            &plan.rows,
            start_y,
            &options,
        );
        stage.advance(Stage::TableLaidOut)?;

        let banner_drawn = flow.close(ctx);
        stage.advance(Stage::Finalized)?;

        Ok(Composition {
            pages: ctx.page_count(),
            table_pages,
            banner_drawn,
            stage: stage.current(),
        })
    }
}
