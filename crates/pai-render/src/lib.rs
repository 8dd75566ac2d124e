//! Diagram rendering for the Pai assistant.
//!
//! Turns a model-authored diagram body into a raster image by driving an
//! external typesetting toolchain: the body is wrapped in a fixed document
//! template, compiled to PDF (`pdflatex` for CircuiTikZ, `mmdc` for Mermaid)
//! and rasterised at a fixed density (`convert`). Every render runs in its
//! own temporary directory, removed on every exit path.
//!
//! Two implementations share the [`DiagramRenderer`] trait:
//! [`RenderPipeline`] runs the toolchain locally, [`RemoteRenderer`] calls a
//! backend's `POST /render` endpoint.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod template;

use std::future::Future;

pub use config::RenderConfig;
pub use error::{RenderError, Stage};
pub use pai_types::DiagramKind;
pub use pipeline::RenderPipeline;
pub use remote::{RemoteRenderer, RenderRequest, RenderResponse};

/// The artifacts of a successful render.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// PNG image bytes.
    pub image: Vec<u8>,
    /// The compiled PDF, when the renderer kept it.
    pub pdf: Option<Vec<u8>>,
}

impl std::fmt::Debug for RenderedDiagram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedDiagram")
            .field("image_bytes", &self.image.len())
            .field("pdf_bytes", &self.pdf.as_ref().map(Vec::len))
            .finish()
    }
}

/// Something that can turn a diagram description into an image.
pub trait DiagramRenderer: Send + Sync + 'static {
    fn render(
        &self,
        kind: DiagramKind,
        description: &str,
    ) -> impl Future<Output = Result<RenderedDiagram, RenderError>> + Send;
}
