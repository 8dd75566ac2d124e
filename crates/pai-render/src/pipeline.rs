//! Local render pipeline: template → compiler → rasterizer.

use crate::config::RenderConfig;
use crate::error::{RenderError, Stage};
use crate::template;
use crate::{DiagramRenderer, RenderedDiagram};
use pai_types::DiagramKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use uuid::Uuid;

/// Prefix for per-render working directories.
const WORK_DIR_PREFIX: &str = "diagram-";

/// Number of trailing log lines kept in failure messages.
const LOG_TAIL_LINES: usize = 12;

const TEX_FILE: &str = "diagram.tex";
const MERMAID_FILE: &str = "diagram.mmd";
const PDF_FILE: &str = "diagram.pdf";
const PNG_FILE: &str = "diagram.png";

/// Runs the external typesetting toolchain.
///
/// Holds no mutable state; concurrent renders each get an independently
/// named working directory.
#[derive(Debug, Clone, Default)]
pub struct RenderPipeline {
    config: RenderConfig,
}

impl RenderPipeline {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Creates a fresh working directory, removed when the guard drops.
    fn workspace(&self) -> Result<TempDir, RenderError> {
        let root = self
            .config
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&root).map_err(RenderError::Workspace)?;
        tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(&root)
            .map_err(RenderError::Workspace)
    }

    async fn compile(
        &self,
        kind: DiagramKind,
        dir: &Path,
        document: &str,
    ) -> Result<PathBuf, RenderError> {
        let mut command = match kind {
            DiagramKind::Tikz => {
                write_source(dir, TEX_FILE, document).await?;
                let mut command = Command::new(&self.config.latex_binary);
                command
                    .arg("-interaction=nonstopmode")
                    .arg("-halt-on-error")
                    .arg("-no-shell-escape")
                    .arg("-output-directory")
                    .arg(dir)
                    .arg(TEX_FILE);
                command
            }
            DiagramKind::Mermaid => {
                write_source(dir, MERMAID_FILE, document).await?;
                let mut command = Command::new(&self.config.mermaid_binary);
                command
                    .arg("-i")
                    .arg(MERMAID_FILE)
                    .arg("-o")
                    .arg(PDF_FILE)
                    .arg("--pdfFit");
                command
            }
        };
        command.current_dir(dir);

        let program = match kind {
            DiagramKind::Tikz => &self.config.latex_binary,
            DiagramKind::Mermaid => &self.config.mermaid_binary,
        };
        self.run_stage(Stage::Compile, program, command).await?;
        expect_output(Stage::Compile, dir.join(PDF_FILE)).await
    }

    async fn rasterize(&self, dir: &Path, pdf: &Path) -> Result<PathBuf, RenderError> {
        let mut command = Command::new(&self.config.rasterizer_binary);
        command
            .arg("-density")
            .arg(self.config.density.to_string())
            .arg(pdf)
            .arg(PNG_FILE)
            .current_dir(dir);

        self.run_stage(Stage::Rasterize, &self.config.rasterizer_binary, command)
            .await?;
        expect_output(Stage::Rasterize, dir.join(PNG_FILE)).await
    }

    /// Runs one external step to completion under the configured timeout.
    /// The child is killed if the timeout fires.
    async fn run_stage(
        &self,
        stage: Stage,
        program: &Path,
        mut command: Command,
    ) -> Result<(), RenderError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| stage.failed(format!("failed to spawn {:?}: {}", program, e)))?;

        let output = tokio::time::timeout(self.config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout {
                stage,
                seconds: self.config.timeout_seconds,
            })?
            .map_err(|e| stage.failed(format!("failed to wait for {:?}: {}", program, e)))?;

        if !output.status.success() {
            let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
            log.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(stage.failed(format!(
                "{:?} exited with {}: {}",
                program,
                output.status,
                tail(&log, LOG_TAIL_LINES)
            )));
        }

        Ok(())
    }
}

impl DiagramRenderer for RenderPipeline {
    async fn render(
        &self,
        kind: DiagramKind,
        description: &str,
    ) -> Result<RenderedDiagram, RenderError> {
        let document = template::wrap(kind, description)?;
        let render_id = Uuid::new_v4();
        let workspace = self.workspace()?;
        let dir = workspace.path();

        tracing::debug!(%render_id, %kind, dir = %dir.display(), "starting diagram render");

        let result: Result<RenderedDiagram, RenderError> = async {
            let pdf_path = self.compile(kind, dir, &document).await?;
            let png_path = self.rasterize(dir, &pdf_path).await?;
            let image = tokio::fs::read(&png_path)
                .await
                .map_err(RenderError::Output)?;
            let pdf = tokio::fs::read(&pdf_path)
                .await
                .map_err(RenderError::Output)?;
            Ok(RenderedDiagram {
                image,
                pdf: Some(pdf),
            })
        }
        .await;

        if let Err(e) = workspace.close() {
            tracing::warn!(%render_id, "failed to remove render working directory: {}", e);
        }

        match &result {
            Ok(rendered) => tracing::info!(
                %render_id,
                %kind,
                image_bytes = rendered.image.len(),
                "diagram rendered"
            ),
            Err(e) => tracing::warn!(%render_id, %kind, "diagram render failed: {}", e),
        }

        result
    }
}

async fn write_source(dir: &Path, name: &str, contents: &str) -> Result<(), RenderError> {
    tokio::fs::write(dir.join(name), contents)
        .await
        .map_err(RenderError::Workspace)
}

/// Succeeds with `path` if the step actually produced it.
async fn expect_output(stage: Stage, path: PathBuf) -> Result<PathBuf, RenderError> {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(path),
        _ => Err(stage.failed(format!("expected output {:?} was not produced", path))),
    }
}

fn tail(log: &str, lines: usize) -> String {
    let collected: Vec<&str> = log.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = collected.len().saturating_sub(lines);
    collected[start..].join("\n")
}
