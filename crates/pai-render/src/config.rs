use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

fn default_latex_binary() -> PathBuf {
    PathBuf::from("pdflatex")
}

fn default_rasterizer_binary() -> PathBuf {
    PathBuf::from("convert")
}

fn default_mermaid_binary() -> PathBuf {
    PathBuf::from("mmdc")
}

fn default_density() -> u32 {
    300
}

fn default_timeout_seconds() -> u64 {
    60
}

/// Toolchain settings for the local render pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// LaTeX compiler used for CircuiTikZ diagrams.
    #[serde(default = "default_latex_binary")]
    pub latex_binary: PathBuf,
    /// PDF-to-PNG rasterizer (ImageMagick `convert` command line).
    #[serde(default = "default_rasterizer_binary")]
    pub rasterizer_binary: PathBuf,
    /// Mermaid CLI used for block diagrams.
    #[serde(default = "default_mermaid_binary")]
    pub mermaid_binary: PathBuf,
    /// Rasterisation density in DPI. Fixed so output size is deterministic.
    #[serde(default = "default_density")]
    pub density: u32,
    /// Per-stage process timeout in seconds. Default: 60.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Parent directory for per-render working directories. Defaults to the
    /// system temp directory.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            latex_binary: default_latex_binary(),
            rasterizer_binary: default_rasterizer_binary(),
            mermaid_binary: default_mermaid_binary(),
            density: default_density(),
            timeout_seconds: default_timeout_seconds(),
            work_dir: None,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
