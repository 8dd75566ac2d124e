use thiserror::Error;

/// The external-process step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Rasterize,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Rasterize => "rasterize",
        }
    }

    /// Wraps a message in this stage's failure variant.
    pub(crate) fn failed(self, message: String) -> RenderError {
        match self {
            Self::Compile => RenderError::CompileFailed(message),
            Self::Rasterize => RenderError::RasterizeFailed(message),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid diagram input: {0}")]
    InvalidInput(String),

    #[error("failed to prepare working directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("compile failed: {0}")]
    CompileFailed(String),

    #[error("rasterize failed: {0}")]
    RasterizeFailed(String),

    #[error("{stage} step timed out after {seconds} seconds")]
    Timeout { stage: Stage, seconds: u64 },

    #[error("failed to read render output: {0}")]
    Output(#[source] std::io::Error),

    #[error("remote render failed: {0}")]
    Remote(String),
}
