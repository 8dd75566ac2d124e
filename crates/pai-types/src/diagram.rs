//! Diagram markup kinds understood by the render pipeline.

use serde::{Deserialize, Serialize};

/// The markup language a diagram description is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    /// CircuiTikZ / TikZ drawing commands, typeset with LaTeX.
    #[default]
    Tikz,
    /// Mermaid flowchart source, used for functional block diagrams.
    Mermaid,
}

impl DiagramKind {
    /// Returns the canonical lowercase label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tikz => "tikz",
            Self::Mermaid => "mermaid",
        }
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiagramKind {
    type Err = ParseDiagramKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tikz" => Ok(Self::Tikz),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(ParseDiagramKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown diagram kind string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown diagram kind: {0}")]
pub struct ParseDiagramKindError(pub String);
