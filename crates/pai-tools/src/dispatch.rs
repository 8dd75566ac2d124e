//! Maps the current tool output to what the UI should show.

use crate::call::FunctionCall;
use crate::registry::{
    DISPLAY_NOTES, DISPLAY_QUESTIONS, SEARCH_PARTS, SHOW_BOM_LIST, SHOW_CIRCUIT_DIAGRAM,
    SHOW_FUNCTIONAL_DIAGRAM,
};
use pai_types::BomPart;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A presentation of the most recent tool output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Presentation {
    /// No tool output yet in this session.
    #[default]
    Idle,
    Questions {
        questions: Vec<String>,
    },
    CircuitDiagram {
        tikz: String,
    },
    FunctionalDiagram {
        mermaid: String,
    },
    BillOfMaterials {
        parts: Vec<BomPart>,
    },
    PartsSearch {
        parts: Vec<String>,
    },
    Notes {
        title: Option<String>,
        body: String,
    },
    /// Passthrough for calls that could not be presented: unknown tool names
    /// or arguments that do not match the declared shape.
    Diagnostic {
        name: String,
        reason: String,
        raw: Value,
    },
}

impl Presentation {
    /// The diagram source for diagram presentations.
    pub fn diagram_source(&self) -> Option<&str> {
        match self {
            Self::CircuitDiagram { tikz } => Some(tikz),
            Self::FunctionalDiagram { mermaid } => Some(mermaid),
            _ => None,
        }
    }

    /// Part identifiers named by this presentation, in order.
    pub fn part_identifiers(&self) -> Vec<String> {
        match self {
            Self::BillOfMaterials { parts } => parts.iter().map(|p| p.name.clone()).collect(),
            Self::PartsSearch { parts } => parts.clone(),
            _ => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct QuestionsArgs {
    questions: Vec<String>,
}

#[derive(Deserialize)]
struct CircuitArgs {
    tikz: String,
}

#[derive(Deserialize)]
struct FunctionalArgs {
    mermaid: String,
}

#[derive(Deserialize)]
struct BomArgs {
    parts: Vec<BomPart>,
}

#[derive(Deserialize)]
struct SearchArgs {
    parts: Vec<String>,
}

#[derive(Deserialize)]
struct NotesArgs {
    #[serde(default)]
    title: Option<String>,
    body: String,
}

/// Presents the current tool output, or [`Presentation::Idle`] when there
/// is none.
pub fn present_state(current: Option<&FunctionCall>) -> Presentation {
    current.map_or(Presentation::Idle, present)
}

/// Presents a single function call.
///
/// Never fails: anything that cannot be shown as its tool's view becomes a
/// [`Presentation::Diagnostic`] carrying the raw payload.
pub fn present(call: &FunctionCall) -> Presentation {
    let result = match call.name.as_str() {
        DISPLAY_QUESTIONS => {
            parse::<QuestionsArgs>(call).map(|a| Presentation::Questions {
                questions: a.questions,
            })
        }
        SHOW_CIRCUIT_DIAGRAM => {
            parse::<CircuitArgs>(call).map(|a| Presentation::CircuitDiagram { tikz: a.tikz })
        }
        SHOW_FUNCTIONAL_DIAGRAM => parse::<FunctionalArgs>(call).map(|a| {
            Presentation::FunctionalDiagram { mermaid: a.mermaid }
        }),
        SHOW_BOM_LIST => {
            parse::<BomArgs>(call).map(|a| Presentation::BillOfMaterials { parts: a.parts })
        }
        SEARCH_PARTS => {
            parse::<SearchArgs>(call).map(|a| Presentation::PartsSearch { parts: a.parts })
        }
        DISPLAY_NOTES => parse::<NotesArgs>(call).map(|a| Presentation::Notes {
            title: a.title,
            body: a.body,
        }),
        other => Err(format!("Unknown function call: {}", other)),
    };

    result.unwrap_or_else(|reason| {
        tracing::debug!(tool = %call.name, %reason, "presenting diagnostic passthrough");
        Presentation::Diagnostic {
            name: call.name.clone(),
            reason,
            raw: call.arguments.raw(),
        }
    })
}

fn parse<T: DeserializeOwned>(call: &FunctionCall) -> Result<T, String> {
    call.arguments
        .parse::<T>()
        .map_err(|e| format!("Invalid arguments for {}: {}", call.name, e))
}
