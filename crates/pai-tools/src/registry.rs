//! The fixed set of tools advertised to the realtime model.

use crate::schema::{ObjectSchema, Schema};
use pai_types::DiagramKind;
use serde::Serialize;

pub const DISPLAY_QUESTIONS: &str = "display_questions_on_screen";
pub const SHOW_CIRCUIT_DIAGRAM: &str = "show_circuit_diagram";
pub const SHOW_FUNCTIONAL_DIAGRAM: &str = "show_functional_diagram";
pub const SHOW_BOM_LIST: &str = "show_bom_list";
pub const SEARCH_PARTS: &str = "search_parts";
pub const DISPLAY_NOTES: &str = "display_notes";

/// Instruction sent as a `response.create` shortly after clarifying
/// questions are put on screen.
const QUESTIONS_FOLLOW_UP: &str = "The clarifying questions are now on screen. \
Ask the user the first one out loud and wait for the answer before moving on.";

const INSTRUCTIONS: &str = "\
You are Pai, an assistant for planning hardware projects. Keep a serious, \
professional tone and answer in one or two sentences before asking the user \
for more information.

A conversation usually goes like this:
1. The user describes the project.
2. Call display_questions_on_screen with a few short clarifying questions, \
then ask them out loud.
3. Draw a block diagram of the whole project with show_functional_diagram \
and refine it with the user.
4. For each functional block, draw the circuit with show_circuit_diagram. \
Only send the drawing commands; the document around them is provided.
5. When the circuits are settled, list the parts with show_bom_list. Use \
search_parts to check availability and pricing of specific part numbers.

Use display_notes for anything else that is easier to read than to hear.";

/// The kind of presentation a tool produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Questions,
    CircuitDiagram,
    FunctionalDiagram,
    BillOfMaterials,
    PartsSearch,
    Notes,
}

impl ToolKind {
    /// The markup kind rendered for diagram tools, `None` for everything else.
    pub fn diagram_kind(self) -> Option<DiagramKind> {
        match self {
            Self::CircuitDiagram => Some(DiagramKind::Tikz),
            Self::FunctionalDiagram => Some(DiagramKind::Mermaid),
            _ => None,
        }
    }

    /// Whether a call of this kind names parts that should be looked up.
    pub fn requests_lookup(self) -> bool {
        matches!(self, Self::BillOfMaterials | Self::PartsSearch)
    }
}

/// One function the model may call.
///
/// Serialises to the realtime `tools[]` entry; `kind` and `follow_up` are
/// local metadata and never leave the process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Schema,
    #[serde(skip)]
    pub kind: ToolKind,
    /// Scripted instruction to send after the call is presented, if any.
    #[serde(skip)]
    pub follow_up: Option<&'static str>,
}

impl ToolDeclaration {
    fn function(
        name: &'static str,
        kind: ToolKind,
        description: &'static str,
        parameters: ObjectSchema,
    ) -> Self {
        Self {
            tool_type: "function",
            name,
            description,
            parameters: parameters.into(),
            kind,
            follow_up: None,
        }
    }

    fn with_follow_up(mut self, instructions: &'static str) -> Self {
        self.follow_up = Some(instructions);
        self
    }
}

/// The `session` body of a `session.update` client event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub tools: Vec<ToolDeclaration>,
    pub tool_choice: &'static str,
    pub instructions: String,
}

/// The immutable tool registry, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDeclaration>,
    instructions: String,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// Builds a registry from explicit declarations.
    pub fn new(tools: Vec<ToolDeclaration>, instructions: impl Into<String>) -> Self {
        Self {
            tools,
            instructions: instructions.into(),
        }
    }

    /// The hardware-planning tool set.
    pub fn standard() -> Self {
        let tools = vec![
            ToolDeclaration::function(
                DISPLAY_QUESTIONS,
                ToolKind::Questions,
                "Call this before asking the user clarifying questions so they are shown \
                 on screen as a visual aid. Still ask the questions out loud afterwards.",
                ObjectSchema::new().required(
                    "questions",
                    Schema::array(
                        Schema::string("Summary of the question, just a few words"),
                        "List of questions to ask",
                    ),
                ),
            )
            .with_follow_up(QUESTIONS_FOLLOW_UP),
            ToolDeclaration::function(
                SHOW_CIRCUIT_DIAGRAM,
                ToolKind::CircuitDiagram,
                "Display a circuit diagram written in CircuiTikZ notation.",
                ObjectSchema::new().required(
                    "tikz",
                    Schema::string(
                        "CircuiTikZ drawing commands only, without a document preamble",
                    ),
                ),
            ),
            ToolDeclaration::function(
                SHOW_FUNCTIONAL_DIAGRAM,
                ToolKind::FunctionalDiagram,
                "Display a functional block diagram written in Mermaid notation.",
                ObjectSchema::new().required(
                    "mermaid",
                    Schema::string("Mermaid flowchart source for the block diagram"),
                ),
            ),
            ToolDeclaration::function(
                SHOW_BOM_LIST,
                ToolKind::BillOfMaterials,
                "Display a bill of materials for the project.",
                ObjectSchema::new().required(
                    "parts",
                    Schema::array(
                        ObjectSchema::new()
                            .required("name", Schema::string("Name or part number"))
                            .required("quantity", Schema::number("Quantity needed"))
                            .required("description", Schema::string("Description of the part"))
                            .into(),
                        "List of parts in the BOM",
                    ),
                ),
            ),
            ToolDeclaration::function(
                SEARCH_PARTS,
                ToolKind::PartsSearch,
                "Look up availability and pricing for specific manufacturer part numbers.",
                ObjectSchema::new().required(
                    "parts",
                    Schema::array(
                        Schema::string("Manufacturer part number"),
                        "Part numbers to look up",
                    ),
                ),
            ),
            ToolDeclaration::function(
                DISPLAY_NOTES,
                ToolKind::Notes,
                "Display free-form notes on screen, such as a summary or a checklist.",
                ObjectSchema::new()
                    .required("body", Schema::string("The text to display"))
                    .optional("title", Schema::string("Optional heading")),
            ),
        ];

        Self::new(tools, INSTRUCTIONS)
    }

    /// Looks up a declaration by tool name.
    pub fn get(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(|tool| tool.name)
    }

    pub fn tools(&self) -> &[ToolDeclaration] {
        &self.tools
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Builds the session configuration transmitted in `session.update`.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tools: self.tools.clone(),
            tool_choice: "auto",
            instructions: self.instructions.clone(),
        }
    }
}
