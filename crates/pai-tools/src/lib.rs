//! Tool declarations and tool-output presentation for the Pai assistant.
//!
//! The realtime model is told which functions it may call through a single
//! `session.update` payload built from the [`ToolRegistry`]. When the model
//! calls one of them, [`present`] turns the [`FunctionCall`] into a
//! [`Presentation`], one variant per tool kind plus a diagnostic fallback
//! that shows the raw payload for anything unrecognised.
//!
//! # Registered tools
//!
//! | Name | Kind | Arguments |
//! |------|------|-----------|
//! | `display_questions_on_screen` | questions | `questions: [string]` |
//! | `show_circuit_diagram` | circuit diagram | `tikz: string` |
//! | `show_functional_diagram` | block diagram | `mermaid: string` |
//! | `show_bom_list` | bill of materials | `parts: [{name, quantity, description}]` |
//! | `search_parts` | parts lookup | `parts: [string]` |
//! | `display_notes` | free-form display | `body: string`, `title?: string` |

pub mod call;
pub mod dispatch;
pub mod registry;
pub mod schema;

pub use call::{Arguments, FunctionCall};
pub use dispatch::{present, present_state, Presentation};
pub use registry::{SessionConfig, ToolDeclaration, ToolKind, ToolRegistry};
pub use schema::{ObjectSchema, Schema};
