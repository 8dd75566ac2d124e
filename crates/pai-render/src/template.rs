//! Fixed document templates around caller-supplied diagram bodies.
//!
//! Callers only ever supply the inner drawing; the preamble and closing are
//! ours. Bodies that try to start their own document or pull in files are
//! rejected before any process is spawned.

use crate::error::RenderError;
use pai_types::DiagramKind;

/// Maximum diagram body size (64 KiB).
pub const MAX_DIAGRAM_INPUT_BYTES: usize = 64 * 1024;

const TIKZ_PREAMBLE: &str = "\\documentclass[preview,border=1pt]{standalone}
\\usepackage{circuitikz}
\\begin{document}
";

const TIKZ_CLOSING: &str = "\\end{document}
";

const MERMAID_INIT: &str = "%%{init: {\"theme\": \"neutral\"}}%%
";

/// Commands that would let a body escape the template or touch the file system.
const FORBIDDEN_TEX_COMMANDS: &[&str] = &[
    "\\documentclass",
    "\\begin{document}",
    "\\end{document}",
    "\\input",
    "\\include",
    "\\openin",
    "\\openout",
    "\\write18",
];

/// Wraps `body` in the document template for `kind`.
pub fn wrap(kind: DiagramKind, body: &str) -> Result<String, RenderError> {
    if body.trim().is_empty() {
        return Err(RenderError::InvalidInput(
            "diagram description is empty".to_string(),
        ));
    }
    if body.len() > MAX_DIAGRAM_INPUT_BYTES {
        return Err(RenderError::InvalidInput(format!(
            "diagram description exceeds maximum size: {} bytes (limit: {} bytes)",
            body.len(),
            MAX_DIAGRAM_INPUT_BYTES
        )));
    }

    match kind {
        DiagramKind::Tikz => wrap_tikz(body),
        DiagramKind::Mermaid => Ok(format!("{}{}\n", MERMAID_INIT, body.trim_end())),
    }
}

fn wrap_tikz(body: &str) -> Result<String, RenderError> {
    if let Some(command) = FORBIDDEN_TEX_COMMANDS
        .iter()
        .find(|c| contains_command(body, c))
    {
        return Err(RenderError::InvalidInput(format!(
            "diagram body may not contain {}",
            command
        )));
    }

    let body = body.trim();
    let has_environment =
        body.contains("\\begin{circuitikz}") || body.contains("\\begin{tikzpicture}");

    let mut document = String::with_capacity(TIKZ_PREAMBLE.len() + body.len() + 64);
    document.push_str(TIKZ_PREAMBLE);
    if has_environment {
        document.push_str(body);
        document.push('\n');
    } else {
        document.push_str("\\begin{circuitikz}\n");
        document.push_str(body);
        document.push_str("\n\\end{circuitikz}\n");
    }
    document.push_str(TIKZ_CLOSING);
    Ok(document)
}

/// Whether `body` uses `command` itself rather than a longer control word
/// sharing its prefix (`\input` but not `\inputlineno`).
fn contains_command(body: &str, command: &str) -> bool {
    body.match_indices(command).any(|(at, _)| {
        !command.ends_with(|c: char| c.is_ascii_alphabetic())
            || !body[at + command.len()..]
                .starts_with(|c: char| c.is_ascii_alphabetic())
    })
}
