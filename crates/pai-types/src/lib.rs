//! Shared types for the Pai hardware-planning assistant.
//!
//! This crate holds the plain data records exchanged between the session
//! core, the render pipeline, the parts lookup client and the HTTP backend:
//! diagram kinds, bill-of-materials rows and normalised catalog results.
//!
//! It has no behaviour beyond (de)serialisation and small constructors, so
//! every other crate in the workspace can depend on it without pulling in
//! runtime or network dependencies.

pub mod bom;
pub mod diagram;
pub mod parts;

pub use bom::BomPart;
pub use diagram::{DiagramKind, ParseDiagramKindError};
pub use parts::{PartQueryResult, PART_NOT_FOUND_DESCRIPTION};
