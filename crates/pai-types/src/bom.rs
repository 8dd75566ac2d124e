//! Bill-of-materials rows as authored by the model.

use serde::{Deserialize, Serialize};

/// A single bill-of-materials line.
///
/// `cost` is not required at call time; it is filled in from a parts lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomPart {
    /// Name or manufacturer part number.
    pub name: String,
    /// Quantity needed.
    pub quantity: f64,
    /// What the part is for.
    #[serde(default)]
    pub description: String,
    /// Unit cost, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}
