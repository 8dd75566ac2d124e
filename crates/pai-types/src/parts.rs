//! Normalised parts catalog records.

use serde::{Deserialize, Serialize};

/// Description used for identifiers the catalog could not resolve.
pub const PART_NOT_FOUND_DESCRIPTION: &str = "Part not found";

/// One flattened catalog answer for a single part identifier.
///
/// Successful lookups carry the manufacturer and short description, the unit
/// price of the first price break and the purchase link of the chosen offer.
/// Failed lookups are represented by [`PartQueryResult::not_found`] so that a
/// batch always has one record per requested identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartQueryResult {
    /// The part identifier that was looked up.
    pub name: String,
    /// Always 1 for catalog answers; the BOM carries the real quantity.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// `"<manufacturer> - <short description>"`.
    pub description: String,
    /// Unit price of the first price break, 0 when unknown.
    #[serde(alias = "cost", default)]
    pub cost_per_unit: f64,
    /// Purchase link of the chosen offer, empty when unknown.
    #[serde(default)]
    pub link: String,
}

fn default_quantity() -> u32 {
    1
}

impl PartQueryResult {
    /// Placeholder record for an identifier whose lookup failed.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            description: PART_NOT_FOUND_DESCRIPTION.to_string(),
            cost_per_unit: 0.0,
            link: String::new(),
        }
    }

    /// Returns `true` if this record is a lookup-failure placeholder.
    pub fn is_not_found(&self) -> bool {
        self.description == PART_NOT_FOUND_DESCRIPTION && self.link.is_empty()
    }
}
