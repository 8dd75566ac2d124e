//! Parts catalog lookups for bill-of-materials pricing.
//!
//! [`lookup`] resolves an ordered batch of part identifiers against a
//! [`PartCatalog`] and always returns one [`PartQueryResult`] per identifier,
//! in request order. An identifier whose lookup fails for any reason becomes
//! a "Part not found" placeholder; the rest of the batch is unaffected.
//!
//! [`CatalogClient`] is the production catalog: a GraphQL supply-chain search
//! authenticated with a client-credentials token that is cached per process
//! and refreshed shortly before it expires.

pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod query;
pub mod token;

pub use client::{CatalogClient, PartCatalog};
pub use config::PartsConfig;
pub use error::PartsError;
pub use lookup::lookup;
pub use pai_types::PartQueryResult;
pub use token::TokenCache;
