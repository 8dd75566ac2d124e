//! Supply-chain search query and normalization of its response.
//!
//! Every level of the response is optional: catalogs omit sellers, offers
//! and prices freely. Normalization never panics on a missing level; absent
//! pricing becomes a zero unit cost and an absent offer an empty link.

use crate::error::PartsError;
use pai_types::PartQueryResult;
use serde::Deserialize;

/// Best match for a manufacturer part number, authorized sellers only.
pub const SEARCH_MPN: &str = r#"
query SearchMPN($que: String!) {
  supSearch(q: $que, start: 0, limit: 1) {
    results {
      part {
        mpn
        genericMpn
        manufacturer {
          name
        }
        shortDescription
        sellers(authorizedOnly: true) {
          company {
            name
          }
          offers {
            packaging
            factoryPackQuantity
            multipackQuantity
            inventoryLevel
            moq
            orderMultiple
            prices {
              quantity
              price
            }
            clickUrl
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub sup_search: Option<SupSearch>,
}

#[derive(Debug, Deserialize)]
pub struct SupSearch {
    pub results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub part: Option<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub mpn: Option<String>,
    pub manufacturer: Option<Company>,
    pub short_description: Option<String>,
    pub sellers: Option<Vec<Seller>>,
}

#[derive(Debug, Deserialize)]
pub struct Company {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Seller {
    pub company: Option<Company>,
    pub offers: Option<Vec<Offer>>,
}

impl Seller {
    fn name(&self) -> Option<&str> {
        self.company.as_ref().and_then(|c| c.name.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub inventory_level: Option<i64>,
    pub prices: Option<Vec<Price>>,
    pub click_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    pub quantity: Option<u64>,
    pub price: Option<f64>,
}

/// Picks the preferred seller when it is listed, otherwise the first one.
fn choose_seller<'a>(sellers: &'a [Seller], preferred: Option<&str>) -> Option<&'a Seller> {
    preferred
        .and_then(|want| {
            sellers.iter().find(|s| {
                s.name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(want))
            })
        })
        .or_else(|| sellers.first())
}

/// Turns the search response for `identifier` into a part record.
///
/// The record's `name` is the identifier the caller asked for, so batch
/// results line up with the request even when the catalog's part number is
/// spelled differently.
pub fn normalize(
    identifier: &str,
    data: SearchData,
    preferred_seller: Option<&str>,
) -> Result<PartQueryResult, PartsError> {
    let part = data
        .sup_search
        .and_then(|s| s.results)
        .and_then(|results| results.into_iter().find_map(|r| r.part))
        .ok_or_else(|| PartsError::NotFound(identifier.to_string()))?;

    let manufacturer = part
        .manufacturer
        .and_then(|m| m.name)
        .unwrap_or_default();
    let summary = part.short_description.unwrap_or_default();
    let description = match (manufacturer.is_empty(), summary.is_empty()) {
        (false, false) => format!("{} - {}", manufacturer, summary),
        (false, true) => manufacturer,
        (true, _) => summary,
    };

    let sellers = part.sellers.unwrap_or_default();
    let offer = choose_seller(&sellers, preferred_seller)
        .and_then(|s| s.offers.as_deref())
        .and_then(|offers| offers.first());

    let cost_per_unit = offer
        .and_then(|o| o.prices.as_deref())
        .and_then(|prices| prices.first())
        .and_then(|p| p.price)
        .unwrap_or(0.0);
    let link = offer
        .and_then(|o| o.click_url.clone())
        .unwrap_or_default();

    Ok(PartQueryResult {
        name: identifier.to_string(),
        quantity: 1,
        description,
        cost_per_unit,
        link,
    })
}
