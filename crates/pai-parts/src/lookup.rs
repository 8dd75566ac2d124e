use crate::client::PartCatalog;
use futures_util::future::join_all;
use pai_types::PartQueryResult;

/// Resolves each identifier against the catalog.
///
/// Searches run concurrently. Returns exactly one record per identifier, in
/// request order. Failed lookups become [`PartQueryResult::not_found`]
/// placeholders and never abort the batch.
pub async fn lookup<C: PartCatalog>(catalog: &C, identifiers: &[String]) -> Vec<PartQueryResult> {
    join_all(identifiers.iter().map(|id| resolve(catalog, id))).await
}

async fn resolve<C: PartCatalog>(catalog: &C, identifier: &str) -> PartQueryResult {
    match catalog.search(identifier).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(part = %identifier, "part lookup failed: {}", e);
            PartQueryResult::not_found(identifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PartsError;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedCatalog {
        parts: HashMap<&'static str, f64>,
    }

    impl PartCatalog for FixedCatalog {
        async fn search(&self, identifier: &str) -> Result<PartQueryResult, PartsError> {
            // Later identifiers answer first to check ordering.
            let delay = 20u64.saturating_sub(identifier.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let cost = self
                .parts
                .get(identifier)
                .ok_or_else(|| PartsError::NotFound(identifier.to_string()))?;
            Ok(PartQueryResult {
                name: identifier.to_string(),
                quantity: 1,
                description: format!("{} description", identifier),
                cost_per_unit: *cost,
                link: format!("https://parts.example/{}", identifier),
            })
        }
    }

    fn catalog() -> FixedCatalog {
        FixedCatalog {
            parts: HashMap::from([("LM358", 0.45), ("ATMEGA328P-PU", 2.10)]),
        }
    }

    #[tokio::test]
    async fn mixed_batch_keeps_order_and_placeholders() {
        let ids = vec!["LM358".to_string(), "NOTAREALPART".to_string()];
        let results = lookup(&catalog(), &ids).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "LM358");
        assert_eq!(results[0].cost_per_unit, 0.45);
        assert!(!results[0].is_not_found());

        assert_eq!(results[1].name, "NOTAREALPART");
        assert_eq!(results[1].quantity, 1);
        assert_eq!(results[1].description, "Part not found");
        assert_eq!(results[1].cost_per_unit, 0.0);
        assert_eq!(results[1].link, "");
    }

    #[tokio::test]
    async fn order_follows_request_not_completion() {
        let ids: Vec<String> = ["LM358", "ATMEGA328P-PU", "R", "LM358"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let results = lookup(&catalog(), &ids).await;
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["LM358", "ATMEGA328P-PU", "R", "LM358"]);
        assert!(results[2].is_not_found());
    }

    #[tokio::test]
    async fn empty_batch() {
        assert!(lookup(&catalog(), &[]).await.is_empty());
    }
}
