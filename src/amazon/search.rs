use crate::amazon::AmazonClient;
use crate::models::Marketplace;
use serde::{Deserialize, Serialize};
use tracing::warn;

const COMPETITOR_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Competitor {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    data: SearchData,
}

#[derive(Debug, Deserialize, Default)]
struct SearchData {
    #[serde(default)]
    products: Vec<RawSearchProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchProduct {
    #[serde(default)]
    pub asin: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub product_price: Option<String>,
    #[serde(default)]
    pub product_star_rating: Option<String>,
    #[serde(default)]
    pub product_num_ratings: Option<i64>,
    #[serde(default)]
    pub is_sponsored: bool,
}

impl AmazonClient {
    /// Keyword search used to find competing listings. Best effort: failures
    /// degrade to an empty list.
    pub async fn competitors(
        &self,
        keyword: &str,
        marketplace: Marketplace,
        original_asin: &str,
    ) -> Vec<Competitor> {
        let query = urlencoding::encode(keyword).into_owned();
        let result = self
            .get("/search")
            .query(&[
                ("query", query.as_str()),
                ("country", marketplace.code()),
                ("page_size", "10"),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(
                    target = "argus.amazon",
                    keyword,
                    status = %response.status(),
                    "competitor search degraded to empty list"
                );
                return Vec::new();
            }
            Err(err) => {
                warn!(target = "argus.amazon", keyword, error = %err, "competitor search failed");
                return Vec::new();
            }
        };

        match response.json::<SearchEnvelope>().await {
            Ok(envelope) => select_competitors(envelope.data.products, original_asin),
            Err(err) => {
                warn!(target = "argus.amazon", keyword, error = %err, "competitor decode failed");
                Vec::new()
            }
        }
    }
}

/// Keep the first five non-sponsored results that are not the product itself,
/// in search-result order.
pub fn select_competitors(
    products: Vec<RawSearchProduct>,
    original_asin: &str,
) -> Vec<Competitor> {
    let mut competitors = Vec::new();
    for product in products {
        if competitors.len() >= COMPETITOR_LIMIT {
            break;
        }
        if product.is_sponsored || product.asin.as_deref() == Some(original_asin) {
            continue;
        }
        competitors.push(Competitor {
            title: product.product_title,
            price: product.product_price,
            rating: product.product_star_rating,
            reviews_count: product.product_num_ratings,
        });
    }
    competitors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(asin: &str, title: &str, sponsored: bool) -> RawSearchProduct {
        RawSearchProduct {
            asin: Some(asin.to_string()),
            product_title: Some(title.to_string()),
            product_price: Some("$19.99".to_string()),
            product_star_rating: Some("4.4".to_string()),
            product_num_ratings: Some(120),
            is_sponsored: sponsored,
        }
    }

    #[test]
    fn excludes_self_and_sponsored() {
        let picked = select_competitors(
            vec![
                raw("B000000001", "the product itself", false),
                raw("B000000002", "sponsored rival", true),
                raw("B000000003", "organic rival", false),
            ],
            "B000000001",
        );
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title.as_deref(), Some("organic rival"));
    }

    #[test]
    fn truncates_to_five_in_result_order() {
        let products = (0..8)
            .map(|i| raw(&format!("B00000000{i}"), &format!("rival {i}"), false))
            .collect();
        let picked = select_competitors(products, "B999999999");
        assert_eq!(picked.len(), 5);
        assert_eq!(picked[0].title.as_deref(), Some("rival 0"));
        assert_eq!(picked[4].title.as_deref(), Some("rival 4"));
    }
}
