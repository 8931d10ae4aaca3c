use crate::amazon::AmazonClient;
use crate::models::Marketplace;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

const BUCKET_LIMIT: usize = 10;

/// Review comments bucketed by star rating. Always populated: a failed or
/// empty fetch yields empty buckets, never an error.
#[derive(Debug, Clone, Default)]
pub struct ReviewSummary {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewsEnvelope {
    #[serde(default)]
    data: ReviewsData,
}

#[derive(Debug, Deserialize, Default)]
struct ReviewsData {
    #[serde(default)]
    reviews: Vec<RawReview>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub review_comment: String,
    #[serde(default)]
    pub review_star_rating: Value,
}

impl RawReview {
    // The provider has served the rating both as a number and as a numeric
    // string depending on version.
    fn rating(&self) -> Option<f64> {
        match &self.review_star_rating {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl AmazonClient {
    /// Best-effort enrichment: any transport or decode failure degrades to
    /// empty buckets so the optimize path keeps going.
    pub async fn product_reviews(&self, asin: &str, marketplace: Marketplace) -> ReviewSummary {
        let result = self
            .get("/product-reviews")
            .query(&[
                ("asin", asin),
                ("country", marketplace.code()),
                ("sort_by", "recent"),
                ("page_size", "20"),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(
                    target = "argus.amazon",
                    asin,
                    status = %response.status(),
                    "review fetch degraded to empty summary"
                );
                return ReviewSummary::default();
            }
            Err(err) => {
                warn!(target = "argus.amazon", asin, error = %err, "review fetch failed");
                return ReviewSummary::default();
            }
        };

        match response.json::<ReviewsEnvelope>().await {
            Ok(envelope) => bucket_reviews(envelope.data.reviews),
            Err(err) => {
                warn!(target = "argus.amazon", asin, error = %err, "review decode failed");
                ReviewSummary::default()
            }
        }
    }
}

/// Rating ≥4 → positive, ≤2 → negative, middle ratings dropped. Provider
/// order is preserved and each bucket holds at most ten comments.
pub fn bucket_reviews(reviews: Vec<RawReview>) -> ReviewSummary {
    let mut summary = ReviewSummary::default();
    for review in reviews {
        let Some(rating) = review.rating() else {
            continue;
        };
        if rating >= 4.0 && summary.positive.len() < BUCKET_LIMIT {
            summary.positive.push(review.review_comment);
        } else if rating <= 2.0 && summary.negative.len() < BUCKET_LIMIT {
            summary.negative.push(review.review_comment);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(comment: &str, rating: Value) -> RawReview {
        RawReview {
            review_comment: comment.to_string(),
            review_star_rating: rating,
        }
    }

    #[test]
    fn buckets_by_threshold_and_drops_middle() {
        let summary = bucket_reviews(vec![
            review("great", json!(5)),
            review("good", json!(4)),
            review("meh", json!(3)),
            review("bad", json!(2)),
            review("awful", json!(1)),
        ]);
        assert_eq!(summary.positive, vec!["great", "good"]);
        assert_eq!(summary.negative, vec!["bad", "awful"]);
    }

    #[test]
    fn accepts_string_ratings() {
        let summary = bucket_reviews(vec![
            review("solid", json!("4.0")),
            review("broken", json!("1.0")),
            review("unrated", json!(null)),
        ]);
        assert_eq!(summary.positive, vec!["solid"]);
        assert_eq!(summary.negative, vec!["broken"]);
    }

    #[test]
    fn truncates_each_bucket_to_ten() {
        let mut reviews = Vec::new();
        for i in 0..15 {
            reviews.push(review(&format!("pos{i}"), json!(5)));
            reviews.push(review(&format!("neg{i}"), json!(1)));
        }
        let summary = bucket_reviews(reviews);
        assert_eq!(summary.positive.len(), 10);
        assert_eq!(summary.negative.len(), 10);
        assert_eq!(summary.positive[0], "pos0");
        assert_eq!(summary.negative[9], "neg9");
    }
}
