use crate::amazon::{AmazonClient, AmazonError};
use crate::asin::{ListingRef, extract_listing_ref};
use crate::llm::LlmClient;
use crate::models::{AnalyzeResponse, OptimizeResponse};
use crate::{metrics, optimizer, report};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

const MALFORMED_URL_DETAIL: &str = "invalid URL or no ASIN found in the provided URL";

/// Request-scoped orchestrator. Holds the two outbound clients, constructed
/// once at startup and shared across requests; nothing here is mutated after
/// construction.
#[derive(Clone)]
pub struct Pipeline {
    amazon: Arc<AmazonClient>,
    llm: Arc<LlmClient>,
}

impl Pipeline {
    pub fn new(amazon: AmazonClient, llm: LlmClient) -> Self {
        Self {
            amazon: Arc::new(amazon),
            llm: Arc::new(llm),
        }
    }

    /// Single-URL analysis. Hard failures carry a stage and a kind so the
    /// HTTP layer can map them to a status code.
    pub async fn analyze(&self, url: &str) -> Result<AnalyzeResponse, PipelineError> {
        let listing = extract_listing_ref(url)
            .ok_or_else(|| PipelineError::malformed("extract_asin", MALFORMED_URL_DETAIL))?;
        self.analyze_listing(&listing).await
    }

    async fn analyze_listing(
        &self,
        listing: &ListingRef,
    ) -> Result<AnalyzeResponse, PipelineError> {
        let started = Instant::now();
        let product = self
            .amazon
            .product_details(&listing.asin, listing.marketplace)
            .await
            .map_err(|err| PipelineError::upstream("fetch_product", err))?;
        metrics::stage_elapsed("fetch_product", started.elapsed().as_millis());

        let started = Instant::now();
        let report_text = report::analyze_product(&self.llm, &product, listing.marketplace)
            .await
            .map_err(|err| PipelineError::generation("generate_report", err.to_string()))?;
        metrics::stage_elapsed("generate_report", started.elapsed().as_millis());

        Ok(AnalyzeResponse {
            report: report_text,
            asin: listing.asin.clone(),
            country: listing.marketplace.code().to_string(),
            product_title: product.title,
            product_image_url: product.main_image_url,
            product_photos: product.photos,
            product_features: product.features,
        })
    }

    /// Batch-slot variant: every failure, hard or otherwise, is folded into
    /// an error-shaped response so callers always get one entry per input.
    pub async fn analyze_slot(&self, url: &str) -> AnalyzeResponse {
        let Some(listing) = extract_listing_ref(url) else {
            return AnalyzeResponse::error_slot(
                "ERROR",
                "N/A",
                url,
                &format!("Error: {MALFORMED_URL_DETAIL}."),
            );
        };
        match self.analyze_listing(&listing).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    target = "argus.pipeline",
                    asin = %listing.asin,
                    stage = err.stage(),
                    error = %err,
                    "batch slot degraded to error entry"
                );
                AnalyzeResponse::error_slot(
                    &listing.asin,
                    listing.marketplace.code(),
                    url,
                    &format!(
                        "Error processing product with ASIN {}: {}",
                        listing.asin,
                        err.detail()
                    ),
                )
            }
        }
    }

    /// Fan out one independent task per URL and join them back in input
    /// order; a failed slot never touches its neighbours. Concurrency is
    /// deliberately uncapped, matching the service this replaces.
    pub async fn analyze_batch(&self, urls: Vec<String>) -> Vec<AnalyzeResponse> {
        let handles: Vec<_> = urls
            .iter()
            .cloned()
            .map(|url| {
                let pipeline = self.clone();
                tokio::spawn(async move { pipeline.analyze_slot(&url).await })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;
        joined
            .into_iter()
            .zip(urls)
            .map(|(slot, url)| match slot {
                Ok(slot) => slot,
                Err(err) => {
                    warn!(target = "argus.pipeline", url = %url, error = %err, "batch task aborted");
                    AnalyzeResponse::error_slot(
                        "ERROR",
                        "N/A",
                        &url,
                        "Error: internal failure while processing this URL.",
                    )
                }
            })
            .collect()
    }

    /// Optimize path: product fetch, then the two enrichment reads run
    /// concurrently (their failures degrade to empty defaults inside the
    /// clients), then one generation call.
    pub async fn optimize(&self, url: &str) -> Result<OptimizeResponse, PipelineError> {
        let listing = extract_listing_ref(url)
            .ok_or_else(|| PipelineError::malformed("extract_asin", MALFORMED_URL_DETAIL))?;

        let product = self
            .amazon
            .product_details(&listing.asin, listing.marketplace)
            .await
            .map_err(|err| PipelineError::upstream("fetch_product", err))?;

        let keyword = product
            .title
            .clone()
            .unwrap_or_else(|| listing.asin.clone());
        let started = Instant::now();
        let (reviews, competitors) = tokio::join!(
            self.amazon.product_reviews(&listing.asin, listing.marketplace),
            self.amazon
                .competitors(&keyword, listing.marketplace, &listing.asin),
        );
        metrics::stage_elapsed("enrichment", started.elapsed().as_millis());

        let optimized = optimizer::optimize_listing(
            &self.llm,
            &product,
            &reviews,
            &competitors,
            listing.marketplace,
        )
        .await
        .map_err(|err| PipelineError::generation("optimize_listing", err.to_string()))?;

        Ok(OptimizeResponse {
            optimized_listing_report: optimized,
            asin: listing.asin,
            country: listing.marketplace.code().to_string(),
        })
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    MalformedInput,
    UpstreamNotFound,
    UpstreamUnavailable,
    Generation,
}

impl PipelineError {
    pub fn malformed(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::MalformedInput,
        }
    }

    pub fn upstream(stage: &'static str, err: AmazonError) -> Self {
        let kind = match err {
            AmazonError::NotFound => PipelineErrorKind::UpstreamNotFound,
            AmazonError::Unavailable(_) => PipelineErrorKind::UpstreamUnavailable,
        };
        Self {
            stage,
            message: err.to_string(),
            kind,
        }
    }

    pub fn generation(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Generation,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, LlmConfig};

    // Clients aimed at a reserved TEST-NET address: requests fail without
    // leaving the machine, which is all these tests need.
    fn offline_pipeline() -> Pipeline {
        let amazon =
            AmazonClient::with_base_url("test-key".into(), "http://192.0.2.1:1".into());
        let llm = LlmClient::new(LlmConfig {
            base_url: "http://192.0.2.1:1".into(),
            api_key: "test-key".into(),
            model: "test-model".into(),
        });
        Pipeline::new(amazon, llm)
    }

    #[tokio::test]
    async fn analyze_rejects_unparseable_url() {
        let pipeline = offline_pipeline();
        let err = pipeline
            .analyze("https://www.amazon.com/gp/help/customer")
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), PipelineErrorKind::MalformedInput);
        assert_eq!(err.stage(), "extract_asin");
    }

    #[tokio::test]
    async fn analyze_surfaces_upstream_unavailability() {
        let pipeline = offline_pipeline();
        let err = pipeline
            .analyze("https://www.amazon.com/dp/B08N5WRWNW")
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), PipelineErrorKind::UpstreamUnavailable);
        assert_eq!(err.stage(), "fetch_product");
    }

    #[tokio::test]
    async fn batch_isolates_failures_and_preserves_order() {
        let pipeline = offline_pipeline();
        let results = pipeline
            .analyze_batch(vec![
                "https://www.amazon.com/dp/B000000001".to_string(),
                "not a url at all".to_string(),
                "https://www.amazon.com.br/dp/B000000003".to_string(),
            ])
            .await;
        assert_eq!(results.len(), 3);
        // slot 1 and 3 got past extraction before the (unreachable) provider
        assert_eq!(results[0].asin, "B000000001");
        assert_eq!(results[0].country, "US");
        assert_eq!(results[1].asin, "ERROR");
        assert_eq!(results[1].country, "N/A");
        assert_eq!(results[2].asin, "B000000003");
        assert_eq!(results[2].country, "BR");
        assert!(results[1].report.contains("no ASIN"));
    }

    #[tokio::test]
    async fn slot_for_malformed_url_is_error_shaped() {
        let pipeline = offline_pipeline();
        let slot = pipeline.analyze_slot("https://example.com/nothing").await;
        assert_eq!(slot.asin, "ERROR");
        assert!(slot.product_photos.is_empty());
        assert!(
            slot.product_title
                .as_deref()
                .is_some_and(|t| t.contains("https://example.com/nothing"))
        );
    }
}
