pub mod config;
pub mod product;
pub mod reviews;
pub mod search;

use crate::http::build_client;
use reqwest::Client;

pub use product::{AmazonError, ProductRecord};
pub use reviews::ReviewSummary;
pub use search::Competitor;

/// Client for the `real-time-amazon-data` RapidAPI provider. Holds the
/// shared connection pool and the API key; constructed once at startup and
/// handed to the pipeline.
#[derive(Debug, Clone)]
pub struct AmazonClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl AmazonClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: build_client(),
            api_key,
            base_url: config::ROOT.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: build_client(),
            api_key,
            base_url,
        }
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", config::RAPIDAPI_HOST)
    }
}
