use crate::amazon::AmazonClient;
use crate::models::Marketplace;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmazonError {
    #[error("product not found upstream")]
    NotFound,
    #[error("amazon data request failed: {0}")]
    Unavailable(String),
}

/// Product details as served by the provider, normalized into one shape.
#[derive(Debug, Clone, Default)]
pub struct ProductRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub photos: Vec<String>,
    pub main_image_url: Option<String>,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    #[serde(default)]
    data: Option<Value>,
}

// The photo-list field name has drifted across provider versions; probe in
// order and take the first non-empty list.
const PHOTO_FIELDS: [&str; 3] = ["product_photos", "product_images", "images"];

impl AmazonClient {
    /// One outbound call, bounded by the shared client timeout. No retries:
    /// transport failures surface immediately as `Unavailable`.
    pub async fn product_details(
        &self,
        asin: &str,
        marketplace: Marketplace,
    ) -> Result<ProductRecord, AmazonError> {
        let response = self
            .get("/product-details")
            .query(&[("asin", asin), ("country", marketplace.code())])
            .send()
            .await
            .map_err(|err| AmazonError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AmazonError::Unavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let envelope: DetailsEnvelope = response
            .json()
            .await
            .map_err(|err| AmazonError::Unavailable(err.to_string()))?;

        match envelope.data {
            Some(data) if !data.is_null() => Ok(map_product(&data)),
            _ => Err(AmazonError::NotFound),
        }
    }
}

pub(crate) fn map_product(data: &Value) -> ProductRecord {
    ProductRecord {
        title: string_field(data, "product_title"),
        description: string_field(data, "product_description"),
        features: string_list(data.get("about_product")),
        photos: probe_photo_fields(data),
        main_image_url: string_field(data, "product_main_image_url"),
        attributes: attribute_table(data.get("product_information")),
    }
}

fn probe_photo_fields(data: &Value) -> Vec<String> {
    for field in PHOTO_FIELDS {
        let photos = string_list(data.get(field));
        if !photos.is_empty() {
            return photos;
        }
    }
    Vec::new()
}

fn string_field(data: &Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn attribute_table(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|table| {
            table
                .iter()
                .filter_map(|(key, value)| {
                    value.as_str().map(|v| (key.clone(), v.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}
