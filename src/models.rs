use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub amazon_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub amazon_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub amazon_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub report: String,
    pub asin: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    #[serde(default)]
    pub product_photos: Vec<String>,
    #[serde(default)]
    pub product_features: Vec<String>,
}

impl AnalyzeResponse {
    /// Error-shaped slot used by the batch path so one bad input never
    /// removes or reorders entries in the output.
    pub fn error_slot(asin: &str, country: &str, url: &str, detail: &str) -> Self {
        Self {
            report: detail.to_string(),
            asin: asin.to_string(),
            country: country.to_string(),
            product_title: Some(format!("Failed to process URL: {url}")),
            product_image_url: None,
            product_photos: Vec::new(),
            product_features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAnalyzeResponse {
    pub results: Vec<AnalyzeResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub optimized_listing_report: String,
    pub asin: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Amazon marketplace resolved from the URL hostname.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Marketplace {
    Br,
    #[default]
    Us,
    Gb,
    De,
    Ca,
    Fr,
    Es,
    It,
    Jp,
    In,
    Mx,
    Au,
}

// Order matters: `amazon.com.br` must be probed before `amazon.com`.
const HOST_SUFFIXES: [(&str, Marketplace); 12] = [
    ("amazon.com.br", Marketplace::Br),
    ("amazon.com.mx", Marketplace::Mx),
    ("amazon.com.au", Marketplace::Au),
    ("amazon.com", Marketplace::Us),
    ("amazon.co.uk", Marketplace::Gb),
    ("amazon.de", Marketplace::De),
    ("amazon.ca", Marketplace::Ca),
    ("amazon.fr", Marketplace::Fr),
    ("amazon.es", Marketplace::Es),
    ("amazon.it", Marketplace::It),
    ("amazon.co.jp", Marketplace::Jp),
    ("amazon.in", Marketplace::In),
];

impl Marketplace {
    pub fn code(&self) -> &'static str {
        match self {
            Marketplace::Br => "BR",
            Marketplace::Us => "US",
            Marketplace::Gb => "GB",
            Marketplace::De => "DE",
            Marketplace::Ca => "CA",
            Marketplace::Fr => "FR",
            Marketplace::Es => "ES",
            Marketplace::It => "IT",
            Marketplace::Jp => "JP",
            Marketplace::In => "IN",
            Marketplace::Mx => "MX",
            Marketplace::Au => "AU",
        }
    }

    pub fn from_host(host: &str) -> Self {
        let host = host.to_lowercase();
        HOST_SUFFIXES
            .iter()
            .find(|(suffix, _)| host.contains(suffix))
            .map(|(_, marketplace)| *marketplace)
            .unwrap_or_default()
    }

    /// Target language for generated text on this marketplace.
    pub fn language(&self) -> &'static str {
        locale_for(self.code()).0
    }

    /// Storefront label used when addressing the generator.
    pub fn market_label(&self) -> String {
        locale_for(self.code()).1
    }
}

/// Marketplace code → (response language, storefront label). Codes outside
/// the table fall back to English with a synthesized label.
pub fn locale_for(code: &str) -> (&'static str, String) {
    match code {
        "BR" => ("Português (Brasil)", "Amazon BR".to_string()),
        "US" => ("English (US)", "Amazon US".to_string()),
        "MX" => ("Español (México)", "Amazon MX".to_string()),
        "ES" => ("Español (España)", "Amazon ES".to_string()),
        other => ("English (US)", format!("Amazon {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_suffix_beats_generic_com() {
        assert_eq!(Marketplace::from_host("www.amazon.com.br"), Marketplace::Br);
        assert_eq!(Marketplace::from_host("www.amazon.com"), Marketplace::Us);
    }

    #[test]
    fn unknown_host_defaults_to_us() {
        assert_eq!(Marketplace::from_host("shop.example.net"), Marketplace::Us);
    }

    #[test]
    fn mx_resolves_to_mexican_spanish() {
        assert_eq!(locale_for("MX").0, "Español (México)");
    }

    #[test]
    fn unmapped_code_falls_back_to_english() {
        let (language, label) = locale_for("XX");
        assert_eq!(language, "English (US)");
        assert_eq!(label, "Amazon XX");
    }

    #[test]
    fn marketplace_serializes_as_code() {
        let json = serde_json::to_string(&Marketplace::Br).expect("serialize");
        assert_eq!(json, "\"BR\"");
    }
}
