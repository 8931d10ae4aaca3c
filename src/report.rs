//! Inconsistency-analysis report: compares a listing's textual claims
//! against its numbered product images via one generation call.

use crate::amazon::ProductRecord;
use crate::llm::{LlmClient, LlmError, LlmMessage};
use crate::models::Marketplace;
use std::collections::HashMap;
use std::fmt::Write;

pub const MAX_REPORT_IMAGES: usize = 5;

/// Generate the inconsistency report. A listing with no photos is not an
/// error: it degrades to a local text-only report so the analyze path still
/// answers. Generation failures propagate.
pub async fn analyze_product(
    llm: &LlmClient,
    product: &ProductRecord,
    marketplace: Marketplace,
) -> Result<String, LlmError> {
    if product.photos.is_empty() {
        return Ok(fallback_report(product));
    }
    let prompt = build_analysis_prompt(product, marketplace);
    llm.chat(&[LlmMessage::user(prompt)]).await
}

pub fn build_analysis_prompt(product: &ProductRecord, marketplace: Marketplace) -> String {
    let title = product.title.as_deref().unwrap_or("N/A");
    let dimensions =
        dimensions_from_attributes(&product.attributes).unwrap_or_else(|| "N/A".to_string());

    let mut prompt = String::new();
    prompt.push_str(
        "You are an extremely meticulous e-commerce QA analyst with a focus on numeric data.\n\
         Your task is to compare the TEXTUAL DATA of a product with the NUMBERED IMAGES to find \
         factual contradictions, especially in dimensions and product specifications.\n\
         Follow these steps:\n\
         1. Analyze EACH image and extract every visible numeric specification (height, width, \
         depth, weight, and so on).\n\
         2. Compare the numbers extracted from the images with the values given in the TEXTUAL \
         DATA section.\n\
         3. When you find a numeric contradiction, describe it clearly, quoting the exact values \
         from the text and from the image.\n\
         4. You MUST cite the ordinal number of the image where each inconsistency was found \
         (for example: 'In Image 2...').\n\
         5. Produce a clear, concise report listing ALL discrepancies found.\n\
         Discrepancies include:\n\
         - Contradictory information (text says '10h battery', image shows '8h battery').\n\
         - Features claimed in the text but not shown or supported by the images.\n\
         - Important features or text visible in the images but omitted from the description.\n\
         - Any error that could affect a purchase decision.\n\
         Group discrepancies by type where possible and explain why each one counts as a \
         discrepancy.\n\
         If everything is consistent, state: 'No factual inconsistency found.'\n",
    );
    let _ = writeln!(prompt, "Respond entirely in {}.", marketplace.language());
    prompt.push_str("\n--- TEXTUAL DATA OF THE PRODUCT ---\n");
    let _ = writeln!(prompt, "**Title:** {title}");
    let _ = writeln!(prompt, "**Listing body:**\n{}", listing_body(product));
    let _ = writeln!(prompt, "**Product dimensions (text):** {dimensions}");
    prompt.push_str("\n--- IMAGES FOR VISUAL ANALYSIS (numbered sequentially from 1) ---\n");
    for (i, url) in product.photos.iter().take(MAX_REPORT_IMAGES).enumerate() {
        let _ = writeln!(prompt, "Image {}: {url}", i + 1);
    }
    prompt
}

/// Text-only report returned when the provider gave us no images.
pub fn fallback_report(product: &ProductRecord) -> String {
    let title = product.title.as_deref().unwrap_or("N/A");
    let dimensions =
        dimensions_from_attributes(&product.attributes).unwrap_or_else(|| "N/A".to_string());
    format!(
        "No product images were returned by the listing data provider.\n\
         --- TEXTUAL DATA ---\n\
         **Title:** {title}\n\
         **Listing body:**\n{}\n\
         **Product dimensions (text):** {dimensions}",
        listing_body(product)
    )
}

fn listing_body(product: &ProductRecord) -> String {
    let description = product.description.as_deref().unwrap_or("");
    let features = if product.features.is_empty() {
        "N/A".to_string()
    } else {
        product.features.join("\n- ")
    };
    format!("{description}\n\nFeatures:\n- {features}")
        .trim()
        .to_string()
}

/// Best-effort dimensions lookup: first attribute whose key contains
/// `dimens`, case-insensitive.
pub fn dimensions_from_attributes(attributes: &HashMap<String, String>) -> Option<String> {
    attributes
        .iter()
        .find(|(key, _)| key.to_lowercase().contains("dimens"))
        .map(|(_, value)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_photos(count: usize) -> ProductRecord {
        ProductRecord {
            title: Some("Steel Bottle 750ml".into()),
            description: Some("Keeps drinks cold for 24 hours.".into()),
            features: vec!["Leak proof".into(), "BPA free".into()],
            photos: (0..count)
                .map(|i| format!("https://img.example/{i}.jpg"))
                .collect(),
            main_image_url: None,
            attributes: HashMap::from([(
                "Package Dimensions".to_string(),
                "10 x 8 x 3 cm".to_string(),
            )]),
        }
    }

    #[test]
    fn prompt_numbers_images_from_one() {
        let prompt = build_analysis_prompt(&product_with_photos(3), Marketplace::Us);
        assert!(prompt.contains("Image 1: https://img.example/0.jpg"));
        assert!(prompt.contains("Image 3: https://img.example/2.jpg"));
    }

    #[test]
    fn prompt_caps_images_at_five() {
        let prompt = build_analysis_prompt(&product_with_photos(9), Marketplace::Us);
        assert!(prompt.contains("Image 5:"));
        assert!(!prompt.contains("Image 6:"));
    }

    #[test]
    fn prompt_carries_dimensions_and_language() {
        let prompt = build_analysis_prompt(&product_with_photos(1), Marketplace::Br);
        assert!(prompt.contains("10 x 8 x 3 cm"));
        assert!(prompt.contains("Português (Brasil)"));
    }

    #[test]
    fn fallback_report_contains_title() {
        let report = fallback_report(&product_with_photos(0));
        assert!(report.contains("Steel Bottle 750ml"));
        assert!(report.contains("No product images"));
    }

    #[test]
    fn dimension_key_match_is_case_insensitive() {
        let attributes = HashMap::from([
            ("Brand".to_string(), "Acme".to_string()),
            ("Item DIMENSIONS".to_string(), "5 x 5 x 5 in".to_string()),
        ]);
        assert_eq!(
            dimensions_from_attributes(&attributes).as_deref(),
            Some("5 x 5 x 5 in")
        );
        assert!(dimensions_from_attributes(&HashMap::new()).is_none());
    }
}
