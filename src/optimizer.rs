//! Listing optimizer: one structured generation call that rewrites a listing
//! using the product data plus review and competitor intelligence.

use crate::amazon::{Competitor, ProductRecord, ReviewSummary};
use crate::llm::{LlmClient, LlmError, LlmMessage};
use crate::models::Marketplace;
use serde_json::json;
use std::fmt::Write;

pub async fn optimize_listing(
    llm: &LlmClient,
    product: &ProductRecord,
    reviews: &ReviewSummary,
    competitors: &[Competitor],
    marketplace: Marketplace,
) -> Result<String, LlmError> {
    let prompt = build_optimizer_prompt(product, reviews, competitors, marketplace);
    llm.chat(&[LlmMessage::user(prompt)]).await
}

pub fn build_optimizer_prompt(
    product: &ProductRecord,
    reviews: &ReviewSummary,
    competitors: &[Competitor],
    marketplace: Marketplace,
) -> String {
    let language = marketplace.language();
    let market = marketplace.market_label();
    let title = product.title.as_deref().unwrap_or("N/A");
    let competitors_json =
        serde_json::to_string(competitors).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a Senior E-commerce Consultant, an expert in SEO for the Amazon ecosystem \
         (A9, Rufus). Your mission is to optimize a listing to maximize sales on the {market} \
         marketplace."
    );
    let _ = writeln!(prompt, "The response MUST be written entirely in {language}.");
    let _ = writeln!(
        prompt,
        "--- CURRENT PRODUCT DATA ---\nTitle: {title}\nFeatures: {:?}",
        product.features
    );
    let _ = writeln!(
        prompt,
        "--- MARKET INTELLIGENCE ---\nPositive reviews: {}\nNegative reviews: {}\nCompetitors: {competitors_json}",
        json!(reviews.positive),
        json!(reviews.negative),
    );
    prompt.push_str(
        "\n--- INSTRUCTIONS AND MANDATORY OUTPUT FORMAT ---\n\
         Generate your answer following STRICTLY the Markdown structure below, without omitting \
         any section. Use the headings exactly as specified.\n\
         ### 1. Optimized Title (SEO)\n[optimized title here]\n\
         ### 2. Optimized Feature Bullets (5 Points)\n[the 5 feature bullets, one per line]\n\
         ### 3. Product Description (A+ Content Structure)\n[persuasive long-form description]\n\
         ### 4. Competitive Analysis and Strategy\n[comparison table and strategy paragraph]\n\
         ### 5. Backend Keyword Suggestions\n[15-20 long-tail keywords]\n\
         ### 6. Strategic FAQ (Top 5 Questions and Answers)\n[the 5 Q&As]\n\
         \n--- UNBREAKABLE RULES ---\n\
         - Do not invent attributes. Use only the data provided.\n\
         - No generic clichés. Be specific and factual.\n\
         - The final content must be unique and superior to the competitors'.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> ProductRecord {
        ProductRecord {
            title: Some("Steel Bottle 750ml".into()),
            features: vec!["Leak proof".into()],
            ..ProductRecord::default()
        }
    }

    #[test]
    fn prompt_has_all_six_sections() {
        let prompt = build_optimizer_prompt(
            &sample_product(),
            &ReviewSummary::default(),
            &[],
            Marketplace::Us,
        );
        for heading in [
            "### 1. Optimized Title (SEO)",
            "### 2. Optimized Feature Bullets (5 Points)",
            "### 3. Product Description (A+ Content Structure)",
            "### 4. Competitive Analysis and Strategy",
            "### 5. Backend Keyword Suggestions",
            "### 6. Strategic FAQ (Top 5 Questions and Answers)",
        ] {
            assert!(prompt.contains(heading), "missing {heading}");
        }
        assert!(prompt.contains("Do not invent attributes"));
    }

    #[test]
    fn prompt_targets_marketplace_language() {
        let prompt = build_optimizer_prompt(
            &sample_product(),
            &ReviewSummary::default(),
            &[],
            Marketplace::Mx,
        );
        assert!(prompt.contains("Español (México)"));
        assert!(prompt.contains("Amazon MX"));
    }

    #[test]
    fn prompt_embeds_review_and_competitor_data() {
        let reviews = ReviewSummary {
            positive: vec!["love it".into()],
            negative: vec!["lid broke".into()],
        };
        let competitors = vec![Competitor {
            title: Some("Rival Bottle".into()),
            price: Some("$14.99".into()),
            rating: Some("4.1".into()),
            reviews_count: Some(230),
        }];
        let prompt = build_optimizer_prompt(
            &sample_product(),
            &reviews,
            &competitors,
            Marketplace::Us,
        );
        assert!(prompt.contains("love it"));
        assert!(prompt.contains("lid broke"));
        assert!(prompt.contains("Rival Bottle"));
    }
}
