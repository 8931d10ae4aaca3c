use crate::models::Marketplace;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Product reference recovered from a marketplace URL: the 10-character
/// alphanumeric identifier plus the marketplace it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRef {
    pub asin: String,
    pub marketplace: Marketplace,
}

static DP_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/(?:dp|gp(?:/product)?|product)/([A-Z0-9]{10})").expect("dp segment pattern")
});

static BARE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/([A-Z0-9]{10})(?:[/?]|$)").expect("bare segment pattern"));

// Query-param ASINs are only accepted uppercase; path matchers keep whatever
// case the URL carried.
static QUERY_ASIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{10}$").expect("query asin pattern"));

/// Pull a product identifier and marketplace out of an Amazon URL.
///
/// Matchers are tried in order and the first success wins:
/// 1. `/dp/`, `/gp/`, `/gp/product/` or `/product/` followed by the token;
/// 2. any standalone 10-character path segment bounded by `/`, `?` or the
///    end of the string;
/// 3. an `asin` query parameter.
///
/// Marketplace resolution needs a parseable hostname; an unrecognized host
/// still succeeds with the US default.
pub fn extract_listing_ref(raw_url: &str) -> Option<ListingRef> {
    let asin = match_asin(raw_url)?;
    let parsed = Url::parse(raw_url).ok()?;
    let host = parsed.host_str()?;
    Some(ListingRef {
        asin,
        marketplace: Marketplace::from_host(host),
    })
}

fn match_asin(raw_url: &str) -> Option<String> {
    if let Some(caps) = DP_SEGMENT.captures(raw_url) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = BARE_SEGMENT.captures(raw_url) {
        return Some(caps[1].to_string());
    }
    let parsed = Url::parse(raw_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "asin")
        .map(|(_, value)| value.into_owned())
        .filter(|value| QUERY_ASIN.is_match(value))
}
