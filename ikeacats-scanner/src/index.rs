//! Catalogue index document: a script assigning the `listings` array.

use crate::error::{HarvestError, Result};
use crate::model::Listing;
use crate::script::Sandbox;
use serde_json::Value;

pub const DEFAULT_INDEX_URL: &str =
    "https://ikeamuseum.com/wp-content/themes/ikea-museum/includes/catalogues/external/listing.json";

const LISTINGS_FIELD: &str = "listings";

/// Parse the index document into listings, keeping document order.
pub fn parse_index(body: &str) -> Result<Vec<Listing>> {
    let sandbox = Sandbox::evaluate(body);

    let listings = find_listings(&sandbox).ok_or_else(|| match sandbox.failure(LISTINGS_FIELD) {
        Some(err) => HarvestError::IndexExtraction(format!("`{}` is not a literal: {}", LISTINGS_FIELD, err)),
        None if sandbox.is_empty() => {
            HarvestError::IndexExtraction("document contains no data assignments".to_string())
        }
        None => HarvestError::IndexExtraction(format!("no `{}` field found", LISTINGS_FIELD)),
    })?;

    serde_json::from_value(listings.clone())
        .map_err(|e| HarvestError::IndexExtraction(format!("malformed `{}`: {}", LISTINGS_FIELD, e)))
}

/// A global `listings` binding wins; then a `listings` field on a bound
/// object; then one on a bare literal document.
fn find_listings(sandbox: &Sandbox) -> Option<&Value> {
    if let Some(value) = sandbox.get(LISTINGS_FIELD) {
        return Some(value);
    }
    sandbox
        .bindings()
        .map(|(_, value)| value)
        .chain(sandbox.expressions())
        .find_map(|value| value.get(LISTINGS_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_listings_binding() {
        let body = r#"var listings = [{"id": "1951", "year": 1951}, {"id": 1952}];"#;
        let listings = parse_index(body).unwrap();
        assert_eq!(listings, vec![Listing::new("1951"), Listing::new("1952")]);
    }

    #[test]
    fn test_listings_inside_assigned_object() {
        let body = "var catalogues = {\n  total: 2,\n  listings: [{id: 'b'}, {id: 'a'}],\n};";
        let listings = parse_index(body).unwrap();
        assert_eq!(listings, vec![Listing::new("b"), Listing::new("a")]);
    }

    #[test]
    fn test_plain_json_document() {
        let listings = parse_index(r#"{"listings": [{"id": "x"}]}"#).unwrap();
        assert_eq!(listings, vec![Listing::new("x")]);
    }

    #[test]
    fn test_empty_listings_is_not_an_error() {
        assert!(parse_index("var listings = [];").unwrap().is_empty());
    }

    #[test]
    fn test_missing_listings() {
        let err = parse_index("var catalogues = {total: 0};").unwrap_err();
        assert!(matches!(err, HarvestError::IndexExtraction(ref msg) if msg.contains("no `listings`")));
    }

    #[test]
    fn test_unreadable_document() {
        let err = parse_index("<html>Service unavailable</html>").unwrap_err();
        assert!(matches!(err, HarvestError::IndexExtraction(_)));
    }

    #[test]
    fn test_listing_without_id() {
        let err = parse_index("var listings = [{year: 1951}];").unwrap_err();
        assert!(matches!(err, HarvestError::IndexExtraction(ref msg) if msg.contains("malformed")));
    }

    #[test]
    fn test_null_listings() {
        assert!(parse_index("var listings = null;").is_err());
    }
}
