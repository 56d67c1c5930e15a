//! Catalogue detail pages: the reader bootstrap script carries the
//! publication title and the PDF download URL.

use crate::error::{HarvestError, Result};
use crate::model::Catalogue;
use crate::script::Sandbox;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

pub const DEFAULT_PAGE_URL_TEMPLATE: &str = "https://ikeacatalogues.ikea.com/sv-{id}";

/// Text identifying the inline script that holds the publication data.
pub const READER_MARKER: &str = "Reader.Bootstrap.init";

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

// First, shortest match wins, as on the live pages.
static DATA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var data = \{[\s\S]+?\};").expect("valid regex"));

/// Substitute a listing id into the page URL template.
pub fn page_url(template: &str, id: &str) -> Result<String> {
    let url = template.replace("{id}", id);
    Url::parse(&url).map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", url, e)))?;
    Ok(url)
}

/// Text of the first `<script>` element containing the reader marker.
pub fn find_reader_script(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&SCRIPT_SELECTOR)
        .map(|element| element.text().collect::<String>())
        .find(|text| text.contains(READER_MARKER))
}

/// Pull the catalogue out of a detail page. `url` is only used in errors.
pub fn extract_catalogue(html: &str, url: &str) -> Result<Catalogue> {
    let script = find_reader_script(html).ok_or_else(|| HarvestError::ScriptNotFound {
        url: url.to_string(),
    })?;

    let literal = DATA_PATTERN
        .find(&script)
        .ok_or_else(|| HarvestError::DataLiteralNotFound {
            url: url.to_string(),
        })?;

    let sandbox = Sandbox::evaluate(literal.as_str());
    let data = match sandbox.get("data") {
        Some(data) => data,
        None => {
            return Err(match sandbox.failure("data") {
                Some(err) => HarvestError::Literal(err.clone()),
                None => HarvestError::DataLiteralNotFound {
                    url: url.to_string(),
                },
            });
        }
    };

    let config = data.get("config").ok_or_else(|| missing(url, "config"))?;
    let title = text_field(config, "publicationTitle").ok_or_else(|| missing(url, "publicationTitle"))?;
    let pdf_url = text_field(config, "downloadPdfUrl").ok_or_else(|| missing(url, "downloadPdfUrl"))?;

    Ok(Catalogue::new(title, pdf_url))
}

fn text_field(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn missing(url: &str, field: &str) -> HarvestError {
    HarvestError::MissingField {
        url: url.to_string(),
        field: field.to_string(),
    }
}
