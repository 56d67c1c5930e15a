// Tests for the full harvest pipeline against a mock catalogue site

use ikeacats_core::harvest::{
    HarvestOptions, HarvestProgressCallback, execute_harvest, generate_harvest_report,
};
use ikeacats_scanner::HarvestError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex},
};

// ============================================================================
// Fixtures
// ============================================================================

const CATALOGUES: [(&str, &str); 3] = [("1951", "IKEA 1951"), ("1975", "IKEA 1975"), ("2021", "2021")];

fn reader_page(title: &str, pdf_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><script src="/static/reader.min.js"></script></head>
<body>
<div id="reader"></div>
<script type="text/javascript">
  var data = {{
    config: {{ publicationTitle: '{}', downloadPdfUrl: '{}', language: 'sv' }},
    spreads: []
  }};
  Reader.Bootstrap.init(data);
</script>
</body>
</html>"#,
        title, pdf_url
    )
}

fn pdf_body(id: &str) -> Vec<u8> {
    format!("%PDF-1.4\n% catalogue {}\n%%EOF\n", id).into_bytes()
}

async fn mount_site(server: &MockServer, ids: &[(&str, &str)]) {
    let listings: Vec<String> = ids.iter().map(|(id, _)| format!("{{\"id\":\"{}\"}}", id)).collect();
    let index = format!("var catalogues = {{\"listings\":[{}]}};", listings.join(","));

    Mock::given(method("GET"))
        .and(path("/listing.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index))
        .mount(server)
        .await;

    for (id, title) in ids {
        let pdf_url = format!("{}/pdf/{}.pdf", server.uri(), id);
        Mock::given(method("GET"))
            .and(path(format!("/sv-{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(reader_page(title, &pdf_url)),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/pdf/{}.pdf", id)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body(id)))
            .mount(server)
            .await;
    }
}

fn options(server: &MockServer, target: &std::path::Path) -> HarvestOptions {
    HarvestOptions {
        target: target.to_path_buf(),
        index_url: format!("{}/listing.json", server.uri()),
        page_url_template: format!("{}/sv-{{id}}", server.uri()),
        delay: Duration::ZERO,
        show_progress_bars: false,
    }
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_harvest_downloads_every_catalogue() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, &CATALOGUES).await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("output");

    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    let callback: HarvestProgressCallback =
        Arc::new(move |msg: String| messages_clone.lock().unwrap().push(msg));

    let summary = execute_harvest(options(&mock_server, &target), Some(callback))
        .await
        .unwrap();

    assert_eq!(summary.listings, 3);
    let titles: Vec<&str> = summary.catalogues.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["IKEA 1951", "IKEA 1975", "2021"]);

    for (id, title) in CATALOGUES {
        let written = std::fs::read(target.join(format!("{}.pdf", title))).unwrap();
        assert_eq!(written, pdf_body(id));
    }

    let messages = messages.lock().unwrap();
    assert!(messages.iter().any(|m| m == "Retrieving PDF download URLs..."));
    assert!(messages.iter().any(|m| m == "Downloading 3 PDFs..."));
    assert!(messages.iter().any(|m| m.starts_with("Downloading: IKEA 1975 (")));
    assert!(messages.last().unwrap().starts_with("All done"));

    let report = generate_harvest_report(&summary);
    assert!(report.contains("PDFs downloaded: 3"));
    assert!(report.contains("2021.pdf"));
}

#[tokio::test]
async fn test_missing_listings_stops_before_any_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("var catalogues = {\"total\": 0};"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/sv-"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("output");
    let err = execute_harvest(options(&mock_server, &target), None)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::IndexExtraction(_)));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_broken_page_writes_no_files() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, &[("1951", "IKEA 1951")]).await;

    // Listing 1952 has a page without the data literal; 1953 must never be fetched
    Mock::given(method("GET"))
        .and(path("/listing.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"var listings = [{"id": "1951"}, {"id": "1952"}, {"id": "1953"}];"#,
        ))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sv-1952"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><script>Reader.Bootstrap.init(loadData());</script></html>",
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sv-1953"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/pdf/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("output");
    let err = execute_harvest(options(&mock_server, &target), None)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::DataLiteralNotFound { .. }));
    assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
}

#[tokio::test]
async fn test_target_directory_failure() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, &CATALOGUES).await;

    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("output");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();

    let err = execute_harvest(options(&mock_server, &blocker.join("pdfs")), None)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::TargetDirectory { .. }));
}

// ============================================================================
// Throttle Tests
// ============================================================================

#[tokio::test]
async fn test_every_page_and_download_is_throttled() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, &CATALOGUES).await;

    let dir = TempDir::new().unwrap();
    let delay = Duration::from_millis(40);
    let mut opts = options(&mock_server, dir.path());
    opts.delay = delay;

    let start = Instant::now();
    let summary = execute_harvest(opts, None).await.unwrap();

    // three detail pages and three downloads
    assert_eq!(summary.downloads.len(), 3);
    assert!(start.elapsed() >= delay * 6);
}
