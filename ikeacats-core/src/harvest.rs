use chrono::{DateTime, Local};
use ikeacats_scanner::detail::DEFAULT_PAGE_URL_TEMPLATE;
use ikeacats_scanner::download::ensure_target_dir;
use ikeacats_scanner::index::DEFAULT_INDEX_URL;
use ikeacats_scanner::throttle::DEFAULT_DELAY;
use ikeacats_scanner::{
    Catalogue, DownloadCallback, DownloadEvent, DownloadedFile, HarvestError, Harvester,
    ProgressCallback, Throttle,
};
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Options for configuring a harvest run
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub target: PathBuf,
    pub index_url: String,
    pub page_url_template: String,
    pub delay: Duration,
    pub show_progress_bars: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            target: PathBuf::from("output"),
            index_url: DEFAULT_INDEX_URL.to_string(),
            page_url_template: DEFAULT_PAGE_URL_TEMPLATE.to_string(),
            delay: DEFAULT_DELAY,
            show_progress_bars: false,
        }
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub target: PathBuf,
    pub listings: usize,
    pub catalogues: Vec<Catalogue>,
    pub downloads: Vec<DownloadedFile>,
    pub elapsed: Duration,
    pub finished_at: DateTime<Local>,
}

impl HarvestSummary {
    pub fn total_bytes(&self) -> u64 {
        self.downloads.iter().map(|d| d.bytes).sum()
    }
}

/// Callback for reporting run progress as plain messages
pub type HarvestProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Run the whole pipeline: read the index, resolve every catalogue page,
/// then download every PDF. Stages run strictly one after the other and the
/// first error ends the run.
pub async fn execute_harvest(
    options: HarvestOptions,
    progress_callback: Option<HarvestProgressCallback>,
) -> Result<HarvestSummary, HarvestError> {
    let HarvestOptions {
        target,
        index_url,
        page_url_template,
        delay,
        show_progress_bars,
    } = options;

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    let start = Instant::now();
    let mut harvester = Harvester::new()?
        .with_index_url(index_url)
        .with_page_url_template(page_url_template)
        .with_throttle(Throttle::fixed(delay));

    let listings = harvester.fetch_listings().await?;

    ensure_target_dir(&target).await?;
    info!("Saving catalogues to {}", target.display());

    report("Downloading IKEA catalogues. This will take around 12GB of space as of 2020-08-16.".to_string());
    report("Retrieving PDF download URLs...".to_string());

    // Stage two: one detail page per listing
    let scrape_bar = if show_progress_bars {
        let pb = ProgressBar::new(listings.len() as u64);
        pb.set_style(bar_style("[{bar:40.cyan/blue}] {pos}/{len} {msg}"));
        Some(pb)
    } else {
        None
    };

    if let Some(ref pb) = scrape_bar {
        let pb_clone = pb.clone();
        let scrape_progress: ProgressCallback = Arc::new(move |idx: usize, id: String| {
            pb_clone.set_position(idx as u64);
            pb_clone.set_message(format!("sv-{}", id));
        });
        harvester = harvester.with_progress_callback(scrape_progress);
    }

    let catalogues = harvester.resolve_catalogues(&listings).await;
    if let Some(ref pb) = scrape_bar {
        pb.finish_and_clear();
    }
    let catalogues = catalogues?;

    // Stage three: one download per catalogue
    report(format!("Downloading {} PDFs...", catalogues.len()));

    let download_bar = if show_progress_bars {
        let pb = ProgressBar::new(0);
        pb.set_style(bar_style(
            "{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        ));
        Some(pb)
    } else {
        None
    };

    if let Some(ref pb) = download_bar {
        let pb_clone = pb.clone();
        let download_progress: DownloadCallback = Arc::new(move |event: DownloadEvent| match event {
            DownloadEvent::Started {
                title,
                url,
                total_bytes,
            } => {
                pb_clone.reset();
                pb_clone.set_length(total_bytes.unwrap_or(0));
                pb_clone.set_message(title.clone());
                pb_clone.println(format!("Downloading: {} ({})", title, url));
            }
            DownloadEvent::Progress { downloaded } => {
                if pb_clone.length().is_some_and(|len| downloaded > len) {
                    pb_clone.set_length(downloaded);
                }
                pb_clone.set_position(downloaded);
            }
            DownloadEvent::Finished { title, bytes } => {
                pb_clone.println(format!("  ✓ {} ({})", title, HumanBytes(bytes)));
            }
        });
        harvester = harvester.with_download_callback(download_progress);
    } else if progress_callback.is_some() {
        let callback = progress_callback.clone();
        let download_progress: DownloadCallback = Arc::new(move |event: DownloadEvent| {
            if let (Some(cb), DownloadEvent::Started { title, url, .. }) = (&callback, event) {
                cb(format!("Downloading: {} ({})", title, url));
            }
        });
        harvester = harvester.with_download_callback(download_progress);
    }

    let downloads = harvester.download_all(&catalogues, &target).await;
    if let Some(ref pb) = download_bar {
        pb.finish_and_clear();
    }
    let downloads = downloads?;

    let elapsed = start.elapsed();
    report(format!("All done in {}.", HumanDuration(elapsed)));

    Ok(HarvestSummary {
        target,
        listings: listings.len(),
        catalogues,
        downloads,
        elapsed,
        finished_at: Local::now(),
    })
}

/// Generate a run report from a summary
pub fn generate_harvest_report(summary: &HarvestSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Catalogues listed: {}\n", summary.listings));
    report.push_str(&format!("  PDFs downloaded: {}\n", summary.downloads.len()));
    report.push_str(&format!("  Total size: {}\n", HumanBytes(summary.total_bytes())));
    report.push_str(&format!("  Target: {}\n", summary.target.display()));
    report.push_str(&format!(
        "  Finished: {} (took {})\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S"),
        HumanDuration(summary.elapsed)
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if summary.downloads.is_empty() {
        report.push_str("No catalogues were downloaded.\n");
        return report;
    }

    report.push_str("## Files\n");
    for file in &summary.downloads {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.title.clone());
        report.push_str(&format!("  {} \x1b[90m{}\x1b[0m\n", name, HumanBytes(file.bytes)));
    }

    // Titles that mapped onto the same file: only the last download is on disk
    let mut overwritten: Vec<&str> = Vec::new();
    for (idx, file) in summary.downloads.iter().enumerate() {
        if summary.downloads[idx + 1..].iter().any(|later| later.path == file.path) {
            overwritten.push(&file.title);
        }
    }
    if !overwritten.is_empty() {
        report.push_str(&format!(
            "\n  {} download(s) replaced by a later catalogue with the same title: {}\n",
            overwritten.len(),
            overwritten.join(", ")
        ));
    }

    report
}
