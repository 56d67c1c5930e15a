use clap::ArgMatches;
use colored::Colorize;
use ikeacats_core::harvest::{
    HarvestOptions, HarvestProgressCallback, HarvestSummary, execute_harvest,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Append a full stop unless the text already ends a sentence
pub fn ensure_period(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.is_empty() || trimmed.ends_with(['.', '!', '?']) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

/// Log events go to stderr; `RUST_LOG` overrides the default `warn` level
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be set when handlers run inside tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build harvest options from parsed command line arguments
pub fn options_from_args(args: &ArgMatches) -> Result<HarvestOptions, String> {
    let mut options = HarvestOptions::default();

    if let Some(target) = args.get_one::<String>("target") {
        let expanded = shellexpand::tilde(target);
        options.target = PathBuf::from(expanded.as_ref());
    }

    if let Some(delay) = args.get_one::<u64>("delay") {
        options.delay = Duration::from_millis(*delay);
    }

    if let Some(index_url) = args.get_one::<Url>("index-url") {
        options.index_url = index_url.as_str().to_string();
    }

    if let Some(template) = args.get_one::<String>("page-url") {
        if !template.contains("{id}") {
            return Err(format!(
                "Page URL template '{}' must contain {{id}}",
                template
            ));
        }
        options.page_url_template = template.clone();
    }

    options.show_progress_bars = !args.get_flag("quiet");
    Ok(options)
}

pub async fn handle_harvest(args: &ArgMatches) -> Result<HarvestSummary, String> {
    let options = options_from_args(args)?;
    let quiet = args.get_flag("quiet");
    debug!("Harvest options: {:?}", options);

    if !quiet {
        println!(
            "{} Target: {}",
            "→".blue(),
            options.target.display().to_string().bright_white()
        );
        println!(
            "{} Delay: {} ms\n",
            "→".blue(),
            options.delay.as_millis().to_string().cyan()
        );
    }

    let progress_callback: Option<HarvestProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{} {}", "→".blue(), msg);
        }))
    };

    execute_harvest(options, progress_callback)
        .await
        .map_err(|e| format!("{}: {}", env!("CARGO_PKG_NAME"), e))
}
