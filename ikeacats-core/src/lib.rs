pub mod harvest;

use colored::Colorize;

pub use harvest::{
    HarvestOptions, HarvestProgressCallback, HarvestSummary, execute_harvest,
    generate_harvest_report,
};

/// The startup banner, without a trailing blank line
pub fn banner() -> String {
    let rule = "═".repeat(60).bright_blue().bold();
    format!(
        "{}\n  {} {}\n  {}\n{}",
        rule,
        "IKEACATS".bright_white().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "IKEA catalogue archive downloader".cyan(),
        rule
    )
}

pub fn print_banner() {
    println!("{}", banner());
    println!();
}
