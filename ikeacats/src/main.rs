use colored::Colorize;
use ikeacats::commands::command_argument_builder;
use ikeacats::handlers::{handle_harvest, init_tracing};
use ikeacats_core::{generate_harvest_report, print_banner};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let matches = cmd.get_matches();
    let quiet = matches.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    init_tracing();

    match handle_harvest(&matches).await {
        Ok(summary) => {
            if !quiet {
                println!("\n{} All done!\n", "✓".green().bold());
                print!("{}", generate_harvest_report(&summary));
            }
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
