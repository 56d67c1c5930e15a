use crate::handlers::ensure_period;
use clap::arg;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("ikeacats")
        .version(env!("CARGO_PKG_VERSION"))
        .about(ensure_period(env!("CARGO_PKG_DESCRIPTION")))
        .bin_name("ikeacats")
        .styles(CLAP_STYLING)
        .arg(
            arg!(--"target" <DIR>)
                .required(false)
                .help("Target directory to save files to.")
                .value_parser(clap::value_parser!(String))
                .default_value("output"),
        )
        .arg(arg!(-q --"quiet" "Suppress banner, progress bars and the final report").required(false))
        .arg(
            arg!(--"delay" <MS>)
                .required(false)
                .help("Pause in milliseconds after every page request and download")
                .value_parser(clap::value_parser!(u64))
                .default_value("500"),
        )
        .arg(
            arg!(--"index-url" <URL>)
                .required(false)
                .hide(true)
                .help("Override the catalogue index URL")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(--"page-url" <TEMPLATE>)
                .required(false)
                .hide(true)
                .help("Override the catalogue page URL; {id} is replaced by the listing id"),
        )
}
